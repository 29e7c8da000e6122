use std::{net::SocketAddr, time::Duration};

use anyhow::Context;

use crate::rooms::chat::DEFAULT_COOLDOWN;

pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub chat_cooldown: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let addr = match dotenv::var("XOXO_ADDR") {
            Ok(addr) => addr
                .parse()
                .with_context(|| format!("XOXO_ADDR={addr:?} is not a socket address"))?,
            Err(_) => DEFAULT_ADDR.parse()?,
        };

        let chat_cooldown = match dotenv::var("XOXO_CHAT_COOLDOWN_MS") {
            Ok(ms) => Duration::from_millis(
                ms.parse()
                    .with_context(|| format!("XOXO_CHAT_COOLDOWN_MS={ms:?} is not a number"))?,
            ),
            Err(_) => DEFAULT_COOLDOWN,
        };

        Ok(Self {
            addr,
            chat_cooldown,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            chat_cooldown: DEFAULT_COOLDOWN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_constant() {
        let config = Config::default();
        assert_eq!(config.addr, DEFAULT_ADDR.parse::<SocketAddr>().unwrap());
        assert_eq!(config.chat_cooldown, Duration::from_secs(3));
    }
}
