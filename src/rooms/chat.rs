use std::{collections::HashMap, time::Duration};

use time::OffsetDateTime;
use tokio::time::Instant;
use tracing::debug;

use crate::error::{SessionError, SessionResult};

use super::msg::ChatMessage;

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(3);
/// How much closer together two paced messages may arrive than they were sent.
pub const ARRIVAL_SLACK: Duration = Duration::from_millis(500);

pub fn normalize(message: &str) -> SessionResult<String> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(SessionError::invalid("message is empty"));
    }
    Ok(trimmed.to_owned())
}

#[derive(Debug, Clone, Copy)]
pub struct Cooldown {
    window: Duration,
    last: Option<Instant>,
}

impl Cooldown {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    pub fn ready(&self, now: Instant) -> bool {
        self.last
            .is_none_or(|last| now.saturating_duration_since(last) >= self.window)
    }

    pub fn try_fire(&mut self, now: Instant) -> bool {
        if !self.ready(now) {
            return false;
        }
        self.last = Some(now);
        true
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.last.map(|last| last + self.window)
    }
}

/// Chat log and per-sender throttling for one room. Arrivals are throttled
/// to the sender's cool-down less [`ARRIVAL_SLACK`].
#[derive(Debug, Clone)]
pub struct ChatChannel {
    log: Vec<ChatMessage>,
    senders: HashMap<String, Cooldown>,
    window: Duration,
}

impl ChatChannel {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            log: Vec::new(),
            senders: HashMap::new(),
            window: cooldown.saturating_sub(ARRIVAL_SLACK),
        }
    }

    pub fn log(&self) -> &[ChatMessage] {
        &self.log
    }

    pub fn post(
        &mut self,
        identity: &str,
        message: &str,
        timestamp: OffsetDateTime,
        now: Instant,
    ) -> SessionResult<ChatMessage> {
        let message = normalize(message)?;
        let window = self.window;
        let sender = self
            .senders
            .entry(identity.to_owned())
            .or_insert_with(|| Cooldown::new(window));
        if !sender.try_fire(now) {
            debug!(identity, "chat message inside cool-down dropped");
            return Err(SessionError::RateLimited);
        }

        let entry = ChatMessage {
            identity: identity.to_owned(),
            message,
            timestamp,
        };
        self.log.push(entry.clone());
        Ok(entry)
    }

    pub fn forget(&mut self, identity: &str) {
        self.senders.remove(identity);
    }

    pub fn clear(&mut self) {
        self.log.clear();
    }
}

impl Default for ChatChannel {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}
