mod session;
mod typing;

use std::time::Duration;

use tokio::sync::mpsc;

use crate::rooms::{ClientEvent, chat::DEFAULT_COOLDOWN};

pub use session::{RestartStatus, Session, ViewDelta};
pub use typing::TypingDebounce;

pub const SEND_COOLDOWN: Duration = DEFAULT_COOLDOWN;
/// Quiet time after the last edit before `typing-stop` goes out.
pub const TYPING_IDLE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
pub struct ClientConfig {
    pub send_cooldown: Duration,
    pub typing_idle: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            send_cooldown: SEND_COOLDOWN,
            typing_idle: TYPING_IDLE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Connection {
    tx: mpsc::UnboundedSender<ClientEvent>,
}

impl Connection {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ClientEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queues an event. Returns `false` once the transport is gone.
    pub fn emit(&self, event: ClientEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}
