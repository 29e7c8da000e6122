use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
pub struct TypingDebounce {
    idle: Duration,
    deadline: Option<Instant>,
}

impl TypingDebounce {
    pub fn new(idle: Duration) -> Self {
        Self {
            idle,
            deadline: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn edited(&mut self, now: Instant) {
        self.deadline = Some(now + self.idle);
    }

    /// True exactly once when the idle window has run out.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Stops immediately. True if we were typing.
    pub fn stop(&mut self) -> bool {
        self.deadline.take().is_some()
    }
}
