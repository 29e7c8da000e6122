use derive_more::{Display, Error};

pub type SessionResult<T> = Result<T, SessionError>;

/// Join failures go back as `join-room-error`. The rest are logged and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum SessionError {
    #[display("{reason}")]
    InvalidInput { reason: &'static str },
    /// Identity longer than ten characters or containing whitespace.
    #[display("username {identity:?} must be 1-10 characters without spaces")]
    InvalidIdentity { identity: String },
    #[display("room {room} is full")]
    RoomFull { room: String },
    #[display("{reason}")]
    JoinRejected { reason: String },
    /// Wrong player, occupied cell, or no game in progress.
    #[display("illegal move")]
    IllegalMove,
    #[display("{reason}")]
    NegotiationConflict { reason: &'static str },
    #[display("message sent too soon after the previous one")]
    RateLimited,
}

impl SessionError {
    pub(crate) fn invalid(reason: &'static str) -> Self {
        Self::InvalidInput { reason }
    }

    pub(crate) fn conflict(reason: &'static str) -> Self {
        Self::NegotiationConflict { reason }
    }

    pub(crate) fn rejected(reason: impl Into<String>) -> Self {
        Self::JoinRejected {
            reason: reason.into(),
        }
    }
}
