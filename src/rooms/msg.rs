use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::game::{Board, Score, Symbol};

use super::membership::Occupant;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub identity: String,
    pub room: String,
}

impl Seat {
    pub fn new(identity: impl Into<String>, room: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            room: room.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRef {
    pub room: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardUpdate {
    pub room: String,
    pub board: Board,
    pub symbol: Symbol,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Joined {
    pub identity: String,
    pub room: String,
    pub symbol: Symbol,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRoomError {
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub room: String,
    pub occupant_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Winner {
    pub identity: String,
    pub symbol: Symbol,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub identity: String,
    pub room: String,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub identity: String,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    JoinRoom(Seat),
    LeaveRoom(Seat),
    /// The sender's board with its move painted in.
    UpdateBoard(BoardUpdate),
    RestartGameRequest(Seat),
    RestartGameAccepted(RoomRef),
    RestartGameDeclined(Seat),
    SendMessage(OutgoingMessage),
    Typing(Seat),
    TypingStop(Seat),
}

impl ClientEvent {
    pub fn room(&self) -> &str {
        match self {
            ClientEvent::JoinRoom(seat)
            | ClientEvent::LeaveRoom(seat)
            | ClientEvent::RestartGameRequest(seat)
            | ClientEvent::RestartGameDeclined(seat)
            | ClientEvent::Typing(seat)
            | ClientEvent::TypingStop(seat) => &seat.room,
            ClientEvent::UpdateBoard(update) => &update.room,
            ClientEvent::RestartGameAccepted(room) => &room.room,
            ClientEvent::SendMessage(message) => &message.room,
        }
    }

    pub fn identity(&self) -> Option<&str> {
        match self {
            ClientEvent::JoinRoom(seat)
            | ClientEvent::LeaveRoom(seat)
            | ClientEvent::RestartGameRequest(seat)
            | ClientEvent::RestartGameDeclined(seat)
            | ClientEvent::Typing(seat)
            | ClientEvent::TypingStop(seat) => Some(&seat.identity),
            ClientEvent::SendMessage(message) => Some(&message.identity),
            ClientEvent::UpdateBoard(_) | ClientEvent::RestartGameAccepted(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    Joined(Joined),
    JoinRoomError(JoinRoomError),
    Rooms(Vec<RoomSummary>),
    UsersCount(Vec<Occupant>),
    PlayerJoined(String),
    PlayerLeft(String),
    UpdateBoard(BoardUpdate),
    Turn(String),
    Winner(Winner),
    Draw(Empty),
    UpdateScore(Score),
    Left(Empty),
    EndGame(Empty),
    RestartGameServerRequest(Seat),
    RestartGameAccepted(RoomRef),
    RestartGameDeclined(String),
    NewMessage(ChatMessage),
    Typing(Seat),
    TypingStop(Seat),
}

impl ServerEvent {
    /// Whether the event describes a room the receiver sits in, as opposed
    /// to a reply about joining, leaving or the room listing.
    pub fn is_room_scoped(&self) -> bool {
        !matches!(
            self,
            ServerEvent::Joined(_)
                | ServerEvent::JoinRoomError(_)
                | ServerEvent::Rooms(_)
                | ServerEvent::Left(_)
        )
    }
}
