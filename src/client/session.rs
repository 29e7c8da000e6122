use time::OffsetDateTime;
use tokio::time::Instant;
use tracing::debug;

use crate::{
    error::{SessionError, SessionResult},
    game::{Board, Outcome, Score, Symbol},
    rooms::{
        ClientEvent, RoomSummary, ServerEvent,
        chat::{Cooldown, normalize},
        membership::{Occupant, validate_identity, validate_room_name},
        msg::{BoardUpdate, ChatMessage, OutgoingMessage, RoomRef, Seat},
    },
};

use super::{ClientConfig, Connection, TypingDebounce};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RestartStatus {
    #[default]
    Idle,
    Waiting,
    Prompted { by: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewDelta {
    Rooms,
    Joined { room: String, symbol: Symbol },
    JoinFailed(String),
    Left,
    Roster,
    PlayerJoined(String),
    PlayerLeft(String),
    GameEnded,
    Board,
    Turn,
    Outcome(Outcome),
    Score,
    RestartPrompt(String),
    RestartDeclined(String),
    RestartAccepted,
    Chat(ChatMessage),
    /// Who is typing now, if anyone.
    Typing(Option<String>),
}

#[derive(Debug)]
pub struct Session {
    conn: Connection,
    joining: Option<Seat>,
    seat: Option<Seat>,
    symbol: Option<Symbol>,
    rooms: Vec<RoomSummary>,
    roster: Vec<Occupant>,
    board: Board,
    /// Our own move, painted before the server echoes it.
    overlay: Option<Board>,
    turn: Option<String>,
    outcome: Option<Outcome>,
    score: Score,
    restart: RestartStatus,
    chat: Vec<ChatMessage>,
    typer: Option<String>,
    cooldown: Cooldown,
    typing: TypingDebounce,
}

impl Session {
    pub fn new(conn: Connection, config: ClientConfig) -> Self {
        Self {
            conn,
            joining: None,
            seat: None,
            symbol: None,
            rooms: Vec::new(),
            roster: Vec::new(),
            board: Board::new(),
            overlay: None,
            turn: None,
            outcome: None,
            score: Score::default(),
            restart: RestartStatus::Idle,
            chat: Vec::new(),
            typer: None,
            cooldown: Cooldown::new(config.send_cooldown),
            typing: TypingDebounce::new(config.typing_idle),
        }
    }

    pub fn seat(&self) -> Option<&Seat> {
        self.seat.as_ref()
    }

    pub fn symbol(&self) -> Option<Symbol> {
        self.symbol
    }

    pub fn rooms(&self) -> &[RoomSummary] {
        &self.rooms
    }

    pub fn roster(&self) -> &[Occupant] {
        &self.roster
    }

    /// The board to draw: our pending move if any, else the server's.
    pub fn board(&self) -> &Board {
        self.overlay.as_ref().unwrap_or(&self.board)
    }

    pub fn confirmed_board(&self) -> &Board {
        &self.board
    }

    pub fn has_pending_move(&self) -> bool {
        self.overlay.is_some()
    }

    pub fn turn(&self) -> Option<&str> {
        self.turn.as_deref()
    }

    pub fn is_my_turn(&self) -> bool {
        match (&self.turn, &self.seat) {
            (Some(turn), Some(seat)) => *turn == seat.identity,
            _ => false,
        }
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn restart(&self) -> &RestartStatus {
        &self.restart
    }

    pub fn chat(&self) -> &[ChatMessage] {
        &self.chat
    }

    pub fn typer(&self) -> Option<&str> {
        self.typer.as_deref()
    }

    pub fn join(&mut self, identity: &str, room: &str) -> SessionResult<()> {
        if let Some(seat) = &self.seat {
            return Err(SessionError::rejected(format!("already in room {}", seat.room)));
        }
        validate_identity(identity)?;
        validate_room_name(room)?;

        let seat = Seat::new(identity, room);
        self.conn.emit(ClientEvent::JoinRoom(seat.clone()));
        self.joining = Some(seat);
        Ok(())
    }

    /// Leaves the room. Room events stop being applied right away.
    pub fn leave(&mut self) -> SessionResult<()> {
        let Some(seat) = self.seat.take() else {
            return Err(SessionError::invalid("not in a room"));
        };
        self.conn.emit(ClientEvent::LeaveRoom(seat));
        self.symbol = None;
        self.forget_room();
        Ok(())
    }

    pub fn play(&mut self, cell: usize) -> SessionResult<()> {
        let (Some(seat), Some(symbol)) = (&self.seat, self.symbol) else {
            return Err(SessionError::invalid("not in a room"));
        };
        if self.outcome.is_some() || self.overlay.is_some() || !self.is_my_turn() {
            return Err(SessionError::IllegalMove);
        }

        let mut board = self.board;
        board.place(cell, symbol)?;
        let update = BoardUpdate {
            room: seat.room.clone(),
            board,
            symbol,
        };
        self.overlay = Some(board);
        self.conn.emit(ClientEvent::UpdateBoard(update));
        Ok(())
    }

    /// Sends a chat line. Returns `Ok(false)` when it was dropped because
    /// the previous one went out too recently.
    pub fn send_message(&mut self, text: &str, now: Instant) -> SessionResult<bool> {
        let Some(seat) = &self.seat else {
            return Err(SessionError::invalid("not in a room"));
        };
        let message = normalize(text)?;
        if !self.cooldown.try_fire(now) {
            debug!("message inside send cool-down dropped");
            return Ok(false);
        }

        if self.typing.stop() {
            self.conn.emit(ClientEvent::TypingStop(seat.clone()));
        }
        let outgoing = OutgoingMessage {
            identity: seat.identity.clone(),
            room: seat.room.clone(),
            message,
            timestamp: OffsetDateTime::now_utc(),
        };
        self.chat.push(ChatMessage {
            identity: outgoing.identity.clone(),
            message: outgoing.message.clone(),
            timestamp: outgoing.timestamp,
        });
        self.conn.emit(ClientEvent::SendMessage(outgoing));
        Ok(true)
    }

    pub fn edited(&mut self, now: Instant) {
        let Some(seat) = &self.seat else {
            return;
        };
        self.conn.emit(ClientEvent::Typing(seat.clone()));
        self.typing.edited(now);
    }

    /// Fires `typing-stop` once the idle window has passed. Call it when
    /// [`Session::typing_deadline`] is reached.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.typing.expire(now) {
            return false;
        }
        if let Some(seat) = &self.seat {
            self.conn.emit(ClientEvent::TypingStop(seat.clone()));
        }
        true
    }

    pub fn typing_deadline(&self) -> Option<Instant> {
        self.typing.deadline()
    }

    pub fn request_restart(&mut self) -> SessionResult<()> {
        let Some(seat) = &self.seat else {
            return Err(SessionError::invalid("not in a room"));
        };
        if self.roster.len() < 2 {
            return Err(SessionError::conflict("no opponent to ask"));
        }
        if self.restart == RestartStatus::Waiting {
            return Ok(());
        }
        self.conn.emit(ClientEvent::RestartGameRequest(seat.clone()));
        self.restart = RestartStatus::Waiting;
        Ok(())
    }

    pub fn answer_restart(&mut self, accept: bool) -> SessionResult<()> {
        let Some(seat) = &self.seat else {
            return Err(SessionError::invalid("not in a room"));
        };
        if !matches!(self.restart, RestartStatus::Prompted { .. }) {
            return Err(SessionError::conflict("no restart request to answer"));
        }
        let event = if accept {
            ClientEvent::RestartGameAccepted(RoomRef {
                room: seat.room.clone(),
            })
        } else {
            ClientEvent::RestartGameDeclined(seat.clone())
        };
        self.conn.emit(event);
        self.restart = RestartStatus::Idle;
        Ok(())
    }

    pub fn apply(&mut self, event: ServerEvent) -> Vec<ViewDelta> {
        if event.is_room_scoped() && self.seat.is_none() {
            debug!(?event, "room event while not seated ignored");
            return Vec::new();
        }

        match event {
            ServerEvent::Rooms(rooms) => {
                self.rooms = rooms;
                vec![ViewDelta::Rooms]
            }
            ServerEvent::Joined(joined) => match self.joining.take() {
                Some(seat) if seat.identity == joined.identity && seat.room == joined.room => {
                    self.forget_room();
                    self.seat = Some(seat);
                    self.symbol = Some(joined.symbol);
                    vec![ViewDelta::Joined {
                        room: joined.room,
                        symbol: joined.symbol,
                    }]
                }
                joining => {
                    self.joining = joining;
                    Vec::new()
                }
            },
            ServerEvent::JoinRoomError(err) => {
                self.joining = None;
                vec![ViewDelta::JoinFailed(err.reason)]
            }
            ServerEvent::Left(_) => vec![ViewDelta::Left],
            ServerEvent::UsersCount(roster) => {
                self.roster = roster;
                self.restart = RestartStatus::Idle;
                vec![ViewDelta::Roster]
            }
            ServerEvent::PlayerJoined(identity) => vec![ViewDelta::PlayerJoined(identity)],
            ServerEvent::PlayerLeft(identity) => {
                let mut deltas = Vec::new();
                if self.typer.as_deref() == Some(identity.as_str()) {
                    self.typer = None;
                    deltas.push(ViewDelta::Typing(None));
                }
                deltas.push(ViewDelta::PlayerLeft(identity));
                deltas
            }
            ServerEvent::EndGame(_) => {
                self.turn = None;
                self.outcome = None;
                self.overlay = None;
                self.restart = RestartStatus::Idle;
                self.chat.clear();
                vec![ViewDelta::GameEnded]
            }
            ServerEvent::UpdateBoard(update) => {
                self.board = update.board;
                self.overlay = None;
                vec![ViewDelta::Board]
            }
            ServerEvent::Turn(identity) => {
                self.turn = Some(identity);
                self.outcome = None;
                vec![ViewDelta::Turn]
            }
            ServerEvent::Winner(winner) => self.finish(Outcome::Win(winner.symbol)),
            ServerEvent::Draw(_) => self.finish(Outcome::Draw),
            ServerEvent::UpdateScore(score) => {
                self.score = score;
                vec![ViewDelta::Score]
            }
            ServerEvent::RestartGameServerRequest(seat) => {
                self.restart = RestartStatus::Prompted {
                    by: seat.identity.clone(),
                };
                vec![ViewDelta::RestartPrompt(seat.identity)]
            }
            ServerEvent::RestartGameAccepted(_) => {
                self.restart = RestartStatus::Idle;
                self.outcome = None;
                self.overlay = None;
                vec![ViewDelta::RestartAccepted]
            }
            ServerEvent::RestartGameDeclined(identity) => {
                self.restart = RestartStatus::Idle;
                vec![ViewDelta::RestartDeclined(identity)]
            }
            ServerEvent::NewMessage(message) => {
                let mut deltas = Vec::new();
                if self.typer.as_deref() == Some(message.identity.as_str()) {
                    self.typer = None;
                    deltas.push(ViewDelta::Typing(None));
                }
                self.chat.push(message.clone());
                deltas.push(ViewDelta::Chat(message));
                deltas
            }
            ServerEvent::Typing(seat) => {
                if self.typer.as_deref() == Some(seat.identity.as_str()) {
                    return Vec::new();
                }
                self.typer = Some(seat.identity.clone());
                vec![ViewDelta::Typing(Some(seat.identity))]
            }
            ServerEvent::TypingStop(seat) => {
                if self.typer.as_deref() != Some(seat.identity.as_str()) {
                    return Vec::new();
                }
                self.typer = None;
                vec![ViewDelta::Typing(None)]
            }
        }
    }

    fn finish(&mut self, outcome: Outcome) -> Vec<ViewDelta> {
        self.outcome = Some(outcome);
        self.turn = None;
        vec![ViewDelta::Outcome(outcome)]
    }

    fn forget_room(&mut self) {
        self.roster.clear();
        self.board = Board::new();
        self.overlay = None;
        self.turn = None;
        self.outcome = None;
        self.score = Score::default();
        self.restart = RestartStatus::Idle;
        self.chat.clear();
        self.typer = None;
        self.typing.stop();
    }
}
