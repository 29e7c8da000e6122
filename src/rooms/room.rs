use std::time::Duration;

use time::OffsetDateTime;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

use crate::{
    error::{SessionError, SessionResult},
    game::{Board, Outcome, Phase, Score, Symbol, TurnAuthority},
};

use super::{
    chat::ChatChannel,
    membership::Membership,
    msg::{BoardUpdate, Empty, Joined, RoomRef, RoomSummary, Seat, ServerEvent, Winner},
    restart::{Negotiation, Request, RestartNegotiator},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    Only(String),
    AllBut(String),
    All,
}

impl Audience {
    pub fn includes(&self, identity: &str) -> bool {
        match self {
            Audience::Only(only) => only == identity,
            Audience::AllBut(excluded) => excluded != identity,
            Audience::All => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delta {
    pub audience: Audience,
    pub event: ServerEvent,
}

impl Delta {
    fn only(identity: &str, event: ServerEvent) -> Self {
        Self {
            audience: Audience::Only(identity.to_owned()),
            event,
        }
    }

    fn all_but(identity: &str, event: ServerEvent) -> Self {
        Self {
            audience: Audience::AllBut(identity.to_owned()),
            event,
        }
    }

    fn all(event: ServerEvent) -> Self {
        Self {
            audience: Audience::All,
            event,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// The player's board with one new mark on it.
    Move(Board),
    RequestRestart,
    AcceptRestart,
    DeclineRestart,
    Message {
        message: String,
        timestamp: OffsetDateTime,
    },
    Typing,
    TypingStop,
}

#[derive(Debug)]
pub struct Room {
    name: String,
    members: Membership,
    turns: TurnAuthority,
    restart: RestartNegotiator,
    chat: ChatChannel,
    score: Score,
}

impl Room {
    pub fn new(name: impl Into<String>, chat_cooldown: Duration) -> Self {
        Self {
            name: name.into(),
            members: Membership::new(),
            turns: TurnAuthority::new(),
            restart: RestartNegotiator::new(),
            chat: ChatChannel::new(chat_cooldown),
            score: Score::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &Membership {
        &self.members
    }

    pub fn board(&self) -> &Board {
        self.turns.board()
    }

    pub fn phase(&self) -> Phase {
        self.turns.phase()
    }

    pub fn turn(&self) -> Option<&str> {
        self.turns
            .to_move()
            .and_then(|symbol| self.members.holder(symbol))
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn negotiation(&self) -> &Negotiation {
        self.restart.state()
    }

    pub fn chat(&self) -> &ChatChannel {
        &self.chat
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            room: self.name.clone(),
            occupant_count: self.members.len(),
        }
    }

    #[instrument(skip(self), fields(room = %self.name))]
    pub fn join(&mut self, identity: &str) -> SessionResult<Vec<Delta>> {
        let symbol = self.members.join(&self.name, identity)?;

        let mut deltas = vec![
            Delta::only(
                identity,
                ServerEvent::Joined(Joined {
                    identity: identity.to_owned(),
                    room: self.name.clone(),
                    symbol,
                }),
            ),
            Delta::all_but(identity, ServerEvent::PlayerJoined(identity.to_owned())),
            self.roster(),
        ];

        if self.members.is_ready() {
            info!("room filled, starting game");
            self.turns.start();
            self.restart.cancel();
            deltas.extend(self.fresh_game());
        }
        Ok(deltas)
    }

    /// Whoever is left starts over: empty board, zero score, empty chat.
    #[instrument(skip(self), fields(room = %self.name))]
    pub fn leave(&mut self, identity: &str) -> Option<Vec<Delta>> {
        self.members.leave(identity)?;
        info!("player left");

        self.restart.cancel();
        self.turns.halt();
        self.score.reset();
        self.chat.clear();
        self.chat.forget(identity);

        if self.members.is_empty() {
            return Some(Vec::new());
        }
        Some(vec![
            Delta::all(ServerEvent::PlayerLeft(identity.to_owned())),
            Delta::all(ServerEvent::EndGame(Empty {})),
            self.roster(),
            self.board_delta(Symbol::X),
            Delta::all(ServerEvent::UpdateScore(self.score)),
        ])
    }

    #[instrument(skip(self, intent, now), fields(room = %self.name))]
    pub fn handle(
        &mut self,
        identity: &str,
        intent: Intent,
        now: Instant,
    ) -> SessionResult<Vec<Delta>> {
        let Some(symbol) = self.members.symbol_of(identity) else {
            return Err(SessionError::invalid("not seated in this room"));
        };

        match intent {
            Intent::Move(board) => self.play(identity, symbol, &board),
            Intent::RequestRestart => {
                let Some(opponent) = self.members.opponent_of(identity).map(str::to_owned) else {
                    return Err(SessionError::conflict("no opponent to ask"));
                };
                match self.restart.request(identity) {
                    Request::Opened => Ok(vec![Delta::only(
                        &opponent,
                        ServerEvent::RestartGameServerRequest(Seat::new(identity, &self.name)),
                    )]),
                    Request::Coalesced => Ok(Vec::new()),
                    Request::Agreed => Ok(self.restart_game()),
                }
            }
            Intent::AcceptRestart => {
                self.restart.accept(identity)?;
                Ok(self.restart_game())
            }
            Intent::DeclineRestart => {
                let requester = self.restart.decline(identity)?;
                info!(identity, %requester, "restart declined");
                Ok(vec![Delta::only(
                    &requester,
                    ServerEvent::RestartGameDeclined(identity.to_owned()),
                )])
            }
            Intent::Message { message, timestamp } => {
                let entry = self.chat.post(identity, &message, timestamp, now)?;
                Ok(vec![Delta::all_but(identity, ServerEvent::NewMessage(entry))])
            }
            Intent::Typing => Ok(vec![Delta::all_but(
                identity,
                ServerEvent::Typing(Seat::new(identity, &self.name)),
            )]),
            Intent::TypingStop => Ok(vec![Delta::all_but(
                identity,
                ServerEvent::TypingStop(Seat::new(identity, &self.name)),
            )]),
        }
    }

    fn play(&mut self, identity: &str, symbol: Symbol, proposed: &Board) -> SessionResult<Vec<Delta>> {
        let Some((cell, claimed)) = self.turns.board().single_move_to(proposed) else {
            debug!(identity, "board is not one move ahead");
            return Err(SessionError::IllegalMove);
        };
        if claimed != symbol {
            debug!(identity, %claimed, "move painted with the wrong symbol");
            return Err(SessionError::IllegalMove);
        }

        let outcome = self.turns.play(symbol, cell)?;
        let mut deltas = vec![self.board_delta(symbol)];
        match outcome {
            Outcome::Open => {
                if let Some(next) = self.turn() {
                    deltas.push(Delta::all(ServerEvent::Turn(next.to_owned())));
                }
            }
            Outcome::Win(winner) => {
                self.score.award(winner);
                info!(identity, symbol = %winner, "game won");
                deltas.push(Delta::all(ServerEvent::Winner(Winner {
                    identity: identity.to_owned(),
                    symbol: winner,
                })));
                deltas.push(Delta::all(ServerEvent::UpdateScore(self.score)));
            }
            Outcome::Draw => {
                info!("game drawn");
                deltas.push(Delta::all(ServerEvent::Draw(Empty {})));
            }
        }
        Ok(deltas)
    }

    fn restart_game(&mut self) -> Vec<Delta> {
        info!(room = %self.name, "restart agreed");
        self.turns.start();
        let mut deltas = vec![Delta::all(ServerEvent::RestartGameAccepted(RoomRef {
            room: self.name.clone(),
        }))];
        deltas.extend(self.fresh_game());
        deltas
    }

    fn fresh_game(&self) -> Vec<Delta> {
        let mut deltas = vec![
            self.board_delta(Symbol::X),
            Delta::all(ServerEvent::UpdateScore(self.score)),
        ];
        if let Some(first) = self.turn() {
            deltas.push(Delta::all(ServerEvent::Turn(first.to_owned())));
        }
        deltas
    }

    fn roster(&self) -> Delta {
        Delta::all(ServerEvent::UsersCount(self.members.roster()))
    }

    /// `symbol` is the last mover, or `X` for a fresh board.
    fn board_delta(&self, symbol: Symbol) -> Delta {
        Delta::all(ServerEvent::UpdateBoard(BoardUpdate {
            room: self.name.clone(),
            board: *self.turns.board(),
            symbol,
        }))
    }
}
