use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    error::{SessionError, SessionResult},
    game::Symbol,
};

pub const MAX_IDENTITY_LEN: usize = 10;

/// Identities are chosen by the player: 1 to 10 characters, no whitespace.
pub fn validate_identity(identity: &str) -> SessionResult<()> {
    if identity.is_empty() {
        return Err(SessionError::invalid("please fill in all fields"));
    }
    if identity.chars().count() > MAX_IDENTITY_LEN || identity.chars().any(char::is_whitespace) {
        return Err(SessionError::InvalidIdentity {
            identity: identity.to_owned(),
        });
    }
    Ok(())
}

pub fn validate_room_name(room: &str) -> SessionResult<()> {
    if room.trim().is_empty() {
        return Err(SessionError::invalid("please fill in all fields"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupant {
    pub identity: String,
    pub symbol: Symbol,
}

/// The two seats of a room. The `X` seat is filled first.
#[derive(Debug, Clone, Default)]
pub struct Membership {
    x: Option<String>,
    o: Option<String>,
}

impl Membership {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&mut self, room: &str, identity: &str) -> SessionResult<Symbol> {
        validate_identity(identity)?;
        if self.symbol_of(identity).is_some() {
            return Err(SessionError::rejected(format!(
                "{identity} is already in room {room}"
            )));
        }

        let symbol = match (&self.x, &self.o) {
            (None, _) => Symbol::X,
            (Some(_), None) => Symbol::O,
            (Some(_), Some(_)) => {
                return Err(SessionError::RoomFull {
                    room: room.to_owned(),
                });
            }
        };
        *self.seat_mut(symbol) = Some(identity.to_owned());
        info!(room, identity, %symbol, "seat taken");
        Ok(symbol)
    }

    pub fn leave(&mut self, identity: &str) -> Option<Symbol> {
        let symbol = self.symbol_of(identity)?;
        *self.seat_mut(symbol) = None;
        Some(symbol)
    }

    pub fn symbol_of(&self, identity: &str) -> Option<Symbol> {
        if self.x.as_deref() == Some(identity) {
            Some(Symbol::X)
        } else if self.o.as_deref() == Some(identity) {
            Some(Symbol::O)
        } else {
            None
        }
    }

    pub fn holder(&self, symbol: Symbol) -> Option<&str> {
        match symbol {
            Symbol::X => self.x.as_deref(),
            Symbol::O => self.o.as_deref(),
        }
    }

    pub fn opponent_of(&self, identity: &str) -> Option<&str> {
        self.symbol_of(identity)
            .and_then(|symbol| self.holder(symbol.opponent()))
    }

    pub fn roster(&self) -> Vec<Occupant> {
        [Symbol::X, Symbol::O]
            .into_iter()
            .filter_map(|symbol| {
                self.holder(symbol).map(|identity| Occupant {
                    identity: identity.to_owned(),
                    symbol,
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        usize::from(self.x.is_some()) + usize::from(self.o.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_ready(&self) -> bool {
        self.len() == 2
    }

    fn seat_mut(&mut self, symbol: Symbol) -> &mut Option<String> {
        match symbol {
            Symbol::X => &mut self.x,
            Symbol::O => &mut self.o,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identities_are_validated() {
        assert!(validate_identity("alice").is_ok());
        assert!(validate_identity("abcdefghij").is_ok());
        assert!(matches!(
            validate_identity("abcdefghijk"),
            Err(SessionError::InvalidIdentity { .. })
        ));
        assert!(matches!(
            validate_identity("al ice"),
            Err(SessionError::InvalidIdentity { .. })
        ));
        assert!(matches!(
            validate_identity("al\tice"),
            Err(SessionError::InvalidIdentity { .. })
        ));
        assert!(matches!(
            validate_identity(""),
            Err(SessionError::InvalidInput { .. })
        ));
        assert!(validate_room_name("  ").is_err());
    }

    #[test]
    fn symbols_follow_join_order() {
        let mut members = Membership::new();
        assert_eq!(members.join("r1", "alice"), Ok(Symbol::X));
        assert!(!members.is_ready());
        assert_eq!(members.join("r1", "bob"), Ok(Symbol::O));
        assert!(members.is_ready());
        assert_eq!(members.opponent_of("alice"), Some("bob"));
    }

    #[test]
    fn third_join_is_refused() {
        let mut members = Membership::new();
        members.join("r1", "alice").unwrap();
        members.join("r1", "bob").unwrap();
        assert_eq!(
            members.join("r1", "carol"),
            Err(SessionError::RoomFull {
                room: "r1".to_owned()
            })
        );
        assert_eq!(members.roster().len(), 2);
        assert_eq!(members.holder(Symbol::X), Some("alice"));
        assert_eq!(members.holder(Symbol::O), Some("bob"));
    }

    #[test]
    fn duplicate_identity_is_rejected() {
        let mut members = Membership::new();
        members.join("r1", "alice").unwrap();
        assert!(matches!(
            members.join("r1", "alice"),
            Err(SessionError::JoinRejected { .. })
        ));
    }

    #[test]
    fn remaining_player_keeps_symbol() {
        let mut members = Membership::new();
        members.join("r1", "alice").unwrap();
        members.join("r1", "bob").unwrap();
        assert_eq!(members.leave("alice"), Some(Symbol::X));
        assert_eq!(members.leave("alice"), None);
        assert_eq!(
            members.roster(),
            vec![Occupant {
                identity: "bob".to_owned(),
                symbol: Symbol::O
            }]
        );
        assert_eq!(members.join("r1", "carol"), Ok(Symbol::X));
    }
}
