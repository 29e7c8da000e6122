use tracing::debug;

use crate::error::{SessionError, SessionResult};

use super::board::{Board, Outcome, Symbol, evaluate};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    WaitingForPlayers,
    ToMove(Symbol),
    /// Won or drawn. Holds the outcome, never `Outcome::Open`.
    Terminal(Outcome),
}

#[derive(Debug, Clone, Default)]
pub struct TurnAuthority {
    board: Board,
    phase: Phase,
}

impl TurnAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn to_move(&self) -> Option<Symbol> {
        match self.phase() {
            Phase::ToMove(symbol) => Some(symbol),
            _ => None,
        }
    }

    /// Fresh board with `X` to move. Used when the room fills and on an
    /// agreed restart.
    pub fn start(&mut self) {
        self.board = Board::new();
        self.phase = Phase::ToMove(Symbol::X);
    }

    pub fn halt(&mut self) {
        self.board = Board::new();
        self.phase = Phase::WaitingForPlayers;
    }

    /// On error nothing changes.
    pub fn play(&mut self, symbol: Symbol, cell: usize) -> SessionResult<Outcome> {
        if self.to_move() != Some(symbol) {
            debug!(%symbol, phase = ?self.phase(), "move out of turn");
            return Err(SessionError::IllegalMove);
        }
        self.board.place(cell, symbol)?;

        let outcome = evaluate(&self.board);
        self.phase = if outcome.is_terminal() {
            Phase::Terminal(outcome)
        } else {
            Phase::ToMove(symbol.opponent())
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nobody_moves_before_start() {
        let mut turns = TurnAuthority::new();
        assert_eq!(turns.phase(), Phase::WaitingForPlayers);
        assert_eq!(turns.play(Symbol::X, 0), Err(SessionError::IllegalMove));
        assert!(turns.board().is_clear());
    }

    #[test]
    fn turns_alternate() {
        let mut turns = TurnAuthority::new();
        turns.start();
        assert_eq!(turns.play(Symbol::O, 0), Err(SessionError::IllegalMove));
        assert_eq!(turns.play(Symbol::X, 4), Ok(Outcome::Open));
        assert_eq!(turns.to_move(), Some(Symbol::O));
        assert_eq!(turns.play(Symbol::X, 0), Err(SessionError::IllegalMove));
        assert_eq!(turns.play(Symbol::O, 0), Ok(Outcome::Open));
        assert_eq!(turns.to_move(), Some(Symbol::X));
    }

    #[test]
    fn occupied_cell_leaves_state_alone() {
        let mut turns = TurnAuthority::new();
        turns.start();
        turns.play(Symbol::X, 4).unwrap();
        let before = *turns.board();
        assert_eq!(turns.play(Symbol::O, 4), Err(SessionError::IllegalMove));
        assert_eq!(*turns.board(), before);
        assert_eq!(turns.to_move(), Some(Symbol::O));
    }

    #[test]
    fn win_is_terminal_until_restart() {
        let mut turns = TurnAuthority::new();
        turns.start();
        for (symbol, cell) in [
            (Symbol::X, 0),
            (Symbol::O, 3),
            (Symbol::X, 1),
            (Symbol::O, 4),
        ] {
            assert_eq!(turns.play(symbol, cell), Ok(Outcome::Open));
        }
        assert_eq!(turns.play(Symbol::X, 2), Ok(Outcome::Win(Symbol::X)));
        assert_eq!(turns.phase(), Phase::Terminal(Outcome::Win(Symbol::X)));
        assert_eq!(turns.play(Symbol::O, 5), Err(SessionError::IllegalMove));

        turns.start();
        assert!(turns.board().is_clear());
        assert_eq!(turns.to_move(), Some(Symbol::X));
    }

    #[test]
    fn halt_clears_board() {
        let mut turns = TurnAuthority::new();
        turns.start();
        turns.play(Symbol::X, 8).unwrap();
        turns.halt();
        assert!(turns.board().is_clear());
        assert_eq!(turns.phase(), Phase::WaitingForPlayers);
    }
}
