use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{SessionError, SessionResult};

/// The fixed table of lines that win: rows, then columns, then diagonals.
pub const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    X,
    O,
}

impl Symbol {
    pub fn opponent(self) -> Self {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Symbol::X => "X",
            Symbol::O => "O",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One square. On the wire an empty cell is `""`, a taken one is its symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Cell {
    #[default]
    Empty,
    Taken(Symbol),
}

impl Cell {
    pub fn symbol(self) -> Option<Symbol> {
        match self {
            Cell::Empty => None,
            Cell::Taken(symbol) => Some(symbol),
        }
    }
}

impl From<Cell> for String {
    fn from(cell: Cell) -> Self {
        match cell {
            Cell::Empty => String::new(),
            Cell::Taken(symbol) => symbol.as_str().to_owned(),
        }
    }
}

impl TryFrom<String> for Cell {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "" => Ok(Cell::Empty),
            "X" => Ok(Cell::Taken(Symbol::X)),
            "O" => Ok(Cell::Taken(Symbol::O)),
            other => Err(format!("expected \"\", \"X\" or \"O\", got {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    cells: [Cell; 9],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cells(cells: [Cell; 9]) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Cell; 9] {
        &self.cells
    }

    pub fn get(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    pub fn is_vacant(&self, index: usize) -> bool {
        self.get(index) == Some(Cell::Empty)
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| *cell != Cell::Empty)
    }

    pub fn is_clear(&self) -> bool {
        self.cells.iter().all(|cell| *cell == Cell::Empty)
    }

    pub fn place(&mut self, index: usize, symbol: Symbol) -> SessionResult<()> {
        if !self.is_vacant(index) {
            return Err(SessionError::IllegalMove);
        }
        self.cells[index] = Cell::Taken(symbol);
        Ok(())
    }

    /// The single move that turns `self` into `next`, if there is exactly one.
    ///
    /// `next` may only differ from `self` in one cell, and that cell must be
    /// empty here.
    pub fn single_move_to(&self, next: &Board) -> Option<(usize, Symbol)> {
        let mut changed = self
            .cells
            .iter()
            .zip(next.cells.iter())
            .enumerate()
            .filter(|(_, (before, after))| before != after);

        let (index, (before, after)) = changed.next()?;
        if changed.next().is_some() || *before != Cell::Empty {
            return None;
        }
        after.symbol().map(|symbol| (index, symbol))
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (row, cells) in self.cells.chunks(3).enumerate() {
            if row > 0 {
                f.write_str("\n-+-+-\n")?;
            }
            for (col, cell) in cells.iter().enumerate() {
                if col > 0 {
                    f.write_str("|")?;
                }
                match cell {
                    Cell::Empty => f.write_str(" ")?,
                    Cell::Taken(symbol) => write!(f, "{symbol}")?,
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Win(Symbol),
    Draw,
    Open,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        self != Outcome::Open
    }
}

pub fn evaluate(board: &Board) -> Outcome {
    for [a, b, c] in WINNING_LINES {
        let cell = board.cells[a];
        if let Cell::Taken(symbol) = cell
            && cell == board.cells[b]
            && cell == board.cells[c]
        {
            return Outcome::Win(symbol);
        }
    }

    if board.is_full() {
        Outcome::Draw
    } else {
        Outcome::Open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(layout: &str) -> Board {
        let mut cells = [Cell::Empty; 9];
        for (cell, ch) in cells.iter_mut().zip(layout.chars()) {
            *cell = match ch {
                'X' => Cell::Taken(Symbol::X),
                'O' => Cell::Taken(Symbol::O),
                _ => Cell::Empty,
            };
        }
        Board::from_cells(cells)
    }

    #[test]
    fn empty_board_is_open() {
        assert_eq!(evaluate(&Board::new()), Outcome::Open);
    }

    #[test]
    fn column_wins() {
        assert_eq!(evaluate(&board(".O..O..O.")), Outcome::Win(Symbol::O));
    }

    #[test]
    fn anti_diagonal_wins() {
        assert_eq!(evaluate(&board("..X.X.X..")), Outcome::Win(Symbol::X));
    }

    #[test]
    fn full_board_without_line_is_draw() {
        assert_eq!(evaluate(&board("XOXXOOOXX")), Outcome::Draw);
    }

    #[test]
    fn win_on_last_cell_beats_draw() {
        assert_eq!(evaluate(&board("XOXOXOOXX")), Outcome::Win(Symbol::X));
    }

    #[test]
    fn place_refuses_taken_cell() {
        let mut b = board("X........");
        assert_eq!(b.place(0, Symbol::O), Err(SessionError::IllegalMove));
        assert_eq!(b.place(9, Symbol::O), Err(SessionError::IllegalMove));
        assert_eq!(b, board("X........"));
    }

    #[test]
    fn single_move_is_detected() {
        let before = board("X........");
        assert_eq!(
            before.single_move_to(&board("X...O....")),
            Some((4, Symbol::O))
        );
        assert_eq!(before.single_move_to(&before), None);
        assert_eq!(before.single_move_to(&board("X...OO...")), None);
        assert_eq!(before.single_move_to(&board("O........")), None);
        assert_eq!(before.single_move_to(&board(".........")), None);
    }

    #[test]
    fn board_uses_string_cells_on_the_wire() {
        let json = serde_json::to_string(&board("....X....")).unwrap();
        assert_eq!(json, r#"["","","","","X","","","",""]"#);
        let back: Board = serde_json::from_str(&json).unwrap();
        assert_eq!(back, board("....X...."));
        assert!(serde_json::from_str::<Board>(r#"["Z","","","","","","","",""]"#).is_err());
    }

    #[test]
    fn display_draws_grid() {
        assert_eq!(board("X...O...X").to_string(), "X| | \n-+-+-\n |O| \n-+-+-\n | |X");
    }
}
