//! Checks `evaluate` against every one of the 3^9 possible boards.

use xoxo::game::{Board, Cell, Outcome, Symbol, WINNING_LINES, evaluate};

fn board_from_index(mut index: u32) -> Board {
    let mut cells = [Cell::Empty; 9];
    for cell in &mut cells {
        *cell = match index % 3 {
            0 => Cell::Empty,
            1 => Cell::Taken(Symbol::X),
            _ => Cell::Taken(Symbol::O),
        };
        index /= 3;
    }
    Board::from_cells(cells)
}

fn line_owner(board: &Board, line: [usize; 3]) -> Option<Symbol> {
    let cells = board.cells();
    let first = cells[line[0]].symbol()?;
    line.iter()
        .all(|&i| cells[i] == Cell::Taken(first))
        .then_some(first)
}

#[test]
fn evaluate_is_exact_over_all_boards() {
    let mut wins = 0;
    let mut draws = 0;

    for index in 0..3u32.pow(9) {
        let board = board_from_index(index);
        let owners: Vec<Symbol> = WINNING_LINES
            .iter()
            .filter_map(|&line| line_owner(&board, line))
            .collect();

        match evaluate(&board) {
            Outcome::Win(symbol) => {
                assert!(owners.contains(&symbol), "false win for {symbol}:\n{board}");
                wins += 1;
            }
            Outcome::Draw => {
                assert!(owners.is_empty(), "draw with a winning line:\n{board}");
                assert!(board.is_full(), "draw on an open board:\n{board}");
                draws += 1;
            }
            Outcome::Open => {
                assert!(owners.is_empty(), "missed a win:\n{board}");
                assert!(!board.is_full(), "full board left open:\n{board}");
            }
        }
    }

    assert!(wins > 0);
    assert!(draws > 0);
}

#[test]
fn board_from_index_covers_extremes() {
    assert!(board_from_index(0).is_clear());
    assert!(board_from_index(3u32.pow(9) - 1).is_full());
}
