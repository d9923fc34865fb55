//! Board representation and the connect-five rules engine.
//!
//! The grid is stored column-major: `columns[c][r]` where row `0` is the top of
//! the column (the cell a disc enters through) and the last row is the bottom.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of columns on a standard board.
pub const BOARD_COLUMNS: usize = 9;
/// Number of rows on a standard board.
pub const BOARD_ROWS: usize = 6;
/// Contiguous discs required to win.
pub const WINNING_COUNT: usize = 5;
/// Matching neighbours needed on top of the landing cell.
const MAX_COUNT: usize = WINNING_COUNT - 1;

/// Marker placed by a player. Seat order decides the disc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Disc {
    /// First seat.
    #[serde(rename = "x")]
    X,
    /// Second seat.
    #[serde(rename = "o")]
    O,
    /// Third seat (three-player games only).
    #[serde(rename = "z")]
    Z,
}

impl Disc {
    /// Discs indexed by join order.
    pub const BY_SEAT: [Disc; 3] = [Disc::X, Disc::O, Disc::Z];

    /// Disc for the player who joined at `seat` (0-based).
    pub fn for_seat(seat: usize) -> Option<Disc> {
        Self::BY_SEAT.get(seat).copied()
    }

    /// Character used on the wire and in board dumps.
    pub fn symbol(self) -> char {
        match self {
            Disc::X => 'x',
            Disc::O => 'o',
            Disc::Z => 'z',
        }
    }
}

/// Raised when a serialized cell holds an unknown marker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown board cell marker `{0}`")]
pub struct InvalidCell(pub char);

/// Single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "char", try_from = "char")]
pub enum Cell {
    /// Nothing dropped here yet.
    #[default]
    Empty,
    /// Occupied by a disc.
    Filled(Disc),
}

impl Cell {
    const EMPTY_SYMBOL: char = '-';

    /// True when no disc occupies the cell.
    pub fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl From<Cell> for char {
    fn from(cell: Cell) -> Self {
        match cell {
            Cell::Empty => Cell::EMPTY_SYMBOL,
            Cell::Filled(disc) => disc.symbol(),
        }
    }
}

impl TryFrom<char> for Cell {
    type Error = InvalidCell;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            Cell::EMPTY_SYMBOL => Ok(Cell::Empty),
            'x' => Ok(Cell::Filled(Disc::X)),
            'o' => Ok(Cell::Filled(Disc::O)),
            'z' => Ok(Cell::Filled(Disc::Z)),
            other => Err(InvalidCell(other)),
        }
    }
}

impl From<Disc> for Cell {
    fn from(disc: Disc) -> Self {
        Cell::Filled(disc)
    }
}

/// 0-based location of a landed disc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Column index, 0 is the leftmost column.
    pub column: usize,
    /// Row index, 0 is the top row.
    pub row: usize,
}

impl Coordinates {
    /// Build coordinates from a `(column, row)` pair.
    pub fn new(column: usize, row: usize) -> Self {
        Self { column, row }
    }

    fn offset(self, (dc, dr): Step, distance: usize) -> Option<(usize, usize)> {
        let distance = isize::try_from(distance).ok()?;
        let column = isize::try_from(self.column).ok()? + dc * distance;
        let row = isize::try_from(self.row).ok()? + dr * distance;
        Some((usize::try_from(column).ok()?, usize::try_from(row).ok()?))
    }
}

/// Column-major playing grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    columns: Vec<Vec<Cell>>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Empty standard 9x6 board.
    pub fn new() -> Self {
        Self::with_size(BOARD_COLUMNS, BOARD_ROWS)
    }

    /// Empty board of arbitrary dimensions.
    pub fn with_size(columns: usize, rows: usize) -> Self {
        Self {
            columns: vec![vec![Cell::Empty; rows]; columns],
        }
    }

    /// Wrap pre-built columns. Columns may differ in height.
    pub fn from_columns(columns: Vec<Vec<Cell>>) -> Self {
        Self { columns }
    }

    /// Column-major view of the grid.
    pub fn columns(&self) -> &[Vec<Cell>] {
        &self.columns
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Cell at a 0-based location, `None` when outside the grid.
    pub fn cell(&self, column: usize, row: usize) -> Option<Cell> {
        self.columns.get(column)?.get(row).copied()
    }

    /// True once every column has been filled to the top.
    pub fn is_full(&self) -> bool {
        self.columns
            .iter()
            .all(|column| column.first().is_none_or(|cell| !cell.is_empty()))
    }

    /// Drop `disc` into the 1-based `column`.
    ///
    /// Returns the landing cell, or `None` when the column is full or does not
    /// exist. The board is only modified on success.
    pub fn make_move(&mut self, column: usize, disc: Disc) -> Option<Coordinates> {
        let index = column.checked_sub(1)?;
        let cells = self.columns.get_mut(index)?;
        if !cells.first()?.is_empty() {
            return None;
        }

        let row = match cells.iter().position(|cell| !cell.is_empty()) {
            Some(occupied) => occupied - 1,
            None => cells.len() - 1,
        };
        cells[row] = Cell::Filled(disc);
        Some(Coordinates::new(index, row))
    }

    fn holds(&self, location: Option<(usize, usize)>, disc: Disc) -> bool {
        location
            .and_then(|(column, row)| self.cell(column, row))
            .is_some_and(|cell| cell == Cell::Filled(disc))
    }

    /// Count contiguous `disc` cells from `from` (exclusive) along `step`,
    /// stopping after [`MAX_COUNT`] matches.
    fn run_length(&self, disc: Disc, from: Coordinates, step: Step) -> usize {
        (1..=MAX_COUNT)
            .take_while(|distance| self.holds(from.offset(step, *distance), disc))
            .count()
    }

    /// Check a line through `at` scanning `forward` first, then `backward`.
    fn completes_line(&self, disc: Disc, at: Coordinates, forward: Step, backward: Step) -> bool {
        let ahead = self.run_length(disc, at, forward);
        if ahead == MAX_COUNT {
            return true;
        }
        1 + ahead + self.run_length(disc, at, backward) >= WINNING_COUNT
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = (1..=self.width())
            .map(|column| (column % 10).to_string())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(f, "{header}")?;

        let height = self.columns.iter().map(Vec::len).max().unwrap_or(0);
        for row in 0..height {
            let line = (0..self.width())
                .map(|column| self.cell(column, row).map_or(' ', char::from).to_string())
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Column/row delta applied per scan step.
type Step = (isize, isize);

/// Diagonal orientation as drawn on the board (row 0 at the top).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagonal {
    /// `\`: down-right, then up-left.
    Falling,
    /// `/`: up-right, then down-left.
    Rising,
}

impl Diagonal {
    fn steps(self) -> (Step, Step) {
        match self {
            Diagonal::Falling => ((1, 1), (-1, -1)),
            Diagonal::Rising => ((1, -1), (-1, 1)),
        }
    }
}

/// Signature shared by the individual line checks.
pub type LineCheck<'a> = &'a dyn Fn(&Board, Disc, Coordinates) -> bool;

/// Five in a column. Only cells below the landing cell can match.
pub fn check_vertical(board: &Board, disc: Disc, at: Coordinates) -> bool {
    board.run_length(disc, at, (0, 1)) == MAX_COUNT
}

/// Five in a row, scanning right then left.
pub fn check_horizontal(board: &Board, disc: Disc, at: Coordinates) -> bool {
    board.completes_line(disc, at, (1, 0), (-1, 0))
}

/// Five along the given diagonal.
pub fn check_diagonal(board: &Board, disc: Disc, at: Coordinates, diagonal: Diagonal) -> bool {
    let (forward, backward) = diagonal.steps();
    board.completes_line(disc, at, forward, backward)
}

/// Five along `\`.
pub fn check_diagonal_falling(board: &Board, disc: Disc, at: Coordinates) -> bool {
    check_diagonal(board, disc, at, Diagonal::Falling)
}

/// Five along `/`.
pub fn check_diagonal_rising(board: &Board, disc: Disc, at: Coordinates) -> bool {
    check_diagonal(board, disc, at, Diagonal::Rising)
}

/// Whether the disc that just landed at `at` completes a line.
pub fn has_won(board: &Board, disc: Disc, at: Coordinates) -> bool {
    has_won_with(
        &[
            &check_vertical,
            &check_horizontal,
            &check_diagonal_falling,
            &check_diagonal_rising,
        ],
        board,
        disc,
        at,
    )
}

/// Run `checks` in order, stopping at the first line found.
pub fn has_won_with(checks: &[LineCheck<'_>], board: &Board, disc: Disc, at: Coordinates) -> bool {
    checks.iter().any(|check| check(board, disc, at))
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell as Counter, RefCell};

    use super::*;

    /// Build a board from columns written top to bottom, e.g. `"--xxxx"`.
    fn board(columns: &[&str]) -> Board {
        Board::from_columns(
            columns
                .iter()
                .map(|column| {
                    column
                        .chars()
                        .map(|c| Cell::try_from(c).unwrap())
                        .collect()
                })
                .collect(),
        )
    }

    fn at(column: usize, row: usize) -> Coordinates {
        Coordinates::new(column, row)
    }

    #[test]
    fn single_column_drop_lands_at_bottom() {
        let mut board = board(&["------"]);
        assert_eq!(board.make_move(1, Disc::X), Some(at(0, 5)));
        assert_eq!(board.cell(0, 5), Some(Cell::Filled(Disc::X)));
    }

    #[test]
    fn drop_stacks_on_existing_discs() {
        let mut board = board(&["---xox", "------"]);
        assert_eq!(board.make_move(1, Disc::O), Some(at(0, 2)));
        assert_eq!(board.make_move(2, Disc::O), Some(at(1, 5)));
    }

    #[test]
    fn full_column_is_rejected_and_board_untouched() {
        let mut board = board(&["xoxoxo", "------"]);
        let before = board.clone();
        assert_eq!(board.make_move(1, Disc::Z), None);
        assert_eq!(board, before);
    }

    #[test]
    fn out_of_range_column_is_rejected() {
        let mut board = Board::new();
        assert_eq!(board.make_move(0, Disc::X), None);
        assert_eq!(board.make_move(BOARD_COLUMNS + 1, Disc::X), None);
        assert_eq!(board, Board::new());
    }

    #[test]
    fn repeated_drops_never_leave_gaps() {
        let mut board = Board::new();
        let discs = [Disc::X, Disc::O, Disc::Z];
        for turn in 0..BOARD_COLUMNS * BOARD_ROWS {
            let column = (turn * 7) % BOARD_COLUMNS + 1;
            board.make_move(column, discs[turn % 3]);

            for cells in board.columns() {
                let first_filled = cells.iter().position(|cell| !cell.is_empty());
                if let Some(first) = first_filled {
                    assert!(cells[first..].iter().all(|cell| !cell.is_empty()));
                }
            }
        }
        assert!(board.is_full());
    }

    #[test]
    fn column_fills_bottom_up_then_refuses() {
        let mut board = Board::new();
        for expected_row in (0..BOARD_ROWS).rev() {
            assert_eq!(board.make_move(4, Disc::O), Some(at(3, expected_row)));
        }
        assert_eq!(board.make_move(4, Disc::O), None);
    }

    #[test]
    fn vertical_five_downwards_wins() {
        let board = board(&["-xxxxx"]);
        assert!(check_vertical(&board, Disc::X, at(0, 1)));
    }

    #[test]
    fn vertical_mixed_discs_do_not_win() {
        let board = board(&["xoxxxx"]);
        assert!(!check_vertical(&board, Disc::X, at(0, 0)));
    }

    #[test]
    fn vertical_short_stack_does_not_win() {
        let board = board(&["----oo"]);
        assert!(!check_vertical(&board, Disc::O, at(0, 4)));
    }

    #[test]
    fn horizontal_five_scanning_right_wins() {
        let board = board(&["o", "x", "x", "x", "x", "x", "o", "o", "x"]);
        assert!(check_horizontal(&board, Disc::X, at(1, 0)));
    }

    #[test]
    fn horizontal_five_scanning_left_wins() {
        let board = board(&["o", "x", "x", "x", "x", "x", "o", "o", "x"]);
        assert!(check_horizontal(&board, Disc::X, at(5, 0)));
    }

    #[test]
    fn horizontal_five_ending_at_left_edge_wins() {
        let board = board(&["x", "x", "x", "x", "x", "o", "o", "o", "x"]);
        assert!(check_horizontal(&board, Disc::X, at(4, 0)));
    }

    #[test]
    fn horizontal_five_from_the_middle_wins() {
        let board = board(&["o", "x", "x", "x", "x", "x", "o", "o", "x"]);
        assert!(check_horizontal(&board, Disc::X, at(3, 0)));
    }

    #[test]
    fn horizontal_four_does_not_win() {
        let board = board(&["o", "o", "x", "x", "x", "x", "o", "o", "x"]);
        assert!(!check_horizontal(&board, Disc::X, at(4, 0)));
    }

    #[test]
    fn horizontal_broken_by_empty_cell_does_not_win() {
        let right_edge = board(&["o", "o", "x", "o", "-", "x", "x", "x", "x"]);
        assert!(!check_horizontal(&right_edge, Disc::X, at(8, 0)));

        let left_edge = board(&["x", "x", "x", "o", "-", "x", "x", "x", "x"]);
        assert!(!check_horizontal(&left_edge, Disc::X, at(1, 0)));
    }

    #[test]
    fn falling_diagonal_from_top_left_wins() {
        let board = board(&[
            "o", "-o", "--o", "--xo", "--xxo", "------", "------", "------", "------",
        ]);
        assert!(check_diagonal_falling(&board, Disc::O, at(0, 0)));
    }

    #[test]
    fn falling_diagonal_both_ways_wins() {
        let board = board(&[
            "x", "-o", "--o", "---o", "--xxo", "---xxo", "------", "------", "------",
        ]);
        assert!(check_diagonal_falling(&board, Disc::O, at(3, 3)));
    }

    #[test]
    fn falling_diagonal_too_short_does_not_win() {
        let board = board(&[
            "x", "-o", "--o", "---o", "--xxo", "---xxx", "------", "------", "------",
        ]);
        assert!(!check_diagonal_falling(&board, Disc::O, at(3, 3)));
    }

    #[test]
    fn rising_diagonal_both_ways_wins() {
        let board = board(&[
            "----x", "---xo", "--xxo", "-xoox", "xxoox", "------", "------", "------", "------",
        ]);
        assert!(check_diagonal_rising(&board, Disc::X, at(1, 3)));
    }

    #[test]
    fn rising_diagonal_scanning_left_down_wins() {
        let board = board(&[
            "----x", "---x", "--x", "-x", "x", "------", "------", "------", "------",
        ]);
        assert!(check_diagonal_rising(&board, Disc::X, at(4, 0)));
    }

    #[test]
    fn rising_diagonal_scanning_right_up_wins() {
        let board = board(&[
            "----x", "---x", "--x", "-x", "x", "------", "------", "------", "------",
        ]);
        assert!(check_diagonal_rising(&board, Disc::X, at(0, 4)));
    }

    #[test]
    fn rising_diagonal_broken_does_not_win() {
        let board = board(&[
            "----x", "---o", "--x", "-x", "x", "------", "------", "------", "------",
        ]);
        assert!(!check_diagonal_rising(&board, Disc::X, at(0, 4)));
        assert!(!check_diagonal_rising(&board, Disc::X, at(4, 0)));
    }

    #[test]
    fn wins_are_detected_wherever_the_last_disc_lands() {
        // The same five-cell line must be found whichever cell completes it.
        let mut lines = Vec::new();
        let mut horizontal = Board::new();
        for column in 1..=5 {
            horizontal.make_move(column, Disc::O);
        }
        lines.push((horizontal, (0..5).map(|c| at(c, 5)).collect::<Vec<_>>()));

        let mut rising = Board::new();
        for (column, filler) in [(1, 0), (2, 1), (3, 2), (4, 3), (5, 4)] {
            for _ in 0..filler {
                rising.make_move(column, Disc::X);
            }
        }
        for column in 1..=5 {
            rising.make_move(column, Disc::O);
        }
        lines.push((rising, (0..5).map(|c| at(c, 5 - c)).collect()));

        let mut falling = Board::new();
        for (column, filler) in [(1, 4), (2, 3), (3, 2), (4, 1), (5, 0)] {
            for _ in 0..filler {
                falling.make_move(column, Disc::X);
            }
        }
        for column in 1..=5 {
            falling.make_move(column, Disc::O);
        }
        lines.push((falling, (0..5).map(|c| at(c, c + 1)).collect()));

        for (board, cells) in lines {
            for cell in cells {
                assert!(has_won(&board, Disc::O, cell), "missed win at {cell:?}");
            }
        }
    }

    #[test]
    fn has_won_short_circuits_on_first_line() {
        let calls = RefCell::new(Vec::new());
        let vertical = |_: &Board, _: Disc, _: Coordinates| {
            calls.borrow_mut().push("vertical");
            false
        };
        let horizontal = |_: &Board, _: Disc, _: Coordinates| {
            calls.borrow_mut().push("horizontal");
            false
        };
        let falling = |board: &Board, disc: Disc, coords: Coordinates| {
            assert_eq!(board, &Board::new());
            assert_eq!(disc, Disc::X);
            assert_eq!(coords, at(0, 1));
            calls.borrow_mut().push("falling");
            true
        };
        let rising = |_: &Board, _: Disc, _: Coordinates| {
            calls.borrow_mut().push("rising");
            false
        };

        assert!(has_won_with(
            &[&vertical, &horizontal, &falling, &rising],
            &Board::new(),
            Disc::X,
            at(0, 1)
        ));
        assert_eq!(*calls.borrow(), vec!["vertical", "horizontal", "falling"]);
    }

    #[test]
    fn has_won_runs_every_check_when_nothing_matches() {
        let calls = Counter::new(0);
        let miss = |_: &Board, _: Disc, _: Coordinates| {
            calls.set(calls.get() + 1);
            false
        };
        assert!(!has_won_with(&[&miss, &miss, &miss, &miss], &Board::new(), Disc::O, at(2, 5)));
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn vertical_check_short_circuits_the_rest() {
        let order = RefCell::new(Vec::new());
        let vertical = |_: &Board, _: Disc, _: Coordinates| {
            order.borrow_mut().push("vertical");
            true
        };
        let other = |_: &Board, _: Disc, _: Coordinates| {
            order.borrow_mut().push("other");
            false
        };
        let checks: [LineCheck<'_>; 4] = [&vertical, &other, &other, &other];
        assert!(has_won_with(&checks, &Board::new(), Disc::X, at(0, 0)));
        assert_eq!(*order.borrow(), vec!["vertical"]);
    }

    #[test]
    fn cells_serialize_as_single_characters() {
        let mut board = Board::with_size(2, 2);
        board.make_move(2, Disc::Z);
        let json = serde_json::to_string(&board).unwrap();
        assert_eq!(json, r#"[["-","-"],["-","z"]]"#);

        let parsed: Board = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, board);
        assert!(serde_json::from_str::<Board>(r#"[["q"]]"#).is_err());
    }

    #[test]
    fn display_renders_rows_top_down() {
        let mut board = Board::with_size(3, 2);
        board.make_move(1, Disc::X);
        board.make_move(1, Disc::O);
        board.make_move(3, Disc::Z);
        assert_eq!(board.to_string(), "1 2 3\no - -\nx - z\n");
    }
}
