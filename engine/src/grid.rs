use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{GameError, Player, COLUMNS, CONNECT, ROWS};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cell {
    #[default]
    Empty,
    Red,
    Yellow,
}

impl Cell {
    pub fn owner(self) -> Option<Player> {
        match self {
            Cell::Empty => None,
            Cell::Red => Some(Player::Red),
            Cell::Yellow => Some(Player::Yellow),
        }
    }

    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }

    fn symbol(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Red => 'R',
            Cell::Yellow => 'Y',
        }
    }
}

impl From<Player> for Cell {
    fn from(player: Player) -> Self {
        match player {
            Player::Red => Cell::Red,
            Player::Yellow => Cell::Yellow,
        }
    }
}

/// Row 0 is the top of the grid, row `ROWS - 1` the bottom.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Moves `times` steps along `(dr, dc)`, `None` when that leaves the grid.
    pub(crate) fn offset(self, (dr, dc): (isize, isize), times: isize) -> Option<Coord> {
        let row = self.row.checked_add_signed(dr * times)?;
        let col = self.col.checked_add_signed(dc * times)?;
        (row < ROWS && col < COLUMNS).then_some(Coord { row, col })
    }

    fn step(self, dir: (isize, isize)) -> Option<Coord> {
        self.offset(dir, 1)
    }
}

pub type WinningLine = [Coord; CONNECT];

pub(crate) const RIGHT: (isize, isize) = (0, 1);
pub(crate) const DOWN: (isize, isize) = (1, 0);
pub(crate) const UP: (isize, isize) = (-1, 0);
pub(crate) const UP_RIGHT: (isize, isize) = (-1, 1);
pub(crate) const DOWN_RIGHT: (isize, isize) = (1, 1);

/// The playing field plus the line that produced the most recent win.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    cells: [[Cell; COLUMNS]; ROWS],
    winning_line: Option<WinningLine>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

fn check_bounds(row: usize, col: usize) {
    assert!(
        row < ROWS && col < COLUMNS,
        "cell ({row}, {col}) is out of bounds"
    );
}

impl Grid {
    pub fn new() -> Self {
        Self {
            cells: [[Cell::Empty; COLUMNS]; ROWS],
            winning_line: None,
        }
    }

    /// # Panics
    ///
    /// Panics if `col >= COLUMNS`.
    pub fn is_column_full(&self, col: usize) -> bool {
        assert!(col < COLUMNS, "column {col} is out of bounds");
        !self.cells[0][col].is_empty()
    }

    /// The landing row for a piece dropped into `col`, or `None` when full.
    ///
    /// # Panics
    ///
    /// Panics if `col >= COLUMNS`.
    pub fn lowest_empty_row(&self, col: usize) -> Option<usize> {
        assert!(col < COLUMNS, "column {col} is out of bounds");
        (0..ROWS).rev().find(|&row| self.cells[row][col].is_empty())
    }

    /// Unchecked write. Callers are responsible for gravity and for not
    /// overwriting a committed piece.
    pub fn place(&mut self, row: usize, col: usize, cell: Cell) {
        check_bounds(row, col);
        self.cells[row][col] = cell;
    }

    pub fn cell_at(&self, row: usize, col: usize) -> Cell {
        check_bounds(row, col);
        self.cells[row][col]
    }

    pub fn is_full(&self) -> bool {
        (0..COLUMNS).all(|col| self.is_column_full(col))
    }

    /// A cell a piece can reach this turn: on the bottom row or resting on
    /// another piece.
    pub fn is_landable(&self, row: usize, col: usize) -> bool {
        row == ROWS - 1 || !self.cells[row + 1][col].is_empty()
    }

    pub fn open_columns(&self) -> impl Iterator<Item = usize> + '_ {
        (0..COLUMNS).filter(move |&col| !self.is_column_full(col))
    }

    pub fn move_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| !cell.is_empty())
            .count()
    }

    pub fn winning_line(&self) -> Option<WinningLine> {
        self.winning_line
    }

    /// Checks whether the occupant of `(row, col)` is part of four in a row
    /// and records the line if so.
    pub fn has_winning_line_through(&mut self, row: usize, col: usize) -> bool {
        match self.winning_line_through(row, col) {
            Some(line) => {
                self.winning_line = Some(line);
                true
            }
            None => false,
        }
    }

    /// Same detection as [`Grid::has_winning_line_through`] without touching
    /// the recorded line.
    ///
    /// Families are scanned horizontal, vertical, rising, falling; the first
    /// run of at least four through the anchor wins and its first four cells
    /// (in scan order) are returned.
    pub fn winning_line_through(&self, row: usize, col: usize) -> Option<WinningLine> {
        let owner = self.cells[row][col];
        if owner.is_empty() {
            return None;
        }
        let anchor = Coord::new(row, col);

        self.scan(Coord::new(row, 0), RIGHT, anchor, owner)
            .or_else(|| self.scan(Coord::new(0, col), DOWN, anchor, owner))
            .or_else(|| {
                // Rising diagonal starts at its bottom-left end.
                let shift = (ROWS - 1 - row).min(col);
                let start = Coord::new(row + shift, col - shift);
                self.scan(start, UP_RIGHT, anchor, owner)
            })
            .or_else(|| {
                // Falling diagonal starts at its top-left end.
                let shift = row.min(col);
                let start = Coord::new(row - shift, col - shift);
                self.scan(start, DOWN_RIGHT, anchor, owner)
            })
    }

    /// Walks one line with a running counter, reporting the first run of
    /// `CONNECT` or more that contains `anchor`.
    fn scan(
        &self,
        start: Coord,
        dir: (isize, isize),
        anchor: Coord,
        owner: Cell,
    ) -> Option<WinningLine> {
        let mut run_start = start;
        let mut count = 0;
        let mut anchor_in_run = false;
        let mut cursor = Some(start);

        while let Some(pos) = cursor {
            if self.cells[pos.row][pos.col] == owner {
                if count == 0 {
                    run_start = pos;
                    anchor_in_run = false;
                }
                count += 1;
                anchor_in_run |= pos == anchor;
                if count >= CONNECT && anchor_in_run {
                    return Some(line_from(run_start, dir));
                }
            } else {
                count = 0;
            }
            cursor = pos.step(dir);
        }
        None
    }

    pub fn reset(&mut self) {
        self.cells = [[Cell::Empty; COLUMNS]; ROWS];
        self.winning_line = None;
    }
}

fn line_from(start: Coord, dir: (isize, isize)) -> WinningLine {
    // Only called for runs already walked inside the grid.
    std::array::from_fn(|i| start.offset(dir, i as isize).unwrap_or(start))
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            let line: String = row.iter().map(|cell| cell.symbol()).collect();
            writeln!(f, "{line}")?;
        }
        let footer: String = (0..COLUMNS)
            .map(|col| char::from_digit(col as u32, 10).unwrap_or('?'))
            .collect();
        write!(f, "{footer}")
    }
}

/// Parses a board diagram: `ROWS` lines of `COLUMNS` symbols, top row first,
/// using `.` for empty, `R` and `Y` for pieces. Blank lines and whitespace
/// inside a line are ignored. Floating pieces are rejected.
impl FromStr for Grid {
    type Err = GameError;

    fn from_str(diagram: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> = diagram
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        if lines.len() != ROWS {
            return Err(GameError::ParseGrid {
                line: lines.len(),
                reason: format!("expected {ROWS} rows, found {}", lines.len()),
            });
        }

        let mut grid = Grid::new();
        for (row, line) in lines.iter().enumerate() {
            let symbols: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
            if symbols.len() != COLUMNS {
                return Err(GameError::ParseGrid {
                    line: row,
                    reason: format!("expected {COLUMNS} cells, found {}", symbols.len()),
                });
            }
            for (col, symbol) in symbols.into_iter().enumerate() {
                let cell = match symbol {
                    '.' => Cell::Empty,
                    'R' | 'r' => Cell::Red,
                    'Y' | 'y' => Cell::Yellow,
                    other => {
                        return Err(GameError::ParseGrid {
                            line: row,
                            reason: format!("unexpected symbol {other}"),
                        })
                    }
                };
                grid.place(row, col, cell);
            }
        }

        for row in 0..ROWS - 1 {
            for col in 0..COLUMNS {
                if !grid.cell_at(row, col).is_empty() && grid.cell_at(row + 1, col).is_empty() {
                    return Err(GameError::ParseGrid {
                        line: row,
                        reason: format!("floating piece in column {col}"),
                    });
                }
            }
        }
        Ok(grid)
    }
}
