//! Tiered computer opponent.
//!
//! Every difficulty runs an ordered cascade of tactical rules. Each rule
//! either names a column or passes; the first column named is the move. Rules
//! probe the grid by staging a piece, inspecting, and clearing the cell again,
//! so the grid is handed back exactly as it was received.
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::grid::{Cell, Coord, Grid, DOWN_RIGHT, RIGHT, UP, UP_RIGHT};
use crate::{Difficulty, Player, COLUMNS, ROWS};

/// Centre-first column preference.
const CENTRE_ORDER: [usize; COLUMNS] = [3, 2, 4, 1, 5, 0, 6];

const CENTRE_WEIGHT: i32 = 3;
const THREAT_BONUS: i32 = 10;
const GIFT_PENALTY: i32 = 50;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Rule {
    ImmediateWin,
    BlockWin,
    /// Two stacked opponent pieces.
    VerticalPairs,
    /// Two adjacent opponent pieces on a row or diagonal.
    LinePairs,
    Triples,
    Centre,
    Scored,
    Random,
}

const EASY: &[Rule] = &[Rule::ImmediateWin, Rule::Random];
const MEDIUM: &[Rule] = &[Rule::ImmediateWin, Rule::BlockWin, Rule::Random];
const HARD: &[Rule] = &[
    Rule::ImmediateWin,
    Rule::BlockWin,
    Rule::LinePairs,
    Rule::Triples,
    Rule::Centre,
    Rule::Random,
];
const EXPERT: &[Rule] = &[
    Rule::ImmediateWin,
    Rule::BlockWin,
    Rule::VerticalPairs,
    Rule::LinePairs,
    Rule::Triples,
    Rule::Scored,
    Rule::Random,
];

fn cascade(difficulty: Difficulty) -> &'static [Rule] {
    match difficulty {
        Difficulty::Easy => EASY,
        Difficulty::Medium => MEDIUM,
        Difficulty::Hard => HARD,
        Difficulty::Expert => EXPERT,
    }
}

/// A contiguous window of cells plus the cells that would extend it, in
/// blocking preference order.
#[derive(Clone, Debug)]
struct Run {
    cells: Vec<Coord>,
    extensions: Vec<Coord>,
}

#[derive(Copy, Clone, Debug)]
enum Family {
    Row,
    Column,
    Rising,
    Falling,
}

impl Family {
    const ALL: [Family; 4] = [Family::Row, Family::Column, Family::Rising, Family::Falling];

    /// Forward direction of a run; the backward extension sits one step
    /// against it.
    fn direction(self) -> (isize, isize) {
        match self {
            Family::Row => RIGHT,
            Family::Column => UP,
            Family::Rising => UP_RIGHT,
            Family::Falling => DOWN_RIGHT,
        }
    }

    /// Start cells in scan order.
    fn starts(self) -> Vec<Coord> {
        match self {
            Family::Row | Family::Rising => (0..ROWS)
                .rev()
                .flat_map(|row| (0..COLUMNS).map(move |col| Coord::new(row, col)))
                .collect(),
            Family::Column => (0..COLUMNS)
                .flat_map(|col| (0..ROWS).rev().map(move |row| Coord::new(row, col)))
                .collect(),
            Family::Falling => (0..ROWS)
                .flat_map(|row| (0..COLUMNS).map(move |col| Coord::new(row, col)))
                .collect(),
        }
    }

    fn runs(self, len: usize) -> Vec<Run> {
        let dir = self.direction();
        self.starts()
            .into_iter()
            .filter_map(|start| {
                let cells = (0..len as isize)
                    .map(|i| start.offset(dir, i))
                    .collect::<Option<Vec<_>>>()?;
                let extensions = [start.offset(dir, len as isize), start.offset(dir, -1)]
                    .into_iter()
                    .flatten()
                    .collect();
                Some(Run { cells, extensions })
            })
            .collect()
    }
}

struct RunTable {
    pairs: [Vec<Run>; 4],
    triples: [Vec<Run>; 4],
}

/// Precomputed pair and triple windows, indexed like `Family::ALL`.
static RUNS: Lazy<RunTable> = Lazy::new(|| RunTable {
    pairs: Family::ALL.map(|family| family.runs(2)),
    triples: Family::ALL.map(|family| family.runs(3)),
});

#[derive(Clone, Debug)]
pub struct Opponent {
    difficulty: Difficulty,
    rng: StdRng,
}

impl Opponent {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic opponent, for tests and reproducible sessions.
    pub fn with_seed(difficulty: Difficulty, seed: u64) -> Self {
        Self {
            difficulty,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    /// Picks the computer's column. The grid is only borrowed for probing and
    /// comes back unchanged; committing the move is up to the caller.
    ///
    /// Returns `None` only when every column is full.
    pub fn select_column(
        &mut self,
        grid: &mut Grid,
        opponent: Player,
        computer: Player,
    ) -> Option<usize> {
        let difficulty = self.difficulty;
        let (rule, column) = cascade(difficulty)
            .iter()
            .find_map(|&rule| {
                self.apply(rule, grid, opponent, computer)
                    .map(|column| (rule, column))
            })?;
        debug_assert!(!grid.is_column_full(column));
        debug!(?difficulty, ?rule, column, "computer picked a column");
        Some(column)
    }

    fn apply(
        &mut self,
        rule: Rule,
        grid: &mut Grid,
        opponent: Player,
        computer: Player,
    ) -> Option<usize> {
        match rule {
            Rule::ImmediateWin => winning_column(grid, computer),
            Rule::BlockWin => winning_column(grid, opponent),
            Rule::VerticalPairs => block_runs(grid, &RUNS.pairs[1..2], opponent),
            Rule::LinePairs => {
                let pairs = &RUNS.pairs;
                block_runs(grid, &[&pairs[0], &pairs[2], &pairs[3]], opponent)
            }
            Rule::Triples => block_runs(grid, &RUNS.triples, opponent),
            Rule::Centre => CENTRE_ORDER
                .into_iter()
                .find(|&col| !grid.is_column_full(col)),
            Rule::Scored => best_scored_column(grid, opponent, computer),
            Rule::Random => {
                let open: Vec<usize> = grid.open_columns().collect();
                if open.is_empty() {
                    return None;
                }
                Some(open[self.rng.random_range(0..open.len())])
            }
        }
    }
}

/// Stages `cell` at `at`, runs `check`, then empties the cell again.
fn probe<T>(grid: &mut Grid, at: Coord, cell: Cell, check: impl FnOnce(&mut Grid) -> T) -> T {
    grid.place(at.row, at.col, cell);
    let result = check(grid);
    grid.place(at.row, at.col, Cell::Empty);
    result
}

fn wins_by_dropping(grid: &mut Grid, col: usize, player: Player) -> bool {
    let Some(row) = grid.lowest_empty_row(col) else {
        return false;
    };
    probe(grid, Coord::new(row, col), player.into(), |g| {
        g.winning_line_through(row, col).is_some()
    })
}

/// Left-most column where `player` would complete four.
fn winning_column(grid: &mut Grid, player: Player) -> Option<usize> {
    (0..COLUMNS).find(|&col| wins_by_dropping(grid, col, player))
}

/// First opponent window (in family then scan order) whose extension cell is
/// empty and landable; answers that cell's column.
fn block_runs<R: AsRef<[Run]>>(grid: &Grid, families: &[R], opponent: Player) -> Option<usize> {
    let theirs = Cell::from(opponent);
    families
        .iter()
        .flat_map(|runs| runs.as_ref().iter())
        .filter(|run| run.cells.iter().all(|c| grid.cell_at(c.row, c.col) == theirs))
        .find_map(|run| {
            run.extensions
                .iter()
                .find(|c| grid.cell_at(c.row, c.col).is_empty() && grid.is_landable(c.row, c.col))
                .map(|c| c.col)
        })
}

fn best_scored_column(grid: &mut Grid, opponent: Player, computer: Player) -> Option<usize> {
    let mut best: Option<(usize, i32)> = None;
    for col in 0..COLUMNS {
        let Some(score) = score_column(grid, col, opponent, computer) else {
            continue;
        };
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((col, score));
        }
    }
    best.map(|(col, _)| col)
}

/// Centrality, plus a bonus per follow-up winning drop the move sets up,
/// minus a penalty when it lets the opponent win on top of it.
fn score_column(grid: &mut Grid, col: usize, opponent: Player, computer: Player) -> Option<i32> {
    let row = grid.lowest_empty_row(col)?;
    let centre = (COLUMNS / 2) as i32;
    let centrality = CENTRE_WEIGHT * (centre - (col as i32 - centre).abs());

    let tactics = probe(grid, Coord::new(row, col), computer.into(), |g| {
        let threats = (0..COLUMNS)
            .filter(|&next| wins_by_dropping(g, next, computer))
            .count() as i32;
        let gifts_win = row > 0
            && probe(g, Coord::new(row - 1, col), opponent.into(), |g| {
                g.winning_line_through(row - 1, col).is_some()
            });
        THREAT_BONUS * threats - if gifts_win { GIFT_PENALTY } else { 0 }
    });
    Some(centrality + tactics)
}
