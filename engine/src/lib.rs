//! Connect 4 game engine with a tiered heuristic computer opponent.
//!
//! [`Game`] owns the [`Grid`] and the match state. Callers feed it columns
//! (`apply_move`) and, in one-player mode, ask it to play the computer's turn
//! (`apply_automatic_move`). The computer never searches a game tree: each
//! [`Difficulty`] runs a fixed cascade of tactical rules, see [`Opponent`].
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod game;
mod grid;
mod opponent;

pub use game::{Game, MoveOutcome, Status};
pub use grid::{Cell, Coord, Grid, WinningLine};
pub use opponent::Opponent;

pub const COLUMNS: usize = 7;
pub const ROWS: usize = 6;
/// Pieces in a row needed to win.
pub const CONNECT: usize = 4;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    /// Always opens the match.
    Red,
    Yellow,
}

impl Player {
    fn idx(self) -> usize {
        match self {
            Player::Red => 0,
            Player::Yellow => 1,
        }
    }

    pub fn opponent(self) -> Player {
        match self {
            Player::Red => Player::Yellow,
            Player::Yellow => Player::Red,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Player::Red => "Red",
            Player::Yellow => "Yellow",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Expert,
    ];

    /// Maps the 1-4 level numbers shown in the options dialog.
    pub fn from_level(level: u8) -> Result<Self, GameError> {
        match level {
            1 => Ok(Difficulty::Easy),
            2 => Ok(Difficulty::Medium),
            3 => Ok(Difficulty::Hard),
            4 => Ok(Difficulty::Expert),
            other => Err(GameError::DifficultyOutOfRange(other)),
        }
    }

    pub fn level(self) -> u8 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
            Difficulty::Expert => 4,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "difficulty")]
pub enum GameMode {
    TwoPlayer,
    /// The human plays Red, the computer plays Yellow.
    OnePlayer(Difficulty),
}

impl GameMode {
    pub fn difficulty(self) -> Option<Difficulty> {
        match self {
            GameMode::TwoPlayer => None,
            GameMode::OnePlayer(difficulty) => Some(difficulty),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("column {column} is out of bounds")]
    InvalidColumn { column: usize },
    #[error("column {column} is full")]
    ColumnFull { column: usize },
    #[error("the match is already over")]
    MatchNotInProgress,
    #[error("it is not the computer's turn")]
    WrongTurnForAutomaticMove,
    #[error("difficulty level {0} is out of range (1-4)")]
    DifficultyOutOfRange(u8),
    #[error("invalid board diagram at line {line}: {reason}")]
    ParseGrid { line: usize, reason: String },
}
