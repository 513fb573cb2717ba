use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::grid::{Cell, Coord, Grid, WinningLine};
use crate::opponent::Opponent;
use crate::{Difficulty, GameError, GameMode, Player, COLUMNS, ROWS};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "player")]
pub enum Status {
    /// Carries the side to move.
    InProgress(Player),
    Won(Player),
    Draw,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    pub player: Player,
    pub column: usize,
    pub row: usize,
    /// Match status after the move.
    pub status: Status,
}

impl MoveOutcome {
    pub fn won(&self) -> bool {
        self.status == Status::Won(self.player)
    }
}

/// One match at a time: the grid, whose turn it is, and the running scores.
///
/// Red always opens. In one-player mode the computer plays Yellow.
#[derive(Clone, Debug)]
pub struct Game {
    grid: Grid,
    mode: GameMode,
    status: Status,
    opponent: Option<Opponent>,
    seed: Option<u64>,
    scores: [u32; 2],
    last_move: Option<Coord>,
}

impl Game {
    pub fn new(mode: GameMode) -> Self {
        Self::build(mode, None)
    }

    /// Like [`Game::new`] but with a deterministic computer opponent.
    pub fn with_seed(mode: GameMode, seed: u64) -> Self {
        Self::build(mode, Some(seed))
    }

    fn build(mode: GameMode, seed: Option<u64>) -> Self {
        let mut game = Self {
            grid: Grid::new(),
            mode,
            status: Status::InProgress(Player::Red),
            opponent: None,
            seed,
            scores: [0, 0],
            last_move: None,
        };
        game.configure(mode);
        game
    }

    /// Switches mode (and difficulty) and starts a fresh match. Scores carry
    /// over.
    pub fn new_game(&mut self, mode: GameMode) {
        self.configure(mode);
        self.reset();
        info!(?mode, "new game");
    }

    fn configure(&mut self, mode: GameMode) {
        self.mode = mode;
        self.opponent = match (mode.difficulty(), self.opponent.take()) {
            (None, _) => None,
            (Some(difficulty), Some(mut opponent)) => {
                opponent.set_difficulty(difficulty);
                Some(opponent)
            }
            (Some(difficulty), None) => Some(match self.seed {
                Some(seed) => Opponent::with_seed(difficulty, seed),
                None => Opponent::new(difficulty),
            }),
        };
    }

    /// Changes the computer's tier without touching the board. Returns
    /// `false` in two-player mode.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) -> bool {
        match self.opponent.as_mut() {
            Some(opponent) => {
                opponent.set_difficulty(difficulty);
                self.mode = GameMode::OnePlayer(difficulty);
                true
            }
            None => false,
        }
    }

    pub fn apply_move(&mut self, column: usize) -> Result<MoveOutcome, GameError> {
        let Status::InProgress(player) = self.status else {
            return Err(GameError::MatchNotInProgress);
        };
        if column >= COLUMNS {
            return Err(GameError::InvalidColumn { column });
        }
        let row = self
            .grid
            .lowest_empty_row(column)
            .ok_or(GameError::ColumnFull { column })?;
        Ok(self.commit(player, row, column))
    }

    /// Decides the computer's column without playing it. Commit the answer
    /// with [`Game::apply_move`]; nothing else may touch the game in between.
    pub fn choose_automatic_move(&mut self) -> Result<usize, GameError> {
        let Status::InProgress(active) = self.status else {
            return Err(GameError::MatchNotInProgress);
        };
        let computer = self
            .computer_player()
            .filter(|&computer| computer == active)
            .ok_or(GameError::WrongTurnForAutomaticMove)?;
        let opponent = self
            .opponent
            .as_mut()
            .ok_or(GameError::WrongTurnForAutomaticMove)?;
        // An in-progress match always has an open column.
        opponent
            .select_column(&mut self.grid, computer.opponent(), computer)
            .ok_or(GameError::MatchNotInProgress)
    }

    pub fn apply_automatic_move(&mut self) -> Result<MoveOutcome, GameError> {
        let column = self.choose_automatic_move()?;
        self.apply_move(column)
    }

    fn commit(&mut self, player: Player, row: usize, column: usize) -> MoveOutcome {
        self.grid.place(row, column, player.into());
        self.last_move = Some(Coord::new(row, column));

        self.status = if self.grid.has_winning_line_through(row, column) {
            self.scores[player.idx()] += 1;
            info!(winner = player.name(), moves = self.move_count(), "match won");
            Status::Won(player)
        } else if self.grid.is_full() {
            info!("match drawn");
            Status::Draw
        } else {
            Status::InProgress(player.opponent())
        };
        debug!(player = player.name(), row, column, "move applied");

        MoveOutcome {
            player,
            column,
            row,
            status: self.status,
        }
    }

    /// Empties the board and hands the first move back to Red. Scores are
    /// kept.
    pub fn reset(&mut self) {
        self.grid.reset();
        self.status = Status::InProgress(Player::Red);
        self.last_move = None;
    }

    pub fn reset_scores(&mut self) {
        self.scores = [0, 0];
    }

    pub fn score(&self, player: Player) -> u32 {
        self.scores[player.idx()]
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_over(&self) -> bool {
        !matches!(self.status, Status::InProgress(_))
    }

    pub fn active_player(&self) -> Option<Player> {
        match self.status {
            Status::InProgress(player) => Some(player),
            _ => None,
        }
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn computer_player(&self) -> Option<Player> {
        match self.mode {
            GameMode::TwoPlayer => None,
            GameMode::OnePlayer(_) => Some(Player::Yellow),
        }
    }

    /// Whether the computer should move next.
    pub fn is_computer_turn(&self) -> bool {
        self.active_player().is_some() && self.active_player() == self.computer_player()
    }

    pub fn label(&self, player: Player) -> &'static str {
        if Some(player) == self.computer_player() {
            "Computer"
        } else {
            player.name()
        }
    }

    pub fn status_message(&self) -> String {
        match self.status {
            Status::InProgress(player) => format!("{}'s turn", self.label(player)),
            Status::Won(player) => format!("{} has won!", self.label(player)),
            Status::Draw => "Draw!".to_string(),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// `None` outside the grid.
    pub fn cell(&self, row: usize, col: usize) -> Option<Cell> {
        (row < ROWS && col < COLUMNS).then(|| self.grid.cell_at(row, col))
    }

    /// Columns outside the grid count as full.
    pub fn is_column_full(&self, col: usize) -> bool {
        col >= COLUMNS || self.grid.is_column_full(col)
    }

    pub fn lowest_empty_row(&self, col: usize) -> Option<usize> {
        if col >= COLUMNS {
            return None;
        }
        self.grid.lowest_empty_row(col)
    }

    pub fn winning_line(&self) -> Option<WinningLine> {
        self.grid.winning_line()
    }

    pub fn move_count(&self) -> usize {
        self.grid.move_count()
    }

    pub fn last_move(&self) -> Option<Coord> {
        self.last_move
    }
}
