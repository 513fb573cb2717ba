use c4_engine::{
    Cell, Coord, Difficulty, Game, GameError, GameMode, Grid, Opponent, Player, Status, COLUMNS,
    ROWS,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn grid(diagram: &str) -> Grid {
    diagram.parse().unwrap()
}

fn assert_gravity(grid: &Grid) {
    for col in 0..COLUMNS {
        for row in 0..ROWS - 1 {
            if !grid.cell_at(row, col).is_empty() {
                assert!(
                    !grid.cell_at(row + 1, col).is_empty(),
                    "gap under ({row}, {col}):\n{grid}"
                );
            }
        }
    }
}

/// Random legal play until the match ends, checking gravity after each move.
fn random_game(seed: u64) -> Game {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut game = Game::new(GameMode::TwoPlayer);
    while !game.is_over() {
        let open: Vec<usize> = game.grid().open_columns().collect();
        let col = open[rng.random_range(0..open.len())];
        game.apply_move(col).unwrap();
        assert_gravity(game.grid());
    }
    game
}

#[test]
fn gravity_holds_through_random_games() {
    for seed in 0..50 {
        let game = random_game(seed);
        match game.status() {
            Status::Won(_) => assert!(game.winning_line().is_some()),
            Status::Draw => assert_eq!(game.move_count(), ROWS * COLUMNS),
            Status::InProgress(_) => unreachable!(),
        }
    }
}

#[test]
fn any_cell_of_a_four_anchors_the_win() {
    // (start, step) for one line of each family.
    let lines: [(Coord, (isize, isize)); 4] = [
        (Coord::new(3, 1), (0, 1)),
        (Coord::new(1, 5), (1, 0)),
        (Coord::new(5, 2), (-1, 1)),
        (Coord::new(1, 0), (1, 1)),
    ];
    let at = |start: Coord, (dr, dc): (isize, isize), i: isize| -> Option<Coord> {
        let row = start.row as isize + dr * i;
        let col = start.col as isize + dc * i;
        (0..ROWS as isize).contains(&row).then_some(())?;
        (0..COLUMNS as isize).contains(&col).then_some(())?;
        Some(Coord::new(row as usize, col as usize))
    };

    for (start, step) in lines {
        let mut g = Grid::new();
        let four: Vec<Coord> = (0..4).map(|i| at(start, step, i).unwrap()).collect();
        for c in &four {
            g.place(c.row, c.col, Cell::Red);
        }
        for c in &four {
            let line = g.winning_line_through(c.row, c.col);
            assert_eq!(line.map(|l| l.to_vec()), Some(four.clone()), "anchor {c:?}");
        }

        for outside in [at(start, step, -1), at(start, step, 4)].into_iter().flatten() {
            assert!(g.winning_line_through(outside.row, outside.col).is_none());
            g.place(outside.row, outside.col, Cell::Yellow);
            assert!(!g.has_winning_line_through(outside.row, outside.col));
            g.place(outside.row, outside.col, Cell::Empty);
        }
    }
}

#[test]
fn win_on_the_last_cell_is_not_a_draw() {
    let columns = [
        3, 6, 2, 6, 1, 4, 2, 3, 6, 0, 1, 2, 2, 3, 0, 6, 0, 1, 4, 0, 0, 0, 1, 3, 5, 6, 4, 4, 5, 6,
        3, 5, 5, 3, 5, 5, 1, 2, 4, 1, 2,
    ];
    let mut game = Game::new(GameMode::TwoPlayer);
    for col in columns {
        game.apply_move(col).unwrap();
    }
    assert_eq!(game.move_count(), ROWS * COLUMNS - 1);

    let last = game.apply_move(4).unwrap();
    assert!(game.grid().is_full());
    assert_eq!(last.status, Status::Won(Player::Yellow));
    assert_eq!(
        game.winning_line(),
        Some([
            Coord::new(0, 3),
            Coord::new(0, 4),
            Coord::new(0, 5),
            Coord::new(0, 6)
        ])
    );
}

#[test]
fn seventh_drop_into_a_column_is_rejected() {
    let mut game = Game::new(GameMode::TwoPlayer);
    for _ in 0..ROWS {
        game.apply_move(3).unwrap();
    }
    let before = game.grid().clone();
    assert_eq!(game.apply_move(3), Err(GameError::ColumnFull { column: 3 }));
    assert_eq!(game.grid(), &before);
    assert_eq!(game.status(), Status::InProgress(Player::Red));
}

#[test]
fn completing_the_bottom_row_records_the_line() {
    let mut g = grid(
        "
        .......
        .......
        .......
        .......
        .......
        RRR....
        ",
    );
    let row = g.lowest_empty_row(3).unwrap();
    assert_eq!(row, 5);
    g.place(row, 3, Cell::Red);
    assert!(g.has_winning_line_through(5, 3));
    assert_eq!(
        g.winning_line(),
        Some([
            Coord::new(5, 0),
            Coord::new(5, 1),
            Coord::new(5, 2),
            Coord::new(5, 3)
        ])
    );
}

#[test]
fn medium_blocks_the_open_end_of_three() {
    let mut g = grid(
        "
        .......
        .......
        .......
        .......
        .......
        RRR....
        ",
    );
    let mut opponent = Opponent::with_seed(Difficulty::Medium, 42);
    assert_eq!(
        opponent.select_column(&mut g, Player::Red, Player::Yellow),
        Some(3)
    );
}

#[test]
fn easy_spreads_evenly_over_open_columns() {
    let mut g = grid(
        "
        R.R.R..
        Y.Y.Y..
        R.R.R..
        Y.Y.Y..
        R.R.R..
        Y.Y.Y..
        ",
    );
    let before = g.clone();
    let mut opponent = Opponent::with_seed(Difficulty::Easy, 2024);
    let mut counts = [0u32; COLUMNS];
    let trials = 4000;
    for _ in 0..trials {
        let col = opponent
            .select_column(&mut g, Player::Red, Player::Yellow)
            .unwrap();
        counts[col] += 1;
    }
    assert_eq!(g, before);
    for full in [0, 2, 4] {
        assert_eq!(counts[full], 0);
    }
    // Expected 1000 each; the bound is roughly five standard deviations.
    for open in [1, 3, 5, 6] {
        assert!(
            (850..=1150).contains(&counts[open]),
            "column {open} picked {} times: {counts:?}",
            counts[open]
        );
    }
}

#[test]
fn filling_every_cell_without_four_is_a_draw() {
    let columns = [
        4, 3, 6, 0, 1, 4, 5, 5, 1, 1, 5, 0, 1, 6, 0, 1, 5, 5, 1, 0, 4, 6, 3, 2, 6, 6, 0, 4, 6, 5,
        2, 0, 4, 2, 4, 2, 2, 2, 3, 3, 3, 3,
    ];
    let mut game = Game::new(GameMode::TwoPlayer);
    let mut last = None;
    for col in columns {
        last = Some(game.apply_move(col).unwrap());
    }
    assert_eq!(last.unwrap().status, Status::Draw);
    assert_eq!(game.status(), Status::Draw);
    assert_eq!(game.winning_line(), None);
}

#[test]
fn opponent_leaves_the_grid_untouched() {
    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut game = Game::new(GameMode::TwoPlayer);
        while !game.is_over() {
            for difficulty in Difficulty::ALL {
                let mut g = game.grid().clone();
                let before = g.clone();
                let mut opponent = Opponent::with_seed(difficulty, seed);
                let active = game.active_player().unwrap();
                let col = opponent
                    .select_column(&mut g, active.opponent(), active)
                    .unwrap();
                assert_eq!(g, before, "{difficulty:?} disturbed the grid:\n{before}");
                assert!(!g.is_column_full(col));
            }
            let open: Vec<usize> = game.grid().open_columns().collect();
            game.apply_move(open[rng.random_range(0..open.len())]).unwrap();
        }
    }
}

#[test]
fn computer_never_loses_to_a_one_move_threat_on_medium_and_up() {
    for difficulty in [Difficulty::Medium, Difficulty::Hard, Difficulty::Expert] {
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut game = Game::with_seed(GameMode::OnePlayer(difficulty), seed);
            while !game.is_over() {
                let open: Vec<usize> = game.grid().open_columns().collect();
                game.apply_move(open[rng.random_range(0..open.len())]).unwrap();
                if game.is_over() {
                    break;
                }
                // Any immediate Red win left open after Yellow's reply would
                // have been blocked unless Yellow won first or Red had two.
                let threats_before = immediate_wins(game.grid(), Player::Red);
                let reply = game.apply_automatic_move().unwrap();
                if !reply.won() && threats_before.len() == 1 {
                    assert_eq!(reply.column, threats_before[0], "{difficulty:?}\n{}", game.grid());
                }
            }
        }
    }
}

fn immediate_wins(grid: &Grid, player: Player) -> Vec<usize> {
    let mut g = grid.clone();
    (0..COLUMNS)
        .filter(|&col| {
            let Some(row) = g.lowest_empty_row(col) else {
                return false;
            };
            g.place(row, col, player.into());
            let wins = g.winning_line_through(row, col).is_some();
            g.place(row, col, Cell::Empty);
            wins
        })
        .collect()
}

#[test]
fn one_player_session_plays_out() {
    let mut game = Game::with_seed(GameMode::OnePlayer(Difficulty::Expert), 77);
    let mut rng = StdRng::seed_from_u64(77);
    while !game.is_over() {
        if game.is_computer_turn() {
            let reply = game.apply_automatic_move().unwrap();
            assert_eq!(reply.player, Player::Yellow);
        } else {
            assert_eq!(
                game.apply_automatic_move(),
                Err(GameError::WrongTurnForAutomaticMove)
            );
            let open: Vec<usize> = game.grid().open_columns().collect();
            game.apply_move(open[rng.random_range(0..open.len())]).unwrap();
        }
        assert_gravity(game.grid());
    }
    let total = game.score(Player::Red) + game.score(Player::Yellow);
    assert_eq!(total, u32::from(matches!(game.status(), Status::Won(_))));
}
