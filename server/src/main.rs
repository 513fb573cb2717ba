use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use c4_engine::{Cell, Coord, Game, GameError, GameMode, MoveOutcome, Player, Status, WinningLine};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::Mutex};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{debug, info, warn};

mod config;

use config::Config;

/// The one session this process hosts. The lock is held across a whole
/// request so nobody sees the computer's probing.
type SharedGame = Arc<Mutex<Game>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing(&config.log_filter);

    let mode = config.initial_mode()?;
    let game = Arc::new(Mutex::new(Game::new(mode)));
    let app = app_router(game, &config.static_dir);

    let addr = config.addr();
    let listener = TcpListener::bind(&addr).await?;
    info!(?mode, "Listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing(filter: &str) {
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn app_router(game: SharedGame, static_dir: &str) -> Router {
    let api = Router::new()
        .route("/game", get(show_game).post(new_game))
        .route("/move", post(play_move))
        .route("/move/auto", post(auto_move))
        .route("/reset", post(reset_board))
        .route("/scores/reset", post(reset_scores))
        .with_state(game);
    Router::new()
        .nest("/api", api)
        .fallback_service(ServeDir::new(static_dir).append_index_html_on_directories(true))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_origin(axum::http::HeaderValue::from_static("*"))
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
struct Scores {
    red: u32,
    yellow: u32,
}

/// Everything a front end needs to draw the board and the status bar.
#[derive(Debug, Serialize, Deserialize)]
struct GameView {
    mode: GameMode,
    status: Status,
    message: String,
    /// Rows top first.
    board: Vec<Vec<Cell>>,
    winning_line: Option<WinningLine>,
    scores: Scores,
    move_count: usize,
    last_move: Option<Coord>,
}

impl From<&Game> for GameView {
    fn from(game: &Game) -> Self {
        let grid = game.grid();
        let board = (0..c4_engine::ROWS)
            .map(|row| {
                (0..c4_engine::COLUMNS)
                    .map(|col| grid.cell_at(row, col))
                    .collect()
            })
            .collect();
        Self {
            mode: game.mode(),
            status: game.status(),
            message: game.status_message(),
            board,
            winning_line: game.winning_line(),
            scores: Scores {
                red: game.score(Player::Red),
                yellow: game.score(Player::Yellow),
            },
            move_count: game.move_count(),
            last_move: game.last_move(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NewGameRequest {
    mode: GameMode,
}

#[derive(Debug, Deserialize)]
struct MoveRequest {
    column: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct MoveReply {
    /// The requested move, followed by the computer's answer if one was due.
    moves: Vec<MoveOutcome>,
    game: GameView,
}

fn no_store<T: IntoResponse>(body: T) -> impl IntoResponse {
    ([(header::CACHE_CONTROL, "no-store")], body)
}

async fn show_game(State(game): State<SharedGame>) -> impl IntoResponse {
    let game = game.lock().await;
    no_store(Json(GameView::from(&*game)))
}

async fn new_game(
    State(game): State<SharedGame>,
    Json(request): Json<NewGameRequest>,
) -> impl IntoResponse {
    let mut game = game.lock().await;
    game.new_game(request.mode);
    no_store(Json(GameView::from(&*game)))
}

async fn play_move(
    State(game): State<SharedGame>,
    Json(request): Json<MoveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut game = game.lock().await;
    let mut moves = vec![game.apply_move(request.column)?];
    moves.extend(computer_reply(&mut game));
    debug!(count = moves.len(), "moves applied");
    Ok(no_store(Json(MoveReply {
        moves,
        game: GameView::from(&*game),
    })))
}

/// Plays the computer's answer when one is due. The caller's move is already
/// committed, so a failed reply is logged and the snapshot returned as is.
fn computer_reply(game: &mut Game) -> Option<MoveOutcome> {
    if !game.is_computer_turn() {
        return None;
    }
    match game.apply_automatic_move() {
        Ok(reply) => Some(reply),
        Err(err) => {
            warn!(%err, "computer could not reply");
            None
        }
    }
}

async fn auto_move(State(game): State<SharedGame>) -> Result<impl IntoResponse, ApiError> {
    let mut game = game.lock().await;
    let reply = game.apply_automatic_move()?;
    Ok(no_store(Json(MoveReply {
        moves: vec![reply],
        game: GameView::from(&*game),
    })))
}

async fn reset_board(State(game): State<SharedGame>) -> impl IntoResponse {
    let mut game = game.lock().await;
    game.reset();
    no_store(Json(GameView::from(&*game)))
}

async fn reset_scores(State(game): State<SharedGame>) -> impl IntoResponse {
    let mut game = game.lock().await;
    game.reset_scores();
    no_store(Json(GameView::from(&*game)))
}

#[derive(Debug)]
struct ApiError(anyhow::Error);

impl<E: Into<anyhow::Error>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.downcast_ref::<GameError>() {
            Some(GameError::InvalidColumn { .. })
            | Some(GameError::DifficultyOutOfRange(_))
            | Some(GameError::ParseGrid { .. }) => StatusCode::BAD_REQUEST,
            Some(_) => StatusCode::CONFLICT,
            None => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = format!("{}", self.0);
        (status, body).into_response()
    }
}
