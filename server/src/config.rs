//! Command-line and environment configuration.

use c4_engine::{Difficulty, GameError, GameMode};
use clap::Parser;

/// Local HTTP host for a single Connect 4 session
#[derive(Parser, Debug, Clone)]
#[command(name = "c4_server", version, long_about = None)]
pub struct Config {
    /// Address to bind to
    #[arg(long, env = "C4_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind to
    #[arg(short, long, env = "C4_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Directory holding the browser front end
    #[arg(long, env = "C4_STATIC_DIR", default_value = "web/dist")]
    pub static_dir: String,

    /// Start against the computer at this level (1 easy .. 4 expert)
    #[arg(long, env = "C4_LEVEL")]
    pub level: Option<u8>,

    /// Tracing filter directives
    #[arg(long, env = "RUST_LOG", default_value = "info,tower_http=debug")]
    pub log_filter: String,
}

impl Config {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn initial_mode(&self) -> Result<GameMode, GameError> {
        match self.level {
            None => Ok(GameMode::TwoPlayer),
            Some(level) => Difficulty::from_level(level).map(GameMode::OnePlayer),
        }
    }
}
