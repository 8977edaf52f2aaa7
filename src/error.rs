//! Errors surfaced at the tournament API boundary

use thiserror::Error;

use crate::tournament::TournamentPhase;

#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("a tournament needs at least 2 distinct entrants, got {0}")]
    NotEnoughEntrants(usize),

    #[error("no heat transition is pending (phase: {0:?})")]
    NotAwaitingAdvance(TournamentPhase),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
