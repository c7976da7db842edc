//! Engine error types

use dialogue_sim_config::ConfigError;
use dialogue_sim_core::{KbError, LanguageError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error(transparent)]
    Core(#[from] dialogue_sim_core::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Action index {index} out of bounds for catalog of {len} actions")]
    ActionOutOfBounds { index: usize, len: usize },

    /// The turn counter ran past the horizon the state layout was sized for
    #[error("Turn {turn} exceeds state horizon {horizon}")]
    TurnOverflow { turn: u32, horizon: usize },

    #[error("step() called before reset()")]
    EpisodeNotStarted,
}

impl From<KbError> for SimError {
    fn from(err: KbError) -> Self {
        SimError::Core(err.into())
    }
}

impl From<LanguageError> for SimError {
    fn from(err: LanguageError) -> Self {
        SimError::Core(err.into())
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
