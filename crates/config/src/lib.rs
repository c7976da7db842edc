//! Configuration management for the dialogue simulator
//!
//! Supports loading configuration from:
//! - YAML/TOML/JSON files (`config/default.*`, `config/{env}.*`)
//! - Environment variables (`DIALOGUE_SIM__` prefix, `__` separator)
//!
//! Data files the simulator depends on (vocabularies, goal set, knowledge
//! base records, feasible-action catalog) are loaded through `data`.

pub mod constants;
pub mod data;
pub mod settings;

pub use data::{
    load_action_catalog, load_goal_set, load_kb_records, load_slot_vocabulary, load_act_vocabulary,
    KbRecord,
};
pub use settings::{
    load_settings, DataPaths, InitialIntentTemplate, ObservabilityConfig, RewardConfig,
    RunnerConfig, Settings, SimulationConfig, SuccessCriterion, TrackerKind, UserConfig, UserKind,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Environment error: {0}")]
    Environment(String),

    #[error("Unsupported configuration: {0}")]
    Unsupported(String),

    #[error("Invalid data: {0}")]
    Data(#[from] dialogue_sim_core::Error),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
