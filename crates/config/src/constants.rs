//! Default values used across the simulator
//!
//! A single source of truth for the defaults that `Settings` falls back
//! to when a field is absent.

/// Dialogue horizon
pub mod simulation {
    /// Agent turns allowed before the episode is cut off
    pub const DEFAULT_MAX_NB_TURNS: u32 = 20;
}

/// Reward shaping
///
/// Defaults follow the usual shaping for goal-oriented dialogue: a unit
/// penalty per turn, a success bonus of twice the horizon and a failure
/// penalty of one horizon.
pub mod rewards {
    pub const DEFAULT_PER_TURN_PENALTY: f64 = -1.0;

    pub fn default_success_reward(max_nb_turns: u32) -> f64 {
        2.0 * max_nb_turns as f64
    }

    pub fn default_failure_reward(max_nb_turns: u32) -> f64 {
        -(max_nb_turns as f64)
    }
}

/// Data file locations
pub mod paths {
    pub const ACT_VOCABULARY: &str = "data/dia_acts.txt";
    pub const SLOT_VOCABULARY: &str = "data/slot_set.txt";
    pub const GOALS: &str = "data/goals.yaml";
}

/// Runner defaults
pub mod runner {
    pub const DEFAULT_EPISODES: u32 = 100;
}

/// Environment variable names
pub mod env {
    /// Selects `config/{env}.*`
    pub const ENV_NAME: &str = "DIALOGUE_SIM_ENV";
    /// Prefix for field overrides, e.g. `DIALOGUE_SIM__SIMULATION__MAX_NB_TURNS`
    pub const PREFIX: &str = "DIALOGUE_SIM";
}
