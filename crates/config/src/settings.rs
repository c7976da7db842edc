//! Main settings module

use config::{Config, Environment, File};
use dialogue_sim_core::{Intent, SimulationMode};
use serde::{Deserialize, Serialize};

use crate::constants::{env, paths, rewards, runner, simulation};
use crate::ConfigError;

/// Main simulator settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Episode horizon and component selection
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Reward shaping constants
    #[serde(default)]
    pub rewards: RewardConfig,

    /// Rule-based user behaviour
    #[serde(default)]
    pub user: UserConfig,

    /// Data file locations
    #[serde(default)]
    pub data: DataPaths,

    /// Batch runner options
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Logging configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Which user simulator to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserKind {
    #[default]
    RuleBased,
    /// Learned user model (not available in this build)
    ModelBased,
}

/// Which dialogue state tracker to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrackerKind {
    #[default]
    RuleBased,
    /// Learned tracker (not available in this build)
    ModelBased,
}

/// Episode horizon and component selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Agent turns allowed per episode
    #[serde(default = "default_max_nb_turns")]
    pub max_nb_turns: u32,

    #[serde(default)]
    pub simulation_mode: SimulationMode,

    #[serde(default)]
    pub user_kind: UserKind,

    #[serde(default)]
    pub tracker_kind: TrackerKind,

    /// Seed for the environment RNG (random when absent)
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_max_nb_turns() -> u32 {
    simulation::DEFAULT_MAX_NB_TURNS
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_nb_turns: default_max_nb_turns(),
            simulation_mode: SimulationMode::default(),
            user_kind: UserKind::default(),
            tracker_kind: TrackerKind::default(),
            seed: None,
        }
    }
}

/// Reward shaping constants
///
/// Success and failure rewards default to multiples of the horizon, so
/// they are resolved against `max_nb_turns` when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardConfig {
    /// Added on every step
    #[serde(default = "default_per_turn_penalty")]
    pub per_turn_penalty: f64,

    /// Added once when the user reports success
    #[serde(default)]
    pub success_reward: Option<f64>,

    /// Added once when the episode ends without success
    #[serde(default)]
    pub failure_reward: Option<f64>,
}

fn default_per_turn_penalty() -> f64 {
    rewards::DEFAULT_PER_TURN_PENALTY
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            per_turn_penalty: default_per_turn_penalty(),
            success_reward: None,
            failure_reward: None,
        }
    }
}

impl RewardConfig {
    pub fn success_reward_for(&self, max_nb_turns: u32) -> f64 {
        self.success_reward
            .unwrap_or_else(|| rewards::default_success_reward(max_nb_turns))
    }

    pub fn failure_reward_for(&self, max_nb_turns: u32) -> f64 {
        self.failure_reward
            .unwrap_or_else(|| rewards::default_failure_reward(max_nb_turns))
    }
}

/// When a closing agent turn counts as success
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SuccessCriterion {
    /// Agent `thanks`/`closing` ends the dialogue successfully
    #[default]
    OnClosing,
    /// Success only if the user's goal was actually met
    GoalCompletion,
}

/// Opening intent of a simulated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialIntentTemplate {
    pub intent: Intent,
    /// Goal constraints always revealed with this opening, when present
    #[serde(default)]
    pub mandatory_slots: Vec<String>,
}

impl InitialIntentTemplate {
    pub fn new(intent: impl Into<Intent>) -> Self {
        Self {
            intent: intent.into(),
            mandatory_slots: Vec::new(),
        }
    }

    pub fn with_mandatory(mut self, slot: impl Into<String>) -> Self {
        self.mandatory_slots.push(slot.into());
        self
    }
}

/// Rule-based user behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default = "default_initial_intents")]
    pub initial_intents: Vec<InitialIntentTemplate>,

    #[serde(default)]
    pub success_criterion: SuccessCriterion,

    /// Request target added to every goal (e.g. `ticket`), only opened
    /// with when the goal has no other target
    #[serde(default)]
    pub default_request_slot: Option<String>,
}

fn default_initial_intents() -> Vec<InitialIntentTemplate> {
    vec![InitialIntentTemplate::new(Intent::Request)]
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            initial_intents: default_initial_intents(),
            success_criterion: SuccessCriterion::default(),
            default_request_slot: None,
        }
    }
}

/// Data file locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    #[serde(default = "default_act_vocabulary")]
    pub act_vocabulary: String,

    #[serde(default = "default_slot_vocabulary")]
    pub slot_vocabulary: String,

    #[serde(default = "default_goals")]
    pub goals: String,

    /// Knowledge base records; lookups fail when absent
    #[serde(default)]
    pub knowledge_base: Option<String>,

    /// Feasible agent acts; the standard catalog is generated when absent
    #[serde(default)]
    pub action_catalog: Option<String>,
}

fn default_act_vocabulary() -> String {
    paths::ACT_VOCABULARY.to_string()
}

fn default_slot_vocabulary() -> String {
    paths::SLOT_VOCABULARY.to_string()
}

fn default_goals() -> String {
    paths::GOALS.to_string()
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            act_vocabulary: default_act_vocabulary(),
            slot_vocabulary: default_slot_vocabulary(),
            goals: default_goals(),
            knowledge_base: None,
            action_catalog: None,
        }
    }
}

/// Batch runner options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    #[serde(default = "default_episodes")]
    pub episodes: u32,
}

fn default_episodes() -> u32 {
    runner::DEFAULT_EPISODES
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            episodes: default_episodes(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON lines instead of human-readable logs
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_simulation()?;
        self.validate_rewards()?;
        self.validate_user()?;
        self.validate_data()?;
        Ok(())
    }

    fn validate_simulation(&self) -> Result<(), ConfigError> {
        if self.simulation.max_nb_turns == 0 {
            return Err(ConfigError::InvalidValue {
                field: "simulation.max_nb_turns".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    fn validate_rewards(&self) -> Result<(), ConfigError> {
        let max = self.simulation.max_nb_turns;
        let values = [
            ("rewards.per_turn_penalty", self.rewards.per_turn_penalty),
            ("rewards.success_reward", self.rewards.success_reward_for(max)),
            ("rewards.failure_reward", self.rewards.failure_reward_for(max)),
        ];

        for (field, value) in values {
            if !value.is_finite() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: format!("Must be finite, got {}", value),
                });
            }
        }

        if self.rewards.per_turn_penalty > 0.0 {
            tracing::warn!(
                per_turn_penalty = self.rewards.per_turn_penalty,
                "Per-turn penalty is positive; longer dialogues will be rewarded"
            );
        }

        Ok(())
    }

    fn validate_user(&self) -> Result<(), ConfigError> {
        if self.user.initial_intents.is_empty() {
            return Err(ConfigError::MissingField("user.initial_intents".to_string()));
        }

        if let Some(slot) = &self.user.default_request_slot {
            if slot.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "user.default_request_slot".to_string(),
                    message: "Must not be empty".to_string(),
                });
            }
        }

        Ok(())
    }

    fn validate_data(&self) -> Result<(), ConfigError> {
        let required = [
            ("data.act_vocabulary", &self.data.act_vocabulary),
            ("data.slot_vocabulary", &self.data.slot_vocabulary),
            ("data.goals", &self.data.goals),
        ];

        for (field, path) in required {
            if path.is_empty() {
                return Err(ConfigError::MissingField(field.to_string()));
            }
        }

        Ok(())
    }
}

/// Load settings from files and environment
///
/// Priority: env vars > config/{env}.* > config/default.* > defaults
pub fn load_settings(env_name: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env_name {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix(env::PREFIX)
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.simulation.max_nb_turns, 20);
        assert_eq!(settings.simulation.simulation_mode, SimulationMode::SemanticFrame);
        assert_eq!(settings.user.initial_intents.len(), 1);
        assert_eq!(settings.user.initial_intents[0].intent, Intent::Request);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_rewards_scale_with_horizon() {
        let rewards = RewardConfig::default();
        assert_eq!(rewards.success_reward_for(10), 20.0);
        assert_eq!(rewards.failure_reward_for(10), -10.0);

        let explicit = RewardConfig {
            per_turn_penalty: -0.5,
            success_reward: Some(5.0),
            failure_reward: Some(-3.0),
        };
        assert_eq!(explicit.success_reward_for(10), 5.0);
        assert_eq!(explicit.failure_reward_for(10), -3.0);
    }

    #[test]
    fn test_zero_turns_rejected() {
        let mut settings = Settings::default();
        settings.simulation.max_nb_turns = 0;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_empty_initial_intents_rejected() {
        let mut settings = Settings::default();
        settings.user.initial_intents.clear();
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::MissingField(_))
        ));
    }

    #[test]
    fn test_non_finite_reward_rejected() {
        let mut settings = Settings::default();
        settings.rewards.success_reward = Some(f64::NAN);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_env_override() {
        std::env::set_var("DIALOGUE_SIM__SIMULATION__MAX_NB_TURNS", "7");
        std::env::set_var("DIALOGUE_SIM__OBSERVABILITY__LOG_JSON", "true");
        let settings = load_settings(None);
        std::env::remove_var("DIALOGUE_SIM__SIMULATION__MAX_NB_TURNS");
        std::env::remove_var("DIALOGUE_SIM__OBSERVABILITY__LOG_JSON");

        let settings = settings.unwrap();
        assert_eq!(settings.simulation.max_nb_turns, 7);
        assert!(settings.observability.log_json);
    }

    #[test]
    fn test_settings_from_yaml() {
        let yaml = r#"
simulation:
  max_nb_turns: 5
  simulation_mode: natural_language
  user_kind: rule_based
rewards:
  per_turn_penalty: -2.0
  success_reward: 10.0
user:
  success_criterion: goal_completion
  default_request_slot: ticket
  initial_intents:
    - intent: request
      mandatory_slots: [moviename]
    - intent: inform
"#;
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.simulation.max_nb_turns, 5);
        assert_eq!(
            settings.simulation.simulation_mode,
            SimulationMode::NaturalLanguage
        );
        assert_eq!(settings.rewards.failure_reward_for(5), -5.0);
        assert_eq!(settings.user.success_criterion, SuccessCriterion::GoalCompletion);
        assert_eq!(settings.user.initial_intents[0].mandatory_slots, vec!["moviename"]);
        assert_eq!(settings.user.initial_intents[1].intent, Intent::Inform);
        assert_eq!(settings.data.goals, "data/goals.yaml");
    }
}
