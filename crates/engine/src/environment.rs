//! Dialogue environment
//!
//! Step-based environment wrapping the tracker and the simulated user:
//! - reset() -> state
//! - step(agent act) -> (state, reward, done, info)
//!
//! Every random choice of an episode flows from its seed, so an episode is
//! reproducible given `reset_with_seed`.

use dialogue_sim_config::{
    ConfigError, RewardConfig, Settings, TrackerKind, UserConfig, UserKind,
};
use dialogue_sim_core::{
    DialogAct, DialogueStatus, NaturalLanguageGenerator, NaturalLanguageUnderstanding,
    SimulationMode, Speaker,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::codec::ActStringCodec;
use crate::domain::DialogueDomain;
use crate::dst::DialogueStateTracker;
use crate::error::{Result, SimError};
use crate::user::UserSimulator;

/// Reward constants resolved against the horizon
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardSchedule {
    pub per_turn_penalty: f64,
    pub success_reward: f64,
    pub failure_reward: f64,
}

impl RewardSchedule {
    pub fn from_config(config: &RewardConfig, max_nb_turns: u32) -> Self {
        Self {
            per_turn_penalty: config.per_turn_penalty,
            success_reward: config.success_reward_for(max_nb_turns),
            failure_reward: config.failure_reward_for(max_nb_turns),
        }
    }
}

/// Configuration for the dialogue environment
#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Agent turns allowed per episode
    pub max_nb_turns: u32,
    pub simulation_mode: SimulationMode,
    pub user_kind: UserKind,
    pub tracker_kind: TrackerKind,
    pub rewards: RewardSchedule,
    pub user: UserConfig,
    /// Seed for the environment RNG; drawn from the OS when absent
    pub seed: Option<u64>,
}

impl EnvConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        let max_nb_turns = settings.simulation.max_nb_turns;
        Self {
            max_nb_turns,
            simulation_mode: settings.simulation.simulation_mode,
            user_kind: settings.simulation.user_kind,
            tracker_kind: settings.simulation.tracker_kind,
            rewards: RewardSchedule::from_config(&settings.rewards, max_nb_turns),
            user: settings.user.clone(),
            seed: settings.simulation.seed,
        }
    }

    /// Default behaviour with a fixed seed (for deterministic tests)
    pub fn deterministic(max_nb_turns: u32) -> Self {
        let mut settings = Settings::default();
        settings.simulation.max_nb_turns = max_nb_turns;
        settings.simulation.seed = Some(0);
        Self::from_settings(&settings)
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Surface-form units used by the environment
#[derive(Clone, Default)]
pub struct LanguageUnits {
    pub nlg: Option<Arc<dyn NaturalLanguageGenerator>>,
    pub nlu: Option<Arc<dyn NaturalLanguageUnderstanding>>,
}

impl LanguageUnits {
    /// Structured acts pass through untouched
    pub fn none() -> Self {
        Self::default()
    }

    /// The `intent(slot=value)` codec in both directions
    pub fn act_codec() -> Self {
        Self {
            nlg: Some(Arc::new(ActStringCodec)),
            nlu: Some(Arc::new(ActStringCodec)),
        }
    }
}

/// Why an episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    UserSuccess,
    UserFailure,
    TurnLimit,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::UserSuccess => f.write_str("user_success"),
            TerminationReason::UserFailure => f.write_str("user_failure"),
            TerminationReason::TurnLimit => f.write_str("turn_limit"),
        }
    }
}

/// Reward breakdown of one step
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RewardComponents {
    pub turn_penalty: f64,
    /// Success or failure reward, non-zero on the terminating step only
    pub terminal_bonus: f64,
}

impl RewardComponents {
    pub fn total(&self) -> f64 {
        self.turn_penalty + self.terminal_bonus
    }
}

/// Additional information returned from a step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepInfo {
    pub episode_id: Uuid,
    /// Utterance counter after the step
    pub turn: u32,
    pub status: DialogueStatus,
    pub termination_reason: Option<TerminationReason>,
    /// Agent act as processed by the tracker
    pub agent_action: Option<DialogAct>,
    /// User reply, absent when the turn limit cut the episode
    pub user_action: Option<DialogAct>,
    pub reward_components: RewardComponents,
    pub cumulative_reward: f64,
}

/// Result of a single environment step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub state: Vec<f32>,
    pub reward: f64,
    pub done: bool,
    pub info: StepInfo,
}

/// Turn-taking dialogue environment
pub struct DialogueEnv {
    config: EnvConfig,
    tracker: DialogueStateTracker,
    user: UserSimulator,
    language: LanguageUnits,
    /// Draws episode seeds
    rng: ChaCha8Rng,
    /// Drives the user within an episode
    episode_rng: ChaCha8Rng,
    seed: u64,
    episode_id: Uuid,
    started: bool,
    turn: u32,
    status: DialogueStatus,
    done: bool,
    termination: Option<TerminationReason>,
    cumulative_reward: f64,
    last_state: Vec<f32>,
}

impl DialogueEnv {
    pub fn new(domain: &DialogueDomain, config: EnvConfig, language: LanguageUnits) -> Result<Self> {
        if config.max_nb_turns == 0 {
            return Err(ConfigError::InvalidValue {
                field: "simulation.max_nb_turns".to_string(),
                message: "Must be at least 1".to_string(),
            }
            .into());
        }

        if config.tracker_kind == TrackerKind::ModelBased {
            return Err(ConfigError::Unsupported(
                "model-based state tracker is not available".to_string(),
            )
            .into());
        }

        if config.simulation_mode == SimulationMode::NaturalLanguage {
            if language.nlg.is_none() {
                return Err(ConfigError::MissingField("nlg (natural-language mode)".to_string()).into());
            }
            if language.nlu.is_none() {
                return Err(ConfigError::MissingField("nlu (natural-language mode)".to_string()).into());
            }
        }

        let user = UserSimulator::from_config(config.user_kind, &config.user, domain.goals.clone())?;
        let tracker = DialogueStateTracker::new(
            domain.acts.clone(),
            domain.slots.clone(),
            domain.knowledge_base.clone(),
            DialogueStateTracker::horizon_for(config.max_nb_turns),
        );
        let rng = ChaCha8Rng::seed_from_u64(config.seed.unwrap_or_else(rand::random));

        Ok(Self {
            config,
            tracker,
            user,
            language,
            rng,
            episode_rng: ChaCha8Rng::seed_from_u64(0),
            seed: 0,
            episode_id: Uuid::nil(),
            started: false,
            turn: 0,
            status: DialogueStatus::Ongoing,
            done: false,
            termination: None,
            cumulative_reward: 0.0,
            last_state: Vec::new(),
        })
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn state_dim(&self) -> usize {
        self.tracker.state_dim()
    }

    pub fn tracker(&self) -> &DialogueStateTracker {
        &self.tracker
    }

    pub fn user(&self) -> &UserSimulator {
        &self.user
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn status(&self) -> DialogueStatus {
        self.status
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn episode_id(&self) -> Uuid {
        self.episode_id
    }

    pub fn cumulative_reward(&self) -> f64 {
        self.cumulative_reward
    }

    /// Utterance count at which the agent has used up its turns
    fn turn_limit(&self) -> u32 {
        2 * self.config.max_nb_turns
    }

    /// Start a new episode with a seed drawn from the environment RNG
    pub fn reset(&mut self) -> Result<Vec<f32>> {
        let seed = self.rng.gen();
        self.reset_with_seed(seed)
    }

    /// Start a new episode from an explicit seed
    pub fn reset_with_seed(&mut self, seed: u64) -> Result<Vec<f32>> {
        self.seed = seed;
        self.episode_rng = ChaCha8Rng::seed_from_u64(seed);
        self.episode_id = Uuid::new_v4();
        self.tracker.reset();
        self.turn = 0;
        self.status = DialogueStatus::Ongoing;
        self.done = false;
        self.termination = None;
        self.cumulative_reward = 0.0;
        self.started = false;

        let opening = self.user.reset(&mut self.episode_rng);
        let opening = self.surface_user(opening)?;
        self.tracker.update(&opening, Speaker::User)?;
        self.turn = self.tracker.turn();

        let state = self.tracker.encode()?;
        self.last_state = state.clone();
        self.started = true;

        tracing::info!(
            episode_id = %self.episode_id,
            seed = seed,
            goal_index = self.user.goal_index(),
            opening = %opening,
            "Episode reset"
        );

        Ok(state)
    }

    /// Take one agent turn
    ///
    /// After the episode is done, returns the terminal state again with
    /// zero reward.
    pub fn step(&mut self, agent_action: &DialogAct) -> Result<StepResult> {
        if !self.started {
            return Err(SimError::EpisodeNotStarted);
        }

        if self.done {
            return Ok(StepResult {
                state: self.last_state.clone(),
                reward: 0.0,
                done: true,
                info: self.build_step_info(None, None, RewardComponents::default()),
            });
        }

        // The counter follows the tracker so a failed update leaves both untouched.
        let agent = self.surface_agent(agent_action)?;
        let agent = self.tracker.update(&agent, Speaker::Agent)?;
        self.turn = self.tracker.turn();

        let user = if self.turn >= self.turn_limit() {
            self.done = true;
            self.status = DialogueStatus::Failure;
            self.termination = Some(TerminationReason::TurnLimit);
            None
        } else {
            let (reply, status) = self.user.step(&agent, &mut self.episode_rng);
            let reply = self.surface_user(reply)?;
            let reply = self.tracker.update(&reply, Speaker::User)?;
            self.turn = self.tracker.turn();

            self.status = status;
            self.termination = match status {
                DialogueStatus::Success => Some(TerminationReason::UserSuccess),
                DialogueStatus::Failure => Some(TerminationReason::UserFailure),
                DialogueStatus::Ongoing => None,
            };
            self.done = self.termination.is_some();
            Some(reply)
        };

        let state = self.tracker.encode()?;
        self.last_state = state.clone();

        let components = self.compute_reward();
        let reward = components.total();
        self.cumulative_reward += reward;

        tracing::debug!(
            episode_id = %self.episode_id,
            turn = self.turn,
            agent = %agent,
            user = ?user.as_ref().map(ToString::to_string),
            reward = reward,
            "Dialogue step"
        );

        if self.done {
            tracing::info!(
                episode_id = %self.episode_id,
                turns = self.turn,
                status = %self.status,
                reason = ?self.termination,
                cumulative_reward = self.cumulative_reward,
                "Episode finished"
            );
        }

        Ok(StepResult {
            state,
            reward,
            done: self.done,
            info: self.build_step_info(Some(agent), user, components),
        })
    }

    fn compute_reward(&self) -> RewardComponents {
        let rewards = &self.config.rewards;
        let terminal_bonus = match (self.done, self.status) {
            (false, _) => 0.0,
            (true, DialogueStatus::Success) => rewards.success_reward,
            (true, _) => rewards.failure_reward,
        };

        RewardComponents {
            turn_penalty: rewards.per_turn_penalty,
            terminal_bonus,
        }
    }

    fn build_step_info(
        &self,
        agent_action: Option<DialogAct>,
        user_action: Option<DialogAct>,
        reward_components: RewardComponents,
    ) -> StepInfo {
        StepInfo {
            episode_id: self.episode_id,
            turn: self.turn,
            status: self.status,
            termination_reason: self.termination,
            agent_action,
            user_action,
            reward_components,
            cumulative_reward: self.cumulative_reward,
        }
    }

    fn surface_agent(&self, action: &DialogAct) -> Result<DialogAct> {
        action.validate()?;
        let mut act = action.clone();
        act.speaker = Speaker::Agent;
        if let Some(nlg) = &self.language.nlg {
            act.natural_language = Some(nlg.render(&act, Speaker::Agent)?);
        }
        Ok(act)
    }

    /// Render the user act and, in natural-language mode, re-read it
    fn surface_user(&self, mut act: DialogAct) -> Result<DialogAct> {
        if let Some(nlg) = &self.language.nlg {
            act.natural_language = Some(nlg.render(&act, Speaker::User)?);
        }

        if self.config.simulation_mode == SimulationMode::NaturalLanguage {
            if let (Some(nlu), Some(text)) = (&self.language.nlu, act.natural_language.clone()) {
                nlu.parse(&text)?.merge_into(&mut act);
            }
        }

        Ok(act)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kb::InMemoryKnowledgeBase;
    use dialogue_sim_core::{Goal, GoalSet, Intent, Vocabulary};

    fn domain() -> DialogueDomain {
        let records = serde_yaml::from_str("- {price: cheap, area: north}\n").unwrap();
        DialogueDomain::new(
            Vocabulary::acts(["inform", "request", "thanks"]).unwrap(),
            Vocabulary::slots(["price", "area"]).unwrap(),
            GoalSet::new(vec![Goal::new()
                .with_constraint("price", "cheap")
                .with_target("area")])
            .unwrap(),
            Arc::new(InMemoryKnowledgeBase::new(records)),
        )
        .unwrap()
    }

    #[test]
    fn test_step_before_reset() {
        let mut env = DialogueEnv::new(&domain(), EnvConfig::deterministic(5), LanguageUnits::none())
            .unwrap();
        assert!(matches!(
            env.step(&DialogAct::agent("thanks")),
            Err(SimError::EpisodeNotStarted)
        ));
    }

    #[test]
    fn test_reset_state() {
        let mut env = DialogueEnv::new(&domain(), EnvConfig::deterministic(5), LanguageUnits::none())
            .unwrap();
        let state = env.reset().unwrap();
        assert_eq!(state.len(), 2 * 3 + 6 * 2 + 11 + 3);
        assert_eq!(env.turn(), 1);
        assert_eq!(env.tracker().turn(), 1);
        assert!(!env.is_done());
    }

    #[test]
    fn test_turn_counters_agree() {
        let mut env = DialogueEnv::new(&domain(), EnvConfig::deterministic(5), LanguageUnits::none())
            .unwrap();
        env.reset().unwrap();
        let result = env.step(&DialogAct::agent("inform").with_inform("price", "cheap")).unwrap();
        assert_eq!(result.info.turn, 3);
        assert_eq!(env.tracker().turn(), 3);
        assert_eq!(env.user().turn(), 3);
    }

    #[test]
    fn test_failed_step_keeps_counters_in_sync() {
        let mut env = DialogueEnv::new(&domain(), EnvConfig::deterministic(5), LanguageUnits::none())
            .unwrap();
        env.reset().unwrap();

        let invalid = DialogAct::agent("request")
            .with_inform("price", "cheap")
            .with_request("price");
        assert!(matches!(env.step(&invalid), Err(SimError::Core(_))));
        assert_eq!(env.turn(), 1);
        assert_eq!(env.tracker().turn(), 1);
        assert_eq!(env.user().turn(), 1);

        let stalling = DialogAct::agent("request").with_request("price");
        let mut steps = 0;
        loop {
            let result = env.step(&stalling).unwrap();
            steps += 1;
            assert_eq!(env.turn(), env.tracker().turn());
            assert_eq!(result.info.turn, env.tracker().turn());
            if result.done {
                break;
            }
        }
        assert_eq!(steps, 5);
        assert_eq!(env.turn(), 10);
    }

    #[test]
    fn test_unrenderable_agent_act_leaves_state_untouched() {
        let mut config = EnvConfig::deterministic(5);
        config.simulation_mode = SimulationMode::NaturalLanguage;
        let mut env = DialogueEnv::new(&domain(), config, LanguageUnits::act_codec()).unwrap();
        env.reset().unwrap();
        let history = env.tracker().history().len();

        let act = DialogAct::agent("inform").with_inform("area", "north;price=cheap");
        assert!(env.step(&act).is_err());
        assert_eq!(env.turn(), env.tracker().turn());
        assert_eq!(env.tracker().history().len(), history);
    }

    #[test]
    fn test_natural_language_mode_requires_units() {
        let mut config = EnvConfig::deterministic(5);
        config.simulation_mode = SimulationMode::NaturalLanguage;
        assert!(matches!(
            DialogueEnv::new(&domain(), config.clone(), LanguageUnits::none()),
            Err(SimError::Config(ConfigError::MissingField(_)))
        ));

        let mut env = DialogueEnv::new(&domain(), config, LanguageUnits::act_codec()).unwrap();
        env.reset().unwrap();
        let result = env.step(&DialogAct::agent("inform").with_inform("price", "cheap")).unwrap();
        let user = result.info.user_action.unwrap();
        assert_eq!(user.intent, Intent::Request);
        assert_eq!(user.natural_language.as_deref(), Some("request(area)"));
        assert_eq!(
            result.info.agent_action.unwrap().natural_language.as_deref(),
            Some("inform(price=cheap)")
        );
    }

    #[test]
    fn test_model_based_tracker_unsupported() {
        let mut config = EnvConfig::deterministic(5);
        config.tracker_kind = TrackerKind::ModelBased;
        assert!(matches!(
            DialogueEnv::new(&domain(), config, LanguageUnits::none()),
            Err(SimError::Config(ConfigError::Unsupported(_)))
        ));
    }

    #[test]
    fn test_zero_turns_rejected() {
        let mut config = EnvConfig::deterministic(5);
        config.max_nb_turns = 0;
        assert!(DialogueEnv::new(&domain(), config, LanguageUnits::none()).is_err());
    }

    #[test]
    fn test_reset_with_seed_is_reproducible() {
        let goals = GoalSet::new(
            (0..8)
                .map(|i| Goal::new().with_constraint("price", format!("p{}", i)).with_target("area"))
                .collect(),
        )
        .unwrap();
        let mut domain = domain();
        domain.goals = goals;

        let mut env = DialogueEnv::new(&domain, EnvConfig::deterministic(5), LanguageUnits::none())
            .unwrap();
        env.reset_with_seed(42).unwrap();
        let first = env.user().goal_index();
        let first_opening = env.tracker().history()[0].clone();

        env.reset_with_seed(42).unwrap();
        assert_eq!(env.user().goal_index(), first);
        assert_eq!(env.tracker().history()[0], first_opening);
    }

    #[test]
    fn test_step_info_serializes() {
        let mut env = DialogueEnv::new(&domain(), EnvConfig::deterministic(5), LanguageUnits::none())
            .unwrap();
        env.reset().unwrap();
        let result = env.step(&DialogAct::agent("thanks")).unwrap();

        let json = serde_json::to_value(&result.info).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["termination_reason"], "user_success");
        assert_eq!(json["agent_action"]["intent"], "thanks");
        assert_eq!(json["reward_components"]["terminal_bonus"], 10.0);
    }

    #[test]
    fn test_reward_defaults_scale_with_turns() {
        let config = EnvConfig::deterministic(5);
        assert_eq!(config.rewards.per_turn_penalty, -1.0);
        assert_eq!(config.rewards.success_reward, 10.0);
        assert_eq!(config.rewards.failure_reward, -5.0);
    }
}
