//! Simulated users
//!
//! A user samples a goal on reset, opens the dialogue, then answers every
//! agent act with its own act and a dialogue status. The set of user kinds
//! is closed; the kind is picked from configuration at construction.

mod rule_based;

pub use rule_based::RuleBasedUser;

use dialogue_sim_config::{ConfigError, UserConfig, UserKind};
use dialogue_sim_core::{DialogAct, DialogueStatus, Goal, GoalSet, Intent, SlotValue};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Result, SimError};

/// What the user has said and still has to say
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInternalState {
    /// Intent of the user's current utterance
    pub current_intent: Intent,
    /// Slots revealed in the current utterance
    pub inform_slots: BTreeMap<String, SlotValue>,
    /// Pending requests, `Unknown` until answered
    pub request_slots: BTreeMap<String, SlotValue>,
    /// Every slot value exchanged so far
    pub history_slots: BTreeMap<String, SlotValue>,
    /// Goal slots not yet dealt with
    pub rest_slots: BTreeSet<String>,
}

impl Default for UserInternalState {
    fn default() -> Self {
        Self {
            current_intent: Intent::Inform,
            inform_slots: BTreeMap::new(),
            request_slots: BTreeMap::new(),
            history_slots: BTreeMap::new(),
            rest_slots: BTreeSet::new(),
        }
    }
}

impl UserInternalState {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// User simulator selected by configuration
pub enum UserSimulator {
    RuleBased(RuleBasedUser),
}

impl UserSimulator {
    pub fn from_config(kind: UserKind, config: &UserConfig, goals: GoalSet) -> Result<Self> {
        match kind {
            UserKind::RuleBased => Ok(UserSimulator::RuleBased(RuleBasedUser::new(
                goals,
                config.clone(),
            )?)),
            UserKind::ModelBased => Err(SimError::Config(ConfigError::Unsupported(
                "model-based user simulator is not available".to_string(),
            ))),
        }
    }

    /// Sample a new goal and return the opening user act
    pub fn reset<R: Rng>(&mut self, rng: &mut R) -> DialogAct {
        match self {
            UserSimulator::RuleBased(user) => user.reset(rng),
        }
    }

    /// Answer an agent act
    pub fn step<R: Rng>(
        &mut self,
        agent_action: &DialogAct,
        rng: &mut R,
    ) -> (DialogAct, DialogueStatus) {
        match self {
            UserSimulator::RuleBased(user) => user.step(agent_action, rng),
        }
    }

    pub fn goal(&self) -> &Goal {
        match self {
            UserSimulator::RuleBased(user) => user.goal(),
        }
    }

    pub fn goal_index(&self) -> usize {
        match self {
            UserSimulator::RuleBased(user) => user.goal_index(),
        }
    }

    pub fn turn(&self) -> u32 {
        match self {
            UserSimulator::RuleBased(user) => user.turn(),
        }
    }

    pub fn status(&self) -> DialogueStatus {
        match self {
            UserSimulator::RuleBased(user) => user.status(),
        }
    }

    pub fn state(&self) -> &UserInternalState {
        match self {
            UserSimulator::RuleBased(user) => user.state(),
        }
    }
}
