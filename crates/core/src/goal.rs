//! User goals
//!
//! A goal is what a simulated user is trying to achieve in one episode:
//! the constraints it will reveal and the slots it wants the agent to
//! fill. Goals are sampled once per episode and never mutated.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::vocabulary::Vocabulary;

/// Ground-truth goal of a simulated user
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Goal {
    /// Slot -> value constraints
    #[serde(default, alias = "inform_slots")]
    pub inform_constraints: BTreeMap<String, String>,
    /// Slots the user wants filled
    #[serde(default, alias = "request_slots")]
    pub request_targets: BTreeSet<String>,
}

impl Goal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_constraint(mut self, slot: impl Into<String>, value: impl Into<String>) -> Self {
        self.inform_constraints.insert(slot.into(), value.into());
        self
    }

    pub fn with_target(mut self, slot: impl Into<String>) -> Self {
        self.request_targets.insert(slot.into());
        self
    }

    pub fn constraint(&self, slot: &str) -> Option<&str> {
        self.inform_constraints.get(slot).map(String::as_str)
    }

    pub fn is_constraint(&self, slot: &str) -> bool {
        self.inform_constraints.contains_key(slot)
    }

    pub fn is_target(&self, slot: &str) -> bool {
        self.request_targets.contains(slot)
    }

    /// Check every slot name against the slot vocabulary
    pub fn validate(&self, slots: &Vocabulary) -> Result<()> {
        for slot in self
            .inform_constraints
            .keys()
            .chain(self.request_targets.iter())
        {
            slots.index_of(slot)?;
        }

        if let Some(slot) = self
            .request_targets
            .iter()
            .find(|slot| self.inform_constraints.contains_key(slot.as_str()))
        {
            return Err(Error::InvalidGoal(format!(
                "slot '{}' is both a constraint and a request target",
                slot
            )));
        }

        Ok(())
    }
}

/// Read-only set of goals shared by every episode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalSet {
    goals: Arc<[Goal]>,
}

impl GoalSet {
    pub fn new(goals: Vec<Goal>) -> Result<Self> {
        if goals.is_empty() {
            return Err(Error::InvalidGoal("goal set is empty".to_string()));
        }
        Ok(Self {
            goals: goals.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.goals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Goal> {
        self.goals.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Goal> {
        self.goals.iter()
    }

    /// Validate every goal against the slot vocabulary
    pub fn validate(&self, slots: &Vocabulary) -> Result<()> {
        for (index, goal) in self.goals.iter().enumerate() {
            goal.validate(slots).map_err(|e| match e {
                Error::InvalidGoal(msg) => Error::InvalidGoal(format!("goal {}: {}", index, msg)),
                other => other,
            })?;
        }
        Ok(())
    }
}
