//! Agent boundary
//!
//! A policy picks a discrete action index; the catalog of feasible agent
//! acts turns that index into a dialogue act for the environment.

use dialogue_sim_config::ConfigError;
use dialogue_sim_core::{DialogAct, Intent, SlotValue, Speaker, TASK_COMPLETE_SLOT};

use crate::error::{Result, SimError};

/// Feasible agent actions, indexed densely
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionCatalog {
    actions: Vec<DialogAct>,
}

impl ActionCatalog {
    /// Build from explicit acts; every act is validated and attributed to the agent
    pub fn from_acts(actions: Vec<DialogAct>) -> Result<Self> {
        if actions.is_empty() {
            return Err(ConfigError::MissingField("action catalog".to_string()).into());
        }

        let mut catalog = Vec::with_capacity(actions.len());
        for mut act in actions {
            act.validate()?;
            act.speaker = Speaker::Agent;
            act.turn_number = 0;
            catalog.push(act);
        }

        Ok(Self { actions: catalog })
    }

    /// Conventional catalog for a slot-filling domain
    ///
    /// `confirm_question`, `confirm_answer`, `thanks`, `deny`, task completion,
    /// then one placeholder inform per informable slot and one request per
    /// requestable slot.
    pub fn standard<I, R, S, T>(informable: I, requestable: R) -> Self
    where
        I: IntoIterator<Item = S>,
        R: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        let mut actions = vec![
            DialogAct::agent(Intent::ConfirmQuestion),
            DialogAct::agent(Intent::ConfirmAnswer),
            DialogAct::agent(Intent::Thanks),
            DialogAct::agent(Intent::Deny),
            DialogAct::agent(Intent::Inform).with_inform(TASK_COMPLETE_SLOT, SlotValue::Placeholder),
        ];

        actions.extend(informable.into_iter().map(|slot| {
            DialogAct::agent(Intent::Inform).with_inform(slot, SlotValue::Placeholder)
        }));
        actions.extend(
            requestable
                .into_iter()
                .map(|slot| DialogAct::agent(Intent::Request).with_request(slot)),
        );

        Self { actions }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn actions(&self) -> &[DialogAct] {
        &self.actions
    }

    /// Owned copy of the act behind `index`
    pub fn process_action(&self, index: usize) -> Result<DialogAct> {
        self.actions
            .get(index)
            .cloned()
            .ok_or(SimError::ActionOutOfBounds {
                index,
                len: self.actions.len(),
            })
    }

    /// Index of an act with the same intent and slots
    pub fn index_of(&self, act: &DialogAct) -> Option<usize> {
        self.actions.iter().position(|candidate| {
            candidate.intent == act.intent
                && candidate.inform_slots == act.inform_slots
                && candidate.request_slots == act.request_slots
        })
    }
}
