//! Read-only data shared by every episode

use dialogue_sim_config::{
    load_act_vocabulary, load_action_catalog, load_goal_set, load_kb_records,
    load_slot_vocabulary, ConfigError, DataPaths,
};
use dialogue_sim_core::{
    GoalSet, KnowledgeBase, UnsupportedKnowledgeBase, Vocabulary, TASK_COMPLETE_SLOT,
};
use std::sync::Arc;

use crate::error::Result;
use crate::kb::InMemoryKnowledgeBase;
use crate::processor::ActionCatalog;

/// Vocabularies, goals and knowledge base of one dialogue domain
///
/// Clones share the same data. Nothing here is mutated after construction.
#[derive(Clone)]
pub struct DialogueDomain {
    pub acts: Arc<Vocabulary>,
    pub slots: Arc<Vocabulary>,
    pub goals: GoalSet,
    pub knowledge_base: Arc<dyn KnowledgeBase>,
}

impl DialogueDomain {
    pub fn new(
        acts: Vocabulary,
        slots: Vocabulary,
        goals: GoalSet,
        knowledge_base: Arc<dyn KnowledgeBase>,
    ) -> Result<Self> {
        if acts.is_empty() {
            return Err(ConfigError::MissingField("act vocabulary".to_string()).into());
        }
        if slots.is_empty() {
            return Err(ConfigError::MissingField("slot vocabulary".to_string()).into());
        }
        goals.validate(&slots)?;

        Ok(Self {
            acts: Arc::new(acts),
            slots: Arc::new(slots),
            goals,
            knowledge_base,
        })
    }

    /// Load every data file named in `paths`
    ///
    /// Without a knowledge base file, lookups fail with an unsupported error.
    pub fn load(paths: &DataPaths) -> Result<Self> {
        let acts = load_act_vocabulary(&paths.act_vocabulary)?;
        let slots = load_slot_vocabulary(&paths.slot_vocabulary)?;
        let goals = load_goal_set(&paths.goals, &slots)?;

        let knowledge_base: Arc<dyn KnowledgeBase> = match &paths.knowledge_base {
            Some(path) => Arc::new(InMemoryKnowledgeBase::new(load_kb_records(path)?)),
            None => {
                tracing::warn!("No knowledge base configured; state encoding will fail");
                Arc::new(UnsupportedKnowledgeBase)
            }
        };

        tracing::info!(
            acts = acts.len(),
            slots = slots.len(),
            goals = goals.len(),
            kb = knowledge_base.name(),
            "Loaded dialogue domain"
        );

        Self::new(acts, slots, goals, knowledge_base)
    }

    /// Feasible agent actions: the configured catalog, or the standard one
    /// over every slot in the vocabulary
    pub fn action_catalog(&self, paths: &DataPaths) -> Result<ActionCatalog> {
        match &paths.action_catalog {
            Some(path) => ActionCatalog::from_acts(load_action_catalog(path)?),
            None => {
                let slots: Vec<&str> = self
                    .slots
                    .names()
                    .iter()
                    .map(String::as_str)
                    .filter(|slot| *slot != TASK_COMPLETE_SLOT)
                    .collect();
                Ok(ActionCatalog::standard(slots.clone(), slots))
            }
        }
    }
}
