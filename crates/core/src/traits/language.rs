//! Surface-form collaborators
//!
//! NLG renders a structured act to text; NLU parses text back into the
//! fields of an act. Neither is part of the simulator. The orchestrator
//! calls them when configured and otherwise passes acts through.

use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::act::{DialogAct, Intent, SlotValue, Speaker};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LanguageError {
    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Understanding failed: {0}")]
    Understanding(String),
}

/// Fields recovered from text by an NLU unit
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedAct {
    pub intent: Option<Intent>,
    pub inform_slots: BTreeMap<String, SlotValue>,
    pub request_slots: BTreeSet<String>,
}

impl ParsedAct {
    /// Merge the parsed fields into `act`
    ///
    /// Additive: a parsed intent replaces the act's intent, parsed slots
    /// are added, nothing is removed. A parsed inform wins over a request
    /// for the same slot so the act stays valid.
    pub fn merge_into(self, act: &mut DialogAct) {
        if let Some(intent) = self.intent {
            act.intent = intent;
        }
        for (slot, value) in self.inform_slots {
            act.request_slots.remove(&slot);
            act.inform_slots.insert(slot, value);
        }
        for slot in self.request_slots {
            if !act.inform_slots.contains_key(&slot) {
                act.request_slots.insert(slot);
            }
        }
    }
}

/// Natural-language generation unit
pub trait NaturalLanguageGenerator: Send + Sync {
    fn render(&self, act: &DialogAct, speaker: Speaker) -> Result<String, LanguageError>;
}

/// Natural-language understanding unit
pub trait NaturalLanguageUnderstanding: Send + Sync {
    fn parse(&self, text: &str) -> Result<ParsedAct, LanguageError>;
}
