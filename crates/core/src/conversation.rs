//! Dialogue-level types shared across crates

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a dialogue so far
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DialogueStatus {
    #[default]
    Ongoing,
    Success,
    Failure,
}

impl DialogueStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DialogueStatus::Ongoing)
    }
}

impl fmt::Display for DialogueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialogueStatus::Ongoing => f.write_str("ongoing"),
            DialogueStatus::Success => f.write_str("success"),
            DialogueStatus::Failure => f.write_str("failure"),
        }
    }
}

/// How user utterances travel between the user and the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SimulationMode {
    /// Structured acts are passed through unchanged
    #[default]
    SemanticFrame,
    /// User acts are rendered to text and re-parsed by the NLU unit
    NaturalLanguage,
}
