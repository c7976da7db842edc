//! Knowledge base collaborator
//!
//! The tracker consults the knowledge base twice per dialogue turn: to
//! fill the values an agent act leaves as placeholders, and to count the
//! records compatible with the constraints gathered so far.
//!
//! Implementations must be synchronous from the caller's point of view.
//! A backend that needs I/O wraps it so that `query` blocks until done.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::act::SlotValue;

/// Slot -> value constraints handed to the knowledge base
pub type Constraints = BTreeMap<String, SlotValue>;

/// Knowledge base failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KbError {
    /// No knowledge base is wired in. Returned instead of empty results
    /// so a missing backend can never pass for "nothing matched".
    #[error("Knowledge base unsupported: {0}")]
    Unsupported(String),

    #[error("Knowledge base query failed: {0}")]
    Query(String),
}

/// Match counts for a set of constraints
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KbQueryResult {
    /// Records matching each constrained slot on its own
    pub slot_counts: BTreeMap<String, u64>,
    /// Records matching every constraint at once
    pub matching_all_constraints: u64,
}

impl KbQueryResult {
    pub fn count(&self, slot: &str) -> u64 {
        self.slot_counts.get(slot).copied().unwrap_or(0)
    }
}

/// Knowledge base lookups used by the state tracker
pub trait KnowledgeBase: Send + Sync {
    /// Count records compatible with `constraints`
    fn query(&self, constraints: &Constraints) -> Result<KbQueryResult, KbError>;

    /// Fill values for `slots` from a record compatible with `constraints`
    ///
    /// Every requested slot appears in the result, as `SlotValue::NoMatch`
    /// when no compatible record carries it.
    fn fill_inform_slots(
        &self,
        slots: &BTreeSet<String>,
        constraints: &Constraints,
    ) -> Result<BTreeMap<String, SlotValue>, KbError>;

    /// Backend name for logs
    fn name(&self) -> &str {
        "knowledge_base"
    }
}

/// Knowledge base that refuses every lookup
#[derive(Debug, Clone, Default)]
pub struct UnsupportedKnowledgeBase;

impl KnowledgeBase for UnsupportedKnowledgeBase {
    fn query(&self, _constraints: &Constraints) -> Result<KbQueryResult, KbError> {
        Err(KbError::Unsupported(
            "no knowledge base configured for query".to_string(),
        ))
    }

    fn fill_inform_slots(
        &self,
        _slots: &BTreeSet<String>,
        _constraints: &Constraints,
    ) -> Result<BTreeMap<String, SlotValue>, KbError> {
        Err(KbError::Unsupported(
            "no knowledge base configured for slot filling".to_string(),
        ))
    }

    fn name(&self) -> &str {
        "unsupported"
    }
}
