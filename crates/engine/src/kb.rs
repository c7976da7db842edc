//! In-memory knowledge base
//!
//! Linear scan over a list of records. Constraint values compare
//! case-insensitively; `DontCare`, `Unknown` and `Placeholder` match
//! anything, `NoMatch` matches nothing.

use dialogue_sim_config::KbRecord;
use dialogue_sim_core::{
    Constraints, KbError, KbQueryResult, KnowledgeBase, SlotValue, TASK_COMPLETE_SLOT,
};
use std::collections::{BTreeMap, BTreeSet};

/// Value filled into `taskcomplete` when some record satisfies every constraint
pub const TASK_AVAILABLE: &str = "available";

#[derive(Debug, Clone, Default)]
pub struct InMemoryKnowledgeBase {
    records: Vec<KbRecord>,
}

impl InMemoryKnowledgeBase {
    pub fn new(records: Vec<KbRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn value_matches(record: &KbRecord, slot: &str, value: &SlotValue) -> bool {
        match value {
            SlotValue::DontCare | SlotValue::Unknown | SlotValue::Placeholder => true,
            SlotValue::NoMatch => false,
            SlotValue::Value(expected) => record
                .get(slot)
                .map(|actual| actual.eq_ignore_ascii_case(expected))
                .unwrap_or(false),
        }
    }

    fn is_constraint(slot: &str) -> bool {
        slot != TASK_COMPLETE_SLOT
    }

    fn matches_all(record: &KbRecord, constraints: &Constraints) -> bool {
        constraints
            .iter()
            .filter(|(slot, _)| Self::is_constraint(slot))
            .all(|(slot, value)| Self::value_matches(record, slot, value))
    }
}

impl KnowledgeBase for InMemoryKnowledgeBase {
    fn query(&self, constraints: &Constraints) -> Result<KbQueryResult, KbError> {
        let mut result = KbQueryResult::default();

        for (slot, value) in constraints.iter().filter(|(slot, _)| Self::is_constraint(slot)) {
            let count = self
                .records
                .iter()
                .filter(|record| Self::value_matches(record, slot, value))
                .count() as u64;
            result.slot_counts.insert(slot.clone(), count);
        }

        result.matching_all_constraints = self
            .records
            .iter()
            .filter(|record| Self::matches_all(record, constraints))
            .count() as u64;

        Ok(result)
    }

    fn fill_inform_slots(
        &self,
        slots: &BTreeSet<String>,
        constraints: &Constraints,
    ) -> Result<BTreeMap<String, SlotValue>, KbError> {
        let record = self
            .records
            .iter()
            .find(|record| Self::matches_all(record, constraints));

        let filled = slots
            .iter()
            .map(|slot| {
                let value = match record {
                    Some(_) if slot == TASK_COMPLETE_SLOT => SlotValue::value(TASK_AVAILABLE),
                    Some(record) => record
                        .get(slot)
                        .map(|v| SlotValue::value(v.as_str()))
                        .unwrap_or(SlotValue::NoMatch),
                    None => SlotValue::NoMatch,
                };
                (slot.clone(), value)
            })
            .collect();

        Ok(filled)
    }

    fn name(&self) -> &str {
        "in_memory"
    }
}
