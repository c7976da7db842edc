//! Dialogue State Tracking (DST)
//!
//! Rule-based tracker that merges every utterance of an episode into a
//! running slot record and encodes the result for the policy.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   DialogueStateTracker                      │
//! │  - update(act, speaker): merge into RunningSlotRecord       │
//! │  - history: owned HistoryEntry snapshots                    │
//! │  - encode(): fixed-width vector per StateLayout             │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 KnowledgeBase (collaborator)                │
//! │  - fills PLACEHOLDER values in agent acts                   │
//! │  - counts records matching the running inform record        │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod layout;

pub use layout::{Segment, StateLayout, STATE_LAYOUT_VERSION};

use dialogue_sim_core::{
    DialogAct, Intent, KnowledgeBase, SlotValue, Speaker, Vocabulary, TASK_COMPLETE_SLOT,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::error::{Result, SimError};

/// Slot state gathered over the dialogue so far
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunningSlotRecord {
    /// Every slot value asserted by either side, latest wins
    pub inform: BTreeMap<String, SlotValue>,
    /// Slots the user asked for and has not been told yet
    pub request: BTreeMap<String, SlotValue>,
    /// Values the agent offered from the knowledge base
    pub proposed: BTreeMap<String, SlotValue>,
    /// Slots the agent asked the user for
    pub agent_requested: BTreeMap<String, SlotValue>,
}

impl RunningSlotRecord {
    pub fn clear(&mut self) {
        self.inform.clear();
        self.request.clear();
        self.proposed.clear();
        self.agent_requested.clear();
    }
}

/// Immutable snapshot of one processed utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub turn_number: u32,
    pub speaker: Speaker,
    pub intent: Intent,
    pub inform_slots: BTreeMap<String, SlotValue>,
    pub request_slots: BTreeSet<String>,
}

impl From<&DialogAct> for HistoryEntry {
    fn from(act: &DialogAct) -> Self {
        Self {
            turn_number: act.turn_number,
            speaker: act.speaker,
            intent: act.intent.clone(),
            inform_slots: act.inform_slots.clone(),
            request_slots: act.request_slots.clone(),
        }
    }
}

/// Rule-based dialogue state tracker
pub struct DialogueStateTracker {
    acts: Arc<Vocabulary>,
    slots: Arc<Vocabulary>,
    knowledge_base: Arc<dyn KnowledgeBase>,
    layout: StateLayout,
    record: RunningSlotRecord,
    history: Vec<HistoryEntry>,
    /// Utterances processed since the last reset
    turn: u32,
}

impl DialogueStateTracker {
    /// Turn one-hot width needed for an episode of `max_nb_turns` rounds
    ///
    /// Each round is two utterances and the user opens the dialogue, so the
    /// counter never exceeds `2 * max_nb_turns`.
    pub fn horizon_for(max_nb_turns: u32) -> usize {
        2 * max_nb_turns as usize + 1
    }

    pub fn new(
        acts: Arc<Vocabulary>,
        slots: Arc<Vocabulary>,
        knowledge_base: Arc<dyn KnowledgeBase>,
        horizon: usize,
    ) -> Self {
        let layout = StateLayout::new(acts.len(), slots.len(), horizon);
        Self {
            acts,
            slots,
            knowledge_base,
            layout,
            record: RunningSlotRecord::default(),
            history: Vec::new(),
            turn: 0,
        }
    }

    pub fn layout(&self) -> &StateLayout {
        &self.layout
    }

    pub fn state_dim(&self) -> usize {
        self.layout.dim()
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn record(&self) -> &RunningSlotRecord {
        &self.record
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Most recent user utterance
    pub fn last_user_action(&self) -> Option<&HistoryEntry> {
        self.last_by(Speaker::User)
    }

    /// Most recent agent utterance
    pub fn last_agent_action(&self) -> Option<&HistoryEntry> {
        self.last_by(Speaker::Agent)
    }

    fn last_by(&self, speaker: Speaker) -> Option<&HistoryEntry> {
        self.history.iter().rev().find(|entry| entry.speaker == speaker)
    }

    /// Clear all running state and the turn counter
    pub fn reset(&mut self) {
        self.record.clear();
        self.history.clear();
        self.turn = 0;
    }

    /// Merge one utterance into the running record
    ///
    /// Returns the act as processed: speaker and turn number stamped and,
    /// for agent acts, knowledge base placeholders resolved.
    pub fn update(&mut self, action: &DialogAct, speaker: Speaker) -> Result<DialogAct> {
        action.validate()?;

        let next_turn = self.turn + 1;
        if next_turn as usize >= self.layout.horizon {
            return Err(SimError::TurnOverflow {
                turn: next_turn,
                horizon: self.layout.horizon,
            });
        }

        let mut processed = action.clone();
        processed.speaker = speaker;
        processed.turn_number = self.turn;

        match speaker {
            Speaker::User => self.merge_user(&processed),
            Speaker::Agent => self.merge_agent(&mut processed)?,
        }

        self.history.push(HistoryEntry::from(&processed));
        self.turn = next_turn;

        Ok(processed)
    }

    fn merge_user(&mut self, act: &DialogAct) {
        for (slot, value) in &act.inform_slots {
            self.record.inform.insert(slot.clone(), value.clone());
            if self.record.request.remove(slot).is_some() {
                tracing::debug!(slot = %slot, value = %value, "User resolved pending request");
            }
        }

        for slot in &act.request_slots {
            if !self.record.request.contains_key(slot) {
                self.record.request.insert(slot.clone(), SlotValue::Unknown);
                tracing::debug!(slot = %slot, "User request pending");
            }
        }
    }

    fn merge_agent(&mut self, act: &mut DialogAct) -> Result<()> {
        let placeholders: BTreeSet<String> = act
            .inform_slots
            .iter()
            .filter(|(_, value)| value.is_placeholder())
            .map(|(slot, _)| slot.clone())
            .collect();

        if !placeholders.is_empty() {
            let filled = self
                .knowledge_base
                .fill_inform_slots(&placeholders, &self.record.inform)?;
            for slot in &placeholders {
                let value = filled.get(slot).cloned().unwrap_or(SlotValue::NoMatch);
                tracing::debug!(
                    slot = %slot,
                    value = %value,
                    kb = self.knowledge_base.name(),
                    "Filled placeholder from knowledge base"
                );
                act.inform_slots.insert(slot.clone(), value);
            }
        }

        // Completing the task restates the constraints the booking was made with.
        if act.is_task_complete() {
            for (slot, value) in &self.record.inform {
                if !act.request_slots.contains(slot) {
                    act.inform_slots
                        .entry(slot.clone())
                        .or_insert_with(|| value.clone());
                }
            }
        }

        for (slot, value) in &act.inform_slots {
            if slot == TASK_COMPLETE_SLOT {
                continue;
            }
            self.record.proposed.insert(slot.clone(), value.clone());
            self.record.inform.insert(slot.clone(), value.clone());
            self.record.request.remove(slot);
        }

        for slot in &act.request_slots {
            self.record
                .agent_requested
                .entry(slot.clone())
                .or_insert(SlotValue::Unknown);
        }

        Ok(())
    }

    /// Encode the tracker state for the policy
    ///
    /// Sub-vectors of a speaker that has not spoken yet stay zero.
    pub fn encode(&self) -> Result<Vec<f32>> {
        let layout = self.layout;
        let mut state = vec![0.0f32; layout.dim()];

        if let Some(user) = self.last_user_action() {
            self.one_hot_intent(&mut state, Segment::UserIntent, &user.intent)?;
            self.bag(
                &mut state,
                Segment::UserInformSlots,
                user.inform_slots.keys(),
            )?;
            self.bag(&mut state, Segment::UserRequestSlots, user.request_slots.iter())?;
        }

        if let Some(agent) = self.last_agent_action() {
            self.one_hot_intent(&mut state, Segment::AgentIntent, &agent.intent)?;
            self.bag(
                &mut state,
                Segment::AgentInformSlots,
                agent.inform_slots.keys(),
            )?;
            self.bag(
                &mut state,
                Segment::AgentRequestSlots,
                agent.request_slots.iter(),
            )?;
        }

        let turn = self.turn as usize;
        state[layout.range(Segment::TurnScalar).start] = self.turn as f32 / 10.0;
        let turn_range = layout.range(Segment::TurnOneHot);
        if turn >= turn_range.len() {
            return Err(SimError::TurnOverflow {
                turn: self.turn,
                horizon: layout.horizon,
            });
        }
        state[turn_range.start + turn] = 1.0;

        self.encode_kb(&mut state)?;

        Ok(state)
    }

    fn one_hot_intent(&self, state: &mut [f32], segment: Segment, intent: &Intent) -> Result<()> {
        let index = self.acts.intent_index(intent)?;
        state[self.layout.range(segment).start + index] = 1.0;
        Ok(())
    }

    fn bag<'a, I>(&self, state: &mut [f32], segment: Segment, slots: I) -> Result<()>
    where
        I: Iterator<Item = &'a String>,
    {
        let start = self.layout.range(segment).start;
        for slot in slots {
            state[start + self.slots.index_of(slot)?] = 1.0;
        }
        Ok(())
    }

    fn encode_kb(&self, state: &mut [f32]) -> Result<()> {
        let result = self.knowledge_base.query(&self.record.inform)?;
        let indicators = self.layout.range(Segment::KbMatchIndicators);
        let counts = self.layout.range(Segment::KbMatchCounts);

        for (slot, count) in &result.slot_counts {
            let Ok(index) = self.slots.index_of(slot) else {
                continue;
            };
            if *count > 0 {
                state[indicators.start + index] = 1.0;
            }
            state[counts.start + index] = *count as f32 / 100.0;
        }

        let overall = self.slots.len();
        if result.matching_all_constraints > 0 {
            state[indicators.start + overall] = 1.0;
        }
        state[counts.start + overall] = result.matching_all_constraints as f32 / 100.0;

        Ok(())
    }
}
