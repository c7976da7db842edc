//! Layout of the encoded dialogue state
//!
//! The policy consumes a flat `Vec<f32>`. Its segments, in order:
//!
//! ```text
//! user intent one-hot           A
//! user inform slots bag         S
//! user request slots bag        S
//! agent intent one-hot          A
//! agent inform slots bag        S
//! agent request slots bag       S
//! turn / 10                     1
//! turn one-hot                  T
//! KB match indicators           S + 1
//! KB match counts / 100         S + 1
//! ```
//!
//! Changing the order or widths breaks every trained policy, so such a
//! change must bump `STATE_LAYOUT_VERSION`.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Layout version, bumped on any change to segment order or width
pub const STATE_LAYOUT_VERSION: u32 = 1;

/// One contiguous slice of the state vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    UserIntent,
    UserInformSlots,
    UserRequestSlots,
    AgentIntent,
    AgentInformSlots,
    AgentRequestSlots,
    TurnScalar,
    TurnOneHot,
    KbMatchIndicators,
    KbMatchCounts,
}

impl Segment {
    /// Every segment in encoding order
    pub const ALL: [Segment; 10] = [
        Segment::UserIntent,
        Segment::UserInformSlots,
        Segment::UserRequestSlots,
        Segment::AgentIntent,
        Segment::AgentInformSlots,
        Segment::AgentRequestSlots,
        Segment::TurnScalar,
        Segment::TurnOneHot,
        Segment::KbMatchIndicators,
        Segment::KbMatchCounts,
    ];
}

/// Sizes the state vector is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateLayout {
    /// Act vocabulary size (A)
    pub acts: usize,
    /// Slot vocabulary size (S)
    pub slots: usize,
    /// Turn one-hot width (T)
    pub horizon: usize,
}

impl StateLayout {
    pub fn new(acts: usize, slots: usize, horizon: usize) -> Self {
        Self {
            acts,
            slots,
            horizon,
        }
    }

    pub fn width(&self, segment: Segment) -> usize {
        match segment {
            Segment::UserIntent | Segment::AgentIntent => self.acts,
            Segment::UserInformSlots
            | Segment::UserRequestSlots
            | Segment::AgentInformSlots
            | Segment::AgentRequestSlots => self.slots,
            Segment::TurnScalar => 1,
            Segment::TurnOneHot => self.horizon,
            Segment::KbMatchIndicators | Segment::KbMatchCounts => self.slots + 1,
        }
    }

    /// Index range of a segment within the state vector
    pub fn range(&self, segment: Segment) -> Range<usize> {
        let start: usize = Segment::ALL
            .iter()
            .take_while(|s| **s != segment)
            .map(|s| self.width(*s))
            .sum();
        start..start + self.width(segment)
    }

    /// Total state dimension: `2A + 6S + T + 3`
    pub fn dim(&self) -> usize {
        2 * self.acts + 6 * self.slots + self.horizon + 3
    }
}
