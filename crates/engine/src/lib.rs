//! Dialogue simulation engine
//!
//! Features:
//! - Dialogue state tracking with a fixed-width numeric state
//! - Rule-based simulated user with sampled goals
//! - Turn-taking environment with shaped rewards
//! - In-memory knowledge base and a deterministic act codec
//! - Feasible-action catalog and a uniform reference policy

pub mod codec;
pub mod domain;
pub mod dst;
pub mod environment;
pub mod error;
pub mod kb;
pub mod policy;
pub mod processor;
pub mod user;

pub use codec::ActStringCodec;
pub use domain::DialogueDomain;
pub use dst::{
    DialogueStateTracker, HistoryEntry, RunningSlotRecord, Segment, StateLayout,
    STATE_LAYOUT_VERSION,
};
pub use environment::{
    DialogueEnv, EnvConfig, LanguageUnits, RewardComponents, RewardSchedule, StepInfo,
    StepResult, TerminationReason,
};
pub use error::{Result, SimError};
pub use kb::{InMemoryKnowledgeBase, TASK_AVAILABLE};
pub use policy::RandomPolicy;
pub use processor::ActionCatalog;
pub use user::{RuleBasedUser, UserInternalState, UserSimulator};
