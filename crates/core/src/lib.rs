//! Core types for the goal-oriented dialogue simulator
//!
//! This crate provides the vocabulary shared by every other crate:
//! - Dialogue acts, speakers, intents and slot values
//! - Closed act and slot vocabularies
//! - User goals and goal sets
//! - Collaborator traits (knowledge base, NLU, NLG)
//! - Error types

pub mod act;
pub mod conversation;
pub mod error;
pub mod goal;
pub mod traits;
pub mod vocabulary;

pub use act::{DialogAct, Intent, SlotValue, Speaker, CHOICE_SEPARATOR, TASK_COMPLETE_SLOT};
pub use conversation::{DialogueStatus, SimulationMode};
pub use error::{Error, Result};
pub use goal::{Goal, GoalSet};
pub use vocabulary::{Vocabulary, VocabularyKind};

pub use traits::{
    Constraints, KbError, KbQueryResult, KnowledgeBase, LanguageError, NaturalLanguageGenerator,
    NaturalLanguageUnderstanding, ParsedAct, UnsupportedKnowledgeBase,
};
