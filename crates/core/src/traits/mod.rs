//! Collaborator traits for the dialogue simulator
//!
//! ```text
//! Knowledge:
//!   - KnowledgeBase: constraint match counts and placeholder filling
//!
//! Surface forms:
//!   - NaturalLanguageGenerator: act -> text
//!   - NaturalLanguageUnderstanding: text -> act fields
//! ```

mod knowledge_base;
mod language;

pub use knowledge_base::{Constraints, KbError, KbQueryResult, KnowledgeBase, UnsupportedKnowledgeBase};
pub use language::{
    LanguageError, NaturalLanguageGenerator, NaturalLanguageUnderstanding, ParsedAct,
};
