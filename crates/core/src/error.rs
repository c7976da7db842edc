//! Core error types

use thiserror::Error;

use crate::traits::{KbError, LanguageError};
use crate::vocabulary::VocabularyKind;

/// Errors raised by core dialogue types and collaborators
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A name outside a closed vocabulary was looked up.
    ///
    /// Vocabularies never grow at runtime, so this always points at a
    /// mismatch between the data files and the acts being produced.
    #[error("Unknown {kind} '{name}'")]
    UnknownName { kind: VocabularyKind, name: String },

    #[error("Duplicate {kind} '{name}'")]
    DuplicateName { kind: VocabularyKind, name: String },

    #[error("Invalid {kind} index {index} for '{name}' (vocabulary size {size})")]
    InvalidIndex {
        kind: VocabularyKind,
        name: String,
        index: usize,
        size: usize,
    },

    #[error("Invalid dialogue act: {0}")]
    InvalidAct(String),

    #[error("Invalid goal: {0}")]
    InvalidGoal(String),

    #[error("Knowledge base error: {0}")]
    KnowledgeBase(#[from] KbError),

    #[error("Language unit error: {0}")]
    Language(#[from] LanguageError),
}

pub type Result<T> = std::result::Result<T, Error>;
