//! Closed vocabularies of intents and slots
//!
//! A vocabulary is a bijection between names and dense indices
//! `0..len()`. It is built once, shared behind an `Arc`, and never
//! mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::act::Intent;
use crate::error::{Error, Result};

/// What a vocabulary names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VocabularyKind {
    Act,
    Slot,
}

impl fmt::Display for VocabularyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VocabularyKind::Act => f.write_str("intent"),
            VocabularyKind::Slot => f.write_str("slot"),
        }
    }
}

/// Name to index mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    kind: VocabularyKind,
    names: Vec<String>,
    indices: HashMap<String, usize>,
}

impl Vocabulary {
    /// Build from names in index order
    pub fn from_names<I, S>(kind: VocabularyKind, names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocab = Self {
            kind,
            names: Vec::new(),
            indices: HashMap::new(),
        };

        for name in names {
            let name = name.into();
            if vocab.indices.contains_key(&name) {
                return Err(Error::DuplicateName { kind, name });
            }
            vocab.indices.insert(name.clone(), vocab.names.len());
            vocab.names.push(name);
        }

        Ok(vocab)
    }

    /// Build from an explicit `name -> index` mapping
    ///
    /// Indices must cover `0..len` exactly once.
    pub fn from_indices(kind: VocabularyKind, mapping: HashMap<String, usize>) -> Result<Self> {
        let size = mapping.len();
        let mut slots: Vec<Option<String>> = vec![None; size];

        for (name, index) in mapping {
            match slots.get_mut(index) {
                Some(cell) if cell.is_none() => *cell = Some(name),
                _ => {
                    return Err(Error::InvalidIndex {
                        kind,
                        name,
                        index,
                        size,
                    })
                }
            }
        }

        // Every index is filled: `size` names landed in `size` distinct cells.
        Self::from_names(kind, slots.into_iter().flatten())
    }

    pub fn acts<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_names(VocabularyKind::Act, names)
    }

    pub fn slots<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_names(VocabularyKind::Slot, names)
    }

    pub fn kind(&self) -> VocabularyKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Index of a name, or a lookup error
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.indices
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownName {
                kind: self.kind,
                name: name.to_string(),
            })
    }

    /// Index of an intent in an act vocabulary
    pub fn intent_index(&self, intent: &Intent) -> Result<usize> {
        self.index_of(intent.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.indices.contains_key(name)
    }

    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}
