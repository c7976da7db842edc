//! Dialogue acts
//!
//! A dialogue act is the structured form of a single utterance: an intent
//! plus the slots it informs and the slots it requests. Acts are plain
//! values; every component that keeps one around keeps its own copy.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{Error, Result};

/// Slot the agent informs to signal that it has completed the task
pub const TASK_COMPLETE_SLOT: &str = "taskcomplete";

/// Separator for the candidate values of a multiple-choice inform
pub const CHOICE_SEPARATOR: char = '|';

/// Who produced an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Agent,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::User => "user",
            Speaker::Agent => "agent",
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dialogue intent
///
/// The variants are the intents the rule-based user reasons about. Act
/// vocabularies may carry further intents; those round-trip through
/// `Other` and are still validated against the vocabulary when encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Intent {
    Request,
    Inform,
    ConfirmQuestion,
    ConfirmAnswer,
    MultipleChoice,
    Deny,
    Greeting,
    Thanks,
    Closing,
    Other(String),
}

impl Intent {
    pub fn as_str(&self) -> &str {
        match self {
            Intent::Request => "request",
            Intent::Inform => "inform",
            Intent::ConfirmQuestion => "confirm_question",
            Intent::ConfirmAnswer => "confirm_answer",
            Intent::MultipleChoice => "multiple_choice",
            Intent::Deny => "deny",
            Intent::Greeting => "greeting",
            Intent::Thanks => "thanks",
            Intent::Closing => "closing",
            Intent::Other(name) => name.as_str(),
        }
    }

    pub fn parse(name: &str) -> Self {
        match name {
            "request" => Intent::Request,
            "inform" => Intent::Inform,
            "confirm_question" => Intent::ConfirmQuestion,
            "confirm_answer" => Intent::ConfirmAnswer,
            "multiple_choice" => Intent::MultipleChoice,
            "deny" => Intent::Deny,
            "greeting" => Intent::Greeting,
            "thanks" => Intent::Thanks,
            "closing" => Intent::Closing,
            other => Intent::Other(other.to_string()),
        }
    }

    /// Whether this intent ends the dialogue from the user's point of view
    pub fn is_closing(&self) -> bool {
        matches!(self, Intent::Thanks | Intent::Closing)
    }
}

impl From<String> for Intent {
    fn from(name: String) -> Self {
        Intent::parse(&name)
    }
}

impl From<&str> for Intent {
    fn from(name: &str) -> Self {
        Intent::parse(name)
    }
}

impl From<Intent> for String {
    fn from(intent: Intent) -> Self {
        intent.as_str().to_string()
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value carried by an inform slot
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SlotValue {
    /// A concrete value
    Value(String),
    /// Requested but not yet known
    Unknown,
    /// To be filled from the knowledge base before the act is delivered
    Placeholder,
    /// The user accepts any value
    DontCare,
    /// The knowledge base has no record matching the constraints
    NoMatch,
}

impl SlotValue {
    pub const UNKNOWN: &'static str = "UNK";
    pub const PLACEHOLDER: &'static str = "PLACEHOLDER";
    pub const DONT_CARE: &'static str = "I do not care";
    pub const NO_MATCH: &'static str = "NO_VALUE_MATCH";

    pub fn value(value: impl Into<String>) -> Self {
        Self::parse(&value.into())
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            Self::UNKNOWN => SlotValue::Unknown,
            Self::PLACEHOLDER => SlotValue::Placeholder,
            Self::DONT_CARE => SlotValue::DontCare,
            Self::NO_MATCH => SlotValue::NoMatch,
            other => SlotValue::Value(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SlotValue::Value(v) => v.as_str(),
            SlotValue::Unknown => Self::UNKNOWN,
            SlotValue::Placeholder => Self::PLACEHOLDER,
            SlotValue::DontCare => Self::DONT_CARE,
            SlotValue::NoMatch => Self::NO_MATCH,
        }
    }

    /// Concrete value, if any
    pub fn as_value(&self) -> Option<&str> {
        match self {
            SlotValue::Value(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, SlotValue::Placeholder)
    }

    /// Candidate values of a multiple-choice inform
    pub fn candidates(&self) -> Vec<&str> {
        match self {
            SlotValue::Value(v) => v
                .split(CHOICE_SEPARATOR)
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Case-insensitive comparison against a goal value
    pub fn matches(&self, expected: &str) -> bool {
        self.as_value()
            .map(|v| v.eq_ignore_ascii_case(expected))
            .unwrap_or(false)
    }
}

impl From<String> for SlotValue {
    fn from(raw: String) -> Self {
        SlotValue::parse(&raw)
    }
}

impl From<&str> for SlotValue {
    fn from(raw: &str) -> Self {
        SlotValue::parse(raw)
    }
}

impl From<SlotValue> for String {
    fn from(value: SlotValue) -> Self {
        match value {
            SlotValue::Value(v) => v,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for SlotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single dialogue act
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogAct {
    pub intent: Intent,
    #[serde(default)]
    pub inform_slots: BTreeMap<String, SlotValue>,
    #[serde(default)]
    pub request_slots: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub natural_language: Option<String>,
    #[serde(default = "default_speaker")]
    pub speaker: Speaker,
    #[serde(default)]
    pub turn_number: u32,
}

// Catalog files list agent acts without a speaker.
fn default_speaker() -> Speaker {
    Speaker::Agent
}

impl DialogAct {
    pub fn new(intent: impl Into<Intent>, speaker: Speaker) -> Self {
        Self {
            intent: intent.into(),
            inform_slots: BTreeMap::new(),
            request_slots: BTreeSet::new(),
            natural_language: None,
            speaker,
            turn_number: 0,
        }
    }

    pub fn user(intent: impl Into<Intent>) -> Self {
        Self::new(intent, Speaker::User)
    }

    pub fn agent(intent: impl Into<Intent>) -> Self {
        Self::new(intent, Speaker::Agent)
    }

    /// Add an inform slot
    pub fn with_inform(mut self, slot: impl Into<String>, value: impl Into<SlotValue>) -> Self {
        self.inform_slots.insert(slot.into(), value.into());
        self
    }

    /// Add a request slot
    pub fn with_request(mut self, slot: impl Into<String>) -> Self {
        self.request_slots.insert(slot.into());
        self
    }

    pub fn with_turn(mut self, turn_number: u32) -> Self {
        self.turn_number = turn_number;
        self
    }

    /// Check the act invariants
    ///
    /// A slot may be informed or requested within one act, never both.
    pub fn validate(&self) -> Result<()> {
        if let Some(slot) = self
            .request_slots
            .iter()
            .find(|slot| self.inform_slots.contains_key(slot.as_str()))
        {
            return Err(Error::InvalidAct(format!(
                "slot '{}' is both informed and requested in '{}' act",
                slot, self.intent
            )));
        }
        Ok(())
    }

    /// Whether the agent has signalled task completion
    pub fn is_task_complete(&self) -> bool {
        self.inform_slots.contains_key(TASK_COMPLETE_SLOT)
    }

    /// Names of every slot the act mentions, informs first
    pub fn slot_names(&self) -> impl Iterator<Item = &str> {
        self.inform_slots
            .keys()
            .map(String::as_str)
            .chain(self.request_slots.iter().map(String::as_str))
    }
}

impl fmt::Display for DialogAct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.intent)?;
        let mut first = true;
        for (slot, value) in &self.inform_slots {
            if !first {
                f.write_str(";")?;
            }
            write!(f, "{}={}", slot, value)?;
            first = false;
        }
        for slot in &self.request_slots {
            if !first {
                f.write_str(";")?;
            }
            f.write_str(slot)?;
            first = false;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_wire_names() {
        assert_eq!(Intent::parse("confirm_answer"), Intent::ConfirmAnswer);
        assert_eq!(Intent::parse("book"), Intent::Other("book".to_string()));
        assert_eq!(Intent::MultipleChoice.as_str(), "multiple_choice");
        assert!(Intent::Closing.is_closing());
        assert!(!Intent::Request.is_closing());
    }

    #[test]
    fn test_slot_value_special_strings() {
        assert_eq!(SlotValue::parse("UNK"), SlotValue::Unknown);
        assert_eq!(SlotValue::parse("I do not care"), SlotValue::DontCare);
        assert_eq!(SlotValue::parse("cheap"), SlotValue::value("cheap"));
        assert_eq!(String::from(SlotValue::NoMatch), "NO_VALUE_MATCH");
    }

    #[test]
    fn test_multiple_choice_candidates() {
        let value = SlotValue::value("north | south|east");
        assert_eq!(value.candidates(), vec!["north", "south", "east"]);
        assert!(SlotValue::Placeholder.candidates().is_empty());
    }

    #[test]
    fn test_validate_rejects_overlap() {
        let act = DialogAct::user("request")
            .with_inform("price", "cheap")
            .with_request("price");
        assert!(matches!(act.validate(), Err(Error::InvalidAct(_))));

        let ok = DialogAct::user("request")
            .with_inform("price", "cheap")
            .with_request("area");
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_act_deserializes_with_defaults() {
        let yaml = r#"
intent: inform
inform_slots:
  area: PLACEHOLDER
"#;
        let act: DialogAct = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(act.intent, Intent::Inform);
        assert_eq!(act.speaker, Speaker::Agent);
        assert_eq!(act.inform_slots.get("area"), Some(&SlotValue::Placeholder));
        assert!(act.request_slots.is_empty());
    }

    #[test]
    fn test_display() {
        let act = DialogAct::agent("request")
            .with_inform("price", "cheap")
            .with_request("area");
        assert_eq!(act.to_string(), "request(price=cheap;area)");
    }
}
