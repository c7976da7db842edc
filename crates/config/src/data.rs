//! Data files the simulator depends on
//!
//! Vocabularies are plain text (one name per line, index = line order) or
//! a YAML/JSON `name: index` mapping. Goal sets, knowledge base records and
//! action catalogs are YAML or JSON lists. The format is chosen by file
//! extension.

use dialogue_sim_core::{DialogAct, Goal, GoalSet, Vocabulary, VocabularyKind};
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::ConfigError;

/// One knowledge base record: slot -> value
pub type KbRecord = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Text,
    Yaml,
    Json,
}

impl Format {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Format::Json,
            Some("yaml") | Some("yml") => Format::Yaml,
            _ => Format::Text,
        }
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path)
        .map_err(|e| ConfigError::FileNotFound(format!("{}: {}", path.display(), e)))
}

fn parse_structured<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T, ConfigError> {
    let parsed = match Format::of(path) {
        Format::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        // Text files holding structured data are read as YAML, a superset of JSON.
        Format::Yaml | Format::Text => serde_yaml::from_str(content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))
}

fn load_vocabulary(path: &Path, kind: VocabularyKind) -> Result<Vocabulary, ConfigError> {
    let content = read(path)?;

    let vocabulary = match Format::of(path) {
        Format::Text => {
            let names = content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'));
            Vocabulary::from_names(kind, names)?
        }
        Format::Yaml | Format::Json => {
            let mapping: HashMap<String, usize> = parse_structured(path, &content)?;
            Vocabulary::from_indices(kind, mapping)?
        }
    };

    if vocabulary.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: path.display().to_string(),
            message: format!("{} vocabulary is empty", kind),
        });
    }

    tracing::debug!(
        path = %path.display(),
        kind = %kind,
        size = vocabulary.len(),
        "Loaded vocabulary"
    );

    Ok(vocabulary)
}

/// Load the dialogue act (intent) vocabulary
pub fn load_act_vocabulary<P: AsRef<Path>>(path: P) -> Result<Vocabulary, ConfigError> {
    load_vocabulary(path.as_ref(), VocabularyKind::Act)
}

/// Load the slot vocabulary
pub fn load_slot_vocabulary<P: AsRef<Path>>(path: P) -> Result<Vocabulary, ConfigError> {
    load_vocabulary(path.as_ref(), VocabularyKind::Slot)
}

/// Load the goal set and check it against the slot vocabulary
pub fn load_goal_set<P: AsRef<Path>>(path: P, slots: &Vocabulary) -> Result<GoalSet, ConfigError> {
    let path = path.as_ref();
    let goals: Vec<Goal> = parse_structured(path, &read(path)?)?;
    let goal_set = GoalSet::new(goals)?;
    goal_set.validate(slots)?;

    tracing::debug!(path = %path.display(), goals = goal_set.len(), "Loaded goal set");

    Ok(goal_set)
}

/// Load knowledge base records
pub fn load_kb_records<P: AsRef<Path>>(path: P) -> Result<Vec<KbRecord>, ConfigError> {
    let path = path.as_ref();
    let records: Vec<KbRecord> = parse_structured(path, &read(path)?)?;

    tracing::debug!(path = %path.display(), records = records.len(), "Loaded knowledge base");

    Ok(records)
}

/// Load the feasible agent actions
///
/// Acts default to the agent speaker; each one must be a valid act.
pub fn load_action_catalog<P: AsRef<Path>>(path: P) -> Result<Vec<DialogAct>, ConfigError> {
    let path = path.as_ref();
    let acts: Vec<DialogAct> = parse_structured(path, &read(path)?)?;

    if acts.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: path.display().to_string(),
            message: "action catalog is empty".to_string(),
        });
    }
    for act in &acts {
        act.validate()?;
    }

    tracing::debug!(path = %path.display(), actions = acts.len(), "Loaded action catalog");

    Ok(acts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialogue_sim_core::{Intent, SlotValue};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_text_vocabulary_skips_comments() {
        let file = write_file(".txt", "# intents\ninform\n\nrequest\n  thanks  \n");
        let vocab = load_act_vocabulary(file.path()).unwrap();
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.index_of("thanks").unwrap(), 2);
        assert_eq!(vocab.kind(), VocabularyKind::Act);
    }

    #[test]
    fn test_mapping_vocabulary() {
        let file = write_file(".yaml", "area: 1\nprice: 0\n");
        let vocab = load_slot_vocabulary(file.path()).unwrap();
        assert_eq!(vocab.name_of(0), Some("price"));
        assert_eq!(vocab.name_of(1), Some("area"));

        let json = write_file(".json", r#"{"price": 0, "area": 1}"#);
        assert_eq!(load_slot_vocabulary(json.path()).unwrap().len(), 2);
    }

    #[test]
    fn test_empty_vocabulary_rejected() {
        let file = write_file(".txt", "# nothing here\n");
        assert!(matches!(
            load_slot_vocabulary(file.path()),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_act_vocabulary("/nonexistent/dia_acts.txt"),
            Err(ConfigError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_goal_set_validated_against_slots() {
        let slots = Vocabulary::slots(["price", "area"]).unwrap();
        let good = write_file(
            ".yaml",
            r#"
- inform_slots: {price: cheap}
  request_slots: [area]
"#,
        );
        let goals = load_goal_set(good.path(), &slots).unwrap();
        assert_eq!(goals.len(), 1);

        let bad = write_file(".yaml", "- request_slots: [food]\n");
        assert!(matches!(
            load_goal_set(bad.path(), &slots),
            Err(ConfigError::Data(_))
        ));

        let empty = write_file(".yaml", "[]\n");
        assert!(load_goal_set(empty.path(), &slots).is_err());
    }

    #[test]
    fn test_kb_records() {
        let file = write_file(
            ".json",
            r#"[{"price": "cheap", "area": "north"}, {"price": "expensive"}]"#,
        );
        let records = load_kb_records(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("area").map(String::as_str), Some("north"));
    }

    #[test]
    fn test_action_catalog() {
        let file = write_file(
            ".yaml",
            r#"
- intent: thanks
- intent: inform
  inform_slots: {price: PLACEHOLDER}
- intent: request
  request_slots: [area]
"#,
        );
        let acts = load_action_catalog(file.path()).unwrap();
        assert_eq!(acts.len(), 3);
        assert_eq!(acts[0].intent, Intent::Thanks);
        assert_eq!(acts[1].inform_slots.get("price"), Some(&SlotValue::Placeholder));
    }

    #[test]
    fn test_invalid_catalog_act_rejected() {
        let file = write_file(
            ".yaml",
            r#"
- intent: request
  inform_slots: {area: north}
  request_slots: [area]
"#,
        );
        assert!(matches!(
            load_action_catalog(file.path()),
            Err(ConfigError::Data(_))
        ));
    }
}
