//! Deterministic act <-> text codec
//!
//! Renders an act as `intent(slot=value;slot)` and parses the same form
//! back. It stands in for real NLG/NLU units so natural-language mode can
//! run end to end. Slot names and values must not contain `;`, `=`, `(` or `)`.

use dialogue_sim_core::{
    DialogAct, Intent, LanguageError, NaturalLanguageGenerator, NaturalLanguageUnderstanding,
    ParsedAct, SlotValue, Speaker,
};

/// Characters that delimit the surface form
const RESERVED: &[char] = &[';', '=', '(', ')'];

#[derive(Debug, Clone, Copy, Default)]
pub struct ActStringCodec;

impl NaturalLanguageGenerator for ActStringCodec {
    fn render(&self, act: &DialogAct, _speaker: Speaker) -> Result<String, LanguageError> {
        for slot in act.slot_names() {
            if slot.contains(RESERVED) {
                return Err(LanguageError::Generation(format!(
                    "slot name '{}' cannot be rendered",
                    slot
                )));
            }
        }
        for (slot, value) in &act.inform_slots {
            if value.as_str().contains(RESERVED) {
                return Err(LanguageError::Generation(format!(
                    "value '{}' of slot '{}' cannot be rendered",
                    value, slot
                )));
            }
        }
        Ok(act.to_string())
    }
}

impl NaturalLanguageUnderstanding for ActStringCodec {
    fn parse(&self, text: &str) -> Result<ParsedAct, LanguageError> {
        let text = text.trim();
        let (intent, rest) = text
            .split_once('(')
            .ok_or_else(|| LanguageError::Understanding(format!("no '(' in '{}'", text)))?;
        let body = rest
            .strip_suffix(')')
            .ok_or_else(|| LanguageError::Understanding(format!("no closing ')' in '{}'", text)))?;

        let intent = intent.trim();
        if intent.is_empty() {
            return Err(LanguageError::Understanding(format!(
                "missing intent in '{}'",
                text
            )));
        }

        let mut parsed = ParsedAct {
            intent: Some(Intent::parse(intent)),
            ..ParsedAct::default()
        };

        for part in body.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            match part.split_once('=') {
                Some((slot, value)) => {
                    parsed
                        .inform_slots
                        .insert(slot.trim().to_string(), SlotValue::parse(value.trim()));
                }
                None => {
                    parsed.request_slots.insert(part.to_string());
                }
            }
        }

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_and_parse() {
        let codec = ActStringCodec;
        let act = DialogAct::user("request")
            .with_inform("price", "cheap")
            .with_inform("area", SlotValue::DontCare)
            .with_request("phone");

        let text = codec.render(&act, Speaker::User).unwrap();
        assert_eq!(text, "request(area=I do not care;price=cheap;phone)");

        let parsed = codec.parse(&text).unwrap();
        assert_eq!(parsed.intent, Some(Intent::Request));
        assert_eq!(parsed.inform_slots, act.inform_slots);
        assert_eq!(parsed.request_slots, act.request_slots);
    }

    #[test]
    fn test_render_rejects_reserved_characters() {
        let codec = ActStringCodec;
        let bad_value = DialogAct::user("inform").with_inform("area", "north;phone");
        assert!(matches!(
            codec.render(&bad_value, Speaker::User),
            Err(LanguageError::Generation(_))
        ));

        let bad_slot = DialogAct::user("request").with_request("a=b");
        assert!(codec.render(&bad_slot, Speaker::User).is_err());

        let spaced = DialogAct::user("inform").with_inform("time", "9:10 pm");
        assert_eq!(codec.render(&spaced, Speaker::User).unwrap(), "inform(time=9:10 pm)");
    }

    #[test]
    fn test_parse_empty_body() {
        let parsed = ActStringCodec.parse(" thanks() ").unwrap();
        assert_eq!(parsed.intent, Some(Intent::Thanks));
        assert!(parsed.inform_slots.is_empty());
        assert!(parsed.request_slots.is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed_text() {
        assert!(ActStringCodec.parse("hello there").is_err());
        assert!(ActStringCodec.parse("inform(price=cheap").is_err());
        assert!(ActStringCodec.parse("(price=cheap)").is_err());
    }
}
