//! Built-in character limits for well-known Gemini model ids.

use crate::limits::CharacterLimits;

const TRANSLATE_LIMIT: usize = 8192;

const TABLE: &[(&str, CharacterLimits)] = &[
    ("gemini-2.0-flash", CharacterLimits::split(786_432, TRANSLATE_LIMIT)),
    ("gemini-1.5-pro", CharacterLimits::split(1_500_000, TRANSLATE_LIMIT)),
    ("gemini-1.5-flash", CharacterLimits::split(750_000, TRANSLATE_LIMIT)),
    ("gemini-1.5-flash-8b", CharacterLimits::split(750_000, TRANSLATE_LIMIT)),
    (
        "gemini-2.0-flash-lite-preview-02-05",
        CharacterLimits::split(786_432, TRANSLATE_LIMIT),
    ),
    (
        "gemini-2.0-pro-exp-02-05",
        CharacterLimits::split(1_572_864, TRANSLATE_LIMIT),
    ),
    ("gemini-2.0-flash-exp", CharacterLimits::split(786_432, TRANSLATE_LIMIT)),
];

/// Model ids present in the built-in table, in table order.
pub const STATIC_MODEL_IDS: &[&str] = &[
    "gemini-2.0-flash",
    "gemini-1.5-pro",
    "gemini-1.5-flash",
    "gemini-1.5-flash-8b",
    "gemini-2.0-flash-lite-preview-02-05",
    "gemini-2.0-pro-exp-02-05",
    "gemini-2.0-flash-exp",
];

/// Looks up `model_id` in the built-in table. Exact match only.
pub fn static_limits(model_id: &str) -> Option<CharacterLimits> {
    TABLE
        .iter()
        .find(|(id, _)| *id == model_id)
        .map(|(_, limits)| *limits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ActionType;

    #[test]
    fn known_model_has_table_values() {
        let limits = static_limits("gemini-1.5-pro").unwrap();
        assert_eq!(limits.for_action(ActionType::Summarize), 1_500_000);
        assert_eq!(limits.for_action(ActionType::Translate), 8_192);
        assert_eq!(limits.for_action(ActionType::TextCustom), 1_500_000);
    }

    #[test]
    fn versioned_id_is_not_in_table() {
        assert!(static_limits("gemini-2.0-flash-001").is_none());
    }

    #[test]
    fn model_id_list_matches_table() {
        assert_eq!(STATIC_MODEL_IDS.len(), TABLE.len());
        for id in STATIC_MODEL_IDS {
            assert!(static_limits(id).is_some(), "{} missing", id);
        }
    }
}
