//! Total normalization of incoming state blobs.
//!
//! The widget (and anything between it and us) can send any JSON at all.
//! `normalize` rebuilds a fully-populated [`CanvasState`] from whatever
//! arrives and is idempotent: normalizing an already-normalized blob is a
//! no-op.

use serde_json::Value;

use crate::state::model::{CanvasState, DreamRuntimeMode, StepId, CURRENT_STATE_VERSION};

/// String value of a JSON field; non-strings become "".
pub(crate) fn str_field(raw: &Value, key: &str) -> String {
    match raw.get(key) {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

/// Wire booleans are `"true"` only on the exact string `"true"`.
pub(crate) fn bool_field(raw: &Value, key: &str) -> String {
    if matches!(raw.get(key), Some(Value::String(s)) if s == "true") {
        "true".to_string()
    } else {
        "false".to_string()
    }
}

fn lang_field(raw: &Value, key: &str) -> String {
    str_field(raw, key).trim().to_lowercase()
}

/// Rebuilds a well-formed state from an arbitrary JSON value.
pub fn normalize(raw: &Value) -> CanvasState {
    let mut state = CanvasState::default();

    let version = str_field(raw, "state_version");
    state.state_version = if version.is_empty() {
        CURRENT_STATE_VERSION.to_string()
    } else {
        version
    };

    state.current_step =
        StepId::parse(&str_field(raw, "current_step")).unwrap_or(StepId::Step0);
    state.active_specialist = str_field(raw, "active_specialist");
    state.intro_shown_for_step = str_field(raw, "intro_shown_for_step");
    state.intro_shown_session = bool_field(raw, "intro_shown_session");

    state.language = lang_field(raw, "language");
    state.language_locked = bool_field(raw, "language_locked");
    state.language_override = bool_field(raw, "language_override");
    state.ui_strings_lang = lang_field(raw, "ui_strings_lang");
    if let Some(Value::Object(map)) = raw.get("ui_strings") {
        for (key, value) in map {
            if let Value::String(text) = value {
                state.ui_strings.insert(key.clone(), text.clone());
            }
        }
    }

    state.last_specialist_result = match raw.get("last_specialist_result") {
        Some(value @ Value::Object(_)) => value.clone(),
        _ => Value::Object(serde_json::Map::new()),
    };

    for step in StepId::ALL {
        state.set_final_for(step, str_field(raw, step.final_key()));
    }

    if let Some(Value::Object(map)) = raw.get("provisional_by_step") {
        for (key, value) in map {
            if let Value::String(text) = value {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    state
                        .provisional_by_step
                        .insert(key.clone(), trimmed.to_string());
                }
            }
        }
    }

    state.dream_runtime_mode =
        DreamRuntimeMode::parse(&str_field(raw, super::model::wire_keys::DREAM_RUNTIME_MODE));
    if let Some(Value::Array(items)) = raw.get("dream_builder_statements") {
        for item in items {
            if let Value::String(text) = item {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    state.dream_builder_statements.push(trimmed.to_string());
                }
            }
        }
    }

    let name = str_field(raw, "business_name").trim().to_string();
    state.business_name = if name.is_empty() { "TBD".to_string() } else { name };
    let target = str_field(raw, "summary_target").trim().to_string();
    state.summary_target = if target.is_empty() {
        "unknown".to_string()
    } else {
        target
    };

    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn total_over_garbage_inputs() {
        for raw in [json!(null), json!(42), json!("hello"), json!([1, 2, 3]), json!({})] {
            let state = normalize(&raw);
            assert_eq!(state.current_step, StepId::Step0);
            assert_eq!(state.business_name, "TBD");
            assert!(state.last_specialist_result.is_object());
        }
    }

    #[test]
    fn booleans_require_exact_true() {
        let state = normalize(&json!({
            "intro_shown_session": "TRUE",
            "language_locked": "yes",
            "language_override": "true",
        }));
        assert_eq!(state.intro_shown_session, "false");
        assert_eq!(state.language_locked, "false");
        assert_eq!(state.language_override, "true");
    }

    #[test]
    fn clamps_step_and_mode() {
        let state = normalize(&json!({
            "current_step": "somewhere",
            "__dream_runtime_mode": "turbo",
        }));
        assert_eq!(state.current_step, StepId::Step0);
        assert_eq!(state.dream_runtime_mode, DreamRuntimeMode::SelfAuthored);
    }

    #[test]
    fn language_fields_lowercased() {
        let state = normalize(&json!({"language": "  EN ", "ui_strings_lang": "NL"}));
        assert_eq!(state.language, "en");
        assert_eq!(state.ui_strings_lang, "nl");
    }

    #[test]
    fn provisional_drops_empty_and_non_string() {
        let state = normalize(&json!({
            "provisional_by_step": {
                "dream": "  a draft  ",
                "purpose": "   ",
                "role": 7,
            }
        }));
        assert_eq!(state.provisional_by_step.len(), 1);
        assert_eq!(state.provisional_by_step["dream"], "a draft");
    }

    #[test]
    fn statements_trimmed_and_filtered() {
        let state = normalize(&json!({
            "dream_builder_statements": [" freedom ", "", 3, "impact"]
        }));
        assert_eq!(state.dream_builder_statements, vec!["freedom", "impact"]);
    }

    #[test]
    fn last_result_coerced_to_object() {
        let state = normalize(&json!({"last_specialist_result": "not an object"}));
        assert_eq!(state.last_specialist_result, json!({}));
        let kept = normalize(&json!({"last_specialist_result": {"action": "ASK"}}));
        assert_eq!(kept.last_specialist_result, json!({"action": "ASK"}));
    }

    #[test]
    fn idempotent() {
        let raw = json!({
            "state_version": "4",
            "current_step": "purpose",
            "language": " De ",
            "intro_shown_session": "true",
            "dream_final": "Dream text",
            "business_name": " Acme ",
            "provisional_by_step": {"purpose": " draft "},
            "dream_builder_statements": [" one "],
        });
        let once = normalize(&raw);
        let twice = normalize(&serde_json::to_value(&once).unwrap());
        assert_eq!(once, twice);
    }
}
