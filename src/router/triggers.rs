//! Trigger flags parsed out of the stored specialist reply.
//!
//! Replies are untrusted model output. The happy path is a JSON object with
//! string booleans; the fallback tolerates a raw string echo of the JSON
//! (both `"flag":"true"` and `"flag": "true"` spellings are recognized).

use serde_json::Value;

/// Real booleans for the router. Parsed once per turn so routing never
/// touches raw JSON.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriggerFlags {
    pub proceed_to_dream: bool,
    pub proceed_to_purpose: bool,
    pub proceed_to_next: bool,
    pub suggest_dreambuilder: bool,
    pub action: String,
}

fn object_flag(map: &serde_json::Map<String, Value>, key: &str) -> bool {
    match map.get(key) {
        Some(Value::String(s)) => s.trim() == "true",
        Some(Value::Bool(b)) => *b,
        _ => false,
    }
}

fn string_flag(raw: &str, name: &str) -> bool {
    raw.contains(&format!("\"{name}\":\"true\""))
        || raw.contains(&format!("\"{name}\": \"true\""))
}

/// Reads the trigger flags from the previous specialist reply.
pub fn read_triggers(last: &Value) -> TriggerFlags {
    match last {
        Value::Object(map) => TriggerFlags {
            proceed_to_dream: object_flag(map, "proceed_to_dream"),
            proceed_to_purpose: object_flag(map, "proceed_to_purpose"),
            proceed_to_next: object_flag(map, "proceed_to_next"),
            suggest_dreambuilder: object_flag(map, "suggest_dreambuilder"),
            action: map
                .get("action")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        },
        Value::String(raw) => TriggerFlags {
            proceed_to_dream: string_flag(raw, "proceed_to_dream"),
            proceed_to_purpose: string_flag(raw, "proceed_to_purpose"),
            proceed_to_next: string_flag(raw, "proceed_to_next"),
            suggest_dreambuilder: string_flag(raw, "suggest_dreambuilder"),
            action: if raw.contains("\"action\":\"CONFIRM\"")
                || raw.contains("\"action\": \"CONFIRM\"")
            {
                "CONFIRM".to_string()
            } else {
                String::new()
            },
        },
        _ => TriggerFlags::default(),
    }
}
