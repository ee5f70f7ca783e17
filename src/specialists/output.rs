//! Typed access to specialist replies.
//!
//! A reply is kept as the JSON object it arrived as (it is stored verbatim
//! in `last_specialist_result`), with accessors that read it tolerantly:
//! absent or mistyped fields read as empty.

use serde_json::{Map, Value};

/// Reply action state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    Intro,
    Ask,
    Refine,
    Confirm,
    Escape,
}

impl StepAction {
    pub fn parse(raw: &str) -> Option<StepAction> {
        match raw {
            "INTRO" => Some(StepAction::Intro),
            "ASK" => Some(StepAction::Ask),
            "REFINE" => Some(StepAction::Refine),
            "CONFIRM" => Some(StepAction::Confirm),
            "ESCAPE" => Some(StepAction::Escape),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StepAction::Intro => "INTRO",
            StepAction::Ask => "ASK",
            StepAction::Refine => "REFINE",
            StepAction::Confirm => "CONFIRM",
            StepAction::Escape => "ESCAPE",
        }
    }
}

/// One dream-builder statement cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub theme: String,
    pub statement_indices: Vec<usize>,
}

/// A specialist reply, always a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecialistReply(Value);

impl SpecialistReply {
    /// Wraps a value; anything that is not an object becomes `{}`.
    pub fn from_value(value: Value) -> SpecialistReply {
        match value {
            value @ Value::Object(_) => SpecialistReply(value),
            _ => SpecialistReply(Value::Object(Map::new())),
        }
    }

    pub fn empty() -> SpecialistReply {
        SpecialistReply(Value::Object(Map::new()))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.as_object().is_none_or(Map::is_empty)
    }

    /// String field, reading absent or mistyped values as "".
    pub fn text(&self, key: &str) -> &str {
        self.0.get(key).and_then(Value::as_str).unwrap_or("")
    }

    /// String boolean field; true only on the exact string `"true"`.
    pub fn flag(&self, key: &str) -> bool {
        self.text(key).trim() == "true"
    }

    pub fn action(&self) -> Option<StepAction> {
        StepAction::parse(self.text("action"))
    }

    pub fn message(&self) -> &str {
        self.text("message")
    }

    pub fn question(&self) -> &str {
        self.text("question")
    }

    pub fn confirmation_question(&self) -> &str {
        self.text("confirmation_question")
    }

    pub fn refined_formulation(&self) -> &str {
        self.text("refined_formulation")
    }

    pub fn menu_id(&self) -> &str {
        self.text("menu_id")
    }

    pub fn statements(&self) -> Vec<String> {
        match self.0.get("statements") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn clusters(&self) -> Vec<Cluster> {
        let Some(Value::Array(items)) = self.0.get("clusters") else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| {
                let map = item.as_object()?;
                let theme = map.get("theme").and_then(Value::as_str)?.to_string();
                let statement_indices = match map.get("statement_indices") {
                    Some(Value::Array(nums)) => nums
                        .iter()
                        .filter_map(Value::as_u64)
                        .map(|n| n as usize)
                        .collect(),
                    _ => Vec::new(),
                };
                Some(Cluster {
                    theme,
                    statement_indices,
                })
            })
            .collect()
    }

    pub fn set(&mut self, key: &str, value: Value) {
        if let Value::Object(map) = &mut self.0 {
            map.insert(key.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tolerant_reads() {
        let reply = SpecialistReply::from_value(json!({
            "action": "CONFIRM",
            "message": "Here it is.",
            "proceed_to_next": "true",
            "question": 7,
        }));
        assert_eq!(reply.action(), Some(StepAction::Confirm));
        assert_eq!(reply.message(), "Here it is.");
        assert!(reply.flag("proceed_to_next"));
        assert_eq!(reply.question(), "");
        assert_eq!(reply.confirmation_question(), "");
    }

    #[test]
    fn non_object_becomes_empty() {
        let reply = SpecialistReply::from_value(json!("just text"));
        assert!(reply.is_empty());
        assert_eq!(reply.as_value(), &json!({}));
    }

    #[test]
    fn statements_and_clusters() {
        let reply = SpecialistReply::from_value(json!({
            "statements": ["a", 2, "b"],
            "clusters": [
                {"theme": "Impact", "statement_indices": [0, 2]},
                {"theme": 9},
            ],
        }));
        assert_eq!(reply.statements(), vec!["a", "b"]);
        let clusters = reply.clusters();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].theme, "Impact");
        assert_eq!(clusters[0].statement_indices, vec![0, 2]);
    }

    #[test]
    fn unknown_action_is_none() {
        let reply = SpecialistReply::from_value(json!({"action": "PONDER"}));
        assert_eq!(reply.action(), None);
    }

    #[test]
    fn set_overwrites_fields() {
        let mut reply = SpecialistReply::from_value(json!({"action": "ASK"}));
        reply.set("action", json!("CONFIRM"));
        reply.set("proceed_to_dream", json!("true"));
        assert_eq!(reply.action(), Some(StepAction::Confirm));
        assert!(reply.flag("proceed_to_dream"));
    }
}
