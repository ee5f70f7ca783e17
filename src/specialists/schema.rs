//! Closed reply schemas, declared once per specialist.
//!
//! One field list drives everything: the strict JSON-schema text embedded in
//! the model instructions and the validator applied to the reply. Keeping
//! the two derived from the same table means they cannot drift apart.
//!
//! Wire conventions: booleans that routing reads are the strings `"true"` /
//! `"false"`; `wants_recap` and `is_offtopic` are real JSON booleans.

use serde_json::{json, Map, Value};

use crate::error::SchemaViolation;
use crate::specialists::Specialist;
use crate::state::StepId;

/// Allowed value shape of one reply field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Text,
    /// String boolean, exactly "true" or "false".
    BoolString,
    /// Real JSON boolean.
    Bool,
    Enum(&'static [&'static str]),
    TextArray,
    /// Dream-builder clusters: `{theme, statement_indices}` objects.
    ClusterArray,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Optional fields are filled with their empty default when missing.
    pub required: bool,
}

const fn req(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required: true,
    }
}

const fn opt(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required: false,
    }
}

/// A specialist's closed reply contract.
#[derive(Debug, Clone, Copy)]
pub struct ReplySchema {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

const ACTIONS_FULL: &[&str] = &["INTRO", "ASK", "REFINE", "CONFIRM", "ESCAPE"];
/// Steps whose confirm is synthesized by the engine, never emitted by the
/// model.
const ACTIONS_NO_CONFIRM: &[&str] = &["INTRO", "ASK", "REFINE", "ESCAPE"];

const VALIDATION_FIELDS: &[FieldSpec] = &[
    req("action", FieldKind::Enum(ACTIONS_FULL)),
    req("message", FieldKind::Text),
    req("question", FieldKind::Text),
    req("refined_formulation", FieldKind::Text),
    req("confirmation_question", FieldKind::Text),
    req("business_name", FieldKind::Text),
    req("proceed_to_dream", FieldKind::BoolString),
    req("step_0", FieldKind::Text),
    opt("menu_id", FieldKind::Text),
    req("wants_recap", FieldKind::Bool),
];

const DREAM_FIELDS: &[FieldSpec] = &[
    req("action", FieldKind::Enum(ACTIONS_FULL)),
    req("message", FieldKind::Text),
    req("question", FieldKind::Text),
    req("refined_formulation", FieldKind::Text),
    req("confirmation_question", FieldKind::Text),
    req("dream", FieldKind::Text),
    opt("menu_id", FieldKind::Text),
    req("suggest_dreambuilder", FieldKind::BoolString),
    req("proceed_to_dream", FieldKind::BoolString),
    req("proceed_to_purpose", FieldKind::BoolString),
    req("wants_recap", FieldKind::Bool),
    req("is_offtopic", FieldKind::Bool),
];

const DREAM_EXPLAINER_FIELDS: &[FieldSpec] = &[
    req("action", FieldKind::Enum(ACTIONS_FULL)),
    req("message", FieldKind::Text),
    req("question", FieldKind::Text),
    req("refined_formulation", FieldKind::Text),
    opt("confirmation_question", FieldKind::Text),
    req("dream", FieldKind::Text),
    opt("menu_id", FieldKind::Text),
    req("suggest_dreambuilder", FieldKind::BoolString),
    req("scoring_phase", FieldKind::BoolString),
    opt("proceed_to_purpose", FieldKind::BoolString),
    req("statements", FieldKind::TextArray),
    req("clusters", FieldKind::ClusterArray),
    req("user_state", FieldKind::Text),
    req("wants_recap", FieldKind::Bool),
    req("is_offtopic", FieldKind::Bool),
];

const PURPOSE_FIELDS: &[FieldSpec] = &[
    req("action", FieldKind::Enum(ACTIONS_NO_CONFIRM)),
    req("message", FieldKind::Text),
    req("question", FieldKind::Text),
    req("refined_formulation", FieldKind::Text),
    req("purpose", FieldKind::Text),
    opt("menu_id", FieldKind::Text),
    req("wants_recap", FieldKind::Bool),
    req("is_offtopic", FieldKind::Bool),
];

const BIGWHY_FIELDS: &[FieldSpec] = &[
    req("action", FieldKind::Enum(ACTIONS_NO_CONFIRM)),
    req("message", FieldKind::Text),
    req("question", FieldKind::Text),
    req("refined_formulation", FieldKind::Text),
    req("bigwhy", FieldKind::Text),
    opt("menu_id", FieldKind::Text),
    req("wants_recap", FieldKind::Bool),
    req("is_offtopic", FieldKind::Bool),
];

const ROLE_FIELDS: &[FieldSpec] = &[
    req("action", FieldKind::Enum(ACTIONS_FULL)),
    req("message", FieldKind::Text),
    req("question", FieldKind::Text),
    req("refined_formulation", FieldKind::Text),
    req("confirmation_question", FieldKind::Text),
    req("role", FieldKind::Text),
    opt("menu_id", FieldKind::Text),
    req("proceed_to_next", FieldKind::BoolString),
    req("wants_recap", FieldKind::Bool),
    req("is_offtopic", FieldKind::Bool),
];

const ENTITY_FIELDS: &[FieldSpec] = &[
    req("action", FieldKind::Enum(ACTIONS_FULL)),
    req("message", FieldKind::Text),
    req("question", FieldKind::Text),
    req("refined_formulation", FieldKind::Text),
    req("confirmation_question", FieldKind::Text),
    req("entity", FieldKind::Text),
    opt("menu_id", FieldKind::Text),
    req("proceed_to_next", FieldKind::BoolString),
    req("wants_recap", FieldKind::Bool),
    req("is_offtopic", FieldKind::Bool),
];

const STRATEGY_FIELDS: &[FieldSpec] = &[
    req("action", FieldKind::Enum(ACTIONS_FULL)),
    req("message", FieldKind::Text),
    req("question", FieldKind::Text),
    req("refined_formulation", FieldKind::Text),
    req("confirmation_question", FieldKind::Text),
    req("strategy", FieldKind::Text),
    opt("menu_id", FieldKind::Text),
    req("proceed_to_next", FieldKind::BoolString),
    req("wants_recap", FieldKind::Bool),
    req("statements", FieldKind::TextArray),
];

const TARGETGROUP_FIELDS: &[FieldSpec] = &[
    req("action", FieldKind::Enum(ACTIONS_NO_CONFIRM)),
    req("message", FieldKind::Text),
    req("question", FieldKind::Text),
    req("refined_formulation", FieldKind::Text),
    req("targetgroup", FieldKind::Text),
    opt("menu_id", FieldKind::Text),
    req("wants_recap", FieldKind::Bool),
    req("is_offtopic", FieldKind::Bool),
];

const PRODUCTSSERVICES_FIELDS: &[FieldSpec] = &[
    req("action", FieldKind::Enum(ACTIONS_FULL)),
    req("message", FieldKind::Text),
    req("question", FieldKind::Text),
    req("refined_formulation", FieldKind::Text),
    req("confirmation_question", FieldKind::Text),
    req("productsservices", FieldKind::Text),
    opt("menu_id", FieldKind::Text),
    req("proceed_to_next", FieldKind::BoolString),
    req("wants_recap", FieldKind::Bool),
];

const RULESOFTHEGAME_FIELDS: &[FieldSpec] = &[
    req("action", FieldKind::Enum(ACTIONS_NO_CONFIRM)),
    req("message", FieldKind::Text),
    req("question", FieldKind::Text),
    req("refined_formulation", FieldKind::Text),
    req("rulesofthegame", FieldKind::Text),
    opt("menu_id", FieldKind::Text),
    req("wants_recap", FieldKind::Bool),
    req("is_offtopic", FieldKind::Bool),
    req("statements", FieldKind::TextArray),
];

const PRESENTATION_FIELDS: &[FieldSpec] = &[
    req("action", FieldKind::Enum(ACTIONS_FULL)),
    req("message", FieldKind::Text),
    req("question", FieldKind::Text),
    req("refined_formulation", FieldKind::Text),
    req("confirmation_question", FieldKind::Text),
    req("presentation_brief", FieldKind::Text),
    opt("menu_id", FieldKind::Text),
    req("proceed_to_next", FieldKind::BoolString),
    req("wants_recap", FieldKind::Bool),
];

/// The closed reply contract for a specialist.
pub fn schema_for(specialist: Specialist) -> ReplySchema {
    let (name, fields) = match specialist {
        Specialist::ValidationAndBusinessName => {
            ("ValidationAndBusinessName", VALIDATION_FIELDS)
        }
        Specialist::Dream => ("Dream", DREAM_FIELDS),
        Specialist::DreamExplainer => ("DreamExplainer", DREAM_EXPLAINER_FIELDS),
        Specialist::Purpose => ("Purpose", PURPOSE_FIELDS),
        Specialist::BigWhy => ("BigWhy", BIGWHY_FIELDS),
        Specialist::Role => ("Role", ROLE_FIELDS),
        Specialist::Entity => ("Entity", ENTITY_FIELDS),
        Specialist::Strategy => ("Strategy", STRATEGY_FIELDS),
        Specialist::TargetGroup => ("TargetGroup", TARGETGROUP_FIELDS),
        Specialist::ProductsServices => ("ProductsServices", PRODUCTSSERVICES_FIELDS),
        Specialist::RulesOfTheGame => ("RulesOfTheGame", RULESOFTHEGAME_FIELDS),
        Specialist::Presentation => ("Presentation", PRESENTATION_FIELDS),
    };
    ReplySchema { name, fields }
}

/// Reply field that stores a step's working value.
pub fn value_field(step: StepId) -> &'static str {
    match step {
        StepId::Step0 => "step_0",
        StepId::Dream => "dream",
        StepId::Purpose => "purpose",
        StepId::BigWhy => "bigwhy",
        StepId::Role => "role",
        StepId::Entity => "entity",
        StepId::Strategy => "strategy",
        StepId::TargetGroup => "targetgroup",
        StepId::ProductsServices => "productsservices",
        StepId::RulesOfTheGame => "rulesofthegame",
        StepId::Presentation => "presentation_brief",
    }
}

impl ReplySchema {
    /// Strict JSON schema document for the provider. Every field is listed
    /// as required so the model always emits the full object.
    pub fn json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for field in self.fields {
            required.push(Value::String(field.name.to_string()));
            let prop = match field.kind {
                FieldKind::Text => json!({"type": "string"}),
                FieldKind::BoolString => json!({"type": "string", "enum": ["true", "false"]}),
                FieldKind::Bool => json!({"type": "boolean"}),
                FieldKind::Enum(values) => json!({"type": "string", "enum": values}),
                FieldKind::TextArray => json!({"type": "array", "items": {"type": "string"}}),
                FieldKind::ClusterArray => json!({
                    "type": "array",
                    "items": {
                        "type": "object",
                        "additionalProperties": false,
                        "required": ["theme", "statement_indices"],
                        "properties": {
                            "theme": {"type": "string"},
                            "statement_indices": {"type": "array", "items": {"type": "integer"}},
                        },
                    },
                }),
            };
            properties.insert(field.name.to_string(), prop);
        }
        json!({
            "type": "object",
            "additionalProperties": false,
            "required": required,
            "properties": properties,
        })
    }

    /// Validates a parsed reply. Missing optional fields are filled with
    /// their empty defaults; the normalized object is returned.
    pub fn validate(&self, reply: &Value) -> std::result::Result<Value, SchemaViolation> {
        let map = match reply {
            Value::Object(map) => map,
            _ => return Err(SchemaViolation::NotAnObject),
        };

        for key in map.keys() {
            if !self.fields.iter().any(|f| f.name == key) {
                return Err(SchemaViolation::UnknownField { field: key.clone() });
            }
        }

        let mut normalized = Map::new();
        for field in self.fields {
            let value = match map.get(field.name) {
                Some(value) => value.clone(),
                None if field.required => {
                    return Err(SchemaViolation::MissingField {
                        field: field.name.to_string(),
                    });
                }
                None => default_for(field.kind),
            };
            check_kind(field.name, field.kind, &value)?;
            normalized.insert(field.name.to_string(), value);
        }
        Ok(Value::Object(normalized))
    }
}

fn default_for(kind: FieldKind) -> Value {
    match kind {
        FieldKind::Text | FieldKind::Enum(_) => Value::String(String::new()),
        FieldKind::BoolString => Value::String("false".to_string()),
        FieldKind::Bool => Value::Bool(false),
        FieldKind::TextArray | FieldKind::ClusterArray => Value::Array(Vec::new()),
    }
}

fn check_kind(
    name: &str,
    kind: FieldKind,
    value: &Value,
) -> std::result::Result<(), SchemaViolation> {
    let wrong = |expected: &str| SchemaViolation::WrongType {
        field: name.to_string(),
        expected: expected.to_string(),
    };
    match kind {
        FieldKind::Text => {
            if !value.is_string() {
                return Err(wrong("string"));
            }
        }
        FieldKind::BoolString => match value.as_str() {
            Some("true") | Some("false") => {}
            Some(other) => {
                return Err(SchemaViolation::InvalidBool {
                    field: name.to_string(),
                    value: other.to_string(),
                });
            }
            None => return Err(wrong("string")),
        },
        FieldKind::Bool => {
            if !value.is_boolean() {
                return Err(wrong("boolean"));
            }
        }
        FieldKind::Enum(allowed) => match value.as_str() {
            Some(text) if allowed.contains(&text) => {}
            Some(text) => {
                return Err(SchemaViolation::InvalidEnum {
                    field: name.to_string(),
                    value: text.to_string(),
                });
            }
            None => return Err(wrong("string")),
        },
        FieldKind::TextArray => match value.as_array() {
            Some(items) if items.iter().all(Value::is_string) => {}
            _ => return Err(wrong("array of strings")),
        },
        FieldKind::ClusterArray => match value.as_array() {
            Some(items) if items.iter().all(is_cluster) => {}
            _ => return Err(wrong("array of clusters")),
        },
    }
    Ok(())
}

fn is_cluster(value: &Value) -> bool {
    let Some(map) = value.as_object() else {
        return false;
    };
    let theme_ok = map.get("theme").is_some_and(Value::is_string);
    let indices_ok = map
        .get("statement_indices")
        .and_then(Value::as_array)
        .is_some_and(|items| items.iter().all(Value::is_number));
    theme_ok && indices_ok && map.len() <= 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal_dream_reply() -> Value {
        json!({
            "action": "ASK",
            "message": "Let's talk about your dream.",
            "question": "What future do you see?",
            "refined_formulation": "",
            "confirmation_question": "",
            "dream": "",
            "menu_id": "DREAM_MENU_INTRO",
            "suggest_dreambuilder": "false",
            "proceed_to_dream": "false",
            "proceed_to_purpose": "false",
            "wants_recap": false,
            "is_offtopic": false,
        })
    }

    #[test]
    fn valid_reply_passes_and_normalizes() {
        let schema = schema_for(Specialist::Dream);
        let out = schema.validate(&minimal_dream_reply()).unwrap();
        assert_eq!(out["action"], "ASK");
        assert_eq!(out["menu_id"], "DREAM_MENU_INTRO");
    }

    #[test]
    fn missing_optional_menu_id_defaults_to_empty() {
        let schema = schema_for(Specialist::Dream);
        let mut reply = minimal_dream_reply();
        reply.as_object_mut().unwrap().remove("menu_id");
        let out = schema.validate(&reply).unwrap();
        assert_eq!(out["menu_id"], "");
    }

    #[test]
    fn unknown_field_is_rejected() {
        let schema = schema_for(Specialist::Dream);
        let mut reply = minimal_dream_reply();
        reply
            .as_object_mut()
            .unwrap()
            .insert("bonus".to_string(), json!("x"));
        assert!(matches!(
            schema.validate(&reply),
            Err(SchemaViolation::UnknownField { .. })
        ));
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let schema = schema_for(Specialist::Dream);
        let mut reply = minimal_dream_reply();
        reply.as_object_mut().unwrap().remove("message");
        assert!(matches!(
            schema.validate(&reply),
            Err(SchemaViolation::MissingField { .. })
        ));
    }

    #[test]
    fn bool_strings_must_be_exact() {
        let schema = schema_for(Specialist::Dream);
        let mut reply = minimal_dream_reply();
        reply
            .as_object_mut()
            .unwrap()
            .insert("proceed_to_purpose".to_string(), json!("yes"));
        assert!(matches!(
            schema.validate(&reply),
            Err(SchemaViolation::InvalidBool { .. })
        ));
    }

    #[test]
    fn action_outside_enum_is_rejected() {
        // Purpose has no model-emitted CONFIRM; that reply must fail.
        let schema = schema_for(Specialist::Purpose);
        let reply = json!({
            "action": "CONFIRM",
            "message": "",
            "question": "",
            "refined_formulation": "",
            "purpose": "",
            "menu_id": "",
            "wants_recap": false,
            "is_offtopic": false,
        });
        assert!(matches!(
            schema.validate(&reply),
            Err(SchemaViolation::InvalidEnum { .. })
        ));
    }

    #[test]
    fn clusters_validate_shape() {
        let schema = schema_for(Specialist::DreamExplainer);
        let reply = json!({
            "action": "ASK",
            "message": "",
            "question": "Score these statements.",
            "refined_formulation": "",
            "confirmation_question": "",
            "dream": "",
            "menu_id": "",
            "suggest_dreambuilder": "true",
            "scoring_phase": "true",
            "proceed_to_purpose": "false",
            "statements": ["a", "b"],
            "clusters": [{"theme": "Impact", "statement_indices": [0, 1]}],
            "user_state": "ok",
            "wants_recap": false,
            "is_offtopic": false,
        });
        assert!(schema.validate(&reply).is_ok());

        let mut bad = reply.clone();
        bad.as_object_mut().unwrap()["clusters"] = json!([{"theme": 3}]);
        assert!(schema.validate(&bad).is_err());
    }

    #[test]
    fn json_schema_lists_every_field_as_required() {
        for specialist in [
            Specialist::ValidationAndBusinessName,
            Specialist::Dream,
            Specialist::DreamExplainer,
            Specialist::Purpose,
            Specialist::BigWhy,
            Specialist::Role,
            Specialist::Entity,
            Specialist::Strategy,
            Specialist::TargetGroup,
            Specialist::ProductsServices,
            Specialist::RulesOfTheGame,
            Specialist::Presentation,
        ] {
            let schema = schema_for(specialist);
            let doc = schema.json_schema();
            assert_eq!(doc["additionalProperties"], false, "{specialist}");
            let required = doc["required"].as_array().unwrap();
            assert_eq!(required.len(), schema.fields.len(), "{specialist}");
            for field in schema.fields {
                assert!(
                    doc["properties"].get(field.name).is_some(),
                    "{specialist} missing {}",
                    field.name
                );
            }
        }
    }

    #[test]
    fn value_fields_cover_every_step() {
        for step in StepId::ALL {
            assert!(!value_field(step).is_empty());
        }
        assert_eq!(value_field(StepId::Presentation), "presentation_brief");
    }
}
