//! Typed intents parsed from wire tokens.
//!
//! Action codes and route tokens stay strings at the transport edge; the
//! moment a turn is interpreted they become one of these enums. Serialized
//! forms keep the upstream wire shape (`type` discriminator, camelCase
//! fields) so existing widget logs stay comparable.

use serde::{Deserialize, Serialize};

use crate::state::StepId;
use crate::ui::actions::{
    route_for, ACTION_SUBMIT_SCORES, ACTION_TEXT_SUBMIT, ACTION_WORDING_PICK_SUGGESTION,
    ACTION_WORDING_PICK_USER,
};

/// Where a submitted text belongs in the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitContext {
    FreeText,
    BuilderStatement,
    RefineInput,
}

/// Which wording the user picked on a wording-choice screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordingChoice {
    User,
    Suggestion,
}

/// What the user asked this turn, independent of how the widget phrased it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StepIntent {
    #[serde(rename = "SUBMIT_TEXT")]
    SubmitText {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        context: Option<SubmitContext>,
    },
    #[serde(rename = "REQUEST_EXPLANATION")]
    RequestExplanation { topic: String },
    #[serde(rename = "START_EXERCISE", rename_all = "camelCase")]
    StartExercise { exercise_type: String },
    #[serde(rename = "SUBMIT_SCORES")]
    SubmitScores { scores: Vec<Vec<u8>> },
    #[serde(rename = "WORDING_PICK")]
    WordingPick { choice: WordingChoice },
    #[serde(rename = "ROUTE")]
    Route { route: String },
    #[serde(rename = "NAVIGATE_STEP")]
    NavigateStep { step: StepId },
    #[serde(rename = "CONTINUE")]
    Continue,
    #[serde(rename = "FINISH_LATER")]
    FinishLater,
}

/// Why a restarted step restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestartReason {
    UserRequest,
    ValidationFailed,
}

/// What the turn did to the walk, emitted for logging and the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TransitionEvent {
    #[serde(rename = "STEP_COMPLETED", rename_all = "camelCase")]
    StepCompleted {
        step: StepId,
        #[serde(skip_serializing_if = "Option::is_none")]
        final_value: Option<String>,
    },
    #[serde(rename = "PROCEED_TO_NEXT", rename_all = "camelCase")]
    ProceedToNext { from_step: StepId },
    #[serde(rename = "PROCEED_TO_SPECIFIC", rename_all = "camelCase")]
    ProceedToSpecific { from_step: StepId, to_step: StepId },
    #[serde(rename = "RESTART_STEP")]
    RestartStep { step: StepId, reason: RestartReason },
    #[serde(rename = "SPECIALIST_SWITCH", rename_all = "camelCase")]
    SpecialistSwitch {
        from_specialist: String,
        to_specialist: String,
        same_step: bool,
    },
    #[serde(rename = "NO_TRANSITION")]
    NoTransition { step: StepId },
}

/// Derives the intent behind an action code via the registry.
pub fn intent_for(code: &str) -> StepIntent {
    let code = code.trim();
    match code {
        ACTION_TEXT_SUBMIT => StepIntent::SubmitText {
            text: String::new(),
            context: Some(SubmitContext::FreeText),
        },
        ACTION_WORDING_PICK_USER => StepIntent::WordingPick {
            choice: WordingChoice::User,
        },
        ACTION_WORDING_PICK_SUGGESTION => StepIntent::WordingPick {
            choice: WordingChoice::Suggestion,
        },
        ACTION_SUBMIT_SCORES => StepIntent::SubmitScores { scores: Vec::new() },
        _ => match route_for(code) {
            Some(route) => route_intent(route),
            None if code.starts_with("ACTION_") => StepIntent::Route {
                route: code.to_string(),
            },
            None => route_intent(""),
        },
    }
}

/// Classifies a raw route token. Escape-family suffixes win over the
/// generic route case.
pub fn route_intent(route: &str) -> StepIntent {
    let route = route.trim();
    if route.is_empty() {
        return StepIntent::SubmitText {
            text: String::new(),
            context: Some(SubmitContext::FreeText),
        };
    }
    if route.contains("FINISH_LATER") {
        return StepIntent::FinishLater;
    }
    if route.contains("CONTINUE") {
        return StepIntent::Continue;
    }
    if route.contains("START_EXERCISE") {
        return StepIntent::StartExercise {
            exercise_type: "dream_builder".to_string(),
        };
    }
    StepIntent::Route {
        route: route.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn intents_serialize_with_wire_tags() {
        let intent = StepIntent::SubmitText {
            text: "hello".to_string(),
            context: Some(SubmitContext::FreeText),
        };
        assert_eq!(
            serde_json::to_value(&intent).unwrap(),
            json!({"type": "SUBMIT_TEXT", "text": "hello", "context": "free_text"})
        );

        let intent = StepIntent::StartExercise {
            exercise_type: "dream_builder".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&intent).unwrap(),
            json!({"type": "START_EXERCISE", "exerciseType": "dream_builder"})
        );

        assert_eq!(
            serde_json::to_value(StepIntent::FinishLater).unwrap(),
            json!({"type": "FINISH_LATER"})
        );
    }

    #[test]
    fn transition_events_keep_camel_case_fields() {
        let event = TransitionEvent::ProceedToSpecific {
            from_step: StepId::Dream,
            to_step: StepId::Purpose,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": "PROCEED_TO_SPECIFIC", "fromStep": "dream", "toStep": "purpose"})
        );

        let event = TransitionEvent::SpecialistSwitch {
            from_specialist: "Dream".to_string(),
            to_specialist: "DreamExplainer".to_string(),
            same_step: true,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "type": "SPECIALIST_SWITCH",
                "fromSpecialist": "Dream",
                "toSpecialist": "DreamExplainer",
                "sameStep": true
            })
        );

        let event = TransitionEvent::RestartStep {
            step: StepId::Role,
            reason: RestartReason::UserRequest,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": "RESTART_STEP", "step": "role", "reason": "user_request"})
        );
    }

    #[test]
    fn text_submit_code_maps_to_free_text_submit() {
        assert_eq!(
            intent_for("ACTION_TEXT_SUBMIT"),
            StepIntent::SubmitText {
                text: String::new(),
                context: Some(SubmitContext::FreeText),
            }
        );
    }

    #[test]
    fn escape_codes_map_to_continue_and_finish_later() {
        assert_eq!(
            intent_for("ACTION_DREAM_ESCAPE_FINISH_LATER"),
            StepIntent::FinishLater
        );
        assert_eq!(
            intent_for("ACTION_STRATEGY_ESCAPE_CONTINUE"),
            StepIntent::Continue
        );
    }

    #[test]
    fn exercise_codes_start_the_dream_builder() {
        assert_eq!(
            intent_for("ACTION_DREAM_INTRO_START_EXERCISE"),
            StepIntent::StartExercise {
                exercise_type: "dream_builder".to_string(),
            }
        );
    }

    #[test]
    fn menu_codes_fall_through_to_their_route() {
        assert_eq!(
            intent_for("ACTION_PURPOSE_INTRO_EXPLAIN_MORE"),
            StepIntent::Route {
                route: "__ROUTE__PURPOSE_EXPLAIN_MORE__".to_string(),
            }
        );
        assert_eq!(
            intent_for("ACTION_DREAM_REFINE_CONFIRM"),
            StepIntent::Route {
                route: "yes".to_string(),
            }
        );
    }

    #[test]
    fn unknown_codes_stay_route_intents_for_diagnostics() {
        assert_eq!(
            intent_for("ACTION_NOT_A_REAL_CODE"),
            StepIntent::Route {
                route: "ACTION_NOT_A_REAL_CODE".to_string(),
            }
        );
    }

    #[test]
    fn wording_and_score_codes_have_dedicated_intents() {
        assert_eq!(
            intent_for("ACTION_WORDING_PICK_USER"),
            StepIntent::WordingPick {
                choice: WordingChoice::User,
            }
        );
        assert_eq!(
            intent_for("ACTION_DREAM_EXPLAINER_SUBMIT_SCORES"),
            StepIntent::SubmitScores { scores: Vec::new() }
        );
    }
}
