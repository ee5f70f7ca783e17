//! Turn routing: which specialist handles the turn, on which step.
//!
//! [`route`] is a pure function of the normalized state and the user
//! message. It never performs I/O and never mutates state; in particular it
//! passes `intro_shown_for_step` through untouched (the step intro marker is
//! only advanced when a specialist actually delivers an intro).

pub mod restart;
pub mod triggers;

pub use restart::wants_full_restart;
pub use triggers::{read_triggers, TriggerFlags};

use crate::specialists::Specialist;
use crate::state::{CanvasState, StepId};

/// Routing decision for one specialist invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDecision {
    pub step: StepId,
    pub specialist: Specialist,
    /// Wrapped input handed to the specialist, user words verbatim.
    pub specialist_input: String,
    /// Pass-through of the stored step intro marker.
    pub intro_shown_for_step: String,
    pub show_step_intro: bool,
    pub show_session_intro: bool,
}

/// Decides the next specialist and step. Priority order:
/// restart intent, explicit proceed flags, dream-builder continuation,
/// dream-builder handshake, then stay put.
pub fn route(state: &CanvasState, user_message: &str) -> RouteDecision {
    let current = state.current_step;
    let intro_marker = state.intro_shown_for_step.trim().to_string();
    let active_specialist = state.active_specialist.trim();
    let flags = read_triggers(&state.last_specialist_result);

    let (step, specialist) = if current != StepId::Step0 && wants_full_restart(user_message) {
        (StepId::Step0, Specialist::ValidationAndBusinessName)
    } else if flags.proceed_to_dream {
        (StepId::Dream, Specialist::Dream)
    } else if flags.proceed_to_purpose {
        (StepId::Purpose, Specialist::Purpose)
    } else if flags.proceed_to_next {
        let next = current.next();
        (next, Specialist::primary_for(next))
    } else if active_specialist == Specialist::DreamExplainer.as_str()
        && flags.suggest_dreambuilder
    {
        (StepId::Dream, Specialist::DreamExplainer)
    } else if current == StepId::Dream && flags.action == "CONFIRM" && flags.suggest_dreambuilder
    {
        (StepId::Dream, Specialist::DreamExplainer)
    } else {
        (current, Specialist::primary_for(current))
    };

    tracing::debug!(step = %step, specialist = %specialist, "routed turn");

    RouteDecision {
        step,
        specialist,
        specialist_input: format!(
            "CURRENT_STEP_ID: {} | USER_MESSAGE: {}",
            step.as_str(),
            user_message
        ),
        intro_shown_for_step: intro_marker.clone(),
        show_step_intro: intro_marker != step.as_str(),
        show_session_intro: state.intro_shown_session != "true",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state_at(step: StepId) -> CanvasState {
        let mut state = CanvasState::default();
        state.current_step = step;
        state
    }

    #[test]
    fn default_stays_on_current_step() {
        let decision = route(&state_at(StepId::Purpose), "tell me more");
        assert_eq!(decision.step, StepId::Purpose);
        assert_eq!(decision.specialist, Specialist::Purpose);
        assert_eq!(
            decision.specialist_input,
            "CURRENT_STEP_ID: purpose | USER_MESSAGE: tell me more"
        );
    }

    #[test]
    fn restart_beats_proceed_flags() {
        let mut state = state_at(StepId::Strategy);
        state.last_specialist_result = json!({"proceed_to_next": "true"});
        let decision = route(&state, "restart the canvas");
        assert_eq!(decision.step, StepId::Step0);
        assert_eq!(decision.specialist, Specialist::ValidationAndBusinessName);
    }

    #[test]
    fn restart_is_ignored_on_the_first_step() {
        let decision = route(&state_at(StepId::Step0), "restart");
        assert_eq!(decision.step, StepId::Step0);
        assert_eq!(decision.specialist, Specialist::ValidationAndBusinessName);
    }

    #[test]
    fn proceed_flags_in_priority_order() {
        let mut state = state_at(StepId::Step0);
        state.last_specialist_result = json!({
            "proceed_to_dream": "true",
            "proceed_to_next": "true",
        });
        assert_eq!(route(&state, "").step, StepId::Dream);

        let mut state = state_at(StepId::Dream);
        state.last_specialist_result = json!({"proceed_to_purpose": "true"});
        assert_eq!(route(&state, "").step, StepId::Purpose);

        let mut state = state_at(StepId::Role);
        state.last_specialist_result = json!({"proceed_to_next": "true"});
        assert_eq!(route(&state, "").step, StepId::Entity);
    }

    #[test]
    fn proceed_to_next_saturates_at_the_last_step() {
        let mut state = state_at(StepId::Presentation);
        state.last_specialist_result = json!({"proceed_to_next": "true"});
        assert_eq!(route(&state, "").step, StepId::Presentation);
    }

    #[test]
    fn explainer_continuation_and_handshake() {
        let mut state = state_at(StepId::Dream);
        state.active_specialist = "DreamExplainer".to_string();
        state.last_specialist_result = json!({"suggest_dreambuilder": "true"});
        let decision = route(&state, "sounds good");
        assert_eq!(decision.specialist, Specialist::DreamExplainer);

        let mut state = state_at(StepId::Dream);
        state.last_specialist_result =
            json!({"action": "CONFIRM", "suggest_dreambuilder": "true"});
        let decision = route(&state, "yes");
        assert_eq!(decision.specialist, Specialist::DreamExplainer);

        // Without the CONFIRM the handshake does not start.
        let mut state = state_at(StepId::Dream);
        state.last_specialist_result = json!({"suggest_dreambuilder": "true"});
        assert_eq!(route(&state, "yes").specialist, Specialist::Dream);
    }

    #[test]
    fn intro_flags_reflect_stored_markers() {
        let mut state = state_at(StepId::Dream);
        state.intro_shown_for_step = "dream".to_string();
        state.intro_shown_session = "true".to_string();
        let decision = route(&state, "hi");
        assert!(!decision.show_step_intro);
        assert!(!decision.show_session_intro);
        assert_eq!(decision.intro_shown_for_step, "dream");

        state.intro_shown_for_step = "purpose".to_string();
        state.intro_shown_session = "false".to_string();
        let decision = route(&state, "hi");
        assert!(decision.show_step_intro);
        assert!(decision.show_session_intro);
        // The router never advances the marker itself.
        assert_eq!(decision.intro_shown_for_step, "purpose");
    }

    #[test]
    fn deterministic_for_equal_inputs() {
        let mut state = state_at(StepId::Entity);
        state.last_specialist_result = json!({"proceed_to_next": "true"});
        let first = route(&state, "go on");
        let second = route(&state, "go on");
        assert_eq!(first, second);
    }
}
