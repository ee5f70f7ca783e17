//! Finals persistence and confirm normalization.
//!
//! A CONFIRM is only allowed to advance the walk when it actually carries the
//! text being confirmed; [`normalize_confirm_finals`] downgrades anything
//! else back to an ASK before the reply is applied. [`apply_state_update`]
//! then folds one specialist reply into the session state.

use serde_json::Value;

use crate::router::RouteDecision;
use crate::specialists::output::{SpecialistReply, StepAction};
use crate::specialists::schema::value_field;
use crate::state::{CanvasState, StepId};

/// First sentence of the text (split on `.`/`!`/`?`), capped at `max_words`.
pub fn first_sentence_capped(text: &str, max_words: usize) -> String {
    let first = text
        .split(['.', '!', '?'])
        .next()
        .unwrap_or("")
        .trim();
    let words: Vec<&str> = first.split_whitespace().collect();
    if words.len() > max_words {
        words[..max_words].join(" ")
    } else {
        first.to_string()
    }
}

/// Renders statements as `- rule` bullet lines, one per statement, deduped
/// case-insensitively and capped at `max_rules`.
pub fn rules_bullets(statements: &[String], max_rules: usize) -> String {
    let mut seen: Vec<String> = Vec::new();
    let mut lines: Vec<String> = Vec::new();
    for statement in statements {
        let rule = statement
            .trim()
            .trim_start_matches("- ")
            .trim_start_matches("• ")
            .trim();
        if rule.is_empty() {
            continue;
        }
        let key = rule.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        lines.push(format!("- {rule}"));
        if lines.len() == max_rules {
            break;
        }
    }
    lines.join("\n")
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// The Big Why text a reply proposes: the confirmed field first, then the
/// refined formulation.
pub fn bigwhy_candidate(reply: &SpecialistReply) -> String {
    let confirmed = reply.text("bigwhy").trim();
    if !confirmed.is_empty() {
        return confirmed.to_string();
    }
    reply.refined_formulation().trim().to_string()
}

/// Deterministic REFINE feedback when the Big Why stays over the word cap
/// after the shorten pass.
pub fn bigwhy_too_long_feedback(lang: &str, cap: usize) -> SpecialistReply {
    let nl = lang.to_lowercase().starts_with("nl");
    let message = if nl {
        format!(
            "Je formulering is langer dan {cap} woorden. Kort en bondig is duidelijker, dus graag een compacte versie."
        )
    } else {
        format!(
            "Your formulation is longer than {cap} words. Short and clear is better, so please provide a compact version."
        )
    };
    let question = if nl {
        format!("Wil je het herschrijven tot maximaal {cap} woorden?")
    } else {
        format!("Can you rewrite it in {cap} words or fewer?")
    };
    SpecialistReply::from_value(serde_json::json!({
        "action": "REFINE",
        "message": message,
        "question": question,
        "refined_formulation": "",
        "confirmation_question": "",
        "bigwhy": "",
        "menu_id": "",
        "proceed_to_next": "false",
        "wants_recap": false,
    }))
}

/// Makes sure a CONFIRM carries the final it claims to confirm.
///
/// - CONFIRM without a confirmation prompt passes through untouched (nothing
///   to render, the apply step will simply not persist).
/// - A verification CONFIRM without a `step_0` value downgrades to an ASK
///   re-asking the verification question.
/// - A CONFIRM whose per-step field is empty copies `refined_formulation` in
///   (the target group applies its first-sentence rule here); if that is
///   empty too, the reply downgrades to an ASK built from the confirmation
///   prompt with all proceed flags forced off.
pub fn normalize_confirm_finals(
    step: StepId,
    reply: SpecialistReply,
    state: &CanvasState,
    step0_question: &str,
    targetgroup_word_cap: usize,
) -> SpecialistReply {
    if reply.action() != Some(StepAction::Confirm) {
        return reply;
    }
    let prompt = {
        let confirm = reply.confirmation_question().trim();
        if confirm.is_empty() {
            reply.question().trim()
        } else {
            confirm
        }
    };
    if prompt.is_empty() {
        return reply;
    }

    if step == StepId::Step0 {
        if !reply.text("step_0").trim().is_empty() {
            return reply;
        }
        let business_name = {
            let from_reply = reply.text("business_name").trim();
            if from_reply.is_empty() {
                let stored = state.business_name.trim();
                if stored.is_empty() { "TBD" } else { stored }.to_string()
            } else {
                from_reply.to_string()
            }
        };
        let mut downgraded = reply;
        downgraded.set("action", Value::from("ASK"));
        downgraded.set("message", Value::from(""));
        downgraded.set("question", Value::from(step0_question));
        downgraded.set("confirmation_question", Value::from(""));
        downgraded.set("business_name", Value::from(business_name));
        downgraded.set("step_0", Value::from(""));
        downgraded.set("proceed_to_dream", Value::from("false"));
        return downgraded;
    }

    let field = value_field(step);
    if !reply.text(field).trim().is_empty() {
        return reply;
    }

    let refined = reply.refined_formulation().trim().to_string();
    if !refined.is_empty() {
        let mut filled = reply;
        let value = if step == StepId::TargetGroup {
            first_sentence_capped(&refined, targetgroup_word_cap)
        } else {
            refined
        };
        filled.set(field, Value::from(value));
        return filled;
    }

    let prompt = prompt.to_string();
    let mut downgraded = reply;
    downgraded.set("action", Value::from("ASK"));
    downgraded.set("question", Value::from(prompt));
    downgraded.set("confirmation_question", Value::from(""));
    downgraded.set("proceed_to_next", Value::from("false"));
    downgraded.set("proceed_to_purpose", Value::from("false"));
    downgraded
}

/// Folds one applied specialist reply into the state: routing bookkeeping,
/// the stored reply, and finals persistence per the step's rule.
pub fn apply_state_update(
    prev: &CanvasState,
    decision: &RouteDecision,
    reply: &SpecialistReply,
    session_intro_used: bool,
    targetgroup_word_cap: usize,
    rules_bullet_cap: usize,
) -> CanvasState {
    let mut next = prev.clone();
    let step = decision.step;
    next.current_step = step;
    next.active_specialist = decision.specialist.as_str().to_string();
    next.last_specialist_result = reply.as_value().clone();

    if session_intro_used {
        next.mark_session_intro_shown();
    }
    if reply.action() == Some(StepAction::Intro) {
        next.mark_step_intro_shown(step.as_str());
    }

    // Verification persists ungated: the reply either carries values or the
    // previous ones stand.
    if step == StepId::Step0 {
        next.persist_step0(reply.text("step_0"), reply.text("business_name"));
        return next;
    }

    if reply.action() != Some(StepAction::Confirm) {
        return next;
    }

    match step {
        StepId::TargetGroup => {
            let value = reply.text("targetgroup").trim();
            if !value.is_empty() {
                let capped = first_sentence_capped(value, targetgroup_word_cap);
                if !capped.is_empty() {
                    next.targetgroup_final = capped;
                }
            }
        }
        StepId::RulesOfTheGame => {
            let statements = reply.statements();
            let source = if statements.is_empty() {
                // Fall back to the confirmed text split into lines.
                reply
                    .text("rulesofthegame")
                    .lines()
                    .map(str::to_string)
                    .collect()
            } else {
                statements
            };
            let bullets = rules_bullets(&source, rules_bullet_cap);
            if !bullets.is_empty() {
                next.rulesofthegame_final = bullets;
            }
        }
        _ => {
            let value = reply.text(value_field(step)).trim();
            if !value.is_empty() {
                next.set_final_for(step, value.to_string());
            }
        }
    }

    next
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::router::route;
    use crate::specialists::Specialist;

    const STEP0_QUESTION: &str = "What type of venture is it?";

    fn reply(value: Value) -> SpecialistReply {
        SpecialistReply::from_value(value)
    }

    fn normalize(step: StepId, value: Value, state: &CanvasState) -> SpecialistReply {
        normalize_confirm_finals(step, reply(value), state, STEP0_QUESTION, 10)
    }

    fn decision_for(step: StepId) -> RouteDecision {
        RouteDecision {
            step,
            specialist: Specialist::primary_for(step),
            specialist_input: String::new(),
            intro_shown_for_step: String::new(),
            show_step_intro: false,
            show_session_intro: false,
        }
    }

    #[test]
    fn sentence_cap_keeps_the_first_sentence() {
        assert_eq!(
            first_sentence_capped("Busy founders of small agencies. They need help.", 10),
            "Busy founders of small agencies"
        );
        assert_eq!(
            first_sentence_capped("one two three four five six seven eight nine ten eleven", 10),
            "one two three four five six seven eight nine ten"
        );
        assert_eq!(first_sentence_capped("", 10), "");
    }

    #[test]
    fn rules_bullets_dedupe_and_cap() {
        let statements: Vec<String> = [
            "Be honest",
            "- Be honest",
            "be HONEST",
            "Own your work",
            "",
            "Customers first",
            "Stay curious",
            "Keep promises",
            "Ship weekly",
            "One more rule",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let bullets = rules_bullets(&statements, 6);
        let lines: Vec<&str> = bullets.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "- Be honest");
        assert!(lines.iter().all(|l| l.starts_with("- ")));
        assert!(!bullets.contains("One more rule"));
    }

    #[test]
    fn confirm_with_final_passes_through() {
        let state = CanvasState::default();
        let out = normalize(
            StepId::Dream,
            json!({
                "action": "CONFIRM",
                "confirmation_question": "Happy with this dream?",
                "dream": "A world in which work heals.",
            }),
            &state,
        );
        assert_eq!(out.action(), Some(StepAction::Confirm));
        assert_eq!(out.text("dream"), "A world in which work heals.");
    }

    #[test]
    fn confirm_fills_the_field_from_the_refined_formulation() {
        let state = CanvasState::default();
        let out = normalize(
            StepId::Purpose,
            json!({
                "action": "CONFIRM",
                "confirmation_question": "Shall we lock this in?",
                "purpose": "",
                "refined_formulation": "We exist to make work humane.",
            }),
            &state,
        );
        assert_eq!(out.text("purpose"), "We exist to make work humane.");

        // Target group applies its first-sentence rule during the copy.
        let out = normalize(
            StepId::TargetGroup,
            json!({
                "action": "CONFIRM",
                "confirmation_question": "Is this your target group?",
                "targetgroup": "",
                "refined_formulation": "Busy founders of small agencies. Mostly in Europe.",
            }),
            &state,
        );
        assert_eq!(out.text("targetgroup"), "Busy founders of small agencies");
    }

    #[test]
    fn empty_confirm_downgrades_to_ask() {
        let state = CanvasState::default();
        let out = normalize(
            StepId::Role,
            json!({
                "action": "CONFIRM",
                "confirmation_question": "Is this your role?",
                "role": "",
                "refined_formulation": "",
                "proceed_to_next": "true",
            }),
            &state,
        );
        assert_eq!(out.action(), Some(StepAction::Ask));
        assert_eq!(out.question(), "Is this your role?");
        assert_eq!(out.confirmation_question(), "");
        assert_eq!(out.text("proceed_to_next"), "false");
    }

    #[test]
    fn step0_confirm_without_value_reasks_verification() {
        let mut state = CanvasState::default();
        state.business_name = "Bean There".to_string();
        let out = normalize(
            StepId::Step0,
            json!({
                "action": "CONFIRM",
                "confirmation_question": "Ready to start?",
                "step_0": "",
                "proceed_to_dream": "true",
            }),
            &state,
        );
        assert_eq!(out.action(), Some(StepAction::Ask));
        assert_eq!(out.question(), STEP0_QUESTION);
        assert_eq!(out.text("business_name"), "Bean There");
        assert_eq!(out.text("proceed_to_dream"), "false");
    }

    #[test]
    fn confirm_without_prompt_is_left_alone() {
        let state = CanvasState::default();
        let value = json!({"action": "CONFIRM", "dream": ""});
        let out = normalize(StepId::Dream, value.clone(), &state);
        assert_eq!(out.as_value(), &value);
    }

    #[test]
    fn apply_persists_on_confirm_only() {
        let state = CanvasState::default();
        let decision = decision_for(StepId::Dream);

        let asked = apply_state_update(
            &state,
            &decision,
            &reply(json!({"action": "ASK", "dream": "draft text"})),
            false,
            10,
            6,
        );
        assert_eq!(asked.dream_final, "");
        assert_eq!(asked.current_step, StepId::Dream);
        assert_eq!(asked.active_specialist, "Dream");

        let confirmed = apply_state_update(
            &state,
            &decision,
            &reply(json!({"action": "CONFIRM", "dream": "A world in which work heals."})),
            false,
            10,
            6,
        );
        assert_eq!(confirmed.dream_final, "A world in which work heals.");
    }

    #[test]
    fn apply_step0_is_ungated_and_keeps_previous_values() {
        let mut state = CanvasState::default();
        state.step_0_final = "Venture: bakery | Name: Crumb | Status: existing".to_string();
        state.business_name = "Crumb".to_string();
        let decision = decision_for(StepId::Step0);

        let next = apply_state_update(
            &state,
            &decision,
            &reply(json!({"action": "ASK", "step_0": "", "business_name": ""})),
            false,
            10,
            6,
        );
        assert_eq!(next.step_0_final, state.step_0_final);
        assert_eq!(next.business_name, "Crumb");

        let next = apply_state_update(
            &state,
            &decision,
            &reply(json!({
                "action": "ASK",
                "step_0": "Venture: cafe | Name: Crumb | Status: existing",
                "business_name": "Crumb & Co",
            })),
            false,
            10,
            6,
        );
        assert_eq!(next.step_0_final, "Venture: cafe | Name: Crumb | Status: existing");
        assert_eq!(next.business_name, "Crumb & Co");
    }

    #[test]
    fn apply_caps_targetgroup_and_rules() {
        let state = CanvasState::default();
        let next = apply_state_update(
            &state,
            &decision_for(StepId::TargetGroup),
            &reply(json!({
                "action": "CONFIRM",
                "targetgroup": "Busy founders of small creative agencies in Europe who need focus. And more.",
            })),
            false,
            10,
            6,
        );
        assert_eq!(
            next.targetgroup_final,
            "Busy founders of small creative agencies in Europe who need"
        );

        let next = apply_state_update(
            &state,
            &decision_for(StepId::RulesOfTheGame),
            &reply(json!({
                "action": "CONFIRM",
                "rulesofthegame": "ignored when statements exist",
                "statements": ["Be honest", "Own it", "Be honest", "Ship weekly"],
            })),
            false,
            10,
            6,
        );
        assert_eq!(
            next.rulesofthegame_final,
            "- Be honest\n- Own it\n- Ship weekly"
        );
    }

    #[test]
    fn apply_marks_intros() {
        let mut state = CanvasState::default();
        state.current_step = StepId::Purpose;
        let decision = route(&state, "");
        let next = apply_state_update(
            &state,
            &decision,
            &reply(json!({"action": "INTRO", "message": "Welcome to Purpose."})),
            true,
            10,
            6,
        );
        assert_eq!(next.intro_shown_for_step, "purpose");
        assert_eq!(next.intro_shown_session, "true");
    }

    #[test]
    fn bigwhy_feedback_localizes() {
        let en = bigwhy_too_long_feedback("en", 28);
        assert_eq!(en.action(), Some(StepAction::Refine));
        assert!(en.message().contains("28 words"));

        let nl = bigwhy_too_long_feedback("nl", 28);
        assert!(nl.message().contains("28 woorden"));
    }
}
