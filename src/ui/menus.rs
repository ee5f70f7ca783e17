//! Menu-label matrix and contract identity helpers.
//!
//! The widget never invents button labels: every menu id a specialist may
//! emit resolves here to the exact label list, and `default_menu` names the
//! fallback menu for a step at a given output status. Escape menus
//! (`*_MENU_ESCAPE`) are routing-only and have no label entry.

use crate::state::{CanvasState, StepId};

/// Identifies this revision of the label matrix.
pub const UI_CONTRACT_VERSION: &str = "2026-02-18-ux-contract-v1";

/// How far the current step has progressed, as far as output is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutputStatus {
    /// Nothing captured for the step yet.
    NoOutput,
    /// A draft exists but the user has not confirmed it.
    IncompleteOutput,
    /// A final value is persisted.
    ValidOutput,
}

impl TurnOutputStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnOutputStatus::NoOutput => "no_output",
            TurnOutputStatus::IncompleteOutput => "incomplete_output",
            TurnOutputStatus::ValidOutput => "valid_output",
        }
    }
}

impl std::fmt::Display for TurnOutputStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Output status of `step` given the session state: persisted final wins,
/// then an unconfirmed draft, then nothing.
pub fn status_for(step: StepId, state: &CanvasState) -> TurnOutputStatus {
    if !state.final_for(step).trim().is_empty() {
        return TurnOutputStatus::ValidOutput;
    }
    let drafted = state
        .provisional_by_step
        .get(step.as_str())
        .map(|draft| !draft.trim().is_empty())
        .unwrap_or(false);
    if drafted {
        TurnOutputStatus::IncompleteOutput
    } else {
        TurnOutputStatus::NoOutput
    }
}

/// Exact widget labels per menu id, in option order.
pub fn menu_labels(menu_id: &str) -> Option<&'static [&'static str]> {
    let labels: &'static [&'static str] = match menu_id {
        "DREAM_MENU_INTRO" => &[
            "Tell me more about why a dream matters",
            "Do a small exercise that helps to define your dream.",
        ],
        "DREAM_MENU_WHY" => &[
            "Give me a few dream suggestions",
            "Do a small exercise that helps to define your dream.",
        ],
        "DREAM_MENU_SUGGESTIONS" => &[
            "Pick one for me and continue",
            "Do a small exercise that helps to define your dream.",
        ],
        "DREAM_MENU_REFINE" => &[
            "I'm happy with this wording, please continue to step 3 Purpose",
            "Do a small exercise that helps to define your dream.",
        ],
        "DREAM_EXPLAINER_MENU_REFINE" => &[
            "I'm happy with this wording, please continue to step 3 Purpose",
            "Refine this formulation",
        ],
        "PURPOSE_MENU_INTRO" => &["Explain more about why a purpose is needed."],
        "PURPOSE_MENU_EXPLAIN" => &[
            "Ask 3 questions to help me define the Purpose.",
            "Give 3 examples of how Purpose could sound.",
        ],
        "PURPOSE_MENU_EXAMPLES" => &[
            "Ask 3 questions to help me define the Purpose.",
            "Choose one for me",
        ],
        "PURPOSE_MENU_REFINE" => &[
            "I'm happy with this wording, please continue to next step Big Why.",
            "Refine the wording",
        ],
        "PURPOSE_MENU_CONFIRM_SINGLE" => &[
            "I'm happy with this wording, please continue to next step Big Why.",
        ],
        "BIGWHY_MENU_INTRO" => &[
            "Give me an example of the Big Why",
            "Explain the importance of a Big Why",
        ],
        "BIGWHY_MENU_A" => &[
            "Ask 3 tough questions to find the Big Why.",
            "Give 3 examples of what a Big Why sounds like (universal meaning-layer, not rules, not industry slogans).",
            "Give me an example of the Big Why",
        ],
        "BIGWHY_MENU_REFINE" => &[
            "I'm happy with this wording, continue to step 5 Role",
            "Redefine the Big Why for me please",
        ],
        "ROLE_MENU_INTRO" => &["Give 3 short Role examples", "Explain why a Role matters"],
        "ROLE_MENU_ASK" => &["Give 3 short Role examples"],
        "ROLE_MENU_REFINE" => &["Yes, this fits.", "I want to adjust it."],
        "ROLE_MENU_EXAMPLES" => &["Choose one for me"],
        "ENTITY_MENU_INTRO" => &[
            "Give me an example how my entity could sound",
            "Explain why having an Entity matters",
        ],
        "ENTITY_MENU_FORMULATE" => &["Formulate my entity for me"],
        "ENTITY_MENU_EXAMPLE" => &[
            "I'm happy with this wording, go to the next step Strategy.",
            "Refine the wording for me please",
        ],
        "STRATEGY_MENU_INTRO" => &["Explain why a Strategy matters"],
        "STRATEGY_MENU_ASK" => &[
            "Ask me some questions to clarify my Strategy",
            "Show me an example of a Strategy for my business",
        ],
        "STRATEGY_MENU_REFINE" => &["Explain why a Strategy matters"],
        "STRATEGY_MENU_QUESTIONS" => &["Explain why a Strategy matters"],
        "STRATEGY_MENU_CONFIRM" => &[
            "Explain why a Strategy matters",
            "I'm satisfied with my Strategy. Let's go to Rules of the Game",
        ],
        "STRATEGY_MENU_FINAL_CONFIRM" => &[
            "I'm satisfied with my Strategy. Let's go to Rules of the Game",
        ],
        "TARGETGROUP_MENU_INTRO" => &[
            "Explain me more about Target Groups",
            "Ask me some questions to define my specific Target Group",
        ],
        "TARGETGROUP_MENU_EXPLAIN_MORE" => &[
            "Ask me some questions to define my specific Target Group",
        ],
        "TARGETGROUP_MENU_POSTREFINE" => &[
            "I'm happy with this wording, continue to next step Products and Services",
            "Ask me some questions to define my specific Target Group",
        ],
        "PRODUCTSSERVICES_MENU_CONFIRM" => &[
            "This is all what we offer, continue to step Rules of the Game",
        ],
        "RULES_MENU_INTRO" => &[
            "Please explain more about Rules of the Game",
            "Give one concrete example (Rule versus poster slogan)",
        ],
        "RULES_MENU_ASK_EXPLAIN" => &[
            "Please explain more about Rules of the Game",
            "Give one concrete example (Rule versus poster slogan)",
        ],
        "RULES_MENU_EXAMPLE_ONLY" => &[
            "Give one concrete example (Rule versus poster slogan)",
        ],
        "RULES_MENU_REFINE" => &["Yes, this fits", "I want to adjust it."],
        "RULES_MENU_CONFIRM" => &[
            "These are all my rules of the game, continue to Presentation",
            "Please explain more about Rules of the Game",
            "Give one concrete example (Rule versus poster slogan)",
        ],
        "PRESENTATION_MENU_ASK" => &["Create my presentation now"],
        _ => return None,
    };
    Some(labels)
}

/// The menu a step shows when the specialist did not pick one. Step 0 runs
/// without menus.
pub fn default_menu(step: StepId, status: TurnOutputStatus) -> Option<&'static str> {
    use TurnOutputStatus::{IncompleteOutput, NoOutput, ValidOutput};
    let menu = match (step, status) {
        (StepId::Step0, _) => return None,
        (StepId::Dream, NoOutput | IncompleteOutput) => "DREAM_MENU_INTRO",
        (StepId::Dream, ValidOutput) => "DREAM_MENU_REFINE",
        (StepId::Purpose, NoOutput) => "PURPOSE_MENU_INTRO",
        (StepId::Purpose, IncompleteOutput) => "PURPOSE_MENU_EXPLAIN",
        (StepId::Purpose, ValidOutput) => "PURPOSE_MENU_REFINE",
        (StepId::BigWhy, NoOutput) => "BIGWHY_MENU_INTRO",
        (StepId::BigWhy, IncompleteOutput) => "BIGWHY_MENU_A",
        (StepId::BigWhy, ValidOutput) => "BIGWHY_MENU_REFINE",
        (StepId::Role, NoOutput | IncompleteOutput) => "ROLE_MENU_INTRO",
        (StepId::Role, ValidOutput) => "ROLE_MENU_REFINE",
        (StepId::Entity, NoOutput) => "ENTITY_MENU_INTRO",
        (StepId::Entity, IncompleteOutput) => "ENTITY_MENU_FORMULATE",
        (StepId::Entity, ValidOutput) => "ENTITY_MENU_EXAMPLE",
        (StepId::Strategy, NoOutput) => "STRATEGY_MENU_INTRO",
        (StepId::Strategy, IncompleteOutput) => "STRATEGY_MENU_ASK",
        (StepId::Strategy, ValidOutput) => "STRATEGY_MENU_CONFIRM",
        (StepId::TargetGroup, NoOutput) => "TARGETGROUP_MENU_INTRO",
        (StepId::TargetGroup, IncompleteOutput) => "TARGETGROUP_MENU_EXPLAIN_MORE",
        (StepId::TargetGroup, ValidOutput) => "TARGETGROUP_MENU_POSTREFINE",
        (StepId::ProductsServices, _) => "PRODUCTSSERVICES_MENU_CONFIRM",
        (StepId::RulesOfTheGame, NoOutput) => "RULES_MENU_INTRO",
        (StepId::RulesOfTheGame, IncompleteOutput) => "RULES_MENU_ASK_EXPLAIN",
        (StepId::RulesOfTheGame, ValidOutput) => "RULES_MENU_CONFIRM",
        (StepId::Presentation, _) => "PRESENTATION_MENU_ASK",
    };
    Some(menu)
}

/// Stable identity of a rendered contract screen. Empty components fall back
/// to `unknown_step` / `unknown_status` / `NO_MENU` so the id stays parseable.
pub fn contract_id(step_id: &str, status: &str, menu_id: &str) -> String {
    let step = non_empty_or(step_id, "unknown_step");
    let status = non_empty_or(status, "unknown_status");
    let menu = non_empty_or(menu_id, "NO_MENU");
    format!("{step}:{status}:{menu}")
}

/// Recap line shown before a step has any output.
pub fn no_output_recap(step_label: &str) -> String {
    format!(
        "We have not yet defined the {}.",
        non_empty_or(step_label, "current step")
    )
}

/// Headline above the step body. `has_options` appends the menu hint.
pub fn headline(
    step_label: &str,
    company_name: &str,
    status: TurnOutputStatus,
    has_options: bool,
) -> String {
    let prefix = match status {
        TurnOutputStatus::NoOutput => "Define",
        _ => "Refine",
    };
    let base = format!("{prefix} your {step_label} for {company_name}");
    if has_options {
        format!("{base} or choose an option.")
    } else {
        format!("{base}.")
    }
}

/// The six stable translation keys for a contract screen.
pub fn contract_text_keys(step_id: &str, status: &str, menu_id: &str) -> [String; 6] {
    [
        format!("step:{step_id}"),
        format!("status:{status}"),
        format!("menu:{}", non_empty_or(menu_id, "NO_MENU")),
        "headline:contract".to_string(),
        "recap:contract".to_string(),
        "labels:contract".to_string(),
    ]
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() { fallback } else { trimmed }
}
