//! Action-code registry: every button the widget can press, as data.
//!
//! Each menu option carries a stable `ACTION_*` code; the registry maps the
//! code to the route token the router consumes, the menu(s) it may be
//! pressed from, and where the flow lands afterwards. Routing never
//! interprets button labels, only codes, so relabeling a button cannot
//! change behavior.
//!
//! Confirm-style codes route to the literal `"yes"`; everything else routes
//! to a `__ROUTE__*__` token.

use crate::ui::menus::menu_labels;

/// Identifies this revision of the action-code registry. Carried on every
/// turn response so widget and server builds can be cross-checked.
pub const REGISTRY_VERSION: &str = "2026-02-18-actioncode-registry-v1";

/// Free-standing codes the widget sends outside any menu.
pub const ACTION_TEXT_SUBMIT: &str = "ACTION_TEXT_SUBMIT";
pub const ACTION_SUBMIT_SCORES: &str = "ACTION_DREAM_EXPLAINER_SUBMIT_SCORES";
pub const ACTION_WORDING_PICK_USER: &str = "ACTION_WORDING_PICK_USER";
pub const ACTION_WORDING_PICK_SUGGESTION: &str = "ACTION_WORDING_PICK_SUGGESTION";
pub const ACTION_CONFIRM_CONTINUE: &str = "ACTION_CONFIRM_CONTINUE";
pub const ACTION_STEP0_READY_START: &str = "ACTION_STEP0_READY_START";
pub const ACTION_DREAM_SWITCH_TO_SELF: &str = "ACTION_DREAM_SWITCH_TO_SELF";

/// Route token that flips the dream step back to self-authoring.
pub const SWITCH_TO_SELF_DREAM_TOKEN: &str = "__SWITCH_TO_SELF_DREAM__";

/// What the widget shows once the action resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Another option menu.
    Menu,
    /// A free-text input turn.
    Text,
}

impl RenderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderMode::Menu => "menu",
            RenderMode::Text => "text",
        }
    }
}

/// One registry row: a pressable code and where it leads.
#[derive(Debug, Clone, Copy)]
pub struct MenuTransition {
    pub code: &'static str,
    /// Step id the code belongs to.
    pub step: &'static str,
    /// Menus this code may be pressed from.
    pub from_menus: &'static [&'static str],
    /// `"yes"` for confirm actions, else a `__ROUTE__*__` token.
    pub route: &'static str,
    /// Step the flow lands on, or "" when it stays put.
    pub to_step: &'static str,
    /// Expected next menu, or "" when the specialist picks.
    pub to_menu: &'static str,
    pub render_mode: RenderMode,
}

const fn t(
    code: &'static str,
    step: &'static str,
    from_menus: &'static [&'static str],
    route: &'static str,
    to_step: &'static str,
    to_menu: &'static str,
    render_mode: RenderMode,
) -> MenuTransition {
    MenuTransition {
        code,
        step,
        from_menus,
        route,
        to_step,
        to_menu,
        render_mode,
    }
}

use RenderMode::{Menu, Text};

#[rustfmt::skip]
const TRANSITIONS: &[MenuTransition] = &[
    // dream
    t("ACTION_DREAM_INTRO_EXPLAIN_MORE", "dream", &["DREAM_MENU_INTRO"], "__ROUTE__DREAM_EXPLAIN_MORE__", "", "DREAM_MENU_WHY", Menu),
    t("ACTION_DREAM_INTRO_START_EXERCISE", "dream", &["DREAM_MENU_INTRO"], "__ROUTE__DREAM_START_EXERCISE__", "", "", Text),
    t("ACTION_DREAM_WHY_GIVE_SUGGESTIONS", "dream", &["DREAM_MENU_WHY"], "__ROUTE__DREAM_GIVE_SUGGESTIONS__", "", "DREAM_MENU_SUGGESTIONS", Menu),
    t("ACTION_DREAM_WHY_START_EXERCISE", "dream", &["DREAM_MENU_WHY"], "__ROUTE__DREAM_START_EXERCISE__", "", "", Text),
    t("ACTION_DREAM_SUGGESTIONS_PICK_ONE", "dream", &["DREAM_MENU_SUGGESTIONS"], "__ROUTE__DREAM_PICK_ONE__", "", "DREAM_MENU_REFINE", Menu),
    t("ACTION_DREAM_SUGGESTIONS_START_EXERCISE", "dream", &["DREAM_MENU_SUGGESTIONS"], "__ROUTE__DREAM_START_EXERCISE__", "", "", Text),
    t("ACTION_DREAM_REFINE_CONFIRM", "dream", &["DREAM_MENU_REFINE"], "yes", "purpose", "PURPOSE_MENU_INTRO", Menu),
    t("ACTION_DREAM_REFINE_START_EXERCISE", "dream", &["DREAM_MENU_REFINE"], "__ROUTE__DREAM_START_EXERCISE__", "", "", Text),
    t("ACTION_DREAM_ESCAPE_CONTINUE", "dream", &["DREAM_MENU_ESCAPE"], "__ROUTE__DREAM_CONTINUE__", "", "", Menu),
    t("ACTION_DREAM_ESCAPE_FINISH_LATER", "dream", &["DREAM_MENU_ESCAPE"], "__ROUTE__DREAM_FINISH_LATER__", "", "", Text),
    // dream explainer (runs inside the dream step)
    t("ACTION_DREAM_EXPLAINER_REFINE_CONFIRM", "dream", &["DREAM_EXPLAINER_MENU_REFINE"], "yes", "purpose", "PURPOSE_MENU_INTRO", Menu),
    t("ACTION_DREAM_EXPLAINER_REFINE_ADJUST", "dream", &["DREAM_EXPLAINER_MENU_REFINE"], "__ROUTE__DREAM_EXPLAINER_REFINE__", "", "", Text),
    t("ACTION_DREAM_EXPLAINER_ESCAPE_CONTINUE", "dream", &["DREAM_EXPLAINER_MENU_ESCAPE"], "__ROUTE__DREAM_EXPLAINER_CONTINUE__", "", "", Menu),
    t("ACTION_DREAM_EXPLAINER_ESCAPE_FINISH_LATER", "dream", &["DREAM_EXPLAINER_MENU_ESCAPE"], "__ROUTE__DREAM_EXPLAINER_FINISH_LATER__", "", "", Text),
    // purpose
    t("ACTION_PURPOSE_INTRO_EXPLAIN_MORE", "purpose", &["PURPOSE_MENU_INTRO"], "__ROUTE__PURPOSE_EXPLAIN_MORE__", "", "PURPOSE_MENU_EXPLAIN", Menu),
    t("ACTION_PURPOSE_EXPLAIN_ASK_3_QUESTIONS", "purpose", &["PURPOSE_MENU_EXPLAIN"], "__ROUTE__PURPOSE_ASK_3_QUESTIONS__", "", "", Text),
    t("ACTION_PURPOSE_EXPLAIN_GIVE_EXAMPLES", "purpose", &["PURPOSE_MENU_EXPLAIN"], "__ROUTE__PURPOSE_GIVE_EXAMPLES__", "", "PURPOSE_MENU_EXAMPLES", Menu),
    t("ACTION_PURPOSE_EXAMPLES_ASK_3_QUESTIONS", "purpose", &["PURPOSE_MENU_EXAMPLES"], "__ROUTE__PURPOSE_ASK_3_QUESTIONS__", "", "", Text),
    t("ACTION_PURPOSE_EXAMPLES_CHOOSE_FOR_ME", "purpose", &["PURPOSE_MENU_EXAMPLES"], "__ROUTE__PURPOSE_CHOOSE_FOR_ME__", "", "PURPOSE_MENU_REFINE", Menu),
    t("ACTION_PURPOSE_REFINE_CONFIRM", "purpose", &["PURPOSE_MENU_REFINE"], "yes", "bigwhy", "BIGWHY_MENU_INTRO", Menu),
    t("ACTION_PURPOSE_REFINE_ADJUST", "purpose", &["PURPOSE_MENU_REFINE"], "__ROUTE__PURPOSE_REFINE__", "", "", Text),
    t("ACTION_PURPOSE_CONFIRM_SINGLE", "purpose", &["PURPOSE_MENU_CONFIRM_SINGLE"], "yes", "bigwhy", "BIGWHY_MENU_INTRO", Menu),
    t("ACTION_PURPOSE_ESCAPE_CONTINUE", "purpose", &["PURPOSE_MENU_ESCAPE"], "__ROUTE__PURPOSE_CONTINUE__", "", "", Menu),
    t("ACTION_PURPOSE_ESCAPE_FINISH_LATER", "purpose", &["PURPOSE_MENU_ESCAPE"], "__ROUTE__PURPOSE_FINISH_LATER__", "", "", Text),
    // big why
    t("ACTION_BIGWHY_INTRO_GIVE_EXAMPLE", "bigwhy", &["BIGWHY_MENU_INTRO"], "__ROUTE__BIGWHY_GIVE_EXAMPLE__", "", "BIGWHY_MENU_A", Menu),
    t("ACTION_BIGWHY_INTRO_EXPLAIN_IMPORTANCE", "bigwhy", &["BIGWHY_MENU_INTRO"], "__ROUTE__BIGWHY_EXPLAIN_IMPORTANCE__", "", "BIGWHY_MENU_A", Menu),
    t("ACTION_BIGWHY_A_ASK_3_QUESTIONS", "bigwhy", &["BIGWHY_MENU_A"], "__ROUTE__BIGWHY_ASK_3_QUESTIONS__", "", "", Text),
    t("ACTION_BIGWHY_A_GIVE_EXAMPLES", "bigwhy", &["BIGWHY_MENU_A"], "__ROUTE__BIGWHY_GIVE_EXAMPLES__", "", "", Menu),
    t("ACTION_BIGWHY_A_GIVE_EXAMPLE", "bigwhy", &["BIGWHY_MENU_A"], "__ROUTE__BIGWHY_GIVE_EXAMPLE__", "", "", Menu),
    t("ACTION_BIGWHY_REFINE_CONFIRM", "bigwhy", &["BIGWHY_MENU_REFINE"], "yes", "role", "ROLE_MENU_INTRO", Menu),
    t("ACTION_BIGWHY_REFINE_ADJUST", "bigwhy", &["BIGWHY_MENU_REFINE"], "__ROUTE__BIGWHY_REFINE__", "", "", Text),
    t("ACTION_BIGWHY_ESCAPE_CONTINUE", "bigwhy", &["BIGWHY_MENU_ESCAPE"], "__ROUTE__BIGWHY_CONTINUE__", "", "", Menu),
    t("ACTION_BIGWHY_ESCAPE_FINISH_LATER", "bigwhy", &["BIGWHY_MENU_ESCAPE"], "__ROUTE__BIGWHY_FINISH_LATER__", "", "", Text),
    // role
    t("ACTION_ROLE_INTRO_GIVE_EXAMPLES", "role", &["ROLE_MENU_INTRO"], "__ROUTE__ROLE_GIVE_EXAMPLES__", "", "ROLE_MENU_EXAMPLES", Menu),
    t("ACTION_ROLE_INTRO_EXPLAIN_MORE", "role", &["ROLE_MENU_INTRO"], "__ROUTE__ROLE_EXPLAIN_MORE__", "", "ROLE_MENU_ASK", Menu),
    t("ACTION_ROLE_ASK_GIVE_EXAMPLES", "role", &["ROLE_MENU_ASK"], "__ROUTE__ROLE_GIVE_EXAMPLES__", "", "ROLE_MENU_EXAMPLES", Menu),
    t("ACTION_ROLE_EXAMPLES_CHOOSE_FOR_ME", "role", &["ROLE_MENU_EXAMPLES"], "__ROUTE__ROLE_CHOOSE_FOR_ME__", "", "ROLE_MENU_REFINE", Menu),
    t("ACTION_ROLE_REFINE_CONFIRM", "role", &["ROLE_MENU_REFINE"], "yes", "entity", "ENTITY_MENU_INTRO", Menu),
    t("ACTION_ROLE_REFINE_ADJUST", "role", &["ROLE_MENU_REFINE"], "__ROUTE__ROLE_ADJUST__", "", "", Text),
    t("ACTION_ROLE_ESCAPE_CONTINUE", "role", &["ROLE_MENU_ESCAPE"], "__ROUTE__ROLE_CONTINUE__", "", "", Menu),
    t("ACTION_ROLE_ESCAPE_FINISH_LATER", "role", &["ROLE_MENU_ESCAPE"], "__ROUTE__ROLE_FINISH_LATER__", "", "", Text),
    // entity
    t("ACTION_ENTITY_INTRO_FORMULATE", "entity", &["ENTITY_MENU_INTRO"], "__ROUTE__ENTITY_FORMULATE__", "", "ENTITY_MENU_EXAMPLE", Menu),
    t("ACTION_ENTITY_INTRO_EXPLAIN_MORE", "entity", &["ENTITY_MENU_INTRO"], "__ROUTE__ENTITY_EXPLAIN_MORE__", "", "ENTITY_MENU_FORMULATE", Menu),
    t("ACTION_ENTITY_FORMULATE_FOR_ME", "entity", &["ENTITY_MENU_FORMULATE"], "__ROUTE__ENTITY_FORMULATE_FOR_ME__", "", "ENTITY_MENU_EXAMPLE", Menu),
    t("ACTION_ENTITY_EXAMPLE_CONFIRM", "entity", &["ENTITY_MENU_EXAMPLE"], "yes", "strategy", "STRATEGY_MENU_INTRO", Menu),
    t("ACTION_ENTITY_EXAMPLE_REFINE", "entity", &["ENTITY_MENU_EXAMPLE"], "__ROUTE__ENTITY_REFINE__", "", "", Text),
    t("ACTION_ENTITY_ESCAPE_CONTINUE", "entity", &["ENTITY_MENU_ESCAPE"], "__ROUTE__ENTITY_CONTINUE__", "", "", Menu),
    t("ACTION_ENTITY_ESCAPE_FINISH_LATER", "entity", &["ENTITY_MENU_ESCAPE"], "__ROUTE__ENTITY_FINISH_LATER__", "", "", Text),
    // strategy
    t("ACTION_STRATEGY_INTRO_EXPLAIN_MORE", "strategy", &["STRATEGY_MENU_INTRO"], "__ROUTE__STRATEGY_EXPLAIN_MORE__", "", "STRATEGY_MENU_ASK", Menu),
    t("ACTION_STRATEGY_ASK_3_QUESTIONS", "strategy", &["STRATEGY_MENU_ASK"], "__ROUTE__STRATEGY_ASK_3_QUESTIONS__", "", "", Text),
    t("ACTION_STRATEGY_ASK_GIVE_EXAMPLES", "strategy", &["STRATEGY_MENU_ASK"], "__ROUTE__STRATEGY_GIVE_EXAMPLES__", "", "", Menu),
    t("ACTION_STRATEGY_REFINE_EXPLAIN_MORE", "strategy", &["STRATEGY_MENU_REFINE"], "__ROUTE__STRATEGY_EXPLAIN_MORE__", "", "", Menu),
    t("ACTION_STRATEGY_QUESTIONS_EXPLAIN_MORE", "strategy", &["STRATEGY_MENU_QUESTIONS"], "__ROUTE__STRATEGY_EXPLAIN_MORE__", "", "", Menu),
    t("ACTION_STRATEGY_CONFIRM_EXPLAIN_MORE", "strategy", &["STRATEGY_MENU_CONFIRM"], "__ROUTE__STRATEGY_EXPLAIN_MORE__", "", "", Menu),
    t("ACTION_STRATEGY_CONFIRM_SATISFIED", "strategy", &["STRATEGY_MENU_CONFIRM"], "__ROUTE__STRATEGY_CONFIRM_SATISFIED__", "", "STRATEGY_MENU_FINAL_CONFIRM", Menu),
    t("ACTION_STRATEGY_FINAL_CONTINUE", "strategy", &["STRATEGY_MENU_FINAL_CONFIRM"], "yes", "targetgroup", "TARGETGROUP_MENU_INTRO", Menu),
    t("ACTION_STRATEGY_ESCAPE_CONTINUE", "strategy", &["STRATEGY_MENU_ESCAPE"], "__ROUTE__STRATEGY_CONTINUE__", "", "", Menu),
    t("ACTION_STRATEGY_ESCAPE_FINISH_LATER", "strategy", &["STRATEGY_MENU_ESCAPE"], "__ROUTE__STRATEGY_FINISH_LATER__", "", "", Text),
    // target group
    t("ACTION_TARGETGROUP_INTRO_EXPLAIN_MORE", "targetgroup", &["TARGETGROUP_MENU_INTRO"], "__ROUTE__TARGETGROUP_EXPLAIN_MORE__", "", "TARGETGROUP_MENU_EXPLAIN_MORE", Menu),
    t("ACTION_TARGETGROUP_INTRO_ASK_QUESTIONS", "targetgroup", &["TARGETGROUP_MENU_INTRO"], "__ROUTE__TARGETGROUP_ASK_QUESTIONS__", "", "", Text),
    t("ACTION_TARGETGROUP_EXPLAIN_MORE_ASK_QUESTIONS", "targetgroup", &["TARGETGROUP_MENU_EXPLAIN_MORE"], "__ROUTE__TARGETGROUP_ASK_QUESTIONS__", "", "", Text),
    t("ACTION_TARGETGROUP_POSTREFINE_CONFIRM", "targetgroup", &["TARGETGROUP_MENU_POSTREFINE"], "yes", "productsservices", "PRODUCTSSERVICES_MENU_CONFIRM", Menu),
    t("ACTION_TARGETGROUP_POSTREFINE_ASK_QUESTIONS", "targetgroup", &["TARGETGROUP_MENU_POSTREFINE"], "__ROUTE__TARGETGROUP_ASK_QUESTIONS__", "", "", Text),
    // products and services
    t("ACTION_PRODUCTSSERVICES_CONFIRM", "productsservices", &["PRODUCTSSERVICES_MENU_CONFIRM"], "yes", "rulesofthegame", "RULES_MENU_INTRO", Menu),
    // rules of the game
    t("ACTION_RULES_INTRO_EXPLAIN_MORE", "rulesofthegame", &["RULES_MENU_INTRO"], "__ROUTE__RULES_EXPLAIN_MORE__", "", "RULES_MENU_ASK_EXPLAIN", Menu),
    t("ACTION_RULES_INTRO_GIVE_EXAMPLE", "rulesofthegame", &["RULES_MENU_INTRO"], "__ROUTE__RULES_GIVE_EXAMPLE__", "", "RULES_MENU_EXAMPLE_ONLY", Menu),
    t("ACTION_RULES_ASK_EXPLAIN_MORE", "rulesofthegame", &["RULES_MENU_ASK_EXPLAIN"], "__ROUTE__RULES_EXPLAIN_MORE__", "", "", Menu),
    t("ACTION_RULES_ASK_GIVE_EXAMPLE", "rulesofthegame", &["RULES_MENU_ASK_EXPLAIN"], "__ROUTE__RULES_GIVE_EXAMPLE__", "", "RULES_MENU_EXAMPLE_ONLY", Menu),
    t("ACTION_RULES_EXAMPLE_ONLY_GIVE_EXAMPLE", "rulesofthegame", &["RULES_MENU_EXAMPLE_ONLY"], "__ROUTE__RULES_GIVE_EXAMPLE__", "", "", Menu),
    t("ACTION_RULES_REFINE_CONFIRM", "rulesofthegame", &["RULES_MENU_REFINE"], "yes", "presentation", "PRESENTATION_MENU_ASK", Menu),
    t("ACTION_RULES_REFINE_ADJUST", "rulesofthegame", &["RULES_MENU_REFINE"], "__ROUTE__RULES_ADJUST__", "", "", Text),
    t("ACTION_RULES_CONFIRM_ALL", "rulesofthegame", &["RULES_MENU_CONFIRM"], "__ROUTE__RULES_CONFIRM_ALL__", "presentation", "PRESENTATION_MENU_ASK", Menu),
    t("ACTION_RULES_CONFIRM_EXPLAIN_MORE", "rulesofthegame", &["RULES_MENU_CONFIRM"], "__ROUTE__RULES_EXPLAIN_MORE__", "", "", Menu),
    t("ACTION_RULES_CONFIRM_GIVE_EXAMPLE", "rulesofthegame", &["RULES_MENU_CONFIRM"], "__ROUTE__RULES_GIVE_EXAMPLE__", "", "", Menu),
    t("ACTION_RULES_ESCAPE_CONTINUE", "rulesofthegame", &["RULES_MENU_ESCAPE"], "__ROUTE__RULES_CONTINUE__", "", "", Menu),
    t("ACTION_RULES_ESCAPE_FINISH_LATER", "rulesofthegame", &["RULES_MENU_ESCAPE"], "__ROUTE__RULES_FINISH_LATER__", "", "", Text),
    // presentation
    t("ACTION_PRESENTATION_MAKE", "presentation", &["PRESENTATION_MENU_ASK"], "__ROUTE__PRESENTATION_MAKE__", "", "", Menu),
    t("ACTION_PRESENTATION_ESCAPE_CONTINUE", "presentation", &["PRESENTATION_MENU_ESCAPE"], "__ROUTE__PRESENTATION_CONTINUE__", "", "", Menu),
    t("ACTION_PRESENTATION_ESCAPE_FINISH_LATER", "presentation", &["PRESENTATION_MENU_ESCAPE"], "__ROUTE__PRESENTATION_FINISH_LATER__", "", "", Text),
];

/// Codes that bypass the specialist entirely: the turn engine persists the
/// pending final and advances without an LLM call.
pub const HARD_CONFIRM_CODES: &[&str] = &[
    "ACTION_STRATEGY_FINAL_CONTINUE",
    "ACTION_DREAM_REFINE_CONFIRM",
    "ACTION_DREAM_EXPLAINER_REFINE_CONFIRM",
    "ACTION_PURPOSE_REFINE_CONFIRM",
    "ACTION_PURPOSE_CONFIRM_SINGLE",
    "ACTION_BIGWHY_REFINE_CONFIRM",
    "ACTION_ROLE_REFINE_CONFIRM",
    "ACTION_ENTITY_EXAMPLE_CONFIRM",
    "ACTION_TARGETGROUP_POSTREFINE_CONFIRM",
    "ACTION_PRODUCTSSERVICES_CONFIRM",
    "ACTION_RULES_REFINE_CONFIRM",
    ACTION_CONFIRM_CONTINUE,
];

/// Every menu id the registry knows, labeled and escape alike.
pub const ALL_MENUS: &[&str] = &[
    "DREAM_MENU_INTRO",
    "DREAM_MENU_WHY",
    "DREAM_MENU_SUGGESTIONS",
    "DREAM_MENU_REFINE",
    "DREAM_MENU_ESCAPE",
    "DREAM_EXPLAINER_MENU_REFINE",
    "DREAM_EXPLAINER_MENU_ESCAPE",
    "PURPOSE_MENU_INTRO",
    "PURPOSE_MENU_EXPLAIN",
    "PURPOSE_MENU_EXAMPLES",
    "PURPOSE_MENU_REFINE",
    "PURPOSE_MENU_CONFIRM_SINGLE",
    "PURPOSE_MENU_ESCAPE",
    "BIGWHY_MENU_INTRO",
    "BIGWHY_MENU_A",
    "BIGWHY_MENU_REFINE",
    "BIGWHY_MENU_ESCAPE",
    "ROLE_MENU_INTRO",
    "ROLE_MENU_ASK",
    "ROLE_MENU_REFINE",
    "ROLE_MENU_EXAMPLES",
    "ROLE_MENU_ESCAPE",
    "ENTITY_MENU_INTRO",
    "ENTITY_MENU_FORMULATE",
    "ENTITY_MENU_EXAMPLE",
    "ENTITY_MENU_ESCAPE",
    "STRATEGY_MENU_INTRO",
    "STRATEGY_MENU_ASK",
    "STRATEGY_MENU_REFINE",
    "STRATEGY_MENU_QUESTIONS",
    "STRATEGY_MENU_CONFIRM",
    "STRATEGY_MENU_FINAL_CONFIRM",
    "STRATEGY_MENU_ESCAPE",
    "TARGETGROUP_MENU_INTRO",
    "TARGETGROUP_MENU_EXPLAIN_MORE",
    "TARGETGROUP_MENU_POSTREFINE",
    "PRODUCTSSERVICES_MENU_CONFIRM",
    "RULES_MENU_INTRO",
    "RULES_MENU_ASK_EXPLAIN",
    "RULES_MENU_EXAMPLE_ONLY",
    "RULES_MENU_REFINE",
    "RULES_MENU_CONFIRM",
    "RULES_MENU_ESCAPE",
    "PRESENTATION_MENU_ASK",
    "PRESENTATION_MENU_ESCAPE",
];

/// Action codes for a menu, in the same order as its labels. Unknown menus
/// get an empty slice.
pub fn menu_action_codes(menu_id: &str) -> &'static [&'static str] {
    match menu_id {
        "DREAM_MENU_INTRO" => &["ACTION_DREAM_INTRO_EXPLAIN_MORE", "ACTION_DREAM_INTRO_START_EXERCISE"],
        "DREAM_MENU_WHY" => &["ACTION_DREAM_WHY_GIVE_SUGGESTIONS", "ACTION_DREAM_WHY_START_EXERCISE"],
        "DREAM_MENU_SUGGESTIONS" => &["ACTION_DREAM_SUGGESTIONS_PICK_ONE", "ACTION_DREAM_SUGGESTIONS_START_EXERCISE"],
        "DREAM_MENU_REFINE" => &["ACTION_DREAM_REFINE_CONFIRM", "ACTION_DREAM_REFINE_START_EXERCISE"],
        "DREAM_MENU_ESCAPE" => &["ACTION_DREAM_ESCAPE_CONTINUE", "ACTION_DREAM_ESCAPE_FINISH_LATER"],
        "DREAM_EXPLAINER_MENU_REFINE" => &["ACTION_DREAM_EXPLAINER_REFINE_CONFIRM", "ACTION_DREAM_EXPLAINER_REFINE_ADJUST"],
        "DREAM_EXPLAINER_MENU_ESCAPE" => &["ACTION_DREAM_EXPLAINER_ESCAPE_CONTINUE", "ACTION_DREAM_EXPLAINER_ESCAPE_FINISH_LATER"],
        "PURPOSE_MENU_INTRO" => &["ACTION_PURPOSE_INTRO_EXPLAIN_MORE"],
        "PURPOSE_MENU_EXPLAIN" => &["ACTION_PURPOSE_EXPLAIN_ASK_3_QUESTIONS", "ACTION_PURPOSE_EXPLAIN_GIVE_EXAMPLES"],
        "PURPOSE_MENU_EXAMPLES" => &["ACTION_PURPOSE_EXAMPLES_ASK_3_QUESTIONS", "ACTION_PURPOSE_EXAMPLES_CHOOSE_FOR_ME"],
        "PURPOSE_MENU_REFINE" => &["ACTION_PURPOSE_REFINE_CONFIRM", "ACTION_PURPOSE_REFINE_ADJUST"],
        "PURPOSE_MENU_CONFIRM_SINGLE" => &["ACTION_PURPOSE_CONFIRM_SINGLE"],
        "PURPOSE_MENU_ESCAPE" => &["ACTION_PURPOSE_ESCAPE_CONTINUE", "ACTION_PURPOSE_ESCAPE_FINISH_LATER"],
        "BIGWHY_MENU_INTRO" => &["ACTION_BIGWHY_INTRO_GIVE_EXAMPLE", "ACTION_BIGWHY_INTRO_EXPLAIN_IMPORTANCE"],
        "BIGWHY_MENU_A" => &["ACTION_BIGWHY_A_ASK_3_QUESTIONS", "ACTION_BIGWHY_A_GIVE_EXAMPLES", "ACTION_BIGWHY_A_GIVE_EXAMPLE"],
        "BIGWHY_MENU_REFINE" => &["ACTION_BIGWHY_REFINE_CONFIRM", "ACTION_BIGWHY_REFINE_ADJUST"],
        "BIGWHY_MENU_ESCAPE" => &["ACTION_BIGWHY_ESCAPE_CONTINUE", "ACTION_BIGWHY_ESCAPE_FINISH_LATER"],
        "ROLE_MENU_INTRO" => &["ACTION_ROLE_INTRO_GIVE_EXAMPLES", "ACTION_ROLE_INTRO_EXPLAIN_MORE"],
        "ROLE_MENU_ASK" => &["ACTION_ROLE_ASK_GIVE_EXAMPLES"],
        "ROLE_MENU_REFINE" => &["ACTION_ROLE_REFINE_CONFIRM", "ACTION_ROLE_REFINE_ADJUST"],
        "ROLE_MENU_EXAMPLES" => &["ACTION_ROLE_EXAMPLES_CHOOSE_FOR_ME"],
        "ROLE_MENU_ESCAPE" => &["ACTION_ROLE_ESCAPE_CONTINUE", "ACTION_ROLE_ESCAPE_FINISH_LATER"],
        "ENTITY_MENU_INTRO" => &["ACTION_ENTITY_INTRO_FORMULATE", "ACTION_ENTITY_INTRO_EXPLAIN_MORE"],
        "ENTITY_MENU_FORMULATE" => &["ACTION_ENTITY_FORMULATE_FOR_ME"],
        "ENTITY_MENU_EXAMPLE" => &["ACTION_ENTITY_EXAMPLE_CONFIRM", "ACTION_ENTITY_EXAMPLE_REFINE"],
        "ENTITY_MENU_ESCAPE" => &["ACTION_ENTITY_ESCAPE_CONTINUE", "ACTION_ENTITY_ESCAPE_FINISH_LATER"],
        "STRATEGY_MENU_INTRO" => &["ACTION_STRATEGY_INTRO_EXPLAIN_MORE"],
        "STRATEGY_MENU_ASK" => &["ACTION_STRATEGY_ASK_3_QUESTIONS", "ACTION_STRATEGY_ASK_GIVE_EXAMPLES"],
        "STRATEGY_MENU_REFINE" => &["ACTION_STRATEGY_REFINE_EXPLAIN_MORE"],
        "STRATEGY_MENU_QUESTIONS" => &["ACTION_STRATEGY_QUESTIONS_EXPLAIN_MORE"],
        "STRATEGY_MENU_CONFIRM" => &["ACTION_STRATEGY_CONFIRM_EXPLAIN_MORE", "ACTION_STRATEGY_CONFIRM_SATISFIED"],
        "STRATEGY_MENU_FINAL_CONFIRM" => &["ACTION_STRATEGY_FINAL_CONTINUE"],
        "STRATEGY_MENU_ESCAPE" => &["ACTION_STRATEGY_ESCAPE_CONTINUE", "ACTION_STRATEGY_ESCAPE_FINISH_LATER"],
        "TARGETGROUP_MENU_INTRO" => &["ACTION_TARGETGROUP_INTRO_EXPLAIN_MORE", "ACTION_TARGETGROUP_INTRO_ASK_QUESTIONS"],
        "TARGETGROUP_MENU_EXPLAIN_MORE" => &["ACTION_TARGETGROUP_EXPLAIN_MORE_ASK_QUESTIONS"],
        "TARGETGROUP_MENU_POSTREFINE" => &["ACTION_TARGETGROUP_POSTREFINE_CONFIRM", "ACTION_TARGETGROUP_POSTREFINE_ASK_QUESTIONS"],
        "PRODUCTSSERVICES_MENU_CONFIRM" => &["ACTION_PRODUCTSSERVICES_CONFIRM"],
        "RULES_MENU_INTRO" => &["ACTION_RULES_INTRO_EXPLAIN_MORE", "ACTION_RULES_INTRO_GIVE_EXAMPLE"],
        "RULES_MENU_ASK_EXPLAIN" => &["ACTION_RULES_ASK_EXPLAIN_MORE", "ACTION_RULES_ASK_GIVE_EXAMPLE"],
        "RULES_MENU_EXAMPLE_ONLY" => &["ACTION_RULES_EXAMPLE_ONLY_GIVE_EXAMPLE"],
        "RULES_MENU_REFINE" => &["ACTION_RULES_REFINE_CONFIRM", "ACTION_RULES_REFINE_ADJUST"],
        "RULES_MENU_CONFIRM" => &["ACTION_RULES_CONFIRM_ALL", "ACTION_RULES_CONFIRM_EXPLAIN_MORE", "ACTION_RULES_CONFIRM_GIVE_EXAMPLE"],
        "RULES_MENU_ESCAPE" => &["ACTION_RULES_ESCAPE_CONTINUE", "ACTION_RULES_ESCAPE_FINISH_LATER"],
        "PRESENTATION_MENU_ASK" => &["ACTION_PRESENTATION_MAKE"],
        "PRESENTATION_MENU_ESCAPE" => &["ACTION_PRESENTATION_ESCAPE_CONTINUE", "ACTION_PRESENTATION_ESCAPE_FINISH_LATER"],
        _ => &[],
    }
}

/// Escape menus route but are never rendered from the label matrix.
pub fn is_escape_menu(menu_id: &str) -> bool {
    menu_id.ends_with("_MENU_ESCAPE")
}

pub fn all_transitions() -> &'static [MenuTransition] {
    TRANSITIONS
}

pub fn transition(code: &str) -> Option<&'static MenuTransition> {
    TRANSITIONS.iter().find(|entry| entry.code == code)
}

/// Route token for a code, covering menu entries and the free-standing
/// widget codes. Unknown codes are `None`; in widget mode the caller turns
/// that into an `unknown_actioncode` error.
pub fn route_for(code: &str) -> Option<&'static str> {
    match code {
        ACTION_TEXT_SUBMIT | ACTION_SUBMIT_SCORES | ACTION_WORDING_PICK_USER
        | ACTION_WORDING_PICK_SUGGESTION => Some(""),
        ACTION_CONFIRM_CONTINUE | ACTION_STEP0_READY_START => Some("yes"),
        ACTION_DREAM_SWITCH_TO_SELF => Some(SWITCH_TO_SELF_DREAM_TOKEN),
        _ => transition(code).map(|entry| entry.route),
    }
}

/// Whether a known code commits the step's wording. Unknown codes are never
/// confirm.
pub fn is_confirm_code(code: &str) -> bool {
    let Some(route) = route_for(code) else {
        return false;
    };
    if code == ACTION_CONFIRM_CONTINUE || route == "yes" {
        return true;
    }
    code.contains("_CONFIRM") || code.contains("FINAL_CONTINUE")
}

/// Whether the engine resolves this code without calling a specialist.
pub fn is_hard_confirm_code(code: &str) -> bool {
    HARD_CONFIRM_CODES.contains(&code)
}

/// Shape check for `ACTION_*` codes: uppercase alphanumerics and
/// underscores after the prefix.
pub fn is_action_code(token: &str) -> bool {
    let Some(rest) = token.strip_prefix("ACTION_") else {
        return false;
    };
    !rest.is_empty() && rest.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Shape check for `__ROUTE__*__` tokens.
pub fn is_route_token(token: &str) -> bool {
    let Some(rest) = token.strip_prefix("__ROUTE__") else {
        return false;
    };
    let Some(body) = rest.strip_suffix("__") else {
        return false;
    };
    !body.is_empty() && body.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StepId;
    use std::collections::BTreeSet;

    #[test]
    fn codes_are_unique_and_well_formed() {
        let mut seen = BTreeSet::new();
        for entry in all_transitions() {
            assert!(is_action_code(entry.code), "bad code shape: {}", entry.code);
            assert!(seen.insert(entry.code), "duplicate code: {}", entry.code);
        }
    }

    #[test]
    fn every_route_is_yes_or_a_route_token() {
        for entry in all_transitions() {
            assert!(
                entry.route == "yes" || is_route_token(entry.route),
                "{} has malformed route {}",
                entry.code,
                entry.route
            );
        }
    }

    #[test]
    fn steps_and_targets_resolve() {
        for entry in all_transitions() {
            assert!(
                StepId::parse(entry.step).is_some(),
                "{} names unknown step {}",
                entry.code,
                entry.step
            );
            if !entry.to_step.is_empty() {
                assert!(
                    StepId::parse(entry.to_step).is_some(),
                    "{} names unknown to_step {}",
                    entry.code,
                    entry.to_step
                );
            }
            if !entry.to_menu.is_empty() {
                assert!(
                    !menu_action_codes(entry.to_menu).is_empty(),
                    "{} names unknown to_menu {}",
                    entry.code,
                    entry.to_menu
                );
            }
        }
    }

    #[test]
    fn from_menus_and_menu_lists_agree() {
        for entry in all_transitions() {
            assert!(!entry.from_menus.is_empty(), "{} has no menus", entry.code);
            for menu in entry.from_menus {
                assert!(
                    menu_action_codes(menu).contains(&entry.code),
                    "{} missing from menu list of {}",
                    entry.code,
                    menu
                );
            }
        }
        for menu in ALL_MENUS {
            for code in menu_action_codes(menu) {
                let entry = transition(code)
                    .unwrap_or_else(|| panic!("menu {menu} lists unknown code {code}"));
                assert!(
                    entry.from_menus.contains(menu),
                    "{code} does not declare {menu} in from_menus"
                );
            }
        }
    }

    #[test]
    fn labeled_menus_keep_label_code_parity() {
        for menu in ALL_MENUS {
            let codes = menu_action_codes(menu);
            assert!(!codes.is_empty(), "registry menu {menu} has no codes");
            match menu_labels(menu) {
                Some(labels) => assert_eq!(
                    labels.len(),
                    codes.len(),
                    "label/code parity broken for {menu}"
                ),
                None => assert!(
                    is_escape_menu(menu),
                    "non-escape menu {menu} is missing labels"
                ),
            }
        }
    }

    #[test]
    fn every_labeled_matrix_menu_is_in_the_registry() {
        for menu in ALL_MENUS {
            if !is_escape_menu(menu) {
                assert!(menu_labels(menu).is_some(), "{menu} missing from matrix");
            }
        }
    }

    #[test]
    fn hard_confirm_codes_route_to_yes() {
        for code in HARD_CONFIRM_CODES {
            assert_eq!(
                route_for(code),
                Some("yes"),
                "{code} should resolve to the yes route"
            );
            assert!(is_confirm_code(code));
        }
    }

    #[test]
    fn confirm_classification_matches_code_names() {
        assert!(is_confirm_code("ACTION_DREAM_REFINE_CONFIRM"));
        assert!(is_confirm_code("ACTION_STRATEGY_FINAL_CONTINUE"));
        assert!(is_confirm_code("ACTION_STRATEGY_CONFIRM_SATISFIED"));
        assert!(is_confirm_code(ACTION_STEP0_READY_START));
        assert!(!is_confirm_code("ACTION_DREAM_INTRO_EXPLAIN_MORE"));
        assert!(!is_confirm_code("ACTION_RULES_ASK_GIVE_EXAMPLE"));
        assert!(!is_confirm_code("ACTION_TOTALLY_UNKNOWN"));
    }

    #[test]
    fn special_codes_resolve_without_menus() {
        assert_eq!(route_for(ACTION_TEXT_SUBMIT), Some(""));
        assert_eq!(route_for(ACTION_SUBMIT_SCORES), Some(""));
        assert_eq!(route_for(ACTION_WORDING_PICK_USER), Some(""));
        assert_eq!(route_for(ACTION_CONFIRM_CONTINUE), Some("yes"));
        assert_eq!(route_for(ACTION_STEP0_READY_START), Some("yes"));
        assert_eq!(
            route_for(ACTION_DREAM_SWITCH_TO_SELF),
            Some(SWITCH_TO_SELF_DREAM_TOKEN)
        );
        assert_eq!(route_for("ACTION_NOT_IN_REGISTRY"), None);
    }

    #[test]
    fn token_shape_predicates() {
        assert!(is_action_code("ACTION_DREAM_REFINE_CONFIRM"));
        assert!(!is_action_code("ACTION_"));
        assert!(!is_action_code("action_dream"));
        assert!(!is_action_code("ACTION_lower_case"));
        assert!(is_route_token("__ROUTE__DREAM_EXPLAIN_MORE__"));
        assert!(!is_route_token("__ROUTE____"));
        assert!(!is_route_token("__ROUTE__abc__"));
        assert!(!is_route_token("ROUTE__DREAM__"));
    }

    #[test]
    fn menu_census_matches_transition_table() {
        let mut from_table: BTreeSet<&str> = BTreeSet::new();
        for entry in all_transitions() {
            from_table.extend(entry.from_menus.iter().copied());
        }
        let listed: BTreeSet<&str> = ALL_MENUS.iter().copied().collect();
        assert_eq!(from_table, listed, "ALL_MENUS is out of date");
    }
}
