//! Client-held session state for the guided canvas conversation.
//!
//! The browser widget stores this blob between turns and sends it back with
//! every request. Scalar fields stay strings on the wire (booleans are the
//! exact strings `"true"` / `"false"`); [`normalize`](super::normalize)
//! rebuilds a well-formed value from whatever the client sent.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Version stamp written into every state blob this build produces.
pub const CURRENT_STATE_VERSION: &str = "4";

/// Wire keys that ride along in the state map but are not session state.
pub mod wire_keys {
    pub const UI_TELEMETRY: &str = "__ui_telemetry";
    pub const TEXT_SUBMIT: &str = "__text_submit";
    pub const PENDING_SCORES: &str = "__pending_scores";
    pub const DREAM_RUNTIME_MODE: &str = "__dream_runtime_mode";
}

/// The canonical steps of the canvas, in walk order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum StepId {
    #[default]
    #[serde(rename = "step_0")]
    Step0,
    #[serde(rename = "dream")]
    Dream,
    #[serde(rename = "purpose")]
    Purpose,
    #[serde(rename = "bigwhy")]
    BigWhy,
    #[serde(rename = "role")]
    Role,
    #[serde(rename = "entity")]
    Entity,
    #[serde(rename = "strategy")]
    Strategy,
    #[serde(rename = "targetgroup")]
    TargetGroup,
    #[serde(rename = "productsservices")]
    ProductsServices,
    #[serde(rename = "rulesofthegame")]
    RulesOfTheGame,
    #[serde(rename = "presentation")]
    Presentation,
}

impl StepId {
    pub const ALL: [StepId; 11] = [
        StepId::Step0,
        StepId::Dream,
        StepId::Purpose,
        StepId::BigWhy,
        StepId::Role,
        StepId::Entity,
        StepId::Strategy,
        StepId::TargetGroup,
        StepId::ProductsServices,
        StepId::RulesOfTheGame,
        StepId::Presentation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
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
            StepId::Presentation => "presentation",
        }
    }

    /// Parses a wire step id. Unknown strings are `None`; callers clamp to
    /// [`StepId::Step0`].
    pub fn parse(raw: &str) -> Option<StepId> {
        StepId::ALL.iter().copied().find(|s| s.as_str() == raw)
    }

    /// The following canonical step. The last step stays put.
    pub fn next(&self) -> StepId {
        let idx = StepId::ALL.iter().position(|s| s == self).unwrap_or(0);
        StepId::ALL[(idx + 1).min(StepId::ALL.len() - 1)]
    }

    /// Human label used in headlines and recaps.
    pub fn label(&self) -> &'static str {
        match self {
            StepId::Step0 => "Verification",
            StepId::Dream => "Dream",
            StepId::Purpose => "Purpose",
            StepId::BigWhy => "Big Why",
            StepId::Role => "Role",
            StepId::Entity => "Entity",
            StepId::Strategy => "Strategy",
            StepId::TargetGroup => "Target Group",
            StepId::ProductsServices => "Products and Services",
            StepId::RulesOfTheGame => "Rules of the Game",
            StepId::Presentation => "Presentation",
        }
    }

    /// State key holding this step's persisted final.
    pub fn final_key(&self) -> &'static str {
        match self {
            StepId::Step0 => "step_0_final",
            StepId::Dream => "dream_final",
            StepId::Purpose => "purpose_final",
            StepId::BigWhy => "bigwhy_final",
            StepId::Role => "role_final",
            StepId::Entity => "entity_final",
            StepId::Strategy => "strategy_final",
            StepId::TargetGroup => "targetgroup_final",
            StepId::ProductsServices => "productsservices_final",
            StepId::RulesOfTheGame => "rulesofthegame_final",
            StepId::Presentation => "presentation_brief_final",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which variant of the dream step the session is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DreamRuntimeMode {
    /// The user writes the dream in their own words.
    #[default]
    #[serde(rename = "self")]
    SelfAuthored,
    /// Dream builder: collecting raw statements.
    BuilderCollect,
    /// Dream builder: the widget is scoring collected statements.
    BuilderScoring,
    /// Dream builder: refining the drafted wording.
    BuilderRefine,
}

impl DreamRuntimeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DreamRuntimeMode::SelfAuthored => "self",
            DreamRuntimeMode::BuilderCollect => "builder_collect",
            DreamRuntimeMode::BuilderScoring => "builder_scoring",
            DreamRuntimeMode::BuilderRefine => "builder_refine",
        }
    }

    /// Parses the wire value, clamping anything unknown to `SelfAuthored`.
    pub fn parse(raw: &str) -> DreamRuntimeMode {
        match raw {
            "builder_collect" => DreamRuntimeMode::BuilderCollect,
            "builder_scoring" => DreamRuntimeMode::BuilderScoring,
            "builder_refine" => DreamRuntimeMode::BuilderRefine,
            _ => DreamRuntimeMode::SelfAuthored,
        }
    }
}

impl fmt::Display for DreamRuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The full session blob. See the module docs for wire conventions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CanvasState {
    pub state_version: String,
    pub current_step: StepId,
    pub active_specialist: String,
    /// Step id whose intro was already delivered, or "".
    pub intro_shown_for_step: String,
    pub intro_shown_session: String,
    pub language: String,
    pub language_locked: String,
    pub language_override: String,
    pub ui_strings: BTreeMap<String, String>,
    pub ui_strings_lang: String,
    /// Previous specialist reply, kept verbatim for routing. Always a JSON
    /// object after normalization.
    pub last_specialist_result: serde_json::Value,
    pub step_0_final: String,
    pub dream_final: String,
    pub purpose_final: String,
    pub bigwhy_final: String,
    pub role_final: String,
    pub entity_final: String,
    pub strategy_final: String,
    pub targetgroup_final: String,
    pub productsservices_final: String,
    pub rulesofthegame_final: String,
    pub presentation_brief_final: String,
    /// Step id -> unconfirmed draft text. Empty drafts are dropped.
    pub provisional_by_step: BTreeMap<String, String>,
    #[serde(rename = "__dream_runtime_mode")]
    pub dream_runtime_mode: DreamRuntimeMode,
    pub dream_builder_statements: Vec<String>,
    pub business_name: String,
    pub summary_target: String,
}

impl Default for CanvasState {
    fn default() -> Self {
        CanvasState {
            state_version: CURRENT_STATE_VERSION.to_string(),
            current_step: StepId::Step0,
            active_specialist: String::new(),
            intro_shown_for_step: String::new(),
            intro_shown_session: String::new(),
            language: String::new(),
            language_locked: String::new(),
            language_override: String::new(),
            ui_strings: BTreeMap::new(),
            ui_strings_lang: String::new(),
            last_specialist_result: serde_json::Value::Object(serde_json::Map::new()),
            step_0_final: String::new(),
            dream_final: String::new(),
            purpose_final: String::new(),
            bigwhy_final: String::new(),
            role_final: String::new(),
            entity_final: String::new(),
            strategy_final: String::new(),
            targetgroup_final: String::new(),
            productsservices_final: String::new(),
            rulesofthegame_final: String::new(),
            presentation_brief_final: String::new(),
            provisional_by_step: BTreeMap::new(),
            dream_runtime_mode: DreamRuntimeMode::SelfAuthored,
            dream_builder_statements: Vec::new(),
            business_name: "TBD".to_string(),
            summary_target: "unknown".to_string(),
        }
    }
}

/// Keys that make up the canonical finals snapshot, in walk order.
pub const FINALS_KEYS: [&str; 12] = [
    "business_name",
    "step_0_final",
    "dream_final",
    "purpose_final",
    "bigwhy_final",
    "role_final",
    "entity_final",
    "strategy_final",
    "targetgroup_final",
    "productsservices_final",
    "rulesofthegame_final",
    "presentation_brief_final",
];

impl CanvasState {
    pub fn final_for(&self, step: StepId) -> &str {
        match step {
            StepId::Step0 => &self.step_0_final,
            StepId::Dream => &self.dream_final,
            StepId::Purpose => &self.purpose_final,
            StepId::BigWhy => &self.bigwhy_final,
            StepId::Role => &self.role_final,
            StepId::Entity => &self.entity_final,
            StepId::Strategy => &self.strategy_final,
            StepId::TargetGroup => &self.targetgroup_final,
            StepId::ProductsServices => &self.productsservices_final,
            StepId::RulesOfTheGame => &self.rulesofthegame_final,
            StepId::Presentation => &self.presentation_brief_final,
        }
    }

    pub fn set_final_for(&mut self, step: StepId, value: String) {
        match step {
            StepId::Step0 => self.step_0_final = value,
            StepId::Dream => self.dream_final = value,
            StepId::Purpose => self.purpose_final = value,
            StepId::BigWhy => self.bigwhy_final = value,
            StepId::Role => self.role_final = value,
            StepId::Entity => self.entity_final = value,
            StepId::Strategy => self.strategy_final = value,
            StepId::TargetGroup => self.targetgroup_final = value,
            StepId::ProductsServices => self.productsservices_final = value,
            StepId::RulesOfTheGame => self.rulesofthegame_final = value,
            StepId::Presentation => self.presentation_brief_final = value,
        }
    }

    /// Non-empty finals in canonical order. `business_name` is omitted while
    /// it is still the `"TBD"` placeholder.
    pub fn finals_snapshot(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        let name = self.business_name.trim();
        if !name.is_empty() && name != "TBD" {
            out.push(("business_name", name.to_string()));
        }
        for step in StepId::ALL {
            let value = self.final_for(step).trim();
            if !value.is_empty() {
                out.push((step.final_key(), value.to_string()));
            }
        }
        out
    }

    /// Sets the current step, clamping unknown ids to `step_0`.
    pub fn set_current_step(&mut self, raw: &str) {
        self.current_step = StepId::parse(raw).unwrap_or(StepId::Step0);
    }

    pub fn mark_session_intro_shown(&mut self) {
        self.intro_shown_session = "true".to_string();
    }

    /// Records that a step intro was delivered. Unknown ids clamp to the
    /// current step.
    pub fn mark_step_intro_shown(&mut self, raw: &str) {
        self.intro_shown_for_step = match StepId::parse(raw) {
            Some(step) => step.as_str().to_string(),
            None => self.current_step.as_str().to_string(),
        };
    }

    /// Persists the verification final and the business name, keeping the
    /// previous values when the new ones are empty.
    pub fn persist_step0(&mut self, final_text: &str, business_name: &str) {
        let value = final_text.trim();
        if !value.is_empty() {
            self.step_0_final = value.to_string();
        }
        let name = business_name.trim();
        if !name.is_empty() {
            self.business_name = name.to_string();
        }
    }

    /// Persists the dream final, keeping the previous value when empty.
    pub fn persist_dream(&mut self, final_text: &str) {
        let value = final_text.trim();
        if !value.is_empty() {
            self.dream_final = value.to_string();
        }
    }
}
