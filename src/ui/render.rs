//! Turn rendering: the text block, the prompt line, and the ui payload.
//!
//! Render order is strict: message, then `refined_formulation` unless the
//! message already contains it, then the question as a fallback. The ui
//! payload only appears when the reply names a menu the registry resolves;
//! a menu id the registry does not know degrades to plain text rendering.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::specialists::output::SpecialistReply;
use crate::ui::actions::menu_action_codes;

/// Widget hints attached to a turn, keyed by flag name.
pub type UiFlags = BTreeMap<String, bool>;

/// The `ui` object on a turn response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_codes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_choice_count: Option<usize>,
    #[serde(default)]
    pub flags: UiFlags,
}

/// Body text for the widget.
pub fn compose_text(reply: &SpecialistReply) -> String {
    let mut parts: Vec<&str> = Vec::new();

    let message = reply.message().trim();
    let refined = reply.refined_formulation().trim();
    if !message.is_empty() {
        parts.push(message);
    }
    if !refined.is_empty() && !normalized(message).contains(&normalized(refined)) {
        parts.push(refined);
    }
    if parts.is_empty() {
        let question = reply.question().trim();
        if !question.is_empty() {
            parts.push(question);
        }
    }

    parts.join("\n\n").trim().to_string()
}

/// The single prompt line under the body: confirmation question first.
pub fn pick_prompt(reply: &SpecialistReply) -> String {
    let confirm = reply.confirmation_question().trim();
    if !confirm.is_empty() {
        return confirm.to_string();
    }
    reply.question().trim().to_string()
}

/// Builds the ui payload for a resolved menu id. A resolvable menu carries
/// its action codes; otherwise only non-empty flags justify a payload.
pub fn build_ui_payload(menu_id: &str, flags: UiFlags) -> Option<UiPayload> {
    let menu_id = menu_id.trim();
    if !menu_id.is_empty() {
        let codes = menu_action_codes(menu_id);
        if !codes.is_empty() {
            return Some(UiPayload {
                action_codes: Some(codes.iter().map(|code| code.to_string()).collect()),
                expected_choice_count: Some(codes.len()),
                flags,
            });
        }
        tracing::warn!(menu_id, "menu id not in registry, rendering without menu");
    }
    if !flags.is_empty() {
        return Some(UiPayload {
            action_codes: None,
            expected_choice_count: None,
            flags,
        });
    }
    None
}

fn normalized(text: &str) -> String {
    text.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}
