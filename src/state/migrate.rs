//! Versioned migration of older state blobs.
//!
//! Migration is deterministic, side-effect free and total: the worst input
//! still produces a usable default state. A blob without a version tag is
//! treated as current and only normalized.

use serde_json::Value;

use crate::state::model::{CanvasState, CURRENT_STATE_VERSION};
use crate::state::normalize::normalize;

/// Brings any state blob up to [`CURRENT_STATE_VERSION`]. Never fails.
pub fn migrate(raw: &Value) -> CanvasState {
    let mut state = normalize(raw);

    loop {
        match state.state_version.as_str() {
            CURRENT_STATE_VERSION => return state,

            // v3 -> v4: hard reset. The v4 layout changed how confirms and
            // proceeds are tracked, so old progress fields are unreliable.
            // Only the language preferences carry over.
            "3" => {
                tracing::info!(from = "3", "resetting legacy session state");
                let mut fresh = CanvasState::default();
                fresh.language = state.language;
                fresh.language_locked = state.language_locked;
                fresh.language_override = state.language_override;
                fresh.ui_strings = state.ui_strings;
                fresh.ui_strings_lang = state.ui_strings_lang;
                return fresh;
            }

            // v2 -> v3 added targetgroup_final and productsservices_final;
            // normalization already materializes those fields.
            "2" => {
                state.state_version = "3".to_string();
            }

            // v1 (or any unrecognized tag) -> v2 added the language fields
            // and the later finals, all materialized by normalization.
            _ => {
                tracing::info!(from = %state.state_version, "migrating legacy session state");
                state.state_version = "2".to_string();
            }
        }
    }
}
