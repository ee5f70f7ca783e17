//! The widget contract: menu registry, action codes, intents and rendering.
//!
//! Everything the frontend can show or send lives here. Menus are static
//! tables keyed by menu id, action codes resolve through a single
//! transition registry, and [`render`] turns a specialist reply into the
//! text, prompt and ui payload of a turn response. The registry version is
//! pinned so a stale widget build can be detected server-side.

pub mod actions;
pub mod intents;
pub mod menus;
pub mod render;

pub use actions::{
    is_action_code, is_confirm_code, is_hard_confirm_code, route_for, MenuTransition,
    RenderMode, REGISTRY_VERSION,
};
pub use intents::{intent_for, StepIntent, TransitionEvent};
pub use menus::{
    contract_id, default_menu, menu_labels, status_for, TurnOutputStatus, UI_CONTRACT_VERSION,
};
pub use render::{build_ui_payload, compose_text, pick_prompt, UiFlags, UiPayload};
