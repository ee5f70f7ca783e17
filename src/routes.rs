//! HTTP surface: one turn endpoint plus the widget contract endpoints.
//!
//! `/api/turn` always answers HTTP 200; turn failures are carried in the
//! body as `ok:false` with a typed error. The registry endpoint publishes
//! the menu and action-code tables so a widget build can verify it speaks
//! the same contract version as the server.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::engine::{TurnEngine, TurnRequest, TurnResponse};
use crate::ui::actions::{
    self, ACTION_DREAM_SWITCH_TO_SELF, ACTION_SUBMIT_SCORES, ACTION_TEXT_SUBMIT,
    ACTION_WORDING_PICK_SUGGESTION, ACTION_WORDING_PICK_USER, ALL_MENUS,
};
use crate::ui::{intent_for, menu_labels, REGISTRY_VERSION, UI_CONTRACT_VERSION};

#[derive(Clone)]
pub struct RouteState {
    pub engine: Arc<TurnEngine>,
}

/// Builds the application router.
pub fn router(engine: Arc<TurnEngine>) -> Router {
    Router::new()
        .route("/api/turn", post(turn))
        .route("/api/registry", get(registry))
        .route("/api/health", get(health))
        .with_state(RouteState { engine })
        .layer(CorsLayer::permissive())
}

async fn turn(
    State(state): State<RouteState>,
    Json(request): Json<TurnRequest>,
) -> Json<TurnResponse> {
    Json(state.engine.run_turn(request).await)
}

async fn registry() -> Json<Value> {
    let mut menus = serde_json::Map::new();
    for menu_id in ALL_MENUS {
        let mut entry = serde_json::Map::new();
        entry.insert(
            "action_codes".to_string(),
            Value::from(actions::menu_action_codes(menu_id).to_vec()),
        );
        if let Some(labels) = menu_labels(menu_id) {
            entry.insert("labels".to_string(), Value::from(labels.to_vec()));
        }
        menus.insert((*menu_id).to_string(), Value::Object(entry));
    }
    let mut intents = serde_json::Map::new();
    let special = [
        ACTION_TEXT_SUBMIT,
        ACTION_SUBMIT_SCORES,
        ACTION_WORDING_PICK_USER,
        ACTION_WORDING_PICK_SUGGESTION,
        ACTION_DREAM_SWITCH_TO_SELF,
    ];
    for code in special
        .into_iter()
        .chain(actions::all_transitions().iter().map(|entry| entry.code))
    {
        let intent = serde_json::to_value(intent_for(code)).unwrap_or(Value::Null);
        intents.insert(code.to_string(), intent);
    }
    Json(json!({
        "registry_version": REGISTRY_VERSION,
        "ui_contract_version": UI_CONTRACT_VERSION,
        "menus": menus,
        "intents": intents,
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
