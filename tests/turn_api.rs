//! End-to-end tests of the HTTP surface against a scripted provider.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use canvas_coach::config::CoachConfig;
use canvas_coach::engine::TurnEngine;
use canvas_coach::error::LlmError;
use canvas_coach::llm::{CompletionRequest, CompletionResponse, LlmProvider, TokenUsage};
use canvas_coach::routes::router;

struct Scripted {
    replies: Mutex<VecDeque<String>>,
    calls: Mutex<usize>,
}

impl Scripted {
    fn new(replies: &[String]) -> Arc<Scripted> {
        Arc::new(Scripted {
            replies: Mutex::new(replies.iter().cloned().collect()),
            calls: Mutex::new(0),
        })
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl LlmProvider for Scripted {
    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        *self.calls.lock().unwrap() += 1;
        let content = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "{}".to_string());
        Ok(CompletionResponse {
            content,
            usage: Some(TokenUsage {
                input_tokens: 50,
                output_tokens: 10,
            }),
        })
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-1"
    }
}

async fn serve(provider: Arc<Scripted>) -> String {
    let config = CoachConfig {
        llm_timeout: Duration::from_secs(2),
        ..CoachConfig::default()
    };
    let engine = Arc::new(TurnEngine::new(provider, config));
    let app = router(engine);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn health_and_registry_describe_the_contract() {
    let base = serve(Scripted::new(&[])).await;
    let client = reqwest::Client::new();

    let health: Value = client
        .get(format!("{base}/api/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    let registry: Value = client
        .get(format!("{base}/api/registry"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(registry["registry_version"]
        .as_str()
        .unwrap()
        .contains("actioncode-registry"));
    assert!(registry["ui_contract_version"]
        .as_str()
        .unwrap()
        .contains("ux-contract"));
    let intro = &registry["menus"]["DREAM_MENU_INTRO"];
    assert_eq!(intro["action_codes"].as_array().unwrap().len(), 2);
    assert_eq!(intro["labels"].as_array().unwrap().len(), 2);
    // Escape menus route only and publish no labels.
    let escape = &registry["menus"]["DREAM_MENU_ESCAPE"];
    assert!(escape.get("labels").is_none());
    assert!(!escape["action_codes"].as_array().unwrap().is_empty());
    // Every published code resolves to a typed intent.
    assert!(registry["intents"]["ACTION_TEXT_SUBMIT"].is_object());
    assert!(registry["intents"]["ACTION_DREAM_REFINE_CONFIRM"].is_object());
}

#[tokio::test]
async fn empty_first_turn_returns_the_start_hint() {
    let provider = Scripted::new(&[]);
    let base = serve(provider.clone()).await;
    let response: Value = reqwest::Client::new()
        .post(format!("{base}/api/turn"))
        .json(&json!({"current_step_id": "step_0", "user_message": ""}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(response["ok"], true);
    assert_eq!(response["current_step_id"], "step_0");
    assert_eq!(response["text"], "");
    assert_eq!(response["prompt"], "Click Start to begin.");
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn unknown_action_code_in_widget_mode_is_a_typed_failure() {
    let provider = Scripted::new(&[]);
    let base = serve(provider.clone()).await;
    let result = reqwest::Client::new()
        .post(format!("{base}/api/turn"))
        .json(&json!({
            "current_step_id": "dream",
            "user_message": "ACTION_NOT_A_REAL_CODE",
            "input_mode": "widget",
            "state": {
                "state_version": "4",
                "current_step": "dream",
                "intro_shown_session": "true",
            },
        }))
        .send()
        .await
        .unwrap();
    // Turn failures still answer 200; the body carries the error.
    assert_eq!(result.status(), reqwest::StatusCode::OK);
    let response: Value = result.json().await.unwrap();
    assert_eq!(response["ok"], false);
    assert_eq!(response["error"]["type"], "unknown_actioncode");
    assert_eq!(response["error"]["retry_action"], "retry_same_action");
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn malformed_model_output_fails_the_turn_with_the_entry_state() {
    let provider = Scripted::new(&["not json".to_string(), "{\"broken\"".to_string()]);
    let base = serve(provider.clone()).await;
    let response: Value = reqwest::Client::new()
        .post(format!("{base}/api/turn"))
        .json(&json!({
            "current_step_id": "purpose",
            "user_message": "help me with the purpose",
            "state": {
                "state_version": "4",
                "current_step": "purpose",
                "intro_shown_session": "true",
                "dream_final": "A world that rests.",
                "last_specialist_result": {"action": "ASK", "question": "?"},
            },
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(response["ok"], false);
    // One strict call, one repair attempt.
    assert_eq!(provider.calls(), 2);
    assert_eq!(response["error"]["type"], "invalid_model_output");
    assert_eq!(response["state"]["dream_final"], "A world that rests.");
    assert_eq!(response["current_step_id"], "purpose");
}

#[tokio::test]
async fn a_specialist_turn_round_trips_state_and_ui() {
    let reply = json!({
        "action": "INTRO",
        "message": "The dream is the change you want to see in the world.",
        "question": "1) Tell me more\n2) Do the exercise",
        "refined_formulation": "",
        "confirmation_question": "",
        "dream": "",
        "menu_id": "DREAM_MENU_INTRO",
        "suggest_dreambuilder": "false",
        "proceed_to_dream": "false",
        "proceed_to_purpose": "false",
        "wants_recap": false,
        "is_offtopic": false,
    })
    .to_string();
    let provider = Scripted::new(&[reply]);
    let base = serve(provider.clone()).await;
    let response: Value = reqwest::Client::new()
        .post(format!("{base}/api/turn"))
        .json(&json!({
            "current_step_id": "dream",
            "user_message": "let's talk about the dream",
            "state": {
                "state_version": "4",
                "current_step": "dream",
                "intro_shown_session": "true",
                "step_0_final": "Venture: bakery | Name: TBD | Status: starting",
            },
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(response["ok"], true);
    assert_eq!(provider.calls(), 1);
    assert_eq!(response["current_step_id"], "dream");
    assert_eq!(response["active_specialist"], "Dream");
    assert!(response["text"]
        .as_str()
        .unwrap()
        .contains("change you want to see"));
    // The intro menu resolves to concrete widget action codes.
    let codes = response["ui"]["action_codes"].as_array().unwrap();
    assert_eq!(codes.len(), 2);
    assert!(codes[0].as_str().unwrap().starts_with("ACTION_DREAM_INTRO"));
    // The intro is marked consumed in the returned state.
    assert_eq!(response["state"]["intro_shown_for_step"], "dream");
}
