//! Strict JSON specialist calls.
//!
//! One call is: compose instructions (glossary prefix + step envelope +
//! schema block), complete once, pull the outermost JSON object out of the
//! text, validate against the reply schema. If validation fails, exactly one
//! repair pass runs at temperature 0.0 with the violation quoted back to the
//! model. A second failure surfaces as [`LlmError::InvalidResponse`]; there
//! are no transport retries at this layer.

use std::time::Duration;

use serde_json::Value;
use uuid::Uuid;

use crate::error::LlmError;
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider, TokenUsage};
use crate::specialists::output::SpecialistReply;
use crate::specialists::prompts;
use crate::specialists::schema::ReplySchema;

const PREVIEW_CHARS: usize = 160;

pub const REPAIR_INSTRUCTION: &str = r#"REPAIR MODE (HARD)
- You must fix the JSON to match the schema exactly.
- Output ONLY valid JSON. No extra keys. No markdown. No commentary.
- All fields required; never output null; use "".
- Enums must match exactly (including casing).
- proceed flags must be strings ("true"/"false") as specified."#;

/// One schema-bound call.
#[derive(Debug, Clone)]
pub struct StrictCall {
    pub schema: ReplySchema,
    pub instructions: String,
    pub input: String,
    pub temperature: f64,
    pub max_output_tokens: u64,
    pub timeout: Duration,
}

/// A validated reply plus call accounting for the session report.
#[derive(Debug, Clone)]
pub struct StrictOutcome {
    pub reply: SpecialistReply,
    pub raw_text: String,
    pub attempts: u32,
    pub usage: Option<TokenUsage>,
}

fn truncate_preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

/// Pulls the outermost `{...}` object out of model output. Tolerates prose
/// and markdown fences around the object.
fn extract_json(text: &str) -> Result<Value, String> {
    let start = text
        .find('{')
        .ok_or_else(|| "no JSON object in output".to_string())?;
    let end = text
        .rfind('}')
        .ok_or_else(|| "no closing brace in output".to_string())?;
    if end < start {
        return Err("no JSON object in output".to_string());
    }
    serde_json::from_str(&text[start..=end]).map_err(|e| format!("invalid JSON: {e}"))
}

fn schema_block(schema: &ReplySchema) -> String {
    format!(
        "OUTPUT SCHEMA (HARD)\n\
         Return ONLY one JSON object that validates against this JSON Schema. No markdown fences. No commentary.\n\
         {}",
        schema.json_schema()
    )
}

fn parse_and_validate(schema: &ReplySchema, text: &str) -> Result<Value, String> {
    let raw = extract_json(text)?;
    schema.validate(&raw).map_err(|v| v.to_string())
}

async fn complete_once(
    provider: &dyn LlmProvider,
    instructions: &str,
    input: &str,
    temperature: f64,
    max_output_tokens: u64,
    timeout: Duration,
) -> Result<(String, Option<TokenUsage>), LlmError> {
    let request = CompletionRequest::new(vec![
        ChatMessage::system(instructions),
        ChatMessage::user(input),
    ])
    .with_temperature(temperature)
    .with_max_tokens(max_output_tokens);

    let response = tokio::time::timeout(timeout, provider.complete(request))
        .await
        .map_err(|_| LlmError::Timeout {
            provider: provider.provider_name().to_string(),
            timeout,
        })??;

    Ok((response.content, response.usage))
}

/// Runs one strict call against a provider.
pub async fn call_strict(
    provider: &dyn LlmProvider,
    call: StrictCall,
) -> Result<StrictOutcome, LlmError> {
    let instructions = format!(
        "{}{}\n\n{}",
        prompts::glossary_prefix(),
        call.instructions,
        schema_block(&call.schema)
    );

    let (text1, usage1) = complete_once(
        provider,
        &instructions,
        &call.input,
        call.temperature,
        call.max_output_tokens,
        call.timeout,
    )
    .await?;

    let reason1 = match parse_and_validate(&call.schema, &text1) {
        Ok(valid) => {
            return Ok(StrictOutcome {
                reply: SpecialistReply::from_value(valid),
                raw_text: text1,
                attempts: 1,
                usage: usage1,
            });
        }
        Err(reason) => reason,
    };

    tracing::warn!(
        schema = call.schema.name,
        reason = %reason1,
        "specialist output failed validation, running repair pass"
    );

    let repair_instructions = format!("{instructions}\n\n{REPAIR_INSTRUCTION}");
    let repair_input = format!(
        "The previous output did not validate against the schema.\n\
         \n\
         SCHEMA_ERROR:\n\
         {reason1}\n\
         \n\
         INVALID_JSON_OUTPUT:\n\
         {text1}\n\
         \n\
         Now return a corrected JSON output that matches the schema exactly."
    );

    let (text2, usage2) = complete_once(
        provider,
        &repair_instructions,
        &repair_input,
        0.0,
        call.max_output_tokens,
        call.timeout,
    )
    .await?;

    let usage = TokenUsage::combine(usage1, usage2);
    match parse_and_validate(&call.schema, &text2) {
        Ok(valid) => Ok(StrictOutcome {
            reply: SpecialistReply::from_value(valid),
            raw_text: text2,
            attempts: 2,
            usage,
        }),
        Err(reason2) => Err(LlmError::InvalidResponse {
            provider: provider.provider_name().to_string(),
            response_id: Uuid::new_v4(),
            preview: truncate_preview(&text2),
            reason: reason2,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::llm::provider::CompletionResponse;
    use crate::specialists::schema::{FieldKind, FieldSpec};

    const TEST_FIELDS: &[FieldSpec] = &[
        FieldSpec {
            name: "action",
            kind: FieldKind::Enum(&["ASK", "CONFIRM"]),
            required: true,
        },
        FieldSpec {
            name: "message",
            kind: FieldKind::Text,
            required: true,
        },
        FieldSpec {
            name: "wants_recap",
            kind: FieldKind::Bool,
            required: true,
        },
    ];
    const TEST_SCHEMA: ReplySchema = ReplySchema {
        name: "TestReply",
        fields: TEST_FIELDS,
    };

    struct Scripted {
        replies: Mutex<VecDeque<String>>,
        requests: Mutex<Vec<CompletionRequest>>,
        delay: Option<Duration>,
    }

    impl Scripted {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().map(|s| s.to_string()).collect()),
                requests: Mutex::new(Vec::new()),
                delay: None,
            }
        }

        fn inputs(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.messages.last().unwrap().content.clone())
                .collect()
        }
    }

    #[async_trait]
    impl LlmProvider for Scripted {
        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            self.requests.lock().unwrap().push(request);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let content = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| "{}".to_string());
            Ok(CompletionResponse {
                content,
                usage: Some(TokenUsage {
                    input_tokens: 10,
                    output_tokens: 5,
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

    fn call() -> StrictCall {
        StrictCall {
            schema: TEST_SCHEMA,
            instructions: "Reply as asked.".to_string(),
            input: "hello".to_string(),
            temperature: 0.3,
            max_output_tokens: 512,
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn valid_reply_passes_on_first_attempt() {
        let provider = Scripted::new(&[
            r#"{"action": "ASK", "message": "What is your dream?", "wants_recap": false}"#,
        ]);
        let outcome = call_strict(&provider, call()).await.unwrap();
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.reply.text("message"), "What is your dream?");
        assert_eq!(
            outcome.usage,
            Some(TokenUsage {
                input_tokens: 10,
                output_tokens: 5
            })
        );
    }

    #[tokio::test]
    async fn fenced_json_is_extracted() {
        let provider = Scripted::new(&[
            "Here you go:\n```json\n{\"action\": \"ASK\", \"message\": \"hi\", \"wants_recap\": false}\n```",
        ]);
        let outcome = call_strict(&provider, call()).await.unwrap();
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.reply.text("message"), "hi");
    }

    #[tokio::test]
    async fn repair_pass_recovers_invalid_output() {
        let provider = Scripted::new(&[
            r#"{"action": "MAYBE", "message": "hi", "wants_recap": false}"#,
            r#"{"action": "ASK", "message": "repaired", "wants_recap": false}"#,
        ]);
        let outcome = call_strict(&provider, call()).await.unwrap();
        assert_eq!(outcome.attempts, 2);
        assert_eq!(outcome.reply.text("message"), "repaired");
        // summed across both attempts
        assert_eq!(
            outcome.usage,
            Some(TokenUsage {
                input_tokens: 20,
                output_tokens: 10
            })
        );

        let inputs = provider.inputs();
        assert_eq!(inputs.len(), 2);
        assert!(inputs[1].contains("SCHEMA_ERROR:"));
        assert!(inputs[1].contains("INVALID_JSON_OUTPUT:"));
        assert!(inputs[1].contains("MAYBE"));

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[1].temperature, Some(0.0));
        assert!(requests[1].messages[0].content.contains("REPAIR MODE (HARD)"));
    }

    #[tokio::test]
    async fn second_failure_is_typed_invalid_response() {
        let provider = Scripted::new(&["not json at all", "still not json"]);
        let err = call_strict(&provider, call()).await.unwrap_err();
        match err {
            LlmError::InvalidResponse {
                provider, preview, ..
            } => {
                assert_eq!(provider, "scripted");
                assert_eq!(preview, "still not json");
            }
            other => panic!("expected InvalidResponse, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn preview_is_capped() {
        let long = format!("x{}", "y".repeat(400));
        let provider = Scripted::new(&[&long, &long]);
        let err = call_strict(&provider, call()).await.unwrap_err();
        match err {
            LlmError::InvalidResponse { preview, .. } => {
                assert_eq!(preview.chars().count(), 160);
            }
            other => panic!("expected InvalidResponse, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let mut provider = Scripted::new(&[
            r#"{"action": "ASK", "message": "late", "wants_recap": false}"#,
        ]);
        provider.delay = Some(Duration::from_millis(80));
        let mut params = call();
        params.timeout = Duration::from_millis(10);
        let err = call_strict(&provider, params).await.unwrap_err();
        match err {
            LlmError::Timeout { provider, timeout } => {
                assert_eq!(provider, "scripted");
                assert_eq!(timeout, Duration::from_millis(10));
            }
            other => panic!("expected Timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn instructions_carry_glossary_and_schema() {
        let provider = Scripted::new(&[
            r#"{"action": "ASK", "message": "ok", "wants_recap": false}"#,
        ]);
        call_strict(&provider, call()).await.unwrap();
        let requests = provider.requests.lock().unwrap();
        let system = &requests[0].messages[0].content;
        assert!(system.starts_with("## CANVAS TERM GLOSSARY"));
        assert!(system.contains("Reply as asked."));
        assert!(system.contains("OUTPUT SCHEMA (HARD)"));
        assert!(system.contains("\"additionalProperties\":false"));
    }
}
