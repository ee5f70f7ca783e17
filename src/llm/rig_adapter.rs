//! Bridges rig-core's `CompletionModel` to our [`LlmProvider`] trait.

use async_trait::async_trait;
use rig::completion::{AssistantContent, CompletionModel, Message};

use crate::error::LlmError;
use crate::llm::provider::{
    ChatRole, CompletionRequest, CompletionResponse, LlmProvider, TokenUsage,
    classify_provider_error,
};

/// Adapter wrapping any rig completion model.
pub struct RigAdapter<M: CompletionModel> {
    model: M,
    provider: String,
    model_name: String,
}

impl<M: CompletionModel> RigAdapter<M> {
    pub fn new(model: M, provider: &str, model_name: &str) -> Self {
        Self {
            model,
            provider: provider.to_string(),
            model_name: model_name.to_string(),
        }
    }
}

#[async_trait]
impl<M: CompletionModel> LlmProvider for RigAdapter<M> {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        // System messages fold into the preamble; the last user message is the
        // prompt, earlier ones become chat history.
        let mut preamble = String::new();
        let mut users: Vec<String> = Vec::new();
        for msg in request.messages {
            match msg.role {
                ChatRole::System => {
                    if !preamble.is_empty() {
                        preamble.push_str("\n\n");
                    }
                    preamble.push_str(&msg.content);
                }
                ChatRole::User => users.push(msg.content),
            }
        }
        let prompt = users.pop().unwrap_or_default();

        let mut builder = self.model.completion_request(Message::user(prompt));
        if !preamble.is_empty() {
            builder = builder.preamble(preamble);
        }
        if !users.is_empty() {
            builder = builder.messages(users.into_iter().map(Message::user).collect());
        }
        if let Some(temperature) = request.temperature {
            builder = builder.temperature(temperature);
        }
        if let Some(max_tokens) = request.max_tokens {
            builder = builder.max_tokens(max_tokens);
        }

        let response = self
            .model
            .completion(builder.build())
            .await
            .map_err(|e| classify_provider_error(&self.provider, &e.to_string()))?;

        let content = response
            .choice
            .iter()
            .filter_map(|part| match part {
                AssistantContent::Text(text) => Some(text.text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("");

        let reported = response.usage;
        let usage = (reported.input_tokens + reported.output_tokens > 0).then(|| TokenUsage {
            input_tokens: reported.input_tokens as u32,
            output_tokens: reported.output_tokens as u32,
        });

        Ok(CompletionResponse { content, usage })
    }

    fn provider_name(&self) -> &str {
        &self.provider
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
