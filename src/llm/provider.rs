//! Provider abstraction over chat-completion backends.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::LlmError;

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
}

/// A single message in a completion request.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// A completion request: message log plus sampling settings.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u64>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u64) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Token usage from an LLM call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }

    /// Sums usage across attempts of one logical call.
    pub fn combine(a: Option<TokenUsage>, b: Option<TokenUsage>) -> Option<TokenUsage> {
        match (a, b) {
            (Some(x), Some(y)) => Some(TokenUsage {
                input_tokens: x.input_tokens + y.input_tokens,
                output_tokens: x.output_tokens + y.output_tokens,
            }),
            (Some(x), None) | (None, Some(x)) => Some(x),
            (None, None) => None,
        }
    }
}

/// Response from a completion call. `usage` is absent when the backend did
/// not report token counts.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub usage: Option<TokenUsage>,
}

/// Abstraction over LLM backends.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Performs a single completion. No retries at this layer; callers map
    /// [`LlmError::suggested_backoff`] into their own policy.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Backend label used in error reporting ("openai", "anthropic").
    fn provider_name(&self) -> &str;

    /// Model identifier used for this provider.
    fn model_name(&self) -> &str;
}

/// Classifies a backend error string into the typed taxonomy.
/// Rate limiting is recognized from the 429 status or the standard
/// `rate_limit_exceeded` code; auth failures from 401/403.
pub(crate) fn classify_provider_error(provider: &str, message: &str) -> LlmError {
    let lower = message.to_lowercase();
    if lower.contains("429") || lower.contains("rate_limit_exceeded") || lower.contains("rate limit")
    {
        return LlmError::RateLimited {
            provider: provider.to_string(),
            retry_after: parse_retry_after(message),
        };
    }
    if lower.contains("401")
        || lower.contains("403")
        || lower.contains("unauthorized")
        || lower.contains("invalid api key")
        || lower.contains("authentication")
    {
        return LlmError::AuthFailed {
            provider: provider.to_string(),
        };
    }
    LlmError::RequestFailed {
        provider: provider.to_string(),
        reason: message.to_string(),
    }
}

/// Extracts a retry-after hint from an error payload. Accepts a bare number
/// (a value under 1000 is read as seconds, Retry-After header convention) or
/// a "retry after N ms|s" phrase (default unit ms).
pub(crate) fn parse_retry_after(value: &str) -> Option<Duration> {
    let trimmed = value.trim();
    if let Ok(n) = trimmed.parse::<f64>() {
        if n > 0.0 {
            let ms = if n < 1000.0 { n * 1000.0 } else { n };
            return Some(Duration::from_millis(ms.round() as u64));
        }
    }
    let re = regex::Regex::new(r"(?i)retry.after[:\s]+(\d+(?:\.\d+)?)\s*(ms|s)?").ok()?;
    let caps = re.captures(value)?;
    let n: f64 = caps.get(1)?.as_str().parse().ok()?;
    if n <= 0.0 {
        return None;
    }
    let ms = match caps.get(2).map(|m| m.as_str().to_lowercase()) {
        Some(unit) if unit == "s" => n * 1000.0,
        _ => n,
    };
    Some(Duration::from_millis(ms.round() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_rate_limit_with_hint() {
        let err = classify_provider_error("openai", "status 429: please retry after 2 s");
        match err {
            LlmError::RateLimited {
                provider,
                retry_after,
            } => {
                assert_eq!(provider, "openai");
                assert_eq!(retry_after, Some(Duration::from_millis(2000)));
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[test]
    fn classifies_auth_failure() {
        let err = classify_provider_error("anthropic", "401 Unauthorized");
        assert!(matches!(err, LlmError::AuthFailed { .. }));
    }

    #[test]
    fn unknown_errors_become_request_failed() {
        let err = classify_provider_error("openai", "connection reset by peer");
        match err {
            LlmError::RequestFailed { reason, .. } => {
                assert!(reason.contains("connection reset"));
            }
            other => panic!("expected RequestFailed, got {other:?}"),
        }
    }

    #[test]
    fn retry_after_parses_bare_seconds_and_millis() {
        assert_eq!(parse_retry_after("2"), Some(Duration::from_millis(2000)));
        assert_eq!(parse_retry_after("1500"), Some(Duration::from_millis(1500)));
        assert_eq!(
            parse_retry_after("retry after 750 ms"),
            Some(Duration::from_millis(750))
        );
        assert_eq!(parse_retry_after("no hint here"), None);
    }

    #[test]
    fn usage_combines_across_attempts() {
        let a = Some(TokenUsage {
            input_tokens: 100,
            output_tokens: 20,
        });
        let b = Some(TokenUsage {
            input_tokens: 50,
            output_tokens: 10,
        });
        let sum = TokenUsage::combine(a, b);
        assert_eq!(
            sum,
            Some(TokenUsage {
                input_tokens: 150,
                output_tokens: 30
            })
        );
        assert_eq!(TokenUsage::combine(a, None), a);
        assert_eq!(TokenUsage::combine(None, None), None);
        assert_eq!(sum.map(|u| u.total()), Some(180));
    }
}
