//! Error types for the canvas coach service.

use std::time::Duration;

use uuid::Uuid;

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Contract error: {0}")]
    Contract(#[from] ContractError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
///
/// Transient variants (`Timeout`, `RateLimited`) carry enough detail for the
/// caller to re-submit the turn; this crate never retries transport failures
/// itself.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("Invalid response {response_id} from {provider}: {reason}")]
    InvalidResponse {
        provider: String,
        response_id: Uuid,
        preview: String,
        reason: String,
    },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Suggested client-side backoff before re-submitting the same turn.
    /// `None` for failures a plain resend will not fix.
    pub fn suggested_backoff(&self) -> Option<Duration> {
        match self {
            LlmError::Timeout { .. } => Some(Duration::from_millis(1500)),
            LlmError::RateLimited { retry_after, .. } => {
                Some(retry_after.unwrap_or(Duration::from_millis(1500)))
            }
            _ => None,
        }
    }

    /// Wire tag for the turn-level error payload.
    pub fn wire_type(&self) -> &'static str {
        match self {
            LlmError::Timeout { .. } => "timeout",
            LlmError::RateLimited { .. } => "rate_limited",
            LlmError::InvalidResponse { .. } => "invalid_model_output",
            LlmError::AuthFailed { .. } => "auth_failed",
            LlmError::RequestFailed { .. } | LlmError::Json(_) => "request_failed",
        }
    }
}

/// UI contract registry errors.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("Unknown action code: {code}")]
    UnknownActionCode { code: String },

    #[error("Unknown menu: {menu_id}")]
    UnknownMenu { menu_id: String },

    #[error("Menu {menu_id} has no action codes")]
    MenuWithoutActions { menu_id: String },
}

/// A specialist reply that does not match its closed output schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaViolation {
    #[error("reply is not a JSON object")]
    NotAnObject,

    #[error("missing required field {field}")]
    MissingField { field: String },

    #[error("unknown field {field}")]
    UnknownField { field: String },

    #[error("field {field} must be a {expected}")]
    WrongType { field: String, expected: String },

    #[error("field {field} has value {value:?} outside its enum")]
    InvalidEnum { field: String, value: String },

    #[error("field {field} must be the string \"true\" or \"false\", got {value:?}")]
    InvalidBool { field: String, value: String },
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
