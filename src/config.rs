//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};

/// Turn engine configuration.
#[derive(Debug, Clone)]
pub struct CoachConfig {
    /// Maximum specialist invocations inside one user turn.
    pub hop_limit: u32,
    /// Per-completion timeout for specialist calls.
    pub llm_timeout: Duration,
    /// Word cap enforced on the Big Why formulation.
    pub bigwhy_word_cap: usize,
    /// Maximum number of Rules of the Game bullets.
    pub rules_bullet_cap: usize,
    /// Word cap for the Target Group first sentence.
    pub targetgroup_word_cap: usize,
    /// Directory for per-session usage reports; `None` disables them.
    pub session_log_dir: Option<PathBuf>,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            hop_limit: 3,
            llm_timeout: Duration::from_secs(25),
            bigwhy_word_cap: 28,
            rules_bullet_cap: 6,
            targetgroup_word_cap: 10,
            session_log_dir: None,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("cannot parse {raw:?}"),
            }),
        Err(_) => Ok(None),
    }
}

impl CoachConfig {
    /// Reads `CANVAS_*` overrides on top of the defaults.
    pub fn from_env() -> Result<CoachConfig, ConfigError> {
        let mut config = CoachConfig::default();
        if let Some(limit) = env_parse::<u32>("CANVAS_HOP_LIMIT")? {
            config.hop_limit = limit;
        }
        if let Some(secs) = env_parse::<u64>("CANVAS_LLM_TIMEOUT_SECS")? {
            config.llm_timeout = Duration::from_secs(secs);
        }
        if let Some(cap) = env_parse::<usize>("CANVAS_BIGWHY_WORD_CAP")? {
            config.bigwhy_word_cap = cap;
        }
        if let Some(cap) = env_parse::<usize>("CANVAS_RULES_BULLET_CAP")? {
            config.rules_bullet_cap = cap;
        }
        if let Some(cap) = env_parse::<usize>("CANVAS_TARGETGROUP_WORD_CAP")? {
            config.targetgroup_word_cap = cap;
        }
        if let Ok(dir) = std::env::var("CANVAS_SESSION_LOG_DIR") {
            let dir = dir.trim();
            if !dir.is_empty() {
                config.session_log_dir = Some(PathBuf::from(dir));
            }
        }
        Ok(config)
    }
}

/// Builds the provider configuration from `CANVAS_*` variables, falling back
/// to the provider's own key variable when `CANVAS_API_KEY` is not set.
pub fn llm_config_from_env() -> Result<LlmConfig, ConfigError> {
    let backend = match std::env::var("CANVAS_LLM_BACKEND") {
        Ok(raw) => LlmBackend::parse(&raw).ok_or_else(|| ConfigError::InvalidValue {
            key: "CANVAS_LLM_BACKEND".to_string(),
            message: format!("unknown backend {raw:?}, expected openai or anthropic"),
        })?,
        Err(_) => LlmBackend::OpenAi,
    };

    let fallback_key_var = match backend {
        LlmBackend::OpenAi => "OPENAI_API_KEY",
        LlmBackend::Anthropic => "ANTHROPIC_API_KEY",
    };
    let api_key = std::env::var("CANVAS_API_KEY")
        .or_else(|_| std::env::var(fallback_key_var))
        .map_err(|_| ConfigError::MissingRequired {
            key: "CANVAS_API_KEY".to_string(),
            hint: format!("set CANVAS_API_KEY or {fallback_key_var}"),
        })?;

    let model = std::env::var("CANVAS_MODEL").unwrap_or_else(|_| "gpt-4.1".to_string());

    Ok(LlmConfig {
        backend,
        api_key: SecretString::from(api_key),
        model,
    })
}

/// Bind port for the HTTP surface, `CANVAS_PORT` default 8080.
pub fn server_port() -> Result<u16, ConfigError> {
    Ok(env_parse::<u16>("CANVAS_PORT")?.unwrap_or(8080))
}
