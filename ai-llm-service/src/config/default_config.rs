//! Default completion config for an OpenAI-compatible backend.
//!
//! The caller supplies what the CLI collected (API key, endpoint, mode, model);
//! sampling knobs come from the environment:
//!
//! - `LLM_MAX_TOKENS`   = optional max tokens (u32)
//! - `LLM_TIMEOUT_SECS` = optional request timeout (u64, default 60)
//!
//! # Defaults
//! - `temperature = Some(0.2)` (reviews should be stable, not creative)
//! - `model` = [`CompletionMode::default_model`] when not given

use crate::{
    config::{completion_mode::CompletionMode, llm_model_config::LlmModelConfig},
    error_handler::{
        AiLlmError, ConfigError, env_opt_u32, env_opt_u64, validate_http_endpoint,
        validate_range_f32,
    },
};

const DEFAULT_TEMPERATURE: f32 = 0.2;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Constructs and validates the completion config.
///
/// # Errors
///
/// - [`ConfigError::EmptyApiKey`] if `api_key` is blank
/// - [`ConfigError::EmptyModel`] if `model` is `Some("")`
/// - [`ConfigError::InvalidFormat`] if `endpoint` is not http(s)
/// - [`ConfigError::InvalidNumber`] if `LLM_MAX_TOKENS` / `LLM_TIMEOUT_SECS` are malformed
pub fn config_openai(
    api_key: &str,
    endpoint: &str,
    mode: CompletionMode,
    model: Option<&str>,
) -> Result<LlmModelConfig, AiLlmError> {
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(ConfigError::EmptyApiKey.into());
    }

    validate_http_endpoint("endpoint", endpoint)?;

    let model = match model {
        Some(m) if m.trim().is_empty() => return Err(ConfigError::EmptyModel.into()),
        Some(m) => m.trim().to_string(),
        None => mode.default_model().to_string(),
    };

    let temperature = DEFAULT_TEMPERATURE;
    validate_range_f32("temperature", temperature, 0.0, 2.0)?;

    Ok(LlmModelConfig {
        mode,
        model,
        endpoint: endpoint.trim().trim_end_matches('/').to_string(),
        api_key: api_key.to_string(),
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: Some(temperature),
        top_p: None,
        timeout_secs: Some(env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS)),
    })
}
