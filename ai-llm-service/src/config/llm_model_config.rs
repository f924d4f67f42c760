use std::fmt;

use crate::config::completion_mode::CompletionMode;

/// Configuration for a completion-model invocation.
///
/// Built once at startup and handed to [`OpenAiService::new`]; the API key is
/// carried here instead of living in process-wide state.
///
/// # Fields
///
/// - `mode`: chat or legacy text completion.
/// - `model`: the model identifier (e.g., `"gpt-3.5-turbo"`).
/// - `endpoint`: API base URL (e.g., `"https://api.openai.com"`).
/// - `api_key`: bearer token for the provider.
/// - `max_tokens`: maximum number of tokens to generate (if supported).
/// - `temperature`: controls randomness (0.0 = deterministic).
/// - `top_p`: nucleus sampling cutoff (alternative to temperature).
/// - `timeout_secs`: optional request timeout in seconds.
///
/// [`OpenAiService::new`]: crate::services::open_ai_service::OpenAiService::new
#[derive(Clone, PartialEq)]
pub struct LlmModelConfig {
    pub mode: CompletionMode,
    pub model: String,
    pub endpoint: String,
    pub api_key: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub timeout_secs: Option<u64>,
}

// Hand-written so the key never ends up in logs.
impl fmt::Debug for LlmModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmModelConfig")
            .field("mode", &self.mode)
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
