use std::fmt;
use std::str::FromStr;

use crate::error_handler::ConfigError;

/// Which OpenAI-compatible endpoint family is used for text generation.
///
/// - `Chat` → `POST {endpoint}/v1/chat/completions`, reply in `choices[0].message.content`
/// - `Text` → `POST {endpoint}/v1/completions`, reply in `choices[0].text`
///
/// # Examples
///
/// ```
/// use ai_llm_service::config::completion_mode::CompletionMode;
///
/// let mode: CompletionMode = "text".parse().unwrap();
/// assert_eq!(mode, CompletionMode::Text);
/// assert_eq!(CompletionMode::default(), CompletionMode::Chat);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompletionMode {
    /// Chat-style request with a `messages` array.
    #[default]
    Chat,
    /// Single-turn legacy completion with a raw `prompt`.
    Text,
}

impl CompletionMode {
    /// Path appended to the configured endpoint.
    pub fn path(self) -> &'static str {
        match self {
            CompletionMode::Chat => "/v1/chat/completions",
            CompletionMode::Text => "/v1/completions",
        }
    }

    /// Short endpoint label used in errors and logs.
    pub fn label(self) -> &'static str {
        match self {
            CompletionMode::Chat => "chat/completions",
            CompletionMode::Text => "completions",
        }
    }

    /// Model used when none is configured explicitly.
    pub fn default_model(self) -> &'static str {
        match self {
            CompletionMode::Chat => "gpt-3.5-turbo",
            CompletionMode::Text => "gpt-3.5-turbo-instruct",
        }
    }
}

impl FromStr for CompletionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chat" => Ok(CompletionMode::Chat),
            "text" | "completion" => Ok(CompletionMode::Text),
            other => Err(ConfigError::UnsupportedMode(other.to_string())),
        }
    }
}

impl fmt::Display for CompletionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionMode::Chat => f.write_str("chat"),
            CompletionMode::Text => f.write_str("text"),
        }
    }
}
