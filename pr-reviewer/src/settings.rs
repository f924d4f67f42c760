//! Run settings, built once at startup and shared read-only.

use std::fmt;
use std::time::Duration;

use ai_llm_service::{AiLlmError, CompletionMode, LlmModelConfig, config_openai};

use crate::errors::{ConfigError, ReviewResult};
use crate::git_providers::RepoRef;
use crate::publish::{CommentMode, PublishConfig};
use crate::review::RetryPolicy;

pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";
pub const DEFAULT_OPENAI_API: &str = "https://api.openai.com";

#[derive(Clone)]
pub struct Settings {
    pub github_token: String,
    pub openai_api_key: String,
    pub repo: RepoRef,
    pub github_api: String,
    pub openai_api: String,
    /// `None` picks the completion mode's default model.
    pub model: Option<String>,
    pub completion_mode: CompletionMode,
    pub comment_mode: CommentMode,
    pub retry: RetryPolicy,
    pub dry_run: bool,
    /// `None` means poll once and exit.
    pub poll_interval: Option<Duration>,
}

impl Settings {
    /// Settings with defaults for everything but the three required inputs.
    pub fn new(github_token: &str, openai_api_key: &str, repo: &str) -> ReviewResult<Self> {
        let github_token = github_token.trim();
        if github_token.is_empty() {
            return Err(ConfigError::InvalidToken.into());
        }
        Ok(Self {
            github_token: github_token.to_string(),
            openai_api_key: openai_api_key.trim().to_string(),
            repo: repo.parse()?,
            github_api: DEFAULT_GITHUB_API.to_string(),
            openai_api: DEFAULT_OPENAI_API.to_string(),
            model: None,
            completion_mode: CompletionMode::default(),
            comment_mode: CommentMode::default(),
            retry: RetryPolicy::default(),
            dry_run: false,
            poll_interval: None,
        })
    }

    /// Validated completion-client config derived from these settings.
    pub fn llm_config(&self) -> Result<LlmModelConfig, AiLlmError> {
        config_openai(
            &self.openai_api_key,
            &self.openai_api,
            self.completion_mode,
            self.model.as_deref(),
        )
    }

    pub fn publish_config(&self) -> PublishConfig {
        PublishConfig {
            mode: self.comment_mode,
            dry_run: self.dry_run,
        }
    }
}

// Manual Debug so tokens never end up in logs.
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("github_token", &"***")
            .field("openai_api_key", &"***")
            .field("repo", &self.repo.to_string())
            .field("github_api", &self.github_api)
            .field("openai_api", &self.openai_api)
            .field("model", &self.model)
            .field("completion_mode", &self.completion_mode)
            .field("comment_mode", &self.comment_mode)
            .field("retry", &self.retry)
            .field("dry_run", &self.dry_run)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}
