use std::time::Duration;

use ai_llm_service::{CompletionMode, OpenAiService, telemetry};
use anyhow::{Context, Result};
use clap::Parser;
use pr_reviewer::settings::{DEFAULT_GITHUB_API, DEFAULT_OPENAI_API};
use pr_reviewer::{CommentMode, GitHubClient, RetryPolicy, Settings, poll_once};
use tracing::{Level, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// pr-review-bot - posts model-generated review comments on open pull requests
#[derive(Parser, Debug)]
#[command(name = "pr-review-bot", version, about, long_about = None)]
struct Cli {
    /// GitHub access token
    #[arg(env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: String,

    /// Completion service API key
    #[arg(env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: String,

    /// Repository as "owner/name"
    #[arg(env = "GITHUB_REPOSITORY")]
    repo: String,

    /// GitHub REST API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_GITHUB_API)]
    github_api: String,

    /// Completion service base URL
    #[arg(long, env = "OPENAI_API_BASE", default_value = DEFAULT_OPENAI_API)]
    openai_api: String,

    /// Model name (defaults per completion mode)
    #[arg(long, env = "LLM_MODEL")]
    model: Option<String>,

    /// `chat` or `text`
    #[arg(long, env = "LLM_COMPLETION_MODE", default_value = "chat")]
    completion_mode: CompletionMode,

    /// `inline` (review comments) or `issue` (conversation comments)
    #[arg(long, env = "PR_REVIEW_COMMENT_MODE", default_value = "inline")]
    comment_mode: CommentMode,

    /// Suggestion attempts per pull request
    #[arg(long, env = "PR_REVIEW_MAX_ATTEMPTS", default_value_t = 10)]
    max_attempts: u32,

    /// Pause between suggestion attempts, in seconds
    #[arg(long, env = "PR_REVIEW_RETRY_DELAY_SECS", default_value_t = 5)]
    retry_delay_secs: u64,

    /// Poll repeatedly with this pause; without it the bot polls once
    #[arg(long, env = "PR_REVIEW_POLL_INTERVAL_SECS")]
    poll_interval_secs: Option<u64>,

    /// Log comments instead of posting them
    #[arg(long, env = "PR_REVIEW_DRY_RUN")]
    dry_run: bool,

    /// Debug logging for the bot's crates
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_settings(self) -> Result<Settings> {
        let mut s = Settings::new(&self.github_token, &self.openai_api_key, &self.repo)?;
        s.github_api = self.github_api;
        s.openai_api = self.openai_api;
        s.model = self.model;
        s.completion_mode = self.completion_mode;
        s.comment_mode = self.comment_mode;
        s.retry = RetryPolicy::new(self.max_attempts, Duration::from_secs(self.retry_delay_secs));
        s.dry_run = self.dry_run;
        s.poll_interval = self
            .poll_interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        Ok(s)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // A missing .env is fine; flags and the environment still apply.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::registry()
        .with(telemetry::env_filter_with_level("info", level))
        .with(telemetry::layer())
        .init();

    let settings = cli.into_settings().context("invalid configuration")?;
    info!(settings = ?settings, "pr-review-bot starting");

    let github = GitHubClient::new(
        &settings.github_api,
        &settings.github_token,
        settings.repo.clone(),
    )
    .context("cannot build GitHub client")?;
    let llm_cfg = settings
        .llm_config()
        .context("invalid completion service configuration")?;
    let llm = OpenAiService::new(llm_cfg).context("cannot build completion client")?;

    loop {
        poll_once(&github, &llm, &settings).await;

        match settings.poll_interval {
            Some(pause) => {
                info!(secs = pause.as_secs(), "sleeping until next poll");
                tokio::time::sleep(pause).await;
            }
            None => break,
        }
    }

    Ok(())
}
