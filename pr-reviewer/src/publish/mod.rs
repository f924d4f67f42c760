//! Publisher: one "create comment" call per suggestion, in order.
//!
//! - Inline mode (default): review comments anchored to the head commit.
//! - Issue mode: conversation comments with the hunk rendered in the body.
//! - Dry-run: log what would be posted, call nothing.
//!
//! A failed call is logged and counted; the remaining suggestions still go out.

pub mod github;

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use tracing::{error, info};

use crate::errors::ConfigError;
use crate::git_providers::GitHubClient;
use crate::review::Suggestion;

/// Which GitHub comment kind carries a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentMode {
    #[default]
    Inline,
    Issue,
}

impl FromStr for CommentMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inline" | "review" => Ok(Self::Inline),
            "issue" | "conversation" => Ok(Self::Issue),
            _ => Err(ConfigError::InvalidCommentMode(s.to_string())),
        }
    }
}

impl fmt::Display for CommentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Inline => "inline",
            Self::Issue => "issue",
        })
    }
}

/// Configuration for the publishing step.
#[derive(Debug, Clone, Copy, Default)]
pub struct PublishConfig {
    pub mode: CommentMode,
    /// If true, do not send anything; just log what would be posted.
    pub dry_run: bool,
}

/// Per-proposal publishing tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub created: usize,
    pub failed: usize,
    /// Suggestions only logged because of dry-run.
    pub dry_run: usize,
}

/// Publishes `suggestions` on pull request `number`, anchored to `commit_id`.
pub async fn publish(
    client: &GitHubClient,
    number: u64,
    commit_id: &str,
    suggestions: &[Suggestion],
    cfg: &PublishConfig,
) -> PublishReport {
    let t0 = Instant::now();
    let mut report = PublishReport::default();

    for (i, s) in suggestions.iter().enumerate() {
        if cfg.dry_run {
            info!(
                number,
                index = i,
                mode = %cfg.mode,
                path = %s.path,
                position = s.position,
                body = %s.body,
                "publish: dry-run, not posting"
            );
            report.dry_run += 1;
            continue;
        }

        let res = match cfg.mode {
            CommentMode::Inline => github::create_review_comment(client, number, commit_id, s).await,
            CommentMode::Issue => github::create_issue_comment(client, number, s).await,
        };
        match res {
            Ok(_) => report.created += 1,
            Err(e) => {
                error!(
                    number,
                    index = i,
                    path = %s.path,
                    position = s.position,
                    error = %e,
                    "publish: comment failed, continuing"
                );
                report.failed += 1;
            }
        }
    }

    info!(
        number,
        created = report.created,
        failed = report.failed,
        dry_run = report.dry_run,
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "publish: done"
    );
    report
}
