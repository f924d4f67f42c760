//! Public entry for the pull-request review pipeline.
//!
//! One pass over a repository lists its open pull requests and drives each
//! through four stages, sequentially:
//!
//! 1) **Fetch**: unified diff via the GitHub diff media type
//! 2) **Prompt**: fixed template embedding the diff ([`review::prompt`])
//! 3) **Suggest**: completion call + decode, retried under a [`RetryPolicy`]
//! 4) **Publish**: one comment per suggestion ([`publish`])
//!
//! Nothing that goes wrong for one pull request stops the others: fetch
//! failures skip it, suggestion failures yield no suggestions, and publish
//! failures are counted per comment.
//!
//! The pipeline uses `tracing` for logging and plain `async fn`; the
//! completion backend is a generic [`CompletionService`] so tests can script it.

pub mod errors;
pub mod git_providers;
pub mod publish;
pub mod review;
pub mod settings;

use std::time::Instant;

use ai_llm_service::CompletionService;
use tracing::{debug, error, info, warn};

pub use errors::{Error, ReviewResult};
pub use git_providers::{GitHubClient, PullRequest, RepoRef};
pub use publish::{CommentMode, PublishConfig, PublishReport};
pub use review::{RetryPolicy, Suggestion};
pub use settings::Settings;

/// Why a pull request produced no comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Diff could not be fetched (non-200 or transport failure).
    FetchFailed,
    /// Diff was empty.
    EmptyDiff,
    /// The model had nothing usable to say.
    NoSuggestions,
}

/// Final state of one pull request's pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
    Published(PublishReport),
    Skipped(SkipReason),
}

/// Tally of one poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub pulls: usize,
    pub published: usize,
    pub skipped: usize,
    pub comments_created: usize,
    pub comments_failed: usize,
}

/// Runs fetch → suggest → publish for a single pull request.
pub async fn run_review<C: CompletionService>(
    github: &GitHubClient,
    llm: &C,
    settings: &Settings,
    pr: &PullRequest,
) -> ReviewOutcome {
    let t0 = Instant::now();
    debug!(number = pr.number, head = %pr.head_sha, "review: fetch diff");

    let diff = match github.fetch_diff(pr.number).await {
        Ok(d) => d,
        Err(e) => {
            error!(number = pr.number, error = %e, "review: diff unavailable, skipping");
            return ReviewOutcome::Skipped(SkipReason::FetchFailed);
        }
    };
    if diff.trim().is_empty() {
        info!(number = pr.number, "review: empty diff, skipping");
        return ReviewOutcome::Skipped(SkipReason::EmptyDiff);
    }
    debug!(number = pr.number, diff_bytes = diff.len(), "review: diff fetched");

    let suggestions = review::suggest(llm, &diff, &settings.retry).await;
    if suggestions.is_empty() {
        info!(number = pr.number, "review: no suggestions");
        return ReviewOutcome::Skipped(SkipReason::NoSuggestions);
    }

    let report = publish::publish(
        github,
        pr.number,
        &pr.head_sha,
        &suggestions,
        &settings.publish_config(),
    )
    .await;

    info!(
        number = pr.number,
        suggestions = suggestions.len(),
        created = report.created,
        failed = report.failed,
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "review: done"
    );
    ReviewOutcome::Published(report)
}

/// Lists open pull requests once and reviews each, oldest first.
///
/// A listing failure is logged and yields an empty summary.
pub async fn poll_once<C: CompletionService>(
    github: &GitHubClient,
    llm: &C,
    settings: &Settings,
) -> PollSummary {
    let mut summary = PollSummary::default();

    let pulls = match github.list_open_pulls().await {
        Ok(p) => p,
        Err(e) => {
            warn!(repo = %github.repo(), error = %e, "poll: cannot list pull requests");
            return summary;
        }
    };
    info!(repo = %github.repo(), open = pulls.len(), "poll: open pull requests");

    for pr in &pulls {
        debug!(
            number = pr.number,
            title = %pr.title,
            author = ?pr.author,
            url = ?pr.html_url,
            created_at = ?pr.created_at,
            "poll: reviewing"
        );
        summary.pulls += 1;
        match run_review(github, llm, settings, pr).await {
            ReviewOutcome::Published(r) => {
                summary.published += 1;
                summary.comments_created += r.created;
                summary.comments_failed += r.failed;
            }
            ReviewOutcome::Skipped(reason) => {
                debug!(number = pr.number, ?reason, "poll: skipped");
                summary.skipped += 1;
            }
        }
    }

    info!(
        pulls = summary.pulls,
        published = summary.published,
        skipped = summary.skipped,
        comments = summary.comments_created,
        failed = summary.comments_failed,
        "poll: done"
    );
    summary
}
