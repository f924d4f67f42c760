//! Suggestion step: prompt → completion → decode, under a [`RetryPolicy`].
//!
//! Failures never leave this module: once the retry budget is spent (or a
//! non-retryable error shows up) the caller simply gets no suggestions.

pub mod decode;
pub mod prompt;
pub mod retry;

use std::time::Instant;

use ai_llm_service::CompletionService;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::errors::{Error, ReviewResult};
pub use decode::decode_suggestions;
pub use prompt::{PROMPT_VERSION, build_prompt};
pub use retry::{RetryFailure, RetryPolicy};

/// One review comment proposed by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    /// File path as shown after `+++ b/` in the diff.
    pub path: String,
    /// Line position inside that file's diff (1-based, below the first hunk header).
    pub position: u64,
    /// Comment text (Markdown).
    pub body: String,
    /// Hunk header the comment refers to; may be empty.
    pub diff_hunk: String,
}

/// Asks the completion service for suggestions on `diff`.
///
/// Returns suggestions in reply order, or an empty list when the diff is blank
/// or every attempt failed.
pub async fn suggest<C: CompletionService>(
    llm: &C,
    diff: &str,
    policy: &RetryPolicy,
) -> Vec<Suggestion> {
    if diff.trim().is_empty() {
        debug!("suggest: empty diff, nothing to ask");
        return Vec::new();
    }

    let t0 = Instant::now();
    let prompt = build_prompt(diff);
    debug!(
        prompt_version = PROMPT_VERSION,
        prompt_chars = prompt.len(),
        max_attempts = policy.max_attempts,
        "suggest: prompt built"
    );

    let result = policy
        .run(|attempt| ask_once(llm, &prompt, attempt), Error::is_retryable)
        .await;

    match result {
        Ok(list) => {
            info!(
                count = list.len(),
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "suggest: reply decoded"
            );
            list
        }
        Err(RetryFailure {
            attempts,
            last_error,
            ..
        }) => {
            warn!(
                attempts,
                error = %last_error,
                "suggest: no usable reply, continuing without suggestions"
            );
            Vec::new()
        }
    }
}

async fn ask_once<C: CompletionService>(
    llm: &C,
    prompt: &str,
    attempt: u32,
) -> ReviewResult<Vec<Suggestion>> {
    let reply = llm.complete(prompt).await?;
    debug!(attempt, reply_chars = reply.len(), "suggest: reply received");
    Ok(decode_suggestions(&reply)?)
}
