//! GitHub comment calls.
//!
//! API:
//! - POST /repos/:owner/:repo/pulls/:number/comments    (inline review comment)
//! - POST /repos/:owner/:repo/issues/:number/comments   (conversation comment)
//!
//! Inline comments are anchored by `commit_id` (the head sha) plus the
//! file `path` and the `position` inside that file's diff.

use serde::Serialize;
use tracing::debug;

use crate::errors::{Error, ReviewResult};
use crate::git_providers::GitHubClient;
use crate::review::Suggestion;

#[derive(Debug, Serialize)]
struct ReviewCommentBody<'a> {
    body: &'a str,
    commit_id: &'a str,
    path: &'a str,
    position: u64,
}

#[derive(Debug, Serialize)]
struct IssueCommentBody<'a> {
    body: &'a str,
}

/// Creates one inline review comment; returns its id.
pub async fn create_review_comment(
    client: &GitHubClient,
    number: u64,
    commit_id: &str,
    s: &Suggestion,
) -> ReviewResult<u64> {
    let payload = ReviewCommentBody {
        body: &s.body,
        commit_id,
        path: &s.path,
        position: s.position,
    };
    let id = client
        .post_json(&format!("pulls/{number}/comments"), &payload)
        .await
        .map_err(Error::Publish)?;
    debug!(number, comment_id = id, path = %s.path, position = s.position, "publish: review comment created");
    Ok(id)
}

/// Creates one conversation comment carrying the rendered suggestion; returns its id.
pub async fn create_issue_comment(
    client: &GitHubClient,
    number: u64,
    s: &Suggestion,
) -> ReviewResult<u64> {
    let body = render_issue_body(s);
    let id = client
        .post_json(
            &format!("issues/{number}/comments"),
            &IssueCommentBody { body: &body },
        )
        .await
        .map_err(Error::Publish)?;
    debug!(number, comment_id = id, path = %s.path, "publish: issue comment created");
    Ok(id)
}

/// Markdown body for issue mode: location, comment, then the hunk in a `diff` fence.
pub fn render_issue_body(s: &Suggestion) -> String {
    let mut out = format!("**`{}`** (position {})\n\n{}\n", s.path, s.position, s.body.trim_end());
    if !s.diff_hunk.trim().is_empty() {
        out.push_str("\n```diff\n");
        out.push_str(s.diff_hunk.trim_end_matches('\n'));
        out.push_str("\n```\n");
    }
    out
}
