//! End-to-end pipeline runs against a mock GitHub (and, once, a mock OpenAI).

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use ai_llm_service::{AiLlmError, CompletionMode, CompletionService, OpenAiService};
use mockito::{Matcher, Mock, Server, ServerGuard};
use pr_reviewer::git_providers::DIFF_MEDIA_TYPE;
use pr_reviewer::{
    CommentMode, GitHubClient, PollSummary, PublishReport, PullRequest, RetryPolicy,
    ReviewOutcome, Settings, SkipReason, poll_once, run_review,
};
use serde_json::json;

const TOKEN: &str = "ghp_test";
const DIFF: &str = "diff --git a/a.py b/a.py\n--- a/a.py\n+++ b/a.py\n@@ -1,2 +1,2 @@\n-x=1\n+x = 1\n";

/// Completion fake: replies are consumed in order, the last one repeats.
struct Scripted {
    replies: Mutex<VecDeque<Option<String>>>,
    calls: AtomicU32,
}

impl Scripted {
    /// `None` entries fail with a timeout.
    fn new(replies: Vec<Option<&str>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| r.map(String::from)).collect()),
            calls: AtomicU32::new(0),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CompletionService for Scripted {
    async fn complete(&self, _prompt: &str) -> Result<String, AiLlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut q = self.replies.lock().unwrap();
        let next = if q.len() > 1 {
            q.pop_front().unwrap()
        } else {
            q.front().cloned().unwrap()
        };
        next.ok_or(AiLlmError::Timeout(Duration::from_secs(60)))
    }
}

fn settings(server: &ServerGuard) -> Settings {
    let mut s = Settings::new(TOKEN, "sk-test", "owner/repo").unwrap();
    s.github_api = server.url();
    s.retry = RetryPolicy::new(10, Duration::ZERO);
    s
}

fn client(s: &Settings) -> GitHubClient {
    GitHubClient::new(&s.github_api, &s.github_token, s.repo.clone()).unwrap()
}

fn pr(number: u64) -> PullRequest {
    PullRequest {
        number,
        title: format!("PR {number}"),
        head_sha: format!("sha{number}"),
        html_url: None,
        author: None,
        created_at: None,
    }
}

async fn mock_diff(server: &mut ServerGuard, number: u64, status: usize, body: &str) -> Mock {
    server
        .mock("GET", format!("/repos/owner/repo/pulls/{number}").as_str())
        .match_header("accept", DIFF_MEDIA_TYPE)
        .match_header("authorization", format!("Bearer {TOKEN}").as_str())
        .with_status(status)
        .with_body(body)
        .create_async()
        .await
}

async fn mock_review_comment(
    server: &mut ServerGuard,
    number: u64,
    body: serde_json::Value,
    status: usize,
) -> Mock {
    server
        .mock("POST", format!("/repos/owner/repo/pulls/{number}/comments").as_str())
        .match_body(Matcher::PartialJson(body))
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(if status == 201 {
            json!({"id": 1}).to_string()
        } else {
            json!({"message": "Validation Failed"}).to_string()
        })
        .create_async()
        .await
}

async fn mock_any_comment(server: &mut ServerGuard) -> Mock {
    server
        .mock("POST", Matcher::Regex(r"/comments$".into()))
        .expect(0)
        .create_async()
        .await
}

#[tokio::test]
async fn non_200_diff_skips_completion_and_publish() {
    let mut server = Server::new_async().await;
    let diff = mock_diff(&mut server, 1, 404, r#"{"message":"Not Found"}"#).await;
    let posts = mock_any_comment(&mut server).await;

    let s = settings(&server);
    let llm = Scripted::new(vec![Some("[]")]);
    let out = run_review(&client(&s), &llm, &s, &pr(1)).await;

    assert_eq!(out, ReviewOutcome::Skipped(SkipReason::FetchFailed));
    assert_eq!(llm.calls(), 0);
    diff.assert_async().await;
    posts.assert_async().await;
}

#[tokio::test]
async fn empty_diff_is_skipped() {
    let mut server = Server::new_async().await;
    mock_diff(&mut server, 2, 200, "").await;

    let s = settings(&server);
    let llm = Scripted::new(vec![Some("[]")]);
    let out = run_review(&client(&s), &llm, &s, &pr(2)).await;

    assert_eq!(out, ReviewOutcome::Skipped(SkipReason::EmptyDiff));
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn one_inline_comment_per_suggestion_in_reply_order() {
    let mut server = Server::new_async().await;
    mock_diff(&mut server, 3, 200, DIFF).await;

    let seen: Arc<Mutex<Vec<(String, u64, String)>>> = Arc::default();
    let sink = Arc::clone(&seen);
    let posts = server
        .mock("POST", "/repos/owner/repo/pulls/3/comments")
        .match_body(Matcher::PartialJson(json!({"commit_id": "sha3"})))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body_from_request(move |req| {
            let v: serde_json::Value = serde_json::from_slice(req.body().unwrap()).unwrap();
            sink.lock().unwrap().push((
                v["path"].as_str().unwrap().to_string(),
                v["position"].as_u64().unwrap(),
                v["body"].as_str().unwrap().to_string(),
            ));
            json!({"id": 1}).to_string().into_bytes()
        })
        .expect(2)
        .create_async()
        .await;

    let s = settings(&server);
    let llm = Scripted::new(vec![Some(
        r#"[("a.py", 2, "spacing", "@@ -1,2 +1,2 @@"), ("b.py", 5, "name it", "@@ -4 +4 @@")]"#,
    )]);
    let out = run_review(&client(&s), &llm, &s, &pr(3)).await;

    assert_eq!(
        out,
        ReviewOutcome::Published(PublishReport {
            created: 2,
            failed: 0,
            dry_run: 0
        })
    );
    posts.assert_async().await;
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            ("a.py".to_string(), 2, "spacing".to_string()),
            ("b.py".to_string(), 5, "name it".to_string()),
        ]
    );
}

#[tokio::test]
async fn completion_failing_every_attempt_publishes_nothing() {
    let mut server = Server::new_async().await;
    mock_diff(&mut server, 4, 200, DIFF).await;
    let posts = mock_any_comment(&mut server).await;

    let s = settings(&server);
    let llm = Scripted::new(vec![None]);
    let out = run_review(&client(&s), &llm, &s, &pr(4)).await;

    assert_eq!(out, ReviewOutcome::Skipped(SkipReason::NoSuggestions));
    assert_eq!(llm.calls(), 10);
    posts.assert_async().await;
}

#[tokio::test]
async fn malformed_replies_on_every_attempt_publish_nothing() {
    let mut server = Server::new_async().await;
    mock_diff(&mut server, 5, 200, DIFF).await;
    let posts = mock_any_comment(&mut server).await;

    let mut s = settings(&server);
    s.retry = RetryPolicy::new(3, Duration::ZERO);
    let llm = Scripted::new(vec![Some("LGTM, no issues found!")]);
    let out = run_review(&client(&s), &llm, &s, &pr(5)).await;

    assert_eq!(out, ReviewOutcome::Skipped(SkipReason::NoSuggestions));
    assert_eq!(llm.calls(), 3);
    posts.assert_async().await;
}

#[tokio::test]
async fn deeply_nested_reply_is_a_decode_failure() {
    let mut server = Server::new_async().await;
    mock_diff(&mut server, 13, 200, DIFF).await;
    let posts = mock_any_comment(&mut server).await;

    let mut s = settings(&server);
    s.retry = RetryPolicy::new(2, Duration::ZERO);
    let nested = "[".repeat(100_000);
    let llm = Scripted::new(vec![Some(nested.as_str())]);
    let out = run_review(&client(&s), &llm, &s, &pr(13)).await;

    assert_eq!(out, ReviewOutcome::Skipped(SkipReason::NoSuggestions));
    assert_eq!(llm.calls(), 2);
    posts.assert_async().await;
}

#[tokio::test]
async fn success_on_a_later_attempt_is_published() {
    let mut server = Server::new_async().await;
    mock_diff(&mut server, 6, 200, DIFF).await;
    let post = mock_review_comment(
        &mut server,
        6,
        json!({"path": "a.py", "position": 1, "body": "x"}),
        201,
    )
    .await;

    let s = settings(&server);
    let llm = Scripted::new(vec![
        None,
        Some("sure, here they are"),
        None,
        Some(r#"[(\"a.py\", 1, \"x\", \"@@\")]"#),
    ]);
    let out = run_review(&client(&s), &llm, &s, &pr(6)).await;

    assert!(matches!(out, ReviewOutcome::Published(r) if r.created == 1));
    assert_eq!(llm.calls(), 4);
    post.assert_async().await;
}

#[tokio::test]
async fn failed_comment_does_not_stop_the_next_one() {
    let mut server = Server::new_async().await;
    mock_diff(&mut server, 7, 200, DIFF).await;
    let rejected = mock_review_comment(&mut server, 7, json!({"path": "a.py"}), 422).await;
    let accepted = mock_review_comment(&mut server, 7, json!({"path": "b.py"}), 201).await;

    let s = settings(&server);
    let llm = Scripted::new(vec![Some(
        r#"[["a.py", 99, "outside the diff", "@@"], ["b.py", 1, "ok", "@@"]]"#,
    )]);
    let out = run_review(&client(&s), &llm, &s, &pr(7)).await;

    assert_eq!(
        out,
        ReviewOutcome::Published(PublishReport {
            created: 1,
            failed: 1,
            dry_run: 0
        })
    );
    rejected.assert_async().await;
    accepted.assert_async().await;
}

#[tokio::test]
async fn dry_run_posts_nothing() {
    let mut server = Server::new_async().await;
    mock_diff(&mut server, 8, 200, DIFF).await;
    let posts = mock_any_comment(&mut server).await;

    let mut s = settings(&server);
    s.dry_run = true;
    let llm = Scripted::new(vec![Some(r#"[["a.py", 1, "x", "@@"], ["a.py", 2, "y", "@@"]]"#)]);
    let out = run_review(&client(&s), &llm, &s, &pr(8)).await;

    assert_eq!(
        out,
        ReviewOutcome::Published(PublishReport {
            created: 0,
            failed: 0,
            dry_run: 2
        })
    );
    posts.assert_async().await;
}

#[tokio::test]
async fn issue_mode_posts_rendered_conversation_comment() {
    let mut server = Server::new_async().await;
    mock_diff(&mut server, 9, 200, DIFF).await;
    let post = server
        .mock("POST", "/repos/owner/repo/issues/9/comments")
        .match_body(Matcher::Regex(r"```diff\\n@@ -1,2 \+1,2 @@".into()))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(json!({"id": 42}).to_string())
        .create_async()
        .await;

    let mut s = settings(&server);
    s.comment_mode = CommentMode::Issue;
    let llm = Scripted::new(vec![Some(r#"[["a.py", 2, "spacing", "@@ -1,2 +1,2 @@"]]"#)]);
    let out = run_review(&client(&s), &llm, &s, &pr(9)).await;

    assert!(matches!(out, ReviewOutcome::Published(r) if r.created == 1));
    post.assert_async().await;
}

#[tokio::test]
async fn poll_reviews_every_open_pull_request() {
    let mut server = Server::new_async().await;
    let list = server
        .mock("GET", Matcher::Regex(r"^/repos/owner/repo/pulls(\?.*)?$".into()))
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("state".into(), "open".into()),
            Matcher::UrlEncoded("sort".into(), "created".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                {"number": 10, "title": "gone", "head": {"sha": "s10"}, "user": {"login": "a"}},
                {
                    "number": 11,
                    "title": "fix spacing",
                    "html_url": "https://github.com/owner/repo/pull/11",
                    "created_at": "2024-05-01T12:00:00Z",
                    "head": {"sha": "s11"},
                    "user": {"login": "b"}
                }
            ])
            .to_string(),
        )
        .create_async()
        .await;
    mock_diff(&mut server, 10, 500, "boom").await;
    mock_diff(&mut server, 11, 200, DIFF).await;
    let post = mock_review_comment(&mut server, 11, json!({"commit_id": "s11"}), 201).await;

    let s = settings(&server);
    let llm = Scripted::new(vec![Some(r#"[["a.py", 2, "spacing", "@@"]]"#)]);
    let summary = poll_once(&client(&s), &llm, &s).await;

    assert_eq!(
        summary,
        PollSummary {
            pulls: 2,
            published: 1,
            skipped: 1,
            comments_created: 1,
            comments_failed: 0,
        }
    );
    assert_eq!(llm.calls(), 1);
    list.assert_async().await;
    post.assert_async().await;
}

#[tokio::test]
async fn listing_failure_yields_an_empty_poll() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", Matcher::Regex(r"^/repos/owner/repo/pulls(\?.*)?$".into()))
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(r#"{"message":"Bad credentials"}"#)
        .create_async()
        .await;

    let s = settings(&server);
    let llm = Scripted::new(vec![Some("[]")]);
    let summary = poll_once(&client(&s), &llm, &s).await;

    assert_eq!(summary, PollSummary::default());
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn openai_chat_reply_in_code_fence_reaches_github() {
    let mut github = Server::new_async().await;
    let mut openai = Server::new_async().await;

    mock_diff(&mut github, 12, 200, DIFF).await;
    let post = mock_review_comment(
        &mut github,
        12,
        json!({"body": "Add spaces around `=`.", "path": "a.py", "position": 2, "commit_id": "sha12"}),
        201,
    )
    .await;
    let completion = openai
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::Regex("### DIFF".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"choices": [{"message": {
                "role": "assistant",
                "content": "```json\n[[\"a.py\", 2, \"Add spaces around `=`.\", \"@@ -1,2 +1,2 @@\"]]\n```"
            }}]})
            .to_string(),
        )
        .create_async()
        .await;

    let mut s = settings(&github);
    s.openai_api = openai.url();
    s.completion_mode = CompletionMode::Chat;
    let llm = OpenAiService::new(s.llm_config().unwrap()).unwrap();
    let out = run_review(&client(&s), &llm, &s, &pr(12)).await;

    assert!(matches!(out, ReviewOutcome::Published(r) if r.created == 1));
    completion.assert_async().await;
    post.assert_async().await;
}

#[tokio::test(start_paused = true)]
async fn retry_pauses_between_attempts() {
    let llm = Scripted::new(vec![None, None, Some(r#"[["a.py", 1, "x", "@@"]]"#)]);
    let started = tokio::time::Instant::now();

    let out =
        pr_reviewer::review::suggest(&llm, DIFF, &RetryPolicy::new(10, Duration::from_secs(5)))
            .await;

    assert_eq!(out.len(), 1);
    assert_eq!(llm.calls(), 3);
    assert!(started.elapsed() >= Duration::from_secs(10));
}
