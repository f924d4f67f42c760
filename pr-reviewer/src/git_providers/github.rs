//! GitHub REST client.
//!
//! Endpoints:
//! - GET  /repos/{owner}/{repo}/pulls?state=open&sort=created   (single page)
//! - GET  /repos/{owner}/{repo}/pulls/{number}   with `Accept: application/vnd.github.v3.diff`
//! - POST /repos/{owner}/{repo}/pulls/{number}/comments          (see `publish::github`)
//! - POST /repos/{owner}/{repo}/issues/{number}/comments         (see `publish::github`)

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{ConfigError, Error, ProviderError, ReviewResult};
use crate::git_providers::types::{GhPull, PullRequest, RepoRef};

/// Media type that makes GitHub answer a pull request GET with the unified diff.
pub const DIFF_MEDIA_TYPE: &str = "application/vnd.github.v3.diff";

const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";
const PAGE_SIZE: u32 = 100;
const BODY_SNIPPET_CHARS: usize = 300;

#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    base_api: String, // "https://api.github.com"
    repo: RepoRef,
}

impl GitHubClient {
    /// Builds the client once per run; the token goes into default headers.
    pub fn new(base_api: &str, token: &str, repo: RepoRef) -> ReviewResult<Self> {
        let base = base_api.trim().trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(base_api.to_string()).into());
        }

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("pr-review-bot/0.1"));
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_MEDIA_TYPE));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                .map_err(|_| ConfigError::InvalidToken)?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()
            .map_err(|e| Error::Config(ConfigError::InvalidBaseUrl(e.to_string())))?;

        Ok(Self {
            http,
            base_api: base.to_string(),
            repo,
        })
    }

    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    /// Lists open pull requests, oldest first. Only the first page is read.
    pub async fn list_open_pulls(&self) -> ReviewResult<Vec<PullRequest>> {
        let url = self.repo_url("pulls");
        debug!("github: GET {} (state=open)", url);

        let resp = self
            .http
            .get(&url)
            .query(&[
                ("state", "open"),
                ("sort", "created"),
                ("direction", "asc"),
            ])
            .query(&[("per_page", PAGE_SIZE)])
            .send()
            .await
            .map_err(|e| Error::List(e.into()))?;
        let resp = check_status(resp).await.map_err(Error::List)?;

        let pulls: Vec<GhPull> = resp.json().await.map_err(|e| Error::List(e.into()))?;
        Ok(pulls.into_iter().map(PullRequest::from).collect())
    }

    /// Fetches the unified diff of a pull request.
    ///
    /// Any non-200 answer is an [`Error::Fetch`] carrying the status and a
    /// trimmed body.
    pub async fn fetch_diff(&self, number: u64) -> ReviewResult<String> {
        let url = self.repo_url(&format!("pulls/{number}"));
        debug!("github: GET {} (diff)", url);

        let resp = self
            .http
            .get(&url)
            .header(ACCEPT, DIFF_MEDIA_TYPE)
            .send()
            .await
            .map_err(|e| Error::Fetch(e.into()))?;

        if resp.status() != reqwest::StatusCode::OK {
            let err = status_error(resp).await;
            return Err(Error::Fetch(err));
        }

        resp.text().await.map_err(|e| Error::Fetch(e.into()))
    }

    /// POSTs a JSON body under the repository and returns the created object's id.
    pub(crate) async fn post_json<B: Serialize>(
        &self,
        tail: &str,
        body: &B,
    ) -> Result<u64, ProviderError> {
        #[derive(Deserialize)]
        struct Created {
            id: u64,
        }

        let url = self.repo_url(tail);
        debug!("github: POST {}", url);

        let resp = self.http.post(&url).json(body).send().await?;
        let resp = check_status(resp).await?;
        let created: Created = resp.json().await?;
        Ok(created.id)
    }

    fn repo_url(&self, tail: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.base_api,
            urlencoding::encode(&self.repo.owner),
            urlencoding::encode(&self.repo.name),
            tail
        )
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    if resp.status().is_success() {
        Ok(resp)
    } else {
        Err(status_error(resp).await)
    }
}

async fn status_error(resp: reqwest::Response) -> ProviderError {
    let status = resp.status();
    let retry_after = resp
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let body = resp.text().await.unwrap_or_default();
    ProviderError::from_status(status, retry_after, snippet(&body))
}

fn snippet(body: &str) -> String {
    let t = body.trim();
    if t.chars().count() <= BODY_SNIPPET_CHARS {
        t.to_string()
    } else {
        t.chars().take(BODY_SNIPPET_CHARS).collect::<String>() + "…"
    }
}
