//! Hosting-service data model: repository reference and open proposals.
//!
//! Proposals are owned by GitHub and read-only here; the wire shape
//! (`GhPull`) is mapped into the flat [`PullRequest`] used by the pipeline.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// `owner/name` repository identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl FromStr for RepoRef {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let invalid = || ConfigError::InvalidRepo(s.to_string());

        let (owner, name) = raw.split_once('/').ok_or_else(invalid)?;
        let valid_part =
            |p: &str| !p.is_empty() && !p.contains('/') && !p.chars().any(char::is_whitespace);
        if !valid_part(owner) || !valid_part(name) {
            return Err(invalid());
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// An open pull request as seen by one poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    /// Head commit; inline comments are anchored to it.
    pub head_sha: String,
    pub html_url: Option<String>,
    pub author: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Subset of `GET /repos/{owner}/{repo}/pulls` items we read.
#[derive(Debug, Deserialize)]
pub(crate) struct GhPull {
    pub number: u64,
    pub title: String,
    pub html_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub user: Option<GhUser>,
    pub head: GhHead,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GhUser {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GhHead {
    pub sha: String,
}

impl From<GhPull> for PullRequest {
    fn from(p: GhPull) -> Self {
        Self {
            number: p.number,
            title: p.title,
            head_sha: p.head.sha,
            html_url: p.html_url,
            author: p.user.map(|u| u.login),
            created_at: p.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_owner_and_name() {
        let r: RepoRef = " octo/hello-world ".parse().unwrap();
        assert_eq!(r.owner, "octo");
        assert_eq!(r.name, "hello-world");
        assert_eq!(r.to_string(), "octo/hello-world");
    }

    #[test]
    fn rejects_malformed_identifiers() {
        for bad in ["", "octo", "octo/", "/repo", "a/b/c", "oc to/repo", "octo/re po"] {
            assert!(bad.parse::<RepoRef>().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn maps_github_pull_payload() {
        let raw = r#"{
            "number": 42,
            "title": "Add parser",
            "html_url": "https://github.com/octo/hello/pull/42",
            "created_at": "2024-05-01T10:00:00Z",
            "user": {"login": "mona"},
            "head": {"sha": "abc123", "ref": "feature"},
            "state": "open"
        }"#;
        let gh: GhPull = serde_json::from_str(raw).unwrap();
        let pr = PullRequest::from(gh);
        assert_eq!(pr.number, 42);
        assert_eq!(pr.head_sha, "abc123");
        assert_eq!(pr.author.as_deref(), Some("mona"));
        assert!(pr.created_at.is_some());
    }
}
