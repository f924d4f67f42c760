//! Hosting-service access (GitHub only).
//!
//! A concrete client rather than a trait: the bot talks to exactly one
//! provider, and tests point the client at a mock server via `base_api`.

pub mod github;
pub mod types;

pub use github::{DIFF_MEDIA_TYPE, GitHubClient};
pub use types::{PullRequest, RepoRef};
