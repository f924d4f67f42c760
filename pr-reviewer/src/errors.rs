//! Crate-wide error hierarchy for pr-reviewer.
//!
//! One root [`Error`] whose variants name the pipeline stage that failed
//! (fetch / completion / decode / publish), so callers can log and decide
//! whether to skip a proposal, retry, or continue with the next comment.

use ai_llm_service::AiLlmError;
use reqwest::StatusCode;
use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type ReviewResult<T> = Result<T, Error>;

/// Root error type for the pr-reviewer crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Listing open pull requests failed.
    #[error("list pull requests: {0}")]
    List(ProviderError),

    /// Fetching a pull request diff failed (non-200 or transport).
    #[error("fetch diff: {0}")]
    Fetch(ProviderError),

    /// The completion service call failed.
    #[error("completion: {0}")]
    Completion(#[from] AiLlmError),

    /// The model reply could not be decoded into suggestions.
    #[error("decode: {0}")]
    Decode(#[from] DecodeError),

    /// Posting one comment failed.
    #[error("publish: {0}")]
    Publish(ProviderError),

    /// Configuration problems (repository id, token, base URL).
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Whether the suggestion retry loop should try again after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Completion(_) | Error::Decode(_))
    }
}

/// Detailed hosting-service error used inside the GitHub layer.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Unauthorized (HTTP 401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Forbidden (HTTP 403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Not found (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Validation failed (HTTP 422), e.g. a position outside the diff.
    #[error("unprocessable: {0}")]
    Unprocessable(String),

    /// Rate limited (HTTP 429).
    #[error("rate limited")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Gateway/Server error (HTTP 5xx).
    #[error("server error: status {status}: {body}")]
    Server { status: u16, body: String },

    /// Other HTTP status not covered above.
    #[error("http status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Timeout at transport level.
    #[error("timeout")]
    Timeout,

    /// Network/transport failure without status (DNS/connect/reset).
    #[error("network error: {0}")]
    Network(String),

    /// Unexpected/invalid shape of provider response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Maps a non-success status plus (already trimmed) body to a variant.
    pub fn from_status(status: StatusCode, retry_after_secs: Option<u64>, body: String) -> Self {
        let code = status.as_u16();
        match code {
            401 => ProviderError::Unauthorized(body),
            403 => ProviderError::Forbidden(body),
            404 => ProviderError::NotFound(body),
            422 => ProviderError::Unprocessable(body),
            429 => ProviderError::RateLimited { retry_after_secs },
            500..=599 => ProviderError::Server { status: code, body },
            _ => ProviderError::HttpStatus { status: code, body },
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return ProviderError::Timeout;
        }
        if e.is_decode() {
            return ProviderError::InvalidResponse(e.to_string());
        }
        ProviderError::Network(e.to_string())
    }
}

/// Why a model reply could not be turned into suggestions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("reply is empty")]
    Empty,

    #[error("unexpected {found:?} at offset {offset}, expected {expected}")]
    Unexpected {
        offset: usize,
        found: char,
        expected: &'static str,
    },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: &'static str },

    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),

    #[error("invalid escape sequence at offset {0}")]
    InvalidEscape(usize),

    #[error("integer at offset {0} does not fit in u64")]
    Overflow(usize),

    #[error("nesting too deep at offset {0}")]
    TooDeep(usize),

    #[error("trailing input at offset {0}")]
    Trailing(usize),

    #[error("reply is not a list")]
    NotAList,

    #[error("record {index} has {len} fields, expected 4")]
    Arity { index: usize, len: usize },

    #[error("record {index}: {field} must be {expected}")]
    FieldType {
        index: usize,
        field: &'static str,
        expected: &'static str,
    },
}

/// Configuration and setup errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid repository identifier {0:?}: expected \"owner/name\"")]
    InvalidRepo(String),

    #[error("invalid access token: not a valid header value")]
    InvalidToken,

    #[error("invalid base api url: {0}")]
    InvalidBaseUrl(String),

    #[error("invalid comment mode {0:?}: expected \"inline\" or \"issue\"")]
    InvalidCommentMode(String),
}
