//! Error types for the temporary mailbox client.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur while talking to the mailbox service.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// An endpoint URL could not be built from the base URL.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The server answered with a non-success status.
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// A periodic task was configured with a zero interval.
    #[error("interval of `{task}` must be non-zero")]
    InvalidInterval { task: &'static str },

    /// The operation needs an active identity and the session has none.
    #[error("no active mailbox identity")]
    NoIdentity,
}
