//! Errors surfaced by the aggregation pipeline.
//!
//! Field-level defects in remote payloads (an unparseable duration, a
//! non-numeric count, a missing scalar) are never errors; they degrade to a
//! defaulted value during normalization. Everything in [`Error`] is a
//! structured failure the caller is expected to present.

use std::sync::Arc;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every failure the pipeline can produce.
///
/// The type is [`Clone`] so that a single failed computation can be handed to
/// every caller waiting on it in the [`crate::cache::SingleFlightCache`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The remote service answered with a non-2xx status.
    #[error("YouTube API request failed with status {status}: {message}")]
    Remote {
        /// HTTP status code.
        status: u16,
        /// The first `reason` of Google's error envelope, e.g. `quotaExceeded`.
        code: Option<String>,
        /// Human-readable category for `status`.
        message: String,
        /// The message the remote service sent, if any.
        detail: Option<String>,
    },

    /// The response body did not match the expected schema.
    #[error("decode YouTube {endpoint} response")]
    Decode {
        endpoint: &'static str,
        #[source]
        cause: Arc<serde_json::Error>,
    },

    /// The query succeeded but matched nothing.
    #[error("{resource} not found: {key}")]
    NotFound { resource: &'static str, key: String },

    /// A video in a detail batch came back without its statistics.
    #[error("video {video_id} has no statistics")]
    Normalization { video_id: String },

    /// A detail batch carried more ids than the remote service accepts.
    #[error("detail batch of {len} ids exceeds the per-request limit of {limit}")]
    BatchTooLarge { len: usize, limit: usize },

    /// The request never produced a response (connect, timeout, body read).
    #[error("send request to YouTube API")]
    Transport(#[source] Arc<reqwest::Error>),

    /// The run was abandoned before it completed.
    #[error("aggregation was cancelled")]
    Cancelled,
}

impl Error {
    pub(crate) fn remote(status: u16, code: Option<String>, detail: Option<String>) -> Self {
        Error::Remote {
            status,
            code,
            message: status_message(status).to_string(),
            detail,
        }
    }

    pub(crate) fn decode(endpoint: &'static str, cause: serde_json::Error) -> Self {
        Error::Decode {
            endpoint,
            cause: Arc::new(cause),
        }
    }

    pub(crate) fn not_found(resource: &'static str, key: impl Into<String>) -> Self {
        Error::NotFound {
            resource,
            key: key.into(),
        }
    }

    /// The request URL is stripped: it carries the `key` query parameter.
    pub(crate) fn transport(error: reqwest::Error) -> Self {
        Error::Transport(Arc::new(error.without_url()))
    }

    /// HTTP status of a [`Error::Remote`], `None` for every other variant.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a caller-side retry has a reasonable chance of succeeding.
    ///
    /// The client itself never retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Remote { status, .. } => *status == 429 || *status >= 500,
            Error::Transport(_) => true,
            _ => false,
        }
    }

    /// Whether this failure is scoped to one detail batch rather than the whole run.
    pub fn is_batch_scoped(&self) -> bool {
        matches!(self, Error::Normalization { .. })
    }
}

/// Maps an HTTP status to the category message shown to users.
pub fn status_message(status: u16) -> &'static str {
    match status {
        400 => "The API request was malformed, invalid API key",
        401 => {
            "The request requires authentication and the API credentials provided are invalid or missing"
        }
        403 => {
            "The API request is not authorized to access the requested resource or the API quota has been exceeded"
        }
        404 => "The requested resource is not found",
        429 => "The API quota has been exceeded",
        500 => {
            "The server encountered an unexpected error while fulfilling the request, retry the request"
        }
        _ => "The YouTube API returned an unexpected status",
    }
}
