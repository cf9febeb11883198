//! Values produced by the pipeline and threaded explicitly between its stages.

use crate::error::Error;
use jiff::Timestamp;
use jiff::civil::Date;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// An API key for the YouTube Data API.
///
/// The key is opaque: nothing inspects its structure, and a bad key is only
/// detected when the remote service rejects it. `Debug` never prints it.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(String);

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key, for placing on the wire.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

impl From<String> for Credential {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for Credential {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

/// The channel a run targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelRef {
    /// The human-readable name the caller asked for.
    pub name: String,
    /// The stable channel id, once resolved.
    pub id: Option<String>,
}

/// Channel metadata as reported by the remote service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChannelSummary {
    pub title: String,
    /// The date (UTC) the channel was created.
    pub created_at: Option<Date>,
    /// Zero when the channel hides its subscriber count.
    pub subscriber_count: u64,
    /// The channel's own figure; may differ from the number of videos discovered.
    pub declared_video_count: u64,
}

/// A video id discovered on a search page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VideoIdRef {
    pub video_id: String,
}

impl VideoIdRef {
    pub fn new(video_id: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
        }
    }
}

/// One video, flattened from its `snippet`, `statistics` and `contentDetails` parts.
///
/// Scalars the remote service omitted carry their default: an empty title, a
/// zero count, or an absent date/duration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoRecord {
    pub video_id: String,
    pub title: String,
    pub published_at: Option<Timestamp>,
    pub duration: Option<Duration>,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub category_id: Option<String>,
}

/// A detail batch that failed without aborting the run.
#[derive(Debug, Clone)]
pub struct BatchFailure {
    /// Position of the batch in discovery order.
    pub index: usize,
    pub video_ids: Vec<String>,
    pub error: Error,
}

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct AggregationResult {
    pub channel: ChannelRef,
    pub summary: ChannelSummary,
    /// Videos in discovery order, most recent first.
    pub records: Vec<VideoRecord>,
    /// Batches skipped under [`crate::config::BatchFailurePolicy::Continue`].
    pub failed_batches: Vec<BatchFailure>,
}

impl AggregationResult {
    /// Whether no detail batch was skipped.
    ///
    /// Videos the service did not return (private or deleted) do not count as
    /// failures, so `records` can still be shorter than the discovered ids.
    pub fn is_complete(&self) -> bool {
        self.failed_batches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_debug_is_redacted() {
        let credential = Credential::new("AIzaSecret");
        let printed = format!("{credential:?}");
        assert!(!printed.contains("AIzaSecret"), "{printed}");
        assert_eq!(credential.expose(), "AIzaSecret");
    }
}
