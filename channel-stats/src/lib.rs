//! Aggregates a YouTube channel's metadata and its full video list into a
//! typed table.
//!
//! The entry point is [`Aggregator`]: it resolves a channel name to an id,
//! walks the channel's search pages for video ids, fetches per-video details
//! in batches of at most fifty, and caches completed runs per
//! (channel name, credential).

pub mod batcher;
pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod resolver;
pub mod stats;
pub mod table;
pub mod walker;
pub mod youtube_api;

pub use cache::{AggregationCache, CacheKey, SingleFlightCache};
pub use config::{BatchFailurePolicy, Config};
pub use error::{Error, Result};
pub use model::{
    AggregationResult, BatchFailure, ChannelRef, ChannelSummary, Credential, VideoIdRef,
    VideoRecord,
};
pub use pipeline::{Aggregator, PendingAggregation};
pub use stats::ChannelReport;
pub use table::{VideoRow, VideoTable};
