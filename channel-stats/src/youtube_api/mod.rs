//! YouTube Data API v3 client library.
//!
//! This module covers the three read-only resources a channel aggregation
//! needs, all authenticated with a plain API key:
//!
//! - `search`: resolves a channel name to its id, and lists a channel's
//!   video ids page by page (newest first)
//! - `channels`: channel title, creation date and counts
//! - `videos`: per-video snippet, statistics and content details, up to 50
//!   ids per request
//!
//! Every request carries a `fields` projection, so the wire types here treat
//! nearly every member as optional.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use youtube_channel_stats::Credential;
//! use youtube_channel_stats::youtube_api::{DEFAULT_API_BASE, YouTubeClient};
//!
//! # async fn example() -> youtube_channel_stats::Result<()> {
//! let client = YouTubeClient::new(
//!     Credential::new("my-api-key"),
//!     DEFAULT_API_BASE,
//!     reqwest::Client::new(),
//! );
//! let found = client.search_channels("Rust").await?;
//! println!("{} matches", found.items.len());
//! # Ok(())
//! # }
//! ```

pub mod channels;
pub mod client;
pub mod search;
pub mod types;
pub mod videos;

// Re-export main types for convenience
pub use client::{DEFAULT_API_BASE, Endpoint, MAX_RESULTS_PER_REQUEST, YouTubeClient};
pub use types::{Page, PageStream};

pub use channels::{Channel, ChannelListResponse, ChannelSnippet, ChannelStatistics};
pub use search::{ResourceId, SearchListResponse, SearchResult};
pub use videos::{Video, VideoContentDetails, VideoListResponse, VideoSnippet, VideoStatistics};
