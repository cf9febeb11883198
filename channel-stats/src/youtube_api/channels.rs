//! YouTube Channels API types.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Response structure for the `channels.list` API call.
///
/// Contains a list of [`Channel`] resources that match the request criteria.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelListResponse {
    /// A list of channels that match the request criteria.
    #[serde(default)]
    pub items: VecDeque<Channel>,
}

/// A `channel` resource contains information about a YouTube channel.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels#resource>
#[derive(Debug, Serialize, Deserialize)]
pub struct Channel {
    /// The ID that YouTube uses to uniquely identify the channel.
    pub id: Option<String>,
    /// Contains basic details about the channel.
    pub snippet: Option<ChannelSnippet>,
    /// Contains statistics for the channel.
    pub statistics: Option<ChannelStatistics>,
}

/// The snippet object contains basic details about the channel.
///
/// This is a subset of the full snippet data available from the YouTube API,
/// containing only the fields currently needed by this implementation.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels#snippet>
#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelSnippet {
    /// The channel's title.
    pub title: Option<String>,
    /// The date and time that the channel was created.
    ///
    /// The value is specified in ISO 8601 format, and parsed leniently by the
    /// resolver.
    #[serde(rename = "publishedAt")]
    pub published_at: Option<String>,
}

/// Statistics for the channel.
///
/// The API encodes counts as decimal strings.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels#statistics>
#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelStatistics {
    /// The number of subscribers that the channel has.
    ///
    /// Absent when the channel hides it.
    #[serde(rename = "subscriberCount")]
    pub subscriber_count: Option<String>,
    /// The number of public videos uploaded to the channel.
    #[serde(rename = "videoCount")]
    pub video_count: Option<String>,
}
