//! YouTube Search API types.

use serde::{Deserialize, Serialize};

/// Response structure for the `search.list` API call.
///
/// Requests always carry a `fields` projection, so everything except `items`
/// may be missing, and `items` itself is absent when nothing matched.
///
/// See: <https://developers.google.com/youtube/v3/docs/search/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchListResponse {
    /// Search results, in the order the service ranked them.
    #[serde(default)]
    pub items: Vec<SearchResult>,
    /// Token that can be used as the value of the pageToken parameter to retrieve the next page in the result set.
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// A search result.
///
/// See: <https://developers.google.com/youtube/v3/docs/search#resource>
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResult {
    /// Identifies the resource that matched the search request.
    pub id: Option<ResourceId>,
}

/// The id of whichever resource a search result points at.
///
/// Only the member matching the result's kind is present.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ResourceId {
    #[serde(rename = "channelId")]
    pub channel_id: Option<String>,
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
}
