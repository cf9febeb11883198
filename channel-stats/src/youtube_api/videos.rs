//! YouTube Videos API types.

use serde::{Deserialize, Serialize};

/// Response structure for the `videos.list` API call.
///
/// Videos that are private or deleted are silently left out of `items`.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct VideoListResponse {
    /// A list of videos that match the request criteria.
    #[serde(default)]
    pub items: Vec<Video>,
}

/// A `video` resource represents a YouTube video.
///
/// Every part is optional on the wire: the `fields` projection and the
/// video's own settings decide what comes back.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos#resource>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    /// The ID that YouTube uses to uniquely identify the video.
    pub id: Option<String>,
    /// Basic details about the video.
    pub snippet: Option<VideoSnippet>,
    /// Contains statistics about the video.
    pub statistics: Option<VideoStatistics>,
    /// Information about the video content, including its length.
    #[serde(rename = "contentDetails")]
    pub content_details: Option<VideoContentDetails>,
}

/// Basic details about the video.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos#snippet>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoSnippet {
    /// The video's title.
    pub title: Option<String>,
    /// The date and time that the video was published, in ISO 8601 format.
    ///
    /// Kept as text so a malformed value degrades instead of failing the batch.
    #[serde(rename = "publishedAt")]
    pub published_at: Option<String>,
    /// The YouTube video category associated with the video.
    #[serde(rename = "categoryId")]
    pub category_id: Option<String>,
}

/// Statistics about the video.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos#statistics>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoStatistics {
    /// The number of times the video has been viewed.
    #[serde(rename = "viewCount")]
    pub view_count: Option<String>,
    /// The number of users who have indicated that they liked the video.
    ///
    /// Absent when the owner hides likes.
    #[serde(rename = "likeCount")]
    pub like_count: Option<String>,
    /// The number of users who currently have the video marked as a favorite video.
    /// Note: This property is deprecated and always returns 0.
    #[serde(rename = "favoriteCount")]
    pub favorite_count: Option<String>,
    /// The number of comments for the video.
    ///
    /// Absent when comments are disabled.
    #[serde(rename = "commentCount")]
    pub comment_count: Option<String>,
}

/// Information about the video content.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos#contentDetails>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoContentDetails {
    /// The length of the video as an ISO 8601 duration, e.g. `PT15M33S`.
    pub duration: Option<String>,
}
