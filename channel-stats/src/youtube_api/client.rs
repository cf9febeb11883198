//! Core YouTube API client functionality.

use crate::error::{Error, Result};
use crate::model::Credential;
use crate::youtube_api::{
    channels::ChannelListResponse, search::SearchListResponse, videos::VideoListResponse,
};
use bytes::Bytes;
use http::Method;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use tracing::instrument;

/// Base URL of the YouTube Data API v3.
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Most items a list endpoint returns per page, and most ids `videos.list` accepts.
pub const MAX_RESULTS_PER_REQUEST: u32 = 50;

/// The API resources this crate reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Search,
    Channels,
    Videos,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Search => "search",
            Endpoint::Channels => "channels",
            Endpoint::Videos => "videos",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Google's JSON error envelope.
///
/// See: <https://developers.google.com/youtube/v3/docs/errors>
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    reason: Option<String>,
}

/// Client for the read-only parts of the YouTube Data API v3.
///
/// Every request is a GET authenticated with an API key passed as the `key`
/// query parameter. Clones share the underlying [`reqwest::Client`], and with
/// it the connection pool, so one client (or its clones) should serve a whole
/// pipeline run.
///
/// The client does not retry. A failed request surfaces as an [`Error`] and
/// [`Error::is_retryable`] tells the caller whether trying again makes sense.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    /// The API key sent with every request.
    credential: Credential,
    /// Base URL that endpoint names are appended to.
    api_base: Arc<str>,
    /// HTTP client for API requests
    client: reqwest::Client,
}

impl YouTubeClient {
    /// Creates a client that talks to `api_base` using the shared HTTP `client`.
    pub fn new(credential: Credential, api_base: impl Into<Arc<str>>, client: reqwest::Client) -> Self {
        let api_base: Arc<str> = api_base.into();
        Self {
            credential,
            api_base: Arc::from(api_base.trim_end_matches('/')),
            client,
        }
    }

    /// Returns a reference to the underlying HTTP client.
    pub fn http_client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Issues a GET against `endpoint` and returns the decoded JSON body.
    ///
    /// # Errors
    ///
    /// * [`Error::Remote`] when the service answers with a non-2xx status
    /// * [`Error::Decode`] when the body is not JSON
    /// * [`Error::Transport`] when no response could be read
    pub async fn request(
        &self,
        endpoint: Endpoint,
        params: &[(&str, &str)],
    ) -> Result<serde_json::Value> {
        self.get(endpoint, params).await
    }

    /// Issues a GET against `endpoint` and decodes the body as `T`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let body = self.send(endpoint, params).await?;
        serde_json::from_slice(&body).map_err(|e| Error::decode(endpoint.as_str(), e))
    }

    /// Sends the request and returns the raw body of a successful response.
    ///
    /// This method consolidates the shared logic across all requests: URL
    /// construction, the `key` parameter, and status code validation.
    #[instrument(skip(self), level = tracing::Level::TRACE, err)]
    async fn send(&self, endpoint: Endpoint, params: &[(&str, &str)]) -> Result<Bytes> {
        let url = format!("{}/{}", self.api_base, endpoint);

        let response = self
            .client
            .request(Method::GET, &url)
            .query(params)
            .query(&[("key", self.credential.expose())])
            .send()
            .await
            .map_err(Error::transport)?;

        let status_code = response.status();
        let body = response.bytes().await.map_err(Error::transport)?;

        if !status_code.is_success() {
            let (code, detail) = match serde_json::from_slice::<ErrorEnvelope>(&body) {
                Ok(envelope) => (
                    envelope
                        .error
                        .errors
                        .into_iter()
                        .find_map(|detail| detail.reason),
                    envelope.error.message,
                ),
                Err(_) => (None, Some(String::from_utf8_lossy(&body).into_owned())),
            };
            tracing::debug!(
                %endpoint,
                status = status_code.as_u16(),
                reason = ?code,
                "YouTube API request failed"
            );
            return Err(Error::remote(status_code.as_u16(), code, detail));
        }

        Ok(body)
    }

    /// Calls `search.list` restricted to channels, with `q` set to `query`.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/search/list>
    #[instrument(skip(self))]
    pub async fn search_channels(&self, query: &str) -> Result<SearchListResponse> {
        let query_params = [
            ("part", "id"),
            ("type", "channel"),
            ("q", query),
            ("fields", "items(id(channelId))"),
        ];

        let response: SearchListResponse = self.get(Endpoint::Search, &query_params).await?;

        tracing::debug!(
            returned_items = response.items.len(),
            "searched for channel"
        );

        Ok(response)
    }

    /// Calls `search.list` for one page of a channel's videos, newest first.
    ///
    /// # Arguments
    ///
    /// * `channel_id` - The channel whose uploads to list
    /// * `max_results` - Page size, clamped to 1..=50
    /// * `page_token` - Cursor from the previous page, `None` for the first
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/search/list>
    #[instrument(skip(self))]
    pub async fn search_channel_videos(
        &self,
        channel_id: &str,
        max_results: u32,
        page_token: Option<String>,
    ) -> Result<SearchListResponse> {
        let max_results_string = max_results.clamp(1, MAX_RESULTS_PER_REQUEST).to_string();
        let mut query_params = vec![
            ("part", "id"),
            ("channelId", channel_id),
            ("order", "date"),
            ("type", "video"),
            ("maxResults", max_results_string.as_str()),
            ("fields", "nextPageToken,items(id(videoId))"),
        ];

        // Add pageToken if provided
        if let Some(ref token) = page_token {
            query_params.push(("pageToken", token.as_str()));
        }

        let response: SearchListResponse = self.get(Endpoint::Search, &query_params).await?;

        tracing::debug!(
            returned_items = response.items.len(),
            has_next_page = response.next_page_token.is_some(),
            "fetched page of channel videos"
        );

        Ok(response)
    }

    /// Calls `channels.list` for a single channel id, with snippet and statistics.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/channels/list>
    #[instrument(skip(self))]
    pub async fn list_channels_by_id(&self, channel_id: &str) -> Result<ChannelListResponse> {
        let query_params = [
            ("part", "snippet,statistics"),
            ("id", channel_id),
            (
                "fields",
                "items(snippet(title,publishedAt),statistics(subscriberCount,videoCount))",
            ),
        ];

        let response: ChannelListResponse = self.get(Endpoint::Channels, &query_params).await?;

        tracing::debug!(
            returned_items = response.items.len(),
            "fetched channel"
        );

        Ok(response)
    }

    /// Calls `videos.list` for a comma-joined list of at most 50 video ids.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/videos/list>
    #[instrument(skip(self, video_ids), fields(ids = video_ids.split(',').count()))]
    pub async fn list_videos_by_id(&self, video_ids: &str) -> Result<VideoListResponse> {
        let query_params = [
            ("part", "snippet,statistics,contentDetails"),
            ("id", video_ids),
            (
                "fields",
                "items(id,contentDetails(duration),snippet(title,categoryId,publishedAt),statistics)",
            ),
        ];

        let response: VideoListResponse = self.get(Endpoint::Videos, &query_params).await?;

        tracing::debug!(
            returned_items = response.items.len(),
            "fetched video details"
        );

        Ok(response)
    }
}
