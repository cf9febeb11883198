//! A mocked YouTube Data API for integration tests.

#![allow(dead_code)]

use serde_json::{Value, json};
use std::collections::HashSet;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};
use youtube_channel_stats::{Aggregator, Config, Credential};

pub const CHANNEL_NAME: &str = "Rustacean Station";
pub const CHANNEL_ID: &str = "UCrust";
pub const API_KEY: &str = "test-key";

pub fn credential() -> Credential {
    Credential::new(API_KEY)
}

pub fn aggregator(server: &MockServer) -> Aggregator {
    Aggregator::new(Config::default().with_api_base(server.uri())).unwrap()
}

pub fn video_id(n: usize) -> String {
    format!("vid{n:03}")
}

/// `search.list?type=channel` resolving [`CHANNEL_NAME`] to [`CHANNEL_ID`].
pub fn channel_search() -> Mock {
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("type", "channel"))
        .and(query_param("q", CHANNEL_NAME))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "id": { "channelId": CHANNEL_ID } }]
        })))
}

/// `channels.list` for [`CHANNEL_ID`].
pub fn channel_details() -> Mock {
    Mock::given(method("GET"))
        .and(path("/channels"))
        .and(query_param("id", CHANNEL_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "snippet": {
                    "title": CHANNEL_NAME,
                    "publishedAt": "2019-06-01T08:30:00Z"
                },
                "statistics": {
                    "subscriberCount": "4200",
                    "videoCount": "120"
                }
            }]
        })))
}

/// Mounts one `search.list?type=video` mock per page, chained by `p1`, `p2`, ... tokens.
///
/// Ids are numbered consecutively across pages starting at `vid000`.
pub async fn mount_video_pages(server: &MockServer, page_sizes: &[usize]) {
    let mut next_id = 0;
    for (page, &size) in page_sizes.iter().enumerate() {
        let items: Vec<Value> = (next_id..next_id + size)
            .map(|n| json!({ "id": { "videoId": video_id(n) } }))
            .collect();
        next_id += size;

        let mut body = json!({ "items": items });
        if page + 1 < page_sizes.len() {
            body["nextPageToken"] = json!(format!("p{}", page + 1));
        }

        let mock = Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("type", "video"))
            .and(query_param("channelId", CHANNEL_ID));
        let mock = if page == 0 {
            mock.and(query_param_is_missing("pageToken"))
        } else {
            mock.and(query_param("pageToken", format!("p{page}")))
        };
        mock.respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }
}

/// Answers `videos.list` with one item per requested id.
#[derive(Debug, Clone, Default)]
pub struct EchoVideos {
    /// Ids answered without a `statistics` object.
    pub without_statistics: HashSet<String>,
    /// Ids left out of the response, as if private or deleted.
    pub hidden: HashSet<String>,
    /// Response delay for batches containing one of `slow`, or for every
    /// batch when `slow` is empty.
    pub delay: Option<Duration>,
    pub slow: HashSet<String>,
}

impl EchoVideos {
    pub fn mock(self) -> Mock {
        Mock::given(method("GET"))
            .and(path("/videos"))
            .respond_with(self)
    }
}

impl Respond for EchoVideos {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let ids = requested_ids(request);
        let delayed = self.slow.is_empty() || ids.iter().any(|id| self.slow.contains(id));
        let items: Vec<Value> = ids
            .into_iter()
            .filter(|id| !self.hidden.contains(id))
            .map(|id| {
                let mut item = json!({
                    "id": id,
                    "snippet": {
                        "title": format!("Video {id}"),
                        "publishedAt": "2023-03-14T15:00:00Z",
                        "categoryId": "28"
                    },
                    "contentDetails": { "duration": "PT10M" },
                    "statistics": {
                        "viewCount": "1000",
                        "likeCount": "50",
                        "favoriteCount": "0",
                        "commentCount": "5"
                    }
                });
                if self.without_statistics.contains(&id)
                    && let Some(fields) = item.as_object_mut()
                {
                    fields.remove("statistics");
                }
                item
            })
            .collect();

        let template = ResponseTemplate::new(200).set_body_json(json!({ "items": items }));
        match self.delay {
            Some(delay) if delayed => template.set_delay(delay),
            _ => template,
        }
    }
}

/// The comma-separated `id` parameter of a `videos.list` request.
pub fn requested_ids(request: &Request) -> Vec<String> {
    request
        .url
        .query_pairs()
        .find(|(name, _)| name == "id")
        .map(|(_, ids)| ids.split(',').map(str::to_string).collect())
        .unwrap_or_default()
}

/// Number of requests the server has seen for `path`.
pub async fn request_count(server: &MockServer, path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == path)
        .count()
}

/// Batch sizes of every `videos.list` call the server has seen, in arrival order.
pub async fn detail_batch_sizes(server: &MockServer) -> Vec<usize> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == "/videos")
        .map(|request| requested_ids(request).len())
        .collect()
}

/// Google's error envelope for `status` with a single `reason`.
pub fn error_response(status: u16, reason: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "error": {
            "code": status,
            "message": message,
            "errors": [{ "reason": reason, "message": message, "domain": "youtube.quota" }]
        }
    }))
}
