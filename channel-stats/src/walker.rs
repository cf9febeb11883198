//! Paginated discovery of a channel's video ids.

use crate::error::Result;
use crate::model::VideoIdRef;
use crate::youtube_api::{Page, PageStream, SearchResult, YouTubeClient};
use tokio_stream::Stream;

/// Walks a channel's uploads newest first, one page of video ids at a time.
///
/// The stream is lazy and strictly sequential: the request for page N+1
/// carries page N's token and is only sent once page N has been consumed.
/// It ends after the first page without a `nextPageToken`, or right after
/// yielding an error. Pages are passed through as received, without
/// reordering or deduplication. Every call starts again from the first page.
///
/// Search items that lack a video id are dropped.
pub fn walk<'a>(
    client: &'a YouTubeClient,
    channel_id: &'a str,
    page_size: u32,
) -> impl Stream<Item = Result<Page<VideoIdRef>>> + use<'a> {
    PageStream::new(move |page_token| async move {
        let response = client
            .search_channel_videos(channel_id, page_size, page_token)
            .await?;
        Ok(Page {
            items: video_ids(response.items),
            next_page_token: response.next_page_token,
        })
    })
}

fn video_ids(items: Vec<SearchResult>) -> Vec<VideoIdRef> {
    let total = items.len();
    let ids: Vec<_> = items
        .into_iter()
        .filter_map(|item| item.id.and_then(|id| id.video_id))
        .map(VideoIdRef::new)
        .collect();
    if ids.len() != total {
        tracing::debug!(
            dropped = total - ids.len(),
            "dropped search items without a video id"
        );
    }
    ids
}
