//! Batched per-video detail fetching and record normalization.

use crate::error::{Error, Result};
use crate::model::{VideoIdRef, VideoRecord};
use crate::table::{coerce_count, parse_duration, parse_published_at};
use crate::youtube_api::{MAX_RESULTS_PER_REQUEST, Video, YouTubeClient};
use std::collections::{HashMap, HashSet};
use tracing::instrument;

/// Most video ids a single `videos.list` request may carry.
pub const MAX_IDS_PER_BATCH: usize = MAX_RESULTS_PER_REQUEST as usize;

/// Fetches details for one batch of ids and normalizes each returned video.
///
/// The caller chunks ids to at most [`MAX_IDS_PER_BATCH`]; a larger batch is
/// rejected before anything is sent. An empty batch returns immediately
/// without a request.
///
/// Records come back in the order of `ids`, one per requested id, so an id
/// listed twice yields two records. Ids the service did not return (private
/// or deleted videos) are skipped, and returned videos whose id was not
/// requested are dropped.
///
/// # Errors
///
/// Fails with [`Error::Normalization`] if any returned video lacks its
/// statistics, and with the client's errors if the request itself fails.
#[instrument(skip(client, ids), fields(batch_len = ids.len()))]
pub async fn fetch_details(client: &YouTubeClient, ids: &[VideoIdRef]) -> Result<Vec<VideoRecord>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    if ids.len() > MAX_IDS_PER_BATCH {
        return Err(Error::BatchTooLarge {
            len: ids.len(),
            limit: MAX_IDS_PER_BATCH,
        });
    }

    let joined = ids
        .iter()
        .map(|id| id.video_id.as_str())
        .collect::<Vec<_>>()
        .join(",");
    let response = client.list_videos_by_id(&joined).await?;

    let requested: HashSet<&str> = ids.iter().map(|id| id.video_id.as_str()).collect();
    let mut by_id: HashMap<String, Video> = HashMap::with_capacity(response.items.len());
    for video in response.items {
        match video.id.clone() {
            Some(id) if requested.contains(id.as_str()) => {
                by_id.insert(id, video);
            }
            Some(id) => tracing::warn!(video_id = %id, "dropping video that was not requested"),
            None => tracing::warn!("dropping video item without an id"),
        }
    }

    let mut records = Vec::with_capacity(ids.len());
    for id in ids {
        let Some(video) = by_id.get(&id.video_id) else {
            tracing::debug!(video_id = %id.video_id, "video not returned by the API");
            continue;
        };
        records.push(normalize(&id.video_id, video.clone())?);
    }

    Ok(records)
}

/// Flattens one `videos` item into a [`VideoRecord`].
///
/// Title, publication time and category come from the snippet, the duration
/// from the content details, and counts from the statistics (minus the
/// deprecated favorite count). Missing scalars and missing snippet or content
/// details default; a missing statistics object is an error.
pub fn normalize(video_id: &str, video: Video) -> Result<VideoRecord> {
    let Some(statistics) = video.statistics else {
        return Err(Error::Normalization {
            video_id: video_id.to_string(),
        });
    };
    let snippet = video.snippet.unwrap_or_default();
    let content_details = video.content_details.unwrap_or_default();

    Ok(VideoRecord {
        video_id: video_id.to_string(),
        title: snippet.title.unwrap_or_default(),
        published_at: snippet.published_at.as_deref().and_then(parse_published_at),
        duration: content_details.duration.as_deref().and_then(parse_duration),
        view_count: coerce_count(statistics.view_count.as_deref()),
        like_count: coerce_count(statistics.like_count.as_deref()),
        comment_count: coerce_count(statistics.comment_count.as_deref()),
        category_id: snippet.category_id,
    })
}

/// Regroups ids arriving page by page into detail batches of a fixed size.
///
/// Batches are emitted in arrival order; only the final one may be short, so
/// 120 ids always become batches of 50, 50 and 20 regardless of how the pages
/// that carried them were sized.
#[derive(Debug)]
pub struct BatchChunker {
    batch_size: usize,
    pending: Vec<VideoIdRef>,
}

impl BatchChunker {
    /// `batch_size` is clamped to 1..=[`MAX_IDS_PER_BATCH`].
    pub fn new(batch_size: usize) -> Self {
        let batch_size = batch_size.clamp(1, MAX_IDS_PER_BATCH);
        Self {
            batch_size,
            pending: Vec::with_capacity(batch_size),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Adds ids and returns every batch that is now full.
    pub fn push(&mut self, ids: impl IntoIterator<Item = VideoIdRef>) -> Vec<Vec<VideoIdRef>> {
        let mut full = Vec::new();
        for id in ids {
            self.pending.push(id);
            if self.pending.len() == self.batch_size {
                full.push(std::mem::replace(
                    &mut self.pending,
                    Vec::with_capacity(self.batch_size),
                ));
            }
        }
        full
    }

    /// Returns the final, possibly short, batch.
    pub fn finish(self) -> Option<Vec<VideoIdRef>> {
        (!self.pending.is_empty()).then_some(self.pending)
    }
}

/// Splits `ids` into detail batches of at most `batch_size`.
pub fn chunk_ids(ids: Vec<VideoIdRef>, batch_size: usize) -> Vec<Vec<VideoIdRef>> {
    let mut chunker = BatchChunker::new(batch_size);
    let mut batches = chunker.push(ids);
    batches.extend(chunker.finish());
    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube_api::{VideoContentDetails, VideoSnippet, VideoStatistics};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn ids(n: usize) -> Vec<VideoIdRef> {
        (0..n).map(|i| VideoIdRef::new(format!("v{i}"))).collect()
    }

    fn full_video(id: &str) -> Video {
        Video {
            id: Some(id.to_string()),
            snippet: Some(VideoSnippet {
                title: Some("Title".to_string()),
                published_at: Some("2023-05-01T10:00:00Z".to_string()),
                category_id: Some("20".to_string()),
            }),
            statistics: Some(VideoStatistics {
                view_count: Some("100".to_string()),
                like_count: Some("7".to_string()),
                favorite_count: Some("0".to_string()),
                comment_count: Some("2".to_string()),
            }),
            content_details: Some(VideoContentDetails {
                duration: Some("PT1M1S".to_string()),
            }),
        }
    }

    #[test]
    fn test_chunk_120_ids() {
        let sizes: Vec<_> = chunk_ids(ids(120), 50).iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![50, 50, 20]);
    }

    #[test]
    fn test_chunker_spans_pages() {
        let mut chunker = BatchChunker::new(50);
        assert!(chunker.push(ids(30)).is_empty());
        let full = chunker.push(ids(30));
        assert_eq!(full.len(), 1);
        assert_eq!(full[0].len(), 50);
        // first id of the second page sits at position 30 of the batch
        assert_eq!(full[0][30].video_id, "v0");
        assert_eq!(chunker.finish().map(|b| b.len()), Some(10));
    }

    #[test]
    fn test_chunker_clamps_batch_size() {
        assert_eq!(BatchChunker::new(500).batch_size(), MAX_IDS_PER_BATCH);
        assert_eq!(BatchChunker::new(0).batch_size(), 1);
        assert!(BatchChunker::new(50).finish().is_none());
    }

    #[test]
    fn test_normalize_full_video() {
        let record = normalize("abc", full_video("abc")).unwrap();
        assert_eq!(record.video_id, "abc");
        assert_eq!(record.title, "Title");
        assert_eq!(record.view_count, 100);
        assert_eq!(record.like_count, 7);
        assert_eq!(record.comment_count, 2);
        assert_eq!(record.duration, Some(Duration::from_secs(61)));
        assert_eq!(record.category_id.as_deref(), Some("20"));
        assert!(record.published_at.is_some());
    }

    #[test]
    fn test_normalize_defaults_missing_scalars() {
        let mut video = full_video("abc");
        video.snippet = None;
        video.content_details = None;
        video.statistics = Some(VideoStatistics {
            view_count: Some("12".to_string()),
            like_count: None,
            favorite_count: None,
            comment_count: Some("lots".to_string()),
        });

        let record = normalize("abc", video).unwrap();
        assert_eq!(record.title, "");
        assert_eq!(record.published_at, None);
        assert_eq!(record.duration, None);
        assert_eq!(record.view_count, 12);
        assert_eq!(record.like_count, 0);
        assert_eq!(record.comment_count, 0);
    }

    #[test]
    fn test_normalize_requires_statistics() {
        let mut video = full_video("abc");
        video.statistics = None;
        let err = normalize("abc", video).unwrap_err();
        assert!(
            matches!(&err, Error::Normalization { video_id } if video_id == "abc"),
            "{err:?}"
        );
    }
}
