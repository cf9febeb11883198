//! Channel name → id → summary resolution.

use crate::error::{Error, Result};
use crate::model::ChannelSummary;
use crate::table::{coerce_count, parse_published_at};
use crate::youtube_api::{Channel, YouTubeClient};
use jiff::tz::TimeZone;
use tracing::instrument;

/// Resolves a human-readable channel name to the id of the best-matching channel.
///
/// # Errors
///
/// [`Error::NotFound`] when the search matched no channel. This is a normal
/// outcome, distinct from the remote errors the search itself can produce.
#[instrument(skip(client))]
pub async fn resolve_channel_id(client: &YouTubeClient, name: &str) -> Result<String> {
    let response = client.search_channels(name).await?;
    let channel_id = response
        .items
        .into_iter()
        .find_map(|item| item.id.and_then(|id| id.channel_id))
        .ok_or_else(|| Error::not_found("channel", name))?;

    tracing::debug!(%channel_id, "resolved channel");
    Ok(channel_id)
}

/// Fetches title, creation date and counts for a channel id.
///
/// # Errors
///
/// [`Error::NotFound`] when the id no longer resolves, which can happen if the
/// channel disappeared after [`resolve_channel_id`] found it.
#[instrument(skip(client))]
pub async fn fetch_summary(client: &YouTubeClient, channel_id: &str) -> Result<ChannelSummary> {
    let response = client.list_channels_by_id(channel_id).await?;
    let channel = response
        .items
        .into_iter()
        .next()
        .ok_or_else(|| Error::not_found("channel id", channel_id))?;
    Ok(summarize(channel))
}

fn summarize(channel: Channel) -> ChannelSummary {
    let (title, created_at) = match channel.snippet {
        Some(snippet) => (
            snippet.title.unwrap_or_default(),
            snippet
                .published_at
                .as_deref()
                .and_then(parse_published_at)
                .map(|ts| ts.to_zoned(TimeZone::UTC).date()),
        ),
        None => (String::new(), None),
    };
    let (subscriber_count, declared_video_count) = match channel.statistics {
        Some(statistics) => (
            coerce_count(statistics.subscriber_count.as_deref()),
            coerce_count(statistics.video_count.as_deref()),
        ),
        None => (0, 0),
    };

    ChannelSummary {
        title,
        created_at,
        subscriber_count,
        declared_video_count,
    }
}
