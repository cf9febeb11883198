//! Summary statistics over a [`VideoTable`].
//!
//! These are thin reducers: each one walks the rows once and never fails.

use crate::model::{AggregationResult, ChannelRef, ChannelSummary};
use crate::table::{VideoRow, VideoTable, round2};
use jiff::civil::Weekday;
use serde::Serialize;
use std::collections::BTreeMap;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Monday,
    Weekday::Tuesday,
    Weekday::Wednesday,
    Weekday::Thursday,
    Weekday::Friday,
    Weekday::Saturday,
    Weekday::Sunday,
];

/// A title and the count that made it stand out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopVideo {
    pub video_id: String,
    pub title: String,
    pub count: u64,
}

/// One entry of a views leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedVideo {
    pub video_id: String,
    pub title: String,
    pub views: u64,
    pub likes: u64,
}

/// Uploads in one calendar month of one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyUploads {
    pub year: i16,
    pub month: &'static str,
    pub uploads: usize,
}

/// Views of the videos uploaded in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyViews {
    pub month: &'static str,
    pub views: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekdayUploads {
    pub day: String,
    pub uploads: usize,
}

fn top_by(table: &VideoTable, count: impl Fn(&VideoRow) -> u64) -> Option<TopVideo> {
    // max_by_key keeps the last maximum; reverse so ties go to the most recent upload
    table
        .rows()
        .iter()
        .rev()
        .max_by_key(|row| count(row))
        .map(|row| TopVideo {
            video_id: row.video_id.clone(),
            title: row.title.clone(),
            count: count(row),
        })
}

pub fn most_viewed(table: &VideoTable) -> Option<TopVideo> {
    top_by(table, |row| row.view_count)
}

pub fn most_liked(table: &VideoTable) -> Option<TopVideo> {
    top_by(table, |row| row.like_count)
}

pub fn most_commented(table: &VideoTable) -> Option<TopVideo> {
    top_by(table, |row| row.comment_count)
}

/// The `n` most viewed videos, most viewed first. Equal view counts keep
/// record order, so the more recent upload ranks higher.
pub fn top_by_views(table: &VideoTable, n: usize) -> Vec<RankedVideo> {
    let mut rows: Vec<&VideoRow> = table.rows().iter().collect();
    rows.sort_by(|a, b| b.view_count.cmp(&a.view_count));
    rows.into_iter()
        .take(n)
        .map(|row| RankedVideo {
            video_id: row.video_id.clone(),
            title: row.title.clone(),
            views: row.view_count,
            likes: row.like_count,
        })
        .collect()
}

pub fn total_views(table: &VideoTable) -> u64 {
    table.rows().iter().map(|row| row.view_count).sum()
}

pub fn total_likes(table: &VideoTable) -> u64 {
    table.rows().iter().map(|row| row.like_count).sum()
}

pub fn total_comments(table: &VideoTable) -> u64 {
    table.rows().iter().map(|row| row.comment_count).sum()
}

/// Total length of all videos with a known duration, in hours, to two decimals.
pub fn content_length_hours(table: &VideoTable) -> f64 {
    let secs: u64 = table.rows().iter().filter_map(|row| row.duration_secs).sum();
    round2(secs as f64 / 3600.0)
}

/// Distinct upload years, ascending.
pub fn years(table: &VideoTable) -> Vec<i16> {
    let mut years: Vec<_> = table.rows().iter().filter_map(|row| row.upload_year).collect();
    years.sort_unstable();
    years.dedup();
    years
}

/// Number of uploads per (year, month), in calendar order. Empty months are left out.
pub fn uploads_per_year_month(table: &VideoTable) -> Vec<MonthlyUploads> {
    let mut buckets: BTreeMap<(i16, i8), usize> = BTreeMap::new();
    for date in table.rows().iter().filter_map(|row| row.published_on) {
        *buckets.entry((date.year(), date.month())).or_default() += 1;
    }
    buckets
        .into_iter()
        .map(|((year, month), uploads)| MonthlyUploads {
            year,
            month: month_name(month),
            uploads,
        })
        .collect()
}

/// Total views per calendar month for videos uploaded in `year`.
///
/// When `year` has no uploads (or is `None`), the most recent upload year is
/// used instead. Months without uploads are left out.
pub fn views_per_month(table: &VideoTable, year: Option<i16>) -> Vec<MonthlyViews> {
    let years = years(table);
    let year = match year {
        Some(year) if years.contains(&year) => year,
        _ => match years.last() {
            Some(&latest) => latest,
            None => return Vec::new(),
        },
    };

    let mut buckets: BTreeMap<i8, u64> = BTreeMap::new();
    for row in table.rows() {
        if let Some(date) = row.published_on
            && date.year() == year
        {
            *buckets.entry(date.month()).or_default() += row.view_count;
        }
    }
    buckets
        .into_iter()
        .map(|(month, views)| MonthlyViews {
            month: month_name(month),
            views,
        })
        .collect()
}

/// Number of uploads per weekday, Monday first, including days with none.
pub fn uploads_per_weekday(table: &VideoTable) -> Vec<WeekdayUploads> {
    WEEKDAYS
        .iter()
        .map(|&weekday| WeekdayUploads {
            day: format!("{weekday:?}"),
            uploads: table
                .rows()
                .iter()
                .filter(|row| row.published_on.map(|date| date.weekday()) == Some(weekday))
                .count(),
        })
        .collect()
}

/// The `n` most recent uploads. Rows are already most-recent-first.
pub fn most_recent(table: &VideoTable, n: usize) -> &[VideoRow] {
    &table.rows()[..n.min(table.len())]
}

fn month_name(month: i8) -> &'static str {
    usize::try_from(month - 1)
        .ok()
        .and_then(|index| MONTHS.get(index))
        .copied()
        .unwrap_or("Unknown")
}

/// Rows listed under [`ChannelReport::recent_uploads`].
pub const RECENT_UPLOADS: usize = 5;

/// Entries in [`ChannelReport::top_videos`].
pub const TOP_VIDEOS: usize = 10;

/// Everything the CLI prints for a channel.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelReport {
    pub channel: ChannelRef,
    pub summary: ChannelSummary,
    pub discovered_videos: usize,
    pub failed_batches: usize,
    pub total_views: u64,
    pub total_likes: u64,
    pub total_comments: u64,
    pub content_length_hours: f64,
    pub most_viewed: Option<TopVideo>,
    pub most_liked: Option<TopVideo>,
    pub most_commented: Option<TopVideo>,
    pub top_videos: Vec<RankedVideo>,
    pub uploads_per_year_month: Vec<MonthlyUploads>,
    pub uploads_per_weekday: Vec<WeekdayUploads>,
    pub views_per_month_latest_year: Vec<MonthlyViews>,
    pub recent_uploads: Vec<VideoRow>,
}

impl ChannelReport {
    pub fn new(result: &AggregationResult, table: &VideoTable) -> Self {
        Self {
            channel: result.channel.clone(),
            summary: result.summary.clone(),
            discovered_videos: table.len(),
            failed_batches: result.failed_batches.len(),
            total_views: total_views(table),
            total_likes: total_likes(table),
            total_comments: total_comments(table),
            content_length_hours: content_length_hours(table),
            most_viewed: most_viewed(table),
            most_liked: most_liked(table),
            most_commented: most_commented(table),
            top_videos: top_by_views(table, TOP_VIDEOS),
            uploads_per_year_month: uploads_per_year_month(table),
            uploads_per_weekday: uploads_per_weekday(table),
            views_per_month_latest_year: views_per_month(table, None),
            recent_uploads: most_recent(table, RECENT_UPLOADS).to_vec(),
        }
    }
}
