//! Typed table over normalized video records, with derived columns.
//!
//! The coercion helpers here are the single place where lenient parsing of
//! remote values lives: a bad count becomes `0`, a bad duration or date
//! becomes `None`. Nothing in this module fails.

use crate::model::VideoRecord;
use jiff::Timestamp;
use jiff::civil::Date;
use jiff::tz::TimeZone;
use serde::Serialize;
use std::time::Duration;

/// Parses a count the API sent as a decimal string, treating anything else as zero.
pub fn coerce_count(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(0)
}

/// Parses a video length of the form `PT#H#M#S`.
///
/// Accepted shapes are `PT#H#M#S`, `PT#H#M`, `PT#M#S`, `PT#H`, `PT#M` and
/// `PT#S`. Anything else, including day components (`P1DT2H`), hours with
/// seconds but no minutes (`PT1H5S`) and the `P0D` that live streams report,
/// yields `None`.
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let mut rest = raw.trim().strip_prefix("PT")?;

    let mut parts = [None; 3];
    for (slot, unit) in ['H', 'M', 'S'].into_iter().enumerate() {
        let Some(pos) = rest.find(unit) else {
            continue;
        };
        let digits = &rest[..pos];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        parts[slot] = Some(digits.parse::<u64>().ok()?);
        rest = &rest[pos + 1..];
    }
    if !rest.is_empty() {
        return None;
    }

    let secs = match parts {
        [Some(h), Some(m), Some(s)] => h.checked_mul(3600)?.checked_add(m.checked_mul(60)?)?.checked_add(s)?,
        [Some(h), Some(m), None] => h.checked_mul(3600)?.checked_add(m.checked_mul(60)?)?,
        [None, Some(m), Some(s)] => m.checked_mul(60)?.checked_add(s)?,
        [Some(h), None, None] => h.checked_mul(3600)?,
        [None, Some(m), None] => m.checked_mul(60)?,
        [None, None, Some(s)] => s,
        _ => return None,
    };
    Some(Duration::from_secs(secs))
}

/// Parses a publication time, accepting a full RFC 3339 timestamp or a bare date (taken as UTC midnight).
pub fn parse_published_at(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(ts) = raw.parse::<Timestamp>() {
        return Some(ts);
    }
    let first = raw.split_whitespace().next()?;
    let date: Date = first.parse().ok()?;
    date.to_zoned(TimeZone::UTC).ok().map(|zoned| zoned.timestamp())
}

/// `part` as a percentage of `whole`, rounded to two decimals; `None` when `whole` is zero.
pub fn percentage(part: u64, whole: u64) -> Option<f64> {
    if whole == 0 {
        return None;
    }
    Some(round2(part as f64 / whole as f64 * 100.0))
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One row of the table: a record plus its derived columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoRow {
    pub video_id: String,
    pub title: String,
    pub published_at: Option<Timestamp>,
    /// UTC calendar date of `published_at`.
    pub published_on: Option<Date>,
    pub duration_secs: Option<u64>,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub category_id: Option<String>,
    pub upload_year: Option<i16>,
    /// Full English month name, e.g. `March`.
    pub upload_month: Option<String>,
    /// Full English weekday name, e.g. `Tuesday`.
    pub upload_day: Option<String>,
    /// Likes as a percentage of views.
    pub like_ratio: Option<f64>,
    /// Comments as a percentage of views.
    pub comment_ratio: Option<f64>,
}

impl VideoRow {
    pub fn from_record(record: &VideoRecord) -> Self {
        let published_on = record
            .published_at
            .map(|ts| ts.to_zoned(TimeZone::UTC).date());

        Self {
            video_id: record.video_id.clone(),
            title: record.title.clone(),
            published_at: record.published_at,
            published_on,
            duration_secs: record.duration.map(|d| d.as_secs()),
            view_count: record.view_count,
            like_count: record.like_count,
            comment_count: record.comment_count,
            category_id: record.category_id.clone(),
            upload_year: published_on.map(|date| date.year()),
            upload_month: published_on.map(|date| date.strftime("%B").to_string()),
            upload_day: published_on.map(|date| date.strftime("%A").to_string()),
            like_ratio: percentage(record.like_count, record.view_count),
            comment_ratio: percentage(record.comment_count, record.view_count),
        }
    }
}

/// The aggregated table, in record order (most recent first).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VideoTable {
    rows: Vec<VideoRow>,
}

impl VideoTable {
    pub fn from_records(records: &[VideoRecord]) -> Self {
        Self {
            rows: records.iter().map(VideoRow::from_record).collect(),
        }
    }

    pub fn rows(&self) -> &[VideoRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FromIterator<VideoRow> for VideoTable {
    fn from_iter<I: IntoIterator<Item = VideoRow>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}
