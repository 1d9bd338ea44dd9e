//! The FreeTube history record shape and the NewPipe → FreeTube field mapping.
//!
//! FreeTube imports watch history as newline-delimited JSON, one object per line.
//! The mapping is fixed: one `streams` row plus its optional playback position and
//! last-access timestamp produce exactly one record. Mapping is a pure function;
//! unmappable input is an explicit [`MapError`] value, never a panic, and the
//! drivers turn it into a bad row instead of aborting the run.

use crate::newpipe::StreamRow;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One line of a FreeTube history file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub video_id: String,
    pub title: String,
    pub author: String,
    pub author_id: String,
    /// Upload date, passed through with whatever type NewPipe stored.
    pub published: Value,
    /// FreeTube expects the field, NewPipe has no description. Always empty.
    pub description: String,
    pub view_count: i64,
    pub length_seconds: i64,
    /// Playback position in whole seconds.
    pub watch_progress: i64,
    /// Last-access timestamp, 0 when the stream was never watched.
    pub time_watched: i64,
    pub is_live: bool,
    pub paid: bool,
    #[serde(rename = "type")]
    pub kind: String,
}

/// A stream that could not be converted, with enough context to retry it later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadRow {
    pub uid: Option<i64>,
    pub url: Option<String>,
    pub error: String,
}

/// Why a stream row could not be mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapError {
    /// `streams.url` is NULL, so there is nothing to derive a video id from.
    MissingUrl,
    /// `streams.uploader_url` is NULL, so there is nothing to derive a channel id from.
    MissingUploaderUrl,
}

impl std::fmt::Display for MapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapError::MissingUrl => write!(f, "stream has no url; cannot derive videoId"),
            MapError::MissingUploaderUrl => {
                write!(f, "stream has no uploader_url; cannot derive authorId")
            }
        }
    }
}

impl std::error::Error for MapError {}

/// Map one stream row plus its optional related lookups to a FreeTube record.
///
/// Null text fields become empty strings and null numeric fields become zero,
/// except `url` and `uploader_url`, which the id derivations require.
pub fn map_stream(
    stream: &StreamRow,
    progress_ms: Option<i64>,
    access_date: Option<i64>,
) -> Result<HistoryRecord, MapError> {
    let url = stream.url.as_deref().ok_or(MapError::MissingUrl)?;
    let uploader_url = stream
        .uploader_url
        .as_deref()
        .ok_or(MapError::MissingUploaderUrl)?;

    Ok(HistoryRecord {
        video_id: video_id_from_url(url),
        title: stream.title.clone().unwrap_or_default(),
        author: stream.uploader.clone().unwrap_or_default(),
        author_id: channel_id_from_url(uploader_url),
        published: match &stream.upload_date {
            Value::Null => Value::String(String::new()),
            other => other.clone(),
        },
        description: String::new(),
        view_count: stream.view_count.unwrap_or(0),
        length_seconds: stream.duration.unwrap_or(0),
        watch_progress: progress_ms.unwrap_or(0).div_euclid(1000),
        time_watched: access_date.unwrap_or(0),
        is_live: false,
        paid: false,
        kind: "video".to_string(),
    })
}

/// The video id embedded after the last `?v=` marker.
///
/// NewPipe watch URLs always carry the marker; if it is somehow absent, fall back
/// to the trimmed remainder after the last `=` rather than erroring.
fn video_id_from_url(url: &str) -> String {
    match url.rfind("?v=") {
        Some(idx) => url[idx + 3..].to_string(),
        None => url.rsplit('=').next().unwrap_or(url).trim().to_string(),
    }
}

/// The channel id after the last `channel/` marker, or the whole string without one.
fn channel_id_from_url(url: &str) -> String {
    match url.rfind("channel/") {
        Some(idx) => url[idx + "channel/".len()..].to_string(),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(url: Option<&str>, uploader_url: Option<&str>) -> StreamRow {
        StreamRow {
            uid: 1,
            url: url.map(String::from),
            title: Some("A title".to_string()),
            uploader: Some("A channel".to_string()),
            uploader_url: uploader_url.map(String::from),
            upload_date: serde_json::json!(1673740800000i64),
            view_count: Some(1000),
            duration: Some(300),
        }
    }

    #[test]
    fn video_id_after_marker() {
        assert_eq!(video_id_from_url("https://x/watch?v=abc123"), "abc123");
    }

    #[test]
    fn video_id_without_marker_falls_back_to_last_equals_segment() {
        assert_eq!(video_id_from_url("https://x/watch?view=abc123 "), "abc123");
        assert_eq!(video_id_from_url("https://x/abc123"), "https://x/abc123");
    }

    #[test]
    fn channel_id_after_marker() {
        assert_eq!(channel_id_from_url("https://x/channel/UC42"), "UC42");
    }

    #[test]
    fn channel_id_without_marker_is_whole_string() {
        assert_eq!(channel_id_from_url("https://x/user/foo"), "https://x/user/foo");
    }

    #[test]
    fn maps_full_row() {
        let record = map_stream(
            &stream(Some("https://x/watch?v=abc123"), Some("https://x/channel/UC42")),
            Some(125000),
            Some(1700000000000),
        )
        .unwrap();

        assert_eq!(record.video_id, "abc123");
        assert_eq!(record.author_id, "UC42");
        assert_eq!(record.watch_progress, 125);
        assert_eq!(record.time_watched, 1700000000000);
        assert_eq!(record.view_count, 1000);
        assert_eq!(record.length_seconds, 300);
        assert_eq!(record.description, "");
        assert!(!record.is_live);
        assert!(!record.paid);
        assert_eq!(record.kind, "video");
    }

    #[test]
    fn absent_related_rows_map_to_zero() {
        let record = map_stream(
            &stream(Some("https://x/watch?v=abc"), Some("https://x/channel/UC1")),
            None,
            None,
        )
        .unwrap();
        assert_eq!(record.watch_progress, 0);
        assert_eq!(record.time_watched, 0);
    }

    #[test]
    fn progress_is_floor_divided_to_seconds() {
        let record = map_stream(
            &stream(Some("https://x/watch?v=abc"), Some("https://x/channel/UC1")),
            Some(62999),
            None,
        )
        .unwrap();
        assert_eq!(record.watch_progress, 62);
    }

    #[test]
    fn null_text_and_numeric_fields_get_defaults() {
        let mut s = stream(Some("https://x/watch?v=abc"), Some("https://x/channel/UC1"));
        s.title = None;
        s.uploader = None;
        s.upload_date = Value::Null;
        s.view_count = None;
        s.duration = None;

        let record = map_stream(&s, None, None).unwrap();
        assert_eq!(record.title, "");
        assert_eq!(record.author, "");
        assert_eq!(record.published, serde_json::json!(""));
        assert_eq!(record.view_count, 0);
        assert_eq!(record.length_seconds, 0);
    }

    #[test]
    fn missing_url_is_a_mapping_error() {
        let err = map_stream(&stream(None, Some("https://x/channel/UC1")), None, None).unwrap_err();
        assert_eq!(err, MapError::MissingUrl);
    }

    #[test]
    fn missing_uploader_url_is_a_mapping_error() {
        let err = map_stream(&stream(Some("https://x/watch?v=abc"), None), None, None).unwrap_err();
        assert_eq!(err, MapError::MissingUploaderUrl);
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn serializes_with_freetube_field_names() {
        let record = map_stream(
            &stream(Some("https://x/watch?v=abc"), Some("https://x/channel/UC1")),
            Some(62000),
            None,
        )
        .unwrap();

        let json = serde_json::to_value(&record).unwrap();
        let obj = json.as_object().unwrap();
        for key in [
            "videoId",
            "title",
            "author",
            "authorId",
            "published",
            "description",
            "viewCount",
            "lengthSeconds",
            "watchProgress",
            "timeWatched",
            "isLive",
            "paid",
            "type",
        ] {
            assert!(obj.contains_key(key), "missing field {}", key);
        }
        assert_eq!(json["type"], "video");
        assert_eq!(json["watchProgress"], 62);
    }
}
