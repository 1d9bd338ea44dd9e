//! Row types and read-only queries for the NewPipe SQLite schema.
//!
//! Watch history is spread across three tables:
//!
//! ```sql
//! streams        (uid INTEGER PRIMARY KEY, url TEXT, title TEXT, uploader TEXT,
//!                 uploader_url TEXT, upload_date, view_count INTEGER, duration INTEGER, ...)
//! stream_history (stream_id INTEGER, access_date INTEGER, ...)
//! stream_state   (stream_id INTEGER, progress_time INTEGER)
//! ```
//!
//! `stream_history` and `stream_state` hold at most one relevant row per stream;
//! absence means "never watched" / "no position saved" and is not an error.

use eyre::{Context, Result};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row};
use std::path::Path;

/// One row of the `streams` table.
///
/// `url` and `uploader_url` are nullable in the schema even though the conversion
/// needs both; the mapper decides what a missing value means. `upload_date` is
/// carried verbatim as a JSON value because NewPipe has stored it both as an epoch
/// integer and as text across versions.
#[derive(Debug, Clone)]
pub struct StreamRow {
    pub uid: i64,
    pub url: Option<String>,
    pub title: Option<String>,
    pub uploader: Option<String>,
    pub uploader_url: Option<String>,
    pub upload_date: serde_json::Value,
    pub view_count: Option<i64>,
    pub duration: Option<i64>,
}

const STREAM_COLUMNS: &str = "uid, url, title, uploader, uploader_url, upload_date, view_count, duration";

/// Open the source database read-only. A missing or unreadable file is fatal.
pub fn open_database(path: &Path) -> Result<Connection> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .wrap_err_with(|| format!("Failed to open source database: {}", path.display()))
}

/// All rows of `streams`, in table iteration order.
pub fn fetch_streams(conn: &Connection) -> Result<Vec<StreamRow>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {} FROM streams", STREAM_COLUMNS))
        .wrap_err("Failed to query 'streams' table")?;
    let rows = stmt
        .query_map([], stream_from_row)
        .wrap_err("Failed to read 'streams' table")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .wrap_err("Failed to read a row from 'streams'")?;
    Ok(rows)
}

/// Re-fetch a single stream by primary key. `None` when the row no longer exists.
pub fn fetch_stream(conn: &Connection, uid: i64) -> Result<Option<StreamRow>> {
    conn.query_row(
        &format!("SELECT {} FROM streams WHERE uid = ?1", STREAM_COLUMNS),
        [uid],
        stream_from_row,
    )
    .optional()
    .wrap_err_with(|| format!("Failed to fetch stream {} from 'streams'", uid))
}

/// Saved playback position in milliseconds, if any.
pub fn fetch_state(conn: &Connection, uid: i64) -> Result<Option<i64>> {
    let progress: Option<Option<i64>> = conn
        .query_row(
            "SELECT progress_time FROM stream_state WHERE stream_id = ?1",
            [uid],
            |row| row.get(0),
        )
        .optional()
        .wrap_err_with(|| format!("Failed to fetch stream_state for stream {}", uid))?;
    Ok(progress.flatten())
}

/// Last access timestamp, if the stream was ever watched.
pub fn fetch_history(conn: &Connection, uid: i64) -> Result<Option<i64>> {
    let access: Option<Option<i64>> = conn
        .query_row(
            "SELECT access_date FROM stream_history WHERE stream_id = ?1",
            [uid],
            |row| row.get(0),
        )
        .optional()
        .wrap_err_with(|| format!("Failed to fetch stream_history for stream {}", uid))?;
    Ok(access.flatten())
}

fn stream_from_row(row: &Row<'_>) -> rusqlite::Result<StreamRow> {
    Ok(StreamRow {
        uid: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        uploader: row.get(3)?,
        uploader_url: row.get(4)?,
        upload_date: json_value(row, 5)?,
        view_count: row.get(6)?,
        duration: row.get(7)?,
    })
}

/// Read a column of unknown affinity as a JSON value, preserving its stored type.
fn json_value(row: &Row<'_>, idx: usize) -> rusqlite::Result<serde_json::Value> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::Value::from(i),
        ValueRef::Real(f) => serde_json::Value::from(f),
        ValueRef::Text(t) => serde_json::Value::from(String::from_utf8_lossy(t).into_owned()),
        // No NewPipe version stores blobs here; treat one like an absent value.
        ValueRef::Blob(_) => serde_json::Value::Null,
    })
}
