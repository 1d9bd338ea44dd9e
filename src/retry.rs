//! The retry pass over previously recorded bad rows.

use crate::convert;
use crate::freetube::{BadRow, HistoryRecord};
use crate::newpipe;
use crate::utils::{self, RunConfig};
use eyre::{Context, Result};
use rusqlite::Connection;
use std::fs;

/// Re-attempt every row recorded in `bad_rows.json`, keyed by uid.
///
/// The pass is idempotent and re-runnable. Missing inputs (no bad-rows file, no
/// database) or an empty/malformed bad-rows file are reported and leave every
/// output untouched. Each input row yields exactly one outcome: a recovered
/// record in the dated `-bad-requested` file, or a row in `still_bad_rows.json`;
/// either file is only written when non-empty.
pub fn run(config: &RunConfig) -> Result<()> {
    let bad_rows_path = config.bad_rows_path();
    if !bad_rows_path.exists() {
        if !config.quiet {
            eprintln!("{} not found. Nothing to reprocess.", bad_rows_path.display());
        }
        return Ok(());
    }
    if !config.db_path.exists() {
        if !config.quiet {
            eprintln!(
                "{} not found. Cannot reprocess bad rows.",
                config.db_path.display()
            );
        }
        return Ok(());
    }

    let content = fs::read_to_string(&bad_rows_path)
        .wrap_err_with(|| format!("Failed to read: {}", bad_rows_path.display()))?;
    let bad_rows: Vec<BadRow> = match serde_json::from_str(&content) {
        Ok(rows) => rows,
        Err(_) => {
            if !config.quiet {
                eprintln!("No bad rows to process or the file is invalid.");
            }
            return Ok(());
        }
    };
    if bad_rows.is_empty() {
        if !config.quiet {
            eprintln!("No bad rows to process or the file is empty.");
        }
        return Ok(());
    }

    let conn = match newpipe::open_database(&config.db_path) {
        Ok(conn) => conn,
        Err(e) => {
            if !config.quiet {
                eprintln!("Failed to connect to {}: {e:#}", config.db_path.display());
            }
            return Ok(());
        }
    };

    let mut recovered: Vec<HistoryRecord> = Vec::new();
    let mut still_bad: Vec<BadRow> = Vec::new();

    for item in &bad_rows {
        match (item.uid, item.url.as_deref()) {
            (Some(uid), Some(_)) => match retry_row(&conn, uid, item) {
                Ok(record) => recovered.push(record),
                Err(bad) => still_bad.push(bad),
            },
            _ => still_bad.push(BadRow {
                uid: item.uid,
                url: item.url.clone(),
                error: "Missing uid or url in bad_rows.json".to_string(),
            }),
        }
    }

    if !recovered.is_empty() {
        let name = utils::retried_history_file_name(chrono::Local::now().date_naive());
        utils::write_json_lines(&config.base_dir.join(name), &recovered)?;
    }
    if !still_bad.is_empty() {
        utils::write_json_pretty(&config.still_bad_rows_path(), &still_bad)?;
    }

    if !config.quiet {
        eprintln!("Reprocessed successfully: {}", recovered.len());
        eprintln!("Still bad rows: {}", still_bad.len());
    }

    Ok(())
}

/// Re-fetch the stream by uid and run it through the same per-item flow as the
/// conversion pass. The stored bad row is data, not a live handle; the row may
/// have disappeared from the database since.
fn retry_row(conn: &Connection, uid: i64, item: &BadRow) -> Result<HistoryRecord, BadRow> {
    let stream = match newpipe::fetch_stream(conn, uid) {
        Ok(Some(stream)) => stream,
        Ok(None) => {
            return Err(BadRow {
                uid: item.uid,
                url: item.url.clone(),
                error: "No matching row in 'streams' table".to_string(),
            });
        }
        Err(e) => {
            return Err(BadRow {
                uid: item.uid,
                url: item.url.clone(),
                error: format!("{e:#}"),
            });
        }
    };
    convert::convert_stream(conn, &stream)
}
