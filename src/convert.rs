//! The full conversion pass over the `streams` table.

use crate::freetube::{self, BadRow, HistoryRecord};
use crate::newpipe::{self, StreamRow};
use crate::utils::{self, RunConfig};
use eyre::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use std::fs;

/// Convert every stream in the source database.
///
/// Each stream yields exactly one outcome: a history record in the dated output
/// file, or a bad row in `bad_rows.json`. A failing stream never aborts the run;
/// only a database that cannot be opened at all does.
pub fn run(config: &RunConfig) -> Result<()> {
    fs::create_dir_all(&config.base_dir).wrap_err_with(|| {
        format!(
            "Failed to create output directory: {}",
            config.base_dir.display()
        )
    })?;

    let conn = newpipe::open_database(&config.db_path)?;
    let streams = newpipe::fetch_streams(&conn)?;

    let pb = if config.quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(streams.len() as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)",
            )
            .unwrap()
            .progress_chars("=>-"),
        );
        bar.println(format!("Total rows found in 'streams': {}", streams.len()));
        if streams.is_empty() {
            bar.println("No data available.");
        }
        bar
    };

    let mut history: Vec<HistoryRecord> = Vec::with_capacity(streams.len());
    let mut bad_rows: Vec<BadRow> = Vec::new();

    for stream in &streams {
        match convert_stream(&conn, stream) {
            Ok(record) => history.push(record),
            Err(bad) => {
                if config.verbose {
                    pb.println(format!("Error [uid {}]: {}", stream.uid, bad.error));
                }
                bad_rows.push(bad);
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    // Written even when empty so a later retry pass always has a consistent input.
    utils::write_json_pretty(&config.bad_rows_path(), &bad_rows)?;

    let name = utils::history_file_name(chrono::Local::now().date_naive());
    utils::write_json_lines(&config.base_dir.join(name), &history)?;

    if !config.quiet {
        eprintln!("Good rows: {}", history.len());
        eprintln!("Bad rows : {}", bad_rows.len());
    }

    Ok(())
}

/// Convert one stream, fetching its optional playback position and access timestamp.
///
/// Lookup errors and mapping errors both land in the bad row, carrying the uid and
/// source url so the retry pass can find the stream again.
pub(crate) fn convert_stream(conn: &Connection, stream: &StreamRow) -> Result<HistoryRecord, BadRow> {
    let bad = |error: String| BadRow {
        uid: Some(stream.uid),
        url: stream.url.clone(),
        error,
    };

    let progress = match newpipe::fetch_state(conn, stream.uid) {
        Ok(progress) => progress,
        Err(e) => return Err(bad(format!("{e:#}"))),
    };
    let access = match newpipe::fetch_history(conn, stream.uid) {
        Ok(access) => access,
        Err(e) => return Err(bad(format!("{e:#}"))),
    };

    freetube::map_stream(stream, progress, access).map_err(|e| bad(e.to_string()))
}
