//! Run configuration, output-file naming and JSON write helpers.

use chrono::NaiveDate;
use eyre::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Failed rows from the conversion pass, input to the retry pass.
pub const BAD_ROWS_FILE: &str = "bad_rows.json";
/// Rows that failed again during the retry pass.
pub const STILL_BAD_ROWS_FILE: &str = "still_bad_rows.json";

/// Configuration required to run a conversion or retry pass.
/// This decouples the logic from how the arguments were parsed (CLI/config file).
#[derive(Clone)]
pub struct RunConfig {
    /// Directory the output files are written to.
    pub base_dir: PathBuf,
    /// Path to the NewPipe SQLite database.
    pub db_path: PathBuf,
    pub quiet: bool,
    pub verbose: bool,
}

impl RunConfig {
    pub fn bad_rows_path(&self) -> PathBuf {
        self.base_dir.join(BAD_ROWS_FILE)
    }

    pub fn still_bad_rows_path(&self) -> PathBuf {
        self.base_dir.join(STILL_BAD_ROWS_FILE)
    }
}

/// `freetube-history-<YYYY-MM-DD>.db` (despite the extension, JSON lines).
pub fn history_file_name(date: NaiveDate) -> String {
    format!("freetube-history-{}.db", date.format("%Y-%m-%d"))
}

/// `freetube-history-<YYYY-MM-DD>-bad-requested.db`, the recovered-on-retry file.
pub fn retried_history_file_name(date: NaiveDate) -> String {
    format!("freetube-history-{}-bad-requested.db", date.format("%Y-%m-%d"))
}

/// Write records as newline-delimited JSON, one compact object per line.
pub fn write_json_lines<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let file =
        File::create(path).wrap_err_with(|| format!("Failed to create: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for record in records {
        serde_json::to_writer(&mut writer, record)
            .wrap_err_with(|| format!("Failed to serialize record for {}", path.display()))?;
        writer
            .write_all(b"\n")
            .wrap_err_with(|| format!("Failed to write: {}", path.display()))?;
    }
    writer
        .flush()
        .wrap_err_with(|| format!("Failed to flush: {}", path.display()))
}

/// Write a value as a single pretty-printed JSON document.
pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .wrap_err_with(|| format!("Failed to serialize: {}", path.display()))?;
    std::fs::write(path, json).wrap_err_with(|| format!("Failed to write: {}", path.display()))
}
