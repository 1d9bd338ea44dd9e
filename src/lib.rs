//! # newpipe-freetube-sync
//!
//! A CLI tool that converts a [NewPipe](https://newpipe.net) watch-history export into
//! [FreeTube](https://freetubeapp.io)-compatible history records.
//!
//! ## What it does
//!
//! NewPipe exports watch history as a SQLite database (`newpipe.db`) with the watched
//! streams, per-stream playback positions and last-access timestamps spread across
//! three tables. This tool joins those tables per stream and writes one FreeTube
//! history record per watched stream as newline-delimited JSON, into a file named
//! after the current date (`freetube-history-YYYY-MM-DD.db`).
//!
//! The database is opened **read-only** — your data is never modified.
//!
//! ## Failed rows and the retry pass
//!
//! Rows that cannot be converted (for example a stream with no channel URL) never
//! abort the run; they are collected into `bad_rows.json` next to the output file.
//! A second pass (`--retry`) re-attempts exactly those rows against the same
//! database and writes whatever recovers into a separate dated file, leaving
//! `still_bad_rows.json` behind only when rows keep failing.
//!
//! ## Usage
//!
//! ```sh
//! # Convert, reading ./newpipe.db and writing into the current directory
//! newpipe-freetube-sync
//!
//! # Convert an export somewhere else
//! newpipe-freetube-sync ~/exports
//!
//! # Re-attempt previously failed rows
//! newpipe-freetube-sync ~/exports --retry
//! ```
//!
//! Preferences can be persisted in `~/.config/newpipe-freetube-sync/config.toml`.
//!
//! ## Compatibility
//!
//! Tracks NewPipe's internal (undocumented) SQLite schema and FreeTube's history
//! import format. If an update to either application breaks the conversion, please
//! [open an issue](https://github.com/egemengol/newpipe-freetube-sync/issues).

pub mod convert;
pub mod freetube;
pub mod newpipe;
pub mod retry;
pub mod utils;
