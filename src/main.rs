use clap::Parser;
use eyre::{Context, Result, eyre};
use newpipe_freetube_sync::utils::RunConfig;
use newpipe_freetube_sync::{convert, retry};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Convert a NewPipe watch-history export into FreeTube history records.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding newpipe.db and receiving the output files.
    /// Defaults to the current directory if not set in config.
    #[arg(value_name = "BASE_DIR")]
    base_dir: Option<PathBuf>,

    /// Path to the NewPipe SQLite DB (newpipe.db).
    /// Defaults to <BASE_DIR>/newpipe.db.
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Path to a specific configuration file.
    /// Defaults to $XDG_CONFIG_HOME/newpipe-freetube-sync/config.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Re-attempt only the rows recorded in bad_rows.json.
    #[arg(long)]
    retry: bool,

    /// Print each failed row as it is encountered.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress standard output (progress bar and summary).
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Deserialize, Default)]
struct FileConfig {
    base_dir: Option<PathBuf>,
    db_path: Option<PathBuf>,
}

fn load_file_config(explicit_path: Option<&Path>) -> Result<FileConfig> {
    let path = if let Some(p) = explicit_path {
        if !p.exists() {
            return Err(eyre!("Config file not found: {}", p.display()));
        }
        Some(p.to_path_buf())
    } else {
        // Search: XDG/OS config dir, then nothing
        dirs::config_dir()
            .map(|d| d.join("newpipe-freetube-sync/config.toml"))
            .filter(|p| p.exists())
    };

    match path {
        None => Ok(FileConfig::default()),
        Some(p) => {
            let content = fs::read_to_string(&p)
                .wrap_err_with(|| format!("Failed to read config: {}", p.display()))?;
            toml::from_str(&content)
                .wrap_err_with(|| format!("Failed to parse config: {}", p.display()))
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load config file (CLI path > default path)
    let file_cfg = load_file_config(cli.config.as_deref())?;

    // 2. Resolve base_dir (CLI > Config > current directory)
    let base_dir = cli
        .base_dir
        .or(file_cfg.base_dir)
        .unwrap_or_else(|| PathBuf::from("."));

    // 3. Resolve db_path (CLI > Config > <base_dir>/newpipe.db)
    let db_path = cli
        .db
        .or(file_cfg.db_path)
        .unwrap_or_else(|| base_dir.join("newpipe.db"));

    let config = RunConfig {
        base_dir,
        db_path,
        quiet: cli.quiet,
        verbose: cli.verbose,
    };

    if cli.retry {
        retry::run(&config)
    } else {
        convert::run(&config)
    }
}
