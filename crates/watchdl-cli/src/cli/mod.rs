//! CLI for watchdl: one batch run per invocation.

mod run;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

/// Top-level CLI: a single positional URL list, no subcommands.
#[derive(Debug, Parser)]
#[command(name = "watchdl")]
#[command(
    about = "Run an external downloader once per URL and report what changed in the watched directory",
    long_about = None
)]
pub struct Cli {
    /// Path to the URL list file (`# label` lines and `https` URL lines).
    pub url_list: PathBuf,

    /// Directory to snapshot before and after the batch. Falls back to
    /// WATCHDL_WATCH_DIR, then to `watch_dir` in the config file.
    #[arg(long, value_name = "DIR")]
    pub watch_dir: Option<PathBuf>,

    /// Print the final report as a JSON document instead of the human summary.
    #[arg(long)]
    pub json: bool,
}

pub async fn run_from_args() -> Result<()> {
    // Usage problems (missing or extra arguments) exit 1, not clap's
    // default 2; --help and --version still exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            std::process::exit(if err.use_stderr() { 1 } else { 0 });
        }
    };
    run::run_batch_command(cli).await
}
