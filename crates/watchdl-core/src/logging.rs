//! Logging init: file under the XDG state dir, or stderr if that fails.
//!
//! The console is reserved for status lines and `\r`-rewritten heartbeats,
//! so log output stays out of it by default.

use std::fs;
use std::io;
use std::path::PathBuf;

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// Per-write target: the log file, or stderr when the handle cannot be cloned.
enum LogTarget {
    File(std::fs::File),
    Stderr,
}

impl io::Write for LogTarget {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogTarget::File(f) => f.write(buf),
            LogTarget::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogTarget::File(f) => f.flush(),
            LogTarget::Stderr => io::stderr().lock().flush(),
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,watchdl=debug"))
}

/// Initialize structured logging to `~/.local/state/watchdl/watchdl.log`.
/// If the state dir is unusable, logs go to stderr instead; logging setup
/// never aborts the run.
pub fn init() {
    match init_file() {
        Ok(path) => tracing::debug!("watchdl logging initialized at {}", path.display()),
        Err(err) => {
            init_stderr();
            tracing::warn!("log file unavailable ({err:#}), logging to stderr");
        }
    }
}

fn init_file() -> anyhow::Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("watchdl")?;
    let log_dir = xdg_dirs.get_state_home();

    fs::create_dir_all(&log_dir)?;
    let log_file_path = log_dir.join("watchdl.log");

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;

    let writer = BoxMakeWriter::new(move || {
        file.try_clone()
            .map(LogTarget::File)
            .unwrap_or(LogTarget::Stderr)
    });

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(log_file_path)
}

fn init_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}
