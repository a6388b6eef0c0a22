use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Environment variable naming the watched directory, consulted by the CLI
/// when `--watch-dir` is not given.
pub const WATCH_DIR_ENV: &str = "WATCHDL_WATCH_DIR";

/// How the external downloader is invoked: `program` plus fixed `args`, with
/// the item URL appended as the final argument. Output directory, login and
/// the rest of the tool's behavior are the tool's own configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloaderConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            program: "tidal-dl".to_string(),
            args: vec!["--link".to_string()],
        }
    }
}

/// Global configuration loaded from `~/.config/watchdl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchdlConfig {
    /// External downloader invocation.
    #[serde(default)]
    pub downloader: DownloaderConfig,
    /// Liveness poll interval while a download runs, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Watched directory fallback, used when neither `--watch-dir` nor
    /// WATCHDL_WATCH_DIR is set. There is deliberately no built-in default:
    /// diffing the wrong directory would silently report nonsense.
    #[serde(default)]
    pub watch_dir: Option<PathBuf>,
}

fn default_poll_interval_ms() -> u64 {
    500
}

impl Default for WatchdlConfig {
    fn default() -> Self {
        Self {
            downloader: DownloaderConfig::default(),
            poll_interval_ms: default_poll_interval_ms(),
            watch_dir: None,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("watchdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<WatchdlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = WatchdlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg: WatchdlConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

/// Resolve the watched directory. `explicit` is the CLI's merge of the
/// `--watch-dir` flag and WATCHDL_WATCH_DIR (flag first); the config file is
/// the last fallback, and with nothing set the run fails with a hint.
pub fn resolve_watch_dir(explicit: Option<PathBuf>, cfg: &WatchdlConfig) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    if let Some(dir) = &cfg.watch_dir {
        return Ok(dir.clone());
    }
    bail!(
        "no watched directory configured; pass --watch-dir, set {}, or set watch_dir in the config file",
        WATCH_DIR_ENV
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = WatchdlConfig::default();
        assert_eq!(cfg.downloader.program, "tidal-dl");
        assert_eq!(cfg.downloader.args, vec!["--link".to_string()]);
        assert_eq!(cfg.poll_interval_ms, 500);
        assert!(cfg.watch_dir.is_none());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = WatchdlConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: WatchdlConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.downloader, cfg.downloader);
        assert_eq!(parsed.poll_interval_ms, cfg.poll_interval_ms);
        assert_eq!(parsed.watch_dir, cfg.watch_dir);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            poll_interval_ms = 250
            watch_dir = "/srv/media/playlists"

            [downloader]
            program = "yt-dlp"
            args = ["--no-progress", "--quiet"]
        "#;
        let cfg: WatchdlConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.downloader.program, "yt-dlp");
        assert_eq!(cfg.downloader.args.len(), 2);
        assert_eq!(cfg.poll_interval_ms, 250);
        assert_eq!(cfg.watch_dir.as_deref(), Some("/srv/media/playlists".as_ref()));
    }

    #[test]
    fn config_toml_missing_sections_use_defaults() {
        let cfg: WatchdlConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.downloader, DownloaderConfig::default());
        assert_eq!(cfg.poll_interval_ms, 500);
        assert!(cfg.watch_dir.is_none());
    }

    #[test]
    fn resolve_watch_dir_explicit_wins() {
        let cfg = WatchdlConfig {
            watch_dir: Some(PathBuf::from("/from/config")),
            ..WatchdlConfig::default()
        };
        let dir = resolve_watch_dir(Some(PathBuf::from("/from/flag")), &cfg).unwrap();
        assert_eq!(dir, PathBuf::from("/from/flag"));
    }

    #[test]
    fn resolve_watch_dir_falls_back_to_config() {
        let cfg = WatchdlConfig {
            watch_dir: Some(PathBuf::from("/from/config")),
            ..WatchdlConfig::default()
        };
        let dir = resolve_watch_dir(None, &cfg).unwrap();
        assert_eq!(dir, PathBuf::from("/from/config"));
    }

    #[test]
    fn resolve_watch_dir_unset_is_an_error() {
        let err = resolve_watch_dir(None, &WatchdlConfig::default()).unwrap_err();
        assert!(err.to_string().contains("--watch-dir"));
        assert!(err.to_string().contains(WATCH_DIR_ENV));
    }
}
