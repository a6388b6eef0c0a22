//! The batch command: snapshot, download each URL, snapshot, report.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;

use watchdl_core::config;
use watchdl_core::report;
use watchdl_core::runner::{self, ItemStatus, RunnerEvent, ScanPhase};
use watchdl_core::url_list;

use super::Cli;

pub async fn run_batch_command(cli: Cli) -> Result<()> {
    let cfg = config::load_or_init()?;
    tracing::debug!("loaded config: {:?}", cfg);

    let watch_dir = config::resolve_watch_dir(watch_dir_override(&cli), &cfg)?;
    let items = url_list::read_work_items(&cli.url_list)?;
    if items.is_empty() {
        println!("No URLs found in {}.", cli.url_list.display());
        return Ok(());
    }
    tracing::info!(
        "starting batch of {} item(s), watching {}",
        items.len(),
        watch_dir.display()
    );

    // With --json, stdout carries only the JSON document; live status stays off it.
    let quiet = cli.json;
    let (events_tx, events_rx) = mpsc::channel::<RunnerEvent>(64);
    let printer = tokio::spawn(print_events(events_rx, quiet));

    let poll_interval = Duration::from_millis(cfg.poll_interval_ms);
    let result = runner::run_batch(items, &watch_dir, &cfg.downloader, poll_interval, events_tx).await;
    let _ = printer.await;
    let batch = result?;

    if cli.json {
        println!("{}", report::render_json(&batch)?);
    } else {
        print!("{}", report::render_human(&batch));
    }

    // Failed downloads were reported above; they do not fail the invocation.
    Ok(())
}

fn watch_dir_override(cli: &Cli) -> Option<PathBuf> {
    cli.watch_dir
        .clone()
        .or_else(|| std::env::var_os(config::WATCH_DIR_ENV).map(PathBuf::from))
}

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

/// Render runner events on stdout. Heartbeats and scan progress rewrite the
/// current line with `\r`; everything else prints a fresh line.
async fn print_events(mut rx: mpsc::Receiver<RunnerEvent>, quiet: bool) {
    while let Some(event) = rx.recv().await {
        if quiet {
            continue;
        }
        match event {
            RunnerEvent::ScanStarted { phase } => match phase {
                ScanPhase::Before => {
                    println!("Checking initial state of the watched directory...")
                }
                ScanPhase::After => {
                    println!("Checking state of the watched directory after downloads...")
                }
            },
            RunnerEvent::ScanProgress { done, total, .. } => {
                print!("\r  hashed {done}/{total} file(s)");
                if done == total {
                    println!();
                }
                let _ = std::io::stdout().flush();
            }
            RunnerEvent::ItemStarted { index, total, item } => {
                if let Some(label) = &item.label {
                    println!("[{}/{}] {}", index + 1, total, label);
                }
                println!("Processing {}", item.url);
            }
            RunnerEvent::Heartbeat {
                ticks,
                elapsed_secs,
                ..
            } => {
                // Liveness only; the downloader exposes no real progress.
                let frame = SPINNER[(ticks % SPINNER.len() as u64) as usize];
                print!("\r  {frame} downloading... {elapsed_secs:.1}s");
                let _ = std::io::stdout().flush();
            }
            RunnerEvent::ItemFinished { report, .. } => {
                let name = report.item.display_name().to_string();
                match report.status {
                    ItemStatus::Succeeded => println!(
                        "\rSuccessfully downloaded {} ({:.1}s)",
                        name, report.elapsed_secs
                    ),
                    ItemStatus::Failed { code } => {
                        let code = code
                            .map(|c| c.to_string())
                            .unwrap_or_else(|| "signal".to_string());
                        println!("\rFailed to download {name} (exit {code})");
                    }
                }
            }
        }
    }
}
