//! Sequential batch runner: snapshot the watched directory, run the external
//! downloader once per item, snapshot again, diff.
//!
//! One child process runs at a time and is always reaped before the next item
//! starts. There is no retry, no timeout and no cancellation; a failed item
//! is recorded and the batch moves on.

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::process::Command;
use tokio::sync::mpsc::Sender;

use crate::config::DownloaderConfig;
use crate::diff::{self, Delta};
use crate::snapshot::{self, Snapshot};
use crate::url_list::WorkItem;

/// Which of the two directory scans is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Before,
    After,
}

/// Terminal state of one item. A failure carries the child's exit code, or
/// `None` if it was killed by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Succeeded,
    Failed { code: Option<i32> },
}

impl ItemStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ItemStatus::Succeeded)
    }
}

/// Outcome of one item, reported after its child process has been reaped.
#[derive(Debug, Clone)]
pub struct ItemReport {
    pub item: WorkItem,
    pub status: ItemStatus,
    pub elapsed_secs: f64,
}

/// Progress events for a consumer (the CLI) to render. Lifecycle events are
/// delivered in order; heartbeats go through `try_send` and may be dropped
/// under backpressure, which only costs a spinner frame.
#[derive(Debug, Clone)]
pub enum RunnerEvent {
    ScanStarted {
        phase: ScanPhase,
    },
    /// `(done, total)` files fingerprinted so far in the current scan.
    ScanProgress {
        phase: ScanPhase,
        done: usize,
        total: usize,
    },
    ItemStarted {
        index: usize,
        total: usize,
        item: WorkItem,
    },
    /// Liveness heartbeat while a child runs: poll tick count and elapsed
    /// wall time. This is not download progress; the child reports nothing
    /// this tool could read.
    Heartbeat {
        index: usize,
        ticks: u64,
        elapsed_secs: f64,
    },
    ItemFinished {
        index: usize,
        report: ItemReport,
    },
}

/// Result of a whole batch: per-item outcomes in input order, plus the
/// watched-directory delta.
#[derive(Debug)]
pub struct BatchReport {
    pub items: Vec<ItemReport>,
    pub delta: Delta,
}

impl BatchReport {
    pub fn failed_count(&self) -> usize {
        self.items.iter().filter(|r| !r.status.is_success()).count()
    }
}

/// Run the full workflow. Item failures never abort the batch; only usage of
/// the environment (unreadable watched directory, downloader that cannot be
/// spawned at all) is fatal.
pub async fn run_batch(
    items: Vec<WorkItem>,
    watch_dir: &Path,
    downloader: &DownloaderConfig,
    poll_interval: Duration,
    events: Sender<RunnerEvent>,
) -> Result<BatchReport> {
    let before = scan_with_events(watch_dir, ScanPhase::Before, &events).await?;

    let total = items.len();
    let mut reports = Vec::with_capacity(total);
    for (index, item) in items.into_iter().enumerate() {
        let _ = events
            .send(RunnerEvent::ItemStarted {
                index,
                total,
                item: item.clone(),
            })
            .await;

        let (status, elapsed_secs) =
            run_item(downloader, &item.url, poll_interval, |ticks, elapsed_secs| {
                let _ = events.try_send(RunnerEvent::Heartbeat {
                    index,
                    ticks,
                    elapsed_secs,
                });
            })
            .await?;

        let report = ItemReport {
            item,
            status,
            elapsed_secs,
        };
        let _ = events
            .send(RunnerEvent::ItemFinished {
                index,
                report: report.clone(),
            })
            .await;
        reports.push(report);
    }

    let after = scan_with_events(watch_dir, ScanPhase::After, &events).await?;
    let delta = diff::compare(&before, &after);

    Ok(BatchReport {
        items: reports,
        delta,
    })
}

async fn scan_with_events(
    root: &Path,
    phase: ScanPhase,
    events: &Sender<RunnerEvent>,
) -> Result<Snapshot> {
    let _ = events.send(RunnerEvent::ScanStarted { phase }).await;
    let snapshot = snapshot::scan(root, |done, total| {
        let _ = events.try_send(RunnerEvent::ScanProgress { phase, done, total });
    })
    .with_context(|| format!("snapshot of {}", root.display()))?;
    Ok(snapshot)
}

/// Run one downloader invocation to completion and classify its exit status.
///
/// stdout and stderr are piped and captured, never shown live; stderr is
/// logged when the child fails. `on_tick` fires once per liveness poll.
async fn run_item(
    downloader: &DownloaderConfig,
    url: &str,
    poll_interval: Duration,
    mut on_tick: impl FnMut(u64, f64),
) -> Result<(ItemStatus, f64)> {
    let started = Instant::now();
    let mut child = Command::new(&downloader.program)
        .args(&downloader.args)
        .arg(url)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawn downloader `{}`", downloader.program))?;

    // Drain both pipes concurrently so a chatty downloader can never fill a
    // pipe buffer and stall before exiting.
    let stdout_task = capture(child.stdout.take());
    let stderr_task = capture(child.stderr.take());

    // Liveness poll: no timeout and no kill. Once started, the child runs to
    // completion and is reaped here before the next item starts.
    let mut ticks = 0u64;
    let exit = loop {
        match child.try_wait().context("poll downloader process")? {
            Some(exit) => break exit,
            None => {
                ticks += 1;
                on_tick(ticks, started.elapsed().as_secs_f64());
                tokio::time::sleep(poll_interval).await;
            }
        }
    };

    let stdout = stdout_task.await.unwrap_or_default();
    let stderr = stderr_task.await.unwrap_or_default();
    let elapsed_secs = started.elapsed().as_secs_f64();

    let status = if exit.success() {
        tracing::info!(url, elapsed_secs, "download succeeded");
        ItemStatus::Succeeded
    } else {
        let stderr_text = String::from_utf8_lossy(&stderr);
        tracing::warn!(
            url,
            code = ?exit.code(),
            stderr = %stderr_text.trim_end(),
            "download failed"
        );
        ItemStatus::Failed { code: exit.code() }
    };
    tracing::debug!(url, stdout_bytes = stdout.len(), "captured downloader stdout");

    Ok((status, elapsed_secs))
}

fn capture<R>(stream: Option<R>) -> tokio::task::JoinHandle<Vec<u8>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        use tokio::io::AsyncReadExt;
        let mut buf = Vec::new();
        if let Some(mut stream) = stream {
            let _ = stream.read_to_end(&mut buf).await;
        }
        buf
    })
}
