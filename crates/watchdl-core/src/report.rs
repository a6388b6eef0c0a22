//! Rendering of a finished batch: human-readable summary or JSON document.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::diff::Delta;
use crate::runner::{BatchReport, ItemStatus};

/// Human-readable closing report: outcome counts, then the change sections in
/// the shape the console has always used. Section headers are printed even
/// when empty so "nothing changed" is visible, not ambiguous.
pub fn render_human(report: &BatchReport) -> String {
    let mut out = String::new();
    let failed = report.failed_count();
    let ok = report.items.len() - failed;
    out.push_str(&format!(
        "\nProcessed {} item(s): {} succeeded, {} failed\n",
        report.items.len(),
        ok,
        failed
    ));

    out.push_str("\nChanges detected:\n");
    push_section(&mut out, "Added files", &report.delta.added);
    push_section(&mut out, "Removed files", &report.delta.removed);
    push_section(&mut out, "Modified files", &report.delta.modified);
    out
}

fn push_section(out: &mut String, title: &str, entries: &BTreeMap<PathBuf, String>) {
    out.push_str(&format!("{} ({}):\n", title, entries.len()));
    for path in entries.keys() {
        out.push_str(&format!("  {}\n", path.display()));
    }
}

#[derive(Debug, Serialize)]
struct JsonItem<'a> {
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<&'a str>,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    exit_code: Option<i32>,
    elapsed_secs: f64,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    items: Vec<JsonItem<'a>>,
    delta: &'a Delta,
}

/// Serialize the batch outcome as a pretty-printed JSON document: per-item
/// results in input order plus the full delta (paths as strings).
pub fn render_json(report: &BatchReport) -> Result<String> {
    let items = report
        .items
        .iter()
        .map(|r| JsonItem {
            url: &r.item.url,
            label: r.item.label.as_deref(),
            outcome: if r.status.is_success() {
                "succeeded"
            } else {
                "failed"
            },
            exit_code: match r.status {
                ItemStatus::Failed { code } => code,
                ItemStatus::Succeeded => None,
            },
            elapsed_secs: r.elapsed_secs,
        })
        .collect();
    let doc = JsonReport {
        items,
        delta: &report.delta,
    };
    serde_json::to_string_pretty(&doc).context("serialize JSON report")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ItemReport;
    use crate::url_list::WorkItem;

    fn sample_report() -> BatchReport {
        let mut delta = Delta::default();
        delta
            .added
            .insert(PathBuf::from("/m/new.flac"), "aa".repeat(32));
        delta
            .modified
            .insert(PathBuf::from("/m/edit.flac"), "bb".repeat(32));
        BatchReport {
            items: vec![
                ItemReport {
                    item: WorkItem {
                        url: "https://example.com/p/1".to_string(),
                        label: Some("Rock Classics".to_string()),
                    },
                    status: ItemStatus::Succeeded,
                    elapsed_secs: 1.5,
                },
                ItemReport {
                    item: WorkItem {
                        url: "https://example.com/p/2".to_string(),
                        label: None,
                    },
                    status: ItemStatus::Failed { code: Some(1) },
                    elapsed_secs: 0.2,
                },
            ],
            delta,
        }
    }

    #[test]
    fn human_report_lists_sections_and_counts() {
        let text = render_human(&sample_report());
        assert!(text.contains("Processed 2 item(s): 1 succeeded, 1 failed"));
        assert!(text.contains("Changes detected:"));
        assert!(text.contains("Added files (1):"));
        assert!(text.contains("  /m/new.flac"));
        assert!(text.contains("Removed files (0):"));
        assert!(text.contains("Modified files (1):"));
        assert!(text.contains("  /m/edit.flac"));
    }

    #[test]
    fn json_report_round_trips_through_serde() {
        let text = render_json(&sample_report()).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();

        let items = doc["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["outcome"], "succeeded");
        assert_eq!(items[0]["label"], "Rock Classics");
        assert!(items[0].get("exit_code").is_none());
        assert_eq!(items[1]["outcome"], "failed");
        assert_eq!(items[1]["exit_code"], 1);
        assert!(items[1].get("label").is_none());

        assert!(doc["delta"]["added"].get("/m/new.flac").is_some());
        assert!(doc["delta"]["removed"].as_object().unwrap().is_empty());
    }
}
