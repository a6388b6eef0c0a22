//! Parsing of the URL list file.
//!
//! Line format: `# <label>` names the next URL line; a line starting with
//! `https` is a download target; everything else is ignored.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// One download to perform. Items keep the order of the input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub url: String,
    /// Label from the nearest preceding `#` line, if any.
    pub label: Option<String>,
}

impl WorkItem {
    /// Label if present, URL otherwise; what status lines are tagged with.
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.url)
    }
}

/// Read and parse the URL list. A missing file is fatal; the batch cannot
/// run without it.
pub fn read_work_items(path: &Path) -> Result<Vec<WorkItem>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read URL list {}", path.display()))?;
    Ok(parse_work_items(&text))
}

/// Parse list text into work items.
///
/// A `#` line sets the pending label; a later `#` line overwrites an
/// unconsumed one; a `https` line consumes it, so a label applies to exactly
/// one URL. Lines that look like a URL but are not `https` are warned about
/// and skipped; blank and other lines are ignored silently.
pub fn parse_work_items(text: &str) -> Vec<WorkItem> {
    let mut items = Vec::new();
    let mut pending_label: Option<String> = None;
    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix('#') {
            let rest = rest.trim();
            pending_label = (!rest.is_empty()).then(|| rest.to_string());
        } else if line.starts_with("https") {
            items.push(WorkItem {
                url: line.to_string(),
                label: pending_label.take(),
            });
        } else if line.starts_with("http") {
            tracing::warn!("ignoring non-https line in URL list: {line}");
        }
    }
    items
}
