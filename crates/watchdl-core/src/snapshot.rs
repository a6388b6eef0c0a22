//! Directory snapshots: one fingerprint per regular file under a root.
//!
//! Symbolic links are never followed; a link is neither descended into nor
//! fingerprinted. Both the "before" and "after" states go through [`scan`],
//! so the policy cannot drift between the two sides of a diff.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::hash;

/// Mapping from file path to content fingerprint. Sorted keys give
/// deterministic iteration for reports and tests.
pub type Snapshot = BTreeMap<PathBuf, String>;

/// A snapshot scan failed. A partial snapshot would make the later diff lie,
/// so any walk or per-file fingerprint failure aborts the whole scan.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("walking {}: {}", root.display(), source)]
    Walk {
        root: PathBuf,
        source: walkdir::Error,
    },
    #[error("fingerprinting {}: {:#}", path.display(), cause)]
    Fingerprint { path: PathBuf, cause: anyhow::Error },
}

/// Scan `root` and fingerprint every regular file beneath it.
///
/// A root that does not exist yet (first run against a fresh download
/// directory) yields an empty snapshot. `on_progress` is called after each
/// file with `(done, total)`; it is observational only and has no effect on
/// the result.
pub fn scan(
    root: &Path,
    mut on_progress: impl FnMut(usize, usize),
) -> Result<Snapshot, SnapshotError> {
    if !root.exists() {
        return Ok(Snapshot::new());
    }

    // Enumerate first so progress has a denominator, then fingerprint.
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|source| SnapshotError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    let total = files.len();
    tracing::debug!("scanning {} file(s) under {}", total, root.display());

    let mut snapshot = Snapshot::new();
    for (done, path) in files.into_iter().enumerate() {
        let digest =
            hash::fingerprint_file(&path).map_err(|cause| SnapshotError::Fingerprint {
                path: path.clone(),
                cause,
            })?;
        snapshot.insert(path, digest);
        on_progress(done + 1, total);
    }
    Ok(snapshot)
}
