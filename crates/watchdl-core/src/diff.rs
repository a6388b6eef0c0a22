//! Pure comparison of two directory snapshots.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::snapshot::Snapshot;

/// Changes observed between two snapshots. A file present on both sides with
/// an unchanged fingerprint appears in none of the three maps, and no path
/// can appear in more than one of them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Delta {
    /// Present after but not before; carries the new fingerprint.
    pub added: BTreeMap<PathBuf, String>,
    /// Present before but not after; carries the old fingerprint.
    pub removed: BTreeMap<PathBuf, String>,
    /// Present on both sides with differing fingerprints; carries the new one.
    pub modified: BTreeMap<PathBuf, String>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    /// Total number of changed paths.
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }
}

/// Classify every path of `before` and `after` as added, removed or modified.
pub fn compare(before: &Snapshot, after: &Snapshot) -> Delta {
    let mut delta = Delta::default();
    for (path, digest) in after {
        match before.get(path) {
            None => {
                delta.added.insert(path.clone(), digest.clone());
            }
            Some(old) if old != digest => {
                delta.modified.insert(path.clone(), digest.clone());
            }
            Some(_) => {}
        }
    }
    for (path, digest) in before {
        if !after.contains_key(path) {
            delta.removed.insert(path.clone(), digest.clone());
        }
    }
    delta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(entries: &[(&str, &str)]) -> Snapshot {
        entries
            .iter()
            .map(|(p, d)| (PathBuf::from(p), d.to_string()))
            .collect()
    }

    #[test]
    fn identical_snapshots_yield_empty_delta() {
        let s = snap(&[("/m/a.flac", "d1"), ("/m/b.flac", "d2")]);
        let delta = compare(&s, &s);
        assert!(delta.is_empty());
        assert_eq!(delta.len(), 0);
    }

    #[test]
    fn empty_before_means_everything_added() {
        let after = snap(&[("/m/a.flac", "d1"), ("/m/b.flac", "d2")]);
        let delta = compare(&Snapshot::new(), &after);
        assert_eq!(delta.added, after);
        assert!(delta.removed.is_empty());
        assert!(delta.modified.is_empty());
    }

    #[test]
    fn removed_carries_old_fingerprint() {
        let before = snap(&[("/m/a.flac", "d1"), ("/m/b.flac", "d2")]);
        let after = snap(&[("/m/a.flac", "d1")]);
        let delta = compare(&before, &after);
        assert!(delta.added.is_empty());
        assert!(delta.modified.is_empty());
        assert_eq!(delta.removed, snap(&[("/m/b.flac", "d2")]));
    }

    #[test]
    fn modified_carries_new_fingerprint() {
        let before = snap(&[("/m/a.flac", "old")]);
        let after = snap(&[("/m/a.flac", "new")]);
        let delta = compare(&before, &after);
        assert_eq!(delta.modified, snap(&[("/m/a.flac", "new")]));
        assert!(delta.added.is_empty());
        assert!(delta.removed.is_empty());
    }

    #[test]
    fn sets_partition_the_changed_paths() {
        let before = snap(&[
            ("/m/same.flac", "d0"),
            ("/m/gone.flac", "d1"),
            ("/m/edit.flac", "d2"),
        ]);
        let after = snap(&[
            ("/m/same.flac", "d0"),
            ("/m/edit.flac", "d2x"),
            ("/m/new.flac", "d3"),
        ]);
        let delta = compare(&before, &after);

        // Every changed path lands in exactly one set.
        for path in delta.added.keys() {
            assert!(!delta.removed.contains_key(path));
            assert!(!delta.modified.contains_key(path));
        }
        for path in delta.removed.keys() {
            assert!(!delta.modified.contains_key(path));
        }
        assert_eq!(delta.added, snap(&[("/m/new.flac", "d3")]));
        assert_eq!(delta.removed, snap(&[("/m/gone.flac", "d1")]));
        assert_eq!(delta.modified, snap(&[("/m/edit.flac", "d2x")]));

        // Untouched files are invisible.
        assert!(!delta.added.contains_key(&PathBuf::from("/m/same.flac")));
        assert_eq!(delta.len(), 3);
    }
}
