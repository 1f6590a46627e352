use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

/// The result of one scan: fingerprint -> paths, plus the fingerprints that
/// have more than one path.
///
/// This is also the on-disk cache format, so field names are part of the
/// artifact layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRecord {
    /// Fingerprints whose location set has two or more members, in the order
    /// they first became duplicated.
    pub duplicated_hashes: Vec<String>,
    /// Fingerprint -> paths sharing that content.
    pub locations: HashMap<String, Vec<PathBuf>>,
    /// Canonical root the record was produced for.
    pub root_path: PathBuf,
}

impl ScanRecord {
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn fingerprint_count(&self) -> usize {
        self.locations.len()
    }

    /// Iterates duplicated fingerprints together with their location sets.
    pub fn duplicate_groups(&self) -> impl Iterator<Item = (&str, &[PathBuf])> {
        self.duplicated_hashes.iter().filter_map(|hash| {
            self.locations
                .get(hash)
                .map(|paths| (hash.as_str(), paths.as_slice()))
        })
    }

    /// Number of files that would be removed to leave one copy per group.
    pub fn duplicate_file_count(&self) -> usize {
        self.duplicate_groups()
            .map(|(_, paths)| paths.len().saturating_sub(1))
            .sum()
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }
}

/// Shared mutation target for concurrent hashing tasks.
///
/// All bookkeeping for one file happens inside a single critical section, so
/// the duplicate index and the location sets never disagree.
pub struct ResultTable {
    inner: Mutex<ScanRecord>,
}

impl ResultTable {
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Mutex::new(ScanRecord::new(root_path)),
        }
    }

    /// Records that `path` has content `fingerprint`.
    ///
    /// The fingerprint enters the duplicate index exactly once, when its
    /// location set grows from one member to two.
    pub fn record(&self, fingerprint: String, path: PathBuf) {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let record = &mut *guard;

        match record.locations.get_mut(&fingerprint) {
            Some(paths) => {
                if paths.len() == 1 {
                    record.duplicated_hashes.push(fingerprint);
                }
                paths.push(path);
            }
            None => {
                record.locations.insert(fingerprint, vec![path]);
            }
        }
    }

    /// Consumes the table once every hashing task has joined.
    pub fn into_record(self) -> ScanRecord {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}
