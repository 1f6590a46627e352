use std::fs;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{HumanBytes, HumanCount};
use log::{debug, info, warn};
use time::{Duration, OffsetDateTime};

use crate::table::ScanRecord;

pub const CACHE_FILE_NAME: &str = concat!(".", env!("CARGO_PKG_NAME"), "_cache");

/// How long, in seconds, a persisted scan stays usable after it was written.
pub const CACHE_TTL_SECS: i64 = 120;

/// Whether a cache artifact last written `age_secs` seconds ago is stale.
///
/// An artifact exactly `CACHE_TTL_SECS` old is still usable.
pub fn is_expired(age_secs: i64) -> bool {
    is_age_expired(Duration::seconds(age_secs))
}

/// Like [`is_expired`] but keeps sub-second precision, so 120.7s is stale.
pub fn is_age_expired(age: Duration) -> bool {
    age > Duration::seconds(CACHE_TTL_SECS)
}

/// Storage for the result of the previous scan.
pub trait CacheStore {
    /// Replaces any stored record with `record`.
    fn save(&self, record: &ScanRecord) -> Result<()>;

    /// Returns the stored record if it exists, parses and has not expired.
    /// Every other outcome is reported as `None`.
    fn read(&self) -> Option<ScanRecord>;

    /// Deletes the stored record. Deleting a missing record succeeds.
    fn evict(&self) -> Result<()>;
}

/// A [`CacheStore`] backed by a single JSON file.
///
/// Freshness is judged by the file's modification time rather than by a
/// timestamp inside the document.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    /// Path to the cache file on disk.
    pub cache_file: PathBuf,
}

impl FileCacheStore {
    /// Store living at `<app_dir>/.dupsweep_cache`.
    pub fn new(app_dir: &Path) -> Self {
        Self::at(app_dir.join(CACHE_FILE_NAME))
    }

    pub fn at(cache_file: impl Into<PathBuf>) -> Self {
        Self {
            cache_file: cache_file.into(),
        }
    }

    fn try_read(&self) -> Result<Option<ScanRecord>> {
        let file = match fs::File::open(&self.cache_file) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No cache file at '{}'", self.cache_file.display());
                return Ok(None);
            }
            Err(e) => return Err(e).context("Failed to open cache file"),
        };
        let metadata = file.metadata().context("Failed to stat cache file")?;
        let modified = metadata
            .modified()
            .context("Cache file has no modification time")?;

        // A modification time in the future counts as brand new.
        let age = OffsetDateTime::now_utc() - OffsetDateTime::from(modified);
        let age = age.max(Duration::ZERO);
        if is_age_expired(age) {
            info!(
                "Cache is {:.1}s old (limit {}s), ignoring it",
                age.as_seconds_f64(),
                CACHE_TTL_SECS
            );
            return Ok(None);
        }

        info!(
            "Loading cache from {} ({}, {:.1}s old)",
            self.cache_file.display(),
            HumanBytes(metadata.len()),
            age.as_seconds_f64()
        );
        let record: ScanRecord =
            serde_json::from_reader(BufReader::new(file)).context("Failed to parse cache file")?;
        info!(
            "Cache has {} fingerprints for '{}'",
            HumanCount(record.fingerprint_count() as u64),
            record.root_path.display()
        );
        Ok(Some(record))
    }
}

impl CacheStore for FileCacheStore {
    fn save(&self, record: &ScanRecord) -> Result<()> {
        if let Some(parent) = self.cache_file.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create cache directory: '{}'", parent.display())
            })?;
        }
        let content = serde_json::to_vec(record).context("Failed to serialize scan record")?;

        // Write beside the target and rename so readers never see a partial file.
        let staging = self.cache_file.with_extension("tmp");
        fs::write(&staging, &content)
            .with_context(|| format!("Failed to write cache file: '{}'", staging.display()))?;
        fs::rename(&staging, &self.cache_file).with_context(|| {
            format!("Failed to replace cache file: '{}'", self.cache_file.display())
        })?;

        info!(
            "Saved cache to {} ({})",
            self.cache_file.display(),
            HumanBytes(content.len() as u64)
        );
        Ok(())
    }

    fn read(&self) -> Option<ScanRecord> {
        match self.try_read() {
            Ok(record) => record,
            Err(e) => {
                warn!("Ignoring unusable cache '{}': {:#}", self.cache_file.display(), e);
                None
            }
        }
    }

    fn evict(&self) -> Result<()> {
        match fs::remove_file(&self.cache_file) {
            Ok(()) => {
                debug!("Evicted cache '{}'", self.cache_file.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| {
                format!("Failed to remove cache file: '{}'", self.cache_file.display())
            }),
        }
    }
}

/// A missing store: nothing is ever cached and every save fails softly.
///
/// Used when no per-user directory can be resolved.
impl<S: CacheStore> CacheStore for Option<S> {
    fn save(&self, record: &ScanRecord) -> Result<()> {
        match self {
            Some(store) => store.save(record),
            None => anyhow::bail!("No cache location is available"),
        }
    }

    fn read(&self) -> Option<ScanRecord> {
        self.as_ref().and_then(CacheStore::read)
    }

    fn evict(&self) -> Result<()> {
        self.as_ref().map_or(Ok(()), CacheStore::evict)
    }
}
