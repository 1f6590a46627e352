use std::io::{self, Write};

use anyhow::Result;
use log::{info, warn};

use crate::cache::CacheStore;
use crate::config::ScanConfig;
use crate::duplicates::{RemovalSummary, ReportSummary, remove_duplicates, write_report};
use crate::scanner::Traverser;
use crate::table::ScanRecord;

/// Where the record used by a run came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    Cache,
    Fresh,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Reported(ReportSummary),
    Removed(RemovalSummary),
}

/// Drives one invocation: reuse or rebuild the scan record, then report or
/// remove.
pub struct Orchestrator<C: CacheStore> {
    config: ScanConfig,
    cache: C,
}

impl<C: CacheStore> Orchestrator<C> {
    pub fn new(config: ScanConfig, cache: C) -> Self {
        Self { config, cache }
    }

    /// Returns the cached record when it is fresh and belongs to the same
    /// root, otherwise scans the tree and persists the new record.
    pub fn load_record(&self) -> Result<(ScanRecord, RecordSource)> {
        if let Some(record) = self.cached_record() {
            info!("Using cached scan of '{}'", record.root_path.display());
            return Ok((record, RecordSource::Cache));
        }

        // Drop the old artifact first so an interrupted scan leaves nothing stale behind.
        if let Err(e) = self.cache.evict() {
            warn!("Failed to evict cache: {:#}", e);
        }
        let record = Traverser::new(&self.config)?.traverse(&self.config.root);
        if let Err(e) = self.cache.save(&record) {
            warn!("Failed to save cache, continuing with in-memory results: {:#}", e);
        }
        Ok((record, RecordSource::Fresh))
    }

    fn cached_record(&self) -> Option<ScanRecord> {
        if self.config.no_cache {
            info!("Cache bypass requested");
            return None;
        }
        let record = self.cache.read()?;
        if record.root_path != self.config.root {
            info!(
                "Cached scan is for '{}', not '{}'",
                record.root_path.display(),
                self.config.root.display()
            );
            return None;
        }
        Some(record)
    }

    /// Runs the invocation, writing the report to stdout.
    pub fn run(&self) -> Result<Outcome> {
        let stdout = io::stdout();
        self.run_with(&mut stdout.lock())
    }

    pub fn run_with<W: Write>(&self, out: &mut W) -> Result<Outcome> {
        let (mut record, source) = self.load_record()?;
        info!(
            "{} fingerprints, {} duplicate groups ({:?} record)",
            record.fingerprint_count(),
            record.duplicated_hashes.len(),
            source
        );

        if self.config.remove {
            // Files are about to change, so the cached description is no longer true.
            if let Err(e) = self.cache.evict() {
                warn!("Failed to evict cache before removal: {:#}", e);
            }
            let summary = remove_duplicates(&mut record, self.config.keep);
            return Ok(Outcome::Removed(summary));
        }

        Ok(Outcome::Reported(write_report(&record, out)?))
    }
}
