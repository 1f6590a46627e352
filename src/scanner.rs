use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use indicatif::{HumanCount, ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};

use crate::config::ScanConfig;
use crate::digest::fingerprint_file;
use crate::table::{ResultTable, ScanRecord};
use crate::utils::is_hidden;

/// Counters collected during one traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalStats {
    pub files_hashed: usize,
    pub files_failed: usize,
    pub dirs_visited: usize,
    pub dirs_failed: usize,
    pub hidden_skipped: usize,
}

/// Walks a directory tree and fingerprints every regular file in it.
///
/// Directory listing happens on the calling thread using an explicit stack of
/// pending directories. Each discovered file becomes a hashing task on a
/// dedicated pool, so at most `threads` files are read at once while
/// discovery keeps going.
///
/// Symbolic links are neither followed nor hashed, whether they point at a
/// file or a directory. A file reachable only through a link is not part of
/// the scan.
pub struct Traverser {
    pool: rayon::ThreadPool,
    include_hidden: bool,
    show_progress: bool,
}

impl Traverser {
    pub fn new(config: &ScanConfig) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|i| format!("hash-{i}"))
            .build()
            .context("Failed to build hashing thread pool")?;
        Ok(Self {
            pool,
            include_hidden: config.include_hidden,
            show_progress: config.show_progress,
        })
    }

    /// Scans `root` and returns the finished record.
    ///
    /// Blocks until every hashing task has completed.
    pub fn traverse(&self, root: &Path) -> ScanRecord {
        self.traverse_with_stats(root).0
    }

    pub fn traverse_with_stats(&self, root: &Path) -> (ScanRecord, TraversalStats) {
        info!(
            "Scanning {} with {} hashing threads",
            root.display(),
            self.pool.current_num_threads()
        );

        let table = ResultTable::new(root);
        let progress = self.progress_bar();
        let files_hashed = AtomicUsize::new(0);
        let files_failed = AtomicUsize::new(0);
        let mut stats = TraversalStats::default();

        let table_ref = &table;
        let progress_ref = &progress;
        let hashed_ref = &files_hashed;
        let failed_ref = &files_failed;

        // The scope only returns once every spawned task has finished.
        self.pool.in_place_scope(|scope| {
            let mut pending: Vec<PathBuf> = vec![root.to_path_buf()];

            while let Some(dir) = pending.pop() {
                let entries = match fs::read_dir(&dir) {
                    Ok(entries) => entries,
                    Err(e) => {
                        warn!("Skipping unreadable directory '{}': {}", dir.display(), e);
                        stats.dirs_failed += 1;
                        continue;
                    }
                };
                stats.dirs_visited += 1;

                for entry in entries {
                    let entry = match entry {
                        Ok(entry) => entry,
                        Err(e) => {
                            warn!("Failed to read entry in '{}': {}", dir.display(), e);
                            continue;
                        }
                    };
                    if !self.include_hidden && is_hidden(&entry.file_name()) {
                        stats.hidden_skipped += 1;
                        continue;
                    }
                    let path = entry.path();
                    let file_type = match entry.file_type() {
                        Ok(file_type) => file_type,
                        Err(e) => {
                            warn!("Failed to read file type of '{}': {}", path.display(), e);
                            continue;
                        }
                    };

                    if file_type.is_dir() {
                        pending.push(path);
                    } else if file_type.is_file() {
                        progress_ref.inc_length(1);
                        scope.spawn(move |_| {
                            if hash_into(table_ref, path) {
                                hashed_ref.fetch_add(1, Ordering::Relaxed);
                            } else {
                                failed_ref.fetch_add(1, Ordering::Relaxed);
                            }
                            progress_ref.inc(1);
                        });
                    } else {
                        debug!("Skipping non-regular entry '{}'", path.display());
                    }
                }
            }
        });

        progress.finish_and_clear();
        stats.files_hashed = files_hashed.into_inner();
        stats.files_failed = files_failed.into_inner();
        info!(
            "Hashed {} files in {} directories ({} failed, {} hidden entries skipped)",
            HumanCount(stats.files_hashed as u64),
            HumanCount(stats.dirs_visited as u64),
            stats.files_failed + stats.dirs_failed,
            stats.hidden_skipped
        );

        (table.into_record(), stats)
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let style = ProgressStyle::with_template(PROGRESS_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        ProgressBar::new(0).with_style(style)
    }
}

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ETA: {eta}";

/// Fingerprints `path` into `table`. An unreadable file is logged and left
/// out; returns whether it was recorded.
fn hash_into(table: &ResultTable, path: PathBuf) -> bool {
    match fingerprint_file(&path) {
        Ok(hash) => {
            table.record(hash, path);
            true
        }
        Err(e) => {
            error!("Skipping file: {:#}", e);
            false
        }
    }
}
