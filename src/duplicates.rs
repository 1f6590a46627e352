use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use indicatif::HumanCount;
use log::{error, info, warn};

use crate::config::KeepPolicy;
use crate::table::ScanRecord;
use crate::utils::display_relative;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub groups: usize,
    pub duplicate_files: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalSummary {
    pub removed: usize,
    pub failed: usize,
    /// The surviving path of each duplicate group.
    pub kept: Vec<PathBuf>,
}

/// Writes every duplicate group in `record` to `out`, paths shown relative to
/// the scan root.
pub fn write_report<W: Write>(record: &ScanRecord, out: &mut W) -> Result<ReportSummary> {
    let summary = ReportSummary {
        groups: record.duplicated_hashes.len(),
        duplicate_files: record.duplicate_file_count(),
    };
    if summary.groups == 0 {
        writeln!(out, "{}", "No duplicate files found!".green())?;
        return Ok(summary);
    }

    for (hash, paths) in record.duplicate_groups() {
        writeln!(
            out,
            "{} ({} files, {})",
            "Duplicate group".yellow().bold(),
            paths.len(),
            &hash[..hash.len().min(12)]
        )?;
        for path in paths {
            writeln!(out, "  - {}", display_relative(path, record.root()).display())?;
        }
        writeln!(out)?;
    }
    writeln!(
        out,
        "Found {} duplicate files in {} groups",
        HumanCount(summary.duplicate_files as u64),
        HumanCount(summary.groups as u64)
    )?;
    Ok(summary)
}

/// Deletes all but one path of every duplicate group.
///
/// Paths are popped from the end of each location set until one is left;
/// `keep` decides the order first. A path that cannot be deleted is logged
/// and counted, and the pass moves on.
pub fn remove_duplicates(record: &mut ScanRecord, keep: KeepPolicy) -> RemovalSummary {
    let mut summary = RemovalSummary::default();
    if record.duplicated_hashes.is_empty() {
        info!("No duplicate files to remove");
        return summary;
    }

    let ScanRecord {
        duplicated_hashes,
        locations,
        root_path,
    } = record;

    for hash in duplicated_hashes.iter() {
        let Some(paths) = locations.get_mut(hash) else {
            warn!("Duplicate index names unknown fingerprint {}", hash);
            continue;
        };
        if keep == KeepPolicy::Lexicographic {
            paths.sort();
        }
        while paths.len() > 1 {
            let Some(path) = paths.pop() else { break };
            match fs::remove_file(&path) {
                Ok(()) => {
                    info!("Removed {}", display_relative(&path, root_path).display());
                    summary.removed += 1;
                }
                Err(e) => {
                    error!("Failed to remove '{}': {}", path.display(), e);
                    summary.failed += 1;
                }
            }
        }
        if let Some(survivor) = paths.first() {
            info!("Kept {}", display_relative(survivor, root_path).display());
            summary.kept.push(survivor.clone());
        }
    }

    info!(
        "Removed {} duplicate files ({} failures), kept {}",
        HumanCount(summary.removed as u64),
        summary.failed,
        HumanCount(summary.kept.len() as u64)
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ResultTable;
    use std::path::Path;

    fn record_for(root: &Path, files: &[(&str, &str)]) -> ScanRecord {
        let table = ResultTable::new(root);
        for (name, hash) in files {
            let path = root.join(name);
            fs::write(&path, hash).unwrap();
            table.record(hash.to_string(), path);
        }
        table.into_record()
    }

    #[test]
    fn report_lists_groups_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        let record = record_for(dir.path(), &[("a", "x"), ("b", "x"), ("c", "y")]);

        let mut out = Vec::new();
        let summary = write_report(&record, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(summary, ReportSummary { groups: 1, duplicate_files: 1 });
        assert!(text.contains("  - a\n"));
        assert!(text.contains("  - b\n"));
        assert!(!text.contains("  - c\n"));
        assert!(text.contains("2 files"));
    }

    #[test]
    fn report_on_empty_record() {
        let mut out = Vec::new();
        let summary = write_report(&ScanRecord::new("/nowhere"), &mut out).unwrap();
        assert_eq!(summary, ReportSummary::default());
        assert!(String::from_utf8(out).unwrap().contains("No duplicate files found!"));
    }

    #[test]
    fn first_seen_keeps_first_recorded_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut record = record_for(dir.path(), &[("z", "x"), ("m", "x"), ("a", "x")]);

        let summary = remove_duplicates(&mut record, KeepPolicy::FirstSeen);

        assert_eq!(summary.removed, 2);
        assert_eq!(summary.kept, vec![dir.path().join("z")]);
        assert!(dir.path().join("z").exists());
        assert!(!dir.path().join("m").exists());
        assert!(!dir.path().join("a").exists());
        assert_eq!(record.locations["x"], vec![dir.path().join("z")]);
    }

    #[test]
    fn lexicographic_keeps_smallest_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut record = record_for(dir.path(), &[("z", "x"), ("m", "x"), ("a", "x")]);

        let summary = remove_duplicates(&mut record, KeepPolicy::Lexicographic);

        assert_eq!(summary.kept, vec![dir.path().join("a")]);
        assert!(dir.path().join("a").exists());
        assert!(!dir.path().join("z").exists());
    }

    #[test]
    fn failed_removal_does_not_stop_the_pass() {
        let dir = tempfile::tempdir().unwrap();
        let mut record = record_for(dir.path(), &[("a", "x"), ("b", "x"), ("c", "y"), ("d", "y")]);
        fs::remove_file(dir.path().join("b")).unwrap();

        let summary = remove_duplicates(&mut record, KeepPolicy::FirstSeen);

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.removed, 1);
        assert_eq!(summary.kept.len(), 2);
        assert!(dir.path().join("c").exists());
        assert!(!dir.path().join("d").exists());
    }

    #[test]
    fn removal_on_empty_record_is_a_no_op() {
        let mut record = ScanRecord::new("/nowhere");
        let summary = remove_duplicates(&mut record, KeepPolicy::FirstSeen);
        assert_eq!(summary, RemovalSummary::default());
    }
}
