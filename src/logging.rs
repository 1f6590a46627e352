//! Logging setup.
//!
//! Everything logs through the `log` macros. The binary installs a
//! `simplelog` combined logger: terminal output on stderr and, when the
//! application directory is writable, a debug-level log file beside the
//! cache.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

pub const LOG_FILE_NAME: &str = concat!(".", env!("CARGO_PKG_NAME"), "_log");

/// The log file is emptied before appending once it grows past this size.
pub const MAX_LOG_FILE_BYTES: u64 = 5_000_000;

pub fn log_file_path(app_dir: &Path) -> PathBuf {
    app_dir.join(LOG_FILE_NAME)
}

pub fn terminal_level(verbose: bool, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Error
    } else if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Opens `path` for appending, truncating it first if it exceeds
/// [`MAX_LOG_FILE_BYTES`].
pub fn open_log_file(path: &Path) -> Result<File> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: '{}'", path.display()))?;
    let size = file
        .metadata()
        .with_context(|| format!("Failed to stat log file: '{}'", path.display()))?
        .len();
    if size > MAX_LOG_FILE_BYTES {
        file.set_len(0)
            .with_context(|| format!("Failed to truncate log file: '{}'", path.display()))?;
    }
    Ok(file)
}

fn logger_config() -> Config {
    let mut builder = ConfigBuilder::new();
    // Stays on UTC when the local offset cannot be determined.
    let _ = builder.set_time_offset_to_local();
    builder.build()
}

/// Installs the process-wide logger. Call once, before any logging.
///
/// A log file that cannot be opened is reported on the terminal and skipped.
pub fn init_logging(verbose: bool, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let config = logger_config();
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        terminal_level(verbose, quiet),
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    let mut file_error = None;
    if let Some(path) = log_file {
        match open_log_file(path) {
            Ok(file) => loggers.push(WriteLogger::new(LevelFilter::Debug, config, file)),
            Err(e) => file_error = Some(e),
        }
    }

    CombinedLogger::init(loggers).context("Failed to initialize logger")?;
    if let Some(e) = file_error {
        log::warn!("Logging to terminal only: {:#}", e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn levels_follow_flags() {
        assert_eq!(terminal_level(false, false), LevelFilter::Info);
        assert_eq!(terminal_level(true, false), LevelFilter::Debug);
        assert_eq!(terminal_level(false, true), LevelFilter::Error);
    }

    #[test]
    fn small_log_is_appended_to() {
        let dir = tempfile::tempdir().unwrap();
        let path = log_file_path(dir.path());
        fs::write(&path, "previous\n").unwrap();

        let file = open_log_file(&path).unwrap();
        assert_eq!(file.metadata().unwrap().len(), 9);
    }

    #[test]
    fn oversized_log_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let path = log_file_path(dir.path());
        fs::write(&path, vec![b'x'; MAX_LOG_FILE_BYTES as usize + 1]).unwrap();

        let file = open_log_file(&path).unwrap();
        assert_eq!(file.metadata().unwrap().len(), 0);
    }
}
