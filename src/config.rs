//! Run configuration.
//!
//! A [`ScanConfig`] is built once at startup from the command line and the
//! optional `config.toml` in the application directory, then handed to the
//! orchestrator. Precedence is defaults < settings file < CLI flags.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use directories::BaseDirs;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
pub const SETTINGS_FILE_NAME: &str = "config.toml";

/// Per-user directory holding the cache artifact, the log file and settings.
///
/// `~/.cache/dupsweep` everywhere except Windows, where it is `~\.dupsweep`.
pub fn app_dir() -> Result<PathBuf> {
    let base = BaseDirs::new().context("Failed to determine the home directory")?;
    let home = base.home_dir();
    if cfg!(windows) {
        Ok(home.join(format!(".{APP_NAME}")))
    } else {
        Ok(home.join(".cache").join(APP_NAME))
    }
}

pub fn ensure_app_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create application directory: '{}'", dir.display()))
}

/// Which path of a duplicate group is kept by a removal pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeepPolicy {
    /// Keep the path that was recorded first. Hashing completes in no fixed
    /// order, so this can differ between runs.
    #[default]
    FirstSeen,
    /// Keep the lexicographically smallest path.
    Lexicographic,
}

/// Optional values read from `config.toml`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub threads: Option<usize>,
    pub include_hidden: Option<bool>,
    pub keep: Option<KeepPolicy>,
    pub progress: Option<bool>,
}

impl Settings {
    /// Loads settings from `path`. A missing file yields the defaults; a file
    /// that exists but does not parse is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings file at '{}'", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read settings: '{}'", path.display()));
            }
        };
        toml::from_str(&content)
            .with_context(|| format!("Invalid settings file: '{}'", path.display()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Canonical, existing directory to scan.
    pub root: PathBuf,
    pub no_cache: bool,
    pub remove: bool,
    pub include_hidden: bool,
    /// Upper bound on concurrently running hashing tasks.
    pub threads: usize,
    pub keep: KeepPolicy,
    pub show_progress: bool,
}

impl ScanConfig {
    /// Default configuration for `root`.
    ///
    /// # Errors
    ///
    /// Fails if `root` does not resolve to an existing directory.
    pub fn new(root: &Path) -> Result<Self> {
        Ok(Self {
            root: resolve_root(root)?,
            no_cache: false,
            remove: false,
            include_hidden: false,
            threads: default_threads(),
            keep: KeepPolicy::default(),
            show_progress: true,
        })
    }

    pub fn from_cli(cli: &Cli, settings: &Settings) -> Result<Self> {
        let mut config = Self::new(cli.root())?;
        config.no_cache = cli.no_cache;
        config.remove = cli.remove;
        config.include_hidden = cli.include_hidden || settings.include_hidden.unwrap_or(false);
        config.threads = cli
            .threads
            .or(settings.threads)
            .filter(|&n| n > 0)
            .unwrap_or(config.threads);
        config.keep = cli.keep.or(settings.keep).unwrap_or_default();
        config.show_progress = !cli.no_progress && settings.progress.unwrap_or(true);
        Ok(config)
    }
}

fn resolve_root(root: &Path) -> Result<PathBuf> {
    let absolute = root
        .canonicalize()
        .with_context(|| format!("Failed to resolve path: '{}'", root.display()))?;
    if !absolute.is_dir() {
        bail!("Path is not a directory: '{}'", absolute.display());
    }
    Ok(absolute)
}

fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn new_canonicalizes_root() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScanConfig::new(dir.path()).unwrap();
        assert_eq!(config.root, dir.path().canonicalize().unwrap());
        assert!(config.threads >= 1);
        assert_eq!(config.keep, KeepPolicy::FirstSeen);
    }

    #[test]
    fn rejects_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ScanConfig::new(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn rejects_file_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        let err = ScanConfig::new(&file).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn settings_file_fills_gaps_and_cli_wins() {
        let dir = tempfile::tempdir().unwrap();
        let settings_path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(
            &settings_path,
            "threads = 3\ninclude_hidden = true\nkeep = \"lexicographic\"\nprogress = false\n",
        )
        .unwrap();
        let settings = Settings::load(&settings_path).unwrap();

        let root = dir.path().to_str().unwrap();
        let cli = Cli::try_parse_from(["dupsweep", root]).unwrap();
        let config = ScanConfig::from_cli(&cli, &settings).unwrap();
        assert_eq!(config.threads, 3);
        assert!(config.include_hidden);
        assert_eq!(config.keep, KeepPolicy::Lexicographic);
        assert!(!config.show_progress);

        let cli =
            Cli::try_parse_from(["dupsweep", root, "-t", "5", "--keep", "first-seen"]).unwrap();
        let config = ScanConfig::from_cli(&cli, &settings).unwrap();
        assert_eq!(config.threads, 5);
        assert_eq!(config.keep, KeepPolicy::FirstSeen);
    }

    #[test]
    fn missing_settings_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn malformed_settings_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&path, "threads = \"many\"").unwrap();
        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn zero_threads_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();
        let cli = Cli::try_parse_from(["dupsweep", root, "-t", "0"]).unwrap();
        let config = ScanConfig::from_cli(&cli, &Settings::default()).unwrap();
        assert_eq!(config.threads, default_threads());
    }
}
