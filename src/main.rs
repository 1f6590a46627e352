use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use log::{debug, info, warn};

use dupsweep::config::{self, SETTINGS_FILE_NAME};
use dupsweep::logging::{init_logging, log_file_path};
use dupsweep::{
    Cli, FileCacheStore, Orchestrator, Outcome, ScanConfig, Settings, format_human_elapsed,
};

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();

    // Without an app directory the run goes on uncached, logging to the terminal only.
    let app_dir = config::app_dir().and_then(|dir| config::ensure_app_dir(&dir).map(|()| dir));
    let log_file = app_dir.as_ref().ok().map(|dir| log_file_path(dir));
    init_logging(cli.verbose, cli.quiet, log_file.as_deref())?;

    info!("Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    debug!("Command line arguments: {:?}", cli);
    let app_dir = match app_dir {
        Ok(dir) => Some(dir),
        Err(e) => {
            warn!("Cache and log file are unavailable: {:#}", e);
            None
        }
    };

    let settings_path = cli
        .config
        .clone()
        .or_else(|| app_dir.as_ref().map(|dir| dir.join(SETTINGS_FILE_NAME)));
    let settings = match settings_path {
        Some(path) => Settings::load(&path)?,
        None => Settings::default(),
    };
    let config = ScanConfig::from_cli(&cli, &settings)?;
    info!("Target directory: '{}'", config.root.display());
    debug!("Configuration: {:?}", config);

    let cache = app_dir.as_deref().map(FileCacheStore::new);
    let orchestrator = Orchestrator::new(config, cache);
    match orchestrator.run()? {
        Outcome::Reported(summary) => debug!("Report: {:?}", summary),
        Outcome::Removed(summary) if summary.failed > 0 => {
            warn!("{} files could not be removed", summary.failed)
        }
        Outcome::Removed(summary) => debug!("Removal: {:?}", summary),
    }

    info!("Completed in {}", format_human_elapsed(start_time.elapsed()));
    Ok(())
}
