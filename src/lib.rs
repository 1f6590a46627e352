pub mod cache;
pub mod cli;
pub mod config;
pub mod digest;
pub mod duplicates;
pub mod logging;
pub mod orchestrator;
pub mod scanner;
pub mod table;
pub mod utils;

pub use cache::{CacheStore, FileCacheStore, is_age_expired, is_expired};
pub use cli::Cli;
pub use config::{KeepPolicy, ScanConfig, Settings};
pub use digest::{fingerprint_bytes, fingerprint_file};
pub use duplicates::{RemovalSummary, ReportSummary, remove_duplicates, write_report};
pub use orchestrator::{Orchestrator, Outcome, RecordSource};
pub use scanner::{TraversalStats, Traverser};
pub use table::{ResultTable, ScanRecord};
pub use utils::format_human_elapsed;
