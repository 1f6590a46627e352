use std::path::{Path, PathBuf};

use clap::Parser;

use crate::config::KeepPolicy;

#[derive(Parser, Debug)]
#[command(name = "dupsweep", version)]
#[command(about = "Find files with identical content and optionally remove the extra copies")]
pub struct Cli {
    /// Directory to scan for duplicates
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Directory to scan (alternative to the positional PATH)
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Ignore any cached result and scan the tree again
    #[arg(long)]
    pub no_cache: bool,

    /// Remove duplicate files, keeping one copy of each, instead of listing them
    #[arg(short, long)]
    pub remove: bool,

    /// Include hidden files and directories (names starting with '.')
    #[arg(short = 'a', long = "all")]
    pub include_hidden: bool,

    /// Number of parallel threads for hashing (default: number of CPU cores)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Which copy survives when removing duplicates
    #[arg(long, value_enum)]
    pub keep: Option<KeepPolicy>,

    /// Enable debug logging on the terminal
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors on the terminal
    #[arg(short, long)]
    pub quiet: bool,

    /// Do not draw the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Settings file to use instead of the one in the application directory
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// The requested scan root; `--dir` wins over the positional path.
    pub fn root(&self) -> &Path {
        self.dir.as_deref().unwrap_or(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_current_directory() {
        let cli = Cli::try_parse_from(["dupsweep"]).unwrap();
        assert_eq!(cli.root(), Path::new("."));
        assert!(!cli.remove && !cli.no_cache && !cli.include_hidden);
        assert_eq!(cli.keep, None);
    }

    #[test]
    fn dir_flag_overrides_positional() {
        let cli =
            Cli::try_parse_from(["dupsweep", "-d", "/tmp/x", "-r", "-a", "--no-cache"]).unwrap();
        assert_eq!(cli.root(), Path::new("/tmp/x"));
        assert!(cli.remove && cli.include_hidden && cli.no_cache);
    }

    #[test]
    fn keep_policy_parses() {
        let cli = Cli::try_parse_from(["dupsweep", "--keep", "lexicographic"]).unwrap();
        assert_eq!(cli.keep, Some(KeepPolicy::Lexicographic));
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["dupsweep", "-v", "-q"]).is_err());
    }
}
