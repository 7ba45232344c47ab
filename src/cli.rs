//! CLI argument definitions.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use tracing::Level;

use crate::generate::{Backend, FailurePolicy};
use crate::pipeline::RunOptions;

/// Top-level CLI parser for `docfill`.
#[derive(Debug, Parser)]
#[command(
    name = "docfill",
    version,
    about = "Fill in missing Python docstrings using a language model"
)]
pub struct Cli {
    /// Root of the repository to document.
    pub repo_path: PathBuf,

    /// Generation backend.
    #[arg(long = "llm", default_value = "ollama")]
    pub llm: String,

    /// Print suggested docstrings without modifying any file.
    #[arg(long)]
    pub dry_run: bool,

    /// Copy each file to `<file>.bak` before overwriting it.
    #[arg(long)]
    pub backup: bool,

    /// Paths (relative to the repository root) to leave alone.
    #[arg(long, num_args = 1.., value_name = "PATH")]
    pub ignore: Vec<PathBuf>,

    /// Backend settings file [default: ollama_config.json].
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// What to do with a definition whose docstring could not be generated.
    #[arg(long, value_enum, default_value_t = FailurePolicy::Skip)]
    pub on_failure: FailurePolicy,

    /// Extra attempts for transient backend failures.
    #[arg(long, default_value_t = 2, value_name = "N")]
    pub retries: u32,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Most detailed level to log.
    #[must_use]
    pub fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    /// The run these arguments describe.
    #[must_use]
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            backend: self.backend(),
            dry_run: self.dry_run,
            create_backup: self.backup,
            ignore: self.ignore.clone(),
            on_failure: self.on_failure,
            max_retries: self.retries,
            retry_delay: Duration::from_millis(500),
            ..RunOptions::new(&self.repo_path)
        }
    }

    /// The selected backend.
    #[must_use]
    pub fn backend(&self) -> Backend {
        match self.llm.parse() {
            Ok(backend) => backend,
            Err(never) => match never {},
        }
    }
}
