//! Core library entry for the `docfill` CLI.
//!
//! `docfill` walks a Python repository, asks a language model for a
//! docstring for every function and class that lacks one, and splices the
//! results into the original source without disturbing any other byte.

pub mod adapters;
pub mod cassette;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod generate;
pub mod pipeline;
pub mod ports;
pub mod sanitize;
pub mod syntax;

use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::FmtSubscriber;

use crate::config::OllamaConfig;
use crate::context::ServiceContext;
use crate::error::DocfillError;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or the run cannot
/// start. Individual files that fail are reported but do not make the run
/// fail.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.print().map_err(|e| e.to_string())?;
            return Ok(());
        }
        Err(err) => return Err(err.to_string()),
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .finish();
    // Already set when `run` is called more than once in a process.
    let _ = tracing::subscriber::set_global_default(subscriber);

    execute(&cli).map_err(|err| err.to_string())
}

fn execute(cli: &cli::Cli) -> Result<(), DocfillError> {
    let options = cli.run_options();
    let config = OllamaConfig::load(cli.config.as_deref());
    let ctx = ServiceContext::from_env(&options.backend, &config)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(DocfillError::Runtime)?;

    let summary = runtime.block_on(pipeline::process_repository(
        ctx.fs.as_ref(),
        ctx.llm.as_ref(),
        &config,
        &options,
    ))?;
    println!("{summary}");
    Ok(())
}
