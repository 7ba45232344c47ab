//! Binary entrypoint for the `docfill` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    // Recording and replay are selected in ServiceContext::from_env via
    // DOCFILL_RECORD=<file> and DOCFILL_REPLAY=<file>.
    match docfill::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
