//! Entry point for the `parcel-match` command-line interface.
#![forbid(unsafe_code)]

use std::process::ExitCode;

use parcel_match_cli::CliError;

fn main() -> ExitCode {
    match parcel_match_cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::ArgumentParsing(err)) => {
            #[expect(
                clippy::let_underscore_must_use,
                reason = "help and usage output is best effort"
            )]
            let _ = err.print();
            if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

#[expect(clippy::print_stderr, reason = "fatal errors are reported on stderr")]
fn report(err: &CliError) {
    eprintln!("parcel-match: {err}");
}
