//! Metaforge
//!
//! Turns a plain-language schema request into deployed Salesforce metadata.

use metaforge_cli::{Cli, execute, init_tracing, report_error};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}
