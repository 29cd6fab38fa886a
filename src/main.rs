// Entrypoint for the uploader.
// - Keeps `main` small: set up logging, parse arguments, hand over to `ui::run`.
// - All diagnostics go to stderr; stdout is reserved for the final line.

use clap::error::ErrorKind;
use clap::Parser;
use mfcmd::{cli::Cli, error::InputCategory, ui};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mfcmd=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            println!("Error:{}", InputCategory::Arguments.token());
            return ExitCode::FAILURE;
        }
    };

    ui::run(cli)
}
