// Terminal layer: runs one upload from parsed arguments, shows spinners on
// stderr while long operations run, and prints the final line on stdout.
// Stdout carries exactly one line: the download link or `Error:<category>`.

use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::api::ApiClient;
use crate::cli::Cli;
use crate::error::{MfError, Result};
use crate::model::{AccountInfo, Destination, RemoteFileEntry};
use crate::resolver::{Outcome, Resolution};
use crate::store::RemoteStore;
use crate::workflow;

/// Parse-to-print driver used by the binary.
pub fn run(cli: Cli) -> ExitCode {
    info!("mfcmd v{}", env!("CARGO_PKG_VERSION"));
    let code = report(execute(&cli));
    info!("done");
    code
}

fn execute(cli: &Cli) -> Result<Resolution> {
    let credentials = cli.credentials()?;
    let request = with_spinner("Calculating checksum...", || cli.upload_request())?;

    let mut client = ApiClient::new(cli.api_config()).map_err(|e| MfError::Auth(format!("{:#}", e)))?;
    with_spinner("Logging in...", || {
        client.login(&credentials.email, &credentials.password)
    })?;
    info!("logged in");

    workflow::run(&SpinnerStore(&client), &request)
}

/// Print the final stdout line for `result` and pick the exit code.
pub fn report(result: Result<Resolution>) -> ExitCode {
    let (line, success) = final_line(result);
    println!("{}", line);
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// The stdout line for `result` and whether the run counts as successful.
pub fn final_line(result: Result<Resolution>) -> (String, bool) {
    match result {
        Ok(resolution) => {
            for fallback in &resolution.fallbacks {
                warn!(error = %fallback, "fell back to root");
            }
            match resolution.outcome {
                Outcome::Uploaded { destination, link } => {
                    info!(folder = %destination, "upload complete");
                    (link, true)
                }
                Outcome::AlreadyPresent {
                    destination,
                    link: Ok(link),
                } => {
                    info!(folder = %destination, "already uploaded");
                    (link, true)
                }
                // Nothing went wrong with the file itself, only its link.
                Outcome::AlreadyPresent { link: Err(e), .. } => {
                    error!(error = %e, "existing file has no usable link");
                    (format!("Error:{}", e.category()), true)
                }
            }
        }
        Err(e) => {
            error!(error = %e, "run failed");
            (format!("Error:{}", e.category()), false)
        }
    }
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

/// Run `f` with a spinner on stderr, cleared when `f` returns.
pub fn with_spinner<T>(message: &str, f: impl FnOnce() -> T) -> T {
    let spinner = spinner(message);
    let value = f();
    spinner.finish_and_clear();
    value
}

/// Wraps a store so that the upload shows a spinner.
struct SpinnerStore<'a, S>(&'a S);

impl<S: RemoteStore> RemoteStore for SpinnerStore<'_, S> {
    fn account_info(&self) -> Result<AccountInfo> {
        self.0.account_info()
    }

    fn folder_exists(&self, folder: &Destination) -> Result<bool> {
        self.0.folder_exists(folder)
    }

    fn file_entry(&self, path: &str) -> Result<Option<RemoteFileEntry>> {
        self.0.file_entry(path)
    }

    fn create_folder(&self, folder: &Destination) -> Result<()> {
        self.0.create_folder(folder)
    }

    fn upload(&self, local_path: &Path, folder: &Destination, hash: &str) -> Result<()> {
        with_spinner(&format!("Uploading to {}...", folder), || {
            self.0.upload(local_path, folder, hash)
        })
    }
}
