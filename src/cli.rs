// Command-line surface and input validation. Arguments are all optional at the
// parser level so that missing values are reported with the uploader's own
// error categories instead of clap's usage errors.

use clap::{ArgAction, Parser};
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::api::{ApiConfig, DEFAULT_API_URL, DEFAULT_APP_ID};
use crate::error::{InputCategory, MfError, Result};
use crate::hash::{normalize_hex_digest, sha256_file};
use crate::model::{UploadRequest, DEFAULT_UPLOAD_FOLDER};

#[derive(Parser, Debug)]
#[command(name = "mfcmd", version, about, disable_help_flag = true)]
pub struct Cli {
    /// Account email
    #[arg(short = 'e', long, env = "MFCMD_EMAIL")]
    pub email: Option<String>,

    /// Account password
    #[arg(short = 'p', long, env = "MFCMD_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Local file to upload
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// Remote folder, relative to the account root
    #[arg(short = 'u', long = "upload-folder")]
    pub upload_folder: Option<String>,

    /// SHA-256 of the file as hex; computed when omitted
    #[arg(short = 'h', long)]
    pub hash: Option<String>,

    /// API base URL
    #[arg(long, env = "MFCMD_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Application id used to obtain the session token
    #[arg(long, env = "MFCMD_APP_ID", default_value = DEFAULT_APP_ID)]
    pub app_id: String,

    /// Application API key, if the application id requires one
    #[arg(long, env = "MFCMD_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Cli {
    pub fn credentials(&self) -> Result<Credentials> {
        let email = non_empty(self.email.as_deref())
            .ok_or_else(|| MfError::input(InputCategory::Credentials, "no email given"))?;
        let password = non_empty(self.password.as_deref())
            .ok_or_else(|| MfError::input(InputCategory::Credentials, "no password given"))?;
        info!(email, "credentials supplied");
        Ok(Credentials {
            email: email.to_string(),
            password: password.to_string(),
        })
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.api_url.clone(),
            app_id: self.app_id.clone(),
            api_key: self.api_key.clone().filter(|k| !k.is_empty()),
            ..ApiConfig::default()
        }
    }

    pub fn upload_request(&self) -> Result<UploadRequest> {
        self.upload_request_with(sha256_file)
    }

    /// Validate the file arguments and build the request, calling
    /// `compute_hash` only when no hash was supplied.
    pub fn upload_request_with<F>(&self, compute_hash: F) -> Result<UploadRequest>
    where
        F: FnOnce(&Path) -> io::Result<String>,
    {
        let local_path = self
            .file
            .clone()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| MfError::input(InputCategory::FilePath, "no file given"))?;
        let size = regular_file_size(&local_path)?;
        let file_name = local_path
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| MfError::input(InputCategory::FilePath, "file name is not valid UTF-8"))?
            .to_string();
        info!(path = %local_path.display(), file_name, "file");

        let folder = non_empty(self.upload_folder.as_deref())
            .unwrap_or(DEFAULT_UPLOAD_FOLDER)
            .to_string();
        info!(folder, "upload folder");

        let hash = match self.hash.as_deref().filter(|h| !h.trim().is_empty()) {
            Some(given) => normalize_hex_digest(given).ok_or_else(|| {
                MfError::input(InputCategory::Hash, format!("{:?} is not a hex SHA-256", given))
            })?,
            None => {
                info!("no SHA-256 specified: calculating");
                compute_hash(&local_path)
                    .map_err(|e| MfError::input(InputCategory::NoFile, e.to_string()))?
            }
        };
        info!(hash, "checksum");

        Ok(UploadRequest {
            local_path,
            file_name,
            hash,
            folder,
            size,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn regular_file_size(path: &Path) -> Result<u64> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        MfError::input(InputCategory::NoFile, format!("{}: {}", path.display(), e))
    })?;
    if !metadata.is_file() {
        return Err(MfError::input(
            InputCategory::NoRegularFile,
            format!("{} is not a regular file", path.display()),
        ));
    }
    Ok(metadata.len())
}
