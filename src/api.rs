// API client module: a small blocking HTTP client for the MediaFire REST API
// (version 1.5). Every call is made once; failures are reported to the caller,
// which decides whether to fall back or abort.

use anyhow::{bail, Context};
use reqwest::blocking::{multipart, Client};
use serde::Deserialize;
use serde_json::Value;
use sha1::{Digest, Sha1};
use std::fs::File;
use std::path::Path;
use std::thread;
use std::time::Duration;
use tracing::debug;

use crate::error::{MfError, Result};
use crate::model::{AccountInfo, Destination, RemoteFileEntry};
use crate::store::RemoteStore;

pub const DEFAULT_API_URL: &str = "https://www.mediafire.com/api/1.5";
pub const DEFAULT_APP_ID: &str = "42511";

/// Upload status reported once the service has finished with an upload key.
const UPLOAD_DONE_STATUS: &str = "99";

/// Connection settings for [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub app_id: String,
    pub api_key: Option<String>,
    pub connect_timeout: Duration,
    pub poll_interval: Duration,
    pub poll_attempts: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: DEFAULT_API_URL.into(),
            app_id: DEFAULT_APP_ID.into(),
            api_key: None,
            connect_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(1),
            poll_attempts: 60,
        }
    }
}

/// Error object returned by the service with `"result": "Error"`.
#[derive(Debug, thiserror::Error)]
#[error("API error {code}: {message}")]
pub struct ApiFailure {
    pub code: i64,
    pub message: String,
}

/// Holds a reqwest blocking client, the connection settings and the session
/// token once logged in.
pub struct ApiClient {
    client: Client,
    config: ApiConfig,
    token: Option<String>,
}

#[derive(Deserialize, Debug)]
struct SessionTokenResponse {
    session_token: String,
}

#[derive(Deserialize, Debug)]
struct FileInfoResponse {
    file_info: FileInfoDto,
}

#[derive(Deserialize, Debug)]
struct FileInfoDto {
    hash: String,
    #[serde(default)]
    links: Option<LinksDto>,
}

#[derive(Deserialize, Debug)]
struct LinksDto {
    normal_download: Option<String>,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> anyhow::Result<Self> {
        // Uploads may take arbitrarily long, so only the connect phase is bounded.
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(None::<Duration>)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            config,
            token: None,
        })
    }

    /// Store a session token for subsequent calls.
    pub fn set_token(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    /// Obtain a session token for `email`/`password` and keep it.
    pub fn login(&mut self, email: &str, password: &str) -> Result<()> {
        let signature = login_signature(
            email,
            password,
            &self.config.app_id,
            self.config.api_key.as_deref(),
        );
        let params = [
            ("email", email),
            ("password", password),
            ("application_id", self.config.app_id.as_str()),
            ("signature", signature.as_str()),
            ("token_version", "1"),
        ];
        let response = self
            .call("user/get_session_token", &params)
            .map_err(|e| MfError::Auth(format!("{:#}", e)))?;
        let session: SessionTokenResponse = serde_json::from_value(response)
            .map_err(|e| MfError::Auth(format!("Parsing session token: {}", e)))?;
        self.set_token(&session.session_token);
        debug!("session token obtained");
        Ok(())
    }

    fn url(&self, action: &str) -> String {
        format!("{}/{}.php", self.config.base_url.trim_end_matches('/'), action)
    }

    /// POST `action` with form parameters and return the unwrapped `response`
    /// object.
    fn call(&self, action: &str, params: &[(&str, &str)]) -> anyhow::Result<Value> {
        let mut form: Vec<(&str, &str)> = params.to_vec();
        form.push(("response_format", "json"));
        if let Some(token) = &self.token {
            form.push(("session_token", token.as_str()));
        }

        let res = self
            .client
            .post(self.url(action))
            .form(&form)
            .send()
            .with_context(|| format!("Failed to send {} request", action))?;
        let status = res.status();
        let body = res
            .text()
            .with_context(|| format!("Failed to read {} response", action))?;
        parse_response(&body).with_context(|| format!("{} returned HTTP {}", action, status))
    }

    /// Look up `params` with `action`; an API-level error means "absent".
    fn lookup(&self, action: &str, params: &[(&str, &str)]) -> anyhow::Result<Option<Value>> {
        match self.call(action, params) {
            Ok(response) => Ok(Some(response)),
            Err(e) => match e.downcast_ref::<ApiFailure>() {
                Some(failure) => {
                    debug!(action, code = failure.code, message = %failure.message, "lookup found nothing");
                    Ok(None)
                }
                None => Err(e),
            },
        }
    }

    fn send_file(&self, local_path: &Path, folder: &Destination, hash: &str) -> anyhow::Result<String> {
        let file = File::open(local_path).context("Failed to open local file")?;
        let size = file.metadata().context("Failed to stat local file")?.len();
        let file_name = local_path
            .file_name()
            .and_then(|s| s.to_str())
            .context("Local file name is not valid UTF-8")?
            .to_string();

        let part = multipart::Part::reader_with_length(file, size)
            .file_name(file_name.clone())
            .mime_str("application/octet-stream")?;
        let form = multipart::Form::new().part("file", part);

        let folder_path = folder.absolute();
        let mut query: Vec<(&str, &str)> = vec![
            ("response_format", "json"),
            ("action_on_duplicate", "keep"),
        ];
        if !folder.is_root() {
            query.push(("path", folder_path.as_str()));
        }
        if let Some(token) = &self.token {
            query.push(("session_token", token.as_str()));
        }

        let res = self
            .client
            .post(self.url("upload/simple"))
            .query(&query)
            .header("x-filename", file_name)
            .header("x-filesize", size.to_string())
            .header("x-filehash", hash)
            .multipart(form)
            .send()
            .context("Failed to send upload request")?;
        let status = res.status();
        let body = res.text().context("Failed to read upload response")?;
        let response = parse_response(&body)
            .with_context(|| format!("upload/simple returned HTTP {}", status))?;
        upload_key(&response)
    }

    fn wait_for_upload(&self, key: &str) -> anyhow::Result<()> {
        for attempt in 1..=self.config.poll_attempts {
            let response = self.call("upload/poll_upload", &[("key", key)])?;
            match poll_status(&response)? {
                PollStatus::Done => return Ok(()),
                PollStatus::Pending(status) => {
                    debug!(attempt, status = %status, "upload still processing");
                    thread::sleep(self.config.poll_interval);
                }
            }
        }
        bail!(
            "upload {} not finished after {} polls",
            key,
            self.config.poll_attempts
        )
    }
}

impl RemoteStore for ApiClient {
    fn account_info(&self) -> Result<AccountInfo> {
        let response = self
            .call("user/get_info", &[])
            .map_err(|e| MfError::ServiceInfo(format!("{:#}", e)))?;
        parse_account_info(&response).map_err(|e| MfError::ServiceInfo(format!("{:#}", e)))
    }

    fn folder_exists(&self, folder: &Destination) -> Result<bool> {
        let path = folder.absolute();
        self.lookup("folder/get_info", &[("folder_path", path.as_str())])
            .map(|found| found.is_some())
            .map_err(|e| MfError::folder(path.clone(), format!("{:#}", e)))
    }

    fn file_entry(&self, path: &str) -> Result<Option<RemoteFileEntry>> {
        let found = self
            .lookup("file/get_info", &[("file_path", path)])
            .map_err(|e| MfError::Link(format!("{:#}", e)))?;
        found
            .map(parse_file_entry)
            .transpose()
            .map_err(|e| MfError::Link(format!("{:#}", e)))
    }

    fn create_folder(&self, folder: &Destination) -> Result<()> {
        let (parent, name) = split_parent(folder)
            .ok_or_else(|| MfError::folder(folder.to_string(), "cannot create the root"))?;
        let parent_path = parent.absolute();
        let mut params = vec![("foldername", name)];
        if !parent.is_root() {
            params.push(("parent_path", parent_path.as_str()));
        }
        self.call("folder/create", &params)
            .map(|_| ())
            .map_err(|e| MfError::folder(folder.to_string(), format!("{:#}", e)))
    }

    fn upload(&self, local_path: &Path, folder: &Destination, hash: &str) -> Result<()> {
        let key = self
            .send_file(local_path, folder, hash)
            .map_err(|e| MfError::Upload(format!("{:#}", e)))?;
        debug!(key = %key, "upload accepted, polling");
        self.wait_for_upload(&key)
            .map_err(|e| MfError::Upload(format!("{:#}", e)))
    }
}

/// `sha1(email + password + application id + api key)` as lower-case hex.
pub fn login_signature(email: &str, password: &str, app_id: &str, api_key: Option<&str>) -> String {
    let mut hasher = Sha1::new();
    hasher.update(email.as_bytes());
    hasher.update(password.as_bytes());
    hasher.update(app_id.as_bytes());
    hasher.update(api_key.unwrap_or("").as_bytes());
    hex::encode(hasher.finalize())
}

/// Unwrap `{"response": {...}}`, turning `"result": "Error"` into
/// [`ApiFailure`].
pub fn parse_response(body: &str) -> anyhow::Result<Value> {
    let mut envelope: Value = serde_json::from_str(body).context("Parsing response json")?;
    let response = envelope
        .get_mut("response")
        .map(Value::take)
        .context("Response json has no response object")?;

    match response.get("result").and_then(Value::as_str) {
        Some("Success") => Ok(response),
        Some(_) => {
            let code = response.get("error").and_then(as_i64).unwrap_or(-1);
            let message = response
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string();
            Err(ApiFailure { code, message }.into())
        }
        None => bail!("Response has no result field"),
    }
}

fn parse_account_info(response: &Value) -> anyhow::Result<AccountInfo> {
    let info = response.get("user_info").context("Missing user_info")?;
    let display_name = info
        .get("display_name")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let storage_limit = info
        .get("storage_limit")
        .and_then(as_u64)
        .context("Missing or invalid storage_limit")?;
    let used_storage = info
        .get("used_storage_size")
        .and_then(as_u64)
        .context("Missing or invalid used_storage_size")?;
    Ok(AccountInfo {
        display_name,
        storage_limit,
        used_storage,
    })
}

fn parse_file_entry(response: Value) -> anyhow::Result<RemoteFileEntry> {
    let parsed: FileInfoResponse =
        serde_json::from_value(response).context("Parsing file_info")?;
    Ok(RemoteFileEntry {
        hash: parsed.file_info.hash.to_ascii_lowercase(),
        download_link: parsed.file_info.links.and_then(|l| l.normal_download),
    })
}

fn upload_key(response: &Value) -> anyhow::Result<String> {
    let doupload = response.get("doupload").context("Missing doupload")?;
    let result = doupload.get("result").and_then(as_i64).unwrap_or(-1);
    if result != 0 {
        bail!("Upload rejected with result code {}", result);
    }
    doupload
        .get("key")
        .and_then(Value::as_str)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .context("Upload response has no key")
}

#[derive(Debug, PartialEq, Eq)]
enum PollStatus {
    Done,
    Pending(String),
}

fn poll_status(response: &Value) -> anyhow::Result<PollStatus> {
    let doupload = response.get("doupload").context("Missing doupload")?;
    let file_error = doupload.get("fileerror").and_then(as_i64).unwrap_or(0);
    if file_error != 0 {
        bail!("Upload failed with file error {}", file_error);
    }
    let status = doupload
        .get("status")
        .and_then(|v| v.as_str().map(str::to_string).or_else(|| as_i64(v).map(|n| n.to_string())))
        .context("Poll response has no status")?;
    if status == UPLOAD_DONE_STATUS {
        Ok(PollStatus::Done)
    } else {
        Ok(PollStatus::Pending(status))
    }
}

/// `(parent, last segment)` of a non-root folder.
fn split_parent(folder: &Destination) -> Option<(Destination, &str)> {
    let path = folder.as_str();
    if path.is_empty() {
        return None;
    }
    match path.rsplit_once('/') {
        Some((parent, name)) => Some((Destination::new(parent), name)),
        None => Some((Destination::root(), path)),
    }
}

// The service encodes most numbers as strings.
fn as_u64(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

fn as_i64(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        let s = value.as_str()?.trim();
        if s.is_empty() {
            Some(0)
        } else {
            s.parse().ok()
        }
    })
}
