// The remote storage operations the workflow depends on.
//
// `ApiClient` implements this against MediaFire; tests use an in-memory
// recording store.

use std::path::Path;

use crate::error::Result;
use crate::model::{AccountInfo, Destination, RemoteFileEntry};

/// Operations against an already authenticated session.
///
/// Lookups return `Ok(None)`/`Ok(false)` when the service says the path is
/// absent and `Err` when the service could not be asked at all.
pub trait RemoteStore {
    fn account_info(&self) -> Result<AccountInfo>;

    fn folder_exists(&self, folder: &Destination) -> Result<bool>;

    /// Look up the file at an absolute path such as `/mfcmd/a.txt`.
    fn file_entry(&self, path: &str) -> Result<Option<RemoteFileEntry>>;

    /// Create `folder`; its parent must already exist.
    fn create_folder(&self, folder: &Destination) -> Result<()>;

    /// Upload `local_path` into `folder`, keeping its base name. `hash` is the
    /// SHA-256 of the local file as lower-case hex.
    fn upload(&self, local_path: &Path, folder: &Destination, hash: &str) -> Result<()>;
}
