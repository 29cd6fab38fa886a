#![allow(dead_code)] // Not every test file uses every helper.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use mfcmd::error::{MfError, Result};
use mfcmd::model::{AccountInfo, Destination, RemoteFileEntry, UploadRequest};
use mfcmd::store::RemoteStore;

pub const FILE_NAME: &str = "report.pdf";
pub const LOCAL_HASH: &str = "1111111111111111111111111111111111111111111111111111111111111111";
pub const OTHER_HASH: &str = "2222222222222222222222222222222222222222222222222222222222222222";
pub const TIMESTAMP: i64 = 1_700_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    AccountInfo,
    FolderExists(String),
    FileEntry(String),
    CreateFolder(String),
    Upload {
        file: PathBuf,
        folder: String,
        hash: String,
    },
}

/// In-memory store that records every call made against it.
pub struct FakeStore {
    pub account: Option<AccountInfo>,
    pub folders: RefCell<HashSet<String>>,
    pub files: RefCell<HashMap<String, RemoteFileEntry>>,
    pub failing_creates: HashSet<String>,
    pub failing_folder_lookups: bool,
    pub fail_upload: bool,
    /// File lookups made after an upload fail at the transport level.
    pub fail_lookups_after_upload: bool,
    /// Uploaded files get a download link.
    pub link_on_upload: bool,
    /// Hash the service reports for whatever gets uploaded.
    pub uploaded_hash: String,
    pub calls: RefCell<Vec<Call>>,
    uploads: Cell<u32>,
}

impl FakeStore {
    pub fn new() -> Self {
        FakeStore {
            account: Some(AccountInfo {
                display_name: "Test Account".into(),
                storage_limit: 10_000,
                used_storage: 1_000,
            }),
            folders: RefCell::new(HashSet::new()),
            files: RefCell::new(HashMap::new()),
            failing_creates: HashSet::new(),
            failing_folder_lookups: false,
            fail_upload: false,
            fail_lookups_after_upload: false,
            link_on_upload: true,
            uploaded_hash: LOCAL_HASH.into(),
            calls: RefCell::new(Vec::new()),
            uploads: Cell::new(0),
        }
    }

    pub fn with_folder(self, path: &str) -> Self {
        self.folders.borrow_mut().insert(path.to_string());
        self
    }

    pub fn with_file(self, path: &str, hash: &str, link: Option<&str>) -> Self {
        self.files.borrow_mut().insert(
            path.to_string(),
            RemoteFileEntry {
                hash: hash.to_string(),
                download_link: link.map(str::to_string),
            },
        );
        self
    }

    pub fn failing_create(mut self, path: &str) -> Self {
        self.failing_creates.insert(path.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn upload_count(&self) -> u32 {
        self.uploads.get()
    }

    pub fn creates(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::CreateFolder(path) => Some(path),
                _ => None,
            })
            .collect()
    }

    pub fn upload_folders(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Upload { folder, .. } => Some(folder),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl RemoteStore for FakeStore {
    fn account_info(&self) -> Result<AccountInfo> {
        self.record(Call::AccountInfo);
        self.account
            .clone()
            .ok_or_else(|| MfError::ServiceInfo("malformed user_info".into()))
    }

    fn folder_exists(&self, folder: &Destination) -> Result<bool> {
        let path = folder.absolute();
        self.record(Call::FolderExists(path.clone()));
        if self.failing_folder_lookups {
            return Err(MfError::folder(path, "connection reset"));
        }
        Ok(self.folders.borrow().contains(&path))
    }

    fn file_entry(&self, path: &str) -> Result<Option<RemoteFileEntry>> {
        self.record(Call::FileEntry(path.to_string()));
        if self.fail_lookups_after_upload && self.uploads.get() > 0 {
            return Err(MfError::Link("connection reset".into()));
        }
        Ok(self.files.borrow().get(path).cloned())
    }

    fn create_folder(&self, folder: &Destination) -> Result<()> {
        let path = folder.absolute();
        self.record(Call::CreateFolder(path.clone()));
        if self.failing_creates.contains(&path) {
            return Err(MfError::folder(path, "access denied"));
        }
        self.folders.borrow_mut().insert(path);
        Ok(())
    }

    fn upload(&self, local_path: &Path, folder: &Destination, hash: &str) -> Result<()> {
        self.record(Call::Upload {
            file: local_path.to_path_buf(),
            folder: folder.absolute(),
            hash: hash.to_string(),
        });
        if self.fail_upload {
            return Err(MfError::Upload("connection reset".into()));
        }
        self.uploads.set(self.uploads.get() + 1);

        let name = local_path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let link = self.link_on_upload.then(|| {
            format!(
                "http://www.mediafire.com/file/q{}/{}/file",
                self.uploads.get(),
                name
            )
        });
        self.files.borrow_mut().insert(
            folder.file_path(name),
            RemoteFileEntry {
                hash: self.uploaded_hash.clone(),
                download_link: link,
            },
        );
        Ok(())
    }
}

pub fn request(folder: &str) -> UploadRequest {
    request_with_hash(folder, LOCAL_HASH)
}

pub fn request_with_hash(folder: &str, hash: &str) -> UploadRequest {
    UploadRequest {
        local_path: PathBuf::from("/data/outgoing").join(FILE_NAME),
        file_name: FILE_NAME.into(),
        hash: hash.into(),
        folder: folder.into(),
        size: 500,
    }
}
