// Data shared between the workflow stages.

use std::path::PathBuf;

/// Folder used when none is given on the command line.
pub const DEFAULT_UPLOAD_FOLDER: &str = "mfcmd";

/// Validated input for a single run. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub local_path: PathBuf,
    pub file_name: String,
    /// Lower-case hex SHA-256 of the local file.
    pub hash: String,
    /// Requested folder relative to the account root.
    pub folder: String,
    pub size: u64,
}

/// Storage figures reported for the logged-in account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub display_name: String,
    pub storage_limit: u64,
    pub used_storage: u64,
}

/// A file already present on the remote side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFileEntry {
    pub hash: String,
    pub download_link: Option<String>,
}

/// Remote folder path. The empty path is the account root.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Destination(String);

impl Destination {
    pub fn root() -> Self {
        Destination(String::new())
    }

    /// Build from user input, dropping leading, trailing and doubled slashes.
    pub fn new(path: &str) -> Self {
        let cleaned = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        Destination(cleaned)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Path relative to the root, without slashes at either end.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `self/name`, or just `name` at the root.
    pub fn child(&self, name: &str) -> Destination {
        if self.is_root() {
            Destination::new(name)
        } else {
            Destination::new(&format!("{}/{}", self.0, name))
        }
    }

    /// Absolute path of `file_name` inside this folder.
    pub fn file_path(&self, file_name: &str) -> String {
        if self.is_root() {
            format!("/{}", file_name)
        } else {
            format!("/{}/{}", self.0, file_name)
        }
    }

    /// Absolute folder path as the service expects it.
    pub fn absolute(&self) -> String {
        format!("/{}", self.0)
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_root() {
            f.write_str("/")
        } else {
            write!(f, "/{}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_normalizes_slashes() {
        assert_eq!(Destination::new("/mfcmd/").as_str(), "mfcmd");
        assert_eq!(Destination::new("a//b").as_str(), "a/b");
        assert!(Destination::new("/").is_root());
        assert!(Destination::new("").is_root());
    }

    #[test]
    fn test_child_of_root_and_folder() {
        assert_eq!(Destination::root().child("1700000000").as_str(), "1700000000");
        assert_eq!(
            Destination::new("mfcmd").child("1700000000").as_str(),
            "mfcmd/1700000000"
        );
    }

    #[test]
    fn test_file_paths() {
        assert_eq!(Destination::root().file_path("a.txt"), "/a.txt");
        assert_eq!(Destination::new("mfcmd").file_path("a.txt"), "/mfcmd/a.txt");
        assert_eq!(Destination::root().to_string(), "/");
        assert_eq!(Destination::new("x/y").absolute(), "/x/y");
    }
}
