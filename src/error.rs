// Error taxonomy for the uploader.
//
// Every failure the workflow can surface maps to exactly one category token,
// which is what the binary prints as `Error:<category>`.

use thiserror::Error;

/// Main error type for mfcmd operations.
#[derive(Error, Debug)]
pub enum MfError {
    /// Missing or invalid command-line input.
    #[error("invalid input ({category}): {message}")]
    InputValidation {
        category: InputCategory,
        message: String,
    },

    /// Login rejected or service unreachable during login.
    #[error("login failed: {0}")]
    Auth(String),

    /// Account info could not be fetched or parsed.
    #[error("account info unavailable: {0}")]
    ServiceInfo(String),

    /// Not enough free space for the local file.
    #[error("insufficient space: {free} bytes free, {required} bytes required")]
    Capacity { free: u64, required: u64 },

    /// Folder lookup or creation failed. Usually absorbed into a fallback.
    #[error("folder {path:?}: {message}")]
    FolderResolution { path: String, message: String },

    /// The transfer itself failed.
    #[error("upload failed: {0}")]
    Upload(String),

    /// The transfer went through but the resulting link could not be resolved.
    #[error("upload not confirmed: {0}")]
    UploadUnconfirmed(Box<MfError>),

    /// Link lookup or extraction failed.
    #[error("link unavailable: {0}")]
    Link(String),
}

/// Sub-categories of [`MfError::InputValidation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCategory {
    /// Arguments could not be parsed at all.
    Arguments,
    /// Email or password missing.
    Credentials,
    /// No file path given.
    FilePath,
    /// Path exists but is not a regular file.
    NoRegularFile,
    /// Path does not exist or cannot be read.
    NoFile,
    /// Supplied hash is not a hex SHA-256 digest.
    Hash,
}

impl InputCategory {
    /// Category token printed after `Error:`.
    pub fn token(&self) -> &'static str {
        match self {
            InputCategory::Arguments => "arguments",
            InputCategory::Credentials => "credentials",
            InputCategory::FilePath => "filepath",
            InputCategory::NoRegularFile => "noregularfile",
            InputCategory::NoFile => "nofile",
            InputCategory::Hash => "hash",
        }
    }
}

impl std::fmt::Display for InputCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

impl MfError {
    pub fn input(category: InputCategory, message: impl Into<String>) -> Self {
        MfError::InputValidation {
            category,
            message: message.into(),
        }
    }

    pub fn folder(path: impl Into<String>, message: impl Into<String>) -> Self {
        MfError::FolderResolution {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Category token printed after `Error:`.
    pub fn category(&self) -> &'static str {
        match self {
            MfError::InputValidation { category, .. } => category.token(),
            MfError::Auth(_) => "login",
            MfError::ServiceInfo(_) => "accountinfo",
            MfError::Capacity { .. } => "space",
            MfError::FolderResolution { .. } => "folder",
            MfError::Upload(_) | MfError::UploadUnconfirmed(_) => "upload",
            MfError::Link(_) => "link",
        }
    }
}

/// Result type alias for mfcmd operations.
pub type Result<T> = std::result::Result<T, MfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_tokens() {
        assert_eq!(
            MfError::input(InputCategory::Credentials, "missing email").category(),
            "credentials"
        );
        assert_eq!(
            MfError::input(InputCategory::NoRegularFile, "is a directory").category(),
            "noregularfile"
        );
        assert_eq!(MfError::Auth("bad password".into()).category(), "login");
        assert_eq!(MfError::ServiceInfo("timeout".into()).category(), "accountinfo");
        assert_eq!(
            MfError::Capacity {
                free: 1,
                required: 2
            }
            .category(),
            "space"
        );
        assert_eq!(MfError::folder("/mfcmd", "denied").category(), "folder");
        assert_eq!(MfError::Link("no links".into()).category(), "link");
    }

    #[test]
    fn test_unconfirmed_upload_reports_as_upload() {
        let err = MfError::UploadUnconfirmed(Box::new(MfError::Link("missing".into())));
        assert_eq!(err.category(), "upload");
        assert_eq!(
            err.to_string(),
            "upload not confirmed: link unavailable: missing"
        );
    }
}
