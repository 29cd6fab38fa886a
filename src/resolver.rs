// Upload resolution.
//
// Decides where the file goes, short-circuits when identical content is
// already stored, uploads at most once and resolves the download link. Each
// state has its own transition function; folder failures fall back to the
// account root and are collected in [`Resolution::fallbacks`].

use tracing::{debug, info, warn};

use crate::error::{MfError, Result};
use crate::model::{Destination, RemoteFileEntry, UploadRequest};
use crate::store::RemoteStore;

/// Rewrite an `http://www.` link to `https://www.`; anything else is returned
/// unchanged.
pub fn normalize_link(link: &str) -> String {
    match link.strip_prefix("http://www.") {
        Some(rest) => format!("https://www.{}", rest),
        None => link.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    ResolveFolder,
    CheckExistingFile(Destination),
    Disambiguate(Destination),
    Upload(Destination),
    ResolveLink(Destination),
}

enum Step {
    Next(State),
    Done(Outcome),
}

/// How a successful run ended.
#[derive(Debug)]
pub enum Outcome {
    /// Identical content was already stored; nothing was uploaded. The link
    /// may still be unavailable.
    AlreadyPresent {
        destination: Destination,
        link: Result<String>,
    },
    /// The file was uploaded into `destination`.
    Uploaded {
        destination: Destination,
        link: String,
    },
}

impl Outcome {
    pub fn destination(&self) -> &Destination {
        match self {
            Outcome::AlreadyPresent { destination, .. } | Outcome::Uploaded { destination, .. } => {
                destination
            }
        }
    }
}

#[derive(Debug)]
pub struct Resolution {
    pub outcome: Outcome,
    /// Folder failures that were absorbed by falling back to the root.
    pub fallbacks: Vec<MfError>,
}

pub struct Resolver<'a, S: RemoteStore + ?Sized> {
    store: &'a S,
    request: &'a UploadRequest,
    /// Name for a disambiguating subfolder, fixed for the whole run.
    timestamp: i64,
    fallbacks: Vec<MfError>,
}

impl<'a, S: RemoteStore + ?Sized> Resolver<'a, S> {
    pub fn with_timestamp(store: &'a S, request: &'a UploadRequest, timestamp: i64) -> Self {
        Resolver {
            store,
            request,
            timestamp,
            fallbacks: Vec::new(),
        }
    }

    pub fn run(mut self) -> Result<Resolution> {
        let mut state = State::ResolveFolder;
        loop {
            debug!(?state, "resolver step");
            let step = match state {
                State::ResolveFolder => self.resolve_folder(),
                State::CheckExistingFile(dest) => self.check_existing_file(dest),
                State::Disambiguate(dest) => self.disambiguate(dest),
                State::Upload(dest) => self.upload(dest)?,
                State::ResolveLink(dest) => self.resolve_link(dest)?,
            };
            match step {
                Step::Next(next) => state = next,
                Step::Done(outcome) => {
                    return Ok(Resolution {
                        outcome,
                        fallbacks: self.fallbacks,
                    })
                }
            }
        }
    }

    fn resolve_folder(&mut self) -> Step {
        let folder = Destination::new(&self.request.folder);
        if folder.is_root() {
            return Step::Next(State::CheckExistingFile(folder));
        }

        match self.store.folder_exists(&folder) {
            Ok(true) => {
                info!(folder = %folder, "detected upload folder");
                return Step::Next(State::CheckExistingFile(folder));
            }
            Ok(false) => info!(folder = %folder, "upload folder does not exist"),
            Err(e) => warn!(folder = %folder, error = %e, "upload folder lookup failed"),
        }

        match self.store.create_folder(&folder) {
            Ok(()) => {
                info!(folder = %folder, "created upload folder");
                Step::Next(State::CheckExistingFile(folder))
            }
            Err(e) => {
                let root = self.fall_back(&folder, e);
                Step::Next(State::CheckExistingFile(root))
            }
        }
    }

    fn check_existing_file(&mut self, dest: Destination) -> Step {
        let path = dest.file_path(&self.request.file_name);
        let entry = match self.store.file_entry(&path) {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                info!(path = %path, "file does not exist in upload folder");
                return Step::Next(State::Upload(dest));
            }
            Err(e) => {
                warn!(path = %path, error = %e, "existing file lookup failed, uploading anyway");
                return Step::Next(State::Upload(dest));
            }
        };

        if entry.hash.eq_ignore_ascii_case(&self.request.hash) {
            info!(path = %path, "same file already exists: no upload necessary");
            let link = link_of(&entry);
            return Step::Done(Outcome::AlreadyPresent {
                destination: dest,
                link,
            });
        }

        warn!(path = %path, "filename already exists with different content");
        Step::Next(State::Disambiguate(dest))
    }

    fn disambiguate(&mut self, dest: Destination) -> Step {
        let candidate = dest.child(&self.timestamp.to_string());
        info!(folder = %candidate, "creating subfolder");
        match self.store.create_folder(&candidate) {
            Ok(()) => Step::Next(State::Upload(candidate)),
            Err(e) => Step::Next(State::Upload(self.fall_back(&candidate, e))),
        }
    }

    fn upload(&mut self, dest: Destination) -> Result<Step> {
        info!(file = %self.request.local_path.display(), folder = %dest, "uploading");
        self.store
            .upload(&self.request.local_path, &dest, &self.request.hash)
            .map_err(|e| match e {
                MfError::Upload(_) => e,
                other => MfError::Upload(other.to_string()),
            })?;
        Ok(Step::Next(State::ResolveLink(dest)))
    }

    fn resolve_link(&mut self, dest: Destination) -> Result<Step> {
        let path = dest.file_path(&self.request.file_name);
        let link = match self.store.file_entry(&path) {
            Ok(Some(entry)) => link_of(&entry),
            Ok(None) => Err(MfError::Link(format!("{} not found after upload", path))),
            Err(MfError::Link(reason)) => Err(MfError::Link(reason)),
            Err(e) => Err(MfError::Link(e.to_string())),
        }
        .map_err(|e| MfError::UploadUnconfirmed(Box::new(e)))?;

        Ok(Step::Done(Outcome::Uploaded {
            destination: dest,
            link,
        }))
    }

    fn fall_back(&mut self, folder: &Destination, cause: MfError) -> Destination {
        let err = MfError::folder(folder.to_string(), cause.to_string());
        warn!(error = %err, "could not create folder: defaulting to root");
        self.fallbacks.push(err);
        Destination::root()
    }
}

fn link_of(entry: &RemoteFileEntry) -> Result<String> {
    entry
        .download_link
        .as_deref()
        .map(normalize_link)
        .ok_or_else(|| MfError::Link("no download link in file info".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_link_upgrades_www() {
        assert_eq!(
            normalize_link("http://www.example.com/x"),
            "https://www.example.com/x"
        );
    }

    #[test]
    fn test_normalize_link_passthrough() {
        for link in [
            "https://www.example.com/x",
            "http://example.com/x",
            "ftp://www.example.com/x",
            "",
        ] {
            assert_eq!(normalize_link(link), link);
        }
    }

    #[test]
    fn test_normalize_link_only_touches_prefix() {
        assert_eq!(
            normalize_link("http://www.a.com/?next=http://www.b.com"),
            "https://www.a.com/?next=http://www.b.com"
        );
    }

    #[test]
    fn test_link_of_missing_link() {
        let entry = RemoteFileEntry {
            hash: "00".into(),
            download_link: None,
        };
        assert!(matches!(link_of(&entry), Err(MfError::Link(_))));
    }
}
