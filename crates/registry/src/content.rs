#![forbid(unsafe_code)]

//! Narrow seam to the bulk-file collaborator. The core never moves bytes
//! between machines; it hands a local path to `store` and gets back an
//! opaque locator, and asks `materialize` to turn a locator into a
//! readable local path again.

use crate::fingerprint::sha256_file_hex;
use std::io::{Error, ErrorKind};
use std::path::{Path, PathBuf};

pub trait ContentBackend {
    /// Persist the file and return its locator.
    fn store(&self, local_path: &Path) -> Result<String, Error>;

    /// Resolve a locator to a local path, fetching if the backend is
    /// remote. Fails when the object is unknown.
    fn materialize(&self, locator: &str) -> Result<PathBuf, Error>;
}

/// Content-addressed cache on the local filesystem: objects live under
/// `<root>/objects/<aa>/<digest>` and the locator is the digest itself.
#[derive(Clone, Debug)]
pub struct LocalContentBackend {
    root: PathBuf,
}

impl LocalContentBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, digest: &str) -> PathBuf {
        self.root.join("objects").join(&digest[..2]).join(digest)
    }
}

impl ContentBackend for LocalContentBackend {
    fn store(&self, local_path: &Path) -> Result<String, Error> {
        let digest = sha256_file_hex(local_path)?;
        let dest = self.object_path(&digest);
        if !dest.exists() {
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(local_path, &dest)?;
        }
        Ok(digest)
    }

    fn materialize(&self, locator: &str) -> Result<PathBuf, Error> {
        if locator.len() != 64 || !locator.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("locator {locator:?} is not a content digest"),
            ));
        }
        let path = self.object_path(locator);
        if !path.is_file() {
            return Err(Error::new(
                ErrorKind::NotFound,
                format!("object {locator} is not in the local cache"),
            ));
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "avc_content_{label}_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn store_then_materialize_round_trips() {
        let root = temp_root("round_trip");
        let source = root.join("input.csv");
        std::fs::write(&source, b"id,label\n1,pos\n").expect("write source");

        let backend = LocalContentBackend::new(&root);
        let locator = backend.store(&source).expect("store");
        let path = backend.materialize(&locator).expect("materialize");
        let bytes = std::fs::read(path).expect("read object");
        assert_eq!(bytes, b"id,label\n1,pos\n");

        // Same content stores to the same object.
        let second = backend.store(&source).expect("store again");
        assert_eq!(locator, second);
    }

    #[test]
    fn unknown_locator_is_not_found() {
        let root = temp_root("unknown");
        let backend = LocalContentBackend::new(&root);

        let err = backend.materialize(&"0".repeat(64)).expect_err("missing object");
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = backend.materialize("nonsense").expect_err("bad locator");
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
