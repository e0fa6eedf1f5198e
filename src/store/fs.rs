//! Filesystem store.
//!
//! Blobs live under a root directory in a fixed layout:
//!
//! ```text
//! uploads/key/<user>.bin          encryption context
//! uploads/registered/<user>.bin   enrolled template
//! uploads/new/<user>.bin          latest sample
//! processed/dist/<user>.bin       latest compare result
//! processed/index/<user>.json     pending index record
//! ```
//!
//! Writes go through a temp file in the same directory followed by a
//! rename, so readers never observe a half-written blob.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::protocol::ProtocolError;
use crate::store::{BlobKind, UserStore};

fn kind_dir(kind: BlobKind) -> &'static str {
    match kind {
        BlobKind::Context => "uploads/key",
        BlobKind::Template => "uploads/registered",
        BlobKind::Sample => "uploads/new",
        BlobKind::Result => "processed/dist",
        BlobKind::IndexRecord => "processed/index",
    }
}

fn kind_ext(kind: BlobKind) -> &'static str {
    match kind {
        BlobKind::IndexRecord => "json",
        _ => "bin",
    }
}

/// User ids become file names, so anything that could escape the store
/// root is rejected
fn check_user(user: &str) -> Result<(), ProtocolError> {
    let safe = !user.is_empty()
        && user != "."
        && user != ".."
        && user
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if safe {
        Ok(())
    } else {
        Err(ProtocolError::InvalidUserId(user.to_string()))
    }
}

/// Store rooted at a directory on disk.
#[derive(Debug)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Opens the store, creating the directory layout if needed.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, ProtocolError> {
        let root = root.as_ref().to_path_buf();
        for kind in BlobKind::ALL {
            fs::create_dir_all(root.join(kind_dir(kind)))?;
        }
        Ok(Self { root })
    }

    /// The store's root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, user: &str, kind: BlobKind) -> Result<PathBuf, ProtocolError> {
        check_user(user)?;
        Ok(self
            .root
            .join(kind_dir(kind))
            .join(format!("{}.{}", user, kind_ext(kind))))
    }

    fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, path)
    }
}

impl UserStore for FsStore {
    fn put(&self, user: &str, kind: BlobKind, data: &[u8]) -> Result<(), ProtocolError> {
        let path = self.blob_path(user, kind)?;
        Self::write_atomic(&path, data)?;
        Ok(())
    }

    fn get(&self, user: &str, kind: BlobKind) -> Result<Option<Vec<u8>>, ProtocolError> {
        let path = self.blob_path(user, kind)?;
        match fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, user: &str, kind: BlobKind) -> Result<bool, ProtocolError> {
        let path = self.blob_path(user, kind)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn delete_user(&self, user: &str) -> Result<(), ProtocolError> {
        for kind in BlobKind::ALL {
            self.delete(user, kind)?;
        }
        Ok(())
    }

    fn commit_outcome(
        &self,
        user: &str,
        result: &[u8],
        record: &[u8],
    ) -> Result<(), ProtocolError> {
        // Result first: a crash between the writes leaves a result with
        // no record, which verification treats as already consumed
        self.put(user, BlobKind::Result, result)?;
        self.put(user, BlobKind::IndexRecord, record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store() -> (TempDir, FsStore) {
        let dir = TempDir::new().unwrap();
        let store = FsStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_open_creates_layout() {
        let (dir, _store) = open_store();
        for sub in [
            "uploads/key",
            "uploads/registered",
            "uploads/new",
            "processed/dist",
            "processed/index",
        ] {
            assert!(dir.path().join(sub).is_dir(), "{}", sub);
        }
    }

    #[test]
    fn test_blobs_land_in_kind_directories() {
        let (dir, store) = open_store();
        store.put("alice", BlobKind::Context, b"ctx").unwrap();
        store.put("alice", BlobKind::Template, b"tpl").unwrap();
        store.put("alice", BlobKind::IndexRecord, b"{\"idx\":\"0\"}").unwrap();

        assert!(dir.path().join("uploads/key/alice.bin").is_file());
        assert!(dir.path().join("uploads/registered/alice.bin").is_file());
        assert!(dir.path().join("processed/index/alice.json").is_file());
    }

    #[test]
    fn test_put_get_delete_roundtrip() {
        let (_dir, store) = open_store();
        assert_eq!(store.get("alice", BlobKind::Sample).unwrap(), None);

        store.put("alice", BlobKind::Sample, b"first").unwrap();
        store.put("alice", BlobKind::Sample, b"second").unwrap();
        assert_eq!(
            store.get("alice", BlobKind::Sample).unwrap().as_deref(),
            Some(b"second".as_ref())
        );

        assert!(store.delete("alice", BlobKind::Sample).unwrap());
        assert!(!store.delete("alice", BlobKind::Sample).unwrap());
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let (dir, store) = open_store();
        store.put("alice", BlobKind::Result, b"scores").unwrap();
        assert!(!dir.path().join("processed/dist/alice.tmp").exists());
        assert!(dir.path().join("processed/dist/alice.bin").is_file());
    }

    #[test]
    fn test_take_consumes_record() {
        let (_dir, store) = open_store();
        store.put("alice", BlobKind::IndexRecord, b"{\"idx\":\"9\"}").unwrap();

        let first = store.take("alice", BlobKind::IndexRecord).unwrap();
        assert_eq!(first.as_deref(), Some(b"{\"idx\":\"9\"}".as_ref()));
        assert_eq!(store.take("alice", BlobKind::IndexRecord).unwrap(), None);
    }

    #[test]
    fn test_delete_user_clears_all_kinds() {
        let (_dir, store) = open_store();
        for kind in BlobKind::ALL {
            store.put("alice", kind, b"x").unwrap();
        }
        store.put("bob", BlobKind::Template, b"keep").unwrap();

        store.delete_user("alice").unwrap();
        for kind in BlobKind::ALL {
            assert_eq!(store.get("alice", kind).unwrap(), None, "{:?}", kind);
        }
        assert!(store.get("bob", BlobKind::Template).unwrap().is_some());
    }

    #[test]
    fn test_commit_outcome_writes_both() {
        let (_dir, store) = open_store();
        store.commit_outcome("alice", b"scores", b"{\"idx\":\"7\"}").unwrap();
        assert!(store.get("alice", BlobKind::Result).unwrap().is_some());
        assert!(store.get("alice", BlobKind::IndexRecord).unwrap().is_some());
    }

    #[test]
    fn test_rejects_path_escaping_user_ids() {
        let (_dir, store) = open_store();
        for bad in ["", ".", "..", "../alice", "a/b", "a\\b", "a b"] {
            assert!(
                matches!(
                    store.put(bad, BlobKind::Template, b"x"),
                    Err(ProtocolError::InvalidUserId(_))
                ),
                "{:?} accepted",
                bad
            );
        }
    }
}
