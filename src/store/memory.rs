//! In-memory store for tests and embedded use.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::protocol::ProtocolError;
use crate::store::{BlobKind, UserStore};

/// Mutexed map from (user, kind) to blob bytes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<(String, BlobKind), Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(String, BlobKind), Vec<u8>>> {
        // Every operation here is a single map mutation, so a poisoned
        // lock still guards a consistent map
        self.blobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl UserStore for MemoryStore {
    fn put(&self, user: &str, kind: BlobKind, data: &[u8]) -> Result<(), ProtocolError> {
        self.lock().insert((user.to_string(), kind), data.to_vec());
        Ok(())
    }

    fn get(&self, user: &str, kind: BlobKind) -> Result<Option<Vec<u8>>, ProtocolError> {
        Ok(self.lock().get(&(user.to_string(), kind)).cloned())
    }

    fn delete(&self, user: &str, kind: BlobKind) -> Result<bool, ProtocolError> {
        Ok(self.lock().remove(&(user.to_string(), kind)).is_some())
    }

    fn delete_user(&self, user: &str) -> Result<(), ProtocolError> {
        self.lock().retain(|(u, _), _| u != user);
        Ok(())
    }

    fn commit_outcome(
        &self,
        user: &str,
        result: &[u8],
        record: &[u8],
    ) -> Result<(), ProtocolError> {
        let mut blobs = self.lock();
        blobs.insert((user.to_string(), BlobKind::Result), result.to_vec());
        blobs.insert((user.to_string(), BlobKind::IndexRecord), record.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_delete_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("alice", BlobKind::Template).unwrap(), None);

        store.put("alice", BlobKind::Template, b"template").unwrap();
        store.put("alice", BlobKind::Template, b"replaced").unwrap();
        assert_eq!(
            store.get("alice", BlobKind::Template).unwrap().as_deref(),
            Some(b"replaced".as_ref())
        );

        assert!(store.delete("alice", BlobKind::Template).unwrap());
        assert!(!store.delete("alice", BlobKind::Template).unwrap());
        assert_eq!(store.get("alice", BlobKind::Template).unwrap(), None);
    }

    #[test]
    fn test_users_and_kinds_are_isolated() {
        let store = MemoryStore::new();
        store.put("alice", BlobKind::Template, b"a").unwrap();
        store.put("bob", BlobKind::Template, b"b").unwrap();
        store.put("alice", BlobKind::Sample, b"s").unwrap();

        assert_eq!(
            store.get("alice", BlobKind::Template).unwrap().as_deref(),
            Some(b"a".as_ref())
        );
        assert_eq!(
            store.get("bob", BlobKind::Template).unwrap().as_deref(),
            Some(b"b".as_ref())
        );
        assert_eq!(store.get("bob", BlobKind::Sample).unwrap(), None);
    }

    #[test]
    fn test_take_consumes_once() {
        let store = MemoryStore::new();
        store.put("alice", BlobKind::IndexRecord, b"{\"idx\":\"3\"}").unwrap();

        let first = store.take("alice", BlobKind::IndexRecord).unwrap();
        assert_eq!(first.as_deref(), Some(b"{\"idx\":\"3\"}".as_ref()));
        assert_eq!(store.take("alice", BlobKind::IndexRecord).unwrap(), None);
    }

    #[test]
    fn test_delete_user_clears_all_kinds() {
        let store = MemoryStore::new();
        for kind in BlobKind::ALL {
            store.put("alice", kind, b"x").unwrap();
        }
        store.put("bob", BlobKind::Context, b"keep").unwrap();

        store.delete_user("alice").unwrap();
        for kind in BlobKind::ALL {
            assert_eq!(store.get("alice", kind).unwrap(), None, "{:?}", kind);
        }
        assert!(store.get("bob", BlobKind::Context).unwrap().is_some());
    }

    #[test]
    fn test_commit_outcome_writes_both() {
        let store = MemoryStore::new();
        store.commit_outcome("alice", b"scores", b"{\"idx\":\"7\"}").unwrap();

        assert_eq!(
            store.get("alice", BlobKind::Result).unwrap().as_deref(),
            Some(b"scores".as_ref())
        );
        assert_eq!(
            store.get("alice", BlobKind::IndexRecord).unwrap().as_deref(),
            Some(b"{\"idx\":\"7\"}".as_ref())
        );
    }

    #[test]
    fn test_store_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MemoryStore>();
    }
}
