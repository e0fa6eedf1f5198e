//! Per-user blob storage behind the matching service.
//!
//! Every artifact the protocol touches is an opaque blob filed under a
//! user id and a [`BlobKind`]. The service talks only to the
//! [`UserStore`] trait, so tests run against the in-memory store while
//! deployments use the filesystem layout.

mod fs;
mod memory;

pub use fs::FsStore;
pub use memory::MemoryStore;

use crate::protocol::ProtocolError;

/// The kinds of blob stored per user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlobKind {
    /// Public evaluation context: public key, relinearization and
    /// rotation keys
    Context,
    /// Enrolled encrypted template
    Template,
    /// Most recently submitted encrypted sample
    Sample,
    /// Masked score vector from the latest completed compare
    Result,
    /// Secret slot index recorded for the latest compare
    IndexRecord,
}

impl BlobKind {
    /// Every kind, in storage-layout order
    pub const ALL: [BlobKind; 5] = [
        BlobKind::Context,
        BlobKind::Template,
        BlobKind::Sample,
        BlobKind::Result,
        BlobKind::IndexRecord,
    ];
}

/// Blob storage keyed by user and kind.
///
/// Implementations must be safe to share across threads; the service
/// serializes per-user access above this trait, so one call at a time
/// touches any given user's blobs.
pub trait UserStore: Send + Sync {
    /// Stores a blob, replacing any previous one of the same kind.
    fn put(&self, user: &str, kind: BlobKind, data: &[u8]) -> Result<(), ProtocolError>;

    /// Loads a blob, or `None` when the user has none of this kind.
    fn get(&self, user: &str, kind: BlobKind) -> Result<Option<Vec<u8>>, ProtocolError>;

    /// Removes a blob; returns whether one was present.
    fn delete(&self, user: &str, kind: BlobKind) -> Result<bool, ProtocolError>;

    /// Removes every blob stored for the user.
    fn delete_user(&self, user: &str) -> Result<(), ProtocolError>;

    /// Persists a compare's result and index record together.
    ///
    /// Called only after the pipeline has fully succeeded; nothing from
    /// a failed compare reaches the store.
    fn commit_outcome(
        &self,
        user: &str,
        result: &[u8],
        record: &[u8],
    ) -> Result<(), ProtocolError>;

    /// Loads and removes a blob in one step.
    ///
    /// The consume-once read verification records need.
    fn take(&self, user: &str, kind: BlobKind) -> Result<Option<Vec<u8>>, ProtocolError> {
        let data = self.get(user, kind)?;
        if data.is_some() {
            self.delete(user, kind)?;
        }
        Ok(data)
    }
}
