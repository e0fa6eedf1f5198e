//! Failures the matching protocol reports.

use thiserror::Error;

use crate::ckks::SchemeError;

/// Errors from the matching pipeline, verification, and storage.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The underlying scheme rejected an operation
    #[error(transparent)]
    Scheme(#[from] SchemeError),

    /// The user has not uploaded an encryption context
    #[error("no encryption context registered for user")]
    MissingKey,

    /// The user has no enrolled template
    #[error("no enrolled template for user")]
    MissingTemplate,

    /// No compare result has been committed for the user
    #[error("no compare result available for user")]
    MissingResult,

    /// The verification record was never written or was already consumed
    #[error("no pending index record for user")]
    IndexRecordMissing,

    /// Every decoy resampling attempt produced an out-of-bound draw
    #[error("decoy sampling exhausted {retries} attempts")]
    NoiseSamplingExhausted { retries: usize },

    /// The claimed index matched neither the record nor the reject sentinel
    #[error("claimed index is neither the stored record nor the reject sentinel")]
    UntrustedClaim,

    /// An uploaded blob did not deserialize into a usable ciphertext
    #[error("invalid ciphertext blob: {0}")]
    InvalidCiphertext(String),

    /// An uploaded context bundle cannot drive the pipeline
    #[error("invalid context upload: {0}")]
    InvalidContext(String),

    /// A vector's logical dimension disagrees with the protocol's
    #[error("vector dimension {got} does not match protocol dimension {want}")]
    DimensionMismatch { got: usize, want: usize },

    /// A user identifier unsafe to use as a storage key
    #[error("invalid user id: {0:?}")]
    InvalidUserId(String),

    /// Storage-layer failure
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    /// Opaque blob (de)serialization failure
    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Index record (de)serialization failure
    #[error("record encoding error: {0}")]
    Json(#[from] serde_json::Error),
}
