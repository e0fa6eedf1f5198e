//! veilmatch: encrypted biometric matching with verified retrieval
//!
//! A server matches an encrypted sample against an encrypted template
//! without ever decrypting either. One compare homomorphically computes
//! the squared distance, pushes it through a polynomial sign
//! approximation into a 0/1 score, then hides that score in one secretly
//! chosen slot of a decoy-filled vector. The client decrypts the vector
//! and proves it read the true slot by claiming its index; the server
//! grants entry only on a matching claim.
//!
//! Key components:
//! - RNS-CKKS style leveled scheme over a negacyclic ring (fixed-point
//!   slots, rescaling, relinearization, slot rotation)
//! - The compare pipeline: distance, sign refinement, masking
//! - A storage-backed service with single-use verification records

pub mod ckks;
pub mod math;
pub mod params;
pub mod protocol;
pub mod service;
pub mod store;

pub use ckks::{
    decrypt, encrypt, generate_keys, generate_keys_seeded, Ciphertext, CkksContext, Plaintext,
    PublicContext, RotationPlan, SchemeError, SecretKey,
};
pub use params::{ProtocolParams, SchemeParams};
pub use protocol::{
    claim_index, client_keygen, decrypt_scores, encrypt_vector, judge, run_compare, Decision,
    EncryptedVector, IndexRecord, ProtocolError, CLAIM_CUTOFF,
};
pub use service::MatchService;
pub use store::{BlobKind, FsStore, MemoryStore, UserStore};
