//! The encrypted matching protocol.
//!
//! One compare runs entirely on the server over a template and sample
//! the client encrypted: squared distance under rotation, normalization
//! into the sign window, three refinement steps of f(x) = 1.5x - 0.5x³,
//! the wrap to a 0/1 indicator, and finally masking into one secretly
//! drawn slot padded with Gamma decoys. The server learns the match bit
//! only when the client proves it read the right slot, by claiming the
//! index the server recorded.
//!
//! Components:
//!
//! * [`client`] - Key generation, vector encryption, score decryption,
//!   and the index claim
//! * [`vector`] - The uploaded ciphertext envelope and its checks
//! * [`distance`] - Squared Euclidean distance, broadcast to all slots
//! * [`indicator`] - Normalization and the sign-refinement ladder
//! * [`masking`] - Secret slot draw, one-hot mask, decoy field
//! * [`pipeline`] - The stages chained end to end
//! * [`verify`] - Index records and the claim judgment

pub mod client;
pub mod distance;
pub mod error;
pub mod indicator;
pub mod masking;
pub mod pipeline;
pub mod vector;
pub mod verify;

pub use client::{claim_index, client_keygen, decrypt_scores, encrypt_vector, CLAIM_CUTOFF};
pub use error::ProtocolError;
pub use pipeline::{compare_plan, run_compare, CompareOutcome};
pub use vector::EncryptedVector;
pub use verify::{judge, Decision, IndexRecord, REJECT_SENTINEL};
