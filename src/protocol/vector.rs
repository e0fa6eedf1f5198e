//! Encrypted feature vectors as they cross the wire.
//!
//! Templates and samples travel as opaque bincode blobs. `EncryptedVector`
//! wraps the ciphertext with its logical dimension and checks, on arrival,
//! that the blob actually belongs to the context it will be evaluated
//! under: matching parameter fingerprint, matching dimension, level 0, and
//! the entry scale Δ.

use serde::{Deserialize, Serialize};

use crate::ckks::{Ciphertext, CkksContext, SchemeError};
use crate::params::ProtocolParams;
use crate::protocol::error::ProtocolError;

/// An encrypted feature vector with its logical dimension.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EncryptedVector {
    pub ct: Ciphertext,
    pub dim: usize,
}

impl EncryptedVector {
    pub fn new(ct: Ciphertext, dim: usize) -> Self {
        Self { ct, dim }
    }

    /// Serializes to an opaque blob.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserializes an uploaded blob.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.is_empty() {
            return Err(ProtocolError::InvalidCiphertext("empty blob".into()));
        }
        bincode::deserialize(bytes)
            .map_err(|e| ProtocolError::InvalidCiphertext(e.to_string()))
    }

    /// Checks the vector is evaluable under the given context.
    ///
    /// A linked vector has the context's parameter fingerprint, the
    /// protocol's dimension, and sits untouched at level 0 with scale Δ.
    pub fn link(
        &self,
        ctx: &CkksContext,
        protocol: &ProtocolParams,
    ) -> Result<(), ProtocolError> {
        if self.ct.context_id != ctx.context_id() {
            return Err(SchemeError::ContextMismatch {
                left: self.ct.context_id,
                right: ctx.context_id(),
            }
            .into());
        }
        if self.dim != protocol.dim {
            return Err(ProtocolError::DimensionMismatch {
                got: self.dim,
                want: protocol.dim,
            });
        }
        if self.ct.level != 0 {
            return Err(ProtocolError::InvalidCiphertext(format!(
                "expected a fresh level-0 vector, got level {}",
                self.ct.level
            )));
        }
        if self.ct.scale != ctx.scale() {
            return Err(ProtocolError::InvalidCiphertext(format!(
                "expected entry scale {}, got {}",
                ctx.scale(),
                self.ct.scale
            )));
        }
        Ok(())
    }
}
