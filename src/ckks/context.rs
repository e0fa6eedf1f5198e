//! Evaluation context shared by every operation under one parameter set.
//!
//! Building a `CkksContext` precomputes everything the scheme reuses: one
//! NTT table per chain prime, the slot-encoding tables, the modular
//! inverses that make rescaling exact, and the gadget digit counts for
//! key-switching. Ciphertexts and keys carry the context fingerprint so
//! material from different parameter sets cannot be mixed silently.

use crate::ckks::encoding::{Plaintext, SlotEncoder};
use crate::ckks::error::SchemeError;
use crate::math::mod_q::ModQ;
use crate::math::ntt::NttContext;
use crate::params::SchemeParams;

/// Precomputed evaluation context.
///
/// # Fields
///
/// * `params` - The parameter set this context was built from
/// * `ntts` - One NTT table per chain prime, in chain order
/// * `encoder` - Slot encoding tables for the ring dimension
/// * `rescale_inv` - `rescale_inv[d][i]` = q_d^(-1) mod q_i for i < d
/// * `gadget_digits` - Base-z digits needed to cover each chain prime
/// * `context_id` - Parameter fingerprint stamped onto ciphertexts and keys
#[derive(Debug)]
pub struct CkksContext {
    pub(crate) params: SchemeParams,
    pub(crate) ntts: Vec<NttContext>,
    pub(crate) encoder: SlotEncoder,
    pub(crate) rescale_inv: Vec<Vec<u64>>,
    pub(crate) gadget_digits: Vec<usize>,
    pub(crate) context_id: u64,
}

impl CkksContext {
    /// Builds the context for a parameter set.
    ///
    /// # Arguments
    ///
    /// * `params` - Scheme parameters; validated before any table is built
    ///
    /// # Example
    ///
    /// ```
    /// use veilmatch::ckks::CkksContext;
    /// use veilmatch::params::SchemeParams;
    ///
    /// let ctx = CkksContext::new(SchemeParams::matching_default()).unwrap();
    /// assert_eq!(ctx.slot_count(), 128);
    /// ```
    pub fn new(params: SchemeParams) -> Result<Self, SchemeError> {
        params.validate().map_err(SchemeError::InvalidParams)?;

        let ntts: Vec<NttContext> = params
            .moduli
            .iter()
            .map(|&q| NttContext::new(params.ring_dim, q))
            .collect();
        let encoder = SlotEncoder::new(params.ring_dim);

        // rescale_inv[0] is unused; limb 0 is the anchor and never dropped
        let mut rescale_inv = vec![Vec::new()];
        for d in 1..params.moduli.len() {
            let q_d = params.moduli[d];
            let mut row = Vec::with_capacity(d);
            for i in 0..d {
                let inv = ModQ::new(q_d, params.moduli[i]).inv().ok_or(
                    SchemeError::InvalidParams("chain primes must be pairwise coprime"),
                )?;
                row.push(inv.value());
            }
            rescale_inv.push(row);
        }

        let base_bits = params.gadget_base.trailing_zeros();
        let gadget_digits = params
            .moduli
            .iter()
            .map(|&q| {
                let bits = 64 - (q - 1).leading_zeros();
                ((bits + base_bits - 1) / base_bits) as usize
            })
            .collect();

        let context_id = params.context_id();

        Ok(Self {
            params,
            ntts,
            encoder,
            rescale_inv,
            gadget_digits,
            context_id,
        })
    }

    /// The parameter set this context was built from
    pub fn params(&self) -> &SchemeParams {
        &self.params
    }

    /// Slot encoding tables
    pub fn encoder(&self) -> &SlotEncoder {
        &self.encoder
    }

    /// Parameter fingerprint carried by ciphertexts and keys
    pub fn context_id(&self) -> u64 {
        self.context_id
    }

    /// Number of plaintext slots
    pub fn slot_count(&self) -> usize {
        self.params.slot_count()
    }

    /// The encoding scale Δ
    pub fn scale(&self) -> f64 {
        self.params.scale()
    }

    /// Number of rescale levels
    pub fn levels(&self) -> usize {
        self.params.levels()
    }

    /// Number of active limbs at a level
    pub fn limb_count(&self, level: usize) -> usize {
        self.params.moduli.len() - level
    }

    /// NTT tables for the limbs active at a level
    pub fn active_ntts(&self, level: usize) -> &[NttContext] {
        &self.ntts[..self.limb_count(level)]
    }

    /// The prime a rescale at this level divides out.
    ///
    /// Levels consume the chain from the back, so level ℓ drops the prime
    /// at chain index len - 1 - ℓ.
    pub fn next_rescale_prime(&self, level: usize) -> Result<u64, SchemeError> {
        if self.limb_count(level) < 2 {
            return Err(SchemeError::LevelExhausted { level });
        }
        Ok(self.params.moduli[self.params.moduli.len() - 1 - level])
    }

    /// Rescale inverse table for dropping the last of `limbs` active limbs
    pub(crate) fn rescale_table(&self, limbs: usize) -> &[u64] {
        &self.rescale_inv[limbs - 1]
    }

    /// Rejects levels past the end of the chain
    pub(crate) fn check_level(&self, level: usize) -> Result<(), SchemeError> {
        if level > self.levels() {
            return Err(SchemeError::LevelExhausted { level });
        }
        Ok(())
    }

    /// Encodes a slot vector at the default scale Δ.
    ///
    /// # Arguments
    ///
    /// * `values` - Up to `slot_count()` real values; shorter vectors are
    ///   zero-padded
    /// * `level` - Chain level the encoding targets
    pub fn encode(&self, values: &[f64], level: usize) -> Result<Plaintext, SchemeError> {
        self.encode_with_scale(values, self.scale(), level)
    }

    /// Encodes a slot vector at an explicit scale.
    ///
    /// Plaintexts added to or multiplied into a ciphertext must sit at the
    /// ciphertext's exact scale, which drifts from Δ as rescales divide by
    /// chain primes rather than by Δ itself.
    pub fn encode_with_scale(
        &self,
        values: &[f64],
        scale: f64,
        level: usize,
    ) -> Result<Plaintext, SchemeError> {
        self.check_level(level)?;
        let poly = self
            .encoder
            .encode(values, scale, self.params.active_moduli(level));
        Ok(Plaintext { poly, scale, level })
    }

    /// Encodes one scalar into every slot at an explicit scale
    pub fn encode_scalar_with_scale(
        &self,
        value: f64,
        scale: f64,
        level: usize,
    ) -> Result<Plaintext, SchemeError> {
        self.check_level(level)?;
        let poly = self
            .encoder
            .encode_scalar(value, scale, self.params.active_moduli(level));
        Ok(Plaintext { poly, scale, level })
    }

    /// Decodes slot values from a plaintext's anchor limb
    pub fn decode(&self, pt: &Plaintext) -> Vec<f64> {
        self.encoder.decode(pt.poly.limb(0), pt.scale)
    }
}
