//! Parameter sets for the encryption scheme and the matching protocol.
//!
//! `SchemeParams` pins down the leveled scheme: ring dimension, RNS modulus
//! chain, encoding scale, error width, and the gadget base used by
//! key-switching. `ProtocolParams` pins down the matching pipeline's numeric
//! contract: vector dimension, decision threshold, normalization factor, and
//! the decoy-noise distribution.

use serde::{Deserialize, Serialize};

use crate::math::mod_q::DEFAULT_Q;

/// Modulus chain for the default matching parameter set.
///
/// The anchor prime `DEFAULT_Q` = 2^60 - 2^14 + 1 comes first and is never
/// dropped; decryption reads its limb. The remaining thirteen primes sit
/// within 3e-8 of 2^40, alternating above and below so the scale drift
/// cancels, and are dropped one per rescale, last first. Every prime
/// satisfies q ≡ 1 (mod 512), keeping the NTT available for ring dimensions
/// up to 256.
pub const MATCHING_CHAIN: [u64; 14] = [
    DEFAULT_Q,
    1099511630849,
    1099511603713,
    1099511638529,
    1099511592961,
    1099511643137,
    1099511590913,
    1099511646721,
    1099511577089,
    1099511649793,
    1099511572993,
    1099511659009,
    1099511560193,
    1099511661569,
];

/// Core parameters of the leveled homomorphic scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeParams {
    /// Ring dimension d (power of two); slot count is d/2
    pub ring_dim: usize,

    /// RNS modulus chain; index 0 is the anchor prime and is never dropped.
    /// Every prime must be NTT-friendly: q ≡ 1 (mod 2d)
    pub moduli: Vec<u64>,

    /// log2 of the encoding scale Δ
    pub scale_bits: u32,

    /// Standard deviation for Gaussian error sampling
    pub sigma: f64,

    /// Gadget decomposition base z for key-switching
    /// Typically a power of two (e.g., 2^20)
    pub gadget_base: u64,
}

impl SchemeParams {
    /// Parameter set sized for the 128-dimension matching pipeline.
    ///
    /// Ring dimension 256 gives 128 slots; the 14-prime chain covers the
    /// pipeline's multiplicative depth of 13. Research-scale parameters,
    /// sized for correctness rather than a production security level.
    pub fn matching_default() -> Self {
        Self {
            ring_dim: 256,
            moduli: MATCHING_CHAIN.to_vec(),
            scale_bits: 40,
            sigma: 3.2,
            gadget_base: 1 << 20,
        }
    }

    /// Number of plaintext slots (d/2)
    pub fn slot_count(&self) -> usize {
        self.ring_dim / 2
    }

    /// Number of rescale levels (chain length minus the anchor)
    pub fn levels(&self) -> usize {
        self.moduli.len() - 1
    }

    /// The encoding scale Δ = 2^scale_bits
    pub fn scale(&self) -> f64 {
        (1u64 << self.scale_bits) as f64
    }

    /// Active moduli at a given level: the first `len - level` chain primes
    pub fn active_moduli(&self, level: usize) -> &[u64] {
        &self.moduli[..self.moduli.len() - level]
    }

    /// Check if parameters are valid
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.ring_dim.is_power_of_two() {
            return Err("ring_dim must be a power of two");
        }
        if self.ring_dim < 4 {
            return Err("ring_dim must be at least 4");
        }
        if self.moduli.len() < 2 {
            return Err("modulus chain needs the anchor plus at least one rescale prime");
        }
        let two_d = 2 * self.ring_dim as u64;
        if self.moduli.iter().any(|&q| q % two_d != 1) {
            return Err("every chain prime must be ≡ 1 (mod 2d) for NTT");
        }
        // Rescale inverts each dropped prime under the remaining ones, which
        // requires the chain primes to be pairwise distinct.
        let mut sorted = self.moduli.clone();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() != self.moduli.len() {
            return Err("chain primes must be pairwise distinct");
        }
        if self.scale_bits == 0 || self.scale_bits >= 63 {
            return Err("scale_bits must be in 1..63");
        }
        // Rescale divides by the dropped prime and pretends it divided by Δ;
        // primes far from Δ would skew every subsequent scale.
        if self.moduli[1..]
            .iter()
            .any(|&q| (q as f64) < self.scale() / 2.0 || (q as f64) > self.scale() * 2.0)
        {
            return Err("rescale primes must lie within a factor of two of the scale");
        }
        if self.sigma <= 0.0 {
            return Err("sigma must be positive");
        }
        if self.gadget_base < 2 || !self.gadget_base.is_power_of_two() {
            return Err("gadget_base must be a power of two of at least 2");
        }
        Ok(())
    }

    /// Stable fingerprint of the parameter set.
    ///
    /// Ciphertexts and key material carry this value; mixing objects from
    /// different parameter sets is rejected as a context mismatch instead of
    /// producing garbage.
    pub fn context_id(&self) -> u64 {
        // FNV-1a over the defining fields
        let mut h: u64 = 0xcbf29ce484222325;
        let mut eat = |h: &mut u64, v: u64| {
            for b in v.to_le_bytes() {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x100000001b3);
            }
        };
        eat(&mut h, self.ring_dim as u64);
        eat(&mut h, self.scale_bits as u64);
        eat(&mut h, self.gadget_base);
        eat(&mut h, self.sigma.to_bits());
        for &q in &self.moduli {
            eat(&mut h, q);
        }
        h
    }
}

impl Default for SchemeParams {
    fn default() -> Self {
        Self::matching_default()
    }
}

/// Numeric contract of the matching protocol.
///
/// Every constant the pipeline consumes is named here rather than inlined:
/// the squared-distance decision threshold, the normalization factor that
/// maps shifted distances into the sign-refinement basin, and the decoy
/// noise distribution with its cap and retry budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolParams {
    /// Feature-vector dimension (also the score-vector length)
    pub dim: usize,

    /// Squared-distance decision threshold
    pub threshold: f64,

    /// Multiplier applied after the threshold shift: the reciprocal of the
    /// largest expected squared distance, so normalized values land in [-1, 1]
    pub scale_factor: f64,

    /// Gamma shape of the decoy-noise distribution
    pub gamma_shape: f64,

    /// Gamma rate of the decoy-noise distribution
    pub gamma_rate: f64,

    /// Upper bound on decoy values; any draw at or above this rejects the
    /// whole vector
    pub noise_cap: f64,

    /// Whole-vector resampling attempts before giving up
    pub noise_retries: usize,
}

impl ProtocolParams {
    /// The 128-dimension contract used by the biometric pipeline.
    pub fn default_128() -> Self {
        Self {
            dim: 128,
            threshold: 100.0,
            scale_factor: 1.0 / 300.0,
            gamma_shape: 0.61,
            gamma_rate: 10.0,
            noise_cap: 0.55,
            noise_retries: 100,
        }
    }

    /// Check if parameters are valid and compatible with a scheme
    pub fn validate(&self, scheme: &SchemeParams) -> Result<(), &'static str> {
        if self.dim == 0 || !self.dim.is_power_of_two() {
            return Err("dim must be a nonzero power of two");
        }
        if self.dim != scheme.slot_count() {
            return Err("dim must equal the scheme's slot count");
        }
        if self.scale_factor <= 0.0 {
            return Err("scale_factor must be positive");
        }
        if self.threshold < 0.0 {
            return Err("threshold must be non-negative");
        }
        if self.gamma_shape <= 0.0 || self.gamma_rate <= 0.0 {
            return Err("gamma parameters must be positive");
        }
        if self.noise_cap <= 0.0 {
            return Err("noise_cap must be positive");
        }
        if self.noise_retries == 0 {
            return Err("noise_retries must be at least 1");
        }
        Ok(())
    }

    /// Rotation steps of the slot-sum broadcast: powers of two below `dim`
    pub fn slot_sum_steps(&self) -> Vec<usize> {
        (0..self.dim.trailing_zeros()).map(|k| 1usize << k).collect()
    }
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self::default_128()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_default_valid() {
        let params = SchemeParams::matching_default();
        assert!(params.validate().is_ok());
        assert_eq!(params.slot_count(), 128);
        assert_eq!(params.levels(), 13);
        assert_eq!(params.scale(), (1u64 << 40) as f64);
    }

    #[test]
    fn test_chain_primes_ntt_friendly() {
        for &q in MATCHING_CHAIN.iter() {
            assert_eq!(q % 512, 1, "prime {} is not ≡ 1 mod 512", q);
        }
    }

    #[test]
    fn test_active_moduli_shrink_from_the_back() {
        let params = SchemeParams::matching_default();
        assert_eq!(params.active_moduli(0).len(), 14);
        assert_eq!(params.active_moduli(13), &[DEFAULT_Q]);
        assert_eq!(params.active_moduli(1).last(), Some(&MATCHING_CHAIN[12]));
    }

    #[test]
    fn test_validate_rejects_bad_ring_dim() {
        let mut params = SchemeParams::matching_default();
        params.ring_dim = 100;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_ntt_prime() {
        let mut params = SchemeParams::matching_default();
        params.moduli[3] = 1099511627776; // 2^40, not ≡ 1 mod 512
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_repeated_prime() {
        let mut params = SchemeParams::matching_default();
        params.moduli[4] = params.moduli[2];
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_context_id_tracks_fields() {
        let a = SchemeParams::matching_default();
        let b = a.clone();
        assert_eq!(a.context_id(), b.context_id());

        let mut c = a.clone();
        c.scale_bits = 41;
        assert_ne!(a.context_id(), c.context_id());

        let mut d = a.clone();
        d.moduli.pop();
        assert_ne!(a.context_id(), d.context_id());
    }

    #[test]
    fn test_protocol_default_valid() {
        let scheme = SchemeParams::matching_default();
        let protocol = ProtocolParams::default_128();
        assert!(protocol.validate(&scheme).is_ok());
    }

    #[test]
    fn test_protocol_dim_must_match_slots() {
        let scheme = SchemeParams::matching_default();
        let mut protocol = ProtocolParams::default_128();
        protocol.dim = 64;
        assert!(protocol.validate(&scheme).is_err());
    }

    #[test]
    fn test_slot_sum_steps() {
        let protocol = ProtocolParams::default_128();
        assert_eq!(protocol.slot_sum_steps(), vec![1, 2, 4, 8, 16, 32, 64]);
    }
}
