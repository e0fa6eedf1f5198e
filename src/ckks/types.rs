//! Ciphertext and key types.
//!
//! A ciphertext is a pair (c0, c1) over the residue chain satisfying
//! c0 + c1·s = m + e for the secret s, together with the bookkeeping the
//! leveled scheme needs: the current level, the exact encoding scale, and
//! the context fingerprint of the parameter set it was produced under.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ckks::context::CkksContext;
use crate::ckks::rns::RnsPoly;
use crate::math::gaussian::GaussianSampler;

/// Ternary secret key over the full residue chain.
///
/// # Fields
///
/// * `s` - Secret polynomial with coefficients in {-1, 0, 1}, embedded
///   under every chain prime
/// * `context_id` - Fingerprint of the parameter set the key belongs to
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SecretKey {
    pub s: RnsPoly,
    pub context_id: u64,
}

impl SecretKey {
    /// Samples a fresh ternary secret.
    ///
    /// Ternary coefficients keep decryption noise growth and the
    /// key-switching error both manageable.
    pub fn generate<R: Rng>(ctx: &CkksContext, rng: &mut R) -> Self {
        let s = RnsPoly::ternary(ctx.params.ring_dim, &ctx.params.moduli, rng);
        Self {
            s,
            context_id: ctx.context_id,
        }
    }
}

/// Public encryption key.
///
/// # Fields
///
/// * `a` - Uniform polynomial over the full chain
/// * `b` - Masked polynomial -a·s + e
/// * `context_id` - Fingerprint of the parameter set the key belongs to
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PublicKey {
    pub a: RnsPoly,
    pub b: RnsPoly,
    pub context_id: u64,
}

impl PublicKey {
    /// Derives the public key from a secret key.
    ///
    /// Encrypting under (a, b) then yields ciphertexts whose phase under s
    /// is the message plus a small error.
    pub fn generate<R: Rng>(ctx: &CkksContext, sk: &SecretKey, rng: &mut R) -> Self {
        debug_assert_eq!(sk.context_id, ctx.context_id, "Secret key context mismatch");

        let dim = ctx.params.ring_dim;
        let moduli = &ctx.params.moduli;
        let sampler = GaussianSampler::new(ctx.params.sigma);

        let a = RnsPoly::random_with_rng(dim, moduli, rng);
        let e = RnsPoly::gaussian(&sampler, dim, moduli, rng);
        let b = a.mul_ntt(&sk.s, &ctx.ntts).negate().add(&e);

        Self {
            a,
            b,
            context_id: ctx.context_id,
        }
    }
}

/// Leveled ciphertext (c0, c1) with its scale and level.
///
/// # Fields
///
/// * `c0` - Message component; decryption computes c0 + c1·s
/// * `c1` - Key component
/// * `level` - Number of chain primes already dropped
/// * `scale` - Exact scale of the encoded slot values
/// * `context_id` - Fingerprint of the parameter set it was produced under
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ciphertext {
    pub c0: RnsPoly,
    pub c1: RnsPoly,
    pub level: usize,
    pub scale: f64,
    pub context_id: u64,
}

impl Ciphertext {
    /// Assembles a ciphertext from its parts.
    ///
    /// # Panics
    ///
    /// Debug builds panic if the components disagree in shape.
    pub fn from_parts(
        c0: RnsPoly,
        c1: RnsPoly,
        level: usize,
        scale: f64,
        context_id: u64,
    ) -> Self {
        debug_assert_eq!(
            c0.limb_count(),
            c1.limb_count(),
            "Component limb counts must match"
        );
        debug_assert_eq!(
            c0.dimension(),
            c1.dimension(),
            "Component dimensions must match"
        );
        Self {
            c0,
            c1,
            level,
            scale,
            context_id,
        }
    }

    /// Ring dimension
    pub fn dimension(&self) -> usize {
        self.c0.dimension()
    }

    /// Number of active limbs
    pub fn limb_count(&self) -> usize {
        self.c0.limb_count()
    }
}
