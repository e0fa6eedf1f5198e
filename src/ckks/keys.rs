//! Evaluation keys: relinearization, rotation, and the key-switching core.
//!
//! Key-switching re-expresses a ciphertext component that decrypts under
//! some polynomial t (the square of the secret after a tensor product, or
//! an automorphism image of the secret after a rotation) as a pair
//! decrypting under s itself. The switching key publishes masked gadget
//! multiples of t: row (i, j) carries z^j · t in limb i only, so applying
//! the key recomposes each limb's residue independently and no value ever
//! leaves RNS form.
//!
//! Digits are bounded by the gadget base z, which keeps the noise each row
//! contributes at z · σ per coefficient instead of q · σ.

use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::ckks::context::CkksContext;
use crate::ckks::error::SchemeError;
use crate::ckks::rns::RnsPoly;
use crate::ckks::types::{PublicKey, SecretKey};
use crate::math::gaussian::GaussianSampler;
use crate::math::mod_q::ModQ;
use crate::math::poly::Poly;
use crate::params::SchemeParams;

/// Gadget-decomposed switching key from a target polynomial back to s.
///
/// # Fields
///
/// * `rows` - Pairs (b, a) in NTT domain, one per (limb, digit); row
///   (i, j) satisfies b + a·s = e + z^j·t in limb i and b + a·s = e in
///   every other limb
/// * `level` - Chain level the key was generated for
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeySwitchKey {
    pub rows: Vec<(RnsPoly, RnsPoly)>,
    pub level: usize,
}

impl KeySwitchKey {
    /// Generates a switching key from `target` to the secret.
    ///
    /// # Arguments
    ///
    /// * `target` - Polynomial the input component multiplies (s² for
    ///   relinearization, an automorphism image of s for rotation), over
    ///   the full chain
    /// * `level` - Level the key will be applied at
    pub fn generate<R: Rng>(
        ctx: &CkksContext,
        sk: &SecretKey,
        target: &RnsPoly,
        level: usize,
        rng: &mut R,
    ) -> Self {
        let m = ctx.limb_count(level);
        let moduli = ctx.params.active_moduli(level);
        let ntts = ctx.active_ntts(level);
        let dim = ctx.params.ring_dim;
        let base = ctx.params.gadget_base;
        let sampler = GaussianSampler::new(ctx.params.sigma);

        let s_ntt = sk.s.truncated(m).to_ntt_new(ntts);
        let target_ntt = target.truncated(m).to_ntt_new(ntts);

        let mut rows = Vec::new();
        for i in 0..m {
            for j in 0..ctx.gadget_digits[i] {
                let a = RnsPoly::random_with_rng(dim, moduli, rng).to_ntt_new(ntts);
                let e = RnsPoly::gaussian(&sampler, dim, moduli, rng).to_ntt_new(ntts);

                let mut b = a.mul_ntt_domain(&s_ntt, ntts).negate().add(&e);
                let factor = ModQ::new(base, moduli[i]).pow(j as u64).value();
                let boosted = b.limb(i) + &target_ntt.limb(i).scalar_mul(factor);
                *b.limb_mut(i) = boosted;

                rows.push((b, a));
            }
        }

        Self { rows, level }
    }

    /// Switches a component multiplying the target into one multiplying s.
    ///
    /// Decomposes each limb of `c` into base-z digits and accumulates the
    /// matching rows. The returned pair (kb, ka) satisfies
    /// kb + ka·s = c·t + e' for a small e'.
    ///
    /// # Panics
    ///
    /// Debug builds panic if `c` does not match the key's level shape.
    pub fn apply(&self, ctx: &CkksContext, c: &RnsPoly) -> (RnsPoly, RnsPoly) {
        let m = c.limb_count();
        debug_assert_eq!(m, ctx.limb_count(self.level), "Limb count mismatch");
        debug_assert!(!c.is_ntt(), "Decomposition reads coefficients");

        let moduli = ctx.params.active_moduli(self.level);
        let ntts = ctx.active_ntts(self.level);
        let dim = c.dimension();
        let base_bits = ctx.params.gadget_base.trailing_zeros();
        let mask = ctx.params.gadget_base - 1;

        let mut acc_b = RnsPoly::zero(dim, moduli).to_ntt_new(ntts);
        let mut acc_a = RnsPoly::zero(dim, moduli).to_ntt_new(ntts);

        let mut row = 0;
        for i in 0..m {
            for j in 0..ctx.gadget_digits[i] {
                let shift = base_bits * j as u32;
                let digit_coeffs: Vec<u64> = (0..dim)
                    .map(|k| (c.limb(i).coeff(k) >> shift) & mask)
                    .collect();
                // Digits fit below every chain prime, so the same values
                // embed verbatim under each modulus
                let digit = RnsPoly::from_limbs(
                    moduli
                        .iter()
                        .map(|&q| Poly::from_coeffs(digit_coeffs.clone(), q))
                        .collect(),
                )
                .to_ntt_new(ntts);

                let (b, a) = &self.rows[row];
                acc_b.mul_acc_ntt_domain(&digit, b, ntts);
                acc_a.mul_acc_ntt_domain(&digit, a, ntts);
                row += 1;
            }
        }

        (acc_b.from_ntt_new(ntts), acc_a.from_ntt_new(ntts))
    }
}

/// Relinearization keys, one per level a ciphertext product can occur at.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelinKeys {
    pub keys: Vec<KeySwitchKey>,
    pub context_id: u64,
}

impl RelinKeys {
    /// Generates relinearization keys targeting s² for every level with at
    /// least two active limbs.
    pub fn generate<R: Rng>(ctx: &CkksContext, sk: &SecretKey, rng: &mut R) -> Self {
        let s_squared = sk.s.mul_ntt(&sk.s, &ctx.ntts);
        let keys = (0..ctx.levels())
            .map(|level| KeySwitchKey::generate(ctx, sk, &s_squared, level, rng))
            .collect();
        Self {
            keys,
            context_id: ctx.context_id,
        }
    }

    /// The key for products occurring at `level`, if generated
    pub fn at_level(&self, level: usize) -> Option<&KeySwitchKey> {
        self.keys.get(level)
    }
}

/// Rotation steps and levels a key bundle must cover.
///
/// Rotation keys are generated per (step, level) pair, so the planned
/// circuit declares up front where it rotates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationPlan {
    pub pairs: Vec<(usize, usize)>,
}

impl RotationPlan {
    /// Plan from explicit (step, level) pairs
    pub fn new(pairs: Vec<(usize, usize)>) -> Self {
        Self { pairs }
    }

    /// Plan for a power-of-two slot-sum ladder run at one level
    pub fn slot_sum(steps: &[usize], level: usize) -> Self {
        Self {
            pairs: steps.iter().map(|&s| (s, level)).collect(),
        }
    }
}

/// Rotation keys keyed by (step, level).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GaloisKeys {
    pub keys: HashMap<(usize, usize), KeySwitchKey>,
    pub context_id: u64,
}

impl GaloisKeys {
    /// Generates rotation keys for every pair in the plan.
    ///
    /// The key for step r targets the automorphism image of s under
    /// X -> X^(5^r), which a rotated ciphertext component multiplies.
    pub fn generate<R: Rng>(
        ctx: &CkksContext,
        sk: &SecretKey,
        plan: &RotationPlan,
        rng: &mut R,
    ) -> Self {
        let mut keys = HashMap::new();
        for &(step, level) in &plan.pairs {
            let g = ctx.encoder.rotation_exponent(step);
            let s_rotated = sk.s.automorphism(g);
            keys.insert(
                (step, level),
                KeySwitchKey::generate(ctx, sk, &s_rotated, level, rng),
            );
        }
        Self {
            keys,
            context_id: ctx.context_id,
        }
    }

    /// The key for rotating by `step` at `level`, if generated
    pub fn get(&self, step: usize, level: usize) -> Option<&KeySwitchKey> {
        self.keys.get(&(step, level))
    }
}

/// Everything the evaluating party holds: parameters, the public key, and
/// the evaluation keys. Contains no secret material.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PublicContext {
    pub params: SchemeParams,
    pub pk: PublicKey,
    pub relin: RelinKeys,
    pub galois: GaloisKeys,
}

impl PublicContext {
    /// Checks that this bundle was generated under the given context.
    pub fn validate(&self, ctx: &CkksContext) -> Result<(), SchemeError> {
        for id in [
            self.pk.context_id,
            self.relin.context_id,
            self.galois.context_id,
        ] {
            if id != ctx.context_id {
                return Err(SchemeError::ContextMismatch {
                    left: id,
                    right: ctx.context_id,
                });
            }
        }
        Ok(())
    }

    /// Checks that the bundle can evaluate a circuit needing relinearization
    /// at every level and rotation at each planned (step, level) pair.
    pub fn ensure_coverage(
        &self,
        ctx: &CkksContext,
        plan: &RotationPlan,
    ) -> Result<(), SchemeError> {
        self.validate(ctx)?;
        for level in 0..ctx.levels() {
            if self.relin.at_level(level).is_none() {
                return Err(SchemeError::MissingRelinKey { level });
            }
        }
        for &(step, level) in &plan.pairs {
            if self.galois.get(step, level).is_none() {
                return Err(SchemeError::MissingRotationKey { step, level });
            }
        }
        Ok(())
    }
}

/// Generates a fresh secret key with its full public bundle.
///
/// # Arguments
///
/// * `plan` - Rotation pairs the bundle must support
///
/// # Example
///
/// ```
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha20Rng;
/// use veilmatch::ckks::{generate_keys, CkksContext, RotationPlan};
/// use veilmatch::params::SchemeParams;
///
/// let ctx = CkksContext::new(SchemeParams::matching_default()).unwrap();
/// let plan = RotationPlan::slot_sum(&[1, 2, 4], 1);
/// let mut rng = ChaCha20Rng::from_entropy();
/// let (sk, bundle) = generate_keys(&ctx, &plan, &mut rng);
/// assert!(bundle.validate(&ctx).is_ok());
/// assert_eq!(sk.context_id, ctx.context_id());
/// ```
pub fn generate_keys<R: Rng>(
    ctx: &CkksContext,
    plan: &RotationPlan,
    rng: &mut R,
) -> (SecretKey, PublicContext) {
    let sk = SecretKey::generate(ctx, rng);
    let pk = PublicKey::generate(ctx, &sk, rng);
    let relin = RelinKeys::generate(ctx, &sk, rng);
    let galois = GaloisKeys::generate(ctx, &sk, plan, rng);

    let bundle = PublicContext {
        params: ctx.params.clone(),
        pk,
        relin,
        galois,
    };
    (sk, bundle)
}

/// Deterministic key generation from a 32-byte seed.
pub fn generate_keys_seeded(
    ctx: &CkksContext,
    plan: &RotationPlan,
    seed: [u8; 32],
) -> (SecretKey, PublicContext) {
    let mut rng = ChaCha20Rng::from_seed(seed);
    generate_keys(ctx, plan, &mut rng)
}
