//! Residue-chain polynomials.
//!
//! An `RnsPoly` represents an element of R_Q = Z_Q[X]/(X^d + 1) for a
//! composite Q = q_0 · q_1 · ... · q_k by storing one residue polynomial
//! per chain prime. All arithmetic is limb-wise; no big-integer values are
//! ever materialized.
//!
//! Limb index i always corresponds to chain prime i: levels shrink the
//! chain from the back, so a poly with m limbs lives under the first m
//! primes of the chain.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::math::gaussian::GaussianSampler;
use crate::math::mod_q::{mod_to_signed, signed_to_mod};
use crate::math::ntt::NttContext;
use crate::math::poly::Poly;

/// Polynomial over a chain of residue primes.
///
/// # Fields
///
/// * `limbs` - One residue polynomial per active chain prime
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RnsPoly {
    limbs: Vec<Poly>,
}

impl RnsPoly {
    /// Zero polynomial under the given moduli
    pub fn zero(dim: usize, moduli: &[u64]) -> Self {
        let limbs = moduli.iter().map(|&q| Poly::zero(dim, q)).collect();
        Self { limbs }
    }

    /// Builds from explicit limbs
    pub fn from_limbs(limbs: Vec<Poly>) -> Self {
        assert!(!limbs.is_empty(), "RnsPoly needs at least one limb");
        debug_assert!(
            limbs.iter().all(|l| l.dimension() == limbs[0].dimension()),
            "Limb dimensions must match"
        );
        Self { limbs }
    }

    /// Embeds a signed integer vector under every chain prime.
    ///
    /// The same integer coefficients reduce into each limb, so the limbs
    /// jointly represent that integer vector mod Q.
    pub fn from_signed(coeffs: &[i64], moduli: &[u64]) -> Self {
        let limbs = moduli
            .iter()
            .map(|&q| Poly::from_signed_coeffs(coeffs, q))
            .collect();
        Self { limbs }
    }

    /// Uniformly random element of R_Q.
    ///
    /// Independent uniform residues per limb are exactly a uniform element
    /// mod Q by the CRT.
    pub fn random_with_rng<R: Rng>(dim: usize, moduli: &[u64], rng: &mut R) -> Self {
        let limbs = moduli
            .iter()
            .map(|&q| Poly::random_with_rng(dim, q, rng))
            .collect();
        Self { limbs }
    }

    /// Gaussian error polynomial: one signed sample vector, embedded per limb
    pub fn gaussian<R: Rng>(
        sampler: &GaussianSampler,
        dim: usize,
        moduli: &[u64],
        rng: &mut R,
    ) -> Self {
        let coeffs = sampler.sample_vec(dim, rng);
        Self::from_signed(&coeffs, moduli)
    }

    /// Ternary polynomial with coefficients in {-1, 0, 1}, embedded per limb
    pub fn ternary<R: Rng>(dim: usize, moduli: &[u64], rng: &mut R) -> Self {
        let coeffs: Vec<i64> = (0..dim).map(|_| rng.gen_range(-1..=1)).collect();
        Self::from_signed(&coeffs, moduli)
    }

    /// Number of active limbs
    pub fn limb_count(&self) -> usize {
        self.limbs.len()
    }

    /// Ring dimension
    pub fn dimension(&self) -> usize {
        self.limbs[0].dimension()
    }

    /// Limb at chain index i
    pub fn limb(&self, i: usize) -> &Poly {
        &self.limbs[i]
    }

    /// Mutable limb at chain index i
    pub fn limb_mut(&mut self, i: usize) -> &mut Poly {
        &mut self.limbs[i]
    }

    /// All limbs
    pub fn limbs(&self) -> &[Poly] {
        &self.limbs
    }

    /// Whether limbs are in NTT domain (all limbs share one domain)
    pub fn is_ntt(&self) -> bool {
        self.limbs[0].is_ntt()
    }

    /// Converts every limb to NTT domain
    pub fn to_ntt(&mut self, ntts: &[NttContext]) {
        assert!(ntts.len() >= self.limbs.len(), "Not enough NTT contexts");
        for (limb, ctx) in self.limbs.iter_mut().zip(ntts.iter()) {
            limb.to_ntt(ctx);
        }
    }

    /// Converts every limb to coefficient domain
    pub fn from_ntt(&mut self, ntts: &[NttContext]) {
        assert!(ntts.len() >= self.limbs.len(), "Not enough NTT contexts");
        for (limb, ctx) in self.limbs.iter_mut().zip(ntts.iter()) {
            limb.from_ntt(ctx);
        }
    }

    /// Copy converted to NTT domain
    pub fn to_ntt_new(&self, ntts: &[NttContext]) -> Self {
        let mut out = self.clone();
        out.to_ntt(ntts);
        out
    }

    /// Copy converted to coefficient domain
    pub fn from_ntt_new(&self, ntts: &[NttContext]) -> Self {
        let mut out = self.clone();
        out.from_ntt(ntts);
        out
    }

    /// Limb-wise addition
    pub fn add(&self, other: &Self) -> Self {
        assert_eq!(self.limbs.len(), other.limbs.len(), "Limb counts must match");
        let limbs = self
            .limbs
            .iter()
            .zip(other.limbs.iter())
            .map(|(a, b)| a + b)
            .collect();
        Self { limbs }
    }

    /// Limb-wise subtraction
    pub fn sub(&self, other: &Self) -> Self {
        assert_eq!(self.limbs.len(), other.limbs.len(), "Limb counts must match");
        let limbs = self
            .limbs
            .iter()
            .zip(other.limbs.iter())
            .map(|(a, b)| a - b)
            .collect();
        Self { limbs }
    }

    /// Limb-wise negation
    pub fn negate(&self) -> Self {
        let limbs = self.limbs.iter().map(|l| -l).collect();
        Self { limbs }
    }

    /// Limb-wise NTT multiplication (inputs in coefficient domain)
    pub fn mul_ntt(&self, other: &Self, ntts: &[NttContext]) -> Self {
        assert_eq!(self.limbs.len(), other.limbs.len(), "Limb counts must match");
        assert!(ntts.len() >= self.limbs.len(), "Not enough NTT contexts");
        let limbs = self
            .limbs
            .iter()
            .zip(other.limbs.iter())
            .zip(ntts.iter())
            .map(|((a, b), ctx)| a.mul_ntt(b, ctx))
            .collect();
        Self { limbs }
    }

    /// Limb-wise multiplication when both sides are already in NTT domain
    pub fn mul_ntt_domain(&self, other: &Self, ntts: &[NttContext]) -> Self {
        assert_eq!(self.limbs.len(), other.limbs.len(), "Limb counts must match");
        assert!(ntts.len() >= self.limbs.len(), "Not enough NTT contexts");
        let limbs = self
            .limbs
            .iter()
            .zip(other.limbs.iter())
            .zip(ntts.iter())
            .map(|((a, b), ctx)| a.mul_ntt_domain(b, ctx))
            .collect();
        Self { limbs }
    }

    /// Limb-wise multiply-accumulate in NTT domain: self += a * b
    pub fn mul_acc_ntt_domain(&mut self, a: &Self, b: &Self, ntts: &[NttContext]) {
        assert_eq!(self.limbs.len(), a.limbs.len(), "Limb counts must match");
        assert_eq!(self.limbs.len(), b.limbs.len(), "Limb counts must match");
        for i in 0..self.limbs.len() {
            self.limbs[i].mul_acc_ntt_domain(&a.limbs[i], &b.limbs[i], &ntts[i]);
        }
    }

    /// Multiplies one limb by a scalar, leaving the others untouched
    pub fn scalar_mul_limb(&mut self, i: usize, scalar: u64) {
        self.limbs[i] = self.limbs[i].scalar_mul(scalar);
    }

    /// Multiplies every limb by the residue of a signed scalar
    pub fn scalar_mul_signed(&self, scalar: i64) -> Self {
        let limbs = self
            .limbs
            .iter()
            .map(|l| l.scalar_mul(signed_to_mod(scalar, l.modulus())))
            .collect();
        Self { limbs }
    }

    /// Applies the Galois automorphism X -> X^g to every limb
    pub fn automorphism(&self, g: usize) -> Self {
        let limbs = self.limbs.iter().map(|l| l.automorphism(g)).collect();
        Self { limbs }
    }

    /// Keeps only the first `count` limbs (dropping chain primes from the back)
    pub fn truncated(&self, count: usize) -> Self {
        assert!(count >= 1 && count <= self.limbs.len(), "Invalid limb count");
        Self {
            limbs: self.limbs[..count].to_vec(),
        }
    }

    /// Exact division by the last chain prime with rounding.
    ///
    /// Drops the last limb and maps each remaining residue x_i to
    /// (x_i - δ) · q_last^(-1) mod q_i, where δ is the centered remainder
    /// read off the dropped limb. The result represents round(x / q_last)
    /// with per-coefficient rounding error at most 1/2.
    ///
    /// # Arguments
    ///
    /// * `inv_table` - q_last^(-1) mod q_i for each remaining limb i
    ///
    /// # Panics
    ///
    /// Panics if only one limb remains or the poly is in NTT domain.
    pub fn rescale_last(&self, inv_table: &[u64]) -> Self {
        assert!(self.limbs.len() >= 2, "Cannot rescale the anchor limb");
        assert!(!self.is_ntt(), "Rescale operates in coefficient domain");
        assert_eq!(
            inv_table.len(),
            self.limbs.len() - 1,
            "Inverse table length must match remaining limbs"
        );

        let dim = self.dimension();
        let last = &self.limbs[self.limbs.len() - 1];
        let q_last = last.modulus();

        let mut limbs = Vec::with_capacity(self.limbs.len() - 1);
        for (i, limb) in self.limbs[..self.limbs.len() - 1].iter().enumerate() {
            let q_i = limb.modulus();
            let inv = inv_table[i] as u128;
            let mut coeffs = Vec::with_capacity(dim);
            for k in 0..dim {
                let delta = mod_to_signed(last.coeff(k), q_last);
                let delta_mod = signed_to_mod(delta, q_i);
                let x = limb.coeff(k);
                let diff = if x >= delta_mod {
                    x - delta_mod
                } else {
                    q_i - delta_mod + x
                };
                coeffs.push(((diff as u128 * inv) % q_i as u128) as u64);
            }
            limbs.push(Poly::from_coeffs(coeffs, q_i));
        }

        Self { limbs }
    }
}
