//! Polynomial operations over R_q = Z_q[X]/(X^d + 1).
//!
//! Provides polynomial arithmetic using NTT for efficient multiplication.
//! Polynomials can exist in either coefficient domain or NTT domain.
//!
//! # Overview
//!
//! The polynomial ring R_q = Z_q[X]/(X^d + 1) is fundamental to lattice-based
//! cryptography. This module provides:
//!
//! - Basic arithmetic: addition, subtraction, negation, scalar multiplication
//! - NTT-based multiplication for O(n log n) performance
//! - Domain conversion between coefficient and NTT representations
//! - Signed-coefficient embedding for encoded values and errors
//! - Galois automorphisms X -> X^g for slot rotation
//!
//! # Example
//!
//! ```
//! use veilmatch::math::{Poly, NttContext};
//! use veilmatch::math::mod_q::DEFAULT_Q;
//!
//! let ctx = NttContext::with_default_q(256);
//!
//! let a = Poly::from_coeffs((0..256).collect(), DEFAULT_Q);
//! let one = Poly::constant(1, 256, DEFAULT_Q);
//!
//! // Multiply using NTT
//! let product = a.mul_ntt(&one, &ctx);
//! assert_eq!(product, a);
//! ```

use super::mod_q::{mod_to_signed, signed_to_mod};
use super::ntt::NttContext;
use rand::Rng;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Polynomial in R_q = Z_q[X]/(X^d + 1).
///
/// Represents a polynomial with coefficients in Z_q, reduced modulo X^d + 1.
/// Polynomials can be in coefficient domain or NTT domain for efficient
/// multiplication.
///
/// # Fields
///
/// * `coeffs` - Coefficients in coefficient or NTT domain
/// * `q` - Modulus q
/// * `is_ntt` - Whether coefficients are in NTT domain
///
/// # Example
///
/// ```
/// use veilmatch::math::Poly;
/// use veilmatch::math::mod_q::DEFAULT_Q;
///
/// let poly = Poly::constant(42, 256, DEFAULT_Q);
/// assert_eq!(poly.coeff(0), 42);
/// assert_eq!(poly.dimension(), 256);
/// ```
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Poly {
    /// Coefficients in coefficient or NTT domain.
    coeffs: Vec<u64>,
    /// Modulus q.
    q: u64,
    /// Whether coefficients are in NTT domain.
    is_ntt: bool,
}

impl Poly {
    /// Create zero polynomial with given dimension and modulus
    pub fn zero(dim: usize, q: u64) -> Self {
        Self {
            coeffs: vec![0; dim],
            q,
            is_ntt: false,
        }
    }

    /// Create polynomial from coefficient vector
    pub fn from_coeffs(coeffs: Vec<u64>, q: u64) -> Self {
        let mut p = Self {
            coeffs,
            q,
            is_ntt: false,
        };
        p.reduce();
        p
    }

    /// Create polynomial from signed coefficients via the centered embedding
    pub fn from_signed_coeffs(coeffs: &[i64], q: u64) -> Self {
        let coeffs = coeffs.iter().map(|&c| signed_to_mod(c, q)).collect();
        Self {
            coeffs,
            q,
            is_ntt: false,
        }
    }

    /// Create polynomial with a single coefficient (constant polynomial)
    pub fn constant(value: u64, dim: usize, q: u64) -> Self {
        let mut coeffs = vec![0; dim];
        coeffs[0] = value % q;
        Self {
            coeffs,
            q,
            is_ntt: false,
        }
    }

    /// Generate a uniformly random polynomial with given RNG
    pub fn random_with_rng<R: Rng>(dim: usize, q: u64, rng: &mut R) -> Self {
        let coeffs: Vec<u64> = (0..dim).map(|_| rng.gen_range(0..q)).collect();
        Self {
            coeffs,
            q,
            is_ntt: false,
        }
    }

    /// Get polynomial dimension
    pub fn dimension(&self) -> usize {
        self.coeffs.len()
    }

    /// Get modulus
    pub fn modulus(&self) -> u64 {
        self.q
    }

    /// Check if in NTT domain
    pub fn is_ntt(&self) -> bool {
        self.is_ntt
    }

    /// Get coefficient at index (only valid if not in NTT domain)
    pub fn coeff(&self, i: usize) -> u64 {
        assert!(!self.is_ntt, "Cannot access coefficients in NTT domain");
        self.coeffs[i]
    }

    /// Get reference to coefficient/NTT vector
    pub fn coeffs(&self) -> &[u64] {
        &self.coeffs
    }

    /// Centered lift of all coefficients to signed values
    pub fn to_signed_coeffs(&self) -> Vec<i64> {
        assert!(!self.is_ntt, "Cannot lift coefficients in NTT domain");
        self.coeffs
            .iter()
            .map(|&c| mod_to_signed(c, self.q))
            .collect()
    }

    /// Reduce all coefficients modulo q
    fn reduce(&mut self) {
        for c in &mut self.coeffs {
            *c %= self.q;
        }
    }

    /// Convert to NTT domain
    pub fn to_ntt(&mut self, ctx: &NttContext) {
        debug_assert_eq!(self.q, ctx.modulus(), "NTT context modulus must match");
        if !self.is_ntt {
            ctx.forward(&mut self.coeffs);
            self.is_ntt = true;
        }
    }

    /// Convert from NTT domain to coefficient domain
    pub fn from_ntt(&mut self, ctx: &NttContext) {
        debug_assert_eq!(self.q, ctx.modulus(), "NTT context modulus must match");
        if self.is_ntt {
            ctx.inverse(&mut self.coeffs);
            self.is_ntt = false;
        }
    }

    /// Create a copy in NTT domain
    pub fn to_ntt_new(&self, ctx: &NttContext) -> Self {
        let mut result = self.clone();
        result.to_ntt(ctx);
        result
    }

    /// Create a copy in coefficient domain
    pub fn from_ntt_new(&self, ctx: &NttContext) -> Self {
        let mut result = self.clone();
        result.from_ntt(ctx);
        result
    }

    /// Scalar multiplication
    pub fn scalar_mul(&self, scalar: u64) -> Self {
        let scalar = scalar % self.q;
        let coeffs: Vec<u64> = self
            .coeffs
            .iter()
            .map(|&c| ((c as u128 * scalar as u128) % self.q as u128) as u64)
            .collect();

        Self {
            coeffs,
            q: self.q,
            is_ntt: self.is_ntt,
        }
    }

    /// Polynomial multiplication using NTT (negacyclic for X^d + 1)
    pub fn mul_ntt(&self, other: &Self, ctx: &NttContext) -> Self {
        assert_eq!(self.q, other.q, "Moduli must match");
        assert_eq!(
            self.coeffs.len(),
            other.coeffs.len(),
            "Dimensions must match"
        );

        let mut a = self.clone();
        let mut b = other.clone();

        a.to_ntt(ctx);
        b.to_ntt(ctx);

        let mut result = vec![0u64; self.coeffs.len()];
        ctx.pointwise_mul(&a.coeffs, &b.coeffs, &mut result);

        let mut poly = Self {
            coeffs: result,
            q: self.q,
            is_ntt: true,
        };
        poly.from_ntt(ctx);
        poly
    }

    /// Polynomial multiplication when both are already in NTT domain
    pub fn mul_ntt_domain(&self, other: &Self, ctx: &NttContext) -> Self {
        assert!(
            self.is_ntt && other.is_ntt,
            "Both polynomials must be in NTT domain"
        );
        assert_eq!(self.q, other.q, "Moduli must match");

        let mut result = vec![0u64; self.coeffs.len()];
        ctx.pointwise_mul(&self.coeffs, &other.coeffs, &mut result);

        Self {
            coeffs: result,
            q: self.q,
            is_ntt: true,
        }
    }

    /// In-place multiply-accumulate in NTT domain: self += a * b
    ///
    /// **Performance**: Single pass multiply-add without intermediate allocation
    pub fn mul_acc_ntt_domain(&mut self, a: &Self, b: &Self, ctx: &NttContext) {
        assert!(
            self.is_ntt && a.is_ntt && b.is_ntt,
            "All polynomials must be in NTT domain"
        );
        assert_eq!(self.q, a.q, "Moduli must match");
        assert_eq!(self.q, b.q, "Moduli must match");

        let q = self.q as u128;
        for i in 0..self.coeffs.len() {
            let prod = ctx.pointwise_mul_single(a.coeffs[i], b.coeffs[i]);
            let sum = self.coeffs[i] as u128 + prod as u128;
            self.coeffs[i] = (sum % q) as u64;
        }
    }

    /// Applies the Galois automorphism X -> X^g.
    ///
    /// The coefficient of X^i moves to X^(g*i mod 2d), picking up a sign
    /// when the exponent folds across X^d = -1. Requires g odd so the map
    /// is a ring automorphism.
    ///
    /// # Panics
    ///
    /// Panics if the polynomial is in NTT domain or g is even.
    pub fn automorphism(&self, g: usize) -> Self {
        assert!(!self.is_ntt, "Automorphism operates in coefficient domain");
        assert!(g % 2 == 1, "Galois element must be odd");

        let n = self.coeffs.len();
        let two_n = 2 * n;
        let mut coeffs = vec![0u64; n];

        for (i, &c) in self.coeffs.iter().enumerate() {
            if c == 0 {
                continue;
            }
            let new_idx = (g * i) % two_n;
            if new_idx >= n {
                // X^(n + k) = -X^k
                let idx = new_idx - n;
                coeffs[idx] = if coeffs[idx] >= c {
                    coeffs[idx] - c
                } else {
                    self.q - c + coeffs[idx]
                };
            } else {
                let sum = coeffs[new_idx] + c;
                coeffs[new_idx] = if sum >= self.q { sum - self.q } else { sum };
            }
        }

        Self {
            coeffs,
            q: self.q,
            is_ntt: false,
        }
    }

    /// Check if polynomial is zero
    pub fn is_zero(&self) -> bool {
        self.coeffs.iter().all(|&c| c == 0)
    }

    /// L-infinity norm (maximum absolute coefficient value)
    /// For centered representation: returns max(|c|, |q - c|) for each c
    pub fn linf_norm(&self) -> u64 {
        assert!(!self.is_ntt, "Cannot compute norm in NTT domain");
        self.coeffs
            .iter()
            .map(|&c| if c <= self.q / 2 { c } else { self.q - c })
            .max()
            .unwrap_or(0)
    }
}

impl PartialEq for Poly {
    fn eq(&self, other: &Self) -> bool {
        self.q == other.q && self.is_ntt == other.is_ntt && self.coeffs == other.coeffs
    }
}

impl Eq for Poly {}

impl Add for Poly {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        &self + &rhs
    }
}

impl Add for &Poly {
    type Output = Poly;

    fn add(self, rhs: Self) -> Self::Output {
        assert_eq!(self.q, rhs.q, "Moduli must match");
        assert_eq!(self.is_ntt, rhs.is_ntt, "NTT domains must match");

        let coeffs: Vec<u64> = self
            .coeffs
            .iter()
            .zip(rhs.coeffs.iter())
            .map(|(&a, &b)| {
                let sum = a + b;
                if sum >= self.q {
                    sum - self.q
                } else {
                    sum
                }
            })
            .collect();

        Poly {
            coeffs,
            q: self.q,
            is_ntt: self.is_ntt,
        }
    }
}

impl AddAssign for Poly {
    fn add_assign(&mut self, rhs: Self) {
        *self = &*self + &rhs;
    }
}

impl AddAssign<&Poly> for Poly {
    fn add_assign(&mut self, rhs: &Self) {
        *self = &*self + rhs;
    }
}

impl Sub for Poly {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        &self - &rhs
    }
}

impl Sub for &Poly {
    type Output = Poly;

    fn sub(self, rhs: Self) -> Self::Output {
        assert_eq!(self.q, rhs.q, "Moduli must match");
        assert_eq!(self.is_ntt, rhs.is_ntt, "NTT domains must match");

        let coeffs: Vec<u64> = self
            .coeffs
            .iter()
            .zip(rhs.coeffs.iter())
            .map(|(&a, &b)| if a >= b { a - b } else { self.q - b + a })
            .collect();

        Poly {
            coeffs,
            q: self.q,
            is_ntt: self.is_ntt,
        }
    }
}

impl SubAssign for Poly {
    fn sub_assign(&mut self, rhs: Self) {
        *self = &*self - &rhs;
    }
}

impl SubAssign<&Poly> for Poly {
    fn sub_assign(&mut self, rhs: &Self) {
        *self = &*self - rhs;
    }
}

impl Neg for Poly {
    type Output = Self;

    fn neg(self) -> Self::Output {
        -&self
    }
}

impl Neg for &Poly {
    type Output = Poly;

    fn neg(self) -> Self::Output {
        let coeffs: Vec<u64> = self
            .coeffs
            .iter()
            .map(|&c| if c == 0 { 0 } else { self.q - c })
            .collect();

        Poly {
            coeffs,
            q: self.q,
            is_ntt: self.is_ntt,
        }
    }
}
