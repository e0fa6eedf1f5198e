//! Mathematical primitives for the encrypted matching scheme.
//!
//! This module provides the core mathematical operations required for
//! lattice-based cryptography in the matching pipeline:
//!
//! - **Modular arithmetic** over Z_q using Montgomery reduction
//! - **Number-Theoretic Transform (NTT)** for fast polynomial multiplication
//! - **Polynomial operations** over R_q = Z_q[X]/(X^d + 1)
//! - **Discrete Gaussian and ternary sampling** for errors and secret keys
//!
//! # Overview
//!
//! The scheme operates over the polynomial ring R_q = Z_q[X]/(X^d + 1) with
//! q a chain of NTT-friendly primes handled limb by limb. All cryptographic
//! operations (encryption, key switching, homomorphic evaluation) are built
//! on these primitives.
//!
//! # Example
//!
//! ```
//! use veilmatch::math::{Poly, NttContext};
//!
//! // Create a polynomial and convert to NTT domain
//! let ctx = NttContext::with_default_q(256);
//! let mut poly = Poly::constant(7, 256, ctx.modulus());
//! poly.to_ntt(&ctx);
//! ```

pub mod gaussian;
pub mod mod_q;
pub mod ntt;
pub mod poly;

pub use gaussian::{sample_ternary_poly, GaussianSampler, DEFAULT_SIGMA};
pub use mod_q::{mod_to_signed, signed_to_mod, ModQ, DEFAULT_Q};
pub use ntt::NttContext;
pub use poly::Poly;
