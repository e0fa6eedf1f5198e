//! Leveled approximate homomorphic encryption over a residue chain.
//!
//! The scheme encrypts vectors of reals into the slots of a negacyclic
//! ring and supports slot-wise addition, multiplication, and rotation on
//! ciphertexts. Multiplication consumes levels: each product is followed
//! by a rescale that divides out the last chain prime, trading modulus
//! budget for a scale back near Δ.
//!
//! Components:
//!
//! - [`rns`] - Residue-chain polynomials and the exact rescale
//! - [`encoding`] - Slot encoding between real vectors and ring elements
//! - [`context`] - Precomputed tables shared by every operation
//! - [`types`] - Ciphertexts, secret and public keys
//! - [`keys`] - Relinearization and rotation keys, gadget key-switching
//! - [`encrypt`] - Public-key encryption, anchor-limb decryption
//! - [`error`] - Failures the scheme reports to callers
//!
//! Homomorphic operations live as methods on [`CkksContext`].
//!
//! # Example
//!
//! ```
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha20Rng;
//! use veilmatch::ckks::{decrypt, encrypt, generate_keys, CkksContext, RotationPlan};
//! use veilmatch::params::SchemeParams;
//!
//! let ctx = CkksContext::new(SchemeParams::matching_default()).unwrap();
//! let mut rng = ChaCha20Rng::seed_from_u64(9);
//! let (sk, bundle) = generate_keys(&ctx, &RotationPlan::new(vec![]), &mut rng);
//!
//! let pt = ctx.encode(&[1.5, -2.0, 0.25], 0).unwrap();
//! let ct = encrypt(&ctx, &bundle.pk, &pt, &mut rng).unwrap();
//!
//! // Square every slot, then rescale back near Δ
//! let squared = ctx.mul_relin(&ct, &ct, &bundle.relin).unwrap();
//! let squared = ctx.rescale(&squared).unwrap();
//!
//! let decoded = ctx.decode(&decrypt(&ctx, &sk, &squared).unwrap());
//! assert!((decoded[0] - 2.25).abs() < 1e-4);
//! assert!((decoded[1] - 4.0).abs() < 1e-4);
//! ```

pub mod context;
pub mod encoding;
pub mod encrypt;
pub mod error;
mod eval;
pub mod keys;
pub mod rns;
pub mod types;

pub use context::CkksContext;
pub use encoding::{Plaintext, SlotEncoder};
pub use encrypt::{decrypt, encrypt};
pub use error::SchemeError;
pub use keys::{
    generate_keys, generate_keys_seeded, GaloisKeys, KeySwitchKey, PublicContext, RelinKeys,
    RotationPlan,
};
pub use rns::RnsPoly;
pub use types::{Ciphertext, PublicKey, SecretKey};
