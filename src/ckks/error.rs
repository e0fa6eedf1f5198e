//! Error type for scheme-level operations.

use thiserror::Error;

/// Errors raised by encoding, key generation, and homomorphic evaluation.
///
/// Internal representation bugs (mismatched limb counts inside one
/// operation, NTT domain confusion) panic via assertions; this type covers
/// conditions that depend on caller input, such as operating across
/// parameter sets or running past the modulus chain.
#[derive(Debug, Error)]
pub enum SchemeError {
    /// Parameter validation failed at context construction.
    #[error("invalid parameters: {0}")]
    InvalidParams(&'static str),

    /// Operands were produced under different parameter sets.
    #[error("context mismatch: {left:#x} vs {right:#x}")]
    ContextMismatch { left: u64, right: u64 },

    /// Ciphertext-ciphertext addition requires identical scales.
    #[error("scale mismatch: {left} vs {right}")]
    ScaleMismatch { left: f64, right: f64 },

    /// Operands sit at different points of the modulus chain.
    #[error("level mismatch: {left} vs {right}")]
    LevelMismatch { left: usize, right: usize },

    /// No prime left to drop; the modulus chain is exhausted.
    #[error("modulus chain exhausted at level {level}")]
    LevelExhausted { level: usize },

    /// No relinearization key was generated for this level.
    #[error("missing relinearization key for level {level}")]
    MissingRelinKey { level: usize },

    /// No rotation key was generated for this (step, level) pair.
    #[error("missing rotation key for step {step} at level {level}")]
    MissingRotationKey { step: usize, level: usize },

    /// A deserialized object failed structural validation.
    #[error("invalid ciphertext: {0}")]
    InvalidCiphertext(String),
}
