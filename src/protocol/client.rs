//! Client-side operations.
//!
//! The client owns the secret key. It encrypts feature vectors for
//! upload, decrypts the score vector a compare returns, and derives the
//! index claim it sends back for verification. The server never sees
//! any of this in the clear.

use rand::Rng;

use crate::ckks::{
    decrypt, encrypt, generate_keys, Ciphertext, CkksContext, PublicContext, SecretKey,
};
use crate::params::ProtocolParams;
use crate::protocol::error::ProtocolError;
use crate::protocol::pipeline::compare_plan;
use crate::protocol::vector::EncryptedVector;
use crate::protocol::verify::REJECT_SENTINEL;

/// Smallest decrypted score the client accepts as the true match slot.
///
/// A converged match lands near 0.93 and a non-match near zero, while
/// decoy slots stay below the sampling cap of 0.55. The cutoff sits
/// above every decoy and below every plausible match score.
pub const CLAIM_CUTOFF: f64 = 0.8;

/// Generates a client key set whose evaluation keys cover the pipeline.
///
/// # Arguments
///
/// * `ctx` - Evaluation context for the agreed parameter set
/// * `protocol` - Matching parameters; fixes the rotation plan
/// * `rng` - Randomness source for all key material
///
/// # Example
///
/// ```
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha20Rng;
/// use veilmatch::ckks::CkksContext;
/// use veilmatch::params::{ProtocolParams, SchemeParams};
/// use veilmatch::protocol::client_keygen;
///
/// let ctx = CkksContext::new(SchemeParams::matching_default()).unwrap();
/// let protocol = ProtocolParams::default_128();
/// let mut rng = ChaCha20Rng::seed_from_u64(7);
/// let (sk, bundle) = client_keygen(&ctx, &protocol, &mut rng);
/// assert!(bundle.validate(&ctx).is_ok());
/// ```
pub fn client_keygen<R: Rng>(
    ctx: &CkksContext,
    protocol: &ProtocolParams,
    rng: &mut R,
) -> (SecretKey, PublicContext) {
    generate_keys(ctx, &compare_plan(protocol), rng)
}

/// Encrypts a feature vector for upload.
///
/// The vector must carry exactly `protocol.dim` features, one per slot.
pub fn encrypt_vector<R: Rng>(
    ctx: &CkksContext,
    bundle: &PublicContext,
    protocol: &ProtocolParams,
    features: &[f64],
    rng: &mut R,
) -> Result<EncryptedVector, ProtocolError> {
    if features.len() != protocol.dim {
        return Err(ProtocolError::DimensionMismatch {
            got: features.len(),
            want: protocol.dim,
        });
    }
    let pt = ctx.encode(features, 0)?;
    let ct = encrypt(ctx, &bundle.pk, &pt, rng)?;
    Ok(EncryptedVector::new(ct, protocol.dim))
}

/// Decrypts a returned score vector to one value per slot.
pub fn decrypt_scores(
    ctx: &CkksContext,
    sk: &SecretKey,
    result: &Ciphertext,
) -> Result<Vec<f64>, ProtocolError> {
    let pt = decrypt(ctx, sk, result)?;
    Ok(ctx.decode(&pt))
}

/// Derives the index claim from decrypted scores.
///
/// Returns the decimal index of the best slot at or above the cutoff,
/// or the reject sentinel when no slot qualifies. Only the true slot
/// can clear the cutoff, so a non-match yields the sentinel.
pub fn claim_index(scores: &[f64], cutoff: f64) -> String {
    let mut best: Option<(usize, f64)> = None;
    for (j, &v) in scores.iter().enumerate() {
        if v >= cutoff && best.map_or(true, |(_, bv)| v > bv) {
            best = Some((j, v));
        }
    }
    match best {
        Some((j, _)) => j.to_string(),
        None => REJECT_SENTINEL.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn ctx() -> CkksContext {
        CkksContext::new(crate::params::SchemeParams::matching_default()).unwrap()
    }

    #[test]
    fn test_encrypt_vector_roundtrip() {
        let ctx = ctx();
        let protocol = ProtocolParams::default_128();
        let mut rng = ChaCha20Rng::seed_from_u64(21);
        let (sk, bundle) = client_keygen(&ctx, &protocol, &mut rng);

        let features: Vec<f64> = (0..128).map(|j| (j % 11) as f64).collect();
        let vector = encrypt_vector(&ctx, &bundle, &protocol, &features, &mut rng).unwrap();
        assert_eq!(vector.dim, 128);
        assert_eq!(vector.ct.level, 0);

        let scores = decrypt_scores(&ctx, &sk, &vector.ct).unwrap();
        for (orig, dec) in features.iter().zip(scores.iter()) {
            assert!((orig - dec).abs() < 1e-6);
        }
    }

    #[test]
    fn test_encrypt_vector_rejects_wrong_length() {
        let ctx = ctx();
        let protocol = ProtocolParams::default_128();
        let mut rng = ChaCha20Rng::seed_from_u64(22);
        let (_, bundle) = client_keygen(&ctx, &protocol, &mut rng);

        let short = vec![1.0; 64];
        assert!(matches!(
            encrypt_vector(&ctx, &bundle, &protocol, &short, &mut rng),
            Err(ProtocolError::DimensionMismatch { got: 64, want: 128 })
        ));
    }

    #[test]
    fn test_claim_picks_best_qualifying_slot() {
        let mut scores = vec![0.1; 128];
        scores[42] = 0.93;
        assert_eq!(claim_index(&scores, CLAIM_CUTOFF), "42");

        // Decoy-height values never qualify
        scores[42] = 0.54;
        assert_eq!(claim_index(&scores, CLAIM_CUTOFF), REJECT_SENTINEL);

        // The larger of two qualifying slots wins
        scores[42] = 0.85;
        scores[7] = 0.91;
        assert_eq!(claim_index(&scores, CLAIM_CUTOFF), "7");
    }

    #[test]
    fn test_claim_on_empty_scores_rejects() {
        assert_eq!(claim_index(&[], CLAIM_CUTOFF), REJECT_SENTINEL);
    }
}
