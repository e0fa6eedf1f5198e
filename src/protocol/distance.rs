//! Encrypted squared-distance computation.
//!
//! The distance between template and sample never leaves ciphertext form:
//! subtract slot-wise, square with one relinearized multiplication, then
//! broadcast the slot total with the rotate-accumulate ladder so every
//! slot carries Σᵢ (tᵢ − sᵢ)².

use crate::ckks::{Ciphertext, CkksContext, PublicContext};
use crate::params::ProtocolParams;
use crate::protocol::error::ProtocolError;

/// Computes the broadcast squared Euclidean distance.
///
/// Consumes one level for the square; the rotations run at the level the
/// square leaves behind, which the key bundle's rotation plan must cover.
pub fn encrypted_distance(
    ctx: &CkksContext,
    bundle: &PublicContext,
    protocol: &ProtocolParams,
    template: &Ciphertext,
    sample: &Ciphertext,
) -> Result<Ciphertext, ProtocolError> {
    let diff = ctx.sub(template, sample)?;
    let squared = ctx.rescale(&ctx.mul_relin(&diff, &diff, &bundle.relin)?)?;
    let dist = ctx.sum_slots(&squared, &protocol.slot_sum_steps(), &bundle.galois)?;
    Ok(dist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ckks::{decrypt, encrypt, generate_keys, RotationPlan, SecretKey};
    use crate::params::SchemeParams;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn setup(seed: u64) -> (CkksContext, ProtocolParams, SecretKey, PublicContext, ChaCha20Rng) {
        let ctx = CkksContext::new(SchemeParams::matching_default()).unwrap();
        let protocol = ProtocolParams::default_128();
        let plan = RotationPlan::slot_sum(&protocol.slot_sum_steps(), 1);
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let (sk, bundle) = generate_keys(&ctx, &plan, &mut rng);
        (ctx, protocol, sk, bundle, rng)
    }

    fn encrypt_values(
        ctx: &CkksContext,
        bundle: &PublicContext,
        values: &[f64],
        rng: &mut ChaCha20Rng,
    ) -> Ciphertext {
        let pt = ctx.encode(values, 0).unwrap();
        encrypt(ctx, &bundle.pk, &pt, rng).unwrap()
    }

    #[test]
    fn test_distance_broadcasts_squared_sum() {
        let (ctx, protocol, sk, bundle, mut rng) = setup(80);

        let template: Vec<f64> = (0..128).map(|j| (j % 13) as f64 / 4.0).collect();
        let sample: Vec<f64> = (0..128).map(|j| (j % 13) as f64 / 4.0 + ((j % 7) as f64 - 3.0) / 8.0).collect();
        let expected: f64 = template
            .iter()
            .zip(sample.iter())
            .map(|(t, s)| (t - s) * (t - s))
            .sum();

        let ct_t = encrypt_values(&ctx, &bundle, &template, &mut rng);
        let ct_s = encrypt_values(&ctx, &bundle, &sample, &mut rng);

        let dist = encrypted_distance(&ctx, &bundle, &protocol, &ct_t, &ct_s).unwrap();
        assert_eq!(dist.level, 1);

        let decoded = ctx.decode(&decrypt(&ctx, &sk, &dist).unwrap());
        for j in 0..128 {
            assert!(
                (decoded[j] - expected).abs() < 0.1,
                "slot {}: {} vs {}",
                j,
                decoded[j],
                expected
            );
        }
    }

    #[test]
    fn test_identical_vectors_give_zero_distance() {
        let (ctx, protocol, sk, bundle, mut rng) = setup(81);

        let features: Vec<f64> = (0..128).map(|j| (j as f64).sin() * 5.0).collect();
        let ct_t = encrypt_values(&ctx, &bundle, &features, &mut rng);
        let ct_s = encrypt_values(&ctx, &bundle, &features, &mut rng);

        let dist = encrypted_distance(&ctx, &bundle, &protocol, &ct_t, &ct_s).unwrap();
        let decoded = ctx.decode(&decrypt(&ctx, &sk, &dist).unwrap());
        for j in 0..128 {
            assert!(decoded[j].abs() < 0.05, "slot {}: {}", j, decoded[j]);
        }
    }
}
