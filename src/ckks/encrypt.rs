//! Encryption and decryption.
//!
//! Public-key encryption masks the plaintext with a ternary-randomized
//! copy of the public key: c0 = b·u + e0 + m and c1 = a·u + e1, so the
//! phase c0 + c1·s is m plus a small error. Decryption reads the anchor
//! limb alone; the protocol keeps every decrypted message far inside the
//! anchor prime, so its centered residue there already is the message.

use rand::Rng;

use crate::ckks::context::CkksContext;
use crate::ckks::encoding::Plaintext;
use crate::ckks::error::SchemeError;
use crate::ckks::rns::RnsPoly;
use crate::ckks::types::{Ciphertext, PublicKey, SecretKey};
use crate::math::gaussian::GaussianSampler;

/// Encrypts a plaintext under the public key.
///
/// # Arguments
///
/// * `pk` - Public key generated under the same context
/// * `pt` - Encoded plaintext; its level decides how many limbs the
///   ciphertext starts with
///
/// # Example
///
/// ```
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha20Rng;
/// use veilmatch::ckks::{decrypt, encrypt, CkksContext, PublicKey, SecretKey};
/// use veilmatch::params::SchemeParams;
///
/// let ctx = CkksContext::new(SchemeParams::matching_default()).unwrap();
/// let mut rng = ChaCha20Rng::seed_from_u64(0);
/// let sk = SecretKey::generate(&ctx, &mut rng);
/// let pk = PublicKey::generate(&ctx, &sk, &mut rng);
///
/// let pt = ctx.encode(&[0.25, -0.5], 0).unwrap();
/// let ct = encrypt(&ctx, &pk, &pt, &mut rng).unwrap();
/// let decoded = ctx.decode(&decrypt(&ctx, &sk, &ct).unwrap());
/// assert!((decoded[0] - 0.25).abs() < 1e-6);
/// assert!((decoded[1] + 0.5).abs() < 1e-6);
/// ```
pub fn encrypt<R: Rng>(
    ctx: &CkksContext,
    pk: &PublicKey,
    pt: &Plaintext,
    rng: &mut R,
) -> Result<Ciphertext, SchemeError> {
    if pk.context_id != ctx.context_id {
        return Err(SchemeError::ContextMismatch {
            left: pk.context_id,
            right: ctx.context_id,
        });
    }
    ctx.check_level(pt.level)?;

    let m = ctx.limb_count(pt.level);
    let moduli = ctx.params.active_moduli(pt.level);
    let ntts = ctx.active_ntts(pt.level);
    let dim = ctx.params.ring_dim;
    let sampler = GaussianSampler::new(ctx.params.sigma);

    let u = RnsPoly::ternary(dim, moduli, rng);
    let e0 = RnsPoly::gaussian(&sampler, dim, moduli, rng);
    let e1 = RnsPoly::gaussian(&sampler, dim, moduli, rng);

    let c0 = pk
        .b
        .truncated(m)
        .mul_ntt(&u, ntts)
        .add(&e0)
        .add(&pt.poly);
    let c1 = pk.a.truncated(m).mul_ntt(&u, ntts).add(&e1);

    Ok(Ciphertext::from_parts(
        c0,
        c1,
        pt.level,
        pt.scale,
        ctx.context_id,
    ))
}

/// Decrypts a ciphertext to a single-limb plaintext.
///
/// Computes the phase c0 + c1·s on the anchor limb only. The returned
/// plaintext carries the ciphertext's scale and level and is meant to be
/// decoded, not fed back into evaluation.
pub fn decrypt(
    ctx: &CkksContext,
    sk: &SecretKey,
    ct: &Ciphertext,
) -> Result<Plaintext, SchemeError> {
    if sk.context_id != ctx.context_id {
        return Err(SchemeError::ContextMismatch {
            left: sk.context_id,
            right: ctx.context_id,
        });
    }
    if ct.context_id != ctx.context_id {
        return Err(SchemeError::ContextMismatch {
            left: ct.context_id,
            right: ctx.context_id,
        });
    }

    let anchor = &ctx.ntts[0];
    let phase = ct.c0.limb(0) + &ct.c1.limb(0).mul_ntt(sk.s.limb(0), anchor);

    Ok(Plaintext {
        poly: RnsPoly::from_limbs(vec![phase]),
        scale: ct.scale,
        level: ct.level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SchemeParams;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn make_ctx() -> CkksContext {
        CkksContext::new(SchemeParams::matching_default()).unwrap()
    }

    fn keypair(ctx: &CkksContext, seed: u64) -> (SecretKey, PublicKey, ChaCha20Rng) {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let sk = SecretKey::generate(ctx, &mut rng);
        let pk = PublicKey::generate(ctx, &sk, &mut rng);
        (sk, pk, rng)
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let ctx = make_ctx();
        let (sk, pk, mut rng) = keypair(&ctx, 40);

        let values: Vec<f64> = (0..128).map(|j| (j as f64 - 64.0) / 10.0).collect();
        let pt = ctx.encode(&values, 0).unwrap();
        let ct = encrypt(&ctx, &pk, &pt, &mut rng).unwrap();

        assert_eq!(ct.limb_count(), 14);
        assert_eq!(ct.level, 0);
        assert_eq!(ct.scale, ctx.scale());

        let decoded = ctx.decode(&decrypt(&ctx, &sk, &ct).unwrap());
        for (orig, dec) in values.iter().zip(decoded.iter()) {
            assert!((orig - dec).abs() < 1e-6, "{} vs {}", orig, dec);
        }
    }

    #[test]
    fn test_encrypt_at_deep_level() {
        let ctx = make_ctx();
        let (sk, pk, mut rng) = keypair(&ctx, 41);

        let pt = ctx.encode(&[3.5, -2.25], 12).unwrap();
        let ct = encrypt(&ctx, &pk, &pt, &mut rng).unwrap();
        assert_eq!(ct.limb_count(), 2);

        let decoded = ctx.decode(&decrypt(&ctx, &sk, &ct).unwrap());
        assert!((decoded[0] - 3.5).abs() < 1e-6);
        assert!((decoded[1] + 2.25).abs() < 1e-6);
    }

    #[test]
    fn test_fresh_noise_is_small() {
        let ctx = make_ctx();
        let (sk, pk, mut rng) = keypair(&ctx, 42);

        let pt = ctx.encode(&[1.0], 0).unwrap();
        let ct = encrypt(&ctx, &pk, &pt, &mut rng).unwrap();
        let phase = decrypt(&ctx, &sk, &ct).unwrap();

        // Noise is u·e_pk + e0 + e1·s, two length-256 ternary convolutions
        // plus one fresh error
        let diff = phase.poly.limb(0) - pt.poly.limb(0);
        let bound = 2 * 256 * 20 + 20;
        assert!(diff.linf_norm() <= bound as u64, "noise {}", diff.linf_norm());
    }

    #[test]
    fn test_foreign_key_rejected() {
        let ctx = make_ctx();
        let (sk, _, mut rng) = keypair(&ctx, 43);

        let mut other_params = SchemeParams::matching_default();
        other_params.scale_bits = 39;
        let other_ctx = CkksContext::new(other_params).unwrap();
        let (_, other_pk, _) = keypair(&other_ctx, 44);

        let pt = ctx.encode(&[1.0], 0).unwrap();
        assert!(matches!(
            encrypt(&ctx, &other_pk, &pt, &mut rng),
            Err(SchemeError::ContextMismatch { .. })
        ));

        let other_pt = other_ctx.encode(&[1.0], 0).unwrap();
        let other_pk2 = {
            let (_, pk2, _) = keypair(&other_ctx, 45);
            pk2
        };
        let other_ct = encrypt(&other_ctx, &other_pk2, &other_pt, &mut rng).unwrap();
        assert!(matches!(
            decrypt(&ctx, &sk, &other_ct),
            Err(SchemeError::ContextMismatch { .. })
        ));
    }
}
