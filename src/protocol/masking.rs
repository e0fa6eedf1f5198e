//! Secret-slot masking and decoy noise.
//!
//! The true score survives in exactly one randomly drawn slot; a one-hot
//! plaintext multiply zeroes the other 127. The zeroed slots then receive
//! plaintext decoy values drawn from a sub-threshold Gamma distribution,
//! so the decrypted vector offers no positional hint of where the real
//! score lives. Decoys are capped strictly below the claim cutoff; a
//! single over-cap draw rejects the whole vector.

use rand::Rng;
use rand_distr::{Distribution, Gamma};

use crate::ckks::{Ciphertext, CkksContext};
use crate::params::ProtocolParams;
use crate::protocol::error::ProtocolError;

/// Draws the secret slot index uniformly from the protocol dimension.
pub fn draw_secret_index<R: Rng>(protocol: &ProtocolParams, rng: &mut R) -> usize {
    rng.gen_range(0..protocol.dim)
}

/// Zeroes every slot except the secret one.
///
/// Consumes the final chain level: the one-hot plaintext multiply is
/// rescaled so the result sits on the anchor limb alone.
pub fn mask_to_slot(
    ctx: &CkksContext,
    score: &Ciphertext,
    index: usize,
    protocol: &ProtocolParams,
) -> Result<Ciphertext, ProtocolError> {
    debug_assert!(index < protocol.dim, "Secret index out of range");

    let mut mask = vec![0.0; protocol.dim];
    mask[index] = 1.0;
    let pt = ctx.encode(&mask, score.level)?;
    Ok(ctx.rescale(&ctx.mul_plain(score, &pt)?)?)
}

/// Samples a full decoy vector under the cap.
///
/// Draws dim i.i.d. Gamma(shape, 1/rate) values; any draw at or above
/// `noise_cap` rejects the whole vector. Gives up after the configured
/// retry budget instead of looping forever.
pub fn decoy_field<R: Rng>(
    protocol: &ProtocolParams,
    rng: &mut R,
) -> Result<Vec<f64>, ProtocolError> {
    let gamma = Gamma::new(protocol.gamma_shape, 1.0 / protocol.gamma_rate)
        .map_err(|e| ProtocolError::InvalidContext(format!("decoy distribution: {e}")))?;

    for _ in 0..protocol.noise_retries {
        let draws: Vec<f64> = (0..protocol.dim).map(|_| gamma.sample(rng)).collect();
        if draws.iter().all(|&v| v < protocol.noise_cap) {
            return Ok(draws);
        }
    }
    Err(ProtocolError::NoiseSamplingExhausted {
        retries: protocol.noise_retries,
    })
}

/// Adds the decoy field to a masked score vector.
///
/// The secret slot's decoy is forced to zero first, so the true score
/// passes through unchanged. Decoys ride in as a plaintext at the
/// ciphertext's exact scale and cost no level.
pub fn apply_decoys(
    ctx: &CkksContext,
    masked: &Ciphertext,
    mut decoys: Vec<f64>,
    index: usize,
) -> Result<Ciphertext, ProtocolError> {
    decoys[index] = 0.0;
    let pt = ctx.encode_with_scale(&decoys, masked.scale, masked.level)?;
    Ok(ctx.add_plain(masked, &pt)?)
}
