//! Polynomial sign approximation of the threshold decision.
//!
//! The broadcast distance is shifted by the threshold and normalized into
//! [-1, 1], then pushed toward ±1 by three compositions of the odd cubic
//! f(x) = 1.5x − 0.5x³, whose fixed points at ±1 attract the whole open
//! interval. The affine wrap (1 − y)/2 finally maps match → ≈1 and
//! non-match → ≈0.
//!
//! Each cubic evaluates as x·(1.5 − 0.5x²) without any cross-path
//! ciphertext addition, so intermediate scales never have to be
//! reconciled. One composition costs three levels; the whole refinement
//! nine.

use crate::ckks::{Ciphertext, CkksContext, RelinKeys, SchemeError};
use crate::params::ProtocolParams;
use crate::protocol::error::ProtocolError;

/// Shifts by the decision threshold and normalizes: x = (d − t) · c.
///
/// With the default contract (t = 100, c = 1/300) convergent distances
/// land in the cubic's basin: d = 0 maps to −1/3, d = 400 to +1.
pub fn normalize(
    ctx: &CkksContext,
    dist: &Ciphertext,
    protocol: &ProtocolParams,
) -> Result<Ciphertext, ProtocolError> {
    let shifted = ctx.add_scalar(dist, -protocol.threshold)?;
    Ok(ctx.mul_scalar(&shifted, protocol.scale_factor)?)
}

/// One cubic composition: x ← x · (1.5 − 0.5x²), three levels deep.
fn cubic_step(
    ctx: &CkksContext,
    x: &Ciphertext,
    relin: &RelinKeys,
) -> Result<Ciphertext, SchemeError> {
    let half_x = ctx.mul_scalar(x, 0.5)?;
    let x1 = ctx.drop_to(x, half_x.level)?;
    let half_sq = ctx.rescale(&ctx.mul_relin(&x1, &half_x, relin)?)?;

    let coeff = ctx.encode_scalar_with_scale(1.5, half_sq.scale, half_sq.level)?;
    let inner = ctx.sub_from_plain(&coeff, &half_sq)?;

    let x2 = ctx.drop_to(x, inner.level)?;
    ctx.rescale(&ctx.mul_relin(&x2, &inner, relin)?)
}

/// Triple composition of the sign-refining cubic.
pub fn sign_refine(
    ctx: &CkksContext,
    x: &Ciphertext,
    relin: &RelinKeys,
) -> Result<Ciphertext, ProtocolError> {
    let mut y = cubic_step(ctx, x, relin)?;
    y = cubic_step(ctx, &y, relin)?;
    y = cubic_step(ctx, &y, relin)?;
    Ok(y)
}

/// Maps the refined sign into [0, 1]: score = (1 − y)/2.
pub fn to_indicator(ctx: &CkksContext, y: &Ciphertext) -> Result<Ciphertext, ProtocolError> {
    let one = ctx.encode_scalar_with_scale(1.0, y.scale, y.level)?;
    let flipped = ctx.sub_from_plain(&one, y)?;
    Ok(ctx.mul_scalar(&flipped, 0.5)?)
}
