//! The full compare pipeline.
//!
//! Chains the encrypted stages end to end: distance, normalization, sign
//! refinement, indicator wrap, secret-slot masking, decoys. The chain
//! consumes exactly the thirteen levels the default modulus chain
//! provides, landing the result on the anchor limb alone.

use rand::Rng;

use crate::ckks::{Ciphertext, CkksContext, PublicContext, RotationPlan};
use crate::params::ProtocolParams;
use crate::protocol::distance::encrypted_distance;
use crate::protocol::error::ProtocolError;
use crate::protocol::indicator::{normalize, sign_refine, to_indicator};
use crate::protocol::masking::{apply_decoys, decoy_field, draw_secret_index, mask_to_slot};
use crate::protocol::vector::EncryptedVector;
use crate::protocol::verify::IndexRecord;

/// A completed compare: the encrypted score vector to return to the
/// client and the secret record of where the true score went.
#[derive(Debug)]
pub struct CompareOutcome {
    pub result: Ciphertext,
    pub record: IndexRecord,
}

/// Rotation plan covering every rotation the compare pipeline performs.
///
/// The slot sum runs right after the squaring rescale, so all of its
/// rotations happen at level 1. Evaluation key bundles are validated
/// against this plan before a compare is attempted.
pub fn compare_plan(protocol: &ProtocolParams) -> RotationPlan {
    RotationPlan::slot_sum(&protocol.slot_sum_steps(), 1)
}

/// Runs the whole compare between an enrolled template and a fresh sample.
///
/// Both vectors are linked against the context first. The drawn slot
/// index never appears in the returned ciphertext in the clear; it lives
/// only in the outcome's record.
pub fn run_compare<R: Rng>(
    ctx: &CkksContext,
    bundle: &PublicContext,
    protocol: &ProtocolParams,
    template: &EncryptedVector,
    sample: &EncryptedVector,
    rng: &mut R,
) -> Result<CompareOutcome, ProtocolError> {
    template.link(ctx, protocol)?;
    sample.link(ctx, protocol)?;

    let dist = encrypted_distance(ctx, bundle, protocol, &template.ct, &sample.ct)?;
    let x = normalize(ctx, &dist, protocol)?;
    let y = sign_refine(ctx, &x, &bundle.relin)?;
    let score = to_indicator(ctx, &y)?;

    let index = draw_secret_index(protocol, rng);
    let masked = mask_to_slot(ctx, &score, index, protocol)?;
    let decoys = decoy_field(protocol, rng)?;
    let result = apply_decoys(ctx, &masked, decoys, index)?;

    Ok(CompareOutcome {
        result,
        record: IndexRecord::new(index),
    })
}
