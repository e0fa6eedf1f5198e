//! Homomorphic evaluation.
//!
//! Slot-wise addition and multiplication, scale management, and slot
//! rotation, all as methods on the context. Binary operations insist that
//! both sides carry the same context fingerprint and level; addition also
//! insists on bit-identical scales, since adding ciphertexts at drifted
//! scales would silently skew every slot.
//!
//! Multiplication leaves the scale squared; callers rescale afterwards.
//! `mul_scalar` is the exception: it folds the rescale in and encodes the
//! scalar against the prime about to be dropped, so its output keeps the
//! input scale bit for bit.

use crate::ckks::context::CkksContext;
use crate::ckks::encoding::Plaintext;
use crate::ckks::error::SchemeError;
use crate::ckks::keys::{GaloisKeys, RelinKeys};
use crate::ckks::types::Ciphertext;

impl CkksContext {
    fn check_ct(&self, ct: &Ciphertext) -> Result<(), SchemeError> {
        if ct.context_id != self.context_id {
            return Err(SchemeError::ContextMismatch {
                left: ct.context_id,
                right: self.context_id,
            });
        }
        Ok(())
    }

    fn check_pair(&self, a: &Ciphertext, b: &Ciphertext) -> Result<(), SchemeError> {
        self.check_ct(a)?;
        self.check_ct(b)?;
        if a.level != b.level {
            return Err(SchemeError::LevelMismatch {
                left: a.level,
                right: b.level,
            });
        }
        Ok(())
    }

    fn check_plain(&self, a: &Ciphertext, pt: &Plaintext) -> Result<(), SchemeError> {
        self.check_ct(a)?;
        if a.level != pt.level {
            return Err(SchemeError::LevelMismatch {
                left: a.level,
                right: pt.level,
            });
        }
        Ok(())
    }

    /// Slot-wise sum of two ciphertexts at the same level and scale.
    pub fn add(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext, SchemeError> {
        self.check_pair(a, b)?;
        if a.scale != b.scale {
            return Err(SchemeError::ScaleMismatch {
                left: a.scale,
                right: b.scale,
            });
        }
        Ok(Ciphertext::from_parts(
            a.c0.add(&b.c0),
            a.c1.add(&b.c1),
            a.level,
            a.scale,
            self.context_id,
        ))
    }

    /// Slot-wise difference of two ciphertexts at the same level and scale.
    pub fn sub(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext, SchemeError> {
        self.check_pair(a, b)?;
        if a.scale != b.scale {
            return Err(SchemeError::ScaleMismatch {
                left: a.scale,
                right: b.scale,
            });
        }
        Ok(Ciphertext::from_parts(
            a.c0.sub(&b.c0),
            a.c1.sub(&b.c1),
            a.level,
            a.scale,
            self.context_id,
        ))
    }

    /// Slot-wise negation.
    pub fn negate(&self, a: &Ciphertext) -> Result<Ciphertext, SchemeError> {
        self.check_ct(a)?;
        Ok(Ciphertext::from_parts(
            a.c0.negate(),
            a.c1.negate(),
            a.level,
            a.scale,
            self.context_id,
        ))
    }

    /// Adds an encoded plaintext; scales must match exactly.
    pub fn add_plain(&self, a: &Ciphertext, pt: &Plaintext) -> Result<Ciphertext, SchemeError> {
        self.check_plain(a, pt)?;
        if a.scale != pt.scale {
            return Err(SchemeError::ScaleMismatch {
                left: a.scale,
                right: pt.scale,
            });
        }
        Ok(Ciphertext::from_parts(
            a.c0.add(&pt.poly),
            a.c1.clone(),
            a.level,
            a.scale,
            self.context_id,
        ))
    }

    /// Computes pt - a slot-wise; scales must match exactly.
    pub fn sub_from_plain(
        &self,
        pt: &Plaintext,
        a: &Ciphertext,
    ) -> Result<Ciphertext, SchemeError> {
        self.check_plain(a, pt)?;
        if a.scale != pt.scale {
            return Err(SchemeError::ScaleMismatch {
                left: a.scale,
                right: pt.scale,
            });
        }
        Ok(Ciphertext::from_parts(
            pt.poly.sub(&a.c0),
            a.c1.negate(),
            a.level,
            a.scale,
            self.context_id,
        ))
    }

    /// Slot-wise product with an encoded plaintext.
    ///
    /// The result's scale is the product of both scales; rescale afterwards.
    pub fn mul_plain(&self, a: &Ciphertext, pt: &Plaintext) -> Result<Ciphertext, SchemeError> {
        self.check_plain(a, pt)?;
        let ntts = self.active_ntts(a.level);
        Ok(Ciphertext::from_parts(
            a.c0.mul_ntt(&pt.poly, ntts),
            a.c1.mul_ntt(&pt.poly, ntts),
            a.level,
            a.scale * pt.scale,
            self.context_id,
        ))
    }

    /// Slot-wise product of two ciphertexts, relinearized back to two
    /// components.
    ///
    /// The tensor product decrypts under (1, s, s²); the level's
    /// relinearization key folds the s² component back. The result's scale
    /// is the product of both scales; rescale afterwards.
    pub fn mul_relin(
        &self,
        a: &Ciphertext,
        b: &Ciphertext,
        relin: &RelinKeys,
    ) -> Result<Ciphertext, SchemeError> {
        self.check_pair(a, b)?;
        if relin.context_id != self.context_id {
            return Err(SchemeError::ContextMismatch {
                left: relin.context_id,
                right: self.context_id,
            });
        }
        let key = relin
            .at_level(a.level)
            .ok_or(SchemeError::MissingRelinKey { level: a.level })?;

        let ntts = self.active_ntts(a.level);
        let a0 = a.c0.to_ntt_new(ntts);
        let a1 = a.c1.to_ntt_new(ntts);
        let b0 = b.c0.to_ntt_new(ntts);
        let b1 = b.c1.to_ntt_new(ntts);

        let d0 = a0.mul_ntt_domain(&b0, ntts).from_ntt_new(ntts);
        let d1 = a0
            .mul_ntt_domain(&b1, ntts)
            .add(&a1.mul_ntt_domain(&b0, ntts))
            .from_ntt_new(ntts);
        let d2 = a1.mul_ntt_domain(&b1, ntts).from_ntt_new(ntts);

        let (kb, ka) = key.apply(self, &d2);

        Ok(Ciphertext::from_parts(
            d0.add(&kb),
            d1.add(&ka),
            a.level,
            a.scale * b.scale,
            self.context_id,
        ))
    }

    /// Divides out the last active chain prime, advancing one level.
    ///
    /// The slot values are unchanged; the scale is divided by the dropped
    /// prime. Called after every multiplication to bring the scale back
    /// near Δ.
    pub fn rescale(&self, a: &Ciphertext) -> Result<Ciphertext, SchemeError> {
        self.check_ct(a)?;
        let dropped = self.next_rescale_prime(a.level)?;
        let table = self.rescale_table(a.limb_count());
        Ok(Ciphertext::from_parts(
            a.c0.rescale_last(table),
            a.c1.rescale_last(table),
            a.level + 1,
            a.scale / dropped as f64,
            self.context_id,
        ))
    }

    /// Multiplies every slot by a scalar without changing the scale.
    ///
    /// The scalar is encoded against the prime the fused rescale drops, so
    /// the division restores the input scale exactly. Advances one level.
    pub fn mul_scalar(&self, a: &Ciphertext, value: f64) -> Result<Ciphertext, SchemeError> {
        self.check_ct(a)?;
        let dropped = self.next_rescale_prime(a.level)?;

        let factor = (value * dropped as f64).round();
        assert!(
            factor.abs() < (1i64 << 62) as f64,
            "Scalar overflows signed range"
        );
        let factor = factor as i64;

        let table = self.rescale_table(a.limb_count());
        Ok(Ciphertext::from_parts(
            a.c0.scalar_mul_signed(factor).rescale_last(table),
            a.c1.scalar_mul_signed(factor).rescale_last(table),
            a.level + 1,
            a.scale,
            self.context_id,
        ))
    }

    /// Adds a scalar to every slot.
    pub fn add_scalar(&self, a: &Ciphertext, value: f64) -> Result<Ciphertext, SchemeError> {
        self.check_ct(a)?;
        let pt = self
            .encoder
            .encode_scalar(value, a.scale, self.params.active_moduli(a.level));
        Ok(Ciphertext::from_parts(
            a.c0.add(&pt),
            a.c1.clone(),
            a.level,
            a.scale,
            self.context_id,
        ))
    }

    /// Drops a ciphertext to a deeper level without touching its values.
    ///
    /// Aligns operands produced along paths of different depth.
    pub fn drop_to(&self, a: &Ciphertext, level: usize) -> Result<Ciphertext, SchemeError> {
        self.check_ct(a)?;
        self.check_level(level)?;
        if level < a.level {
            return Err(SchemeError::LevelMismatch {
                left: a.level,
                right: level,
            });
        }
        let m = self.limb_count(level);
        Ok(Ciphertext::from_parts(
            a.c0.truncated(m),
            a.c1.truncated(m),
            level,
            a.scale,
            self.context_id,
        ))
    }

    /// Rotates slots left by `steps` using the matching rotation key.
    ///
    /// Applies the automorphism X -> X^(5^steps) to both components, then
    /// key-switches the rotated c1 back under s. Scale and level are
    /// unchanged.
    pub fn rotate(
        &self,
        a: &Ciphertext,
        steps: usize,
        galois: &GaloisKeys,
    ) -> Result<Ciphertext, SchemeError> {
        self.check_ct(a)?;
        if galois.context_id != self.context_id {
            return Err(SchemeError::ContextMismatch {
                left: galois.context_id,
                right: self.context_id,
            });
        }
        if steps % self.slot_count() == 0 {
            return Ok(a.clone());
        }
        let key = galois
            .get(steps, a.level)
            .ok_or(SchemeError::MissingRotationKey {
                step: steps,
                level: a.level,
            })?;

        let g = self.encoder.rotation_exponent(steps);
        let r0 = a.c0.automorphism(g);
        let r1 = a.c1.automorphism(g);

        let (kb, ka) = key.apply(self, &r1);

        Ok(Ciphertext::from_parts(
            r0.add(&kb),
            ka,
            a.level,
            a.scale,
            self.context_id,
        ))
    }

    /// Replaces every slot with the sum over all slots.
    ///
    /// Runs the rotate-and-add ladder over the given steps; for the full
    /// power-of-two ladder 1, 2, 4, ..., d/4 every slot ends up holding
    /// the total.
    pub fn sum_slots(
        &self,
        a: &Ciphertext,
        steps: &[usize],
        galois: &GaloisKeys,
    ) -> Result<Ciphertext, SchemeError> {
        let mut acc = a.clone();
        for &step in steps {
            let rotated = self.rotate(&acc, step, galois)?;
            acc = self.add(&acc, &rotated)?;
        }
        Ok(acc)
    }
}
