//! Slot encoding between real vectors and ring elements.
//!
//! A ring of dimension d holds d/2 real slots. Encoding evaluates the
//! inverse canonical embedding restricted to real values: slot j lives at
//! the primitive 2d-th root of unity ζ^(5^j), and because the slot values
//! are real only the cosine component survives. Slot-wise addition and
//! multiplication of vectors then correspond to ring addition and
//! multiplication of their encodings, and the automorphism X -> X^(5^r)
//! cyclically rotates the slots by r.

use serde::{Deserialize, Serialize};

use crate::ckks::rns::RnsPoly;
use crate::math::poly::Poly;

/// Scaled encoding of a slot vector under a residue chain.
///
/// # Fields
///
/// * `poly` - Encoded polynomial
/// * `scale` - Scaling factor the slot values were multiplied by
/// * `level` - Chain level the encoding targets
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Plaintext {
    pub poly: RnsPoly,
    pub scale: f64,
    pub level: usize,
}

/// Precomputed tables for slot encoding and decoding.
///
/// # Fields
///
/// * `ring_dim` - Ring dimension d
/// * `slots` - Number of real slots, d/2
/// * `rot_group` - Powers 5^j mod 2d indexing the slot evaluation points
/// * `cos_table` - cos(π · 5^j · k / d) for slot j and coefficient k
#[derive(Clone, Debug)]
pub struct SlotEncoder {
    ring_dim: usize,
    slots: usize,
    rot_group: Vec<usize>,
    cos_table: Vec<Vec<f64>>,
}

impl SlotEncoder {
    /// Builds encoding tables for the given ring dimension.
    ///
    /// # Panics
    ///
    /// Panics if `ring_dim` is not a power of two of at least 4.
    pub fn new(ring_dim: usize) -> Self {
        assert!(
            ring_dim >= 4 && ring_dim.is_power_of_two(),
            "Ring dimension must be a power of two of at least 4"
        );
        let slots = ring_dim / 2;
        let two_d = 2 * ring_dim;

        let mut rot_group = Vec::with_capacity(slots);
        let mut power = 1usize;
        for _ in 0..slots {
            rot_group.push(power);
            power = (power * 5) % two_d;
        }

        let cos_table = rot_group
            .iter()
            .map(|&e| {
                (0..ring_dim)
                    .map(|k| {
                        let angle = std::f64::consts::PI * ((e * k) % two_d) as f64
                            / ring_dim as f64;
                        angle.cos()
                    })
                    .collect()
            })
            .collect();

        Self {
            ring_dim,
            slots,
            rot_group,
            cos_table,
        }
    }

    /// Number of real slots
    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Power 5^r mod 2d, the automorphism exponent rotating slots by r
    pub fn rotation_exponent(&self, steps: usize) -> usize {
        self.rot_group[steps % self.slots]
    }

    /// Encodes a real vector into a residue-chain polynomial.
    ///
    /// Values are scaled by `scale`, rounded to integers, and spread over
    /// the coefficients through the inverse embedding. Vectors shorter
    /// than the slot count are zero-padded.
    ///
    /// # Panics
    ///
    /// Panics if more values than slots are given or a scaled coefficient
    /// overflows the signed embedding.
    pub fn encode(&self, values: &[f64], scale: f64, moduli: &[u64]) -> RnsPoly {
        assert!(
            values.len() <= self.slots,
            "Too many values: {} for {} slots",
            values.len(),
            self.slots
        );

        let per_slot = scale / self.slots as f64;
        let mut coeffs = Vec::with_capacity(self.ring_dim);
        for k in 0..self.ring_dim {
            let mut acc = 0.0f64;
            for (j, &z) in values.iter().enumerate() {
                acc += z * self.cos_table[j][k];
            }
            let scaled = (per_slot * acc).round();
            assert!(
                scaled.abs() < (1i64 << 62) as f64,
                "Encoded coefficient overflows signed range"
            );
            coeffs.push(scaled as i64);
        }

        RnsPoly::from_signed(&coeffs, moduli)
    }

    /// Encodes the same scalar into every slot.
    ///
    /// A constant polynomial round(value · scale) carries the scalar in
    /// all slots at once, so no cosine evaluation is needed.
    pub fn encode_scalar(&self, value: f64, scale: f64, moduli: &[u64]) -> RnsPoly {
        let scaled = (value * scale).round();
        assert!(
            scaled.abs() < (1i64 << 62) as f64,
            "Encoded scalar overflows signed range"
        );
        let mut coeffs = vec![0i64; self.ring_dim];
        coeffs[0] = scaled as i64;
        RnsPoly::from_signed(&coeffs, moduli)
    }

    /// Decodes slot values from the anchor-limb residue.
    ///
    /// Only the first limb is read: decryption keeps the message small
    /// enough that its centered residue mod q_0 is the message itself.
    pub fn decode(&self, limb: &Poly, scale: f64) -> Vec<f64> {
        assert_eq!(limb.dimension(), self.ring_dim, "Dimension mismatch");
        assert!(!limb.is_ntt(), "Decode operates in coefficient domain");

        let signed = limb.to_signed_coeffs();
        (0..self.slots)
            .map(|j| {
                let mut acc = 0.0f64;
                for (k, &m) in signed.iter().enumerate() {
                    acc += m as f64 * self.cos_table[j][k];
                }
                acc / scale
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    const MODULI: [u64; 2] = [1152921504606830593, 1099511630849];
    const SCALE: f64 = 1099511627776.0; // 2^40

    #[test]
    fn test_encode_decode_roundtrip() {
        let encoder = SlotEncoder::new(256);
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let values: Vec<f64> = (0..128).map(|_| rng.gen_range(-1.0..1.0)).collect();

        let poly = encoder.encode(&values, SCALE, &MODULI);
        let decoded = encoder.decode(poly.limb(0), SCALE);

        for (orig, dec) in values.iter().zip(decoded.iter()) {
            assert!(
                (orig - dec).abs() < 1e-9,
                "slot drifted: {} vs {}",
                orig,
                dec
            );
        }
    }

    #[test]
    fn test_encode_pads_short_vectors() {
        let encoder = SlotEncoder::new(256);
        let poly = encoder.encode(&[0.5, -0.25], SCALE, &MODULI);
        let decoded = encoder.decode(poly.limb(0), SCALE);

        assert!((decoded[0] - 0.5).abs() < 1e-9);
        assert!((decoded[1] + 0.25).abs() < 1e-9);
        for &v in &decoded[2..] {
            assert!(v.abs() < 1e-9, "padding slot not zero: {}", v);
        }
    }

    #[test]
    fn test_scalar_fills_every_slot() {
        let encoder = SlotEncoder::new(256);
        let poly = encoder.encode_scalar(0.75, SCALE, &MODULI);
        let decoded = encoder.decode(poly.limb(0), SCALE);

        for &v in &decoded {
            assert!((v - 0.75).abs() < 1e-9);
        }
    }

    #[test]
    fn test_automorphism_rotates_slots() {
        let encoder = SlotEncoder::new(256);
        let values: Vec<f64> = (0..128).map(|j| j as f64 / 128.0).collect();

        let poly = encoder.encode(&values, SCALE, &MODULI);
        let rotated = poly.automorphism(encoder.rotation_exponent(3));
        let decoded = encoder.decode(rotated.limb(0), SCALE);

        for j in 0..128 {
            let expected = values[(j + 3) % 128];
            assert!(
                (decoded[j] - expected).abs() < 1e-9,
                "slot {} holds {} instead of {}",
                j,
                decoded[j],
                expected
            );
        }
    }

    #[test]
    fn test_slotwise_product_matches_ring_product() {
        use crate::math::ntt::NttContext;

        let moduli = [1152921504606830593u64];
        let encoder = SlotEncoder::new(256);
        let ntts = vec![NttContext::new(256, moduli[0])];

        let a: Vec<f64> = (0..128).map(|j| 0.3 + 0.001 * j as f64).collect();
        let b: Vec<f64> = (0..128).map(|j| -0.2 + 0.002 * j as f64).collect();

        // Keep the product scale S^2 well inside q_0
        let scale = 67108864.0; // 2^26
        let pa = encoder.encode(&a, scale, &moduli);
        let pb = encoder.encode(&b, scale, &moduli);
        let prod = pa.mul_ntt(&pb, &ntts);

        let decoded = encoder.decode(prod.limb(0), scale * scale);
        for j in 0..128 {
            assert!(
                (decoded[j] - a[j] * b[j]).abs() < 1e-3,
                "slot {}: {} vs {}",
                j,
                decoded[j],
                a[j] * b[j]
            );
        }
    }

    #[test]
    fn test_rotation_exponent_generates_group() {
        let encoder = SlotEncoder::new(256);
        assert_eq!(encoder.rotation_exponent(0), 1);
        assert_eq!(encoder.rotation_exponent(1), 5);
        assert_eq!(encoder.rotation_exponent(2), 25);
        // The group has order d/2, so rotating by the slot count is the identity
        assert_eq!(encoder.rotation_exponent(128), 1);
    }
}
