//! Discrete Gaussian and ternary sampling
//!
//! Provides samplers for the distributions key generation and encryption
//! draw from: discrete Gaussians over Z for error terms, and uniform
//! ternary vectors for secret keys.
//!
//! Samplers hold distribution parameters only; every call takes the RNG as
//! an argument, so callers decide whether randomness comes from the OS or
//! from a seeded generator.

use rand::Rng;

use super::poly::Poly;

/// Default Gaussian standard deviation
pub const DEFAULT_SIGMA: f64 = 3.2;

/// Discrete Gaussian sampler over Z using rejection sampling
#[derive(Debug, Clone, Copy)]
pub struct GaussianSampler {
    /// Standard deviation σ
    sigma: f64,
    /// Tailcut: reject samples beyond this many standard deviations
    tailcut: i64,
}

impl GaussianSampler {
    /// Create a new Gaussian sampler with given standard deviation
    pub fn new(sigma: f64) -> Self {
        let tailcut = (sigma * 6.0).ceil() as i64;
        Self { sigma, tailcut }
    }

    /// Get the standard deviation
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Sample a single value from the discrete Gaussian D_σ
    /// Returns a signed integer in centered representation
    pub fn sample<R: Rng>(&self, rng: &mut R) -> i64 {
        let sigma_sq_2 = 2.0 * self.sigma * self.sigma;
        let bound = self.tailcut;

        loop {
            // Sample uniformly from [-bound, bound]
            let x = rng.gen_range(-bound..=bound);

            // Accept with probability proportional to exp(-x²/(2σ²))
            let x_sq = (x * x) as f64;
            let prob = (-x_sq / sigma_sq_2).exp();

            let u: f64 = rng.gen();
            if u < prob {
                return x;
            }
        }
    }

    /// Sample a vector of Gaussian values
    pub fn sample_vec<R: Rng>(&self, len: usize, rng: &mut R) -> Vec<i64> {
        (0..len).map(|_| self.sample(rng)).collect()
    }

    /// Sample an error polynomial with Gaussian coefficients embedded in Z_q
    pub fn sample_poly<R: Rng>(&self, dim: usize, q: u64, rng: &mut R) -> Poly {
        let coeffs = self.sample_vec(dim, rng);
        Poly::from_signed_coeffs(&coeffs, q)
    }
}

/// Sample a uniform ternary polynomial with coefficients in {-1, 0, 1}.
///
/// Used for secret keys: the small norm keeps decryption noise growth and
/// the key-switching error both manageable.
pub fn sample_ternary_poly<R: Rng>(dim: usize, q: u64, rng: &mut R) -> Poly {
    let coeffs: Vec<i64> = (0..dim).map(|_| rng.gen_range(-1..=1)).collect();
    Poly::from_signed_coeffs(&coeffs, q)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::mod_q::DEFAULT_Q;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use std::collections::HashMap;

    #[test]
    fn test_deterministic_seeding() {
        let sampler = GaussianSampler::new(DEFAULT_SIGMA);
        let mut rng1 = ChaCha20Rng::seed_from_u64(12345);
        let mut rng2 = ChaCha20Rng::seed_from_u64(12345);

        for _ in 0..100 {
            assert_eq!(sampler.sample(&mut rng1), sampler.sample(&mut rng2));
        }
    }

    #[test]
    fn test_different_seeds() {
        let sampler = GaussianSampler::new(DEFAULT_SIGMA);
        let mut rng1 = ChaCha20Rng::seed_from_u64(12345);
        let mut rng2 = ChaCha20Rng::seed_from_u64(54321);

        let samples1: Vec<i64> = (0..100).map(|_| sampler.sample(&mut rng1)).collect();
        let samples2: Vec<i64> = (0..100).map(|_| sampler.sample(&mut rng2)).collect();

        assert_ne!(samples1, samples2);
    }

    #[test]
    fn test_tailcut_bounds() {
        let sigma = 3.2;
        let sampler = GaussianSampler::new(sigma);
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let tailcut_bound = (6.0 * sigma).ceil() as i64;

        for _ in 0..100_000 {
            let s = sampler.sample(&mut rng);
            assert!(
                s.abs() <= tailcut_bound,
                "Sample {} exceeds 6σ bound of {}",
                s,
                tailcut_bound
            );
        }
    }

    #[test]
    fn test_distribution_symmetry() {
        let sampler = GaussianSampler::new(DEFAULT_SIGMA);
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let n = 100_000;

        let mut pos_count = 0;
        let mut neg_count = 0;
        let mut zero_count = 0;

        for _ in 0..n {
            let s = sampler.sample(&mut rng);
            if s > 0 {
                pos_count += 1;
            } else if s < 0 {
                neg_count += 1;
            } else {
                zero_count += 1;
            }
        }

        let ratio = pos_count as f64 / neg_count as f64;
        assert!(
            (ratio - 1.0).abs() < 0.05,
            "Distribution not symmetric: pos={}, neg={}, ratio={}",
            pos_count,
            neg_count,
            ratio
        );

        assert!(zero_count > n / 50, "Zero count {} is too low", zero_count);
    }

    #[test]
    fn test_distribution_variance() {
        let sampler = GaussianSampler::new(DEFAULT_SIGMA);
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let n = 100_000;

        let samples: Vec<i64> = (0..n).map(|_| sampler.sample(&mut rng)).collect();
        let mean: f64 = samples.iter().map(|&x| x as f64).sum::<f64>() / n as f64;
        let variance: f64 = samples
            .iter()
            .map(|&x| {
                let diff = x as f64 - mean;
                diff * diff
            })
            .sum::<f64>()
            / n as f64;

        let expected_variance = DEFAULT_SIGMA * DEFAULT_SIGMA;
        let relative_error = (variance - expected_variance).abs() / expected_variance;

        assert!(
            relative_error < 0.1,
            "Variance {} differs from expected {} by {:.1}%",
            variance,
            expected_variance,
            relative_error * 100.0
        );
    }

    #[test]
    fn test_distribution_shape() {
        let sampler = GaussianSampler::new(DEFAULT_SIGMA);
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let n = 100_000;

        let mut histogram: HashMap<i64, usize> = HashMap::new();
        for _ in 0..n {
            let s = sampler.sample(&mut rng);
            *histogram.entry(s).or_insert(0) += 1;
        }

        let count_0 = *histogram.get(&0).unwrap_or(&0);
        let count_5 = *histogram.get(&5).unwrap_or(&0) + *histogram.get(&-5).unwrap_or(&0);
        let count_10 = *histogram.get(&10).unwrap_or(&0) + *histogram.get(&-10).unwrap_or(&0);

        assert!(
            count_0 > count_5,
            "0 should be more frequent than ±5: {} vs {}",
            count_0,
            count_5
        );
        assert!(
            count_5 > count_10,
            "±5 should be more frequent than ±10: {} vs {}",
            count_5,
            count_10
        );
    }

    #[test]
    fn test_sample_poly_centered() {
        let sampler = GaussianSampler::new(DEFAULT_SIGMA);
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let q = DEFAULT_Q;

        let p = sampler.sample_poly(256, q, &mut rng);
        assert_eq!(p.dimension(), 256);
        assert!(p.linf_norm() <= (6.0 * DEFAULT_SIGMA).ceil() as u64);
    }

    #[test]
    fn test_ternary_poly_coefficients() {
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let q = DEFAULT_Q;

        let p = sample_ternary_poly(256, q, &mut rng);
        for &c in p.coeffs() {
            assert!(c == 0 || c == 1 || c == q - 1, "coefficient {} not ternary", c);
        }
    }

    #[test]
    fn test_ternary_poly_balanced() {
        let mut rng = ChaCha20Rng::seed_from_u64(13);
        let q = DEFAULT_Q;
        let n = 30_000;

        let p = sample_ternary_poly(n, q, &mut rng);
        let zeros = p.coeffs().iter().filter(|&&c| c == 0).count();

        // Each symbol should appear about a third of the time
        assert!(zeros > n / 4 && zeros < n / 2, "zero count {} is skewed", zeros);
    }
}
