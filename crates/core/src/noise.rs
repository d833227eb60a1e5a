//! Synthetic noisy-data generation.
//!
//! Given the exact blurred signal `Ax`, the generator draws i.i.d.
//! Gaussian noise calibrated so the expected noise energy is a fixed
//! percentage of the signal energy:
//!
//! ```text
//! sigma = (err_lvl / 100) · ||Ax||_F / sqrt(n)
//! ```
//!
//! where `n` counts the samples of `Ax` after any domain restriction.
//! The RNG is seeded so experiments are reproducible; the contract is
//! statistical (expected noise energy), not a fixed realization.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::field::Image2D;

/// Noise standard deviation for a relative level `err_lvl` (percent).
pub fn noise_sigma(ax: &Image2D, err_lvl: f64) -> f64 {
    err_lvl / 100.0 * ax.norm() / (ax.len() as f64).sqrt()
}

/// Draw `b = Ax + eta` with `eta ~ N(0, sigma²)` i.i.d. per sample.
///
/// `sigma = 0` (a noise-free experiment) short-circuits to a copy of the
/// exact signal, keeping the RNG stream untouched.
pub fn noisy_data(ax: &Image2D, sigma: f64, seed: u64) -> Image2D {
    if sigma == 0.0 {
        return ax.clone();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    // sigma > 0 here, so the distribution is always well-formed.
    let normal = Normal::new(0.0, sigma).unwrap();
    let data = ax
        .as_slice()
        .iter()
        .map(|&v| v + normal.sample(&mut rng))
        .collect();
    Image2D::from_vec(ax.grid(), data)
}
