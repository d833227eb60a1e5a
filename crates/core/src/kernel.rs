//! Injected kernel and discretization seams.
//!
//! The closed-form blur kernels and the quadrature rules that turn a 1D
//! kernel sample into a dense discretization matrix are external
//! collaborators: the engine only requires that they are pure and
//! deterministic for given inputs. Callers hand an implementation of each
//! trait to [`crate::problem::Problem`] at construction time.

use nalgebra::DMatrix;

/// A blurring kernel (e.g. a point spread function).
///
/// `sample_1d` evaluates the kernel along a 1D coordinate sequence for
/// the separable zero-boundary discretization; `sample_2d` evaluates it
/// at a single mesh point of the periodic `[-per_t, per_t)` domain.
/// Both must be deterministic for given inputs.
pub trait BlurKernel {
    fn sample_1d(&self, t: &[f64], h: f64, sig: f64) -> Vec<f64>;
    fn sample_2d(&self, x: f64, y: f64, hx: f64, hy: f64, sig: f64) -> f64;
}

/// Discretization rules producing `n × n` real matrices.
///
/// `psf_matrix` builds the 1D convolution matrix from a kernel sample;
/// `integral_matrix` builds the cumulative-integration matrix used in
/// reconstruction mode. Both are treated as black boxes.
pub trait Discretizer {
    fn psf_matrix(&self, t: &[f64], h: f64, kernel_sample: &[f64]) -> DMatrix<f64>;
    fn integral_matrix(&self, t: &[f64], h: f64) -> DMatrix<f64>;
}
