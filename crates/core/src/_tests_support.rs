#![cfg(test)]
//! Shared fixtures for the core test modules: a naive DFT backend so the
//! circulant paths can run without the rustfft crate, and a reference
//! Gaussian kernel with a midpoint discretization rule.

use std::f64::consts::PI;

use nalgebra::DMatrix;
use num_complex::Complex64;

use crate::backend::SpectralBackend;
use crate::field::{Field2D, Image2D};
use crate::grid::Grid2D;
use crate::kernel::{BlurKernel, Discretizer};

/// Route `log::debug!` output from the iterative solvers into the test
/// harness when `RUST_LOG` asks for it.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Naive DFT backend
// ============================================================================

/// Row-column DFT evaluated from the definition. Slow but obviously
/// correct; keeps core tests independent of the CPU backend crate.
#[derive(Debug)]
pub struct TestBackend;

impl SpectralBackend for TestBackend {
    type Buffer = Field2D;

    fn alloc_field(&self, grid: Grid2D) -> Self::Buffer {
        Field2D::zeros(grid)
    }

    fn forward_fft_2d(&self, buffer: &mut Self::Buffer) {
        dft_2d(buffer, false);
    }

    fn inverse_fft_2d(&self, buffer: &mut Self::Buffer) {
        dft_2d(buffer, true);
    }
}

fn dft_1d(input: &[Complex64], inverse: bool) -> Vec<Complex64> {
    let n = input.len();
    let sign = if inverse { 1.0 } else { -1.0 };
    (0..n)
        .map(|k| {
            input
                .iter()
                .enumerate()
                .map(|(m, &v)| {
                    v * Complex64::from_polar(1.0, sign * 2.0 * PI * (k * m) as f64 / n as f64)
                })
                .sum()
        })
        .collect()
}

fn dft_2d(buffer: &mut Field2D, inverse: bool) {
    let grid = buffer.grid();
    let (nx, ny) = (grid.nx, grid.ny);

    // Rows (second axis is contiguous).
    for i in 0..nx {
        let row: Vec<Complex64> = (0..ny).map(|j| buffer.get(i, j)).collect();
        for (j, v) in dft_1d(&row, inverse).into_iter().enumerate() {
            buffer.set(i, j, v);
        }
    }
    // Columns.
    for j in 0..ny {
        let col: Vec<Complex64> = (0..nx).map(|i| buffer.get(i, j)).collect();
        for (i, v) in dft_1d(&col, inverse).into_iter().enumerate() {
            buffer.set(i, j, v);
        }
    }

    if inverse {
        let norm = 1.0 / (nx * ny) as f64;
        for value in buffer.as_mut_slice() {
            *value *= norm;
        }
    }
}

// ============================================================================
// Reference kernel and discretization rule
// ============================================================================

/// Gaussian PSF with bandwidth `sig` measured in grid cells.
pub struct GaussianKernel;

impl BlurKernel for GaussianKernel {
    fn sample_1d(&self, t: &[f64], h: f64, sig: f64) -> Vec<f64> {
        let width = sig * h;
        t.iter()
            .map(|&ti| h * (-ti * ti / (2.0 * width * width)).exp() / (width * (2.0 * PI).sqrt()))
            .collect()
    }

    fn sample_2d(&self, x: f64, y: f64, hx: f64, hy: f64, sig: f64) -> f64 {
        let (wx, wy) = (sig * hx, sig * hy);
        hx * hy * (-(x * x / (2.0 * wx * wx) + y * y / (2.0 * wy * wy))).exp()
            / (2.0 * PI * wx * wy)
    }
}

/// Midpoint-rule discretizations: a symmetric Toeplitz convolution
/// matrix for the PSF mode and the lower-triangular cumulative-sum
/// matrix for the reconstruction mode.
pub struct MidpointDiscretizer;

impl Discretizer for MidpointDiscretizer {
    fn psf_matrix(&self, t: &[f64], _h: f64, kernel_sample: &[f64]) -> DMatrix<f64> {
        let n = t.len();
        DMatrix::from_fn(n, n, |i, j| kernel_sample[i.abs_diff(j)])
    }

    fn integral_matrix(&self, t: &[f64], h: f64) -> DMatrix<f64> {
        let n = t.len();
        DMatrix::from_fn(n, n, |i, j| if j <= i { h } else { 0.0 })
    }
}

// ============================================================================
// Test images
// ============================================================================

/// A smooth two-bump truth image, normalized to peak 1.
pub fn test_image(grid: Grid2D) -> Image2D {
    Image2D::from_fn(grid, |i, j| {
        let x = i as f64 / grid.nx as f64;
        let y = j as f64 / grid.ny as f64;
        let bump = |cx: f64, cy: f64, w: f64| {
            (-((x - cx).powi(2) + (y - cy).powi(2)) / (2.0 * w * w)).exp()
        };
        bump(0.35, 0.4, 0.08) + 0.6 * bump(0.65, 0.6, 0.12)
    })
}

pub fn max_abs_diff(a: &Image2D, b: &Image2D) -> f64 {
    a.as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}
