//! Uniform grid helpers.

use serde::{Deserialize, Serialize};

/// A uniform 2D grid over the unit square with `nx × ny` samples.
///
/// Spacing is tied to the sample count: `hx = 1/nx` and `hy = 1/ny`
/// exactly. Storage is row-major with the first axis (length `nx`)
/// outermost, so `idx(i, j) = i * ny + j`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid2D {
    pub nx: usize,
    pub ny: usize,
}

impl Grid2D {
    pub fn new(nx: usize, ny: usize) -> Self {
        assert!(nx > 0 && ny > 0, "grid dimensions must be positive");
        Self { nx, ny }
    }

    #[inline]
    pub fn idx(&self, i: usize, j: usize) -> usize {
        i * self.ny + j
    }

    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    pub fn hx(&self) -> f64 {
        1.0 / self.nx as f64
    }

    pub fn hy(&self) -> f64 {
        1.0 / self.ny as f64
    }

    /// Coordinates {0, hx, 2hx, …, 1 − hx} along the first axis.
    pub fn coords_x(&self) -> Vec<f64> {
        let h = self.hx();
        (0..self.nx).map(|i| i as f64 * h).collect()
    }

    /// Coordinates {0, hy, 2hy, …, 1 − hy} along the second axis.
    pub fn coords_y(&self) -> Vec<f64> {
        let h = self.hy();
        (0..self.ny).map(|j| j as f64 * h).collect()
    }

    /// Coordinates {−per_t, −per_t + hx, …} covering [−per_t, per_t)
    /// along the first axis, used for the periodic kernel mesh.
    pub fn periodic_coords_x(&self, per_t: f64) -> Vec<f64> {
        let h = self.hx();
        (0..self.nx).map(|i| -per_t + i as f64 * h).collect()
    }

    /// Same as [`Grid2D::periodic_coords_x`] for the second axis.
    pub fn periodic_coords_y(&self, per_t: f64) -> Vec<f64> {
        let h = self.hy();
        (0..self.ny).map(|j| -per_t + j as f64 * h).collect()
    }
}
