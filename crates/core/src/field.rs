//! Contiguous field storage on a uniform 2D grid.
//!
//! Two storage types share the row-major layout of [`Grid2D`]:
//!
//! - [`Image2D`]: real-valued spatial arrays (the true solution, the
//!   blurred data, masks). Carries the padding and cropping bookkeeping
//!   needed by the periodic boundary-condition paths.
//! - [`Field2D`]: complex-valued arrays used for spectral-domain data
//!   (FFT buffers, frequency kernels, transformed coefficients).

use nalgebra::DMatrix;
use num_complex::Complex64;

use crate::grid::Grid2D;

// ============================================================================
// Real-valued images
// ============================================================================

/// A real-valued array on a [`Grid2D`], stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Image2D {
    grid: Grid2D,
    data: Vec<f64>,
}

impl Image2D {
    pub fn zeros(grid: Grid2D) -> Self {
        Self {
            data: vec![0.0; grid.len()],
            grid,
        }
    }

    pub fn from_vec(grid: Grid2D, data: Vec<f64>) -> Self {
        assert_eq!(data.len(), grid.len(), "data length must match grid");
        Self { grid, data }
    }

    pub fn from_fn(grid: Grid2D, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(grid.len());
        for i in 0..grid.nx {
            for j in 0..grid.ny {
                data.push(f(i, j));
            }
        }
        Self { grid, data }
    }

    pub fn grid(&self) -> Grid2D {
        self.grid
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[self.grid.idx(i, j)]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        let idx = self.grid.idx(i, j);
        self.data[idx] = value;
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Frobenius norm.
    pub fn norm(&self) -> f64 {
        self.data.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Squared Frobenius norm.
    pub fn norm_sqr(&self) -> f64 {
        self.data.iter().map(|v| v * v).sum::<f64>()
    }

    /// Elementwise `self ← self + alpha * other`.
    pub fn axpy(&mut self, alpha: f64, other: &Image2D) {
        assert_eq!(self.grid, other.grid, "axpy requires matching grids");
        for (dst, src) in self.data.iter_mut().zip(&other.data) {
            *dst += alpha * src;
        }
    }

    /// Elementwise difference `self − other`.
    pub fn sub(&self, other: &Image2D) -> Image2D {
        assert_eq!(self.grid, other.grid, "sub requires matching grids");
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| a - b)
            .collect();
        Image2D {
            grid: self.grid,
            data,
        }
    }

    /// Elementwise product (used for mask application).
    pub fn mul(&self, other: &Image2D) -> Image2D {
        assert_eq!(self.grid, other.grid, "mul requires matching grids");
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| a * b)
            .collect();
        Image2D {
            grid: self.grid,
            data,
        }
    }

    /// Zero-pad by `pad_x` samples on each side of the first axis and
    /// `pad_y` on each side of the second.
    pub fn pad(&self, pad_x: usize, pad_y: usize) -> Image2D {
        let grid = Grid2D::new(self.grid.nx + 2 * pad_x, self.grid.ny + 2 * pad_y);
        let mut out = Image2D::zeros(grid);
        for i in 0..self.grid.nx {
            for j in 0..self.grid.ny {
                out.set(i + pad_x, j + pad_y, self.get(i, j));
            }
        }
        out
    }

    /// Crop to the index window `[x0, x1) × [y0, y1)`.
    pub fn crop(&self, x0: usize, x1: usize, y0: usize, y1: usize) -> Image2D {
        assert!(x0 < x1 && x1 <= self.grid.nx, "invalid crop window on x");
        assert!(y0 < y1 && y1 <= self.grid.ny, "invalid crop window on y");
        let grid = Grid2D::new(x1 - x0, y1 - y0);
        Image2D::from_fn(grid, |i, j| self.get(x0 + i, y0 + j))
    }

    /// Promote to a complex field with zero imaginary part.
    pub fn to_field(&self) -> Field2D {
        let data = self.data.iter().map(|&v| Complex64::new(v, 0.0)).collect();
        Field2D {
            grid: self.grid,
            data,
        }
    }

    /// View as a dense `nx × ny` matrix for the separable operator algebra.
    pub fn to_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.grid.nx, self.grid.ny, |i, j| self.get(i, j))
    }

    pub fn from_matrix(m: &DMatrix<f64>) -> Image2D {
        let grid = Grid2D::new(m.nrows(), m.ncols());
        Image2D::from_fn(grid, |i, j| m[(i, j)])
    }
}

// ============================================================================
// Complex-valued fields
// ============================================================================

/// A complex-valued array on a [`Grid2D`], stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Field2D {
    grid: Grid2D,
    data: Vec<Complex64>,
}

impl Field2D {
    pub fn zeros(grid: Grid2D) -> Self {
        Self {
            data: vec![Complex64::default(); grid.len()],
            grid,
        }
    }

    pub fn from_vec(grid: Grid2D, data: Vec<Complex64>) -> Self {
        assert_eq!(data.len(), grid.len(), "data length must match grid");
        Self { grid, data }
    }

    pub fn grid(&self) -> Grid2D {
        self.grid
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Complex64 {
        self.data[self.grid.idx(i, j)]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: Complex64) {
        let idx = self.grid.idx(i, j);
        self.data[idx] = value;
    }

    pub fn as_slice(&self) -> &[Complex64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [Complex64] {
        &mut self.data
    }

    /// Elementwise real part.
    pub fn real(&self) -> Image2D {
        let data = self.data.iter().map(|v| v.re).collect();
        Image2D {
            grid: self.grid,
            data,
        }
    }

    /// Elementwise magnitude.
    pub fn magnitude(&self) -> Image2D {
        let data = self.data.iter().map(|v| v.norm()).collect();
        Image2D {
            grid: self.grid,
            data,
        }
    }

    /// Crop to the index window `[x0, x1) × [y0, y1)`.
    pub fn crop(&self, x0: usize, x1: usize, y0: usize, y1: usize) -> Field2D {
        assert!(x0 < x1 && x1 <= self.grid.nx, "invalid crop window on x");
        assert!(y0 < y1 && y1 <= self.grid.ny, "invalid crop window on y");
        let grid = Grid2D::new(x1 - x0, y1 - y0);
        let mut out = Field2D::zeros(grid);
        for i in 0..grid.nx {
            for j in 0..grid.ny {
                out.set(i, j, self.get(x0 + i, y0 + j));
            }
        }
        out
    }
}

/// Swap quadrants so the zero-centered kernel sample has its peak at
/// index (0, 0) before the forward transform. Equivalent to numpy's
/// `fftshift` for the even-sized grids this engine works on.
pub fn fftshift(image: &Image2D) -> Image2D {
    let grid = image.grid();
    let (sx, sy) = (grid.nx / 2, grid.ny / 2);
    Image2D::from_fn(grid, |i, j| {
        image.get((i + sx) % grid.nx, (j + sy) % grid.ny)
    })
}
