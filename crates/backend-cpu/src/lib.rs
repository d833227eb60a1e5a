//! CPU spectral backend built on rustfft.
//!
//! Implements the row-column 2D transform over the core crate's
//! [`Field2D`] storage. Plans are cached per length inside rustfft's
//! planner, so repeated transforms on the same grid reuse them.
//!
//! Normalization follows the core convention: the forward transform is
//! unnormalized and the inverse divides by `nx * ny`.

use std::cell::RefCell;
use std::sync::Arc;

use deconv2d_core::backend::SpectralBackend;
use deconv2d_core::field::Field2D;
use deconv2d_core::grid::Grid2D;
use num_complex::Complex64;
use rustfft::{Fft, FftDirection, FftPlanner};

pub struct CpuBackend {
    planner: RefCell<FftPlanner<f64>>,
}

impl CpuBackend {
    pub fn new() -> Self {
        Self {
            planner: RefCell::new(FftPlanner::new()),
        }
    }

    fn plan(&self, len: usize, direction: FftDirection) -> Arc<dyn Fft<f64>> {
        self.planner.borrow_mut().plan_fft(len, direction)
    }

    fn fft_2d(&self, buffer: &mut Field2D, direction: FftDirection) {
        let grid = buffer.grid();
        let (nx, ny) = (grid.nx, grid.ny);

        // Rows: the second axis is contiguous in row-major storage.
        let row_fft = self.plan(ny, direction);
        for row in buffer.as_mut_slice().chunks_exact_mut(ny) {
            row_fft.process(row);
        }

        // Columns: gather, transform, scatter.
        let col_fft = self.plan(nx, direction);
        let mut column = vec![Complex64::default(); nx];
        for j in 0..ny {
            for i in 0..nx {
                column[i] = buffer.get(i, j);
            }
            col_fft.process(&mut column);
            for i in 0..nx {
                buffer.set(i, j, column[i]);
            }
        }

        if direction == FftDirection::Inverse {
            let norm = 1.0 / (nx * ny) as f64;
            for value in buffer.as_mut_slice() {
                *value *= norm;
            }
        }
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectralBackend for CpuBackend {
    type Buffer = Field2D;

    fn alloc_field(&self, grid: Grid2D) -> Self::Buffer {
        Field2D::zeros(grid)
    }

    fn forward_fft_2d(&self, buffer: &mut Self::Buffer) {
        self.fft_2d(buffer, FftDirection::Forward);
    }

    fn inverse_fft_2d(&self, buffer: &mut Self::Buffer) {
        self.fft_2d(buffer, FftDirection::Inverse);
    }
}
