//! Forward operator variants (separable SVD + circulant FFT).
//!
//! The forward operator A in `b = A·x + noise` comes in three flavours,
//! selected once at construction and matched exhaustively everywhere:
//!
//! - [`ForwardOperator::Separable`]: zero (Dirichlet) boundary
//!   conditions; A acts as `A1 · X · A2ᵀ` with dense 1D blur matrices and
//!   their SVDs along each axis.
//! - [`ForwardOperator::Circulant`]: periodic boundary conditions; A is
//!   diagonalized by the 2D DFT and stored as the frequency kernel
//!   `ahat = FFT2(fftshift(kernel sample))`.
//! - [`ForwardOperator::CirculantPadded`]: periodic with zero-padding of
//!   the data domain to suppress wraparound artifacts; carries the mask
//!   that excludes the padded border from data-misfit terms.

use nalgebra::DMatrix;

use crate::backend::{buffer_from_real, SpectralBackend, SpectralBuffer};
use crate::decomposition::SvdFactors;
use crate::error::{InverseError, Result};
use crate::field::{fftshift, Field2D, Image2D};
use crate::grid::Grid2D;
use crate::kernel::{BlurKernel, Discretizer};

#[derive(Debug)]
pub enum ForwardOperator {
    Separable {
        a1: DMatrix<f64>,
        a2: DMatrix<f64>,
        svd1: SvdFactors,
        svd2: SvdFactors,
    },
    Circulant {
        ahat: Field2D,
    },
    CirculantPadded {
        ahat: Field2D,
        /// Ones over the restricted data domain, zeros over the pad border.
        mask: Image2D,
        pad_x: usize,
        pad_y: usize,
    },
}

impl ForwardOperator {
    /// Build the separable zero-boundary operator: discretize the 1D
    /// kernel along each axis and decompose both matrices eagerly.
    pub fn separable(
        grid: Grid2D,
        sig: f64,
        recon: bool,
        kernel: &dyn BlurKernel,
        discretizer: &dyn Discretizer,
    ) -> Result<Self> {
        let tx = grid.coords_x();
        let ty = grid.coords_y();
        let (hx, hy) = (grid.hx(), grid.hy());

        let (a1, a2) = if recon {
            (
                discretizer.integral_matrix(&tx, hx),
                discretizer.integral_matrix(&ty, hy),
            )
        } else {
            let kx = kernel.sample_1d(&tx, hx, sig);
            let ky = kernel.sample_1d(&ty, hy, sig);
            (
                discretizer.psf_matrix(&tx, hx, &kx),
                discretizer.psf_matrix(&ty, hy, &ky),
            )
        };

        let svd1 = SvdFactors::decompose(&a1, "first-axis operator SVD")?;
        let svd2 = SvdFactors::decompose(&a2, "second-axis operator SVD")?;

        Ok(Self::Separable { a1, a2, svd1, svd2 })
    }

    /// Sample the 2D kernel on the periodic `[-per_t, per_t)` mesh and
    /// transform it into the frequency-domain kernel `ahat`.
    ///
    /// Reconstruction mode has no periodic counterpart and fails fast.
    pub fn frequency_kernel<B: SpectralBackend>(
        backend: &B,
        grid: Grid2D,
        per_t: f64,
        sig: f64,
        recon: bool,
        kernel: &dyn BlurKernel,
    ) -> Result<Field2D> {
        if recon {
            return Err(InverseError::config(
                "reconstruction not implemented for periodic boundary conditions",
            ));
        }
        let tx = grid.periodic_coords_x(per_t);
        let ty = grid.periodic_coords_y(per_t);
        let (hx, hy) = (grid.hx(), grid.hy());

        let sample = Image2D::from_fn(grid, |i, j| kernel.sample_2d(tx[i], ty[j], hx, hy, sig));
        let mut buffer = buffer_from_real(backend, &fftshift(&sample));
        backend.forward_fft_2d(&mut buffer);
        Ok(crate::backend::field_from_buffer::<B>(&buffer))
    }

    /// Apply the forward (blurring) operator to a spatial image.
    ///
    /// For the padded variant, `x` lives on the restricted domain; it is
    /// zero-padded, convolved on the full periodic domain, and cropped
    /// back.
    pub fn apply<B: SpectralBackend>(&self, backend: &B, x: &Image2D) -> Image2D {
        match self {
            Self::Separable { a1, a2, .. } => {
                let m = a1 * x.to_matrix() * a2.transpose();
                Image2D::from_matrix(&m)
            }
            Self::Circulant { ahat } => convolve(backend, ahat, x, false),
            Self::CirculantPadded {
                ahat,
                pad_x,
                pad_y,
                ..
            } => {
                let padded = x.pad(*pad_x, *pad_y);
                let blurred = convolve(backend, ahat, &padded, false);
                let grid = x.grid();
                blurred.crop(*pad_x, pad_x + grid.nx, *pad_y, pad_y + grid.ny)
            }
        }
    }

    /// Apply AᵀMA on the full padded domain (Landweber / CG inner step):
    /// `Re(IFFT(conj(ahat)·FFT(M · Re(IFFT(ahat·FFT(x))))))`.
    ///
    /// Only defined for the padded circulant variant.
    pub fn normal_masked_apply<B: SpectralBackend>(
        &self,
        backend: &B,
        x: &Image2D,
    ) -> Result<Image2D> {
        match self {
            Self::CirculantPadded { ahat, mask, .. } => {
                let blurred = convolve(backend, ahat, x, false);
                Ok(convolve(backend, ahat, &blurred.mul(mask), true))
            }
            _ => Err(InverseError::config(
                "masked normal operator requires padded periodic boundary conditions",
            )),
        }
    }

    /// Shape of the spectral domain this operator diagonalizes over.
    pub fn spectral_grid(&self) -> Grid2D {
        match self {
            Self::Separable { a1, a2, .. } => Grid2D::new(a1.nrows(), a2.nrows()),
            Self::Circulant { ahat } | Self::CirculantPadded { ahat, .. } => ahat.grid(),
        }
    }

    pub fn is_periodic(&self) -> bool {
        !matches!(self, Self::Separable { .. })
    }
}

/// Circular convolution through the frequency kernel; `conjugate`
/// selects the adjoint Aᵀ instead of A.
pub(crate) fn convolve<B: SpectralBackend>(
    backend: &B,
    ahat: &Field2D,
    x: &Image2D,
    conjugate: bool,
) -> Image2D {
    debug_assert_eq!(ahat.grid(), x.grid(), "kernel and image shapes must match");
    let mut buffer = buffer_from_real(backend, x);
    backend.forward_fft_2d(&mut buffer);
    multiply_kernel(&mut buffer, ahat, conjugate);
    backend.inverse_fft_2d(&mut buffer);
    let data = buffer.as_slice().iter().map(|v| v.re).collect();
    Image2D::from_vec(x.grid(), data)
}

pub(crate) fn multiply_kernel<Buf: SpectralBuffer>(
    buffer: &mut Buf,
    ahat: &Field2D,
    conjugate: bool,
) {
    for (value, &k) in buffer.as_mut_slice().iter_mut().zip(ahat.as_slice()) {
        *value *= if conjugate { k.conj() } else { k };
    }
}

/// Build the separable pad mask `M = outer(DT, D)`: ones over the
/// restricted `inner` domain, zeros over the border of width
/// (`pad_x`, `pad_y`).
pub fn pad_mask(inner: Grid2D, pad_x: usize, pad_y: usize) -> Image2D {
    let full = Grid2D::new(inner.nx + 2 * pad_x, inner.ny + 2 * pad_y);
    Image2D::from_fn(full, |i, j| {
        let in_x = i >= pad_x && i < pad_x + inner.nx;
        let in_y = j >= pad_y && j < pad_y + inner.ny;
        if in_x && in_y { 1.0 } else { 0.0 }
    })
}
