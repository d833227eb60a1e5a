//! Projection of data and truth into the operator's spectral basis.
//!
//! The filters act on spectral coefficients: SVD coordinates for the
//! separable operator, Fourier coordinates for the circulant ones. This
//! module computes everything they need once, at construction time:
//!
//! - separable: `UTb = U1ᵀ·b·U2`, `Vx = V1ᵀ·x_true·V2`,
//!   `S = outer(S2, S1)` (i.e. `S[i][j] = S2[i]·S1[j]`; the second axis's
//!   singular values form the outer rows, and this ordering decides which
//!   (σ1, σ2) pair belongs to which coefficient — it must not be swapped);
//! - circulant: `UTb = FFT2(b)`, `Vx = FFT2(x_true)`, `S = |ahat|`;
//! - padded circulant: `UTb = FFT2(pad(b))` plus the adjoint right-hand
//!   side `ATDb = Re(IFFT(conj(ahat)·FFT(pad(b))))` consumed by the
//!   Landweber and CG filters.

use num_complex::Complex64;

use crate::backend::{buffer_from_real, field_from_buffer, SpectralBackend};
use crate::error::Result;
use crate::field::{Field2D, Image2D};
use crate::operator::{convolve, ForwardOperator};

/// Spectral-domain view of a problem instance, one variant per operator.
#[derive(Debug)]
pub enum SpectralDomain {
    Separable {
        /// Singular-value outer product, `s[i][j] = S2[i]·S1[j]`.
        s: Image2D,
        utb: Image2D,
        vx: Image2D,
    },
    Circulant {
        /// Frequency magnitudes `|ahat|`.
        s: Image2D,
        utb: Field2D,
        vx: Field2D,
    },
    CirculantPadded {
        s: Image2D,
        /// Transform of the zero-padded data.
        utb: Field2D,
        vx: Field2D,
        /// Adjoint applied to the padded data, `AᵀDb`.
        atdb: Image2D,
    },
}

impl SpectralDomain {
    /// Project `b` and `x_true` into the spectral basis of `operator`.
    pub fn transform<B: SpectralBackend>(
        backend: &B,
        operator: &ForwardOperator,
        b: &Image2D,
        x_true: &Image2D,
    ) -> Result<Self> {
        match operator {
            ForwardOperator::Separable { svd1, svd2, .. } => {
                let utb = svd1.u.transpose() * b.to_matrix() * &svd2.u;
                let vx = &svd1.v_t * x_true.to_matrix() * svd2.v();
                let s = Image2D::from_fn(b.grid(), |i, j| svd2.s[i] * svd1.s[j]);
                Ok(Self::Separable {
                    s,
                    utb: Image2D::from_matrix(&utb),
                    vx: Image2D::from_matrix(&vx),
                })
            }
            ForwardOperator::Circulant { ahat } => Ok(Self::Circulant {
                s: ahat.magnitude(),
                utb: fft2(backend, b),
                vx: fft2(backend, x_true),
            }),
            ForwardOperator::CirculantPadded {
                ahat,
                pad_x,
                pad_y,
                ..
            } => {
                let b_pad = b.pad(*pad_x, *pad_y);
                Ok(Self::CirculantPadded {
                    s: ahat.magnitude(),
                    utb: fft2(backend, &b_pad),
                    vx: fft2(backend, x_true),
                    atdb: convolve(backend, ahat, &b_pad, true),
                })
            }
        }
    }

    /// Singular/frequency magnitudes, nonnegative by construction.
    pub fn magnitudes(&self) -> &Image2D {
        match self {
            Self::Separable { s, .. }
            | Self::Circulant { s, .. }
            | Self::CirculantPadded { s, .. } => s,
        }
    }
}

/// Forward 2D transform of a real image into a concrete [`Field2D`].
pub fn fft2<B: SpectralBackend>(backend: &B, image: &Image2D) -> Field2D {
    let mut buffer = buffer_from_real(backend, image);
    backend.forward_fft_2d(&mut buffer);
    field_from_buffer::<B>(&buffer)
}

/// Inverse 2D transform, returning the real part.
pub fn ifft2_real<B: SpectralBackend>(backend: &B, field: &Field2D) -> Image2D {
    let mut buffer = crate::backend::buffer_from_field(backend, field);
    backend.inverse_fft_2d(&mut buffer);
    field_from_buffer::<B>(&buffer).real()
}

/// Elementwise product of a complex field with real factors.
pub(crate) fn scale_field(field: &Field2D, factors: &Image2D) -> Field2D {
    debug_assert_eq!(field.grid(), factors.grid());
    let data = field
        .as_slice()
        .iter()
        .zip(factors.as_slice())
        .map(|(&v, &f)| v * Complex64::new(f, 0.0))
        .collect();
    Field2D::from_vec(field.grid(), data)
}
