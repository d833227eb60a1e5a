//! Backend traits for spectral operations.
//!
//! The circulant operator paths (forward blur, Landweber, preconditioned
//! CG) are built entirely out of 2D FFTs and a few BLAS-like primitives.
//! This trait is the seam between the core algorithms and the FFT
//! implementation; the `deconv2d-backend-cpu` crate provides a `rustfft`
//! backend, and tests inside this crate use a naive DFT stand-in.
//!
//! # Conventions
//!
//! The forward transform is unnormalized (the DC component of a constant
//! field of ones equals `nx * ny`); the inverse transform divides by
//! `nx * ny`, so a forward/inverse round trip is the identity.

use num_complex::Complex64;

use crate::field::Field2D;
use crate::grid::Grid2D;

pub trait SpectralBuffer {
    fn len(&self) -> usize;
    fn grid(&self) -> Grid2D;
    fn as_slice(&self) -> &[Complex64];
    fn as_mut_slice(&mut self) -> &mut [Complex64];
}

impl SpectralBuffer for Field2D {
    fn len(&self) -> usize {
        self.len()
    }

    fn grid(&self) -> Grid2D {
        self.grid()
    }

    fn as_slice(&self) -> &[Complex64] {
        self.as_slice()
    }

    fn as_mut_slice(&mut self) -> &mut [Complex64] {
        self.as_mut_slice()
    }
}

pub trait SpectralBackend {
    type Buffer: SpectralBuffer + Clone;

    fn alloc_field(&self, grid: Grid2D) -> Self::Buffer;
    fn forward_fft_2d(&self, buffer: &mut Self::Buffer);
    fn inverse_fft_2d(&self, buffer: &mut Self::Buffer);

    /// Scale buffer by a complex scalar.
    fn scale(&self, alpha: Complex64, buffer: &mut Self::Buffer) {
        for value in buffer.as_mut_slice() {
            *value *= alpha;
        }
    }

    /// Compute y += alpha * x (axpy operation).
    fn axpy(&self, alpha: Complex64, x: &Self::Buffer, y: &mut Self::Buffer) {
        for (dst, src) in y.as_mut_slice().iter_mut().zip(x.as_slice()) {
            *dst += alpha * src;
        }
    }

    /// Conjugate dot product ⟨x, y⟩ = x^H · y, accumulated in f64.
    fn dot(&self, x: &Self::Buffer, y: &Self::Buffer) -> Complex64 {
        x.as_slice()
            .iter()
            .zip(y.as_slice())
            .map(|(a, b)| a.conj() * b)
            .sum()
    }
}

// ============================================================================
// Field2D <-> buffer plumbing shared by the circulant code paths
// ============================================================================

/// Copy a real image into a freshly allocated backend buffer.
pub fn buffer_from_real<B: SpectralBackend>(
    backend: &B,
    image: &crate::field::Image2D,
) -> B::Buffer {
    let mut buffer = backend.alloc_field(image.grid());
    for (dst, &src) in buffer.as_mut_slice().iter_mut().zip(image.as_slice()) {
        *dst = Complex64::new(src, 0.0);
    }
    buffer
}

/// Copy a complex field into a freshly allocated backend buffer.
pub fn buffer_from_field<B: SpectralBackend>(backend: &B, field: &Field2D) -> B::Buffer {
    let mut buffer = backend.alloc_field(field.grid());
    buffer.as_mut_slice().copy_from_slice(field.as_slice());
    buffer
}

/// Snapshot a backend buffer as a concrete [`Field2D`].
pub fn field_from_buffer<B: SpectralBackend>(buffer: &B::Buffer) -> Field2D {
    Field2D::from_vec(buffer.grid(), buffer.as_slice().to_vec())
}
