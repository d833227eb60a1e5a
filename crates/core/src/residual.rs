//! Data-misfit residual for parameter-selection diagnostics.
//!
//! `r(alpha) = A·(x_alpha − b)` feeds L-curve style diagnostics outside
//! this crate. Pure function of the operator, the data, and a candidate
//! solution; no state.

use crate::backend::SpectralBackend;
use crate::error::{InverseError, Result};
use crate::field::Image2D;
use crate::operator::{convolve, ForwardOperator};

/// Evaluate `A·(x_alpha − b)`.
///
/// The padded circulant variant zero-pads the difference, convolves on
/// the full periodic domain, and crops back to the data window.
pub fn residual<B: SpectralBackend>(
    backend: &B,
    operator: &ForwardOperator,
    b: &Image2D,
    x_alpha: &Image2D,
) -> Result<Image2D> {
    if x_alpha.grid() != b.grid() {
        return Err(InverseError::config(format!(
            "residual shapes disagree: solution is {}x{}, data is {}x{}",
            x_alpha.grid().nx,
            x_alpha.grid().ny,
            b.grid().nx,
            b.grid().ny,
        )));
    }
    let diff = x_alpha.sub(b);
    match operator {
        ForwardOperator::Separable { a1, a2, .. } => {
            let m = a1 * diff.to_matrix() * a2.transpose();
            Ok(Image2D::from_matrix(&m))
        }
        ForwardOperator::Circulant { ahat } => Ok(convolve(backend, ahat, &diff, false)),
        ForwardOperator::CirculantPadded {
            ahat,
            pad_x,
            pad_y,
            ..
        } => {
            let padded = diff.pad(*pad_x, *pad_y);
            let blurred = convolve(backend, ahat, &padded, false);
            let grid = diff.grid();
            Ok(blurred.crop(*pad_x, pad_x + grid.nx, *pad_y, pad_y + grid.ny))
        }
    }
}
