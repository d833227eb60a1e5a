//! Error taxonomy for the inverse-problem engine.
//!
//! Three failure classes cover the whole pipeline:
//!
//! - [`InverseError::Configuration`]: an invalid combination of boundary
//!   mode, filter type, or construction parameters. Raised before any
//!   computation proceeds, never silently remapped to a different mode.
//! - [`InverseError::Numerical`]: a failure inside a linear-algebra or
//!   transform routine (e.g. the dense SVD not converging, or an exact-zero
//!   singular value hit by an unregularized division), tagged with the
//!   pipeline stage it came from.
//! - [`InverseError::Convergence`]: an iterative solver exhausted its
//!   iteration budget without reaching tolerance. Carries the best-effort
//!   iterate so callers can still inspect it, per standard CG semantics.

use crate::field::Image2D;

/// Errors produced while constructing a problem or applying a filter.
#[derive(Debug, thiserror::Error)]
pub enum InverseError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("numerical failure in {stage}: {detail}")]
    Numerical { stage: &'static str, detail: String },

    #[error(
        "solver did not reach tolerance {tolerance:e} after {iterations} iterations \
         (residual norm {residual:e})"
    )]
    Convergence {
        iterations: usize,
        residual: f64,
        tolerance: f64,
        /// Best-effort iterate at the point the budget ran out.
        best: Box<Image2D>,
    },
}

pub type Result<T> = std::result::Result<T, InverseError>;

impl InverseError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn numerical(stage: &'static str, detail: impl Into<String>) -> Self {
        Self::Numerical {
            stage,
            detail: detail.into(),
        }
    }
}
