//! Dense SVD of the 1D discretization matrices.
//!
//! The separable operator needs the full decomposition A = U·diag(s)·Vᵀ
//! of both 1D blur matrices. nalgebra's iterative SVD can fail to
//! converge on pathological inputs, so the failure is surfaced as a
//! [`crate::error::InverseError::Numerical`] tagged with the axis it
//! came from rather than panicking.

use nalgebra::{DMatrix, DVector};

use crate::error::{InverseError, Result};

/// Iteration cap handed to nalgebra's SVD; 0 would mean "no limit".
const SVD_MAX_SWEEPS: usize = 1000;

/// Full SVD factors of a real square matrix, A = U·diag(s)·Vᵀ.
///
/// `s` is stored in the routine's native ordering; callers must not
/// assume monotonicity beyond what nalgebra guarantees.
#[derive(Debug, Clone)]
pub struct SvdFactors {
    pub u: DMatrix<f64>,
    pub s: DVector<f64>,
    /// Vᵀ as returned by the decomposition.
    pub v_t: DMatrix<f64>,
}

impl SvdFactors {
    /// Decompose `matrix`; `stage` names the operator axis for error context.
    pub fn decompose(matrix: &DMatrix<f64>, stage: &'static str) -> Result<Self> {
        let svd = nalgebra::SVD::try_new(
            matrix.clone(),
            true,
            true,
            f64::EPSILON,
            SVD_MAX_SWEEPS,
        )
        .ok_or_else(|| {
            InverseError::numerical(
                stage,
                format!(
                    "SVD did not converge on a {}x{} matrix within {} sweeps",
                    matrix.nrows(),
                    matrix.ncols(),
                    SVD_MAX_SWEEPS
                ),
            )
        })?;

        let u = svd
            .u
            .ok_or_else(|| InverseError::numerical(stage, "SVD returned no U factor"))?;
        let v_t = svd
            .v_t
            .ok_or_else(|| InverseError::numerical(stage, "SVD returned no V^T factor"))?;

        Ok(Self {
            u,
            s: svd.singular_values,
            v_t,
        })
    }

    /// V (columns are right singular vectors).
    pub fn v(&self) -> DMatrix<f64> {
        self.v_t.transpose()
    }

    /// Reassemble U·diag(s)·Vᵀ, used to verify the factorization in tests.
    pub fn reconstruct(&self) -> DMatrix<f64> {
        let mut scaled = self.v_t.clone();
        for (row, &sv) in self.s.iter().enumerate() {
            scaled.row_mut(row).scale_mut(sv);
        }
        &self.u * scaled
    }
}
