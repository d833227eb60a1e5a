//! Regularization filters over the spectral domain.
//!
//! [`FilterSpec`] is a closed set of filters; each is validated against
//! the operator variant before any computation runs, so an unsupported
//! combination (e.g. a truncated filter under padded periodic boundary
//! conditions) is a [`crate::error::InverseError::Configuration`] rather
//! than a silently wrong answer.
//!
//! | filter            | separable | circulant | circulant + pad |
//! |-------------------|-----------|-----------|-----------------|
//! | Tikhonov          | yes       | yes       | yes             |
//! | Truncated         | yes       | yes       | no              |
//! | Landweber         | no        | no        | yes             |
//! | PreconditionedCg  | no        | no        | yes             |

use serde::{Deserialize, Serialize};

use crate::backend::SpectralBackend;
use crate::error::{InverseError, Result};
use crate::field::Image2D;
use crate::operator::ForwardOperator;
use crate::spectral::{ifft2_real, scale_field, SpectralDomain};

/// Relative floor under which an unregularized division by a singular
/// value is refused.
const TRUNCATION_PIVOT_FLOOR: f64 = 1e-14;

/// Default Landweber iteration count; the validated reference behavior
/// runs exactly this many steps with no early exit.
pub const LANDWEBER_DEFAULT_ITERATIONS: usize = 250;

/// Defaults for the preconditioned conjugate-gradient filter.
pub const CG_DEFAULT_TOLERANCE: f64 = 1e-4;
pub const CG_DEFAULT_MAX_ITER: usize = 250;

// ============================================================================
// Filter specification
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterSpec {
    /// Spectral damping `S²/(S² + alpha)`; `alpha > 0`.
    Tikhonov { alpha: f64 },
    /// Hard cutoff keeping the first `count` rows of spectral
    /// coefficients (first-axis index below `count`).
    Truncated { count: usize },
    /// Spatial-domain fixed-point iteration on the padded domain.
    Landweber {
        tau: f64,
        iterations: usize,
        /// Opt-in early exit once the squared residual norm drops below
        /// the discrepancy threshold `(nx·ny)²·sigma`. The reference
        /// behavior computes this flag but never acts on it, so the
        /// default is `false`.
        stop_on_convergence: bool,
    },
    /// Matrix-free preconditioned CG on `(AᵀMA + alpha·I)·x = AᵀDb`.
    PreconditionedCg {
        alpha: f64,
        tol: f64,
        max_iter: usize,
    },
}

impl FilterSpec {
    pub fn landweber(tau: f64) -> Self {
        Self::Landweber {
            tau,
            iterations: LANDWEBER_DEFAULT_ITERATIONS,
            stop_on_convergence: false,
        }
    }

    pub fn preconditioned_cg(alpha: f64) -> Self {
        Self::PreconditionedCg {
            alpha,
            tol: CG_DEFAULT_TOLERANCE,
            max_iter: CG_DEFAULT_MAX_ITER,
        }
    }

    /// Reject invalid filter/operator combinations and bad parameters
    /// up front, before any transform work.
    pub fn validate(&self, operator: &ForwardOperator) -> Result<()> {
        match (self, operator) {
            (Self::Tikhonov { alpha }, _) => {
                if *alpha <= 0.0 {
                    return Err(InverseError::config(format!(
                        "Tikhonov filter requires alpha > 0, got {alpha}"
                    )));
                }
                Ok(())
            }
            (Self::Truncated { .. }, ForwardOperator::CirculantPadded { .. }) => {
                Err(InverseError::config(
                    "truncated filter is not defined under padded periodic boundary conditions",
                ))
            }
            (Self::Truncated { .. }, _) => Ok(()),
            (
                Self::Landweber { tau, iterations, .. },
                ForwardOperator::CirculantPadded { .. },
            ) => {
                if *tau <= 0.0 {
                    return Err(InverseError::config(format!(
                        "Landweber step size must be positive, got {tau}"
                    )));
                }
                if *iterations == 0 {
                    return Err(InverseError::config(
                        "Landweber iteration count must be positive",
                    ));
                }
                Ok(())
            }
            (Self::Landweber { .. }, _) => Err(InverseError::config(
                "Landweber iteration requires padded periodic boundary conditions",
            )),
            (
                Self::PreconditionedCg { alpha, .. },
                ForwardOperator::CirculantPadded { .. },
            ) => {
                if *alpha <= 0.0 {
                    return Err(InverseError::config(format!(
                        "CG regularization requires alpha > 0, got {alpha}"
                    )));
                }
                Ok(())
            }
            (Self::PreconditionedCg { .. }, _) => Err(InverseError::config(
                "preconditioned CG requires padded periodic boundary conditions",
            )),
        }
    }
}

/// A filtered estimate plus the solver's convergence record.
///
/// `history` holds one squared residual norm per iteration for the
/// iterative filters and is empty for the direct (spectral) ones.
#[derive(Debug, Clone)]
pub struct FilteredSolution {
    pub x: Image2D,
    pub history: Vec<f64>,
    pub iterations: usize,
    pub converged: bool,
}

impl FilteredSolution {
    fn direct(x: Image2D) -> Self {
        Self {
            x,
            history: Vec::new(),
            iterations: 0,
            converged: true,
        }
    }
}

// ============================================================================
// Solver dispatch
// ============================================================================

/// Apply `spec` to the problem's spectral data and inverse-transform the
/// filtered coefficients back to the spatial domain.
///
/// `sigma` is the calibrated noise standard deviation (used only by the
/// optional Landweber early exit).
pub fn apply_filter<B: SpectralBackend>(
    backend: &B,
    operator: &ForwardOperator,
    domain: &SpectralDomain,
    spec: &FilterSpec,
    sigma: f64,
) -> Result<FilteredSolution> {
    spec.validate(operator)?;
    match spec {
        FilterSpec::Tikhonov { alpha } => tikhonov(backend, operator, domain, *alpha),
        FilterSpec::Truncated { count } => truncated(backend, operator, domain, *count),
        FilterSpec::Landweber {
            tau,
            iterations,
            stop_on_convergence,
        } => landweber(
            backend,
            operator,
            domain,
            *tau,
            *iterations,
            *stop_on_convergence,
            sigma,
        ),
        FilterSpec::PreconditionedCg {
            alpha,
            tol,
            max_iter,
        } => preconditioned_cg(backend, operator, domain, *alpha, *tol, *max_iter),
    }
}

// ============================================================================
// Direct spectral filters
// ============================================================================

/// Tikhonov damping: filtered coefficient = `S/(S² + alpha) · UTb`.
///
/// The damped factor is computed in one expression so the denominator
/// stays strictly positive even where `S` vanishes.
fn tikhonov<B: SpectralBackend>(
    backend: &B,
    operator: &ForwardOperator,
    domain: &SpectralDomain,
    alpha: f64,
) -> Result<FilteredSolution> {
    match domain {
        SpectralDomain::Separable { s, utb, .. } => {
            let factors = tikhonov_factors(s, alpha);
            let filtered = utb.mul(&factors);
            Ok(FilteredSolution::direct(inverse_separable(
                operator, &filtered,
            )?))
        }
        SpectralDomain::Circulant { s, utb, .. } => {
            let factors = tikhonov_factors(s, alpha);
            let x = ifft2_real(backend, &scale_field(utb, &factors));
            Ok(FilteredSolution::direct(x))
        }
        SpectralDomain::CirculantPadded { s, utb, .. } => {
            let factors = tikhonov_factors(s, alpha);
            let full = ifft2_real(backend, &scale_field(utb, &factors));
            Ok(FilteredSolution::direct(crop_center(operator, &full)?))
        }
    }
}

fn tikhonov_factors(s: &Image2D, alpha: f64) -> Image2D {
    Image2D::from_fn(s.grid(), |i, j| {
        let sv = s.get(i, j);
        sv / (sv * sv + alpha)
    })
}

/// Hard spectral cutoff: rows with first-axis index below `count` keep
/// the plain inverse factor `1/S`, the rest are zeroed. A kept
/// coefficient whose singular value sits at (numerical) zero would be an
/// unregularized division and is reported as a numerical failure.
fn truncated<B: SpectralBackend>(
    backend: &B,
    operator: &ForwardOperator,
    domain: &SpectralDomain,
    count: usize,
) -> Result<FilteredSolution> {
    let truncation_factors = |s: &Image2D| -> Result<Image2D> {
        let floor = s.as_slice().iter().cloned().fold(0.0, f64::max) * TRUNCATION_PIVOT_FLOOR;
        let mut factors = Image2D::zeros(s.grid());
        for i in 0..s.grid().nx.min(count) {
            for j in 0..s.grid().ny {
                let sv = s.get(i, j);
                if sv <= floor {
                    return Err(InverseError::numerical(
                        "truncated filter",
                        format!("singular value at ({i}, {j}) is {sv:e}; cannot invert"),
                    ));
                }
                factors.set(i, j, 1.0 / sv);
            }
        }
        Ok(factors)
    };

    match domain {
        SpectralDomain::Separable { s, utb, .. } => {
            let filtered = utb.mul(&truncation_factors(s)?);
            Ok(FilteredSolution::direct(inverse_separable(
                operator, &filtered,
            )?))
        }
        SpectralDomain::Circulant { s, utb, .. } => {
            let x = ifft2_real(backend, &scale_field(utb, &truncation_factors(s)?));
            Ok(FilteredSolution::direct(x))
        }
        // validate() rejects this pairing before dispatch.
        SpectralDomain::CirculantPadded { .. } => Err(InverseError::config(
            "truncated filter is not defined under padded periodic boundary conditions",
        )),
    }
}

/// Inverse of the separable forward projection: `x = V1·C·V2ᵀ`.
fn inverse_separable(operator: &ForwardOperator, coeffs: &Image2D) -> Result<Image2D> {
    match operator {
        ForwardOperator::Separable { svd1, svd2, .. } => {
            let m = svd1.v() * coeffs.to_matrix() * &svd2.v_t;
            Ok(Image2D::from_matrix(&m))
        }
        _ => Err(InverseError::config(
            "separable inverse transform requires a separable operator",
        )),
    }
}

/// Crop a full padded-domain image to the central window corresponding
/// to the original restricted domain.
fn crop_center(operator: &ForwardOperator, full: &Image2D) -> Result<Image2D> {
    match operator {
        ForwardOperator::CirculantPadded {
            mask: _,
            pad_x,
            pad_y,
            ahat,
        } => {
            let grid = ahat.grid();
            Ok(full.crop(*pad_x, grid.nx - pad_x, *pad_y, grid.ny - pad_y))
        }
        _ => Err(InverseError::config("center crop requires a padded operator")),
    }
}

// ============================================================================
// Landweber iteration
// ============================================================================

/// Fixed-point iteration `x ← x − tau·(AᵀMAx − AᵀDb)` on the full padded
/// spatial domain, started at zero.
///
/// Runs exactly `iterations` steps unless the opt-in early exit fires.
/// The squared residual norm of every completed step is recorded (and
/// logged at debug level) instead of printed.
#[allow(clippy::too_many_arguments)]
fn landweber<B: SpectralBackend>(
    backend: &B,
    operator: &ForwardOperator,
    domain: &SpectralDomain,
    tau: f64,
    iterations: usize,
    stop_on_convergence: bool,
    sigma: f64,
) -> Result<FilteredSolution> {
    let atdb = match domain {
        SpectralDomain::CirculantPadded { atdb, .. } => atdb,
        _ => {
            return Err(InverseError::config(
                "Landweber iteration requires padded periodic boundary conditions",
            ))
        }
    };

    let full_grid = atdb.grid();
    let discrepancy = (full_grid.len() as f64).powi(2) * sigma;
    let mut x = Image2D::zeros(full_grid);
    let mut history = Vec::with_capacity(iterations);
    let mut converged = false;

    for iter in 0..iterations {
        let atmax = operator.normal_masked_apply(backend, &x)?;
        let gradient = atmax.sub(atdb);
        let misfit = gradient.norm_sqr();
        x.axpy(-tau, &gradient);
        history.push(misfit);
        log::debug!("landweber iter {iter}: squared residual norm {misfit:e}");

        if stop_on_convergence && misfit < discrepancy {
            converged = true;
            break;
        }
    }

    let iterations_run = history.len();
    Ok(FilteredSolution {
        x: crop_center(operator, &x)?,
        history,
        iterations: iterations_run,
        converged: converged || !stop_on_convergence,
    })
}

// ============================================================================
// Preconditioned conjugate gradient
// ============================================================================

/// Matrix-free PCG for `B·x = c` with `B = AᵀMA + alpha·I` and
/// `c = AᵀDb`, preconditioned by the Fourier-diagonal inverse of
/// `AᵀA + alpha·I` (i.e. a solve by `S² + alpha` per frequency).
///
/// Fails with a convergence error carrying the best-effort iterate when
/// the relative residual does not reach `tol` within `max_iter` steps.
fn preconditioned_cg<B: SpectralBackend>(
    backend: &B,
    operator: &ForwardOperator,
    domain: &SpectralDomain,
    alpha: f64,
    tol: f64,
    max_iter: usize,
) -> Result<FilteredSolution> {
    let (s, atdb) = match domain {
        SpectralDomain::CirculantPadded { s, atdb, .. } => (s, atdb),
        _ => {
            return Err(InverseError::config(
                "preconditioned CG requires padded periodic boundary conditions",
            ))
        }
    };

    let full_grid = atdb.grid();
    let apply_b = |v: &Image2D| -> Result<Image2D> {
        let mut out = operator.normal_masked_apply(backend, v)?;
        out.axpy(alpha, v);
        Ok(out)
    };
    // z = Re(IFFT(FFT(r) / (S² + alpha))): the A^T A + alpha·I diagonal.
    let precondition = |r: &Image2D| -> Image2D {
        let inv = Image2D::from_fn(s.grid(), |i, j| {
            let sv = s.get(i, j);
            1.0 / (sv * sv + alpha)
        });
        let rhat = crate::spectral::fft2(backend, r);
        ifft2_real(backend, &scale_field(&rhat, &inv))
    };

    let c_norm = atdb.norm();
    if c_norm == 0.0 {
        return Ok(FilteredSolution::direct(crop_center(
            operator,
            &Image2D::zeros(full_grid),
        )?));
    }

    let mut x = Image2D::zeros(full_grid);
    let mut r = atdb.clone();
    let mut z = precondition(&r);
    let mut p = z.clone();
    let mut rz = dot_real(&r, &z);
    let mut history = Vec::new();

    for iter in 0..max_iter {
        let w = apply_b(&p)?;
        let pw = dot_real(&p, &w);
        if pw <= 0.0 {
            return Err(InverseError::numerical(
                "preconditioned CG",
                format!("curvature p·Bp = {pw:e} is not positive at iteration {iter}"),
            ));
        }
        let step = rz / pw;
        x.axpy(step, &p);
        r.axpy(-step, &w);

        let residual = r.norm();
        history.push(residual * residual);
        log::debug!("cg iter {iter}: relative residual {:e}", residual / c_norm);

        if residual / c_norm <= tol {
            return Ok(FilteredSolution {
                x: crop_center(operator, &x)?,
                history,
                iterations: iter + 1,
                converged: true,
            });
        }

        z = precondition(&r);
        let rz_next = dot_real(&r, &z);
        let beta = rz_next / rz;
        rz = rz_next;
        // p = z + beta * p
        let mut p_next = z.clone();
        p_next.axpy(beta, &p);
        p = p_next;
    }

    let residual = r.norm() / c_norm;
    Err(InverseError::Convergence {
        iterations: max_iter,
        residual,
        tolerance: tol,
        best: Box::new(crop_center(operator, &x)?),
    })
}

fn dot_real(a: &Image2D, b: &Image2D) -> f64 {
    a.as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(x, y)| x * y)
        .sum()
}
