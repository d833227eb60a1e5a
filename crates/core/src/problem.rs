//! Problem construction and the filter-invocation surface.
//!
//! A [`Problem`] is built once from a configuration, a true solution,
//! and the injected kernel/discretization collaborators; after
//! construction it is immutable. Filter applications only use local
//! scratch, so independent filter calls (e.g. an alpha sweep for an
//! L-curve) can run in parallel from the caller's side.
//!
//! # Configuration
//!
//! [`ProblemConfig`] is serde-derived and loads from TOML:
//!
//! ```toml
//! sig = 2.0
//! err_lvl = 5.0
//! recon = false
//! per_bc = true
//! per_bc_pad = true
//! per_t = 0.5
//! restrict_dom = [8, 24]
//! seed = 7
//! ```

use serde::{Deserialize, Serialize};

use crate::backend::SpectralBackend;
use crate::error::{InverseError, Result};
use crate::field::Image2D;
use crate::filter::{apply_filter, FilterSpec, FilteredSolution};
use crate::grid::Grid2D;
use crate::kernel::{BlurKernel, Discretizer};
use crate::noise::{noise_sigma, noisy_data};
use crate::operator::{convolve, pad_mask, ForwardOperator};
use crate::spectral::SpectralDomain;

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblemConfig {
    /// Kernel bandwidth parameter.
    pub sig: f64,
    /// Relative noise level in percent of `||Ax||/sqrt(n)`.
    pub err_lvl: f64,
    /// Integral (reconstruction) discretization instead of the PSF one.
    pub recon: bool,
    /// Periodic boundary conditions (circulant operator).
    pub per_bc: bool,
    /// Zero-pad the periodic domain to suppress wraparound artifacts.
    pub per_bc_pad: bool,
    /// Half-width of the periodic kernel mesh `[-per_t, per_t)`.
    pub per_t: f64,
    /// Index window `[l, r)` cropping both axes of the blurred signal.
    pub restrict_dom: Option<(usize, usize)>,
    /// Seed for the synthetic noise draw.
    pub seed: u64,
}

impl Default for ProblemConfig {
    fn default() -> Self {
        Self {
            sig: 1.0,
            err_lvl: 0.0,
            recon: false,
            per_bc: false,
            per_bc_pad: false,
            per_t: 0.0,
            restrict_dom: None,
            seed: 0,
        }
    }
}

impl ProblemConfig {
    /// Reject invalid parameter combinations before any numerics run.
    pub fn validate(&self, grid: Grid2D) -> Result<()> {
        if grid.nx != grid.ny {
            return Err(InverseError::config(format!(
                "spectral filtering requires a square grid, got {}x{}",
                grid.nx, grid.ny
            )));
        }
        if !(0.0..=100.0).contains(&self.err_lvl) {
            return Err(InverseError::config(format!(
                "err_lvl must lie in [0, 100], got {}",
                self.err_lvl
            )));
        }
        if self.per_bc_pad && !self.per_bc {
            return Err(InverseError::config(
                "per_bc_pad requires periodic boundary conditions",
            ));
        }
        if self.per_bc && self.recon {
            return Err(InverseError::config(
                "reconstruction not implemented for periodic boundary conditions",
            ));
        }
        if self.per_bc && self.per_t <= 0.0 {
            return Err(InverseError::config(format!(
                "periodic half-width per_t must be positive, got {}",
                self.per_t
            )));
        }
        if let Some((l, r)) = self.restrict_dom {
            if !self.per_bc {
                return Err(InverseError::config(
                    "restrict_dom is only defined for periodic boundary conditions",
                ));
            }
            if l >= r || r > grid.nx {
                return Err(InverseError::config(format!(
                    "restrict_dom window [{l}, {r}) is invalid for nx = {}",
                    grid.nx
                )));
            }
        }
        if self.per_bc_pad {
            let (l, r) = self.restrict_dom.ok_or_else(|| {
                InverseError::config("per_bc_pad requires a restrict_dom window")
            })?;
            let inner = r - l;
            let (pad_x, pad_y) = (grid.nx / 4, grid.ny / 4);
            if inner + 2 * pad_x != grid.nx || inner + 2 * pad_y != grid.ny {
                return Err(InverseError::config(format!(
                    "padded domain mismatch: restricted width {inner} plus pads \
                     ({pad_x}, {pad_y}) per side must reproduce the kernel shape \
                     {}x{}",
                    grid.nx, grid.ny
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Problem instance
// ============================================================================

/// An immutable inverse-problem instance: operator, synthetic data, and
/// spectral projections, ready for filter invocations.
#[derive(Debug)]
pub struct Problem<B: SpectralBackend> {
    backend: B,
    config: ProblemConfig,
    /// Working grid after any domain restriction.
    grid: Grid2D,
    operator: ForwardOperator,
    x_true: Image2D,
    ax: Image2D,
    sigma: f64,
    b: Image2D,
    spectral: SpectralDomain,
}

impl<B: SpectralBackend> Problem<B> {
    /// Build a problem from `x_true` and the injected collaborators.
    ///
    /// `x_true` fixes the original grid (`hx = 1/nx`); with a
    /// `restrict_dom` window, the stored truth, data, and noise level
    /// are all recomputed on the cropped shape.
    pub fn new(
        backend: B,
        config: ProblemConfig,
        x_true: Image2D,
        kernel: &dyn BlurKernel,
        discretizer: &dyn Discretizer,
    ) -> Result<Self> {
        let grid = x_true.grid();
        config.validate(grid)?;

        if !config.per_bc {
            let operator =
                ForwardOperator::separable(grid, config.sig, config.recon, kernel, discretizer)?;
            let ax = operator.apply(&backend, &x_true);
            let sigma = noise_sigma(&ax, config.err_lvl);
            let b = noisy_data(&ax, sigma, config.seed);
            let spectral = SpectralDomain::transform(&backend, &operator, &b, &x_true)?;
            return Ok(Self {
                backend,
                config,
                grid,
                operator,
                x_true,
                ax,
                sigma,
                b,
                spectral,
            });
        }

        // Periodic branch: full-domain blur first, then restriction.
        let ahat = ForwardOperator::frequency_kernel(
            &backend,
            grid,
            config.per_t,
            config.sig,
            config.recon,
            kernel,
        )?;
        let ax_full = convolve(&backend, &ahat, &x_true, false);

        let (x_true, ax) = match config.restrict_dom {
            Some((l, r)) => (x_true.crop(l, r, l, r), ax_full.crop(l, r, l, r)),
            None => (x_true, ax_full),
        };
        let work_grid = ax.grid();
        let sigma = noise_sigma(&ax, config.err_lvl);
        let b = noisy_data(&ax, sigma, config.seed);

        let operator = if config.per_bc_pad {
            let (pad_x, pad_y) = (grid.nx / 4, grid.ny / 4);
            let mask = pad_mask(work_grid, pad_x, pad_y);
            ForwardOperator::CirculantPadded {
                ahat,
                mask,
                pad_x,
                pad_y,
            }
        } else {
            match config.restrict_dom {
                Some((l, r)) => {
                    // Keep the centered frequency window matching the
                    // restricted spatial extent.
                    let inner = r - l;
                    let (ml, mr) = (inner / 2, 3 * inner / 2);
                    if mr > grid.nx {
                        return Err(InverseError::config(format!(
                            "restricted frequency window [{ml}, {mr}) exceeds the \
                             kernel shape {}x{}",
                            grid.nx, grid.ny
                        )));
                    }
                    ForwardOperator::Circulant {
                        ahat: ahat.crop(ml, mr, ml, mr),
                    }
                }
                None => ForwardOperator::Circulant { ahat },
            }
        };

        let spectral = SpectralDomain::transform(&backend, &operator, &b, &x_true)?;
        Ok(Self {
            backend,
            config,
            grid: work_grid,
            operator,
            x_true,
            ax,
            sigma,
            b,
            spectral,
        })
    }

    /// Apply a regularization filter and return the spatial estimate.
    pub fn filtered_solution(&self, spec: &FilterSpec) -> Result<FilteredSolution> {
        apply_filter(&self.backend, &self.operator, &self.spectral, spec, self.sigma)
    }

    /// Data-misfit residual `A·(x_alpha − b)` for a candidate solution.
    pub fn residual(&self, x_alpha: &Image2D) -> Result<Image2D> {
        crate::residual::residual(&self.backend, &self.operator, &self.b, x_alpha)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &ProblemConfig {
        &self.config
    }

    /// Working grid (post-restriction).
    pub fn grid(&self) -> Grid2D {
        self.grid
    }

    pub fn operator(&self) -> &ForwardOperator {
        &self.operator
    }

    pub fn spectral(&self) -> &SpectralDomain {
        &self.spectral
    }

    /// True solution on the working grid.
    pub fn x_true(&self) -> &Image2D {
        &self.x_true
    }

    /// Exact blurred signal on the working grid.
    pub fn ax(&self) -> &Image2D {
        &self.ax
    }

    /// Calibrated noise standard deviation.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Blurred, noisy data.
    pub fn b(&self) -> &Image2D {
        &self.b
    }
}
