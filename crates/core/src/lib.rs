//! Core math and APIs for the 2D linear inverse-problem engine.
//!
//! Solves `b = A·x_true + noise` where A is a blurring (PSF) or
//! integration operator, and recovers regularized estimates through
//! Tikhonov, truncated-spectrum, Landweber, and preconditioned-CG
//! filters under zero or periodic boundary conditions.

pub mod backend;
pub mod decomposition;
pub mod error;
pub mod field;
pub mod filter;
pub mod grid;
pub mod kernel;
pub mod noise;
pub mod operator;
pub mod problem;
pub mod residual;
pub mod spectral;

pub use backend::{SpectralBackend, SpectralBuffer};
pub use error::{InverseError, Result};
pub use field::{Field2D, Image2D};
pub use filter::{FilterSpec, FilteredSolution};
pub use grid::Grid2D;
pub use kernel::{BlurKernel, Discretizer};
pub use operator::ForwardOperator;
pub use problem::{Problem, ProblemConfig};
pub use spectral::SpectralDomain;

#[cfg(test)]
mod _tests_support;

#[cfg(test)]
mod _tests_problem;
#[cfg(test)]
mod _tests_spectral;
