//! # ql-math
//!
//! Mathematical utilities shared by the density calculators: normal, gamma
//! and (noncentral) chi-squared distributions (special functions via
//! statrs), adaptive Gauss-Lobatto quadrature, natural cubic splines and
//! bracketing 1D solvers.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Floating-point comparison utilities.
pub mod comparison;

/// Probability distributions.
pub mod distributions;

/// Numerical integration.
pub mod integrals;

/// 1D interpolation schemes.
pub mod interpolations;

/// 1D root-finding solvers.
pub mod solvers1d;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use comparison::close_enough;
pub use distributions::{
    normal_cdf, normal_cdf_inverse, normal_pdf, GammaDistribution,
    NonCentralChiSquaredDistribution,
};
pub use integrals::{GaussLobattoIntegral, Integrator};
pub use interpolations::{CubicNaturalSpline, Interpolation1D, LinearInterpolation};
pub use solvers1d::{
    bracket_root, invert_cdf, invert_positive_cdf, newton_safe, QuantileSearch,
};
