//! Probability distributions.
//!
//! Normal, Gamma and noncentral chi-squared laws. Special functions (`erfc`,
//! `ln_gamma`, the regularized incomplete gamma) come from `statrs`; the
//! quantile functions that have no closed form go through
//! [`invert_cdf`](crate::solvers1d::invert_cdf).

pub mod chi_square;
pub mod gamma;
pub mod normal;

pub use chi_square::NonCentralChiSquaredDistribution;
pub use gamma::GammaDistribution;
pub use normal::{normal_cdf, normal_cdf_inverse, normal_pdf};
