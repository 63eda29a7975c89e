//! # ql-experimental
//!
//! Risk-neutral density calculators for the log-price of an underlying
//! under Black-Scholes-Merton, Heston, implied-volatility-surface and
//! local-volatility dynamics, plus the transition law of the square-root
//! process. Also hosts the Dumas parametric volatility surface used to
//! exercise the local-volatility machinery on a smile.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Risk-neutral density calculators.
pub mod risk_neutral_density;

/// Dumas-Fleming-Whaley parametric Black volatility surface.
pub mod dumas_vol_surface;

pub use dumas_vol_surface::DumasParametricVolSurface;

pub use risk_neutral_density::{
    BsmRndCalculator, DensitySlice, GbsmRndCalculator, GbsmRndConfig, HestonRndCalculator,
    HestonRndConfig, LocalVolRndCalculator, LocalVolRndConfig, RiskNeutralDensityCalculator,
    SquareRootProcessRndCalculator,
};
