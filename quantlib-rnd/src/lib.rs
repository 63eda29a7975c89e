//! # quantlib-rnd
//!
//! Risk-neutral densities of the log-price of an underlying.
//!
//! This crate is a **façade** over the workspace crates. Application code
//! should depend on it rather than on the individual `ql-*` crates.
//!
//! ```rust
//! use quantlib_rnd::prelude::*;
//! use std::sync::Arc;
//!
//! let rnd = BsmRndCalculator::new(
//!     100.0,
//!     Arc::new(FlatForward::new(0.05)),
//!     Arc::new(FlatForward::new(0.0)),
//!     0.2,
//! )?;
//! let median = rnd.invcdf(0.5, 1.0)?;
//! assert!((rnd.cdf(median, 1.0)? - 0.5).abs() < 1e-12);
//! # Ok::<(), quantlib_rnd::core::Error>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, aliases, and error definitions.
pub use ql_core as core;

/// Distributions, quadrature, interpolation and 1D solvers.
pub use ql_math as math;

/// Yield curves and volatility surfaces.
pub use ql_termstructures as termstructures;

/// Black-Scholes, Heston and square-root processes.
pub use ql_processes as processes;

/// European options and payoffs.
pub use ql_instruments as instruments;

/// Time grids, meshers and 1D finite-difference operators.
pub use ql_methods as methods;

/// Black, Heston and finite-difference pricing engines.
pub use ql_pricingengines as pricingengines;

/// Density calculators and the Dumas surface.
pub use ql_experimental as experimental;

/// The types most applications need.
pub mod prelude {
    pub use ql_core::{Error, Probability, Real, Result, Time, Volatility};
    pub use ql_experimental::{
        BsmRndCalculator, DumasParametricVolSurface, GbsmRndCalculator, GbsmRndConfig,
        HestonRndCalculator, HestonRndConfig, LocalVolRndCalculator, LocalVolRndConfig,
        RiskNeutralDensityCalculator, SquareRootProcessRndCalculator,
    };
    pub use ql_methods::TimeGrid;
    pub use ql_processes::{black_scholes_merton_process, GeneralizedBlackScholesProcess, HestonProcess};
    pub use ql_termstructures::{
        BlackConstantVol, BlackVolTermStructure, FlatForward, LocalConstantVol, LocalVolSurface,
        LocalVolTermStructure, YieldTermStructure,
    };
}
