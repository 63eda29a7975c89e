//! # ql-core
//!
//! Scalar aliases, the workspace `Error` and the validation macros every
//! other crate returns early with.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Error types and the `ensure!` / `ensure_config!` / `ensure_domain!` /
/// `fail!` macros.
pub mod errors;

/// Floating-point scalar.
pub type Real = f64;

/// A rate expressed as a decimal (e.g. 0.05 = 5 %).
pub type Rate = Real;

/// A discount factor in (0, 1].
pub type DiscountFactor = Real;

/// Annualised volatility, as a decimal.
pub type Volatility = Real;

/// A probability in [0, 1].
pub type Probability = Real;

/// A year fraction.
pub type Time = Real;

pub use errors::{Error, Result};
