//! Error types for the workspace.
//!
//! A single `thiserror`-derived enum covers the three failure classes of the
//! density calculators: invalid construction parameters, out-of-domain
//! queries, and root-finders that exhaust their iteration budget. The
//! `ensure!`, `ensure_config!`, `ensure_domain!` and `fail!` macros return
//! early with the matching variant.

use thiserror::Error;

/// The top-level error type used throughout the workspace.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// General runtime error, e.g. an illegal local variance.
    #[error("{0}")]
    Runtime(String),

    /// Precondition violated in a numerical utility.
    #[error("precondition not satisfied: {0}")]
    Precondition(String),

    /// Invalid construction parameters.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Query outside the domain of the function (`t <= 0`, `p` outside
    /// `(0, 1)`, ...).
    #[error("domain error: {0}")]
    Domain(String),

    /// An iterative solver did not converge within its budget.
    #[error("{solver}: no convergence after {iterations} iterations")]
    Convergence {
        /// Name of the solver that failed.
        solver: &'static str,
        /// Number of iterations (or function evaluations) spent.
        iterations: usize,
    },
}

/// Shorthand `Result` type used throughout the workspace.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Returns `Err(Error::Precondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use ql_core::{ensure, errors::Error};
/// fn positive(x: f64) -> ql_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(positive(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Precondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Configuration(...))` if `$cond` is false.
///
/// Used by constructors; invalid parameters are never deferred to query time.
///
/// # Example
/// ```
/// use ql_core::{ensure_config, errors::Error};
/// fn vol(v: f64) -> ql_core::errors::Result<f64> {
///     ensure_config!(v >= 0.0, "negative volatility {v}");
///     Ok(v)
/// }
/// assert!(matches!(vol(-0.1), Err(Error::Configuration(_))));
/// ```
#[macro_export]
macro_rules! ensure_config {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Configuration(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Domain(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use ql_core::{ensure_domain, errors::Error};
/// fn quantile(p: f64) -> ql_core::errors::Result<f64> {
///     ensure_domain!(p > 0.0 && p < 1.0, "probability {p} outside (0, 1)");
///     Ok(p)
/// }
/// assert!(matches!(quantile(1.0), Err(Error::Domain(_))));
/// ```
#[macro_export]
macro_rules! ensure_domain {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Domain(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Runtime(...))` immediately.
///
/// # Example
/// ```
/// use ql_core::{fail, errors::Error};
/// fn always_err() -> ql_core::errors::Result<()> {
///     fail!("something went wrong");
/// }
/// assert!(always_err().is_err());
/// ```
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::Runtime(format!($($msg)*)))
    };
}
