//! Risk-neutral densities of the log-price at a future time.
//!
//! Every calculator answers three queries for a horizon `t > 0`:
//!
//! * `pdf(x, t)`: density of `X_t = ln S_t` at `x`
//! * `cdf(x, t)`: `P(X_t ≤ x)`
//! * `invcdf(p, t)`: the `x` with `cdf(x, t) = p`
//!
//! The square-root calculator reads `x` as the variance level itself.
//!
//! | calculator | dynamics | method |
//! |---|---|---|
//! | [`BsmRndCalculator`] | lognormal, constant vol | closed form |
//! | [`HestonRndCalculator`] | Heston | Fourier inversion of the characteristic function |
//! | [`GbsmRndCalculator`] | any Black vol surface | Breeden-Litzenberger |
//! | [`LocalVolRndCalculator`] | local volatility | forward Fokker-Planck PDE |
//! | [`SquareRootProcessRndCalculator`] | CIR | noncentral χ², Gamma stationary law |

use ql_core::{ensure_domain, errors::Result, Probability, Real, Time};

mod bsm;
mod gbsm;
mod heston;
mod local_vol;
mod square_root;

pub use bsm::BsmRndCalculator;
pub use gbsm::{GbsmRndCalculator, GbsmRndConfig};
pub use heston::{HestonRndCalculator, HestonRndConfig};
pub use local_vol::{DensitySlice, LocalVolRndCalculator, LocalVolRndConfig};
pub use ql_math::{invert_cdf, QuantileSearch};
pub use square_root::SquareRootProcessRndCalculator;

/// A risk-neutral density of the log-price at horizon `t`.
///
/// Calculators are immutable after construction and may be queried from
/// several threads at once.
pub trait RiskNeutralDensityCalculator: Send + Sync {
    /// Density at `x`.
    fn pdf(&self, x: Real, t: Time) -> Result<Real>;

    /// Cumulative probability at `x`.
    fn cdf(&self, x: Real, t: Time) -> Result<Probability>;

    /// Quantile for probability `p ∈ (0, 1)`.
    fn invcdf(&self, p: Probability, t: Time) -> Result<Real>;
}

pub(crate) fn check_time(t: Time) -> Result<()> {
    ensure_domain!(t > 0.0 && t.is_finite(), "time must be positive, got {t}");
    Ok(())
}

pub(crate) fn check_probability(p: Probability) -> Result<()> {
    ensure_domain!(p > 0.0 && p < 1.0, "probability {p} outside (0, 1)");
    Ok(())
}
