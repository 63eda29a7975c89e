//! `LocalVolSurface`: Dupire local volatility surface.
//!
//! Computes local volatilities from an implied (Black) volatility surface
//! using Dupire's formula written in total variance and log-moneyness.

use crate::black_vol_term_structure::BlackVolTermStructure;
use crate::local_vol_term_structure::LocalVolTermStructure;
use crate::yield_term_structure::YieldTermStructure;
use ql_core::{
    ensure_config, ensure_domain,
    errors::{Error, Result},
    fail, Real, Time, Volatility,
};
use std::sync::Arc;
use tracing::warn;

/// Log-moneyness bump for the strike derivatives.
const DY: Real = 1.0e-3;
/// Largest time bump for the calendar derivative.
const MAX_DT: Time = 1.0e-4;

/// A local volatility surface derived from a Black volatility surface via
/// Dupire's formula.
///
/// Given a Black volatility surface `σ_B(T, K)`, the local variance is:
///
/// $$\sigma^2_\text{loc}(T, K) = \frac{\frac{\partial w}{\partial T}}
///     {1 - \frac{y}{w}\frac{\partial w}{\partial y}
///       + \frac14\left(-\frac14 - \frac{1}{w} + \frac{y^2}{w^2}\right)
///              \left(\frac{\partial w}{\partial y}\right)^2
///       + \frac12 \frac{\partial^2 w}{\partial y^2}}$$
///
/// where `w = σ²·T` is the total implied variance and `y = ln(K/F)` is
/// the log-moneyness. The calendar derivative is taken at constant `y`.
///
/// A negative numerator or a non-positive denominator means the input
/// surface admits calendar or butterfly arbitrage at that point. Such points
/// are errors unless a fallback volatility was set with
/// [`with_fallback_vol`](Self::with_fallback_vol).
#[derive(Debug, Clone)]
pub struct LocalVolSurface {
    black_vol: Arc<dyn BlackVolTermStructure>,
    risk_free_rate: Arc<dyn YieldTermStructure>,
    dividend_yield: Arc<dyn YieldTermStructure>,
    underlying: Real,
    fallback_vol: Option<Volatility>,
}

impl LocalVolSurface {
    /// Create a new LocalVolSurface from a Black vol surface.
    ///
    /// # Errors
    /// Rejects a non-positive spot.
    pub fn new(
        black_vol: Arc<dyn BlackVolTermStructure>,
        risk_free_rate: Arc<dyn YieldTermStructure>,
        dividend_yield: Arc<dyn YieldTermStructure>,
        underlying: Real,
    ) -> Result<Self> {
        ensure_config!(
            underlying > 0.0 && underlying.is_finite(),
            "underlying must be positive, got {underlying}"
        );
        Ok(Self {
            black_vol,
            risk_free_rate,
            dividend_yield,
            underlying,
            fallback_vol: None,
        })
    }

    /// Return `vol` instead of failing where the Dupire variance is illegal.
    pub fn with_fallback_vol(mut self, vol: Volatility) -> Self {
        self.fallback_vol = Some(vol);
        self
    }

    /// The configured fallback volatility, if any.
    pub fn fallback_vol(&self) -> Option<Volatility> {
        self.fallback_vol
    }

    /// Forward price for time `t`.
    pub fn forward(&self, t: Time) -> Real {
        let df_r = self.risk_free_rate.discount(t);
        let df_q = self.dividend_yield.discount(t);
        self.underlying * df_q / df_r
    }

    /// Total Black variance at time `t` and log-moneyness `y`.
    fn total_variance(&self, t: Time, y: Real) -> Result<Real> {
        let strike = self.forward(t) * y.exp();
        self.black_vol.black_variance(t, strike)
    }

    /// Dupire local volatility; illegal points are `Error::Runtime`.
    fn dupire_local_vol(&self, t: Time, underlying: Real) -> Result<Volatility> {
        let y = (underlying / self.forward(t)).ln();
        let w = self.total_variance(t, y)?;

        let dwdt = if t == 0.0 {
            (self.total_variance(MAX_DT, y)? - w) / MAX_DT
        } else {
            let dt = MAX_DT.min(0.5 * t);
            (self.total_variance(t + dt, y)? - self.total_variance(t - dt, y)?) / (2.0 * dt)
        };
        if dwdt < 0.0 {
            fail!("negative calendar slope {dwdt}");
        }

        // w vanishes identically at t = 0, so only the calendar term survives
        let (dwdy, d2wdy2) = if t > 0.0 {
            let wp = self.total_variance(t, y + DY)?;
            let wm = self.total_variance(t, y - DY)?;
            ((wp - wm) / (2.0 * DY), (wp - 2.0 * w + wm) / (DY * DY))
        } else {
            (0.0, 0.0)
        };

        let local_variance = if dwdy == 0.0 && d2wdy2 == 0.0 {
            dwdt
        } else {
            let den1 = 1.0 - y / w * dwdy;
            let den2 = 0.25 * (-0.25 - 1.0 / w + y * y / (w * w)) * dwdy * dwdy;
            let den3 = 0.5 * d2wdy2;
            let den = den1 + den2 + den3;
            if !(den > 0.0) {
                fail!("non-positive denominator {den}");
            }
            dwdt / den
        };

        if !(local_variance >= 0.0 && local_variance.is_finite()) {
            fail!("local variance {local_variance} is not admissible");
        }
        Ok(local_variance.sqrt())
    }
}

impl LocalVolTermStructure for LocalVolSurface {
    /// Dupire local volatility at `(t, underlying)`.
    ///
    /// With a fallback volatility configured, any failure past the domain
    /// checks (illegal variance or a failing Black surface) returns the
    /// fallback instead.
    fn local_vol(&self, t: Time, underlying: Real) -> Result<Volatility> {
        ensure_domain!(t >= 0.0, "negative time {t}");
        ensure_domain!(underlying > 0.0, "non-positive underlying {underlying}");

        match (self.dupire_local_vol(t, underlying), self.fallback_vol) {
            (Ok(vol), _) => Ok(vol),
            (Err(e), Some(fallback)) => {
                warn!(t, underlying, fallback, error = %e, "illegal local variance, using fallback");
                Ok(fallback)
            }
            (Err(Error::Runtime(reason)), None) => {
                fail!("illegal local variance at t = {t}, S = {underlying}: {reason}")
            }
            (Err(e), None) => Err(e),
        }
    }
}
