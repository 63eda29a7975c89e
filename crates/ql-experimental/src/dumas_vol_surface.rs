//! Dumas-Fleming-Whaley parametric volatility surface.

use ql_core::{ensure_config, errors::Result, Real, Time, Volatility};
use ql_termstructures::{BlackVolTermStructure, YieldTermStructure};
use std::sync::Arc;

/// Black volatility quadratic in time-scaled moneyness:
///
/// ```text
/// mn  = ln(F(t)/K) / √t
/// vol = b1 + b2·mn + b3·mn² + b4·t + b5·mn·t
/// ```
///
/// At `t = 0` the moneyness is undefined and `b1` is returned.
#[derive(Debug, Clone)]
pub struct DumasParametricVolSurface {
    b1: Real,
    b2: Real,
    b3: Real,
    b4: Real,
    b5: Real,
    spot: Real,
    risk_free_rate: Arc<dyn YieldTermStructure>,
    dividend_yield: Arc<dyn YieldTermStructure>,
}

impl DumasParametricVolSurface {
    /// # Errors
    /// `Error::Configuration` for a non-positive spot or a negative `b1`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        b1: Real,
        b2: Real,
        b3: Real,
        b4: Real,
        b5: Real,
        spot: Real,
        risk_free_rate: Arc<dyn YieldTermStructure>,
        dividend_yield: Arc<dyn YieldTermStructure>,
    ) -> Result<Self> {
        ensure_config!(spot > 0.0 && spot.is_finite(), "spot must be positive, got {spot}");
        ensure_config!(b1 >= 0.0, "level b1 must be non-negative, got {b1}");
        Ok(Self {
            b1,
            b2,
            b3,
            b4,
            b5,
            spot,
            risk_free_rate,
            dividend_yield,
        })
    }

    /// The level coefficient, also the volatility at `t = 0`.
    pub fn b1(&self) -> Real {
        self.b1
    }
}

impl BlackVolTermStructure for DumasParametricVolSurface {
    fn black_vol_impl(&self, t: Time, strike: Real) -> Result<Volatility> {
        if t < Real::EPSILON {
            return Ok(self.b1);
        }
        let forward = self.spot * self.dividend_yield.discount(t) / self.risk_free_rate.discount(t);
        let mn = (forward / strike).ln() / t.sqrt();
        Ok(self.b1 + self.b2 * mn + self.b3 * mn * mn + self.b4 * t + self.b5 * mn * t)
    }
}
