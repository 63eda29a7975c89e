//! Lognormal density of the Black-Scholes-Merton model.

use super::{check_probability, check_time, RiskNeutralDensityCalculator};
use ql_core::{ensure_config, errors::Result, Probability, Real, Time, Volatility};
use ql_math::{normal_cdf, normal_cdf_inverse, normal_pdf};
use ql_termstructures::YieldTermStructure;
use std::sync::Arc;

/// Closed-form density of `ln S_t` under constant volatility.
///
/// `ln S_t` is normal with mean `xm = ln F(t) − v²t/2` and standard
/// deviation `sd = v√t`.
#[derive(Debug, Clone)]
pub struct BsmRndCalculator {
    spot: Real,
    risk_free_rate: Arc<dyn YieldTermStructure>,
    dividend_yield: Arc<dyn YieldTermStructure>,
    volatility: Volatility,
}

impl BsmRndCalculator {
    /// # Errors
    /// `Error::Configuration` for a non-positive spot or a non-positive or
    /// non-finite volatility.
    pub fn new(
        spot: Real,
        risk_free_rate: Arc<dyn YieldTermStructure>,
        dividend_yield: Arc<dyn YieldTermStructure>,
        volatility: Volatility,
    ) -> Result<Self> {
        ensure_config!(spot > 0.0 && spot.is_finite(), "spot must be positive, got {spot}");
        ensure_config!(
            volatility > 0.0 && volatility.is_finite(),
            "volatility must be positive, got {volatility}"
        );
        Ok(Self {
            spot,
            risk_free_rate,
            dividend_yield,
            volatility,
        })
    }

    /// `(xm, sd)` at horizon `t`.
    pub fn distribution_params(&self, t: Time) -> (Real, Real) {
        let forward = self.spot * self.dividend_yield.discount(t) / self.risk_free_rate.discount(t);
        let sd = self.volatility * t.sqrt();
        (forward.ln() - 0.5 * sd * sd, sd)
    }
}

impl RiskNeutralDensityCalculator for BsmRndCalculator {
    fn pdf(&self, x: Real, t: Time) -> Result<Real> {
        check_time(t)?;
        let (xm, sd) = self.distribution_params(t);
        Ok(normal_pdf((x - xm) / sd) / sd)
    }

    fn cdf(&self, x: Real, t: Time) -> Result<Probability> {
        check_time(t)?;
        let (xm, sd) = self.distribution_params(t);
        Ok(normal_cdf((x - xm) / sd))
    }

    fn invcdf(&self, p: Probability, t: Time) -> Result<Real> {
        check_time(t)?;
        check_probability(p)?;
        let (xm, sd) = self.distribution_params(t);
        Ok(xm + sd * normal_cdf_inverse(p)?)
    }
}
