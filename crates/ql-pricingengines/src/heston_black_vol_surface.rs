//! Black volatility surface implied by a Heston model.

use crate::analytic_heston_engine::AnalyticHestonPricer;
use crate::black_calculator::black_implied_std_dev;
use ql_core::{errors::Result, Real, Time, Volatility};
use ql_instruments::OptionType;
use ql_termstructures::BlackVolTermStructure;
use std::sync::Arc;

/// Implied volatilities of Heston option prices.
///
/// Each query prices the out-of-the-money option (put below the forward,
/// call above) and inverts the Black formula. At `t = 0` the surface
/// returns the instantaneous volatility `√v₀`.
#[derive(Debug, Clone)]
pub struct HestonBlackVolSurface {
    pricer: Arc<AnalyticHestonPricer>,
}

impl HestonBlackVolSurface {
    /// Surface backed by `pricer`, whose maturity cache is shared.
    pub fn new(pricer: Arc<AnalyticHestonPricer>) -> Self {
        Self { pricer }
    }

    /// The underlying pricer.
    pub fn pricer(&self) -> &Arc<AnalyticHestonPricer> {
        &self.pricer
    }
}

impl BlackVolTermStructure for HestonBlackVolSurface {
    fn black_vol_impl(&self, t: Time, strike: Real) -> Result<Volatility> {
        if t == 0.0 {
            return Ok(self.pricer.process().v0().sqrt());
        }
        Ok((self.black_variance_impl(t, strike)? / t).sqrt())
    }

    fn black_variance_impl(&self, t: Time, strike: Real) -> Result<Real> {
        if t == 0.0 {
            return Ok(0.0);
        }
        let forward = self.pricer.process().forward(t);
        let option_type = OptionType::out_of_the_money(strike, forward);
        let price = self.pricer.undiscounted_price(option_type, strike, t)?;
        let std_dev = black_implied_std_dev(option_type, strike, forward, price)?;
        Ok(std_dev * std_dev)
    }
}
