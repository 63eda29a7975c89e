//! Analytic European option engine (Black-Scholes-Merton).
//!
//! Prices European vanilla options in closed form from the process' curves
//! and Black volatility surface.

use crate::black_calculator::BlackCalculator;
use ql_core::{errors::Result, Real};
use ql_instruments::{EuropeanOption, PricingEngine};
use ql_processes::GeneralizedBlackScholesProcess;

use std::sync::Arc;

/// Analytic pricing engine for European vanilla options.
///
/// $$C = S e^{-qT} N(d_1) - K e^{-rT} N(d_2)$$
/// $$P = K e^{-rT} N(-d_2) - S e^{-qT} N(-d_1)$$
///
/// with the variance read from the process' Black surface at `(T, K)`.
#[derive(Debug, Clone)]
pub struct AnalyticEuropeanEngine {
    process: Arc<GeneralizedBlackScholesProcess>,
}

impl AnalyticEuropeanEngine {
    /// Create a new engine with the given Black-Scholes process.
    pub fn new(process: Arc<GeneralizedBlackScholesProcess>) -> Self {
        Self { process }
    }

    /// Black calculator for `option`, exposing the sensitivities.
    pub fn calculator(&self, option: &EuropeanOption) -> Result<BlackCalculator> {
        let t = option.maturity();
        let strike = option.strike();
        let variance = self.process.black_volatility().black_variance(t, strike)?;
        BlackCalculator::new(
            option.option_type(),
            strike,
            self.process.forward(t),
            variance.sqrt(),
            self.process.risk_free_rate().discount(t),
        )
    }
}

impl PricingEngine for AnalyticEuropeanEngine {
    fn npv(&self, option: &EuropeanOption) -> Result<Real> {
        Ok(self.calculator(option)?.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ql_instruments::OptionType;
    use ql_processes::black_scholes_merton_process;

    #[test]
    fn bs_call_atm() {
        // S = 100, K = 100, r = 5 %, q = 0, σ = 20 %, T = 1
        let process = Arc::new(black_scholes_merton_process(100.0, 0.05, 0.0, 0.20).unwrap());
        let engine = AnalyticEuropeanEngine::new(process);
        let call = EuropeanOption::vanilla(OptionType::Call, 100.0, 1.0).unwrap();
        let price = engine.npv(&call).unwrap();
        assert!((price - 10.4506).abs() < 1e-3, "BS call price: {price}");
    }

    #[test]
    fn bs_put_call_parity() {
        let (s, k, r, q, t) = (100.0, 95.0, 0.05, 0.02, 0.5);
        let process = Arc::new(black_scholes_merton_process(s, r, q, 0.25).unwrap());
        let engine = AnalyticEuropeanEngine::new(process);
        let c = engine.npv(&EuropeanOption::vanilla(OptionType::Call, k, t).unwrap()).unwrap();
        let p = engine.npv(&EuropeanOption::vanilla(OptionType::Put, k, t).unwrap()).unwrap();
        let parity = s * (-q * t).exp() - k * (-r * t).exp();
        assert!((c - p - parity).abs() < 1e-10, "C - P = {}, expected {parity}", c - p);
    }

    #[test]
    fn itm_probability_below_one() {
        let process = Arc::new(black_scholes_merton_process(100.0, 0.03, 0.01, 0.3).unwrap());
        let engine = AnalyticEuropeanEngine::new(process);
        let call = EuropeanOption::vanilla(OptionType::Call, 80.0, 2.0).unwrap();
        let p = engine.calculator(&call).unwrap().itm_cash_probability();
        assert!(p > 0.5 && p < 1.0, "N(d2) = {p}");
    }
}
