//! Breeden-Litzenberger density of a generalized Black-Scholes process.

use super::{check_probability, check_time, RiskNeutralDensityCalculator};
use ql_core::{ensure_config, ensure_domain, errors::Result, Probability, Real, Time};
use ql_instruments::OptionType;
use ql_math::{invert_cdf, normal_cdf_inverse, QuantileSearch};
use ql_pricingengines::BlackCalculator;
use ql_processes::GeneralizedBlackScholesProcess;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Finite-difference and root-finding settings of [`GbsmRndCalculator`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GbsmRndConfig {
    /// Relative strike step of the pdf difference.
    pub pdf_step: Real,
    /// Relative strike step of the volatility slope.
    pub vol_step: Real,
    /// Absolute accuracy of quantiles in log-strike.
    pub quantile_accuracy: Real,
}

impl Default for GbsmRndConfig {
    fn default() -> Self {
        Self {
            pdf_step: 1.0e-3,
            vol_step: 1.0e-3,
            quantile_accuracy: 1.0e-10,
        }
    }
}

impl GbsmRndConfig {
    /// Set the relative pdf step.
    pub fn with_pdf_step(mut self, step: Real) -> Self {
        self.pdf_step = step;
        self
    }

    /// Set the relative step of the volatility slope.
    pub fn with_vol_step(mut self, step: Real) -> Self {
        self.vol_step = step;
        self
    }

    /// Set the quantile accuracy.
    pub fn with_quantile_accuracy(mut self, accuracy: Real) -> Self {
        self.quantile_accuracy = accuracy;
        self
    }
}

/// Density implied by the process' Black volatility surface.
///
/// `cdf_K(K) = ∂P/∂K / D`, where the put `P` is priced with the volatility
/// at its own strike, so
///
/// `∂P/∂K = ∂P/∂K|_σ + vega·∂σ/∂K`.
///
/// The strike density is the centred difference of `cdf_K`. The
/// log-price contract uses `x = ln K`.
#[derive(Debug, Clone)]
pub struct GbsmRndCalculator {
    process: Arc<GeneralizedBlackScholesProcess>,
    config: GbsmRndConfig,
}

impl GbsmRndCalculator {
    /// # Errors
    /// `Error::Configuration` unless both relative steps lie in `(0, 0.1]`
    /// and the accuracy is positive.
    pub fn new(process: Arc<GeneralizedBlackScholesProcess>, config: GbsmRndConfig) -> Result<Self> {
        for (name, step) in [("pdf", config.pdf_step), ("vol", config.vol_step)] {
            ensure_config!(step > 0.0 && step <= 0.1, "{name} step must be in (0, 0.1], got {step}");
        }
        ensure_config!(
            config.quantile_accuracy > 0.0,
            "quantile accuracy must be positive, got {}",
            config.quantile_accuracy
        );
        Ok(Self { process, config })
    }

    /// The process.
    pub fn process(&self) -> &Arc<GeneralizedBlackScholesProcess> {
        &self.process
    }

    /// `P(S_t ≤ strike)`.
    ///
    /// # Errors
    /// `Error::Domain` for `t ≤ 0` or a non-positive strike; surface errors
    /// are propagated.
    pub fn cdf_strike(&self, strike: Real, t: Time) -> Result<Probability> {
        check_time(t)?;
        ensure_domain!(strike > 0.0 && strike.is_finite(), "strike must be positive, got {strike}");

        let black_vol = self.process.black_volatility();
        let vol = black_vol.black_vol(t, strike)?;
        let dk = self.config.vol_step * strike;
        let slope = (black_vol.black_vol(t, strike + dk)? - black_vol.black_vol(t, strike - dk)?)
            / (2.0 * dk);

        let discount = self.process.risk_free_rate().discount(t);
        let put = BlackCalculator::new(
            OptionType::Put,
            strike,
            self.process.forward(t),
            vol * t.sqrt(),
            discount,
        )?;
        let dp_dk = put.strike_sensitivity() + put.vega(t) * slope;
        Ok((dp_dk / discount).clamp(0.0, 1.0))
    }

    /// Density of `S_t` at `strike`.
    ///
    /// # Errors
    /// As [`cdf_strike`](Self::cdf_strike).
    pub fn pdf_strike(&self, strike: Real, t: Time) -> Result<Real> {
        check_time(t)?;
        ensure_domain!(strike > 0.0 && strike.is_finite(), "strike must be positive, got {strike}");
        let h = self.config.pdf_step * strike;
        let up = self.cdf_strike(strike + h, t)?;
        let down = self.cdf_strike(strike - h, t)?;
        Ok(((up - down) / (2.0 * h)).max(0.0))
    }

    /// Strike with `P(S_t ≤ K) = p`.
    ///
    /// # Errors
    /// `Error::Domain` for `t ≤ 0` or `p ∉ (0, 1)`; `Error::Convergence`
    /// if the inversion fails.
    pub fn invcdf_strike(&self, p: Probability, t: Time) -> Result<Real> {
        Ok(self.invcdf(p, t)?.exp())
    }
}

impl RiskNeutralDensityCalculator for GbsmRndCalculator {
    fn pdf(&self, x: Real, t: Time) -> Result<Real> {
        let strike = x.exp();
        Ok(strike * self.pdf_strike(strike, t)?)
    }

    fn cdf(&self, x: Real, t: Time) -> Result<Probability> {
        self.cdf_strike(x.exp(), t)
    }

    fn invcdf(&self, p: Probability, t: Time) -> Result<Real> {
        check_time(t)?;
        check_probability(p)?;
        let forward = self.process.forward(t);
        let atm_vol = self.process.black_volatility().black_vol(t, forward)?;
        let sd = (atm_vol * t.sqrt()).max(1.0e-4);
        let guess = forward.ln() - 0.5 * sd * sd + sd * normal_cdf_inverse(p)?;
        let search = QuantileSearch::new(guess, 0.1 * sd).with_accuracy(self.config.quantile_accuracy);
        invert_cdf(|x| self.cdf(x, t), |x| self.pdf(x, t), p, &search)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk_neutral_density::BsmRndCalculator;
    use approx::assert_abs_diff_eq;
    use ql_processes::black_scholes_merton_process;
    use ql_termstructures::{BlackVolTermStructure, FlatForward};
    use ql_core::Volatility;

    #[test]
    fn flat_surface_reproduces_lognormal() {
        let process = Arc::new(black_scholes_merton_process(100.0, 0.05, 0.01, 0.3).unwrap());
        let gbsm = GbsmRndCalculator::new(process, GbsmRndConfig::default()).unwrap();
        let bsm = BsmRndCalculator::new(
            100.0,
            Arc::new(FlatForward::new(0.05)),
            Arc::new(FlatForward::new(0.01)),
            0.3,
        )
        .unwrap();
        let t = 0.8;
        for &k in &[60.0, 90.0, 100.0, 125.0, 170.0] {
            let x = Real::ln(k);
            assert_abs_diff_eq!(gbsm.cdf(x, t).unwrap(), bsm.cdf(x, t).unwrap(), epsilon = 1e-10);
            assert_abs_diff_eq!(gbsm.pdf(x, t).unwrap(), bsm.pdf(x, t).unwrap(), epsilon = 1e-5);
        }
        for &p in &[0.05, 0.5, 0.95] {
            assert_abs_diff_eq!(gbsm.invcdf(p, t).unwrap(), bsm.invcdf(p, t).unwrap(), epsilon = 1e-5);
        }
    }

    /// Linear smile in strike.
    #[derive(Debug)]
    struct LinearSmile;

    impl BlackVolTermStructure for LinearSmile {
        fn black_vol_impl(&self, _t: Time, strike: Real) -> Result<Volatility> {
            Ok(0.25 - 0.001 * (strike - 100.0))
        }
    }

    #[test]
    fn skew_moves_mass_to_the_left() {
        let flat = Arc::new(black_scholes_merton_process(100.0, 0.0, 0.0, 0.25).unwrap());
        let skewed = Arc::new(
            ql_processes::GeneralizedBlackScholesProcess::new(
                100.0,
                Arc::new(FlatForward::new(0.0)),
                Arc::new(FlatForward::new(0.0)),
                Arc::new(LinearSmile),
            )
            .unwrap(),
        );
        let flat = GbsmRndCalculator::new(flat, GbsmRndConfig::default()).unwrap();
        let skewed = GbsmRndCalculator::new(skewed, GbsmRndConfig::default()).unwrap();
        assert!(skewed.cdf_strike(80.0, 0.5).unwrap() > flat.cdf_strike(80.0, 0.5).unwrap());

        let k = skewed.invcdf_strike(0.3, 0.5).unwrap();
        assert_abs_diff_eq!(skewed.cdf_strike(k, 0.5).unwrap(), 0.3, epsilon = 1e-9);
    }

    #[test]
    fn rejects_bad_queries_and_steps() {
        let process = Arc::new(black_scholes_merton_process(100.0, 0.05, 0.01, 0.3).unwrap());
        let gbsm = GbsmRndCalculator::new(Arc::clone(&process), GbsmRndConfig::default()).unwrap();
        assert!(gbsm.cdf_strike(-5.0, 1.0).is_err());
        assert!(gbsm.pdf_strike(100.0, 0.0).is_err());
        assert!(gbsm.invcdf_strike(0.0, 1.0).is_err());
        assert!(GbsmRndCalculator::new(process, GbsmRndConfig::default().with_pdf_step(0.0)).is_err());
    }
}
