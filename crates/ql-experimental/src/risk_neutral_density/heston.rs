//! Heston density by inversion of the characteristic function.

use super::{check_probability, check_time, RiskNeutralDensityCalculator};
use ql_core::{ensure_config, errors::Result, fail, Probability, Real, Time};
use ql_math::{invert_cdf, normal_cdf_inverse, GaussLobattoIntegral, Integrator, QuantileSearch};
use ql_processes::HestonProcess;
use std::f64::consts::PI;
use std::sync::Arc;

use num_complex::Complex64;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// `|φ(u)|` below which the Fourier integrals are truncated.
const CF_CUTOFF: Real = 1.0e-16;
/// Doublings allowed while searching the truncation point.
const MAX_DOUBLINGS: usize = 40;

/// Quadrature and root-finding settings of [`HestonRndCalculator`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HestonRndConfig {
    /// Absolute accuracy of the Fourier integrals.
    pub integration_eps: Real,
    /// Evaluation budget of each integral.
    pub max_evaluations: usize,
    /// Absolute accuracy of quantiles.
    pub quantile_accuracy: Real,
}

impl Default for HestonRndConfig {
    fn default() -> Self {
        Self {
            integration_eps: 1.0e-8,
            max_evaluations: 10_000,
            quantile_accuracy: 1.0e-8,
        }
    }
}

impl HestonRndConfig {
    /// Set the integration accuracy.
    pub fn with_integration_eps(mut self, eps: Real) -> Self {
        self.integration_eps = eps;
        self
    }

    /// Set the evaluation budget of each integral.
    pub fn with_max_evaluations(mut self, max_evaluations: usize) -> Self {
        self.max_evaluations = max_evaluations;
        self
    }

    /// Set the quantile accuracy.
    pub fn with_quantile_accuracy(mut self, accuracy: Real) -> Self {
        self.quantile_accuracy = accuracy;
        self
    }
}

/// Density of `ln S_t` under the Heston model.
///
/// With `y = x − ln F(t)` and `φ` the characteristic function of
/// `ln(S_t/F_t)`:
///
/// $$P(X_t \le x) = \frac12 - \frac1\pi\int_0^\infty
///     \frac{\mathrm{Im}\left[e^{-iuy}\phi(u)\right]}{u}\,du,\qquad
///   p(x) = \frac1\pi\int_0^\infty \mathrm{Re}\left[e^{-iuy}\phi(u)\right]du.$$
///
/// Both integrals run over `[0, u_max]`, where `u_max` is the first power of
/// two with `|φ(u_max)| < 1e-16`.
#[derive(Debug, Clone)]
pub struct HestonRndCalculator {
    process: Arc<HestonProcess>,
    config: HestonRndConfig,
}

impl HestonRndCalculator {
    /// # Errors
    /// `Error::Configuration` for a non-positive accuracy or an empty
    /// evaluation budget.
    pub fn new(process: Arc<HestonProcess>, config: HestonRndConfig) -> Result<Self> {
        ensure_config!(
            config.integration_eps > 0.0,
            "integration accuracy must be positive, got {}",
            config.integration_eps
        );
        ensure_config!(config.max_evaluations > 0, "evaluation budget must be positive");
        ensure_config!(
            config.quantile_accuracy > 0.0,
            "quantile accuracy must be positive, got {}",
            config.quantile_accuracy
        );
        Ok(Self { process, config })
    }

    /// The Heston process.
    pub fn process(&self) -> &Arc<HestonProcess> {
        &self.process
    }

    fn integrator(&self) -> GaussLobattoIntegral {
        GaussLobattoIntegral::new(self.config.max_evaluations, self.config.integration_eps)
    }

    fn cf(&self, u: Real, t: Time) -> Complex64 {
        self.process.characteristic_function(Complex64::new(u, 0.0), t)
    }

    fn truncation(&self, t: Time) -> Result<Real> {
        let mut u_max = 1.0;
        for _ in 0..MAX_DOUBLINGS {
            if self.cf(u_max, t).norm() < CF_CUTOFF {
                return Ok(u_max);
            }
            u_max *= 2.0;
        }
        fail!("Heston characteristic function does not decay at t = {t}")
    }

    /// `x − ln F(t)`.
    fn log_moneyness(&self, x: Real, t: Time) -> Real {
        x - self.process.forward(t).ln()
    }
}

impl RiskNeutralDensityCalculator for HestonRndCalculator {
    fn pdf(&self, x: Real, t: Time) -> Result<Real> {
        check_time(t)?;
        let y = self.log_moneyness(x, t);
        let u_max = self.truncation(t)?;
        let integral = self.integrator().integrate(
            |u| (Complex64::from_polar(1.0, -u * y) * self.cf(u, t)).re,
            0.0,
            u_max,
        )?;
        Ok((integral / PI).max(0.0))
    }

    fn cdf(&self, x: Real, t: Time) -> Result<Probability> {
        check_time(t)?;
        let y = self.log_moneyness(x, t);
        let u_max = self.truncation(t)?;
        // limit at u = 0 is E[ln(S/F)] − y
        let at_zero = -0.5 * self.process.expected_integrated_variance(t) - y;
        let integral = self.integrator().integrate(
            |u| {
                if u == 0.0 {
                    at_zero
                } else {
                    (Complex64::from_polar(1.0, -u * y) * self.cf(u, t)).im / u
                }
            },
            0.0,
            u_max,
        )?;
        Ok((0.5 - integral / PI).clamp(0.0, 1.0))
    }

    fn invcdf(&self, p: Probability, t: Time) -> Result<Real> {
        check_time(t)?;
        check_probability(p)?;
        let w = self.process.expected_integrated_variance(t).max(1.0e-8);
        let sd = w.sqrt();
        let guess = self.process.forward(t).ln() - 0.5 * w + sd * normal_cdf_inverse(p)?;
        let search = QuantileSearch::new(guess, 0.1 * sd).with_accuracy(self.config.quantile_accuracy);
        invert_cdf(|x| self.cdf(x, t), |x| self.pdf(x, t), p, &search)
    }
}
