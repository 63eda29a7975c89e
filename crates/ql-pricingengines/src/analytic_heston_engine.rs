//! Semi-analytic Heston pricer in Lewis form.
//!
//! The undiscounted call on the forward `F` is
//!
//! $$C = F - \frac{\sqrt{FK}}{\pi}\int_0^\infty
//!     \frac{\mathrm{Re}\left[e^{iuk}\,\phi(u - i/2)\right]}{u^2 + 1/4}\,du,
//!     \qquad k = \ln(F/K)$$
//!
//! where `φ` is the characteristic function of `ln(S_T/F_T)`. The integrand
//! is even and analytic in the strip `|Im u| < 1/2`, so the trapezoid rule
//! on a uniform grid converges geometrically in the node spacing. The
//! strike-independent factor `φ(u − i/2)/(u² + 1/4)` is tabulated once per
//! maturity and shared by every strike.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::{Arc, Mutex};

use num_complex::Complex64;
use ql_core::{
    ensure_config, ensure_domain,
    errors::{Error, Result},
    fail, Real, Time,
};
use ql_instruments::{EuropeanOption, OptionType, PricingEngine};
use ql_processes::HestonProcess;
use tracing::debug;

/// Default node spacing of the trapezoid rule.
const DEFAULT_STEP: Real = 0.1;
/// Integrand magnitude below which the tail is dropped.
const TAIL_CUTOFF: Real = 1.0e-16;
/// Hard limit on the nodes of one maturity table.
const MAX_NODES: usize = 1 << 20;
/// The cache is flushed once it holds this many maturities.
const MAX_CACHED_MATURITIES: usize = 4096;
/// `e^{iuk}` is recomputed exactly every this many nodes.
const RESYNC_INTERVAL: usize = 64;

/// Trapezoid weights times `φ(u_j − i/2)/(u_j² + 1/4)`.
#[derive(Debug)]
struct CfTable {
    step: Real,
    weighted: Vec<Complex64>,
}

/// Heston pricer integrating the Lewis representation on a uniform grid.
///
/// Characteristic-function tables are cached per maturity behind a mutex;
/// the pricer is `Send + Sync` and may be shared between threads.
#[derive(Debug)]
pub struct AnalyticHestonPricer {
    process: Arc<HestonProcess>,
    step: Real,
    cache: Mutex<HashMap<u64, Arc<CfTable>>>,
}

impl AnalyticHestonPricer {
    /// Pricer with the default node spacing 0.1.
    pub fn new(process: Arc<HestonProcess>) -> Self {
        Self {
            process,
            step: DEFAULT_STEP,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Use node spacing `step`.
    ///
    /// # Errors
    /// `Error::Configuration` unless `0 < step ≤ 0.5`.
    pub fn with_step(mut self, step: Real) -> Result<Self> {
        ensure_config!(step > 0.0 && step <= 0.5, "node spacing must be in (0, 0.5], got {step}");
        self.step = step;
        Ok(self)
    }

    /// The underlying process.
    pub fn process(&self) -> &Arc<HestonProcess> {
        &self.process
    }

    /// Number of maturities currently tabulated.
    pub fn cached_maturities(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Undiscounted (forward) price of a call or put struck at `strike`.
    ///
    /// # Errors
    /// `Error::Domain` for a non-positive strike or negative time;
    /// `Error::Runtime` if the characteristic function does not decay within
    /// the node budget.
    pub fn undiscounted_price(&self, option_type: OptionType, strike: Real, t: Time) -> Result<Real> {
        ensure_domain!(strike > 0.0 && strike.is_finite(), "strike must be positive, got {strike}");
        ensure_domain!(t >= 0.0 && t.is_finite(), "time must be non-negative, got {t}");

        let forward = self.process.forward(t);
        if t == 0.0 {
            return Ok((option_type.sign() * (forward - strike)).max(0.0));
        }

        let table = self.table(t)?;
        let k = (forward / strike).ln();
        let rotation = Complex64::from_polar(1.0, table.step * k);

        let mut phase = Complex64::new(1.0, 0.0);
        let mut integral = 0.0;
        for (j, w) in table.weighted.iter().enumerate() {
            if j > 0 {
                phase = if j % RESYNC_INTERVAL == 0 {
                    Complex64::from_polar(1.0, j as Real * table.step * k)
                } else {
                    phase * rotation
                };
            }
            integral += (phase * w).re;
        }

        let call = forward - (forward * strike).sqrt() / PI * integral;
        let price = match option_type {
            OptionType::Call => call,
            OptionType::Put => call - (forward - strike),
        };
        Ok(price.max(0.0))
    }

    /// Undiscounted call price.
    pub fn undiscounted_call(&self, strike: Real, t: Time) -> Result<Real> {
        self.undiscounted_price(OptionType::Call, strike, t)
    }

    /// Undiscounted put price.
    pub fn undiscounted_put(&self, strike: Real, t: Time) -> Result<Real> {
        self.undiscounted_price(OptionType::Put, strike, t)
    }

    fn table(&self, t: Time) -> Result<Arc<CfTable>> {
        let key = t.to_bits();
        {
            let cache = self
                .cache
                .lock()
                .map_err(|_| Error::Runtime("Heston pricer cache poisoned".into()))?;
            if let Some(table) = cache.get(&key) {
                return Ok(Arc::clone(table));
            }
        }

        // built outside the lock; a concurrent miss on the same maturity
        // builds an identical table
        let table = Arc::new(self.build_table(t)?);
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| Error::Runtime("Heston pricer cache poisoned".into()))?;
        if cache.len() >= MAX_CACHED_MATURITIES {
            debug!(entries = cache.len(), "flushing Heston characteristic function cache");
            cache.clear();
        }
        cache.insert(key, Arc::clone(&table));
        Ok(table)
    }

    fn build_table(&self, t: Time) -> Result<CfTable> {
        let h = self.step;
        let mut weighted = Vec::new();
        for j in 0..MAX_NODES {
            let u = j as Real * h;
            let denom = u * u + 0.25;
            let psi = self.process.characteristic_function(Complex64::new(u, -0.5), t) / denom;
            if !(psi.re.is_finite() && psi.im.is_finite()) {
                fail!("Heston characteristic function not finite at u = {u}, t = {t}");
            }
            let weight = if j == 0 { 0.5 * h } else { h };
            weighted.push(psi * weight);
            if j > 0 && psi.norm() < TAIL_CUTOFF {
                debug!(t, nodes = weighted.len(), u_max = u, "tabulated Heston characteristic function");
                return Ok(CfTable { step: h, weighted });
            }
        }
        fail!("Heston characteristic function does not decay within {MAX_NODES} nodes at t = {t}")
    }
}

impl PricingEngine for AnalyticHestonPricer {
    fn npv(&self, option: &EuropeanOption) -> Result<Real> {
        let t = option.maturity();
        let df = self.process.risk_free_rate().discount(t);
        Ok(df * self.undiscounted_price(option.option_type(), option.strike(), t)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::black_calculator::black_formula;
    use approx::assert_abs_diff_eq;
    use ql_termstructures::FlatForward;

    fn process(v0: Real, kappa: Real, theta: Real, sigma: Real, rho: Real) -> Arc<HestonProcess> {
        Arc::new(
            HestonProcess::new(
                100.0,
                v0,
                Arc::new(FlatForward::new(0.05)),
                Arc::new(FlatForward::new(0.02)),
                kappa,
                theta,
                sigma,
                rho,
            )
            .unwrap(),
        )
    }

    #[test]
    fn small_vol_of_vol_matches_black() {
        // constant variance 0.04: Black with σ = 0.2
        let pricer = AnalyticHestonPricer::new(process(0.04, 1.0, 0.04, 1e-4, 0.0));
        let t = 1.5;
        let f = pricer.process().forward(t);
        for &k in &[60.0, 90.0, 100.0, 115.0, 170.0] {
            let expected = black_formula(OptionType::Call, k, f, 0.2 * t.sqrt(), 1.0).unwrap();
            let call = pricer.undiscounted_call(k, t).unwrap();
            assert_abs_diff_eq!(call, expected, epsilon = 1e-6);
        }
    }

    #[test]
    fn atm_call_matches_lewis_reference() {
        // zero carry, v0 = θ; reference from an independent Lewis-formula integration
        let p = Arc::new(
            HestonProcess::new(
                100.0,
                0.04,
                Arc::new(FlatForward::new(0.0)),
                Arc::new(FlatForward::new(0.0)),
                2.0,
                0.04,
                0.3,
                -0.7,
            )
            .unwrap(),
        );
        let pricer = AnalyticHestonPricer::new(p);
        let call = pricer.undiscounted_call(100.0, 1.0).unwrap();
        assert_abs_diff_eq!(call, 7.615746917865, epsilon = 1e-9);
        // negative ρ moves ATM value below Black at √θ
        let black = black_formula(OptionType::Call, 100.0, 100.0, 0.2, 1.0).unwrap();
        assert!(call < black, "call = {call}, black = {black}");
        let put = pricer.undiscounted_put(100.0, 1.0).unwrap();
        assert_abs_diff_eq!(call - put, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn step_refinement_is_stable() {
        let coarse = AnalyticHestonPricer::new(process(0.06, 1.0, 0.06, 0.4, -0.75));
        let fine = AnalyticHestonPricer::new(process(0.06, 1.0, 0.06, 0.4, -0.75))
            .with_step(0.05)
            .unwrap();
        for &k in &[70.0, 100.0, 140.0] {
            let a = coarse.undiscounted_put(k, 0.25).unwrap();
            let b = fine.undiscounted_put(k, 0.25).unwrap();
            assert_abs_diff_eq!(a, b, epsilon = 1e-11);
        }
        assert!(AnalyticHestonPricer::new(process(0.06, 1.0, 0.06, 0.4, -0.75))
            .with_step(0.0)
            .is_err());
    }

    #[test]
    fn tables_are_cached_per_maturity() {
        let pricer = AnalyticHestonPricer::new(process(0.04, 1.5, 0.05, 0.5, -0.5));
        pricer.undiscounted_call(90.0, 0.5).unwrap();
        pricer.undiscounted_call(110.0, 0.5).unwrap();
        assert_eq!(pricer.cached_maturities(), 1);
        pricer.undiscounted_call(110.0, 1.0).unwrap();
        assert_eq!(pricer.cached_maturities(), 2);
    }

    #[test]
    fn npv_is_discounted_and_expiry_is_intrinsic() {
        let pricer = AnalyticHestonPricer::new(process(0.04, 1.5, 0.05, 0.5, -0.5));
        let option = EuropeanOption::vanilla(OptionType::Put, 105.0, 2.0).unwrap();
        let npv = pricer.npv(&option).unwrap();
        let fwd = pricer.undiscounted_put(105.0, 2.0).unwrap();
        assert_abs_diff_eq!(npv, fwd * (-0.1_f64).exp(), epsilon = 1e-12);

        assert_eq!(pricer.undiscounted_put(105.0, 0.0).unwrap(), 5.0);
        assert!(pricer.undiscounted_put(-1.0, 1.0).is_err());
    }
}
