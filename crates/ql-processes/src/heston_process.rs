//! Heston stochastic volatility process.
//!
//! The Heston model describes two coupled SDEs:
//!
//! ```text
//! dS = (r − q) S dt + √v S dW₁
//! dv = κ(θ − v) dt + σ √v dW₂
//! dW₁ dW₂ = ρ dt
//! ```
//!
//! The process exposes the characteristic function of the log-forward
//! return `X = ln(S_t / F_t)` in closed form, which is all the Fourier
//! pricers and density calculators need.

use num_complex::Complex64;
use ql_core::{ensure_config, errors::Result, Real, Time};
use ql_termstructures::YieldTermStructure;
use std::sync::Arc;

/// The Heston stochastic volatility process.
///
/// * `v0`: initial variance
/// * `kappa`: mean-reversion speed of variance
/// * `theta`: long-run variance level
/// * `sigma`: vol-of-vol
/// * `rho`: correlation between the two Brownian motions
#[derive(Debug, Clone)]
pub struct HestonProcess {
    s0: Real,
    v0: Real,
    kappa: Real,
    theta: Real,
    sigma: Real,
    rho: Real,
    risk_free_rate: Arc<dyn YieldTermStructure>,
    dividend_yield: Arc<dyn YieldTermStructure>,
}

impl HestonProcess {
    /// Create a new Heston process.
    ///
    /// # Errors
    /// `Error::Configuration` unless `s0 > 0`, `v0 ≥ 0`, `κ > 0`, `θ ≥ 0`,
    /// `σ > 0` and `ρ ∈ [-1, 1]`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        s0: Real,
        v0: Real,
        risk_free_rate: Arc<dyn YieldTermStructure>,
        dividend_yield: Arc<dyn YieldTermStructure>,
        kappa: Real,
        theta: Real,
        sigma: Real,
        rho: Real,
    ) -> Result<Self> {
        ensure_config!(s0 > 0.0 && s0.is_finite(), "spot must be positive, got {s0}");
        ensure_config!(
            (-1.0..=1.0).contains(&rho),
            "correlation ρ must be in [-1, 1], got {rho}"
        );
        ensure_config!(v0 >= 0.0, "initial variance must be non-negative, got {v0}");
        ensure_config!(
            kappa > 0.0 && kappa.is_finite(),
            "mean reversion speed must be positive, got {kappa}"
        );
        ensure_config!(theta >= 0.0, "long-run variance must be non-negative, got {theta}");
        ensure_config!(sigma > 0.0 && sigma.is_finite(), "vol-of-vol must be positive, got {sigma}");

        Ok(Self {
            s0,
            v0,
            kappa,
            theta,
            sigma,
            rho,
            risk_free_rate,
            dividend_yield,
        })
    }

    /// Spot price.
    pub fn s0(&self) -> Real {
        self.s0
    }

    /// Initial variance.
    pub fn v0(&self) -> Real {
        self.v0
    }

    /// Mean-reversion speed.
    pub fn kappa(&self) -> Real {
        self.kappa
    }

    /// Long-run variance.
    pub fn theta(&self) -> Real {
        self.theta
    }

    /// Vol-of-vol.
    pub fn sigma(&self) -> Real {
        self.sigma
    }

    /// Correlation.
    pub fn rho(&self) -> Real {
        self.rho
    }

    /// Risk-free rate.
    pub fn risk_free_rate(&self) -> &Arc<dyn YieldTermStructure> {
        &self.risk_free_rate
    }

    /// Dividend yield.
    pub fn dividend_yield(&self) -> &Arc<dyn YieldTermStructure> {
        &self.dividend_yield
    }

    /// Forward price `S₀·D_q(t)/D_r(t)`.
    pub fn forward(&self, t: Time) -> Real {
        self.s0 * self.dividend_yield.discount(t) / self.risk_free_rate.discount(t)
    }

    /// `∫₀ᵗ E[v_s] ds = θt + (v₀ − θ)(1 − e^{−κt})/κ`.
    pub fn expected_integrated_variance(&self, t: Time) -> Real {
        let kt = self.kappa * t;
        let decay = if kt.abs() < 1e-8 {
            t * (1.0 - 0.5 * kt)
        } else {
            -(-kt).exp_m1() / self.kappa
        };
        self.theta * t + (self.v0 - self.theta) * decay
    }

    /// Characteristic function `E[exp(i·u·X_t)]` of `X_t = ln(S_t / F_t)`.
    ///
    /// Accepts complex `u`, so damped transforms such as `u − i/2` can be
    /// evaluated directly. Uses the rotation-free ("little trap")
    /// formulation; `(ξ − d)/σ²` is rewritten as `−(u² + iu)/(ξ + d)` so the
    /// small vol-of-vol limit does not cancel.
    pub fn characteristic_function(&self, u: Complex64, t: Time) -> Complex64 {
        let sigma2 = self.sigma * self.sigma;
        let iu = Complex64::i() * u;
        let u2_iu = u * u + iu;

        let xi = self.kappa - self.sigma * self.rho * iu;
        let d = (xi * xi + sigma2 * u2_iu).sqrt();
        let xi_plus_d = xi + d;
        // (ξ − d)/σ²
        let q = -u2_iu / xi_plus_d;
        let g = q * sigma2 / xi_plus_d;
        let e = (-d * t).exp();

        let one_minus_ge = 1.0 - g * e;
        let big_d = q * (1.0 - e) / one_minus_ge;
        let z = g * (1.0 - e) / (1.0 - g);
        let big_c = self.kappa * self.theta * (q * t - 2.0 / sigma2 * ln_1p(z));

        (big_c + big_d * self.v0).exp()
    }
}

/// `ln(1 + z)` with a short series close to zero.
fn ln_1p(z: Complex64) -> Complex64 {
    if z.norm() < 1e-4 {
        z * (1.0 - z * (0.5 - z * (1.0 / 3.0 - 0.25 * z)))
    } else {
        (1.0 + z).ln()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;
    use ql_core::Error;
    use ql_termstructures::FlatForward;

    fn make_heston(sigma: Real) -> HestonProcess {
        HestonProcess::new(
            100.0,
            0.04,
            Arc::new(FlatForward::new(0.05)),
            Arc::new(FlatForward::new(0.02)),
            1.5,
            0.06,
            sigma,
            -0.7,
        )
        .unwrap()
    }

    #[test]
    fn characteristic_function_normalization() {
        let p = make_heston(0.3);
        let one = p.characteristic_function(Complex64::new(0.0, 0.0), 1.0);
        assert_abs_diff_eq!(one.re, 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(one.im, 0.0, epsilon = 1e-15);
        // martingale: E[S_t / F_t] = φ(−i) = 1
        let mart = p.characteristic_function(Complex64::new(0.0, -1.0), 2.0);
        assert_abs_diff_eq!(mart.re, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(mart.im, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn characteristic_function_first_moment() {
        // E[X] = −½ ∫ E[v] ds
        let p = make_heston(0.5);
        let t = 0.75;
        let h = 1e-4;
        let diff = (p.characteristic_function(Complex64::new(h, 0.0), t)
            - p.characteristic_function(Complex64::new(-h, 0.0), t))
            / (2.0 * h);
        assert_abs_diff_eq!(diff.im, -0.5 * p.expected_integrated_variance(t), epsilon = 1e-6);
    }

    #[test]
    fn small_vol_of_vol_is_gaussian() {
        let p = HestonProcess::new(
            10.0,
            0.0729,
            Arc::new(FlatForward::new(0.155)),
            Arc::new(FlatForward::new(0.0721)),
            1.0,
            0.0729,
            1e-4,
            -0.75,
        )
        .unwrap();
        let t = 1.5;
        for &u in &[0.3, 1.0, 4.0, 10.0] {
            let phi = p.characteristic_function(Complex64::new(u, 0.0), t);
            let var = 0.0729 * t;
            let expected = Complex64::new(-0.5 * u * u * var, -0.5 * u * var).exp();
            assert_abs_diff_eq!(phi.re, expected.re, epsilon = 1e-4);
            assert_abs_diff_eq!(phi.im, expected.im, epsilon = 1e-4);
        }
    }

    #[test]
    fn expected_integrated_variance_limits() {
        let p = make_heston(0.3);
        assert_abs_diff_eq!(p.expected_integrated_variance(0.0), 0.0, epsilon = 1e-15);
        let t: Real = 2.0;
        let expected = 0.06 * t + (0.04 - 0.06) * (1.0 - (-1.5 * t).exp()) / 1.5;
        assert_abs_diff_eq!(p.expected_integrated_variance(t), expected, epsilon = 1e-14);
    }

    #[test]
    fn invalid_parameters() {
        let r: Arc<dyn YieldTermStructure> = Arc::new(FlatForward::new(0.0));
        let build = |s0, v0, kappa, theta, sigma, rho| {
            HestonProcess::new(s0, v0, Arc::clone(&r), Arc::clone(&r), kappa, theta, sigma, rho)
        };
        assert!(build(100.0, 0.04, 1.0, 0.04, 0.3, -1.2).is_err());
        assert!(build(100.0, -0.04, 1.0, 0.04, 0.3, 0.0).is_err());
        assert!(build(100.0, 0.04, 1.0, 0.04, 0.0, 0.0).is_err());
        assert!(build(-1.0, 0.04, 1.0, 0.04, 0.3, 0.0).is_err());
        // without mean reversion the characteristic function is 0/0 at u = 0
        for kappa in [0.0, -0.5] {
            assert!(matches!(
                build(100.0, 0.04, kappa, 0.04, 0.3, 0.0),
                Err(Error::Configuration(_))
            ));
        }
        assert!(build(100.0, 0.04, 1.0, 0.04, 0.3, 0.0).is_ok());
    }

    proptest! {
        #[test]
        fn characteristic_function_is_bounded(u in 0.0f64..200.0, t in 0.01f64..5.0) {
            let phi = make_heston(0.8).characteristic_function(Complex64::new(u, 0.0), t);
            prop_assert!(phi.norm() <= 1.0 + 1e-12);
        }
    }
}
