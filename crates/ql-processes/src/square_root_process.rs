//! Square-root (CIR) process.
//!
//! ```text
//! dX = a(b − X) dt + σ √X dW
//! ```
//!
//! The Cox-Ingersoll-Ross process, used as the variance process of the
//! Heston model. Conditional on `X₀`, `X_t / c(t)` is noncentral
//! chi-squared with `d` degrees of freedom and noncentrality `λ(t)`.

use ql_core::{ensure_config, errors::Result, Real, Time};

/// A square-root (CIR) process.
///
/// `dX = speed · (mean − X) dt + volatility · √X · dW`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquareRootProcess {
    x0: Real,
    speed: Real,
    mean: Real,
    volatility: Real,
}

impl SquareRootProcess {
    /// Create a new square-root (CIR) process.
    ///
    /// # Arguments
    /// * `speed`: mean-reversion speed `a`
    /// * `mean`: long-run level `b`
    /// * `volatility`: volatility `σ`
    /// * `x0`: initial value
    ///
    /// # Errors
    /// `Error::Configuration` unless `a`, `b` and `σ` are positive and
    /// `x0 ≥ 0`.
    pub fn new(speed: Real, mean: Real, volatility: Real, x0: Real) -> Result<Self> {
        ensure_config!(speed > 0.0 && speed.is_finite(), "mean reversion speed must be positive, got {speed}");
        ensure_config!(mean > 0.0 && mean.is_finite(), "long-run mean must be positive, got {mean}");
        ensure_config!(
            volatility > 0.0 && volatility.is_finite(),
            "volatility must be positive, got {volatility}"
        );
        ensure_config!(x0 >= 0.0 && x0.is_finite(), "initial value must be non-negative, got {x0}");
        Ok(Self {
            x0,
            speed,
            mean,
            volatility,
        })
    }

    /// Initial value.
    pub fn x0(&self) -> Real {
        self.x0
    }

    /// Mean-reversion speed.
    pub fn speed(&self) -> Real {
        self.speed
    }

    /// Long-run mean level.
    pub fn mean(&self) -> Real {
        self.mean
    }

    /// Volatility.
    pub fn volatility(&self) -> Real {
        self.volatility
    }

    /// Scale `c(t) = σ²(1 − e^{−at})/(4a)` of the transition law.
    pub fn transition_scale(&self, t: Time) -> Real {
        -self.volatility * self.volatility * (-self.speed * t).exp_m1() / (4.0 * self.speed)
    }

    /// Degrees of freedom `d = 4ab/σ²` of the transition law.
    pub fn degrees_of_freedom(&self) -> Real {
        4.0 * self.speed * self.mean / (self.volatility * self.volatility)
    }

    /// Noncentrality `λ(t) = 4a e^{−at} x₀ / (σ²(1 − e^{−at}))`.
    pub fn non_centrality(&self, t: Time) -> Real {
        let e = (-self.speed * t).exp();
        4.0 * self.speed * e * self.x0
            / (-self.volatility * self.volatility * (-self.speed * t).exp_m1())
    }

    /// Shape `2ab/σ²` of the stationary Gamma law.
    pub fn stationary_shape(&self) -> Real {
        0.5 * self.degrees_of_freedom()
    }

    /// Scale `σ²/(2a)` of the stationary Gamma law.
    pub fn stationary_scale(&self) -> Real {
        self.volatility * self.volatility / (2.0 * self.speed)
    }

    /// Conditional expectation `E[X_t]`.
    pub fn expectation(&self, t: Time) -> Real {
        self.mean + (self.x0 - self.mean) * (-self.speed * t).exp()
    }

    /// Conditional variance `Var[X_t]`.
    pub fn variance(&self, t: Time) -> Real {
        let e = (-self.speed * t).exp();
        let s2 = self.volatility * self.volatility;
        self.x0 * s2 * e * (1.0 - e) / self.speed
            + self.mean * s2 * (1.0 - e) * (1.0 - e) / (2.0 * self.speed)
    }

    /// `true` when the Feller condition `2ab ≥ σ²` holds and zero is
    /// unattainable.
    pub fn feller_condition(&self) -> bool {
        2.0 * self.speed * self.mean >= self.volatility * self.volatility
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn transition_law_matches_moments() {
        // E = c(d + λ), Var = 2c²(d + 2λ)
        let p = SquareRootProcess::new(1.0, 0.6, 0.1, 0.75).unwrap();
        for &t in &[0.1, 0.75, 5.0] {
            let c = p.transition_scale(t);
            let d = p.degrees_of_freedom();
            let l = p.non_centrality(t);
            assert_abs_diff_eq!(c * (d + l), p.expectation(t), epsilon = 1e-12);
            assert_abs_diff_eq!(2.0 * c * c * (d + 2.0 * l), p.variance(t), epsilon = 1e-12);
        }
    }

    #[test]
    fn stationary_law_is_the_long_run_limit() {
        let p = SquareRootProcess::new(0.17, 1.0, 0.09, 0.5).unwrap();
        let t = 60.0 / 0.17;
        let k = p.stationary_shape();
        let theta = p.stationary_scale();
        assert_abs_diff_eq!(k * theta, p.expectation(t), epsilon = 1e-12);
        assert_abs_diff_eq!(k * theta * theta, p.variance(t), epsilon = 1e-12);
        assert!(p.feller_condition());
    }

    #[test]
    fn invalid_parameters() {
        assert!(SquareRootProcess::new(0.0, 0.04, 0.3, 0.04).is_err());
        assert!(SquareRootProcess::new(1.0, -0.04, 0.3, 0.04).is_err());
        assert!(SquareRootProcess::new(1.0, 0.04, 0.0, 0.04).is_err());
        assert!(SquareRootProcess::new(1.0, 0.04, 0.3, -0.01).is_err());
    }
}
