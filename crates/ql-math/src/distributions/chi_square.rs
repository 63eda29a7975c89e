//! Noncentral chi-squared distribution.
//!
//! The density and the cumulative function are evaluated as Poisson mixtures
//! of central chi-squared laws,
//!
//! `F(x; k, λ) = Σ_j e^(-λ/2) (λ/2)^j / j! · P(k/2 + j, x/2)`,
//!
//! summed outwards from the mode of the Poisson weights so that the dominant
//! terms are accumulated first. With `λ = 0` the sum collapses to the central
//! law.

use ql_core::{ensure, errors::Result, Real};
use statrs::function::gamma::{gamma_lr, ln_gamma};

use crate::solvers1d::invert_positive_cdf;

const MAX_TERMS: usize = 100_000;
const RELATIVE_CUTOFF: Real = 1e-17;

/// Chi-squared distribution with `df` degrees of freedom and noncentrality
/// `ncp`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonCentralChiSquaredDistribution {
    df: Real,
    ncp: Real,
}

impl NonCentralChiSquaredDistribution {
    /// Create the distribution.
    ///
    /// # Errors
    /// `df` must be positive and `ncp` non-negative.
    pub fn new(df: Real, ncp: Real) -> Result<Self> {
        ensure!(df > 0.0 && df.is_finite(), "degrees of freedom must be positive, got {df}");
        ensure!(ncp >= 0.0 && ncp.is_finite(), "noncentrality must be non-negative, got {ncp}");
        Ok(Self { df, ncp })
    }

    /// Degrees of freedom.
    pub fn df(&self) -> Real {
        self.df
    }

    /// Noncentrality parameter.
    pub fn ncp(&self) -> Real {
        self.ncp
    }

    /// Mean `k + λ`.
    pub fn mean(&self) -> Real {
        self.df + self.ncp
    }

    /// Variance `2(k + 2λ)`.
    pub fn variance(&self) -> Real {
        2.0 * (self.df + 2.0 * self.ncp)
    }

    /// Probability density at `x`; zero for `x <= 0`.
    pub fn pdf(&self, x: Real) -> Real {
        if x <= 0.0 {
            return 0.0;
        }
        let ln_x = x.ln();
        self.poisson_mixture(|j| {
            let half_k = 0.5 * self.df + j as Real;
            ((half_k - 1.0) * ln_x - 0.5 * x - half_k * std::f64::consts::LN_2 - ln_gamma(half_k))
                .exp()
        })
    }

    /// Cumulative probability `P(X <= x)`.
    pub fn cdf(&self, x: Real) -> Real {
        if x <= 0.0 {
            return 0.0;
        }
        self.poisson_mixture(|j| gamma_lr(0.5 * self.df + j as Real, 0.5 * x))
            .min(1.0)
    }

    /// Quantile function for `p` in `(0, 1)`.
    pub fn inverse_cdf(&self, p: Real) -> Result<Real> {
        ensure!(p > 0.0 && p < 1.0, "probability {p} outside (0, 1)");
        invert_positive_cdf(|x| Ok(self.cdf(x)), |x| Ok(self.pdf(x)), p, self.mean())
    }

    /// `Σ_j w_j term(j)` with Poisson(λ/2) weights `w_j`.
    fn poisson_mixture<F>(&self, term: F) -> Real
    where
        F: Fn(usize) -> Real,
    {
        let half_ncp = 0.5 * self.ncp;
        if half_ncp == 0.0 {
            return term(0);
        }
        let ln_half_ncp = half_ncp.ln();
        let weight = |j: usize| {
            let jf = j as Real;
            (-half_ncp + jf * ln_half_ncp - ln_gamma(jf + 1.0)).exp()
        };

        let mode = half_ncp.floor() as usize;
        let mut sum = 0.0;

        // upwards from the mode: weights and terms both decay
        let mut j = mode;
        while j < mode + MAX_TERMS {
            let contribution = weight(j) * term(j);
            sum += contribution;
            if j > mode + 1 && contribution <= RELATIVE_CUTOFF * sum {
                break;
            }
            j += 1;
        }

        // downwards: at most `mode` terms
        for j in (0..mode).rev() {
            let w = weight(j);
            if w > 0.0 {
                sum += w * term(j);
            }
        }
        sum
    }
}
