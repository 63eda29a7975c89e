//! Transition and stationary laws of the square-root process.

use super::{check_probability, check_time, RiskNeutralDensityCalculator};
use ql_core::{errors::Result, Probability, Real, Time};
use ql_math::{GammaDistribution, NonCentralChiSquaredDistribution};
use ql_processes::SquareRootProcess;

/// Density of `v_t` for `dv = κ(θ − v)dt + σ√v dW` started at `v₀`.
///
/// `v_t / c(t)` is noncentral χ² with `4κθ/σ²` degrees of freedom; as
/// `t → ∞` the law tends to Gamma(`2κθ/σ²`, `σ²/(2κ)`). Queries read `x`
/// as the variance level itself, not its logarithm.
#[derive(Debug, Clone)]
pub struct SquareRootProcessRndCalculator {
    process: SquareRootProcess,
    stationary: GammaDistribution,
}

impl SquareRootProcessRndCalculator {
    /// Build from `v₀`, `κ`, `θ` and `σ`.
    ///
    /// # Errors
    /// `Error::Configuration` unless `κ`, `θ` and `σ` are positive and
    /// `v₀ ≥ 0`.
    pub fn new(v0: Real, kappa: Real, theta: Real, sigma: Real) -> Result<Self> {
        Self::from_process(SquareRootProcess::new(kappa, theta, sigma, v0)?)
    }

    /// Build from an existing process.
    pub fn from_process(process: SquareRootProcess) -> Result<Self> {
        let stationary =
            GammaDistribution::new(process.stationary_shape(), process.stationary_scale())?;
        Ok(Self {
            process,
            stationary,
        })
    }

    /// The underlying process.
    pub fn process(&self) -> &SquareRootProcess {
        &self.process
    }

    fn transition(&self, t: Time) -> Result<(Real, NonCentralChiSquaredDistribution)> {
        check_time(t)?;
        let law = NonCentralChiSquaredDistribution::new(
            self.process.degrees_of_freedom(),
            self.process.non_centrality(t),
        )?;
        Ok((self.process.transition_scale(t), law))
    }

    /// Density of the stationary law.
    pub fn stationary_pdf(&self, v: Real) -> Real {
        self.stationary.pdf(v)
    }

    /// Cumulative stationary probability.
    pub fn stationary_cdf(&self, v: Real) -> Probability {
        self.stationary.cdf(v)
    }

    /// Stationary quantile.
    ///
    /// # Errors
    /// `Error::Domain` for `p ∉ (0, 1)`.
    pub fn stationary_invcdf(&self, p: Probability) -> Result<Real> {
        check_probability(p)?;
        self.stationary.inverse_cdf(p)
    }
}

impl RiskNeutralDensityCalculator for SquareRootProcessRndCalculator {
    fn pdf(&self, v: Real, t: Time) -> Result<Real> {
        let (scale, law) = self.transition(t)?;
        Ok(law.pdf(v / scale) / scale)
    }

    fn cdf(&self, v: Real, t: Time) -> Result<Probability> {
        let (scale, law) = self.transition(t)?;
        Ok(law.cdf(v / scale))
    }

    fn invcdf(&self, p: Probability, t: Time) -> Result<Real> {
        check_probability(p)?;
        let (scale, law) = self.transition(t)?;
        Ok(scale * law.inverse_cdf(p)?)
    }
}
