//! Finite-difference Black-Scholes engine for European vanilla options.
//!
//! Solves the backward equation in `x = ln S` with local volatility,
//!
//! ```text
//! ∂V/∂τ = ½σ²(t, eˣ) ∂ₓₓV + (r − q − ½σ²) ∂ₓV − r V,   τ = T − t,
//! ```
//!
//! from the payoff at `τ = 0` to `τ = T` on a mesh concentrated around the
//! strike. The first `damping_steps` steps are fully implicit to smooth the
//! payoff kink, the rest Crank-Nicolson.

use std::sync::Arc;

use ql_core::{ensure_config, errors::Result, Real, Volatility};
use ql_instruments::{EuropeanOption, Payoff, PricingEngine};
use ql_math::CubicNaturalSpline;
use ql_methods::{black_scholes_operator, theta_step, Concentrating1dMesher, Dirichlet, FdmScheme};
use ql_processes::GeneralizedBlackScholesProcess;
use tracing::{debug, trace};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Grid and mesh settings of [`FdBlackScholesVanillaEngine`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FdBlackScholesConfig {
    /// Number of time steps.
    pub t_grid: usize,
    /// Number of mesh nodes in log-price.
    pub x_grid: usize,
    /// Leading fully implicit steps.
    pub damping_steps: usize,
    /// Half-width of the mesh in standard deviations.
    pub std_devs: Real,
    /// Volatility sizing the mesh; the Black vol at the strike if `None`.
    pub mesh_vol: Option<Volatility>,
    /// Sinh concentration density around `ln K`; uniform if `None`.
    pub concentration: Option<Real>,
}

impl Default for FdBlackScholesConfig {
    fn default() -> Self {
        Self {
            t_grid: 100,
            x_grid: 100,
            damping_steps: 2,
            std_devs: 5.0,
            mesh_vol: None,
            concentration: Some(0.1),
        }
    }
}

impl FdBlackScholesConfig {
    /// Set the number of time steps.
    pub fn with_t_grid(mut self, t_grid: usize) -> Self {
        self.t_grid = t_grid;
        self
    }

    /// Set the number of mesh nodes.
    pub fn with_x_grid(mut self, x_grid: usize) -> Self {
        self.x_grid = x_grid;
        self
    }

    /// Set the number of implicit damping steps.
    pub fn with_damping_steps(mut self, damping_steps: usize) -> Self {
        self.damping_steps = damping_steps;
        self
    }

    /// Set the mesh half-width in standard deviations.
    pub fn with_std_devs(mut self, std_devs: Real) -> Self {
        self.std_devs = std_devs;
        self
    }

    /// Size the mesh with a fixed volatility.
    pub fn with_mesh_vol(mut self, vol: Volatility) -> Self {
        self.mesh_vol = Some(vol);
        self
    }

    /// Set (or clear) the concentration density.
    pub fn with_concentration(mut self, density: Option<Real>) -> Self {
        self.concentration = density;
        self
    }

    fn validate(&self) -> Result<()> {
        ensure_config!(self.t_grid >= 1, "at least one time step required");
        ensure_config!(self.x_grid >= 5, "mesh needs at least 5 nodes, got {}", self.x_grid);
        ensure_config!(
            self.std_devs > 0.0 && self.std_devs.is_finite(),
            "mesh width must be positive, got {}",
            self.std_devs
        );
        if let Some(vol) = self.mesh_vol {
            ensure_config!(vol > 0.0 && vol.is_finite(), "mesh volatility must be positive, got {vol}");
        }
        if let Some(density) = self.concentration {
            ensure_config!(density > 0.0, "concentration density must be positive, got {density}");
        }
        Ok(())
    }
}

/// Backward finite-difference engine using the process' local volatility.
#[derive(Debug, Clone)]
pub struct FdBlackScholesVanillaEngine {
    process: Arc<GeneralizedBlackScholesProcess>,
    config: FdBlackScholesConfig,
}

impl FdBlackScholesVanillaEngine {
    /// # Errors
    /// `Error::Configuration` for an invalid `config`.
    pub fn new(process: Arc<GeneralizedBlackScholesProcess>, config: FdBlackScholesConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { process, config })
    }

    /// The grid settings.
    pub fn config(&self) -> &FdBlackScholesConfig {
        &self.config
    }

    fn mesh(&self, option: &EuropeanOption) -> Result<Concentrating1dMesher> {
        let maturity = option.maturity();
        let strike = option.strike();
        let vol = match self.config.mesh_vol {
            Some(vol) => vol,
            None => self.process.black_volatility().black_vol(maturity, strike)?,
        };
        let spread = self.config.std_devs * vol.max(0.01) * maturity.sqrt();

        let anchors = [
            self.process.spot().ln(),
            self.process.forward(maturity).ln(),
            strike.ln(),
        ];
        let lo = anchors.iter().copied().fold(Real::INFINITY, Real::min) - spread;
        let hi = anchors.iter().copied().fold(Real::NEG_INFINITY, Real::max) + spread;
        let concentration = self.config.concentration.map(|d| (strike.ln(), d));
        Concentrating1dMesher::new(lo, hi, self.config.x_grid, concentration)
    }
}

impl PricingEngine for FdBlackScholesVanillaEngine {
    fn npv(&self, option: &EuropeanOption) -> Result<Real> {
        let maturity = option.maturity();
        let strike = option.strike();
        let phi = option.option_type().sign();
        let mesh = self.mesh(option)?;
        let x = mesh.locations();
        let n = x.len();

        let r_curve = self.process.risk_free_rate();
        let q_curve = self.process.dividend_yield();
        let local_vol = self.process.local_volatility();

        debug!(
            payoff = %option.payoff(),
            maturity,
            x_min = x[0],
            x_max = x[n - 1],
            nodes = n,
            steps = self.config.t_grid,
            "pricing by finite differences"
        );

        let mut values: Vec<Real> = x.iter().map(|xi| option.payoff().value(xi.exp())).collect();
        let dt = maturity / self.config.t_grid as Real;
        let mut a = vec![0.0; n];
        let mut mu = vec![0.0; n];

        for step in 0..self.config.t_grid {
            let t_hi = maturity - step as Real * dt;
            let t_lo = (t_hi - dt).max(0.0);
            let t_mid = 0.5 * (t_lo + t_hi);
            let r = r_curve.forward_rate(t_lo, t_hi);
            let q = q_curve.forward_rate(t_lo, t_hi);

            for i in 0..n {
                let sigma = local_vol.local_vol(t_mid, x[i].exp())?;
                a[i] = 0.5 * sigma * sigma;
                mu[i] = r - q - a[i];
            }
            let op = black_scholes_operator(x, &a, &mu, r)?;

            let df_r = r_curve.discount(maturity) / r_curve.discount(t_lo);
            let df_q = q_curve.discount(maturity) / q_curve.discount(t_lo);
            let edge = |xi: Real| (phi * (xi.exp() * df_q - strike * df_r)).max(0.0);
            let boundary = Dirichlet {
                lower: edge(x[0]),
                upper: edge(x[n - 1]),
            };

            let scheme = if step < self.config.damping_steps {
                FdmScheme::Implicit
            } else {
                FdmScheme::CrankNicolson
            };
            values = theta_step(&op, &values, t_hi - t_lo, scheme, boundary)?;
            trace!(step, t = t_lo, ?scheme, "backward step");
        }

        let spline = CubicNaturalSpline::new(x, &values)?;
        Ok(spline.value(self.process.spot().ln()))
    }
}
