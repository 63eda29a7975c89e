//! Generalized Black-Scholes process.
//!
//! `dS/S = (r − q) dt + σ(t, S) dW`
//!
//! where `r` is the risk-free rate, `q` is the dividend yield (continuous),
//! and `σ` is read from a Black volatility surface or from a local-vol
//! surface. Unless one is supplied, the local volatility is the Dupire
//! surface implied by the Black surface.

use ql_core::{ensure_config, errors::Result, Real, Time};
use ql_termstructures::{
    BlackConstantVol, BlackVolTermStructure, FlatForward, LocalVolSurface, LocalVolTermStructure,
    YieldTermStructure,
};
use std::sync::Arc;

/// A generalized Black-Scholes stochastic process.
///
/// `dS = (r(t) − q(t)) · S · dt + σ(t, S) · S · dW`
#[derive(Debug, Clone)]
pub struct GeneralizedBlackScholesProcess {
    x0: Real,
    risk_free_rate: Arc<dyn YieldTermStructure>,
    dividend_yield: Arc<dyn YieldTermStructure>,
    black_vol: Arc<dyn BlackVolTermStructure>,
    local_vol: Arc<dyn LocalVolTermStructure>,
}

impl GeneralizedBlackScholesProcess {
    /// Create a new GBS process with a Black volatility surface.
    ///
    /// # Errors
    /// Rejects a non-positive spot.
    pub fn new(
        x0: Real,
        risk_free_rate: Arc<dyn YieldTermStructure>,
        dividend_yield: Arc<dyn YieldTermStructure>,
        black_vol: Arc<dyn BlackVolTermStructure>,
    ) -> Result<Self> {
        ensure_config!(x0 > 0.0 && x0.is_finite(), "spot must be positive, got {x0}");
        let local_vol = Arc::new(LocalVolSurface::new(
            Arc::clone(&black_vol),
            Arc::clone(&risk_free_rate),
            Arc::clone(&dividend_yield),
            x0,
        )?);
        Ok(Self {
            x0,
            risk_free_rate,
            dividend_yield,
            black_vol,
            local_vol,
        })
    }

    /// Replace the Dupire surface with an explicit local volatility.
    pub fn with_local_vol(mut self, local_vol: Arc<dyn LocalVolTermStructure>) -> Self {
        self.local_vol = local_vol;
        self
    }

    /// The spot price.
    pub fn spot(&self) -> Real {
        self.x0
    }

    /// The risk-free rate term structure.
    pub fn risk_free_rate(&self) -> &Arc<dyn YieldTermStructure> {
        &self.risk_free_rate
    }

    /// The dividend yield term structure.
    pub fn dividend_yield(&self) -> &Arc<dyn YieldTermStructure> {
        &self.dividend_yield
    }

    /// The Black volatility surface.
    pub fn black_volatility(&self) -> &Arc<dyn BlackVolTermStructure> {
        &self.black_vol
    }

    /// The local volatility surface.
    pub fn local_volatility(&self) -> &Arc<dyn LocalVolTermStructure> {
        &self.local_vol
    }

    /// Forward price `S₀·D_q(t)/D_r(t)`.
    pub fn forward(&self, t: Time) -> Real {
        self.x0 * self.dividend_yield.discount(t) / self.risk_free_rate.discount(t)
    }
}

/// Black-Scholes-Merton process with flat rates and a flat volatility.
///
/// # Errors
/// Rejects a non-positive spot or a negative volatility.
pub fn black_scholes_merton_process(
    spot: Real,
    risk_free_rate: Real,
    dividend_yield: Real,
    volatility: Real,
) -> Result<GeneralizedBlackScholesProcess> {
    GeneralizedBlackScholesProcess::new(
        spot,
        Arc::new(FlatForward::new(risk_free_rate)),
        Arc::new(FlatForward::new(dividend_yield)),
        Arc::new(BlackConstantVol::new(volatility)?),
    )
}
