//! `BlackVolTermStructure`: Black (implied) volatility term structures.
//!
//! Provides the `BlackVolTermStructure` trait and `BlackConstantVol`.

use ql_core::{ensure_config, errors::Result, Real, Time, Volatility};

/// A Black volatility term structure: `σ_B(t, K)`.
///
/// Implementors provide
/// [`black_vol_impl`](BlackVolTermStructure::black_vol_impl); the total
/// variance `σ_B² t` is derived from it. Evaluation is fallible because
/// model-implied surfaces invert prices.
pub trait BlackVolTermStructure: std::fmt::Debug + Send + Sync {
    /// Black volatility at time `t` and strike `strike`.
    fn black_vol_impl(&self, t: Time, strike: Real) -> Result<Volatility>;

    /// Black variance `σ²·t` at time `t` and strike `strike`.
    fn black_variance_impl(&self, t: Time, strike: Real) -> Result<Real> {
        let vol = self.black_vol_impl(t, strike)?;
        Ok(vol * vol * t)
    }

    /// Black volatility.
    fn black_vol(&self, t: Time, strike: Real) -> Result<Volatility> {
        self.black_vol_impl(t, strike)
    }

    /// Black total variance.
    fn black_variance(&self, t: Time, strike: Real) -> Result<Real> {
        self.black_variance_impl(t, strike)
    }
}

// ── BlackConstantVol ──────────────────────────────────────────────────────────

/// A flat Black volatility surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlackConstantVol {
    volatility: Volatility,
}

impl BlackConstantVol {
    /// Create a flat surface.
    ///
    /// # Errors
    /// Rejects negative or non-finite volatilities.
    pub fn new(volatility: Volatility) -> Result<Self> {
        ensure_config!(
            volatility >= 0.0 && volatility.is_finite(),
            "volatility must be non-negative, got {volatility}"
        );
        Ok(Self { volatility })
    }

    /// The constant volatility.
    pub fn volatility(&self) -> Volatility {
        self.volatility
    }
}

impl BlackVolTermStructure for BlackConstantVol {
    fn black_vol_impl(&self, _t: Time, _strike: Real) -> Result<Volatility> {
        Ok(self.volatility)
    }
}
