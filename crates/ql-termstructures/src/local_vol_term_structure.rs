//! `LocalVolTermStructure`: local-volatility term structures.
//!
//! Provides the `LocalVolTermStructure` trait and `LocalConstantVol`.

use ql_core::{ensure_config, errors::Result, Real, Time, Volatility};

/// A local-volatility term structure: `σ_local(t, S)`.
pub trait LocalVolTermStructure: std::fmt::Debug + Send + Sync {
    /// Local volatility for time `t` and underlying level `underlying`.
    fn local_vol(&self, t: Time, underlying: Real) -> Result<Volatility>;
}

// ── LocalConstantVol ──────────────────────────────────────────────────────────

/// A constant local volatility surface.
///
/// `σ_local(t, S) = constant` for all `t` and `S`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalConstantVol {
    volatility: Volatility,
}

impl LocalConstantVol {
    /// Create a constant local vol surface.
    ///
    /// # Errors
    /// Rejects negative or non-finite volatilities.
    pub fn new(volatility: Volatility) -> Result<Self> {
        ensure_config!(
            volatility >= 0.0 && volatility.is_finite(),
            "local volatility must be non-negative, got {volatility}"
        );
        Ok(Self { volatility })
    }

    /// The constant volatility value.
    pub fn volatility(&self) -> Volatility {
        self.volatility
    }
}

impl LocalVolTermStructure for LocalConstantVol {
    fn local_vol(&self, _t: Time, _underlying: Real) -> Result<Volatility> {
        Ok(self.volatility)
    }
}
