//! European vanilla option.

use crate::payoff::{OptionType, Payoff, PlainVanillaPayoff};
use ql_core::{ensure_config, errors::Result, Real, Time};
use std::fmt;

/// A European option on a plain vanilla payoff, exercisable at `maturity`
/// (a year fraction).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EuropeanOption {
    payoff: PlainVanillaPayoff,
    maturity: Time,
}

impl EuropeanOption {
    /// Create an option.
    ///
    /// # Errors
    /// Rejects a non-positive maturity.
    pub fn new(payoff: PlainVanillaPayoff, maturity: Time) -> Result<Self> {
        ensure_config!(maturity > 0.0 && maturity.is_finite(), "maturity must be positive, got {maturity}");
        Ok(Self { payoff, maturity })
    }

    /// Shorthand for `EuropeanOption::new(PlainVanillaPayoff::new(..)?, ..)`.
    pub fn vanilla(option_type: OptionType, strike: Real, maturity: Time) -> Result<Self> {
        Self::new(PlainVanillaPayoff::new(option_type, strike)?, maturity)
    }

    /// The payoff.
    pub fn payoff(&self) -> &PlainVanillaPayoff {
        &self.payoff
    }

    /// Time to expiry.
    pub fn maturity(&self) -> Time {
        self.maturity
    }

    /// Strike of the payoff.
    pub fn strike(&self) -> Real {
        self.payoff.strike()
    }

    /// Call or put.
    pub fn option_type(&self) -> OptionType {
        self.payoff.option_type()
    }

    /// Payoff at expiry for an underlying level.
    pub fn intrinsic(&self, price: Real) -> Real {
        self.payoff.value(price)
    }
}

/// Prices a [`EuropeanOption`].
pub trait PricingEngine: fmt::Debug + Send + Sync {
    /// Discounted present value of `option`.
    fn npv(&self, option: &EuropeanOption) -> Result<Real>;
}
