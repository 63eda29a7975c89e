//! Call/put flags and the plain vanilla payoff.

use ql_core::{ensure_config, errors::Result, Real};
use std::fmt;

/// Call or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionType {
    /// Pays `max(S − K, 0)`.
    Call,
    /// Pays `max(K − S, 0)`.
    Put,
}

impl OptionType {
    /// `φ = +1` for a call, `−1` for a put.
    pub fn sign(self) -> Real {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }

    /// The parity partner.
    pub fn other(self) -> Self {
        match self {
            OptionType::Call => OptionType::Put,
            OptionType::Put => OptionType::Call,
        }
    }

    /// The out-of-the-money side for `strike` against `forward`: puts below
    /// the forward, calls at and above it.
    pub fn out_of_the_money(strike: Real, forward: Real) -> Self {
        if strike < forward {
            OptionType::Put
        } else {
            OptionType::Call
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OptionType::Call => "Call",
            OptionType::Put => "Put",
        })
    }
}

/// Terminal payoff as a function of the underlying level.
pub trait Payoff: fmt::Debug + Send + Sync {
    /// Payoff at expiry.
    fn value(&self, price: Real) -> Real;
}

/// `max(φ(S − K), 0)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlainVanillaPayoff {
    option_type: OptionType,
    strike: Real,
}

impl PlainVanillaPayoff {
    /// # Errors
    /// `Error::Configuration` for a non-positive or non-finite strike.
    pub fn new(option_type: OptionType, strike: Real) -> Result<Self> {
        ensure_config!(strike > 0.0 && strike.is_finite(), "strike must be positive, got {strike}");
        Ok(Self {
            option_type,
            strike,
        })
    }

    /// The strike.
    pub fn strike(&self) -> Real {
        self.strike
    }

    /// Call or put.
    pub fn option_type(&self) -> OptionType {
        self.option_type
    }
}

impl Payoff for PlainVanillaPayoff {
    fn value(&self, price: Real) -> Real {
        (self.option_type.sign() * (price - self.strike)).max(0.0)
    }
}

impl fmt::Display for PlainVanillaPayoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vanilla {} @ {}", self.option_type, self.strike)
    }
}
