//! # ql-instruments
//!
//! Option types, payoffs and the European vanilla option priced by the
//! engines used to validate the density calculators.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod option;
pub mod payoff;

pub use option::{EuropeanOption, PricingEngine};
pub use payoff::{OptionType, Payoff, PlainVanillaPayoff};
