//! # ql-pricingengines
//!
//! Pricers used to build and validate the density calculators.
//!
//! ## Engines
//!
//! - [`BlackCalculator`]: Black formula on the forward, strike sensitivity, vega
//! - [`black_implied_std_dev`]: inversion of undiscounted Black prices
//! - [`AnalyticEuropeanEngine`]: Black-Scholes-Merton closed form for European options
//! - [`AnalyticHestonPricer`]: Lewis-form Heston pricer with a per-maturity cache
//! - [`HestonBlackVolSurface`]: Black volatilities implied by Heston prices
//! - [`FdBlackScholesVanillaEngine`]: backward finite differences with local volatility

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod analytic_european_engine;
pub mod analytic_heston_engine;
pub mod black_calculator;
pub mod fd_black_scholes_vanilla_engine;
pub mod heston_black_vol_surface;

pub use analytic_european_engine::AnalyticEuropeanEngine;
pub use analytic_heston_engine::AnalyticHestonPricer;
pub use black_calculator::{black_formula, black_implied_std_dev, BlackCalculator};
pub use fd_black_scholes_vanilla_engine::{FdBlackScholesConfig, FdBlackScholesVanillaEngine};
pub use heston_black_vol_surface::HestonBlackVolSurface;
