//! # ql-processes
//!
//! Process descriptions consumed by the density calculators: the
//! generalized Black-Scholes process, the Heston stochastic-volatility
//! process with its characteristic function, and the square-root (CIR)
//! process with its transition law parameters.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod black_scholes_process;
pub mod heston_process;
pub mod square_root_process;

pub use black_scholes_process::{black_scholes_merton_process, GeneralizedBlackScholesProcess};
pub use heston_process::HestonProcess;
pub use square_root_process::SquareRootProcess;
