//! # ql-methods
//!
//! Numerical methods shared by the density calculators and the pricing
//! engines used to validate them.
//!
//! # Modules
//!
//! * [`time_grid`]: uniform, mandatory-time and adaptive time grids
//! * [`finite_differences`]: tridiagonal operators, 1-D meshers, the
//!   forward Fokker-Planck and backward Black-Scholes operators, θ-scheme
//!   stepping

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Time grids for PDE marches.
pub mod time_grid;

/// Finite difference methods: operators, meshers, time stepping.
pub mod finite_differences;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use finite_differences::{
    black_scholes_operator, fokker_planck_operator, theta_step, Concentrating1dMesher, Dirichlet,
    FdmScheme, TridiagonalOperator,
};
pub use time_grid::TimeGrid;
