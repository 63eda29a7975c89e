//! # ql-termstructures
//!
//! Yield curves and volatility surfaces consumed by the density
//! calculators. All term structures are parametrized directly by year
//! fractions: day counting and calendars are the caller's business.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// `YieldTermStructure`: discount factors, zero and forward rates.
pub mod yield_term_structure;

/// `FlatForward`: constant forward-rate yield curve.
pub mod flat_forward;

/// `BlackVolTermStructure`: Black-volatility term structures and `BlackConstantVol`.
pub mod black_vol_term_structure;

/// `LocalVolTermStructure`: local-volatility term structures and `LocalConstantVol`.
pub mod local_vol_term_structure;

/// `LocalVolSurface`: Dupire local volatility surface from a Black vol surface.
pub mod local_vol_surface;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use black_vol_term_structure::{BlackConstantVol, BlackVolTermStructure};
pub use flat_forward::FlatForward;
pub use local_vol_surface::LocalVolSurface;
pub use local_vol_term_structure::{LocalConstantVol, LocalVolTermStructure};
pub use yield_term_structure::YieldTermStructure;
