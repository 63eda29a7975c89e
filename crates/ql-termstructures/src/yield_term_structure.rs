//! `YieldTermStructure`: yield / interest-rate term structures.
//!
//! The trait exposes the three quantities a density calculator needs from a
//! rate or dividend curve:
//!
//! * **discount factor**: `P(0,t)`
//! * **zero rate**: the continuously-compounded zero rate for maturity *t*
//! * **forward rate**: the continuously-compounded forward rate between two
//!   times, or the instantaneous forward when both coincide

use ql_core::{DiscountFactor, Rate, Time};

/// A yield (interest-rate) term structure on a year-fraction axis.
///
/// Implementors must provide **at least one** of
/// [`discount_impl`](YieldTermStructure::discount_impl) and
/// [`zero_rate_impl`](YieldTermStructure::zero_rate_impl); the other is
/// derived from it.
pub trait YieldTermStructure: std::fmt::Debug + Send + Sync {
    // ── Low-level impl hooks ─────────────────────────────────────────────

    /// Return the discount factor for a given time `t`.
    ///
    /// Default: computed from `zero_rate_impl`.
    fn discount_impl(&self, t: Time) -> DiscountFactor {
        if t == 0.0 {
            return 1.0;
        }
        let r = self.zero_rate_impl(t);
        (-r * t).exp()
    }

    /// Return the continuously-compounded zero rate for time `t`.
    ///
    /// Default: computed from `discount_impl`; at `t = 0` the short rate is
    /// used as the limit.
    fn zero_rate_impl(&self, t: Time) -> Rate {
        if t == 0.0 {
            return self.forward_rate(0.0, 0.0);
        }
        let df = self.discount_impl(t);
        -df.ln() / t
    }

    // ── Public interface ─────────────────────────────────────────────────

    /// Discount factor for a time.
    fn discount(&self, t: Time) -> DiscountFactor {
        self.discount_impl(t)
    }

    /// Continuously-compounded zero rate for time `t`.
    fn zero_rate(&self, t: Time) -> Rate {
        self.zero_rate_impl(t)
    }

    /// Continuously-compounded forward rate between `t1` and `t2`.
    ///
    /// With `t1 == t2` the instantaneous forward rate is returned, computed
    /// by a central difference of `ln P`.
    fn forward_rate(&self, t1: Time, t2: Time) -> Rate {
        if t2 == t1 {
            let dt = 1.0e-4;
            let lo = (t1 - 0.5 * dt).max(0.0);
            let hi = lo + dt;
            return (self.discount_impl(lo).ln() - self.discount_impl(hi).ln()) / dt;
        }
        (self.discount_impl(t1).ln() - self.discount_impl(t2).ln()) / (t2 - t1)
    }
}
