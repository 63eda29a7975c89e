//! `FlatForward`: a yield term structure with a constant forward rate.

use crate::yield_term_structure::YieldTermStructure;
use ql_core::{DiscountFactor, Rate, Time};

/// A flat (constant) continuously-compounded yield curve.
///
/// `P(t) = exp(-r t)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatForward {
    rate: Rate,
}

impl FlatForward {
    /// Create a flat curve with continuously-compounded rate `rate`.
    pub fn new(rate: Rate) -> Self {
        Self { rate }
    }

    /// The continuously-compounded rate.
    pub fn rate(&self) -> Rate {
        self.rate
    }
}

impl YieldTermStructure for FlatForward {
    fn discount_impl(&self, t: Time) -> DiscountFactor {
        (-self.rate * t).exp()
    }

    fn zero_rate_impl(&self, _t: Time) -> Rate {
        self.rate
    }

    fn forward_rate(&self, _t1: Time, _t2: Time) -> Rate {
        self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn flat_forward_discount() {
        let curve = FlatForward::new(0.05);
        assert_abs_diff_eq!(curve.discount(0.0), 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(curve.discount(2.0), (-0.1_f64).exp(), epsilon = 1e-15);
        assert_abs_diff_eq!(curve.zero_rate(3.0), 0.05, epsilon = 1e-15);
        assert_abs_diff_eq!(curve.forward_rate(1.0, 2.0), 0.05, epsilon = 1e-15);
    }

    #[derive(Debug)]
    struct DiscountOnly;

    impl YieldTermStructure for DiscountOnly {
        fn discount_impl(&self, t: Time) -> DiscountFactor {
            (-0.03 * t - 0.01 * t * t).exp()
        }
    }

    #[test]
    fn derived_rates_from_discount_hook() {
        let curve = DiscountOnly;
        assert_abs_diff_eq!(curve.zero_rate(2.0), 0.05, epsilon = 1e-14);
        // instantaneous forward r(t) = 0.03 + 0.02 t
        assert_abs_diff_eq!(curve.forward_rate(1.0, 1.0), 0.05, epsilon = 1e-9);
        assert_abs_diff_eq!(curve.forward_rate(1.0, 2.0), 0.06, epsilon = 1e-14);
    }
}
