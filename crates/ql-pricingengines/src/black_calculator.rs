//! Black formula on the forward, with strike sensitivity, vega and implied
//! standard deviation.

use ql_core::{ensure_config, ensure_domain, errors::Result, Real, Time};
use ql_instruments::OptionType;
use ql_math::{invert_cdf, normal_cdf, normal_pdf, QuantileSearch};

/// Black price and sensitivities of a European option on a forward.
///
/// $$V = D\,\phi\,\big(F N(\phi d_1) - K N(\phi d_2)\big),\qquad
///   d_{1,2} = \frac{\ln(F/K)}{s} \pm \frac{s}{2}$$
///
/// with `s` the total standard deviation `σ√T` and `D` the discount factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlackCalculator {
    option_type: OptionType,
    strike: Real,
    forward: Real,
    std_dev: Real,
    discount: Real,
    d1: Real,
    d2: Real,
}

impl BlackCalculator {
    /// # Errors
    /// `Error::Configuration` for a non-positive strike or forward, a
    /// negative standard deviation or a non-positive discount.
    pub fn new(
        option_type: OptionType,
        strike: Real,
        forward: Real,
        std_dev: Real,
        discount: Real,
    ) -> Result<Self> {
        ensure_config!(strike > 0.0, "strike must be positive, got {strike}");
        ensure_config!(forward > 0.0, "forward must be positive, got {forward}");
        ensure_config!(std_dev >= 0.0, "std dev must be non-negative, got {std_dev}");
        ensure_config!(discount > 0.0, "discount must be positive, got {discount}");

        let (d1, d2) = if std_dev > 0.0 {
            let d1 = (forward / strike).ln() / std_dev + 0.5 * std_dev;
            (d1, d1 - std_dev)
        } else if forward > strike {
            (Real::MAX, Real::MAX)
        } else if forward < strike {
            (Real::MIN, Real::MIN)
        } else {
            (0.0, 0.0)
        };

        Ok(Self {
            option_type,
            strike,
            forward,
            std_dev,
            discount,
            d1,
            d2,
        })
    }

    /// Discounted option value.
    pub fn value(&self) -> Real {
        let phi = self.option_type.sign();
        let v = phi
            * (self.forward * normal_cdf(phi * self.d1) - self.strike * normal_cdf(phi * self.d2));
        self.discount * v.max(0.0)
    }

    /// `∂V/∂K = −φ·D·N(φ d₂)`.
    pub fn strike_sensitivity(&self) -> Real {
        let phi = self.option_type.sign();
        -phi * self.discount * normal_cdf(phi * self.d2)
    }

    /// `∂V/∂s = D·F·n(d₁)`, the sensitivity to the total standard deviation.
    pub fn std_dev_sensitivity(&self) -> Real {
        if self.std_dev == 0.0 {
            return 0.0;
        }
        self.discount * self.forward * normal_pdf(self.d1)
    }

    /// `∂V/∂σ` for a volatility quoted over `maturity`.
    pub fn vega(&self, maturity: Time) -> Real {
        self.std_dev_sensitivity() * maturity.max(0.0).sqrt()
    }

    /// Risk-neutral probability of finishing in the money, `N(φ d₂)`.
    pub fn itm_cash_probability(&self) -> Real {
        normal_cdf(self.option_type.sign() * self.d2)
    }

    /// `d₁`.
    pub fn d1(&self) -> Real {
        self.d1
    }

    /// `d₂`.
    pub fn d2(&self) -> Real {
        self.d2
    }
}

/// Black price of a European option.
///
/// # Errors
/// As [`BlackCalculator::new`].
pub fn black_formula(
    option_type: OptionType,
    strike: Real,
    forward: Real,
    std_dev: Real,
    discount: Real,
) -> Result<Real> {
    Ok(BlackCalculator::new(option_type, strike, forward, std_dev, discount)?.value())
}

/// Total standard deviation implied by an undiscounted Black price.
///
/// The price is inverted by the safeguarded Newton solver, starting from the
/// Corrado-Miller approximation. A price equal to the intrinsic value gives
/// zero.
///
/// # Errors
/// `Error::Domain` if the price lies outside the no-arbitrage bounds
/// `[intrinsic, F]` for calls or `[intrinsic, K]` for puts;
/// `Error::Convergence` if the inversion fails.
pub fn black_implied_std_dev(
    option_type: OptionType,
    strike: Real,
    forward: Real,
    black_price: Real,
) -> Result<Real> {
    ensure_domain!(strike > 0.0 && forward > 0.0, "strike {strike} and forward {forward} must be positive");
    let phi = option_type.sign();
    let intrinsic = (phi * (forward - strike)).max(0.0);
    let cap = match option_type {
        OptionType::Call => forward,
        OptionType::Put => strike,
    };
    ensure_domain!(
        black_price >= intrinsic && black_price < cap,
        "{option_type} price {black_price} outside [{intrinsic}, {cap}) for K = {strike}, F = {forward}"
    );
    if black_price == intrinsic {
        return Ok(0.0);
    }

    let guess = corrado_miller_guess(option_type, strike, forward, black_price);
    let price = |s: Real| -> Result<Real> {
        Ok(BlackCalculator::new(option_type, strike, forward, s, 1.0)?.value())
    };
    let slope = |s: Real| -> Result<Real> {
        Ok(BlackCalculator::new(option_type, strike, forward, s, 1.0)?.std_dev_sensitivity())
    };
    let search = QuantileSearch::new(guess, 0.1 * guess)
        .with_lower_bound(0.0)
        .with_accuracy(1.0e-14 * guess.max(1.0e-2));
    invert_cdf(price, slope, black_price, &search)
}

/// Corrado-Miller approximation of the implied standard deviation.
fn corrado_miller_guess(option_type: OptionType, strike: Real, forward: Real, price: Real) -> Real {
    let call = match option_type {
        OptionType::Call => price,
        OptionType::Put => price + forward - strike,
    };
    let half_gap = 0.5 * (forward - strike);
    let a = call - half_gap;
    let disc = (a * a - (forward - strike).powi(2) / std::f64::consts::PI).max(0.0);
    let guess = (2.0 * std::f64::consts::PI).sqrt() / (forward + strike) * (a + disc.sqrt());
    if guess.is_finite() && guess > 1.0e-3 {
        guess
    } else {
        1.0e-3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn put_call_parity() {
        let (k, f, s, d) = (95.0, 102.0, 0.3, 0.97);
        let c = black_formula(OptionType::Call, k, f, s, d).unwrap();
        let p = black_formula(OptionType::Put, k, f, s, d).unwrap();
        assert_abs_diff_eq!(c - p, d * (f - k), epsilon = 1e-12);
    }

    #[test]
    fn known_value() {
        // S = 100, K = 100, r = 5 %, σ = 20 %, T = 1, no dividends
        let df = (-0.05_f64).exp();
        let f = 100.0 / df;
        let c = black_formula(OptionType::Call, 100.0, f, 0.2, df).unwrap();
        assert_abs_diff_eq!(c, 10.450_583_572_185_565, epsilon = 1e-9);
    }

    #[test]
    fn zero_std_dev_is_intrinsic() {
        let c = BlackCalculator::new(OptionType::Call, 90.0, 100.0, 0.0, 0.9).unwrap();
        assert_abs_diff_eq!(c.value(), 9.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c.strike_sensitivity(), -0.9, epsilon = 1e-12);
        let p = BlackCalculator::new(OptionType::Put, 90.0, 100.0, 0.0, 0.9).unwrap();
        assert_eq!(p.value(), 0.0);
        assert_eq!(p.std_dev_sensitivity(), 0.0);
    }

    #[test]
    fn sensitivities_match_finite_differences() {
        let (k, f, s, d, t) = (110.0, 100.0, 0.25, 0.95, 0.8_f64);
        let calc = BlackCalculator::new(OptionType::Put, k, f, s, d).unwrap();
        let h = 1e-4;
        let up = black_formula(OptionType::Put, k + h, f, s, d).unwrap();
        let dn = black_formula(OptionType::Put, k - h, f, s, d).unwrap();
        assert_abs_diff_eq!(calc.strike_sensitivity(), (up - dn) / (2.0 * h), epsilon = 1e-7);

        let vol = s / t.sqrt();
        let up = black_formula(OptionType::Put, k, f, (vol + h) * t.sqrt(), d).unwrap();
        let dn = black_formula(OptionType::Put, k, f, (vol - h) * t.sqrt(), d).unwrap();
        assert_abs_diff_eq!(calc.vega(t), (up - dn) / (2.0 * h), epsilon = 1e-6);
    }

    #[test]
    fn implied_std_dev_round_trip() {
        let cases = [
            (OptionType::Call, 60.0, 0.2),
            (OptionType::Call, 60.0, 1.5),
            (OptionType::Call, 100.0, 0.01),
            (OptionType::Call, 130.0, 0.3),
            (OptionType::Put, 100.0, 0.01),
            (OptionType::Put, 100.0, 0.6),
            (OptionType::Put, 140.0, 0.2),
            (OptionType::Put, 75.0, 0.25),
        ];
        for (ty, k, s) in cases {
            let price = black_formula(ty, k, 100.0, s, 1.0).unwrap();
            let implied = black_implied_std_dev(ty, k, 100.0, price).unwrap();
            assert_abs_diff_eq!(implied, s, epsilon = 1e-8);
        }
    }

    #[test]
    fn implied_std_dev_rejects_arbitrage() {
        assert!(black_implied_std_dev(OptionType::Call, 90.0, 100.0, 10.5).is_ok());
        assert_eq!(black_implied_std_dev(OptionType::Call, 90.0, 100.0, 10.0).unwrap(), 0.0);
        assert!(black_implied_std_dev(OptionType::Call, 90.0, 100.0, 9.5).is_err());
        assert!(black_implied_std_dev(OptionType::Call, 90.0, 100.0, 100.0).is_err());
        assert!(black_implied_std_dev(OptionType::Put, 90.0, 100.0, 95.0).is_err());
    }

    proptest! {
        #[test]
        fn value_within_bounds(k in 20.0..300.0_f64, s in 0.0..2.0_f64) {
            let c = black_formula(OptionType::Call, k, 100.0, s, 1.0).unwrap();
            prop_assert!(c >= (100.0 - k).max(0.0) - 1e-10);
            prop_assert!(c <= 100.0 + 1e-10);
        }
    }
}
