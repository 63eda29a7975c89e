//! 1D root-finding solvers.
//!
//! [`newton_safe`] combines Newton steps with bisection inside a bracket.
//! [`bracket_root`] finds a bracket from a guess, and [`invert_cdf`] chains
//! the two to compute quantiles of any distribution given its cdf and pdf.
//! [`invert_positive_cdf`] does the same on a logarithmic abscissa for laws
//! supported on the positive half-line.

use ql_core::{
    errors::{Error, Result},
    Real,
};

const MAX_ITERATIONS: usize = 100;
const DEFAULT_ACCURACY: Real = 1.0e-11;
// |ln x| above this leaves the normal float range
const MAX_LOG_ABSCISSA: Real = 700.0;
const LOG_ACCURACY: Real = 1.0e-12;

// ── Newton-Safe ───────────────────────────────────────────────────────────────

/// A safe Newton-Raphson method that falls back to bisection when the
/// Newton step would leave the bracket or converge too slowly.
///
/// `f_df` returns `(f(x), f'(x))` and may itself fail. Convergence is
/// declared when the last step is shorter than `accuracy` or `f(x)` is
/// exactly zero.
pub fn newton_safe<F>(f_df: F, x_min: Real, x_max: Real, accuracy: Real) -> Result<Real>
where
    F: Fn(Real) -> Result<(Real, Real)>,
{
    let acc = if accuracy > 0.0 {
        accuracy
    } else {
        DEFAULT_ACCURACY
    };
    let (flo, _) = f_df(x_min)?;
    let (fhi, _) = f_df(x_max)?;

    if flo * fhi > 0.0 {
        return Err(Error::Precondition(format!(
            "NewtonSafe: f({x_min}) and f({x_max}) must have opposite signs"
        )));
    }
    if flo == 0.0 {
        return Ok(x_min);
    }
    if fhi == 0.0 {
        return Ok(x_max);
    }

    // Orient so that f(xl) < 0
    let (mut xl, mut xh) = if flo < 0.0 {
        (x_min, x_max)
    } else {
        (x_max, x_min)
    };

    let mut x = 0.5 * (xl + xh);
    let mut dx_old = (xh - xl).abs();
    let mut dx = dx_old;

    let (mut fx, mut dfx) = f_df(x)?;

    for _ in 0..MAX_ITERATIONS {
        let newton_out_of_range = ((x - xh) * dfx - fx) * ((x - xl) * dfx - fx) > 0.0;
        let bisection_faster = (2.0 * fx).abs() > (dx_old * dfx).abs();

        if newton_out_of_range || bisection_faster || !dfx.is_finite() {
            dx_old = dx;
            dx = 0.5 * (xh - xl);
            x = xl + dx;
        } else {
            dx_old = dx;
            dx = fx / dfx;
            x -= dx;
        }

        if dx.abs() < acc {
            return Ok(x);
        }

        (fx, dfx) = f_df(x)?;
        if fx == 0.0 {
            return Ok(x);
        }
        if fx < 0.0 {
            xl = x;
        } else {
            xh = x;
        }
    }

    Err(Error::Convergence {
        solver: "NewtonSafe",
        iterations: MAX_ITERATIONS,
    })
}

// ── Quantile inversion ────────────────────────────────────────────────────────

/// Starting point and limits for [`invert_cdf`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantileSearch {
    /// Initial guess for the quantile.
    pub guess: Real,
    /// Initial half-width of the bracket; doubled on every expansion.
    pub step: Real,
    /// Lowest admissible abscissa (may be `-inf`).
    pub lower: Real,
    /// Highest admissible abscissa (may be `+inf`).
    pub upper: Real,
    /// Absolute accuracy on the abscissa.
    pub accuracy: Real,
}

impl QuantileSearch {
    /// Unbounded search around `guess` with initial step `step`.
    pub fn new(guess: Real, step: Real) -> Self {
        Self {
            guess,
            step,
            lower: Real::NEG_INFINITY,
            upper: Real::INFINITY,
            accuracy: DEFAULT_ACCURACY,
        }
    }

    /// Restrict the search to `x >= lower`.
    pub fn with_lower_bound(mut self, lower: Real) -> Self {
        self.lower = lower;
        self
    }

    /// Restrict the search to `x <= upper`.
    pub fn with_upper_bound(mut self, upper: Real) -> Self {
        self.upper = upper;
        self
    }

    /// Set the absolute accuracy on the abscissa.
    pub fn with_accuracy(mut self, accuracy: Real) -> Self {
        self.accuracy = accuracy;
        self
    }
}

/// Expand a bracket around a sign change of a non-decreasing `f`.
///
/// Starting from `search.guess`, the bracket is grown geometrically in the
/// direction of the root (doubling `search.step` on every expansion) and
/// clamped to `[search.lower, search.upper]`. Returns `(lo, hi)` with
/// `f(lo) <= 0 <= f(hi)`.
///
/// # Errors
/// [`Error::Convergence`] if a bound is reached or the expansion budget is
/// exhausted without a sign change.
pub fn bracket_root<F>(f: F, search: &QuantileSearch) -> Result<(Real, Real)>
where
    F: Fn(Real) -> Result<Real>,
{
    let guess = search.guess.clamp(search.lower, search.upper);
    let mut width = if search.step > 0.0 { search.step } else { 1.0 };

    let f_guess = f(guess)?;
    if f_guess == 0.0 {
        return Ok((guess, guess));
    }

    let mut anchor = guess;
    for expansions in 1..=MAX_ITERATIONS {
        if f_guess < 0.0 {
            let hi = (anchor + width).min(search.upper);
            if f(hi)? >= 0.0 {
                return Ok((anchor, hi));
            }
            if hi >= search.upper {
                return Err(Error::Convergence {
                    solver: "bracket_root",
                    iterations: expansions,
                });
            }
            anchor = hi;
        } else {
            let lo = (anchor - width).max(search.lower);
            if f(lo)? <= 0.0 {
                return Ok((lo, anchor));
            }
            if lo <= search.lower {
                return Err(Error::Convergence {
                    solver: "bracket_root",
                    iterations: expansions,
                });
            }
            anchor = lo;
        }
        width *= 2.0;
    }
    Err(Error::Convergence {
        solver: "bracket_root",
        iterations: MAX_ITERATIONS,
    })
}

/// Solve `cdf(x) = p` for a non-decreasing `cdf` with derivative `pdf`.
///
/// The bracket comes from [`bracket_root`]; it is then refined by
/// [`newton_safe`] with `pdf` as the derivative.
///
/// # Errors
/// [`Error::Convergence`] if no bracket is found within the iteration budget
/// or the refinement does not converge; errors from `cdf`/`pdf` are
/// propagated.
pub fn invert_cdf<C, P>(cdf: C, pdf: P, p: Real, search: &QuantileSearch) -> Result<Real>
where
    C: Fn(Real) -> Result<Real>,
    P: Fn(Real) -> Result<Real>,
{
    let (lo, hi) = bracket_root(|x| Ok(cdf(x)? - p), search)?;
    if lo == hi {
        return Ok(lo);
    }
    newton_safe(
        |x| Ok((cdf(x)? - p, pdf(x)?)),
        lo,
        hi,
        search.accuracy,
    )
}

/// Solve `cdf(x) = p` for a law supported on `(0, ∞)`.
///
/// The search runs on `y = ln x` starting from `ln(guess)`, so quantiles
/// hundreds of orders of magnitude below `guess` are bracketed in a few
/// expansions and resolved to a relative accuracy of about `1e-12`. This
/// matters for laws whose cdf behaves like `x^a` at the origin with a small
/// exponent `a`. Quantiles below `e^-700` are flushed to zero.
///
/// # Errors
/// As [`invert_cdf`].
pub fn invert_positive_cdf<C, P>(cdf: C, pdf: P, p: Real, guess: Real) -> Result<Real>
where
    C: Fn(Real) -> Result<Real>,
    P: Fn(Real) -> Result<Real>,
{
    if cdf((-MAX_LOG_ABSCISSA).exp())? >= p {
        return Ok(0.0);
    }
    let start = if guess > 0.0 && guess.is_finite() {
        guess.ln()
    } else {
        0.0
    };
    let search = QuantileSearch::new(start, 1.0)
        .with_lower_bound(-MAX_LOG_ABSCISSA)
        .with_upper_bound(MAX_LOG_ABSCISSA)
        .with_accuracy(LOG_ACCURACY);
    // dF/dy = x·f(x)
    let y = invert_cdf(
        |y| cdf(y.exp()),
        |y| {
            let x = y.exp();
            Ok(x * pdf(x)?)
        },
        p,
        &search,
    )?;
    Ok(y.exp())
}
