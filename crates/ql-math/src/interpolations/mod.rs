//! One-dimensional interpolation on tabulated data.

use ql_core::{ensure, errors::Result, Real};

mod cubic;

pub use cubic::CubicNaturalSpline;

/// A curve through tabulated points.
pub trait Interpolation1D: std::fmt::Debug {
    /// Value at `x`; outside the nodes the end pieces are extended.
    fn operator(&self, x: Real) -> Real;

    /// First node.
    fn x_min(&self) -> Real;

    /// Last node.
    fn x_max(&self) -> Real;

    /// `x_min() <= x <= x_max()`.
    fn is_in_range(&self, x: Real) -> bool {
        x >= self.x_min() && x <= self.x_max()
    }
}

/// Piecewise-linear interpolation, extrapolating the end segments.
///
/// Abscissae need only be non-decreasing; a zero-width segment returns its
/// left value, so monotone tables with flat stretches can be inverted.
#[derive(Debug, Clone)]
pub struct LinearInterpolation {
    xs: Vec<Real>,
    ys: Vec<Real>,
}

impl LinearInterpolation {
    /// Construct from non-decreasing `xs` and matching `ys`.
    ///
    /// # Errors
    /// Needs at least two points of equal length and ordered abscissae.
    pub fn new(xs: &[Real], ys: &[Real]) -> Result<Self> {
        ensure!(xs.len() >= 2, "need at least 2 points for interpolation");
        ensure!(xs.len() == ys.len(), "xs and ys must have the same length");
        ensure!(
            xs.windows(2).all(|w| w[1] >= w[0]),
            "abscissae must be non-decreasing"
        );
        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
        })
    }
}

impl Interpolation1D for LinearInterpolation {
    fn operator(&self, x: Real) -> Real {
        let i = locate(&self.xs, x);
        let dx = self.xs[i + 1] - self.xs[i];
        if dx <= 0.0 {
            return self.ys[i];
        }
        self.ys[i] + (x - self.xs[i]) * (self.ys[i + 1] - self.ys[i]) / dx
    }

    fn x_min(&self) -> Real {
        self.xs[0]
    }

    fn x_max(&self) -> Real {
        self.xs[self.xs.len() - 1]
    }
}

/// Segment index `i` with `xs[i] <= x < xs[i+1]`, clamped to `[0, n-2]`.
pub(crate) fn locate(xs: &[Real], x: Real) -> usize {
    xs.partition_point(|&node| node <= x)
        .saturating_sub(1)
        .min(xs.len() - 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_clamps_and_searches() {
        let xs = [0.0, 1.0, 2.5, 4.0];
        assert_eq!(locate(&xs, -1.0), 0);
        assert_eq!(locate(&xs, 0.5), 0);
        assert_eq!(locate(&xs, 1.0), 1);
        assert_eq!(locate(&xs, 3.9), 2);
        assert_eq!(locate(&xs, 9.0), 2);
    }

    #[test]
    fn linear_interpolates_and_extrapolates() {
        let interp = LinearInterpolation::new(&[0.0, 1.0, 1.0, 3.0], &[0.0, 2.0, 5.0, 9.0]).unwrap();
        assert_eq!(interp.operator(0.5), 1.0);
        assert_eq!(interp.operator(2.0), 7.0);
        assert_eq!(interp.operator(4.0), 11.0);
        assert!(interp.is_in_range(3.0) && !interp.is_in_range(3.5));
        assert!(LinearInterpolation::new(&[1.0, 0.0], &[0.0, 1.0]).is_err());
    }
}
