//! Natural cubic spline with exact primitive.
//!
//! Second derivatives vanish at both ends. Each interval stores the
//! polynomial
//!
//!   `f(x) = y_i + dx*(a_i + dx*(b_i + dx*c_i))`,   `dx = x - x_i`,
//!
//! so that values, derivatives and integrals share one set of
//! coefficients.

use ql_core::{ensure, errors::Result, Real};

use super::{locate, Interpolation1D};

/// Natural cubic spline interpolation.
#[derive(Debug, Clone)]
pub struct CubicNaturalSpline {
    xs: Vec<Real>,
    ys: Vec<Real>,
    a: Vec<Real>,
    b: Vec<Real>,
    c: Vec<Real>,
    /// `∫_{x_0}^{x_i} f`
    primitive_at_nodes: Vec<Real>,
}

impl CubicNaturalSpline {
    /// Build the spline through `(xs[i], ys[i])`.
    ///
    /// # Errors
    /// Requires at least two points, equal lengths and strictly increasing
    /// abscissae.
    pub fn new(xs: &[Real], ys: &[Real]) -> Result<Self> {
        let n = xs.len();
        ensure!(n >= 2, "need at least 2 points for interpolation");
        ensure!(n == ys.len(), "xs and ys must have the same length");
        ensure!(
            xs.windows(2).all(|w| w[1] > w[0]),
            "abscissae must be strictly increasing"
        );

        let h: Vec<Real> = xs.windows(2).map(|w| w[1] - w[0]).collect();
        let s: Vec<Real> = (0..n - 1).map(|i| (ys[i + 1] - ys[i]) / h[i]).collect();

        // second derivatives, natural end conditions
        let mut m = vec![0.0; n];
        if n > 2 {
            let k = n - 2;
            let mut diag = vec![0.0; k];
            let mut rhs = vec![0.0; k];
            for j in 0..k {
                diag[j] = 2.0 * (h[j] + h[j + 1]);
                rhs[j] = 6.0 * (s[j + 1] - s[j]);
            }
            // Thomas forward sweep; sub/super diagonals are h[j]/h[j+1]
            for j in 1..k {
                let w = h[j] / diag[j - 1];
                diag[j] -= w * h[j];
                rhs[j] -= w * rhs[j - 1];
            }
            m[k] = rhs[k - 1] / diag[k - 1];
            for j in (0..k - 1).rev() {
                m[j + 1] = (rhs[j] - h[j + 1] * m[j + 2]) / diag[j];
            }
        }

        let mut a = Vec::with_capacity(n - 1);
        let mut b = Vec::with_capacity(n - 1);
        let mut c = Vec::with_capacity(n - 1);
        for i in 0..n - 1 {
            a.push(s[i] - h[i] * (2.0 * m[i] + m[i + 1]) / 6.0);
            b.push(0.5 * m[i]);
            c.push((m[i + 1] - m[i]) / (6.0 * h[i]));
        }

        let mut primitive_at_nodes = Vec::with_capacity(n);
        primitive_at_nodes.push(0.0);
        for i in 0..n - 1 {
            let prev = primitive_at_nodes[i];
            primitive_at_nodes.push(prev + piece_primitive(ys[i], a[i], b[i], c[i], h[i]));
        }

        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            a,
            b,
            c,
            primitive_at_nodes,
        })
    }

    /// Interpolation nodes.
    pub fn xs(&self) -> &[Real] {
        &self.xs
    }

    /// Interpolated values at the nodes.
    pub fn ys(&self) -> &[Real] {
        &self.ys
    }

    /// Spline value; extrapolates with the end polynomials.
    pub fn value(&self, x: Real) -> Real {
        let i = locate(&self.xs, x);
        let dx = x - self.xs[i];
        self.ys[i] + dx * (self.a[i] + dx * (self.b[i] + dx * self.c[i]))
    }

    /// First derivative.
    pub fn derivative(&self, x: Real) -> Real {
        let i = locate(&self.xs, x);
        let dx = x - self.xs[i];
        self.a[i] + dx * (2.0 * self.b[i] + 3.0 * dx * self.c[i])
    }

    /// `∫_{x_0}^{x} f`, exact for the spline.
    pub fn primitive(&self, x: Real) -> Real {
        let i = locate(&self.xs, x);
        let dx = x - self.xs[i];
        self.primitive_at_nodes[i] + piece_primitive(self.ys[i], self.a[i], self.b[i], self.c[i], dx)
    }

    /// `∫_{x_0}^{x_{n-1}} f`.
    pub fn total_integral(&self) -> Real {
        self.primitive_at_nodes[self.primitive_at_nodes.len() - 1]
    }
}

#[inline]
fn piece_primitive(y: Real, a: Real, b: Real, c: Real, dx: Real) -> Real {
    dx * (y + dx * (0.5 * a + dx * (b / 3.0 + 0.25 * dx * c)))
}

impl Interpolation1D for CubicNaturalSpline {
    fn operator(&self, x: Real) -> Real {
        self.value(x)
    }

    fn x_min(&self) -> Real {
        self.xs[0]
    }

    fn x_max(&self) -> Real {
        self.xs[self.xs.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn reproduces_nodes_and_linear_data() {
        let xs = [0.0, 0.5, 1.7, 2.0, 3.1];
        let ys: Vec<Real> = xs.iter().map(|x| 2.0 * x - 1.0).collect();
        let s = CubicNaturalSpline::new(&xs, &ys).unwrap();
        for (&x, &y) in xs.iter().zip(&ys) {
            assert_abs_diff_eq!(s.value(x), y, epsilon = 1e-14);
        }
        assert_abs_diff_eq!(s.value(1.1), 1.2, epsilon = 1e-14);
        assert_abs_diff_eq!(s.derivative(2.6), 2.0, epsilon = 1e-13);
        // ∫_0^3.1 (2x - 1) = 3.1^2 - 3.1
        assert_abs_diff_eq!(s.total_integral(), 3.1 * 3.1 - 3.1, epsilon = 1e-13);
    }

    #[test]
    fn smooth_function_on_non_uniform_nodes() {
        let xs: Vec<Real> = (0..=80).map(|i| (i as Real / 80.0).powf(1.3) * 3.0).collect();
        let ys: Vec<Real> = xs.iter().map(|x| x.sin()).collect();
        let s = CubicNaturalSpline::new(&xs, &ys).unwrap();
        for &x in &[0.3, 1.0, 1.77, 2.5] {
            assert_abs_diff_eq!(s.value(x), x.sin(), epsilon = 1e-5);
            assert_abs_diff_eq!(s.primitive(x), 1.0 - x.cos(), epsilon = 1e-6);
        }
    }

    #[test]
    fn primitive_is_continuous_at_nodes() {
        let xs = [0.0, 1.0, 2.0, 4.0];
        let ys = [0.0, 1.0, 0.5, 2.0];
        let s = CubicNaturalSpline::new(&xs, &ys).unwrap();
        for &x in &xs[1..3] {
            assert_abs_diff_eq!(s.primitive(x - 1e-12), s.primitive(x), epsilon = 1e-10);
        }
    }

    #[test]
    fn rejects_unsorted_nodes() {
        assert!(CubicNaturalSpline::new(&[0.0, 1.0, 1.0], &[0.0, 1.0, 2.0]).is_err());
        assert!(CubicNaturalSpline::new(&[0.0], &[0.0]).is_err());
    }
}
