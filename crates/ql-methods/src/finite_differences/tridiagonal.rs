//! Banded storage for three-point difference operators.

use ql_core::{ensure, errors::Result, Real};

/// A tridiagonal matrix stored by bands.
///
/// Row `i` reads `lower[i]·x[i−1] + diag[i]·x[i] + upper[i]·x[i+1]`;
/// `lower[0]` and `upper[n−1]` are never read.
#[derive(Debug, Clone, PartialEq)]
pub struct TridiagonalOperator {
    /// Sub-diagonal.
    pub lower: Vec<Real>,
    /// Main diagonal.
    pub diag: Vec<Real>,
    /// Super-diagonal.
    pub upper: Vec<Real>,
}

impl TridiagonalOperator {
    /// The zero operator on `n` nodes.
    pub fn new(n: usize) -> Self {
        Self {
            lower: vec![0.0; n],
            diag: vec![0.0; n],
            upper: vec![0.0; n],
        }
    }

    /// Number of nodes.
    pub fn size(&self) -> usize {
        self.diag.len()
    }

    /// `A·x`.
    ///
    /// # Errors
    /// Fails if `x` does not match the operator size.
    pub fn apply(&self, x: &[Real]) -> Result<Vec<Real>> {
        let n = self.size();
        ensure!(x.len() == n, "vector of size {} applied to operator of size {n}", x.len());
        Ok((0..n)
            .map(|i| {
                let mut row = self.diag[i] * x[i];
                if i > 0 {
                    row += self.lower[i] * x[i - 1];
                }
                if i + 1 < n {
                    row += self.upper[i] * x[i + 1];
                }
                row
            })
            .collect())
    }

    /// Solve `A·x = rhs` by forward elimination and back substitution.
    ///
    /// # Errors
    /// Fails on a size mismatch, an empty operator or a vanishing pivot.
    pub fn solve(&self, rhs: &[Real]) -> Result<Vec<Real>> {
        let n = self.size();
        ensure!(n > 0, "empty operator");
        ensure!(rhs.len() == n, "rhs of size {} for operator of size {n}", rhs.len());

        // normalised super-diagonal of the upper factor
        let mut gamma = vec![0.0; n];
        let mut x = vec![0.0; n];
        let mut pivot = self.diag[0];
        ensure!(pivot != 0.0, "zero pivot in row 0");
        x[0] = rhs[0] / pivot;
        for i in 1..n {
            gamma[i] = self.upper[i - 1] / pivot;
            pivot = self.diag[i] - self.lower[i] * gamma[i];
            ensure!(pivot != 0.0, "zero pivot in row {i}");
            x[i] = (rhs[i] - self.lower[i] * x[i - 1]) / pivot;
        }
        for i in (0..n - 1).rev() {
            x[i] -= gamma[i + 1] * x[i + 1];
        }
        Ok(x)
    }

    /// `I − factor·A`, the left-hand side of an implicit step.
    pub fn identity_minus(&self, factor: Real) -> Self {
        let negate = |band: &[Real]| band.iter().map(|v| -factor * v).collect();
        Self {
            lower: negate(&self.lower),
            diag: self.diag.iter().map(|v| 1.0 - factor * v).collect(),
            upper: negate(&self.upper),
        }
    }

    /// Replace the first and last rows with identity rows so that the
    /// boundary entries of the right-hand side pass through a solve.
    pub fn set_dirichlet_rows(&mut self) {
        for i in [0, self.size().saturating_sub(1)] {
            if let Some(d) = self.diag.get_mut(i) {
                *d = 1.0;
                self.lower[i] = 0.0;
                self.upper[i] = 0.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// The second-difference matrix `tridiag(−1, 2, −1)`.
    fn laplacian(n: usize) -> TridiagonalOperator {
        TridiagonalOperator {
            lower: vec![-1.0; n],
            diag: vec![2.0; n],
            upper: vec![-1.0; n],
        }
    }

    #[test]
    fn solve_inverts_apply() {
        let op = laplacian(6);
        let x = [0.3, -1.0, 2.5, 0.0, 4.0, 1.5];
        let b = op.apply(&x).unwrap();
        assert_eq!(b[0], 2.0 * 0.3 + 1.0);
        let solved = op.solve(&b).unwrap();
        for (s, e) in solved.iter().zip(x) {
            assert_abs_diff_eq!(*s, e, epsilon = 1e-12);
        }
    }

    #[test]
    fn single_node_system() {
        let op = TridiagonalOperator {
            lower: vec![7.0],
            diag: vec![4.0],
            upper: vec![7.0],
        };
        assert_eq!(op.apply(&[2.0]).unwrap(), vec![8.0]);
        assert_eq!(op.solve(&[8.0]).unwrap(), vec![2.0]);
    }

    #[test]
    fn implicit_system_keeps_boundary_values() {
        let mut lhs = laplacian(5).identity_minus(0.25);
        assert_eq!(lhs.diag[2], 0.5);
        assert_eq!(lhs.upper[2], 0.25);
        lhs.set_dirichlet_rows();
        let x = lhs.solve(&[3.0, 0.0, 0.0, 0.0, -2.0]).unwrap();
        assert_abs_diff_eq!(x[0], 3.0, epsilon = 1e-15);
        assert_abs_diff_eq!(x[4], -2.0, epsilon = 1e-15);
    }

    #[test]
    fn size_mismatch_and_singular_pivot() {
        assert!(laplacian(3).solve(&[1.0]).is_err());
        assert!(laplacian(3).apply(&[1.0, 2.0]).is_err());
        assert!(TridiagonalOperator::new(2).solve(&[1.0, 1.0]).is_err());
    }
}
