//! Finite difference methods on one-dimensional log-price meshes.
//!
//! # Overview
//!
//! * [`TridiagonalOperator`]: tridiagonal matrix with Thomas-algorithm solver
//! * [`Concentrating1dMesher`]: uniform or sinh-concentrated 1-D meshes
//! * [`fokker_planck_operator`]: forward (density) operator
//! * [`black_scholes_operator`]: backward (pricing) operator
//! * [`theta_step`]: implicit or Crank-Nicolson time step

mod mesher;
mod operators;
mod tridiagonal;

pub use mesher::Concentrating1dMesher;
pub use operators::{black_scholes_operator, fokker_planck_operator};
pub use tridiagonal::TridiagonalOperator;

use ql_core::{ensure, errors::Result, Real};

// ─── FDM scheme selection ─────────────────────────────────────────────────────

/// Finite difference time-stepping scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum FdmScheme {
    /// Fully implicit Euler: unconditionally stable and damping.
    Implicit,
    /// Crank-Nicolson: second-order in time.
    CrankNicolson,
}

impl FdmScheme {
    /// Implicitness weight θ of the scheme.
    pub fn theta(self) -> Real {
        match self {
            FdmScheme::Implicit => 1.0,
            FdmScheme::CrankNicolson => 0.5,
        }
    }
}

/// Values imposed on the first and last node after a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dirichlet {
    /// Value at the lowest node.
    pub lower: Real,
    /// Value at the highest node.
    pub upper: Real,
}

impl Dirichlet {
    /// Absorbing boundaries.
    pub const ZERO: Dirichlet = Dirichlet {
        lower: 0.0,
        upper: 0.0,
    };
}

/// Advance `values` by `dt` for `∂u/∂τ = L u` with the θ-scheme
///
/// `(I − θ·dt·L) uⁿ⁺¹ = (I + (1−θ)·dt·L) uⁿ`,
///
/// with the boundary rows of `op` ignored and replaced by `boundary`.
///
/// # Errors
/// Size mismatches and singular systems are reported as
/// `Error::Precondition`.
pub fn theta_step(
    op: &TridiagonalOperator,
    values: &[Real],
    dt: Real,
    scheme: FdmScheme,
    boundary: Dirichlet,
) -> Result<Vec<Real>> {
    let n = op.size();
    ensure!(n >= 3, "theta step needs at least 3 nodes, got {n}");
    ensure!(values.len() == n, "operator size {n} does not match {} values", values.len());
    let theta = scheme.theta();

    let mut rhs = if theta < 1.0 {
        let lu = op.apply(values)?;
        values
            .iter()
            .zip(&lu)
            .map(|(v, l)| v + (1.0 - theta) * dt * l)
            .collect()
    } else {
        values.to_vec()
    };
    rhs[0] = boundary.lower;
    rhs[n - 1] = boundary.upper;
    let mut lhs = op.identity_minus(theta * dt);
    lhs.set_dirichlet_rows();
    lhs.solve(&rhs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn heat_equation_decay_of_a_sine_mode() {
        // u_τ = u_xx on [0, π], u = sin x decays like e^{−τ}
        let n = 201;
        let xs: Vec<Real> = (0..n)
            .map(|i| std::f64::consts::PI * i as Real / (n - 1) as Real)
            .collect();
        let a = vec![1.0; n];
        let zero = vec![0.0; n];
        let op = fokker_planck_operator(&xs, &a, &zero).unwrap();
        let mut u: Vec<Real> = xs.iter().map(|x| x.sin()).collect();
        let steps = 100;
        for _ in 0..steps {
            u = theta_step(&op, &u, 0.5 / steps as Real, FdmScheme::CrankNicolson, Dirichlet::ZERO)
                .unwrap();
        }
        let expected = (-0.5_f64).exp();
        assert_abs_diff_eq!(u[(n - 1) / 2], expected, epsilon = 1e-4);
    }

    #[test]
    fn implicit_step_applies_boundaries() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let op = fokker_planck_operator(&xs, &[0.5; 4], &[0.0; 4]).unwrap();
        assert_eq!(FdmScheme::Implicit.theta(), 1.0);
        let flat = theta_step(&op, &[1.0; 4], 0.1, FdmScheme::Implicit, Dirichlet { lower: 1.0, upper: 1.0 })
            .unwrap();
        for v in flat {
            assert_abs_diff_eq!(v, 1.0, epsilon = 1e-15);
        }
        let u = theta_step(
            &op,
            &[1.0, 1.0, 1.0, 1.0],
            0.1,
            FdmScheme::Implicit,
            Dirichlet { lower: 2.0, upper: 3.0 },
        )
        .unwrap();
        assert_eq!(u[0], 2.0);
        assert_eq!(u[3], 3.0);
        assert!(u[1] > 1.0 && u[2] > u[1], "{u:?}");
    }
}
