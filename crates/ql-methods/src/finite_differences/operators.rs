//! Spatial operators in log-price on non-uniform meshes.
//!
//! Both operators use three-point second-order differences. Rows `0` and
//! `n−1` are left empty; boundary values are imposed by the time stepper.

use super::TridiagonalOperator;
use ql_core::{ensure, errors::Result, Real};

fn check_inputs(x: &[Real], coefficients: &[&[Real]]) -> Result<()> {
    let n = x.len();
    ensure!(n >= 3, "operator needs at least 3 nodes, got {n}");
    ensure!(
        coefficients.iter().all(|c| c.len() == n),
        "coefficient vectors must match the {n} mesh nodes"
    );
    ensure!(
        x.windows(2).all(|w| w[1] > w[0]),
        "mesh must be strictly increasing"
    );
    Ok(())
}

/// Forward (Fokker-Planck) operator `L p = ∂ₓₓ(a p) − ∂ₓ(μ p)`.
///
/// For the log-price of a local-volatility diffusion `a = σ²/2` and
/// `μ = r − q − σ²/2`. The products `a p` and `μ p` are differenced as a
/// whole, so the scheme conserves mass in the interior up to boundary
/// fluxes.
///
/// # Errors
/// Fails on fewer than 3 nodes, mismatched lengths or an unordered mesh.
pub fn fokker_planck_operator(x: &[Real], a: &[Real], mu: &[Real]) -> Result<TridiagonalOperator> {
    check_inputs(x, &[a, mu])?;
    let n = x.len();
    let mut op = TridiagonalOperator::new(n);
    for i in 1..n - 1 {
        let hm = x[i] - x[i - 1];
        let hp = x[i + 1] - x[i];
        let hs = hm + hp;

        op.lower[i] = 2.0 * a[i - 1] / (hs * hm) + mu[i - 1] * hp / (hm * hs);
        op.diag[i] = -2.0 * a[i] / (hm * hp) - mu[i] * (hp - hm) / (hm * hp);
        op.upper[i] = 2.0 * a[i + 1] / (hs * hp) - mu[i + 1] * hm / (hp * hs);
    }
    Ok(op)
}

/// Backward Black-Scholes operator in `x = ln S`:
/// `L V = a ∂ₓₓV + μ ∂ₓV − r V`, with `a = σ²/2` and `μ = r − q − σ²/2`.
///
/// # Errors
/// Fails on fewer than 3 nodes, mismatched lengths or an unordered mesh.
pub fn black_scholes_operator(
    x: &[Real],
    a: &[Real],
    mu: &[Real],
    r: Real,
) -> Result<TridiagonalOperator> {
    check_inputs(x, &[a, mu])?;
    let n = x.len();
    let mut op = TridiagonalOperator::new(n);
    for i in 1..n - 1 {
        let hm = x[i] - x[i - 1];
        let hp = x[i + 1] - x[i];
        let hs = hm + hp;

        op.lower[i] = 2.0 * a[i] / (hs * hm) - mu[i] * hp / (hm * hs);
        op.diag[i] = -2.0 * a[i] / (hm * hp) + mu[i] * (hp - hm) / (hm * hp) - r;
        op.upper[i] = 2.0 * a[i] / (hs * hp) + mu[i] * hm / (hp * hs);
    }
    Ok(op)
}
