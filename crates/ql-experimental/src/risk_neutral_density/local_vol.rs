//! Local-volatility density from the forward Fokker-Planck equation.
//!
//! The density `p(x, t)` of `x = ln S_t` solves
//!
//! ```text
//! ∂p/∂t = ∂ₓₓ(½σ² p) − ∂ₓ((r − q − ½σ²) p)
//! ```
//!
//! with `σ = σ_loc(t, eˣ)`. The whole march runs at construction; one
//! [`DensitySlice`] per grid time is kept and queries interpolate between
//! them.
//!
//! * The first step is started from the Gaussian the density would have
//!   under the local volatility frozen at `(t₁/2, F(t₁/2))`.
//! * Slice `i` lives on a sinh mesh spanning `N⁻¹(1 − ε)` accumulated
//!   standard deviations either side of the mean. Each side accumulates the
//!   larger of the ATM local variance and the local variance at its own
//!   edge, so a skewed surface widens the heavy tail. Meshes only grow; the
//!   density is carried from one mesh to the next by cubic spline.
//! * Steps are Crank-Nicolson (optionally preceded by fully implicit ones)
//!   with the local volatility sampled at the step midpoint and zero
//!   density imposed on both edges. A step is split into sub-steps no
//!   longer than `max_relative_step` times the elapsed time, which resolves
//!   the fast start from the narrow initial Gaussian.
//!
//! Outside the mesh of the slice closest to the query time the density is
//! exactly zero. Between grid times values are interpolated by cubic
//! Lagrange polynomials in time; a density the cubic would send to zero
//! inside the mesh falls back to linear interpolation between the two
//! neighbouring slices.

use std::sync::Arc;

use super::{check_probability, check_time, RiskNeutralDensityCalculator};
use ql_core::{ensure_config, errors::Result, Probability, Real, Time, Volatility};
use ql_math::{
    close_enough, invert_cdf, normal_cdf, normal_cdf_inverse, normal_pdf, CubicNaturalSpline,
    Interpolation1D, LinearInterpolation, QuantileSearch,
};
use ql_methods::{
    fokker_planck_operator, theta_step, Concentrating1dMesher, Dirichlet, FdmScheme, TimeGrid,
};
use ql_termstructures::{LocalVolTermStructure, YieldTermStructure};
use tracing::{debug, trace};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Mesh and solver settings of [`LocalVolRndCalculator`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LocalVolRndConfig {
    /// Mesh nodes per slice.
    pub x_grid: usize,
    /// Sinh concentration density around the slice mean; uniform if `None`.
    pub x0_density: Option<Real>,
    /// Probability mass cut from each tail when sizing a mesh.
    pub local_vol_prob_eps: Real,
    /// Number of leading fully implicit steps.
    pub implicit_steps: usize,
    /// Largest sub-step as a fraction of the time elapsed at its start.
    pub max_relative_step: Real,
    /// Absolute accuracy of quantiles.
    pub quantile_accuracy: Real,
}

impl Default for LocalVolRndConfig {
    fn default() -> Self {
        Self {
            x_grid: 101,
            x0_density: Some(0.1),
            local_vol_prob_eps: 1.0e-6,
            implicit_steps: 0,
            max_relative_step: 0.1,
            quantile_accuracy: 1.0e-10,
        }
    }
}

impl LocalVolRndConfig {
    /// Set the number of mesh nodes.
    pub fn with_x_grid(mut self, x_grid: usize) -> Self {
        self.x_grid = x_grid;
        self
    }

    /// Set (or clear) the concentration density.
    pub fn with_x0_density(mut self, density: Option<Real>) -> Self {
        self.x0_density = density;
        self
    }

    /// Set the tail mass cut off by the meshes.
    pub fn with_local_vol_prob_eps(mut self, eps: Real) -> Self {
        self.local_vol_prob_eps = eps;
        self
    }

    /// Set the number of leading implicit steps.
    pub fn with_implicit_steps(mut self, steps: usize) -> Self {
        self.implicit_steps = steps;
        self
    }

    /// Set the largest sub-step relative to the elapsed time.
    pub fn with_max_relative_step(mut self, ratio: Real) -> Self {
        self.max_relative_step = ratio;
        self
    }

    /// Set the quantile accuracy.
    pub fn with_quantile_accuracy(mut self, accuracy: Real) -> Self {
        self.quantile_accuracy = accuracy;
        self
    }

    fn validate(&self) -> Result<()> {
        ensure_config!(self.x_grid >= 5, "mesh needs at least 5 nodes, got {}", self.x_grid);
        ensure_config!(
            self.local_vol_prob_eps > 0.0 && self.local_vol_prob_eps < 0.5,
            "tail probability must be in (0, 0.5), got {}",
            self.local_vol_prob_eps
        );
        if let Some(density) = self.x0_density {
            ensure_config!(density > 0.0, "mesh density must be positive, got {density}");
        }
        ensure_config!(
            self.max_relative_step > 0.0 && self.max_relative_step.is_finite(),
            "relative step must be positive, got {}",
            self.max_relative_step
        );
        ensure_config!(
            self.quantile_accuracy > 0.0,
            "quantile accuracy must be positive, got {}",
            self.quantile_accuracy
        );
        Ok(())
    }
}

/// The solved density at one grid time.
#[derive(Debug, Clone)]
pub struct DensitySlice {
    time: Time,
    spline: CubicNaturalSpline,
}

impl DensitySlice {
    fn new(time: Time, locations: &[Real], density: &[Real]) -> Result<Self> {
        Ok(Self {
            time,
            spline: CubicNaturalSpline::new(locations, density)?,
        })
    }

    /// Grid time of the slice.
    pub fn time(&self) -> Time {
        self.time
    }

    /// Mesh nodes in log-price.
    pub fn locations(&self) -> &[Real] {
        self.spline.xs()
    }

    /// Density at the mesh nodes.
    pub fn density(&self) -> &[Real] {
        self.spline.ys()
    }

    /// Probability mass carried by the mesh.
    pub fn mass(&self) -> Real {
        self.spline.total_integral()
    }

    fn contains(&self, x: Real) -> bool {
        self.spline.is_in_range(x)
    }

    fn pdf(&self, x: Real) -> Real {
        if self.contains(x) {
            self.spline.value(x)
        } else {
            0.0
        }
    }

    fn cdf(&self, x: Real) -> Real {
        if x < self.spline.x_min() {
            0.0
        } else if x > self.spline.x_max() {
            self.mass()
        } else {
            self.spline.primitive(x)
        }
    }
}

/// Density of `ln S_t` under a local-volatility model, by forward PDE.
#[derive(Debug, Clone)]
pub struct LocalVolRndCalculator {
    spot: Real,
    risk_free_rate: Arc<dyn YieldTermStructure>,
    dividend_yield: Arc<dyn YieldTermStructure>,
    time_grid: TimeGrid,
    config: LocalVolRndConfig,
    /// Volatility of the analytic first step.
    initial_vol: Volatility,
    /// One slice per grid time after `t = 0`.
    slices: Vec<DensitySlice>,
}

impl LocalVolRndCalculator {
    /// Solve the forward equation on `time_grid`.
    ///
    /// # Errors
    /// `Error::Configuration` for a non-positive spot, an invalid `config`
    /// or a non-positive local volatility at the start; local-volatility
    /// and solver failures during the march are propagated.
    pub fn new(
        spot: Real,
        risk_free_rate: Arc<dyn YieldTermStructure>,
        dividend_yield: Arc<dyn YieldTermStructure>,
        local_vol: Arc<dyn LocalVolTermStructure>,
        time_grid: TimeGrid,
        config: LocalVolRndConfig,
    ) -> Result<Self> {
        ensure_config!(spot > 0.0 && spot.is_finite(), "spot must be positive, got {spot}");
        config.validate()?;

        let mut calculator = Self {
            spot,
            risk_free_rate,
            dividend_yield,
            time_grid,
            config,
            initial_vol: 0.0,
            slices: Vec::new(),
        };
        calculator.solve(local_vol.as_ref())?;
        Ok(calculator)
    }

    /// The time grid of the march.
    pub fn time_grid(&self) -> &TimeGrid {
        &self.time_grid
    }

    /// The solved slices, one per grid time after `t = 0`.
    pub fn slices(&self) -> &[DensitySlice] {
        &self.slices
    }

    /// Mesh nodes of the slice closest to `t`.
    pub fn mesher(&self, t: Time) -> &[Real] {
        self.closest_slice(t).locations()
    }

    /// The settings used.
    pub fn config(&self) -> &LocalVolRndConfig {
        &self.config
    }

    fn forward(&self, t: Time) -> Real {
        self.spot * self.dividend_yield.discount(t) / self.risk_free_rate.discount(t)
    }

    /// Mean and standard deviation of the analytic first step at `t`.
    fn initial_params(&self, t: Time) -> (Real, Real) {
        let variance = self.initial_vol * self.initial_vol * t;
        (self.forward(t).ln() - 0.5 * variance, variance.sqrt())
    }

    fn solve(&mut self, local_vol: &dyn LocalVolTermStructure) -> Result<()> {
        let t1 = self.time_grid.time(1);
        let half = 0.5 * t1;
        let initial_vol = local_vol.local_vol(half, self.forward(half))?;
        ensure_config!(
            initial_vol > 0.0 && initial_vol.is_finite(),
            "local volatility must be positive at the start, got {initial_vol}"
        );
        self.initial_vol = initial_vol;

        let quantile = normal_cdf_inverse(1.0 - self.config.local_vol_prob_eps)?;
        let mut variance = initial_vol * initial_vol * t1;
        // (lower, upper) tail variances
        let mut tails = (variance, variance);
        let (mut lower, mut upper) = (Real::INFINITY, Real::NEG_INFINITY);

        // slice mesh: centred with the ATM variance, sized by the tail
        // variances, never shrinks
        let mut mesh_for = |t: Time, variance: Real, tails: (Real, Real)| -> Result<Vec<Real>> {
            let center = self.forward(t).ln() - 0.5 * variance;
            lower = lower.min(center - quantile * tails.0.sqrt());
            upper = upper.max(center + quantile * tails.1.sqrt());
            let concentration = self.config.x0_density.map(|d| (center, d));
            Ok(Concentrating1dMesher::new(lower, upper, self.config.x_grid, concentration)?
                .into_locations())
        };

        let mut x = mesh_for(t1, variance, tails)?;
        let (mean, sd) = self.initial_params(t1);
        let mut p: Vec<Real> = x.iter().map(|&xi| normal_pdf((xi - mean) / sd) / sd).collect();
        let mut slices = Vec::with_capacity(self.time_grid.steps());
        slices.push(DensitySlice::new(t1, &x, &p)?);

        let n = self.config.x_grid;
        let mut a = vec![0.0; n];
        let mut mu = vec![0.0; n];

        for i in 1..self.time_grid.steps() {
            let (t_from, t_to) = (self.time_grid.time(i), self.time_grid.time(i + 1));
            let dt = t_to - t_from;
            let t_mid = 0.5 * (t_from + t_to);

            let atm_vol = local_vol.local_vol(t_mid, self.forward(t_mid))?;
            variance += atm_vol * atm_vol * dt;
            let edge_vol = |xe: Real| -> Result<Volatility> {
                Ok(local_vol.local_vol(t_mid, xe.exp())?.max(atm_vol))
            };
            let (lower_vol, upper_vol) = (edge_vol(x[0])?, edge_vol(x[n - 1])?);
            tails.0 += lower_vol * lower_vol * dt;
            tails.1 += upper_vol * upper_vol * dt;

            let next = mesh_for(t_to, variance, tails)?;
            let previous = &slices[slices.len() - 1];
            p = next.iter().map(|&xi| previous.pdf(xi).max(0.0)).collect();
            x = next;

            let r = self.risk_free_rate.forward_rate(t_from, t_to);
            let q = self.dividend_yield.forward_rate(t_from, t_to);
            for (j, &xj) in x.iter().enumerate() {
                let vol = local_vol.local_vol(t_mid, xj.exp())?;
                a[j] = 0.5 * vol * vol;
                mu[j] = r - q - a[j];
            }
            let op = fokker_planck_operator(&x, &a, &mu)?;
            let scheme = if i <= self.config.implicit_steps {
                FdmScheme::Implicit
            } else {
                FdmScheme::CrankNicolson
            };
            let substeps = (dt / (self.config.max_relative_step * t_from)).ceil().max(1.0) as usize;
            let h = dt / substeps as Real;
            for _ in 0..substeps {
                p = theta_step(&op, &p, h, scheme, Dirichlet::ZERO)?;
            }

            let slice = DensitySlice::new(t_to, &x, &p)?;
            trace!(
                step = i,
                substeps,
                t = t_to,
                mass = slice.mass(),
                x_min = x[0],
                x_max = x[n - 1],
                "density slice"
            );
            slices.push(slice);
        }

        if let Some(last) = slices.last() {
            debug!(
                slices = slices.len(),
                nodes = n,
                t_end = last.time(),
                mass = last.mass(),
                x_min = last.locations()[0],
                x_max = last.locations()[n - 1],
                "local volatility density solved"
            );
        }
        self.slices = slices;
        Ok(())
    }

    fn closest_slice(&self, t: Time) -> &DensitySlice {
        let index = self.time_grid.closest_index(t).max(1) - 1;
        &self.slices[index.min(self.slices.len() - 1)]
    }

    /// Lagrange interpolation in time of `value` over up to four slices
    /// around `t`.
    fn interpolate_in_time<F>(&self, t: Time, value: F) -> Real
    where
        F: Fn(&DensitySlice) -> Real,
    {
        let upper = self.slices.partition_point(|s| s.time < t);
        if upper > 0 && close_enough(self.slices[upper - 1].time, t, 42) {
            return value(&self.slices[upper - 1]);
        }
        if upper == self.slices.len() {
            return value(&self.slices[upper - 1]);
        }
        if close_enough(self.slices[upper].time, t, 42) {
            return value(&self.slices[upper]);
        }
        let window = &self.slices[upper.saturating_sub(2)..(upper + 2).min(self.slices.len())];
        window
            .iter()
            .enumerate()
            .map(|(k, slice)| {
                let weight: Real = window
                    .iter()
                    .enumerate()
                    .filter(|&(m, _)| m != k)
                    .map(|(_, other)| (t - other.time) / (slice.time - other.time))
                    .product();
                weight * value(slice)
            })
            .sum()
    }

    /// Linear interpolation in time between the two slices around `t`.
    fn interpolate_linearly<F>(&self, t: Time, value: F) -> Real
    where
        F: Fn(&DensitySlice) -> Real,
    {
        let upper = self.slices.partition_point(|s| s.time < t);
        if upper == 0 || upper == self.slices.len() {
            return value(&self.slices[upper.min(self.slices.len() - 1)]);
        }
        let (a, b) = (&self.slices[upper - 1], &self.slices[upper]);
        let w = (t - a.time) / (b.time - a.time);
        (1.0 - w) * value(a) + w * value(b)
    }
}

impl RiskNeutralDensityCalculator for LocalVolRndCalculator {
    fn pdf(&self, x: Real, t: Time) -> Result<Real> {
        check_time(t)?;
        if t < self.slices[0].time {
            let (mean, sd) = self.initial_params(t);
            return Ok(normal_pdf((x - mean) / sd) / sd);
        }
        if !self.closest_slice(t).contains(x) {
            return Ok(0.0);
        }
        let cubic = self.interpolate_in_time(t, |slice| slice.pdf(x));
        if cubic > 0.0 {
            return Ok(cubic);
        }
        // near an edge that only the later slices reach the cubic weights
        // can cancel the small positive values
        Ok(self.interpolate_linearly(t, |slice| slice.pdf(x)).max(0.0))
    }

    fn cdf(&self, x: Real, t: Time) -> Result<Probability> {
        check_time(t)?;
        if t < self.slices[0].time {
            let (mean, sd) = self.initial_params(t);
            return Ok(normal_cdf((x - mean) / sd));
        }
        if x < self.closest_slice(t).locations()[0] {
            return Ok(0.0);
        }
        Ok(self.interpolate_in_time(t, |slice| slice.cdf(x)).clamp(0.0, 1.0))
    }

    fn invcdf(&self, p: Probability, t: Time) -> Result<Real> {
        check_time(t)?;
        check_probability(p)?;
        if t < self.slices[0].time {
            let (mean, sd) = self.initial_params(t);
            return Ok(mean + sd * normal_cdf_inverse(p)?);
        }

        let nodes = self.closest_slice(t).locations();
        let mut table = Vec::with_capacity(nodes.len());
        let mut running = 0.0;
        for &x in nodes {
            running = Real::max(running, self.cdf(x, t)?);
            table.push(running);
        }

        let last = nodes.len() - 1;
        if p <= table[0] {
            return Ok(nodes[0]);
        }
        if p >= table[last] {
            return Ok(nodes[last]);
        }
        let upper = table.partition_point(|&c| c < p);
        let (lo, hi) = (nodes[upper - 1], nodes[upper]);

        let guess = LinearInterpolation::new(&table, nodes)?.operator(p);
        let search = QuantileSearch::new(guess.clamp(lo, hi), hi - lo)
            .with_lower_bound(lo)
            .with_upper_bound(hi)
            .with_accuracy(self.config.quantile_accuracy);
        invert_cdf(|x| self.cdf(x, t), |x| self.pdf(x, t), p, &search)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ql_core::Error;
    use ql_termstructures::{FlatForward, LocalConstantVol};
    use tracing_test::traced_test;

    fn constant_vol(steps: usize, config: LocalVolRndConfig) -> LocalVolRndCalculator {
        LocalVolRndCalculator::new(
            100.0,
            Arc::new(FlatForward::new(0.015)),
            Arc::new(FlatForward::new(0.025)),
            Arc::new(LocalConstantVol::new(0.25).unwrap()),
            TimeGrid::uniform(1.0, steps).unwrap(),
            config,
        )
        .unwrap()
    }

    #[test]
    fn mass_is_conserved_up_to_the_tails() {
        let rnd = constant_vol(50, LocalVolRndConfig::default());
        for slice in rnd.slices() {
            assert_abs_diff_eq!(slice.mass(), 1.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn meshes_never_shrink() {
        let rnd = constant_vol(50, LocalVolRndConfig::default().with_x0_density(None));
        for pair in rnd.slices().windows(2) {
            let (a, b) = (pair[0].locations(), pair[1].locations());
            assert!(b[0] <= a[0] && b[b.len() - 1] >= a[a.len() - 1]);
        }
    }

    #[test]
    fn time_interpolation_is_smooth() {
        let rnd = constant_vol(20, LocalVolRndConfig::default().with_x_grid(201));
        let grid = rnd.time_grid().clone();
        let (t0, t1) = (grid.time(10), grid.time(11));
        let x = 100.0_f64.ln();
        let mid = rnd.pdf(x, 0.5 * (t0 + t1)).unwrap();
        let (a, b) = (rnd.pdf(x, t0).unwrap(), rnd.pdf(x, t1).unwrap());
        assert!(mid >= a.min(b) - 1e-3 && mid <= a.max(b) + 1e-3, "{a} {mid} {b}");
    }

    #[test]
    fn sub_steps_resolve_the_narrow_start() {
        let worst_error = |config: LocalVolRndConfig| {
            let rnd = constant_vol(101, config.with_x_grid(201));
            let t = rnd.time_grid().time(5);
            let sd = 0.25 * t.sqrt();
            let xm = (100.0 * (-0.01 * t).exp()).ln() - 0.5 * sd * sd;
            (-30_i32..=30)
                .map(|k| {
                    let x = xm + Real::from(k) * 0.1 * sd;
                    (normal_pdf((x - xm) / sd) / sd - rnd.pdf(x, t).unwrap()).abs()
                })
                .fold(0.0, Real::max)
        };
        assert!(worst_error(LocalVolRndConfig::default()) < 3e-3);
        // one Crank-Nicolson step per grid interval rings on the start-up Gaussian
        assert!(worst_error(LocalVolRndConfig::default().with_max_relative_step(1.0)) > 1e-2);
    }

    #[test]
    fn density_is_positive_just_inside_the_mesh_between_grid_times() {
        let rnd = constant_vol(101, LocalVolRndConfig::default().with_x_grid(201));
        let grid = rnd.time_grid().clone();
        let t = 0.5 * (grid.time(50) + grid.time(51));
        let lower = rnd.mesher(t)[0];
        assert!(rnd.pdf(lower + 1e-4, t).unwrap() > 0.0);
        assert_eq!(rnd.pdf(lower - 1e-4, t).unwrap(), 0.0);
    }

    #[test]
    fn before_the_first_slice_the_density_is_gaussian() {
        let rnd = constant_vol(10, LocalVolRndConfig::default());
        let t = 0.5 * rnd.time_grid().time(1);
        let fwd = 100.0 * (-0.01 * t).exp();
        let mean = fwd.ln() - 0.5 * 0.0625 * t;
        assert_abs_diff_eq!(rnd.cdf(mean, t).unwrap(), 0.5, epsilon = 1e-12);
        let x = rnd.invcdf(0.8, t).unwrap();
        assert_abs_diff_eq!(rnd.cdf(x, t).unwrap(), 0.8, epsilon = 1e-12);
    }

    #[test]
    fn quantiles_beyond_the_truncated_mass_hit_the_edges() {
        let rnd = constant_vol(20, LocalVolRndConfig::default().with_local_vol_prob_eps(1e-3));
        let nodes = rnd.mesher(1.0).to_vec();
        assert_eq!(rnd.invcdf(1.0 - 1e-9, 1.0).unwrap(), nodes[nodes.len() - 1]);
        let x = rnd.invcdf(1e-9, 1.0).unwrap();
        assert!(x >= nodes[0] && x < nodes[nodes.len() / 2]);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let build = |config: LocalVolRndConfig, vol: Real| {
            LocalVolRndCalculator::new(
                100.0,
                Arc::new(FlatForward::new(0.0)),
                Arc::new(FlatForward::new(0.0)),
                Arc::new(LocalConstantVol::new(vol).unwrap()),
                TimeGrid::uniform(1.0, 10).unwrap(),
                config,
            )
        };
        let base = LocalVolRndConfig::default();
        assert!(matches!(build(base.with_x_grid(4), 0.2), Err(Error::Configuration(_))));
        assert!(matches!(
            build(base.with_local_vol_prob_eps(0.5), 0.2),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            build(base.with_max_relative_step(0.0), 0.2),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(build(base, 0.0), Err(Error::Configuration(_))));
    }

    #[traced_test]
    #[test]
    fn logs_the_final_mass() {
        constant_vol(10, LocalVolRndConfig::default());
        assert!(logs_contain("local volatility density solved"));
    }
}
