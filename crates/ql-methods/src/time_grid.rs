//! `TimeGrid`: an increasing sequence of times starting at zero.
//!
//! The local-volatility density calculator marches its Fokker-Planck
//! equation over a `TimeGrid`; the backward finite-difference engine uses
//! one for its own time stepping. Grids may be uniform, built around
//! mandatory times, or adaptive (dense close to `t = 0` where the density
//! is sharply peaked).

use ql_core::{ensure_config, errors::Result, Real, Time};

/// A grid of time points `0 = t₀ < t₁ < … < t_n`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    times: Vec<Time>,
    dts: Vec<Time>,
}

impl TimeGrid {
    /// Build a grid from explicit time points.
    ///
    /// # Errors
    /// `Error::Configuration` unless there are at least two points, the
    /// first is zero, and the sequence is strictly increasing and finite.
    pub fn new(times: Vec<Time>) -> Result<Self> {
        ensure_config!(times.len() >= 2, "a time grid needs at least 2 points, got {}", times.len());
        ensure_config!(times[0] == 0.0, "a time grid must start at 0, got {}", times[0]);
        ensure_config!(
            times.iter().all(|t| t.is_finite()),
            "time grid contains non-finite times"
        );
        ensure_config!(
            times.windows(2).all(|w| w[1] > w[0]),
            "time grid must be strictly increasing"
        );
        let dts = times.windows(2).map(|w| w[1] - w[0]).collect();
        Ok(Self { times, dts })
    }

    /// Create a uniform time grid from 0 to `end` with `steps` intervals.
    ///
    /// # Errors
    /// Rejects `steps == 0` and a non-positive `end`.
    pub fn uniform(end: Time, steps: usize) -> Result<Self> {
        ensure_config!(steps > 0, "steps must be > 0");
        ensure_config!(end > 0.0, "end time must be positive, got {end}");
        let dt = end / steps as Real;
        let mut times: Vec<Time> = (0..steps).map(|i| i as Real * dt).collect();
        times.push(end);
        Self::new(times)
    }

    /// Create from a set of mandatory time points, adding uniformly spaced
    /// points until the grid has at least `min_steps` intervals.
    ///
    /// # Errors
    /// Rejects negative or non-finite mandatory times, or an empty set.
    pub fn from_times(mandatory: &[Time], min_steps: usize) -> Result<Self> {
        ensure_config!(
            mandatory.iter().all(|&t| t >= 0.0 && t.is_finite()),
            "mandatory times must be non-negative"
        );
        let mut all_times: Vec<Time> = vec![0.0];
        all_times.extend_from_slice(mandatory);
        all_times.sort_by(Real::total_cmp);
        all_times.dedup_by(|a, b| (*a - *b).abs() < 1e-12);
        ensure_config!(all_times.len() >= 2, "need at least one positive mandatory time");

        let end = all_times[all_times.len() - 1];
        if min_steps > all_times.len() - 1 {
            let dt = end / min_steps as Real;
            for i in 1..min_steps {
                let t = i as Real * dt;
                if all_times.iter().all(|&x| (x - t).abs() > 1e-12) {
                    all_times.push(t);
                }
            }
            all_times.sort_by(Real::total_cmp);
        }
        Self::new(all_times)
    }

    /// Adaptive grid with step `Δt(t) = maxΔt·e^{−λt} + minΔt·(1 − e^{−λt})`.
    ///
    /// `maxΔt = 1/max_steps_per_year` is the step size at `t = 0` and
    /// `minΔt = 1/min_steps_per_year` the asymptotic one, approached at the
    /// rate `decay`. The last point is clamped to `end`.
    ///
    /// # Errors
    /// Rejects non-positive step densities or `end`, and a negative decay.
    pub fn adaptive(
        max_steps_per_year: Real,
        min_steps_per_year: Real,
        decay: Real,
        end: Time,
    ) -> Result<Self> {
        ensure_config!(
            max_steps_per_year > 0.0 && min_steps_per_year > 0.0,
            "steps per year must be positive"
        );
        ensure_config!(decay >= 0.0, "decay must be non-negative, got {decay}");
        ensure_config!(end > 0.0 && end.is_finite(), "end time must be positive, got {end}");

        let max_dt = 1.0 / max_steps_per_year;
        let min_dt = 1.0 / min_steps_per_year;
        let mut t = 0.0;
        let mut times = vec![t];
        while t < end {
            let w = (-decay * t).exp();
            t += max_dt * w + min_dt * (1.0 - w);
            times.push(t.min(end));
        }
        Self::new(times)
    }

    /// Number of time points (= steps + 1).
    pub fn size(&self) -> usize {
        self.times.len()
    }

    /// Number of steps (= time points − 1).
    pub fn steps(&self) -> usize {
        self.times.len() - 1
    }

    /// Time at index `i`.
    pub fn time(&self, i: usize) -> Time {
        self.times[i]
    }

    /// Time step between index `i` and `i+1`.
    pub fn dt(&self, i: usize) -> Time {
        self.dts[i]
    }

    /// Final time.
    pub fn end(&self) -> Time {
        self.times[self.times.len() - 1]
    }

    /// All time points.
    pub fn times(&self) -> &[Time] {
        &self.times
    }

    /// Index of the grid point closest to `t`; ties go to the later point.
    pub fn closest_index(&self, t: Time) -> usize {
        let upper = self.times.partition_point(|&x| x < t);
        if upper == 0 {
            0
        } else if upper == self.times.len() {
            upper - 1
        } else if t - self.times[upper - 1] < self.times[upper] - t {
            upper - 1
        } else {
            upper
        }
    }

    /// Time of the grid point closest to `t`.
    pub fn closest_time(&self, t: Time) -> Time {
        self.times[self.closest_index(t)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn uniform_grid() {
        let grid = TimeGrid::uniform(1.0, 4).unwrap();
        assert_eq!(grid.size(), 5);
        assert_eq!(grid.steps(), 4);
        assert_eq!(grid.end(), 1.0);
        assert_abs_diff_eq!(grid.dt(2), 0.25, epsilon = 1e-15);
    }

    #[test]
    fn mandatory_times_are_kept() {
        let grid = TimeGrid::from_times(&[0.3, 1.0], 10).unwrap();
        assert!(grid.times().contains(&0.3));
        assert_eq!(grid.end(), 1.0);
        assert!(grid.steps() >= 10);
    }

    #[test]
    fn invalid_grids_are_configuration_errors() {
        use ql_core::Error;
        assert!(matches!(TimeGrid::new(vec![0.0]), Err(Error::Configuration(_))));
        assert!(matches!(TimeGrid::new(vec![0.1, 0.2]), Err(Error::Configuration(_))));
        assert!(matches!(TimeGrid::new(vec![0.0, 0.2, 0.2]), Err(Error::Configuration(_))));
        assert!(TimeGrid::uniform(1.0, 0).is_err());
    }

    #[test]
    fn adaptive_grid_is_dense_near_zero() {
        let grid = TimeGrid::adaptive(400.0, 50.0, 5.0, 3.0).unwrap();
        assert_eq!(grid.time(0), 0.0);
        assert_eq!(grid.end(), 3.0);
        assert_abs_diff_eq!(grid.dt(0), 1.0 / 400.0, epsilon = 1e-15);
        let last_full = grid.dt(grid.steps() - 2);
        assert_abs_diff_eq!(last_full, 1.0 / 50.0, epsilon = 1e-6);
    }

    #[test]
    fn closest_index_picks_nearest() {
        let grid = TimeGrid::new(vec![0.0, 1.0, 2.0, 4.0]).unwrap();
        assert_eq!(grid.closest_index(-1.0), 0);
        assert_eq!(grid.closest_index(0.4), 0);
        assert_eq!(grid.closest_index(0.5), 1);
        assert_eq!(grid.closest_index(2.9), 2);
        assert_eq!(grid.closest_index(3.1), 3);
        assert_eq!(grid.closest_index(10.0), 3);
        assert_eq!(grid.closest_time(1.2), 1.0);
    }

    proptest! {
        #[test]
        fn adaptive_grid_is_strictly_increasing(
            max_spy in 10.0f64..500.0,
            min_spy in 5.0f64..100.0,
            decay in 0.0f64..10.0,
            end in 0.05f64..3.0,
        ) {
            let grid = TimeGrid::adaptive(max_spy, min_spy, decay, end).unwrap();
            prop_assert!(grid.times().windows(2).all(|w| w[1] > w[0]));
            prop_assert_eq!(grid.end(), end);
        }
    }
}
