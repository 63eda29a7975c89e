use std::sync::Arc;
use std::thread;

use approx::assert_abs_diff_eq;
use quantlib_rnd::prelude::*;

fn calculators() -> Vec<(&'static str, Arc<dyn RiskNeutralDensityCalculator>)> {
    let (spot, r, q, vol) = (100.0, 0.05, 0.02, 0.2);
    let bsm = BsmRndCalculator::new(
        spot,
        Arc::new(FlatForward::new(r)),
        Arc::new(FlatForward::new(q)),
        vol,
    )
    .unwrap();
    let heston = HestonProcess::new(
        spot,
        vol * vol,
        Arc::new(FlatForward::new(r)),
        Arc::new(FlatForward::new(q)),
        1.0,
        vol * vol,
        1e-4,
        0.0,
    )
    .unwrap();
    let gbsm = black_scholes_merton_process(spot, r, q, vol).unwrap();
    vec![
        ("bsm", Arc::new(bsm)),
        (
            "heston",
            Arc::new(HestonRndCalculator::new(Arc::new(heston), HestonRndConfig::default()).unwrap()),
        ),
        (
            "gbsm",
            Arc::new(GbsmRndCalculator::new(Arc::new(gbsm), GbsmRndConfig::default()).unwrap()),
        ),
    ]
}

#[test]
fn lognormal_dynamics_agree_across_threads() {
    let t = 0.75;
    let forward = 100.0 * (0.03_f64 * t).exp();
    let expected_median = forward.ln() - 0.5 * 0.04 * t;

    let handles: Vec<_> = calculators()
        .into_iter()
        .map(|(name, rnd)| thread::spawn(move || (name, rnd.invcdf(0.5, t), rnd.cdf(expected_median, t))))
        .collect();
    for handle in handles {
        let (name, median, cdf) = handle.join().unwrap();
        assert_abs_diff_eq!(median.unwrap(), expected_median, epsilon = 1e-3);
        assert!((cdf.unwrap() - 0.5).abs() < 1e-4, "{name}");
    }
}

#[test]
fn every_calculator_rejects_bad_queries() {
    for (name, rnd) in calculators() {
        assert!(matches!(rnd.pdf(4.6, 0.0), Err(Error::Domain(_))), "{name}");
        assert!(matches!(rnd.cdf(4.6, -1.0), Err(Error::Domain(_))), "{name}");
        assert!(matches!(rnd.invcdf(1.0, 1.0), Err(Error::Domain(_))), "{name}");
    }
}
