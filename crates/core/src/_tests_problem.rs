#![cfg(test)]

use super::_tests_support::{
    max_abs_diff, test_image, GaussianKernel, MidpointDiscretizer, TestBackend,
};
use super::error::InverseError;
use super::filter::FilterSpec;
use super::grid::Grid2D;
use super::operator::ForwardOperator;
use super::problem::{Problem, ProblemConfig};
use super::spectral::SpectralDomain;

fn build(config: ProblemConfig, n: usize) -> Result<Problem<TestBackend>, InverseError> {
    Problem::new(
        TestBackend,
        config,
        test_image(Grid2D::new(n, n)),
        &GaussianKernel,
        &MidpointDiscretizer,
    )
}

#[test]
fn separable_scenario_64x64() {
    let problem = build(
        ProblemConfig {
            sig: 2.0,
            err_lvl: 5.0,
            seed: 1,
            ..Default::default()
        },
        64,
    )
    .unwrap();

    assert_eq!(problem.b().grid(), Grid2D::new(64, 64));
    assert!(problem.sigma() > 0.0);
    match problem.operator() {
        ForwardOperator::Separable { svd1, svd2, .. } => {
            assert_eq!(svd1.s.len(), 64);
            assert_eq!(svd2.s.len(), 64);
            assert!(svd1.s.iter().all(|&sv| sv >= 0.0));
            assert!(svd2.s.iter().all(|&sv| sv >= 0.0));
        }
        _ => panic!("expected separable operator"),
    }
    match problem.spectral() {
        SpectralDomain::Separable { s, .. } => {
            assert_eq!(s.grid(), Grid2D::new(64, 64));
            assert!(s.as_slice().iter().all(|&v| v >= 0.0));
        }
        _ => panic!("expected separable spectral domain"),
    }
    // Re-applying the operator through the stored backend reproduces
    // the recorded blurred signal.
    let ax = problem.operator().apply(problem.backend(), problem.x_true());
    assert!(max_abs_diff(&ax, problem.ax()) < 1e-12);
    // Noise was actually injected.
    assert!(problem.b() != problem.ax());
}

#[test]
fn padded_landweber_scenario_32x32() {
    // Quarter-domain crop: restricted window (8, 24) on a 32-grid gives
    // a 16x16 data window padded back up to the 32x32 kernel shape.
    let problem = build(
        ProblemConfig {
            sig: 2.0,
            err_lvl: 1.0,
            per_bc: true,
            per_bc_pad: true,
            per_t: 0.5,
            restrict_dom: Some((8, 24)),
            seed: 4,
            ..Default::default()
        },
        32,
    )
    .unwrap();

    assert_eq!(problem.grid(), Grid2D::new(16, 16));
    let solution = problem
        .filtered_solution(&FilterSpec::landweber(0.1))
        .unwrap();
    assert_eq!(solution.x.grid(), Grid2D::new(16, 16));
    assert_eq!(solution.history.len(), 250);
    for pair in solution.history.windows(2).take(10) {
        assert!(pair[1] <= pair[0] * (1.0 + 1e-12));
    }
}

#[test]
fn restricted_circulant_recomputes_on_crop() {
    let problem = build(
        ProblemConfig {
            sig: 2.0,
            err_lvl: 5.0,
            per_bc: true,
            per_t: 0.5,
            restrict_dom: Some((8, 24)),
            seed: 2,
            ..Default::default()
        },
        32,
    )
    .unwrap();

    assert_eq!(problem.grid(), Grid2D::new(16, 16));
    assert_eq!(problem.x_true().grid(), Grid2D::new(16, 16));
    match problem.operator() {
        ForwardOperator::Circulant { ahat } => {
            // Frequency window [8, 24) of the full kernel.
            assert_eq!(ahat.grid(), Grid2D::new(16, 16));
        }
        _ => panic!("expected circulant operator"),
    }
    // Sigma is calibrated against the cropped signal.
    let expected = 0.05 * problem.ax().norm() / (problem.ax().len() as f64).sqrt();
    assert!((problem.sigma() - expected).abs() < 1e-15);
}

// ============================================================================
// Configuration validation
// ============================================================================

#[test]
fn periodic_reconstruction_rejected() {
    let err = build(
        ProblemConfig {
            per_bc: true,
            per_t: 0.5,
            recon: true,
            ..Default::default()
        },
        16,
    )
    .unwrap_err();
    match err {
        InverseError::Configuration(msg) => {
            assert!(msg.contains("reconstruction not implemented"))
        }
        other => panic!("expected configuration error, got {other}"),
    }
}

#[test]
fn invalid_configs_rejected_before_computation() {
    let cases = [
        ProblemConfig {
            err_lvl: 150.0,
            ..Default::default()
        },
        ProblemConfig {
            per_bc_pad: true,
            ..Default::default()
        },
        ProblemConfig {
            restrict_dom: Some((2, 10)),
            ..Default::default()
        },
        ProblemConfig {
            per_bc: true,
            per_t: 0.0,
            ..Default::default()
        },
        ProblemConfig {
            per_bc: true,
            per_t: 0.5,
            restrict_dom: Some((12, 4)),
            ..Default::default()
        },
        // Pads of 16/4 = 4 per side cannot restore a 10-wide window to 16.
        ProblemConfig {
            per_bc: true,
            per_bc_pad: true,
            per_t: 0.5,
            restrict_dom: Some((2, 12)),
            ..Default::default()
        },
    ];
    for config in cases {
        assert!(
            matches!(build(config.clone(), 16), Err(InverseError::Configuration(_))),
            "config {config:?} should be rejected"
        );
    }
}

#[test]
fn non_square_grid_rejected() {
    let result = Problem::new(
        TestBackend,
        ProblemConfig::default(),
        test_image(Grid2D::new(8, 16)),
        &GaussianKernel,
        &MidpointDiscretizer,
    );
    assert!(matches!(result, Err(InverseError::Configuration(_))));
}

// ============================================================================
// Config serialization
// ============================================================================

#[test]
fn config_round_trips_through_toml() {
    let config = ProblemConfig {
        sig: 2.0,
        err_lvl: 5.0,
        per_bc: true,
        per_bc_pad: true,
        per_t: 0.5,
        restrict_dom: Some((8, 24)),
        seed: 7,
        ..Default::default()
    };
    let text = toml::to_string(&config).unwrap();
    let parsed: ProblemConfig = toml::from_str(&text).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn config_defaults_fill_missing_fields() {
    let parsed: ProblemConfig = toml::from_str("sig = 2.0\nerr_lvl = 5.0\n").unwrap();
    assert_eq!(parsed.sig, 2.0);
    assert_eq!(parsed.err_lvl, 5.0);
    assert!(!parsed.per_bc);
    assert_eq!(parsed.restrict_dom, None);
    assert_eq!(parsed.seed, 0);
}
