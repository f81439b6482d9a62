use matrixcompare::assert_scalar_eq;
use porous_fem::config::{BcStrategy, LameParameters, PoroConfig, YoungPoisson};
use porous_fem::error::AssemblyError;
use porous_fem::field::Dimension;
use porous_fem::space::FunctionSpace;

#[test]
fn default_config_uses_unit_young_modulus() {
    let config = PoroConfig::default();
    // E = 1, nu = 0.15
    assert_scalar_eq!(config.viscosity, 1.0 / 2.3, comp = abs, tol = 1e-14);
    assert_scalar_eq!(config.lambda, 0.15 / (1.15 * 0.7), comp = abs, tol = 1e-14);
    assert_eq!(config.permeability, 0.1);
    assert_eq!(config.dimension, Dimension::Two);
    assert_eq!(config.bc_strategy, BcStrategy::RowElimination);
    assert!(config.stabilization_enabled);
    assert!(!config.analytic_forcing_enabled);
    assert!(!config.pin_pressure);
    assert_eq!(config.spaces.pressure, FunctionSpace::Constant);
    assert!(config.validate().is_ok());
}

#[test]
fn lame_from_young_poisson() {
    let lame: LameParameters = YoungPoisson {
        young: 1e4,
        poisson: 0.25,
    }
    .into();
    assert_scalar_eq!(lame.mu, 4000.0, comp = abs, tol = 1e-9);
    assert_scalar_eq!(lame.lambda, 4000.0, comp = abs, tol = 1e-9);

    let config = PoroConfig::default().with_lame(lame);
    assert_eq!(config.lame(), lame);
}

#[test]
fn validation_rejects_meaningless_coefficients() {
    let invalid = [
        PoroConfig {
            permeability: 0.0,
            ..PoroConfig::default()
        },
        PoroConfig {
            dt: -1.0,
            ..PoroConfig::default()
        },
        PoroConfig {
            viscosity: f64::NAN,
            ..PoroConfig::default()
        },
        PoroConfig {
            quadrature_points_per_dim: 0,
            ..PoroConfig::default()
        },
        PoroConfig {
            penalty: 0.0,
            ..PoroConfig::default().with_bc_strategy(BcStrategy::Penalty)
        },
        PoroConfig {
            nitsche_gamma: -1.0,
            ..PoroConfig::default().with_bc_strategy(BcStrategy::BoundaryIntegral)
        },
    ];
    for config in invalid {
        assert!(
            matches!(config.validate(), Err(AssemblyError::InvalidConfiguration(_))),
            "{config:?} should be rejected"
        );
    }

    let mut config = PoroConfig::default();
    config.spaces.displacement = FunctionSpace::Constant;
    assert!(config.validate().is_err());

    // A zero penalty is only meaningful for the penalty strategy.
    let config = PoroConfig {
        penalty: 0.0,
        ..PoroConfig::default()
    };
    assert!(config.validate().is_ok());
}

#[test]
fn config_deserializes_with_defaults() {
    let json = r#"{
        "dt": 0.5,
        "dimension": "Three",
        "bc_strategy": "Penalty",
        "penalty": 1e6
    }"#;
    let config: PoroConfig = serde_json::from_str(json).unwrap();
    assert_eq!(config.dt, 0.5);
    assert_eq!(config.dimension, Dimension::Three);
    assert_eq!(config.bc_strategy, BcStrategy::Penalty);
    assert_eq!(config.penalty, 1e6);
    assert_eq!(config.permeability, PoroConfig::default().permeability);
    assert_eq!(config.spaces, PoroConfig::default().spaces);

    let serialized = serde_json::to_string(&config).unwrap();
    let deserialized: PoroConfig = serde_json::from_str(&serialized).unwrap();
    assert_eq!(deserialized, config);
}
