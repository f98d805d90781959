//! Config file loading tests.

use std::fs;

use tanksim_core::error::ConfigError;
use tanksim_engine::engine::{Engine, EngineConfig};
use tempfile::TempDir;

/// The shipped reference config must parse and construct.
#[test]
fn shipped_reference_config_constructs() {
    let raw = include_str!("../../tanksim.toml");
    let config: EngineConfig = toml::from_str(raw).unwrap();
    assert_eq!(config.seed, Some(42));
    assert_eq!(config.sim.controllers.len(), 1);
    assert!(Engine::new(config).is_ok());
}

#[test]
fn minimal_config_uses_defaults() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("tanksim.toml");
    fs::write(
        &path,
        r#"
[sim]
initial_state = [2.5]
initial_inputs = [1.0, 0.5]

[sim.tank]
area = 120.0
discharge_coeff = 1.2649
max_height = 5.0
"#,
    )
    .unwrap();

    let raw = fs::read_to_string(&path).unwrap();
    let config: EngineConfig = toml::from_str(&raw).unwrap();
    assert_eq!(config.sim.dt, 1.0);
    assert_eq!(config.historian_capacity, 7200);
    let (_engine, handle) = Engine::new(config).unwrap();
    assert_eq!(handle.descriptor().dt, 1.0);
}

#[test]
fn invalid_dt_is_rejected_at_construction() {
    let config: EngineConfig = toml::from_str(
        r#"
[sim]
dt = 0.0

[sim.tank]
area = 120.0
discharge_coeff = 1.2649
max_height = 5.0
"#,
    )
    .unwrap();
    assert!(matches!(
        Engine::new(config),
        Err(ConfigError::InvalidDt { .. })
    ));
}

#[test]
fn malformed_controller_is_rejected_at_construction() {
    let config: EngineConfig = toml::from_str(
        r#"
[sim]
initial_state = [2.5]
initial_inputs = [1.0, 0.5]

[sim.tank]
area = 120.0
discharge_coeff = 1.2649
max_height = 5.0

[[sim.controllers]]
kc = -1.0
u_min = 1.0
u_max = 0.0
i_max = 10.0
initial_setpoint = 2.5
"#,
    )
    .unwrap();
    assert!(matches!(
        Engine::new(config),
        Err(ConfigError::InvalidOutputLimits { .. })
    ));
}
