// Integration tests for configuration loading and validation

mod common;

use common::{create_continuous_config, create_test_config};
use std::fs;
use tempfile::TempDir;
use venue_sim::{ConfigError, PreFlightValidator, SimulationConfig, TerminationMode, TradingError};

#[test]
fn test_config_file_round_trip() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("sim.toml");

    let config = create_test_config(7, 99);
    config.to_file(&config_path).expect("Failed to write config");

    let loaded = SimulationConfig::from_file(&config_path).expect("Failed to load config");
    assert_eq!(loaded.simulation.termination, TerminationMode::Batch { trades_per_venue: 7 });
    assert_eq!(loaded.simulation.seed, Some(99));
    assert_eq!(loaded.venues.len(), 2);
    assert_eq!(loaded.venues[0].instruments, config.venues[0].instruments);
    assert_eq!(loaded.signal, config.signal);
}

#[test]
fn test_continuous_config_round_trip() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("live.toml");

    create_continuous_config(1, 25).to_file(&config_path).expect("Failed to write config");
    let loaded = SimulationConfig::from_file(&config_path).expect("Failed to load config");

    assert_eq!(
        loaded.simulation.termination,
        TerminationMode::Continuous { tick_interval_ms: 1, status_every_ticks: 25 }
    );
    assert!(loaded.signal.random_injection);
}

#[test]
fn test_missing_file_is_reported() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let result = SimulationConfig::from_file(temp_dir.path().join("nope.toml"));
    assert!(matches!(result, Err(ConfigError::FileNotFound(_))));

    let err: TradingError = result.unwrap_err().into();
    assert!(err.user_message().contains("venue-sim init"));
}

#[test]
fn test_load_or_create_writes_default() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("fresh.toml");

    let created = SimulationConfig::load_or_create(&config_path).expect("Failed to create config");
    assert!(config_path.exists());

    let reloaded = SimulationConfig::load_or_create(&config_path).expect("Failed to reload config");
    assert_eq!(reloaded.venues.len(), created.venues.len());
}

#[test]
fn test_minimal_toml_uses_defaults() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("minimal.toml");

    fs::write(
        &config_path,
        r#"
[simulation.termination]
mode = "batch"
trades_per_venue = 3

[[venues]]
name = "solo"
starting_balance = 50.0
position_size_pct = 0.1
stop_loss_pct = 0.01
take_profit_pct = 0.02
max_concurrent_positions = 1

[[venues.instruments]]
symbol = "BTC/USD"
base_price = 95000.0
volatility = 0.0025
"#,
    )
    .expect("Failed to write config file");

    let config = SimulationConfig::from_file(&config_path).expect("Failed to load config");
    assert_eq!(config.signal.entry_threshold, 0.50);
    assert!(!config.signal.random_injection);
    assert_eq!(config.venues[0].size_boost, 1.0);
    assert!(config.logging.enable_trade_logging);
}

#[test]
fn test_invalid_file_fails_validation() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("bad.toml");

    let mut config = create_test_config(5, 1);
    config.venues[1].take_profit_pct = 0.0;
    config.to_file(&config_path).expect("Failed to write config");

    let result = SimulationConfig::from_file(&config_path);
    assert!(matches!(result, Err(ConfigError::Validation(_))));
}

#[test]
fn test_validator_collects_every_finding() {
    let mut config = create_test_config(5, 1);
    config.venues[0].starting_balance = -1.0;
    config.venues[1].max_concurrent_positions = 0;
    config.signal.window = 1;

    let result = PreFlightValidator::new(&config).validate_all();
    assert!(!result.passed);
    assert!(result.critical_failures().len() >= 3);
}
