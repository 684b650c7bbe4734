// Configuration management for the venue simulator

use crate::types::Instrument;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How a run ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TerminationMode {
    /// Stop once every venue with instruments has closed its quota of trades
    Batch { trades_per_venue: usize },
    /// Tick until an external stop signal arrives
    Continuous {
        tick_interval_ms: u64,
        status_every_ticks: u64,
    },
}

impl TerminationMode {
    pub fn name(&self) -> &'static str {
        match self {
            TerminationMode::Batch { .. } => "batch",
            TerminationMode::Continuous { .. } => "continuous",
        }
    }
}

/// Price at which a breached position is closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitFill {
    /// Fill at the stop-loss or take-profit level that was crossed
    #[default]
    Threshold,
    /// Fill at the tick's actual price
    Market,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub termination: TerminationMode,
    #[serde(default)]
    pub max_ticks: Option<u64>,     // Safety bound for either mode
    #[serde(default)]
    pub seed: Option<u64>,          // Drawn from entropy and reported when absent
    #[serde(default)]
    pub exit_fill: ExitFill,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            termination: TerminationMode::Batch { trades_per_venue: 10 },
            max_ticks: Some(100_000),
            seed: None,
            exit_fill: ExitFill::Threshold,
        }
    }
}

/// Entry rule and rolling-window shape of the coherence signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalStrategy {
    #[serde(default = "default_entry_threshold")]
    pub entry_threshold: f64,
    #[serde(default)]
    pub random_injection: bool,
    #[serde(default)]
    pub injection_probability: f64,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    #[serde(default = "default_window")]
    pub window: usize,
    #[serde(default = "default_min_history")]
    pub min_history: usize,
    #[serde(default = "default_trend_lookback")]
    pub trend_lookback: usize,
    #[serde(default = "default_momentum_steepness")]
    pub momentum_steepness: f64,
}

impl SignalStrategy {
    /// Threshold-only entries, as used for fixed-target runs
    pub fn batch() -> Self {
        Self {
            entry_threshold: default_entry_threshold(),
            random_injection: false,
            injection_probability: 0.0,
            history_capacity: default_history_capacity(),
            window: default_window(),
            min_history: default_min_history(),
            trend_lookback: default_trend_lookback(),
            momentum_steepness: default_momentum_steepness(),
        }
    }

    /// Lower threshold plus occasional injected entries, for live demos
    pub fn continuous() -> Self {
        Self {
            entry_threshold: 0.45,
            random_injection: true,
            injection_probability: 0.05,
            ..Self::batch()
        }
    }
}

impl Default for SignalStrategy {
    fn default() -> Self {
        Self::batch()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_true")]
    pub enable_trade_logging: bool,
    #[serde(default)]
    pub enable_signal_logging: bool,
    #[serde(default = "default_true")]
    pub enable_progress_bar: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_trade_logging: true,
            enable_signal_logging: false,
            enable_progress_bar: true,
        }
    }
}

/// One simulated broker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    pub name: String,
    pub starting_balance: f64,
    pub position_size_pct: f64,      // Fraction of balance committed per position
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub max_concurrent_positions: usize,
    #[serde(default = "default_size_boost")]
    pub size_boost: f64,             // Opaque external sizing multiplier
    #[serde(default)]
    pub instruments: Vec<Instrument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub simulation: RunConfig,
    #[serde(default)]
    pub signal: SignalStrategy,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub venues: Vec<VenueConfig>,
}

// Default value functions
fn default_entry_threshold() -> f64 { 0.50 }
fn default_history_capacity() -> usize { 30 }
fn default_window() -> usize { 20 }
fn default_min_history() -> usize { 5 }
fn default_trend_lookback() -> usize { 3 }
fn default_momentum_steepness() -> f64 { 100.0 }
fn default_size_boost() -> f64 { 1.0 }
fn default_true() -> bool { true }

fn instrument(symbol: &str, base_price: f64, volatility: f64) -> Instrument {
    Instrument {
        symbol: symbol.to_string(),
        base_price,
        volatility,
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            simulation: RunConfig::default(),
            signal: SignalStrategy::batch(),
            logging: LoggingConfig::default(),
            venues: vec![
                VenueConfig {
                    name: "atlas".to_string(),
                    starting_balance: 100.0,
                    position_size_pct: 0.05,
                    stop_loss_pct: 0.008,
                    take_profit_pct: 0.018,
                    max_concurrent_positions: 3,
                    size_boost: 1.0,
                    instruments: vec![
                        instrument("BTC/USD", 95_000.0, 0.0025),
                        instrument("ETH/USD", 3_400.0, 0.003),
                        instrument("SOL/USD", 180.0, 0.004),
                        instrument("XRP/USD", 0.60, 0.005),
                    ],
                },
                VenueConfig {
                    name: "meridian".to_string(),
                    starting_balance: 250.0,
                    position_size_pct: 0.04,
                    stop_loss_pct: 0.01,
                    take_profit_pct: 0.02,
                    max_concurrent_positions: 2,
                    size_boost: 1.0,
                    instruments: vec![
                        instrument("BTC/USD", 95_000.0, 0.0025),
                        instrument("ETH/USD", 3_400.0, 0.003),
                        instrument("ADA/USD", 0.45, 0.005),
                    ],
                },
            ],
        }
    }
}

impl SimulationConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(e.to_string()))?;

        let config: SimulationConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        fs::write(path, content)
            .map_err(|e| ConfigError::FileWrite(e.to_string()))?;

        Ok(())
    }

    /// Load configuration from file, or create default if file doesn't exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            let config = Self::default();
            config.to_file(&path)?;
            tracing::info!("📁 Created default config file: {}", path.as_ref().display());
            Ok(config)
        }
    }

    /// Fail on the first critical pre-flight check
    pub fn validate(&self) -> Result<(), ConfigError> {
        let result = crate::validation::PreFlightValidator::new(self).validate_all();
        match result.critical_failures().first() {
            Some(check) => Err(ConfigError::Validation(format!("{}: {}", check.name, check.message))),
            None => Ok(()),
        }
    }

    pub fn venue(&self, name: &str) -> Option<&VenueConfig> {
        self.venues.iter().find(|v| v.name == name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read config file: {0}")]
    FileRead(String),

    #[error("Failed to write config file: {0}")]
    FileWrite(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}
