//! Pre-flight validation module for the venue simulator
//!
//! Checks a `SimulationConfig` once, before any venue is built, so a run
//! either starts from a sane configuration or never starts at all.

use crate::config::{SignalStrategy, SimulationConfig, TerminationMode, VenueConfig};
use std::collections::HashSet;
use tracing::{error, info, warn};

/// Validation result with detailed findings
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub passed: bool,
    pub checks: Vec<ValidationCheck>,
}

#[derive(Debug, Clone)]
pub struct ValidationCheck {
    pub name: String,
    pub passed: bool,
    pub message: String,
    pub level: ValidationLevel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationLevel {
    Critical,  // Must pass for the run to start
    Warning,   // Should pass, but the run can continue
    Info,      // Informational only
}

impl ValidationCheck {
    fn ok(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            message: message.into(),
            level: ValidationLevel::Info,
        }
    }

    fn critical(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            message: message.into(),
            level: ValidationLevel::Critical,
        }
    }

    fn warning(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            message: message.into(),
            level: ValidationLevel::Warning,
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationResult {
    pub fn new() -> Self {
        ValidationResult {
            passed: true,
            checks: Vec::new(),
        }
    }

    pub fn add_check(&mut self, check: ValidationCheck) {
        if !check.passed && check.level == ValidationLevel::Critical {
            self.passed = false;
        }
        self.checks.push(check);
    }

    pub fn critical_failures(&self) -> Vec<&ValidationCheck> {
        self.checks
            .iter()
            .filter(|c| !c.passed && c.level == ValidationLevel::Critical)
            .collect()
    }

    pub fn warnings(&self) -> Vec<&ValidationCheck> {
        self.checks
            .iter()
            .filter(|c| !c.passed && c.level == ValidationLevel::Warning)
            .collect()
    }

    pub fn display(&self) {
        info!("🔍 Pre-flight Validation");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        for check in &self.checks {
            let icon = if check.passed {
                "✅"
            } else {
                match check.level {
                    ValidationLevel::Critical => "❌",
                    ValidationLevel::Warning => "⚠️",
                    ValidationLevel::Info => "ℹ️",
                }
            };

            info!("{} {} - {}", icon, check.name, check.message);
        }

        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        if !self.passed {
            let failures = self.critical_failures();
            error!("❌ Validation failed: {} critical issue(s)", failures.len());
            for failure in failures {
                error!("   • {}: {}", failure.name, failure.message);
            }
        } else {
            let warnings = self.warnings();
            if !warnings.is_empty() {
                warn!("⚠️  {} warning(s) detected", warnings.len());
                for warning in warnings {
                    warn!("   • {}: {}", warning.name, warning.message);
                }
            }
            info!("✅ All critical checks passed");
        }
    }
}

/// Pre-flight validator for simulation runs
pub struct PreFlightValidator<'a> {
    config: &'a SimulationConfig,
}

impl<'a> PreFlightValidator<'a> {
    pub fn new(config: &'a SimulationConfig) -> Self {
        PreFlightValidator { config }
    }

    /// Run full validation suite
    pub fn validate_all(&self) -> ValidationResult {
        let mut result = ValidationResult::new();

        for check in self.check_run() {
            result.add_check(check);
        }
        for check in self.check_signal(&self.config.signal) {
            result.add_check(check);
        }

        if self.config.venues.is_empty() {
            result.add_check(ValidationCheck::warning("Venues", "No venues configured, the run will report zero trades"));
        }

        let mut names = HashSet::new();
        for venue in &self.config.venues {
            if !names.insert(venue.name.as_str()) {
                result.add_check(ValidationCheck::critical(
                    format!("Venue {}", venue.name),
                    "Duplicate venue name",
                ));
            }
            for check in self.check_venue(venue) {
                result.add_check(check);
            }
        }

        result
    }

    // Individual check groups

    fn check_run(&self) -> Vec<ValidationCheck> {
        let mut checks = Vec::new();
        let run = &self.config.simulation;

        match &run.termination {
            TerminationMode::Batch { trades_per_venue } => {
                if *trades_per_venue == 0 {
                    checks.push(ValidationCheck::critical("Termination", "trades_per_venue must be at least 1"));
                } else {
                    checks.push(ValidationCheck::ok("Termination", format!("batch, {} trades per venue", trades_per_venue)));
                }
            }
            TerminationMode::Continuous { tick_interval_ms, status_every_ticks } => {
                if *tick_interval_ms == 0 {
                    checks.push(ValidationCheck::critical("Termination", "tick_interval_ms must be positive"));
                } else if *status_every_ticks == 0 {
                    checks.push(ValidationCheck::critical("Termination", "status_every_ticks must be at least 1"));
                } else {
                    checks.push(ValidationCheck::ok(
                        "Termination",
                        format!("continuous, {}ms ticks, status every {} ticks", tick_interval_ms, status_every_ticks),
                    ));
                }
            }
        }

        match run.max_ticks {
            Some(0) => checks.push(ValidationCheck::critical("Max Ticks", "max_ticks must be positive when set")),
            Some(n) => checks.push(ValidationCheck::ok("Max Ticks", format!("{}", n))),
            None if matches!(run.termination, TerminationMode::Batch { .. }) => {
                checks.push(ValidationCheck::warning("Max Ticks", "Unbounded batch run, it ends only at the trade target"))
            }
            None => {}
        }

        checks
    }

    fn check_signal(&self, signal: &SignalStrategy) -> Vec<ValidationCheck> {
        let mut checks = Vec::new();

        if !(0.0..=1.0).contains(&signal.entry_threshold) {
            checks.push(ValidationCheck::critical(
                "Entry Threshold",
                format!("{} must be between 0 and 1", signal.entry_threshold),
            ));
        }

        if !(0.0..=1.0).contains(&signal.injection_probability) {
            checks.push(ValidationCheck::critical(
                "Signal Injection",
                format!("probability {} must be between 0 and 1", signal.injection_probability),
            ));
        } else if signal.random_injection && signal.injection_probability == 0.0 {
            checks.push(ValidationCheck::warning("Signal Injection", "Enabled with zero probability"));
        } else if signal.random_injection {
            checks.push(ValidationCheck::warning(
                "Signal Injection",
                format!("{:.1}% of entries may be injected at random", signal.injection_probability * 100.0),
            ));
        }

        if signal.window < 2 {
            checks.push(ValidationCheck::critical("Signal Window", "window must hold at least 2 prices"));
        }
        if signal.history_capacity < signal.window {
            checks.push(ValidationCheck::critical(
                "History Capacity",
                format!("capacity {} is smaller than window {}", signal.history_capacity, signal.window),
            ));
        }
        if signal.trend_lookback == 0 {
            checks.push(ValidationCheck::critical("Trend Lookback", "trend_lookback must be at least 1"));
        }
        if signal.min_history <= signal.trend_lookback || signal.min_history < 2 {
            checks.push(ValidationCheck::critical(
                "Minimum History",
                format!("min_history {} must exceed trend_lookback {}", signal.min_history, signal.trend_lookback),
            ));
        }
        if signal.min_history > signal.history_capacity {
            checks.push(ValidationCheck::critical(
                "Minimum History",
                format!("min_history {} can never be reached with capacity {}", signal.min_history, signal.history_capacity),
            ));
        }
        if !signal.momentum_steepness.is_finite() || signal.momentum_steepness <= 0.0 {
            checks.push(ValidationCheck::critical("Momentum Steepness", "must be positive"));
        }

        if checks.iter().all(|c| c.passed || c.level != ValidationLevel::Critical) {
            checks.push(ValidationCheck::ok(
                "Signal Strategy",
                format!("threshold {:.2}, window {}, min history {}", signal.entry_threshold, signal.window, signal.min_history),
            ));
        }

        checks
    }

    fn check_venue(&self, venue: &VenueConfig) -> Vec<ValidationCheck> {
        let mut checks = Vec::new();
        let name = format!("Venue {}", venue.name);

        if venue.name.trim().is_empty() {
            checks.push(ValidationCheck::critical("Venue", "name must not be empty"));
        }

        if !venue.starting_balance.is_finite() || venue.starting_balance <= 0.0 {
            checks.push(ValidationCheck::critical(
                name.clone(),
                format!("starting_balance must be positive, got {}", venue.starting_balance),
            ));
        }

        for (field, value) in [
            ("position_size_pct", venue.position_size_pct),
            ("stop_loss_pct", venue.stop_loss_pct),
            ("take_profit_pct", venue.take_profit_pct),
        ] {
            if !value.is_finite() || value <= 0.0 || value >= 1.0 {
                checks.push(ValidationCheck::critical(
                    name.clone(),
                    format!("{} must be between 0 and 1 (exclusive), got {}", field, value),
                ));
            }
        }

        if venue.max_concurrent_positions == 0 {
            checks.push(ValidationCheck::critical(name.clone(), "max_concurrent_positions must be at least 1"));
        }

        if !venue.size_boost.is_finite() || venue.size_boost <= 0.0 {
            checks.push(ValidationCheck::critical(
                name.clone(),
                format!("size_boost must be positive, got {}", venue.size_boost),
            ));
        } else if venue.position_size_pct * venue.size_boost > 1.0 {
            checks.push(ValidationCheck::warning(
                name.clone(),
                "Boosted position size exceeds the whole balance",
            ));
        }

        if venue.instruments.is_empty() {
            checks.push(ValidationCheck::warning(name.clone(), "Empty instrument universe, venue will not trade"));
        }

        let mut symbols = HashSet::new();
        for instrument in &venue.instruments {
            if let Err(e) = instrument.check() {
                checks.push(ValidationCheck::critical(name.clone(), e.to_string()));
            }
            if !symbols.insert(instrument.symbol.as_str()) {
                checks.push(ValidationCheck::critical(
                    name.clone(),
                    format!("Duplicate instrument {}", instrument.symbol),
                ));
            }
        }

        if checks.iter().all(|c| c.passed || c.level != ValidationLevel::Critical) {
            checks.push(ValidationCheck::ok(
                name,
                format!(
                    "£{:.2}, {} instruments, max {} open",
                    venue.starting_balance,
                    venue.instruments.len(),
                    venue.max_concurrent_positions
                ),
            ));
        }

        checks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Instrument;

    #[test]
    fn test_validation_result() {
        let mut result = ValidationResult::new();
        assert!(result.passed);

        result.add_check(ValidationCheck::ok("Test", "OK"));
        assert!(result.passed);

        result.add_check(ValidationCheck::warning("Soft", "Meh"));
        assert!(result.passed);
        assert_eq!(result.warnings().len(), 1);

        result.add_check(ValidationCheck::critical("Fail", "Failed"));
        assert!(!result.passed);
        assert_eq!(result.critical_failures().len(), 1);
    }

    #[test]
    fn test_default_config_passes() {
        let config = SimulationConfig::default();
        let result = PreFlightValidator::new(&config).validate_all();
        assert!(result.passed);
    }

    #[test]
    fn test_empty_universe_is_only_a_warning() {
        let mut config = SimulationConfig::default();
        config.venues[0].instruments.clear();

        let result = PreFlightValidator::new(&config).validate_all();
        assert!(result.passed);
        assert!(result.warnings().iter().any(|c| c.message.contains("Empty instrument universe")));
    }

    #[test]
    fn test_bad_percentages_fail() {
        let mut config = SimulationConfig::default();
        config.venues[1].stop_loss_pct = -0.01;
        config.venues[1].take_profit_pct = 0.0;

        let result = PreFlightValidator::new(&config).validate_all();
        assert!(!result.passed);
        assert_eq!(result.critical_failures().len(), 2);
    }

    #[test]
    fn test_duplicates_fail() {
        let mut config = SimulationConfig::default();
        config.venues[1].name = config.venues[0].name.clone();
        let result = PreFlightValidator::new(&config).validate_all();
        assert!(!result.passed);

        let mut config = SimulationConfig::default();
        let dup = config.venues[0].instruments[0].clone();
        config.venues[0].instruments.push(dup);
        let result = PreFlightValidator::new(&config).validate_all();
        assert!(!result.passed);
    }

    #[test]
    fn test_non_positive_volatility_fails() {
        let mut config = SimulationConfig::default();
        config.venues[0].instruments.push(Instrument {
            symbol: "DOT/USD".to_string(),
            base_price: 7.0,
            volatility: 0.0,
        });
        let result = PreFlightValidator::new(&config).validate_all();
        assert!(!result.passed);
    }

    #[test]
    fn test_volatility_that_can_turn_prices_negative_fails() {
        let mut config = SimulationConfig::default();
        config.venues[0].instruments.push(Instrument {
            symbol: "WILD/USD".to_string(),
            base_price: 100.0,
            volatility: 0.9,
        });
        let result = PreFlightValidator::new(&config).validate_all();
        assert!(!result.passed);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_signal_window_shape() {
        let mut config = SimulationConfig::default();
        config.signal.min_history = 3;
        config.signal.trend_lookback = 3;
        let result = PreFlightValidator::new(&config).validate_all();
        assert!(!result.passed);
    }
}
