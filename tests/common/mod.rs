// Common test utilities and helpers

#![allow(dead_code)]

use venue_sim::{
    Instrument, LoggingConfig, RunConfig, SignalStrategy, SimulationConfig, TerminationMode,
    VenueConfig,
};

/// Quiet logging so test output stays readable
pub fn quiet_logging() -> LoggingConfig {
    LoggingConfig {
        enable_trade_logging: false,
        enable_signal_logging: false,
        enable_progress_bar: false,
    }
}

pub fn create_test_venue(name: &str, instruments: Vec<Instrument>) -> VenueConfig {
    VenueConfig {
        name: name.to_string(),
        starting_balance: 100.0,
        position_size_pct: 0.05,
        stop_loss_pct: 0.008,
        take_profit_pct: 0.018,
        max_concurrent_positions: 2,
        size_boost: 1.0,
        instruments,
    }
}

pub fn crypto_universe() -> Vec<Instrument> {
    vec![
        Instrument::new("BTC/USD", 95_000.0, 0.0025).expect("valid instrument"),
        Instrument::new("ETH/USD", 3_400.0, 0.003).expect("valid instrument"),
        Instrument::new("SOL/USD", 180.0, 0.004).expect("valid instrument"),
    ]
}

/// Two venues in batch mode with a fixed seed
pub fn create_test_config(trades_per_venue: usize, seed: u64) -> SimulationConfig {
    SimulationConfig {
        simulation: RunConfig {
            termination: TerminationMode::Batch { trades_per_venue },
            max_ticks: Some(50_000),
            seed: Some(seed),
            ..RunConfig::default()
        },
        signal: SignalStrategy::batch(),
        logging: quiet_logging(),
        venues: vec![
            create_test_venue("alpha", crypto_universe()),
            create_test_venue("beta", crypto_universe()),
        ],
    }
}

pub fn create_continuous_config(seed: u64, status_every_ticks: u64) -> SimulationConfig {
    let mut config = create_test_config(0, seed);
    config.simulation.termination = TerminationMode::Continuous {
        tick_interval_ms: 1,
        status_every_ticks,
    };
    config.simulation.max_ticks = None;
    config.signal = SignalStrategy::continuous();
    config
}
