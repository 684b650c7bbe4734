// Validate and run command implementations
use super::{ModeArg, PresetArg, RunArgs};
use tokio::sync::watch;
use tracing::{error, info, warn};
use venue_sim::{
    PreFlightValidator, SignalStrategy, SimulationConfig, SimulationController, TerminationMode,
    TradingError, TradingResult,
};

pub fn validate(config: &SimulationConfig) -> bool {
    let validation = PreFlightValidator::new(config).validate_all();
    validation.display();
    validation.passed
}

/// Fold command-line overrides into the loaded config
pub fn apply_overrides(config: &mut SimulationConfig, args: &RunArgs) {
    match args.mode {
        Some(ModeArg::Batch) => {
            if !matches!(config.simulation.termination, TerminationMode::Batch { .. }) {
                config.simulation.termination = TerminationMode::Batch { trades_per_venue: 10 };
            }
        }
        Some(ModeArg::Continuous) => {
            if !matches!(config.simulation.termination, TerminationMode::Continuous { .. }) {
                config.simulation.termination = TerminationMode::Continuous {
                    tick_interval_ms: 1_000,
                    status_every_ticks: 10,
                };
                // Ctrl+C is the stop signal unless the user asked for a bound
                if args.max_ticks.is_none() {
                    config.simulation.max_ticks = None;
                }
            }
        }
        None => {}
    }

    match &mut config.simulation.termination {
        TerminationMode::Batch { trades_per_venue } => {
            if let Some(trades) = args.trades {
                *trades_per_venue = trades;
            }
        }
        TerminationMode::Continuous {
            tick_interval_ms,
            status_every_ticks,
        } => {
            if let Some(interval) = args.interval_ms {
                *tick_interval_ms = interval;
            }
            if let Some(every) = args.status_every {
                *status_every_ticks = every;
            }
        }
    }

    if args.seed.is_some() {
        config.simulation.seed = args.seed;
    }
    if args.max_ticks.is_some() {
        config.simulation.max_ticks = args.max_ticks;
    }

    match args.preset {
        Some(PresetArg::Batch) => config.signal = SignalStrategy::batch(),
        Some(PresetArg::Continuous) => config.signal = SignalStrategy::continuous(),
        None => {}
    }

    for venue in &mut config.venues {
        if let Some(balance) = args.balance {
            venue.starting_balance = balance;
        }
        if let Some(size) = args.position_size {
            venue.position_size_pct = size;
        }
        if let Some(stop) = args.stop_loss {
            venue.stop_loss_pct = stop;
        }
        if let Some(take) = args.take_profit {
            venue.take_profit_pct = take;
        }
        if let Some(max) = args.max_positions {
            venue.max_concurrent_positions = max;
        }
    }

    if args.quiet {
        config.logging.enable_progress_bar = false;
    }
}

pub async fn run_simulation(mut config: SimulationConfig, args: &RunArgs) -> TradingResult<()> {
    apply_overrides(&mut config, args);

    info!("");
    if !validate(&config) {
        error!("");
        error!("❌ Pre-flight validation failed. Cannot proceed.");
        return Err(TradingError::ConfigValidation(
            "Critical validation checks did not pass".to_string(),
        ));
    }
    info!("");

    let mut controller = SimulationController::new(config)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 Ctrl+C received, finishing the current tick...");
            let _ = shutdown_tx.send(true);
        }
    });

    let report = controller.run(shutdown_rx).await?;
    info!("");
    report.display();

    if let Some(path) = &args.output {
        report.write_json(path)?;
        info!("💾 Report written to {}", path);
    }

    Ok(())
}
