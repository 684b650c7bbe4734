// Drives every venue through synchronized ticks and decides when a run ends

use crate::config::{SimulationConfig, TerminationMode};
use crate::core::position_ledger::ClosedTrade;
use crate::core::venue::{Venue, VenueTick};
use crate::error::{TradingError, TradingResult};
use crate::progress::SimulationProgress;
use crate::simulation::report::{
    AggregateReport, LiveSnapshot, SimulationReport, TerminationReason, VenueReport, VenueSnapshot,
};
use crate::types::ScanDirection;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Where the run currently stands
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub tick: u64,
    pub scan_direction: ScanDirection,  // Direction used by the latest tick
    pub total_closed: usize,
    pub started_at: DateTime<Utc>,
}

impl SimulationState {
    fn new() -> Self {
        Self {
            tick: 0,
            // Flipped before the first tick, which therefore scans forward
            scan_direction: ScanDirection::Reverse,
            total_closed: 0,
            started_at: Utc::now(),
        }
    }
}

pub struct SimulationController {
    config: SimulationConfig,
    venues: Vec<Venue>,
    state: SimulationState,
    seed: u64,
    closed_trades: Vec<ClosedTrade>,
    snapshot_sink: Option<mpsc::Sender<LiveSnapshot>>,
}

impl SimulationController {
    /// Validate the config and build every venue with its own seeded engines
    pub fn new(config: SimulationConfig) -> TradingResult<Self> {
        config.validate()?;

        let seed = match config.simulation.seed {
            Some(seed) => seed,
            None => {
                let seed = rand::random::<u64>();
                info!("🎲 No seed configured, drew {} (set simulation.seed to replay)", seed);
                seed
            }
        };

        let quota = match config.simulation.termination {
            TerminationMode::Batch { trades_per_venue } => Some(trades_per_venue),
            TerminationMode::Continuous { .. } => None,
        };

        let mut seeder = StdRng::seed_from_u64(seed);
        let mut venues = Vec::with_capacity(config.venues.len());
        for venue_config in &config.venues {
            let venue_seed: u64 = seeder.gen();
            debug!("🏦 {} seeded with {}", venue_config.name, venue_seed);
            let venue = Venue::from_config(venue_config, &config.signal, venue_seed)?
                .with_trade_quota(quota)
                .with_logging(&config.logging);
            venues.push(venue);
        }

        info!(
            "🚀 Simulation ready: {} venues, {} mode, seed {}",
            venues.len(),
            config.simulation.termination.name(),
            seed
        );

        Ok(Self {
            config,
            venues,
            state: SimulationState::new(),
            seed,
            closed_trades: Vec::new(),
            snapshot_sink: None,
        })
    }

    /// Forward live snapshots of a continuous run to a channel
    pub fn with_snapshot_sink(mut self, sink: mpsc::Sender<LiveSnapshot>) -> Self {
        self.snapshot_sink = Some(sink);
        self
    }

    /// Advance every venue by one tick; venues run in parallel, results keep config order
    pub fn tick(&mut self) -> Vec<VenueTick> {
        self.state.tick += 1;
        self.state.scan_direction = self.state.scan_direction.flipped();

        let tick = self.state.tick;
        let direction = self.state.scan_direction;
        let fill = self.config.simulation.exit_fill;

        let results: Vec<VenueTick> = self
            .venues
            .par_iter_mut()
            .map(|venue| venue.tick(tick, direction, fill))
            .collect();

        for result in &results {
            self.state.total_closed += result.closed.len();
            self.closed_trades.extend(result.closed.iter().cloned());
        }

        results
    }

    /// Closed trades a batch run waits for; zero when no venue has instruments
    pub fn trade_target(&self) -> usize {
        self.venues.iter().map(|v| v.trade_target()).sum()
    }

    fn has_instruments(&self) -> bool {
        self.venues.iter().any(|v| !v.instruments().is_empty())
    }

    fn max_ticks_reached(&self) -> bool {
        matches!(self.config.simulation.max_ticks, Some(max) if self.state.tick >= max)
    }

    /// Run in whichever mode the config selects
    pub async fn run(&mut self, shutdown: watch::Receiver<bool>) -> TradingResult<SimulationReport> {
        match self.config.simulation.termination {
            TerminationMode::Batch { .. } => self.run_batch(),
            TerminationMode::Continuous { .. } => self.run_continuous(shutdown).await,
        }
    }

    /// Tick until the combined closed-trade target is met
    pub fn run_batch(&mut self) -> TradingResult<SimulationReport> {
        let trades_per_venue = match self.config.simulation.termination {
            TerminationMode::Batch { trades_per_venue } => trades_per_venue,
            TerminationMode::Continuous { .. } => {
                return Err(TradingError::InvalidParameter(
                    "termination".to_string(),
                    "run_batch needs batch termination".to_string(),
                ))
            }
        };

        let target = self.trade_target();
        if target == 0 {
            warn!("⚠️  Nothing to trade (no instruments or zero target), finishing immediately");
            return Ok(self.report(TerminationReason::NoInstruments));
        }

        info!(
            "📊 Batch run: {} trades per venue, {} closed trades in total",
            trades_per_venue, target
        );

        let progress = if self.config.logging.enable_progress_bar {
            SimulationProgress::new(target)
        } else {
            SimulationProgress::hidden()
        };

        let reason = loop {
            if self.state.total_closed >= target {
                break TerminationReason::TargetReached;
            }
            if self.max_ticks_reached() {
                warn!(
                    "⏹️  Max ticks ({}) reached with {}/{} trades closed",
                    self.state.tick, self.state.total_closed, target
                );
                break TerminationReason::MaxTicks;
            }

            self.tick();
            progress.update(self.state.total_closed, self.state.tick);
        };

        progress.finish(reason, self.state.total_closed);
        Ok(self.report(reason))
    }

    /// Tick on an interval until `shutdown` flips to true or its sender goes away
    pub async fn run_continuous(
        &mut self,
        mut shutdown: watch::Receiver<bool>,
    ) -> TradingResult<SimulationReport> {
        let (interval_ms, status_every) = match self.config.simulation.termination {
            TerminationMode::Continuous {
                tick_interval_ms,
                status_every_ticks,
            } => (tick_interval_ms, status_every_ticks),
            TerminationMode::Batch { .. } => {
                return Err(TradingError::InvalidParameter(
                    "termination".to_string(),
                    "run_continuous needs continuous termination".to_string(),
                ))
            }
        };

        if !self.has_instruments() {
            warn!("⚠️  No venue has instruments, finishing immediately");
            return Ok(self.report(TerminationReason::NoInstruments));
        }

        info!(
            "🔄 Continuous run: tick every {}ms, status every {} ticks (Ctrl+C to stop)",
            interval_ms, status_every
        );
        let interval = Duration::from_millis(interval_ms);

        let reason = loop {
            if *shutdown.borrow() {
                break TerminationReason::Cancelled;
            }
            if self.max_ticks_reached() {
                break TerminationReason::MaxTicks;
            }

            self.tick();

            if status_every > 0 && self.state.tick % status_every == 0 {
                self.emit_snapshot();
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break TerminationReason::Cancelled;
                    }
                }
            }
        };

        info!("🛑 Stopped after tick {} ({})", self.state.tick, reason);
        Ok(self.report(reason))
    }

    /// Log a snapshot and offer it to the sink; a full sink drops it rather than stall the loop
    fn emit_snapshot(&mut self) {
        let snapshot = self.snapshot();
        snapshot.display();

        let receiver_gone = match &self.snapshot_sink {
            Some(sink) => match sink.try_send(snapshot) {
                Ok(()) => false,
                Err(TrySendError::Full(dropped)) => {
                    debug!("📭 Snapshot sink full, dropped tick {} snapshot", dropped.tick);
                    false
                }
                Err(TrySendError::Closed(_)) => true,
            },
            None => false,
        };
        if receiver_gone {
            warn!("⚠️  Snapshot receiver dropped, no further snapshots will be sent");
            self.snapshot_sink = None;
        }
    }

    pub fn snapshot(&self) -> LiveSnapshot {
        LiveSnapshot {
            tick: self.state.tick,
            taken_at: Utc::now(),
            venues: self.venues.iter().map(VenueSnapshot::from_venue).collect(),
        }
    }

    pub fn report(&self, reason: TerminationReason) -> SimulationReport {
        let venues: Vec<VenueReport> = self.venues.iter().map(VenueReport::from_venue).collect();
        let aggregate = AggregateReport::from_venues(&venues);

        SimulationReport {
            seed: self.seed,
            mode: self.config.simulation.termination.name().to_string(),
            started_at: self.state.started_at,
            finished_at: Utc::now(),
            ticks: self.state.tick,
            terminated_by: reason,
            venues,
            aggregate,
            closed_trades: self.closed_trades.clone(),
        }
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn venues(&self) -> &[Venue] {
        &self.venues
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Every closed trade so far, ordered by tick then venue
    pub fn closed_trades(&self) -> &[ClosedTrade] {
        &self.closed_trades
    }
}
