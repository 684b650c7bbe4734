// A simulated broker: instrument universe, ledger, and its own price and signal engines

use crate::config::{ExitFill, LoggingConfig, SignalStrategy, VenueConfig};
use crate::core::position_ledger::{ClosedTrade, LedgerLimits, PositionLedger};
use crate::core::price_generator::PricePathGenerator;
use crate::core::signal_engine::{CoherenceSignalEngine, HistoryKey};
use crate::error::TradingResult;
use crate::types::{Direction, Instrument, ScanDirection, TradeResult};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use tracing::{debug, info};

// Keeps the signal engine's random stream apart from the price stream
const SIGNAL_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

/// What happened at one venue during one tick
#[derive(Debug, Clone, Default)]
pub struct VenueTick {
    pub closed: Vec<ClosedTrade>,
    pub opened: Vec<(String, Direction)>,
}

pub struct Venue {
    name: String,
    instruments: Vec<Instrument>,
    starting_balance: f64,
    ledger: PositionLedger,
    prices: PricePathGenerator,
    signals: CoherenceSignalEngine,
    trade_quota: Option<usize>,
    last_prices: BTreeMap<String, f64>,
    log_trades: bool,
    log_signals: bool,
}

impl Venue {
    /// Bind a venue config to injected price and signal engines
    pub fn new(config: &VenueConfig, prices: PricePathGenerator, signals: CoherenceSignalEngine) -> Self {
        Self {
            name: config.name.clone(),
            instruments: config.instruments.clone(),
            starting_balance: config.starting_balance,
            ledger: PositionLedger::new(&config.name, config.starting_balance, LedgerLimits::from(config)),
            prices,
            signals,
            trade_quota: None,
            last_prices: BTreeMap::new(),
            log_trades: false,
            log_signals: false,
        }
    }

    /// Build the venue and both engines from one seed
    pub fn from_config(config: &VenueConfig, strategy: &SignalStrategy, seed: u64) -> TradingResult<Self> {
        let prices = PricePathGenerator::for_instruments(&config.instruments, StdRng::seed_from_u64(seed))?;
        let signals = CoherenceSignalEngine::new(strategy.clone(), StdRng::seed_from_u64(seed ^ SIGNAL_STREAM));
        Ok(Self::new(config, prices, signals))
    }

    /// Cap the number of trades this venue may open over the whole run
    pub fn with_trade_quota(mut self, quota: Option<usize>) -> Self {
        self.trade_quota = quota;
        self
    }

    pub fn with_logging(mut self, logging: &LoggingConfig) -> Self {
        self.log_trades = logging.enable_trade_logging;
        self.log_signals = logging.enable_signal_logging;
        self
    }

    /// One synchronized step: mark prices, close breaches, then scan for entries
    pub fn tick(&mut self, tick: u64, direction: ScanDirection, fill: ExitFill) -> VenueTick {
        self.mark_prices();

        let closed = self.ledger.update_positions(&self.last_prices, fill, tick);
        if self.log_trades {
            for trade in &closed {
                let icon = if trade.result == TradeResult::Win { "🟢" } else { "🔴" };
                info!(
                    "{} [{}] CLOSED {} {} @ {:.4} -> {:.4} ({:?}) | P&L: £{:+.4} | Balance: £{:.2}",
                    icon,
                    self.name,
                    trade.direction,
                    trade.symbol,
                    trade.entry_price,
                    trade.exit_price,
                    trade.reason,
                    trade.realized_pnl,
                    trade.balance_after
                );
            }
        }

        let opened = self.scan(tick, direction);
        VenueTick { closed, opened }
    }

    /// Draw one fresh price per instrument and feed it to the signal history
    fn mark_prices(&mut self) {
        for instrument in &self.instruments {
            let price = self.prices.next_price(&instrument.symbol);
            let key = HistoryKey::new(&self.name, &instrument.symbol);
            self.signals.add_price(&key, price);
            self.last_prices.insert(instrument.symbol.clone(), price);
        }
    }

    /// Walk the universe in `direction`, opening on BUY/SELL while slots and quota allow
    pub fn scan(&mut self, tick: u64, direction: ScanDirection) -> Vec<(String, Direction)> {
        let mut opened = Vec::new();
        let order: Vec<usize> = match direction {
            ScanDirection::Forward => (0..self.instruments.len()).collect(),
            ScanDirection::Reverse => (0..self.instruments.len()).rev().collect(),
        };

        for index in order {
            if !self.can_open() {
                break;
            }

            let symbol = self.instruments[index].symbol.clone();
            if self.ledger.is_open(&symbol) {
                continue;
            }
            let price = match self.last_prices.get(&symbol) {
                Some(&price) => price,
                None => continue,
            };

            let key = HistoryKey::new(&self.name, &symbol);
            let signal = self.signals.get_signal(&key);
            if self.log_signals {
                if let Some(reading) = self.signals.evaluate(&key) {
                    debug!(
                        "📡 [{}] {} {:?} coherence {:.3} (phi {:.3}, momentum {:.3}, wave {:.3})",
                        self.name, symbol, signal, reading.coherence,
                        reading.phi_score, reading.momentum_score, reading.wave_position
                    );
                }
            }

            if let Some(side) = signal.direction() {
                if self.ledger.open_position(&symbol, side, price, tick) {
                    if self.log_trades {
                        if let Some(p) = self.ledger.position(&symbol) {
                            info!(
                                "📈 [{}] OPENED {} {} @ {:.4} | Size: {:.6} | SL: {:.4} | TP: {:.4}",
                                self.name, side, symbol, p.entry_price, p.size, p.stop_loss, p.take_profit
                            );
                        }
                    }
                    opened.push((symbol, side));
                }
            }
        }

        opened
    }

    fn can_open(&self) -> bool {
        self.ledger.has_free_slot() && self.has_quota_remaining()
    }

    /// True while closed plus open trades are below the quota
    pub fn has_quota_remaining(&self) -> bool {
        match self.trade_quota {
            Some(quota) => self.ledger.closed_count() + self.ledger.open_count() < quota,
            None => true,
        }
    }

    /// Closed trades this venue will contribute to a batch target
    pub fn trade_target(&self) -> usize {
        if self.instruments.is_empty() {
            return 0;
        }
        self.trade_quota.unwrap_or(0)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn starting_balance(&self) -> f64 {
        self.starting_balance
    }

    pub fn balance(&self) -> f64 {
        self.ledger.balance()
    }

    pub fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    pub fn signals(&self) -> &CoherenceSignalEngine {
        &self.signals
    }

    pub fn last_price(&self, symbol: &str) -> Option<f64> {
        self.last_prices.get(symbol).copied()
    }

    pub fn last_prices(&self) -> &BTreeMap<String, f64> {
        &self.last_prices
    }

    pub fn unrealized_pnl(&self) -> f64 {
        self.ledger.unrealized_pnl(&self.last_prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;

    fn venue_config() -> VenueConfig {
        SimulationConfig::default().venues[0].clone()
    }

    fn eager() -> SignalStrategy {
        SignalStrategy {
            entry_threshold: 0.0,
            ..SignalStrategy::batch()
        }
    }

    #[test]
    fn test_no_entries_before_min_history() {
        let config = venue_config();
        let mut venue = Venue::from_config(&config, &eager(), 1).unwrap();

        for tick in 1..5 {
            let result = venue.tick(tick, ScanDirection::Forward, ExitFill::Threshold);
            assert!(result.opened.is_empty());
        }
        assert_eq!(venue.last_prices().len(), config.instruments.len());
    }

    #[test]
    fn test_concurrency_cap_holds_every_tick() {
        let config = venue_config();
        let mut venue = Venue::from_config(&config, &eager(), 9).unwrap();

        for tick in 1..500 {
            let direction = if tick % 2 == 0 { ScanDirection::Forward } else { ScanDirection::Reverse };
            venue.tick(tick, direction, ExitFill::Threshold);
            assert!(venue.ledger().open_count() <= config.max_concurrent_positions);
        }
        assert!(venue.ledger().closed_count() > 0);
    }

    #[test]
    fn test_quota_limits_opens() {
        let config = venue_config();
        let mut venue = Venue::from_config(&config, &eager(), 4)
            .unwrap()
            .with_trade_quota(Some(2));

        for tick in 1..2_000 {
            venue.tick(tick, ScanDirection::Forward, ExitFill::Threshold);
            assert!(venue.ledger().closed_count() + venue.ledger().open_count() <= 2);
        }
        assert_eq!(venue.trade_target(), 2);
        assert!(!venue.has_quota_remaining());
    }

    #[test]
    fn test_balance_moves_only_by_realized_pnl() {
        let config = venue_config();
        let mut venue = Venue::from_config(&config, &eager(), 21).unwrap();

        for tick in 1..300 {
            let before = venue.balance();
            let result = venue.tick(tick, ScanDirection::Forward, ExitFill::Threshold);
            let realized: f64 = result.closed.iter().map(|t| t.realized_pnl).sum();
            if result.closed.is_empty() {
                assert_eq!(venue.balance(), before);
            } else {
                let mut expected = before;
                for trade in &result.closed {
                    expected += trade.realized_pnl;
                    assert_eq!(trade.balance_after, expected);
                }
                assert!((venue.balance() - (before + realized)).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_missing_price_path_uses_fallback() {
        let config = venue_config();
        // Generator that knows none of the venue's instruments
        let venue_prices = PricePathGenerator::with_seed(1);
        let signals = CoherenceSignalEngine::with_seed(SignalStrategy::batch(), 1);
        let mut venue = Venue::new(&config, venue_prices, signals);

        venue.tick(1, ScanDirection::Forward, ExitFill::Threshold);
        assert_eq!(venue.last_price("BTC/USD"), Some(crate::types::FALLBACK_PRICE));
    }

    #[test]
    fn test_empty_universe_has_no_target() {
        let mut config = venue_config();
        config.instruments.clear();
        let mut venue = Venue::from_config(&config, &eager(), 1)
            .unwrap()
            .with_trade_quota(Some(10));

        let result = venue.tick(1, ScanDirection::Forward, ExitFill::Threshold);
        assert!(result.opened.is_empty());
        assert_eq!(venue.trade_target(), 0);
    }
}
