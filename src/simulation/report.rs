// Run results: per-venue performance, aggregate totals and the closed-trade log

use crate::core::position_ledger::ClosedTrade;
use crate::core::venue::Venue;
use crate::error::TradingResult;
use crate::types::TradeResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Why the run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    TargetReached,
    MaxTicks,
    Cancelled,
    NoInstruments,
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            TerminationReason::TargetReached => "target reached",
            TerminationReason::MaxTicks => "max ticks reached",
            TerminationReason::Cancelled => "cancelled",
            TerminationReason::NoInstruments => "no instruments to trade",
        };
        write!(f, "{}", text)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueReport {
    pub name: String,
    pub start_balance: f64,
    pub end_balance: f64,
    pub wins: usize,
    pub losses: usize,
    pub hit_rate: f64,                    // 0 when nothing closed
    pub net_pnl: f64,
    pub roi_pct: f64,
    pub best_instrument: Option<String>,  // Highest summed realized P&L
    pub open_positions: usize,
    pub profit_factor: Option<f64>,       // Gross profit / gross loss; None without losses
    pub max_drawdown_pct: f64,            // Over the realized balance curve
}

impl VenueReport {
    pub fn from_venue(venue: &Venue) -> Self {
        let ledger = venue.ledger();
        let trades = ledger.closed_trades();
        let start_balance = venue.starting_balance();
        let end_balance = ledger.balance();
        let wins = ledger.wins();
        let losses = ledger.losses();
        let net_pnl = end_balance - start_balance;

        Self {
            name: venue.name().to_string(),
            start_balance,
            end_balance,
            wins,
            losses,
            hit_rate: hit_rate(wins, losses),
            net_pnl,
            roi_pct: roi_pct(net_pnl, start_balance),
            best_instrument: best_instrument(trades),
            open_positions: ledger.open_count(),
            profit_factor: profit_factor(trades),
            max_drawdown_pct: max_drawdown(start_balance, trades) * 100.0,
        }
    }

    pub fn total_trades(&self) -> usize {
        self.wins + self.losses
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateReport {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub hit_rate: f64,
    pub total_pnl: f64,
    pub start_balance: f64,
    pub end_balance: f64,
    pub roi_pct: f64,
}

impl AggregateReport {
    pub fn from_venues(venues: &[VenueReport]) -> Self {
        let wins: usize = venues.iter().map(|v| v.wins).sum();
        let losses: usize = venues.iter().map(|v| v.losses).sum();
        let start_balance: f64 = venues.iter().map(|v| v.start_balance).sum();
        let end_balance: f64 = venues.iter().map(|v| v.end_balance).sum();
        let total_pnl: f64 = venues.iter().map(|v| v.net_pnl).sum();

        Self {
            total_trades: wins + losses,
            wins,
            losses,
            hit_rate: hit_rate(wins, losses),
            total_pnl,
            start_balance,
            end_balance,
            roi_pct: roi_pct(total_pnl, start_balance),
        }
    }
}

/// Final result of a simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub seed: u64,
    pub mode: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub ticks: u64,
    pub terminated_by: TerminationReason,
    pub venues: Vec<VenueReport>,
    pub aggregate: AggregateReport,
    pub closed_trades: Vec<ClosedTrade>,
}

impl SimulationReport {
    pub fn total_trades(&self) -> usize {
        self.aggregate.total_trades
    }

    pub fn venue(&self, name: &str) -> Option<&VenueReport> {
        self.venues.iter().find(|v| v.name == name)
    }

    pub fn to_json(&self) -> TradingResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> TradingResult<()> {
        let json = self.to_json()?;
        std::fs::write(path.as_ref(), json).map_err(|e| {
            crate::error::TradingError::FileWrite(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Ok(())
    }

    /// Log a human-readable summary
    pub fn display(&self) {
        info!("📊 SIMULATION REPORT");
        info!("═══════════════════════════════════════");
        info!(
            "🎲 Seed: {} | Mode: {} | Ticks: {} | Ended: {}",
            self.seed, self.mode, self.ticks, self.terminated_by
        );
        info!(
            "⏱️  Duration: {:.2}s",
            (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
        );

        for venue in &self.venues {
            info!("");
            info!("🏦 {}", venue.name);
            info!(
                "   Balance: £{:.2} -> £{:.2} ({:+.2}%)",
                venue.start_balance, venue.end_balance, venue.roi_pct
            );
            info!(
                "   Trades: {} ({} W / {} L) | Hit rate: {:.1}%",
                venue.total_trades(),
                venue.wins,
                venue.losses,
                venue.hit_rate * 100.0
            );
            let profit_factor = match venue.profit_factor {
                Some(pf) => format!("{:.2}", pf),
                None => "n/a".to_string(),
            };
            info!(
                "   Net P&L: £{:+.4} | Profit factor: {} | Max drawdown: {:.2}%",
                venue.net_pnl, profit_factor, venue.max_drawdown_pct
            );
            match &venue.best_instrument {
                Some(symbol) => info!("   Best instrument: {}", symbol),
                None => info!("   Best instrument: n/a"),
            }
            if venue.open_positions > 0 {
                info!("   Still open: {}", venue.open_positions);
            }
        }

        info!("");
        info!("📈 AGGREGATE");
        info!(
            "   Trades: {} | Hit rate: {:.1}% | Total P&L: £{:+.4} | ROI: {:+.2}%",
            self.aggregate.total_trades,
            self.aggregate.hit_rate * 100.0,
            self.aggregate.total_pnl,
            self.aggregate.roi_pct
        );
        info!("═══════════════════════════════════════");
    }
}

/// Periodic status emitted by continuous runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveSnapshot {
    pub tick: u64,
    pub taken_at: DateTime<Utc>,
    pub venues: Vec<VenueSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueSnapshot {
    pub name: String,
    pub balance: f64,
    pub unrealized_pnl: f64,
    pub open_positions: usize,
    pub closed_trades: usize,
    pub hit_rate: f64,
    pub last_prices: BTreeMap<String, f64>,
}

impl VenueSnapshot {
    pub fn from_venue(venue: &Venue) -> Self {
        let ledger = venue.ledger();
        Self {
            name: venue.name().to_string(),
            balance: ledger.balance(),
            unrealized_pnl: venue.unrealized_pnl(),
            open_positions: ledger.open_count(),
            closed_trades: ledger.closed_count(),
            hit_rate: hit_rate(ledger.wins(), ledger.losses()),
            last_prices: venue.last_prices().clone(),
        }
    }
}

impl LiveSnapshot {
    pub fn display(&self) {
        info!("📡 Tick {} status", self.tick);
        for venue in &self.venues {
            info!(
                "   🏦 {}: £{:.2} (unrealized £{:+.4}) | open {} | closed {} | hit rate {:.1}%",
                venue.name,
                venue.balance,
                venue.unrealized_pnl,
                venue.open_positions,
                venue.closed_trades,
                venue.hit_rate * 100.0
            );
        }
    }
}

pub fn hit_rate(wins: usize, losses: usize) -> f64 {
    let total = wins + losses;
    if total == 0 {
        0.0
    } else {
        wins as f64 / total as f64
    }
}

fn roi_pct(pnl: f64, start_balance: f64) -> f64 {
    if start_balance > 0.0 {
        pnl / start_balance * 100.0
    } else {
        0.0
    }
}

fn best_instrument(trades: &[ClosedTrade]) -> Option<String> {
    let mut by_symbol: BTreeMap<&str, f64> = BTreeMap::new();
    for trade in trades {
        *by_symbol.entry(trade.symbol.as_str()).or_insert(0.0) += trade.realized_pnl;
    }

    // Ties resolve to the alphabetically first symbol
    let mut best: Option<(&str, f64)> = None;
    for (symbol, pnl) in by_symbol {
        match best {
            Some((_, best_pnl)) if pnl <= best_pnl => {}
            _ => best = Some((symbol, pnl)),
        }
    }
    best.map(|(symbol, _)| symbol.to_string())
}

fn profit_factor(trades: &[ClosedTrade]) -> Option<f64> {
    let mut gross_profit = 0.0;
    let mut gross_loss = 0.0;
    for trade in trades {
        if trade.result == TradeResult::Win {
            gross_profit += trade.realized_pnl;
        } else {
            gross_loss += trade.realized_pnl.abs();
        }
    }

    if gross_loss > 0.0 {
        Some(gross_profit / gross_loss)
    } else {
        None
    }
}

/// Largest peak-to-trough fall of the balance, as a fraction of the peak
fn max_drawdown(start_balance: f64, trades: &[ClosedTrade]) -> f64 {
    let mut peak = start_balance;
    let mut max_drawdown: f64 = 0.0;

    for trade in trades {
        let value = trade.balance_after;
        if value > peak {
            peak = value;
        } else if peak > 0.0 {
            max_drawdown = max_drawdown.max((peak - value) / peak);
        }
    }

    max_drawdown
}
