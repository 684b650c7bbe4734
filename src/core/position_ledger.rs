// Position lifecycle: open, monitor against stop/take levels, realize P&L

use crate::config::{ExitFill, VenueConfig};
use crate::types::{Direction, ExitReason, TradeResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An open position. Levels and size are fixed when it is opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub size: f64,               // Units of the instrument
    pub stop_loss: f64,
    pub take_profit: f64,
    pub open_tick: u64,
}

impl Position {
    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        (current_price - self.entry_price) * self.size * self.direction.sign()
    }

    /// Which level, if any, `current_price` breaches. Stop-loss wins ties.
    pub fn exit_reason(&self, current_price: f64) -> Option<ExitReason> {
        let (stop_hit, profit_hit) = match self.direction {
            Direction::Long => (
                current_price <= self.stop_loss,
                current_price >= self.take_profit,
            ),
            Direction::Short => (
                current_price >= self.stop_loss,
                current_price <= self.take_profit,
            ),
        };

        if stop_hit {
            Some(ExitReason::Stop)
        } else if profit_hit {
            Some(ExitReason::Profit)
        } else {
            None
        }
    }

    fn level(&self, reason: ExitReason) -> f64 {
        match reason {
            ExitReason::Stop => self.stop_loss,
            ExitReason::Profit => self.take_profit,
        }
    }
}

/// Permanent record of a closed position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub id: String,
    pub venue: String,
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub exit_price: f64,
    pub size: f64,
    pub realized_pnl: f64,
    pub result: TradeResult,
    pub reason: ExitReason,
    pub open_tick: u64,
    pub close_tick: u64,
    pub balance_after: f64,
}

/// Sizing and exit parameters, copied from the venue config
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerLimits {
    pub position_size_pct: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub max_concurrent_positions: usize,
    pub size_boost: f64,
}

impl From<&VenueConfig> for LedgerLimits {
    fn from(config: &VenueConfig) -> Self {
        Self {
            position_size_pct: config.position_size_pct,
            stop_loss_pct: config.stop_loss_pct,
            take_profit_pct: config.take_profit_pct,
            max_concurrent_positions: config.max_concurrent_positions,
            size_boost: config.size_boost,
        }
    }
}

/// Balance, open positions and trade history of one venue
#[derive(Debug, Clone)]
pub struct PositionLedger {
    venue: String,
    balance: f64,
    open: BTreeMap<String, Position>,
    closed: Vec<ClosedTrade>,
    wins: usize,
    losses: usize,
    limits: LedgerLimits,
}

impl PositionLedger {
    pub fn new(venue: &str, starting_balance: f64, limits: LedgerLimits) -> Self {
        Self {
            venue: venue.to_string(),
            balance: starting_balance,
            open: BTreeMap::new(),
            closed: Vec::new(),
            wins: 0,
            losses: 0,
            limits,
        }
    }

    /// Open a position at `price`; false if the symbol is taken or slots are full
    pub fn open_position(&mut self, symbol: &str, direction: Direction, price: f64, tick: u64) -> bool {
        if self.open.contains_key(symbol) || !self.has_free_slot() {
            return false;
        }
        if !price.is_finite() || price <= 0.0 {
            return false;
        }

        let size = (self.balance * self.limits.position_size_pct * self.limits.size_boost) / price;
        let (stop_loss, take_profit) = match direction {
            Direction::Long => (
                price * (1.0 - self.limits.stop_loss_pct),
                price * (1.0 + self.limits.take_profit_pct),
            ),
            Direction::Short => (
                price * (1.0 + self.limits.stop_loss_pct),
                price * (1.0 - self.limits.take_profit_pct),
            ),
        };

        self.open.insert(
            symbol.to_string(),
            Position {
                symbol: symbol.to_string(),
                direction,
                entry_price: price,
                size,
                stop_loss,
                take_profit,
                open_tick: tick,
            },
        );
        true
    }

    pub fn check_exit(&self, symbol: &str, current_price: f64) -> Option<ExitReason> {
        self.open.get(symbol)?.exit_reason(current_price)
    }

    /// Close `symbol` for `reason`, booking the realized P&L into the balance
    pub fn close_position(
        &mut self,
        symbol: &str,
        reason: ExitReason,
        market_price: f64,
        fill: ExitFill,
        tick: u64,
    ) -> Option<ClosedTrade> {
        let position = self.open.remove(symbol)?;

        let exit_price = match fill {
            ExitFill::Threshold => position.level(reason),
            ExitFill::Market => market_price,
        };
        let realized_pnl = position.unrealized_pnl(exit_price);

        self.balance += realized_pnl;
        let result = if realized_pnl > 0.0 {
            self.wins += 1;
            TradeResult::Win
        } else {
            self.losses += 1;
            TradeResult::Loss
        };

        let trade = ClosedTrade {
            id: format!("{}-{}", self.venue, self.closed.len() + 1),
            venue: self.venue.clone(),
            symbol: position.symbol,
            direction: position.direction,
            entry_price: position.entry_price,
            exit_price,
            size: position.size,
            realized_pnl,
            result,
            reason,
            open_tick: position.open_tick,
            close_tick: tick,
            balance_after: self.balance,
        };
        self.closed.push(trade.clone());
        Some(trade)
    }

    /// Check every open position against this tick's prices and close breaches
    pub fn update_positions(
        &mut self,
        prices: &BTreeMap<String, f64>,
        fill: ExitFill,
        tick: u64,
    ) -> Vec<ClosedTrade> {
        let exits: Vec<(String, ExitReason, f64)> = self
            .open
            .values()
            .filter_map(|p| {
                let price = *prices.get(&p.symbol)?;
                p.exit_reason(price).map(|reason| (p.symbol.clone(), reason, price))
            })
            .collect();

        exits
            .into_iter()
            .filter_map(|(symbol, reason, price)| self.close_position(&symbol, reason, price, fill, tick))
            .collect()
    }

    pub fn unrealized_pnl(&self, prices: &BTreeMap<String, f64>) -> f64 {
        self.open
            .values()
            .filter_map(|p| prices.get(&p.symbol).map(|&price| p.unrealized_pnl(price)))
            .sum()
    }

    pub fn has_free_slot(&self) -> bool {
        self.open.len() < self.limits.max_concurrent_positions
    }

    pub fn is_open(&self, symbol: &str) -> bool {
        self.open.contains_key(symbol)
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.open.get(symbol)
    }

    pub fn open_positions(&self) -> impl Iterator<Item = &Position> {
        self.open.values()
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    pub fn closed_trades(&self) -> &[ClosedTrade] {
        &self.closed
    }

    pub fn closed_count(&self) -> usize {
        self.closed.len()
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn wins(&self) -> usize {
        self.wins
    }

    pub fn losses(&self) -> usize {
        self.losses
    }

    pub fn limits(&self) -> &LedgerLimits {
        &self.limits
    }
}
