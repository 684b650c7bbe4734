// Common types used across the simulation

use crate::error::{TradingError, TradingResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A tradable symbol with the parameters of its simulated price path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    pub base_price: f64,
    pub volatility: f64,  // Fractional per-tick move scale, e.g. 0.0025
}

impl Instrument {
    pub fn new(symbol: &str, base_price: f64, volatility: f64) -> TradingResult<Self> {
        let instrument = Self {
            symbol: symbol.to_string(),
            base_price,
            volatility,
        };
        instrument.check()?;
        Ok(instrument)
    }

    /// Reject parameters the price generator cannot work with
    pub fn check(&self) -> TradingResult<()> {
        if self.symbol.trim().is_empty() {
            return Err(crate::trading_error!(invalid_param, "symbol", "must not be empty"));
        }
        if !self.base_price.is_finite() || self.base_price <= 0.0 {
            return Err(TradingError::InvalidParameter(
                format!("{}.base_price", self.symbol),
                format!("must be positive, got {}", self.base_price),
            ));
        }
        if !self.volatility.is_finite() || self.volatility <= 0.0 || self.volatility >= MAX_VOLATILITY {
            return Err(TradingError::InvalidParameter(
                format!("{}.volatility", self.symbol),
                format!("must be in (0, 2/3), got {}", self.volatility),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,   // Profits when price rises
    Short,  // Profits when price falls
}

impl Direction {
    /// +1 for long, -1 for short
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    /// Direction a position would take on this signal, if any
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Signal::Buy => Some(Direction::Long),
            Signal::Sell => Some(Direction::Short),
            Signal::Hold => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExitReason {
    Stop,    // Stop-loss breached
    Profit,  // Take-profit breached
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeResult {
    Win,
    Loss,
}

/// Order in which a venue walks its instrument universe on a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanDirection {
    Forward,
    Reverse,
}

impl ScanDirection {
    pub fn flipped(&self) -> Self {
        match self {
            ScanDirection::Forward => ScanDirection::Reverse,
            ScanDirection::Reverse => ScanDirection::Forward,
        }
    }
}

// Golden ratio and its reference points for the phi-proximity score
pub const PHI: f64 = 1.618033988749895;
pub const PHI_RECIPROCAL: f64 = 1.0 / PHI;        // ~0.618
pub const PHI_COMPLEMENT: f64 = 1.0 - 1.0 / PHI;  // ~0.382

// A step can shrink the price by up to 1.5 * volatility, so this keeps every price positive
pub const MAX_VOLATILITY: f64 = 2.0 / 3.0;

// Price returned for instruments the generator has never seen
pub const FALLBACK_PRICE: f64 = 100.0;
