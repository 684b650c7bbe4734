// Rolling-window coherence signal

use crate::config::SignalStrategy;
use crate::types::{Signal, PHI_COMPLEMENT, PHI_RECIPROCAL};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, VecDeque};
use std::f64::consts::PI;
use std::fmt;

// Composite weights, sum to 1
const PHI_WEIGHT: f64 = 0.4;
const MOMENTUM_WEIGHT: f64 = 0.3;
const WAVE_WEIGHT: f64 = 0.3;

/// 1 at either golden-ratio point (0.618, 0.382), falling linearly with distance to the nearer one
pub fn phi_proximity(normalized: f64) -> f64 {
    1.0 - (normalized - PHI_RECIPROCAL)
        .abs()
        .min((normalized - PHI_COMPLEMENT).abs())
}

/// History is kept per venue and instrument
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HistoryKey {
    pub venue: String,
    pub symbol: String,
}

impl HistoryKey {
    pub fn new(venue: &str, symbol: &str) -> Self {
        Self {
            venue: venue.to_string(),
            symbol: symbol.to_string(),
        }
    }
}

impl fmt::Display for HistoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.venue, self.symbol)
    }
}

/// Bounded FIFO of recent prices
#[derive(Debug, Clone)]
pub struct RollingHistory {
    prices: VecDeque<f64>,
    capacity: usize,
}

impl RollingHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            prices: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, price: f64) {
        self.prices.push_back(price);
        while self.prices.len() > self.capacity {
            self.prices.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<f64> {
        self.prices.back().copied()
    }

    /// The last `n` prices, oldest first
    pub fn recent(&self, n: usize) -> Vec<f64> {
        let skip = self.prices.len().saturating_sub(n);
        self.prices.iter().skip(skip).copied().collect()
    }
}

/// Score breakdown behind a signal decision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoherenceReading {
    pub normalized: f64,
    pub phi_score: f64,
    pub momentum_score: f64,
    pub wave_position: f64,
    pub coherence: f64,
    pub trend: f64,  // latest minus the price `trend_lookback` ticks back
}

/// Derives BUY/SELL/HOLD from golden-ratio proximity, momentum and a wave term
#[derive(Debug, Clone)]
pub struct CoherenceSignalEngine {
    histories: BTreeMap<HistoryKey, RollingHistory>,
    strategy: SignalStrategy,
    rng: StdRng,
}

impl CoherenceSignalEngine {
    pub fn new(strategy: SignalStrategy, rng: StdRng) -> Self {
        Self {
            histories: BTreeMap::new(),
            strategy,
            rng,
        }
    }

    pub fn with_seed(strategy: SignalStrategy, seed: u64) -> Self {
        Self::new(strategy, StdRng::seed_from_u64(seed))
    }

    pub fn strategy(&self) -> &SignalStrategy {
        &self.strategy
    }

    pub fn add_price(&mut self, key: &HistoryKey, price: f64) {
        let capacity = self.strategy.history_capacity;
        self.histories
            .entry(key.clone())
            .or_insert_with(|| RollingHistory::new(capacity))
            .push(price);
    }

    pub fn history(&self, key: &HistoryKey) -> Option<&RollingHistory> {
        self.histories.get(key)
    }

    /// Score the current window; `None` until `min_history` prices are held
    pub fn evaluate(&self, key: &HistoryKey) -> Option<CoherenceReading> {
        let history = self.histories.get(key)?;
        if history.len() < self.strategy.min_history {
            return None;
        }

        let recent = history.recent(self.strategy.window);
        let current = *recent.last()?;
        let first = recent[0];
        let min = recent.iter().copied().fold(f64::INFINITY, f64::min);
        let max = recent.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let normalized = if max > min {
            (current - min) / (max - min)
        } else {
            0.5
        };

        let phi_score = phi_proximity(normalized);

        let momentum = if first != 0.0 { (current - first) / first } else { 0.0 };
        let momentum_score = (momentum * self.strategy.momentum_steepness).tanh() * 0.5 + 0.5;

        let wave_position = (normalized * PI).sin().powi(2);

        let coherence =
            PHI_WEIGHT * phi_score + MOMENTUM_WEIGHT * momentum_score + WAVE_WEIGHT * wave_position;

        let full = history.recent(self.strategy.trend_lookback + 1);
        let trend = current - full[0];

        Some(CoherenceReading {
            normalized,
            phi_score,
            momentum_score,
            wave_position,
            coherence,
            trend,
        })
    }

    /// BUY on a rising coherent window, SELL on a falling one, HOLD otherwise
    pub fn get_signal(&mut self, key: &HistoryKey) -> Signal {
        let reading = match self.evaluate(key) {
            Some(reading) => reading,
            None => return Signal::Hold,
        };

        let directional = if reading.trend > 0.0 {
            Signal::Buy
        } else if reading.trend < 0.0 {
            Signal::Sell
        } else {
            Signal::Hold
        };

        if reading.coherence >= self.strategy.entry_threshold {
            return directional;
        }

        if self.strategy.random_injection
            && self.rng.gen::<f64>() < self.strategy.injection_probability
        {
            tracing::debug!("🎲 Injected {:?} for {} (coherence {:.3})", directional, key, reading.coherence);
            return directional;
        }

        Signal::Hold
    }
}
