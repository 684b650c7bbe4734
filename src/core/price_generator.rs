// Stochastic price paths with persistent trend regimes

use crate::error::TradingResult;
use crate::trading_error;
use crate::types::{Instrument, FALLBACK_PRICE};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use tracing::{debug, warn};

const TREND_MIN_TICKS: u32 = 10;
const TREND_MAX_TICKS: u32 = 40;

/// Directional regime applied on top of the random walk
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendState {
    pub bias: f64,            // In [-1, 1]
    pub remaining_ticks: u32,
}

impl TrendState {
    fn expired() -> Self {
        Self { bias: 0.0, remaining_ticks: 0 }
    }
}

#[derive(Debug, Clone)]
struct PathState {
    instrument: Instrument,
    last_price: f64,
    trend: TrendState,
}

/// Random walk with a periodically refreshed directional bias.
///
/// Each instrument starts at its base price. On every call the trend is
/// resampled if its duration ran out, then the price moves by
/// `uniform(-1,1) * vol + trend * vol * 0.5`. The path is neither bounded nor
/// mean-reverting.
#[derive(Debug, Clone)]
pub struct PricePathGenerator {
    paths: BTreeMap<String, PathState>,
    rng: StdRng,
}

impl PricePathGenerator {
    pub fn new(rng: StdRng) -> Self {
        Self {
            paths: BTreeMap::new(),
            rng,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Build a generator for a whole universe, rejecting invalid instruments
    pub fn for_instruments(instruments: &[Instrument], rng: StdRng) -> TradingResult<Self> {
        let mut generator = Self::new(rng);
        for instrument in instruments {
            generator.register(instrument.clone())?;
        }
        Ok(generator)
    }

    /// Start tracking an instrument; re-registering resets its path
    pub fn register(&mut self, instrument: Instrument) -> TradingResult<()> {
        instrument.check()?;
        self.paths.insert(
            instrument.symbol.clone(),
            PathState {
                last_price: instrument.base_price,
                trend: TrendState::expired(),
                instrument,
            },
        );
        Ok(())
    }

    /// Next price, or `FALLBACK_PRICE` for an unregistered symbol
    pub fn next_price(&mut self, symbol: &str) -> f64 {
        match self.try_next_price(symbol) {
            Ok(price) => price,
            Err(e) => {
                warn!("⚠️  {} - using fallback price {:.2}", e, FALLBACK_PRICE);
                FALLBACK_PRICE
            }
        }
    }

    pub fn try_next_price(&mut self, symbol: &str) -> TradingResult<f64> {
        let state = self
            .paths
            .get_mut(symbol)
            .ok_or_else(|| trading_error!(unknown_instrument, symbol))?;

        if state.trend.remaining_ticks == 0 {
            state.trend = TrendState {
                bias: self.rng.gen_range(-1.0..1.0),
                remaining_ticks: self.rng.gen_range(TREND_MIN_TICKS..=TREND_MAX_TICKS),
            };
            debug!(
                "🔄 {} trend regime: bias {:+.3} for {} ticks",
                symbol, state.trend.bias, state.trend.remaining_ticks
            );
        }
        state.trend.remaining_ticks -= 1;

        let volatility = state.instrument.volatility;
        let random_move = self.rng.gen_range(-1.0..1.0) * volatility;
        let trend_move = state.trend.bias * volatility * 0.5;

        let new_price = state.last_price * (1.0 + random_move + trend_move);
        state.last_price = new_price;
        Ok(new_price)
    }

    pub fn last_price(&self, symbol: &str) -> Option<f64> {
        self.paths.get(symbol).map(|s| s.last_price)
    }

    pub fn trend(&self, symbol: &str) -> Option<TrendState> {
        self.paths.get(symbol).map(|s| s.trend)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().map(|s| s.as_str())
    }
}
