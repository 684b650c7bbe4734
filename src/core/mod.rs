// Core simulation logic modules

pub mod price_generator;
pub mod signal_engine;
pub mod position_ledger;
pub mod venue;

// Re-export commonly used types
pub use price_generator::{PricePathGenerator, TrendState};
pub use signal_engine::{CoherenceReading, CoherenceSignalEngine, HistoryKey, RollingHistory};
pub use position_ledger::{ClosedTrade, LedgerLimits, Position, PositionLedger};
pub use venue::{Venue, VenueTick};
