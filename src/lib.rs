// Multi-Venue Trade Simulator Library
//
// Synthetic price paths, a golden-ratio coherence signal and per-venue paper ledgers,
// driven tick by tick in batch or continuous mode

pub mod types;
pub mod core;
pub mod config;
pub mod error;       // Unified error handling
pub mod validation;  // Pre-flight validation
pub mod progress;
pub mod simulation;

// Re-export domain types
pub use types::{Direction, ExitReason, Instrument, ScanDirection, Signal, TradeResult};

// Re-export core components
pub use core::{
    ClosedTrade, CoherenceReading, CoherenceSignalEngine, HistoryKey, LedgerLimits, Position,
    PositionLedger, PricePathGenerator, Venue,
};

// Re-export error types
pub use error::{TradingError, TradingResult};

// Re-export validation types
pub use validation::{PreFlightValidator, ValidationResult, ValidationCheck, ValidationLevel};

// Re-export configuration
pub use config::{
    ConfigError, ExitFill, LoggingConfig, RunConfig, SignalStrategy, SimulationConfig,
    TerminationMode, VenueConfig,
};

// Re-export simulation components
pub use simulation::{
    LiveSnapshot, SimulationController, SimulationReport, TerminationReason, VenueReport,
};
