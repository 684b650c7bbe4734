//! Error handling for the venue simulator
//!
//! One error type for everything that can surface to a caller. Per-tick
//! anomalies are recovered locally and only logged; what reaches this type is
//! either a configuration problem (fatal, before the run) or an IO failure in
//! the CLI layer.

use std::fmt;

/// Main error type for the simulator
#[derive(Debug)]
pub enum TradingError {
    // Configuration errors
    ConfigNotFound(String),
    ConfigParse(String),
    ConfigValidation(String),

    // Validation errors
    InvalidParameter(String, String), // (parameter_name, reason)

    // Market errors
    UnknownInstrument(String),

    // IO errors
    FileRead(String),
    FileWrite(String),

    // Report errors
    ReportSerialize(String),

    // General errors
    Internal(String),
}

impl TradingError {
    /// Get a user-friendly error message with helpful context
    pub fn user_message(&self) -> String {
        match self {
            TradingError::ConfigNotFound(path) => {
                format!(
                    "Configuration file not found: {}\n\n\
                    💡 Quick fix:\n\
                    1. Run: venue-sim init\n\
                    2. Edit the venues and instruments in the generated file\n\
                    3. Try again",
                    path
                )
            }
            TradingError::ConfigValidation(msg) => {
                format!(
                    "Configuration validation error: {}\n\n\
                    💡 Check the config for:\n\
                    - Positive balances and volatilities\n\
                    - Percentages between 0 and 1\n\
                    - Unique venue names and symbols",
                    msg
                )
            }
            TradingError::InvalidParameter(param, reason) => {
                format!(
                    "Invalid parameter '{}': {}\n\n\
                    💡 Run: venue-sim validate to see every failing check",
                    param, reason
                )
            }
            _ => self.to_string(),
        }
    }

    /// True when the error stops a run from starting
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TradingError::UnknownInstrument(_))
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            TradingError::ConfigNotFound(_)
            | TradingError::ConfigParse(_)
            | TradingError::ConfigValidation(_) => "config",

            TradingError::InvalidParameter(_, _) => "validation",

            TradingError::UnknownInstrument(_) => "market",

            TradingError::FileRead(_) | TradingError::FileWrite(_) => "io",

            TradingError::ReportSerialize(_) => "report",

            TradingError::Internal(_) => "internal",
        }
    }
}

impl fmt::Display for TradingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradingError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path)
            }
            TradingError::ConfigParse(msg) => {
                write!(f, "Configuration parse error: {}", msg)
            }
            TradingError::ConfigValidation(msg) => {
                write!(f, "Configuration validation error: {}", msg)
            }

            TradingError::InvalidParameter(param, reason) => {
                write!(f, "Invalid parameter '{}': {}", param, reason)
            }

            TradingError::UnknownInstrument(symbol) => {
                write!(f, "Unknown instrument: {}", symbol)
            }

            TradingError::FileRead(msg) => {
                write!(f, "File read error: {}", msg)
            }
            TradingError::FileWrite(msg) => {
                write!(f, "File write error: {}", msg)
            }

            TradingError::ReportSerialize(msg) => {
                write!(f, "Report serialization error: {}", msg)
            }

            TradingError::Internal(msg) => {
                write!(f, "Internal error: {}", msg)
            }
        }
    }
}

impl std::error::Error for TradingError {}

// Conversion implementations for common error types

impl From<serde_json::Error> for TradingError {
    fn from(err: serde_json::Error) -> Self {
        TradingError::ReportSerialize(format!("JSON error: {}", err))
    }
}

impl From<crate::config::ConfigError> for TradingError {
    fn from(err: crate::config::ConfigError) -> Self {
        use crate::config::ConfigError;
        match err {
            ConfigError::FileNotFound(path) => TradingError::ConfigNotFound(path),
            ConfigError::FileRead(msg) => TradingError::FileRead(msg),
            ConfigError::FileWrite(msg) => TradingError::FileWrite(msg),
            ConfigError::Parse(msg) => TradingError::ConfigParse(msg),
            ConfigError::Serialize(msg) => TradingError::Internal(msg),
            ConfigError::Validation(msg) => TradingError::ConfigValidation(msg),
        }
    }
}

/// Result type alias using TradingError
pub type TradingResult<T> = Result<T, TradingError>;

/// Helper macro for creating context-rich errors
#[macro_export]
macro_rules! trading_error {
    (invalid_param, $param:expr, $reason:expr) => {
        $crate::error::TradingError::InvalidParameter($param.to_string(), $reason.to_string())
    };
    (unknown_instrument, $symbol:expr) => {
        $crate::error::TradingError::UnknownInstrument($symbol.to_string())
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TradingError::ConfigNotFound("sim.toml".to_string());
        assert!(err.to_string().contains("sim.toml"));
    }

    #[test]
    fn test_error_category() {
        let err = TradingError::ConfigValidation("test".to_string());
        assert_eq!(err.category(), "config");

        let err = TradingError::UnknownInstrument("DOGE".to_string());
        assert_eq!(err.category(), "market");

        let err = trading_error!(invalid_param, "stop_loss_pct", "must be positive");
        assert_eq!(err.category(), "validation");
    }

    #[test]
    fn test_unknown_instrument_is_not_fatal() {
        let err = trading_error!(unknown_instrument, "DOGE");
        assert!(!err.is_fatal());

        let err = TradingError::ConfigValidation("bad".to_string());
        assert!(err.is_fatal());
    }

    #[test]
    fn test_user_message() {
        let err = TradingError::ConfigValidation("starting_balance must be positive".to_string());
        let msg = err.user_message();
        assert!(msg.contains("starting_balance"));
        assert!(msg.contains("💡"));
    }

    #[test]
    fn test_config_error_conversion() {
        let err: TradingError =
            crate::config::ConfigError::Validation("no venues".to_string()).into();
        assert!(matches!(err, TradingError::ConfigValidation(_)));
    }
}
