//! Domain errors for the automation engine.

use thiserror::Error;

/// Domain-level errors that can occur in business logic.
///
/// These errors are independent of infrastructure concerns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Invalid value for a field.
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
    },

    /// Position snapshot is structurally unusable (no legs, mixed underlyings).
    #[error("Malformed position {symbol}: {message}")]
    MalformedPosition {
        /// Underlying symbol of the position.
        symbol: String,
        /// Description of the problem.
        message: String,
    },

    /// Market data needed for a decision was absent.
    #[error("Market data unavailable for {symbol}: {message}")]
    MissingMarketData {
        /// Symbol the data was requested for.
        symbol: String,
        /// Description of what is missing.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_error_invalid_value_display() {
        let err = DomainError::InvalidValue {
            field: "symbol".to_string(),
            message: "Symbol cannot be empty".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value for 'symbol': Symbol cannot be empty"
        );
    }

    #[test]
    fn domain_error_malformed_position_display() {
        let err = DomainError::MalformedPosition {
            symbol: "SPY".to_string(),
            message: "no legs".to_string(),
        };
        assert!(err.to_string().contains("SPY"));
        assert!(err.to_string().contains("no legs"));
    }

    #[test]
    fn domain_error_is_std_error() {
        fn assert_error<E: std::error::Error>(_: &E) {}
        assert_error(&DomainError::MissingMarketData {
            symbol: "/MES".to_string(),
            message: "empty option chain".to_string(),
        });
    }
}
