//! Symbol value object for underlying identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::DomainError;

/// An underlying symbol (equity/ETF ticker, index, or futures root).
///
/// Examples:
/// - Equity/ETF: "SPY", "AAPL"
/// - Index: "VIX"
/// - Micro futures: "/MES", "/MCL"
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Create a new Symbol.
    ///
    /// The symbol is trimmed and normalized to uppercase.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_uppercase())
    }

    /// Get the symbol string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate the symbol.
    ///
    /// # Errors
    ///
    /// Returns error if the symbol is empty, too long, or contains characters
    /// other than ASCII alphanumerics (plus a single leading `/` for futures).
    pub fn validate(&self) -> Result<(), DomainError> {
        let body = self.0.strip_prefix('/').unwrap_or(&self.0);

        if body.is_empty() {
            return Err(DomainError::InvalidValue {
                field: "symbol".to_string(),
                message: "Symbol cannot be empty".to_string(),
            });
        }

        if self.0.len() > 12 {
            return Err(DomainError::InvalidValue {
                field: "symbol".to_string(),
                message: "Symbol exceeds maximum length".to_string(),
            });
        }

        if !body.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DomainError::InvalidValue {
                field: "symbol".to_string(),
                message: "Symbol contains invalid characters".to_string(),
            });
        }

        Ok(())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_new_normalizes_case_and_whitespace() {
        assert_eq!(Symbol::new(" spy ").as_str(), "SPY");
        assert_eq!(Symbol::new("/mes").as_str(), "/MES");
    }

    #[test]
    fn symbol_validate() {
        assert!(Symbol::new("SPY").validate().is_ok());
        assert!(Symbol::new("/MCL").validate().is_ok());
        assert!(Symbol::new("").validate().is_err());
        assert!(Symbol::new("/").validate().is_err());
        assert!(Symbol::new("SP Y").validate().is_err());
        assert!(Symbol::new("//MES").validate().is_err());
        assert!(Symbol::new("A".repeat(20)).validate().is_err());
    }

    #[test]
    fn symbol_hash_is_case_insensitive() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(Symbol::new("SPY"));
        set.insert(Symbol::new("spy"));
        set.insert(Symbol::new("QQQ"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn symbol_serde_normalizes() {
        let s = Symbol::new("IWM");
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, "\"IWM\"");
        let parsed: Symbol = serde_json::from_str("\"iwm\"").unwrap();
        assert_eq!(parsed.as_str(), "IWM");
    }
}
