//! Portfolio snapshot files.
//!
//! A JSON document holding positions, the account, and optionally quotes and
//! option chains. The binary seeds the paper venue from one.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::market::{AccountSnapshot, OptionChain, Quote};
use crate::domain::position::Position;

/// Snapshot loading errors.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// File could not be read.
    #[error("Failed to read snapshot '{path}': {source}")]
    Read {
        /// Snapshot path.
        path: String,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// File is not a valid snapshot.
    #[error("Failed to parse snapshot: {0}")]
    Parse(#[from] serde_json::Error),

    /// A position failed validation.
    #[error("Invalid position '{id}': {message}")]
    InvalidPosition {
        /// Position ID.
        id: String,
        /// Validation failure.
        message: String,
    },
}

/// Book and market state at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    /// Open positions.
    #[serde(default)]
    pub positions: Vec<Position>,
    /// Account balances.
    pub account: AccountSnapshot,
    /// Latest quotes.
    #[serde(default)]
    pub quotes: Vec<Quote>,
    /// Option chains.
    #[serde(default)]
    pub chains: Vec<OptionChain>,
}

impl PortfolioSnapshot {
    /// Read and validate a snapshot file.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` if the file is unreadable, malformed, or holds
    /// an invalid position.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| SnapshotError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Parse and validate a snapshot document.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` if the document is malformed or holds an
    /// invalid position.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(json)?;
        for position in &snapshot.positions {
            position
                .validate()
                .map_err(|e| SnapshotError::InvalidPosition {
                    id: position.id.clone(),
                    message: e.to_string(),
                })?;
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    const SNAPSHOT: &str = r#"{
        "positions": [{
            "id": "pos-1",
            "symbol": "SPY",
            "strategy": "strangle",
            "legs": [
                {"right": "PUT", "strike": "380", "expiration": "2026-11-20", "quantity": -1},
                {"right": "CALL", "strike": "420", "expiration": "2026-11-20", "quantity": -1}
            ],
            "credit_received": "300",
            "cost_basis": "0",
            "unrealized_pnl": "30",
            "multiplier": "100",
            "entry_date": "2026-10-01"
        }],
        "account": {
            "net_liquidation": "100000",
            "daily_pnl": "-500",
            "buying_power_used": "20000",
            "buying_power_total": "100000"
        },
        "quotes": [{"symbol": "SPY", "last": "401.5"}]
    }"#;

    #[test]
    fn parses_snapshot() {
        let snapshot = PortfolioSnapshot::from_json(SNAPSHOT).unwrap();
        assert_eq!(snapshot.positions.len(), 1);
        assert_eq!(snapshot.positions[0].legs.len(), 2);
        assert_eq!(snapshot.account.daily_pnl, dec!(-500));
        assert_eq!(snapshot.quotes[0].last, dec!(401.5));
        assert!(snapshot.chains.is_empty());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SNAPSHOT.as_bytes()).unwrap();

        let snapshot = PortfolioSnapshot::load(file.path()).unwrap();
        assert_eq!(snapshot.positions[0].id, "pos-1");
    }

    #[test]
    fn missing_file_is_read_error() {
        let result = PortfolioSnapshot::load("/nonexistent/snapshot.json");
        assert!(matches!(result, Err(SnapshotError::Read { .. })));
    }

    #[test]
    fn legless_position_is_rejected() {
        let mut doc: serde_json::Value = serde_json::from_str(SNAPSHOT).unwrap();
        doc["positions"][0]["legs"] = serde_json::json!([]);

        assert!(matches!(
            PortfolioSnapshot::from_json(&doc.to_string()),
            Err(SnapshotError::InvalidPosition { .. })
        ));
    }
}
