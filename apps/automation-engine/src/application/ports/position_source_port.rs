//! Position Source Port (Driven Port)
//!
//! Supplies the current open positions and account balances each cycle.

use async_trait::async_trait;

use crate::domain::market::AccountSnapshot;
use crate::domain::position::Position;

/// Position source error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PositionSourceError {
    /// Source could not be reached.
    #[error("Position source unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// Source returned data that could not be interpreted.
    #[error("Position source returned invalid data: {message}")]
    InvalidData {
        /// Error details.
        message: String,
    },
}

/// Account source error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AccountSourceError {
    /// Source could not be reached.
    #[error("Account source unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },
}

/// Port for reading open positions.
#[async_trait]
pub trait PositionSourcePort: Send + Sync {
    /// Latest snapshot of every open position.
    async fn get_positions(&self) -> Result<Vec<Position>, PositionSourceError>;
}

/// Port for reading account balances.
#[async_trait]
pub trait AccountSourcePort: Send + Sync {
    /// Latest account snapshot.
    async fn get_account(&self) -> Result<AccountSnapshot, AccountSourceError>;
}
