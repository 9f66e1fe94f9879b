//! Market Data Ports (Driven Ports)
//!
//! Quotes for underlyings and indices, and option chains for roll and
//! entry strike selection.

use async_trait::async_trait;

use crate::domain::market::{OptionChain, Quote};
use crate::domain::shared::Symbol;

/// Quote source error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QuoteError {
    /// Source could not be reached.
    #[error("Quote source unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// No quote for the symbol.
    #[error("No quote for {symbol}")]
    NotFound {
        /// Requested symbol.
        symbol: String,
    },
}

/// Option chain source error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OptionChainError {
    /// Source could not be reached.
    #[error("Option chain source unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// No chain listed for the symbol.
    #[error("No option chain for {symbol}")]
    NotFound {
        /// Requested symbol.
        symbol: String,
    },
}

/// Port for latest quotes.
#[async_trait]
pub trait QuoteSourcePort: Send + Sync {
    /// Latest quote for one symbol.
    async fn get_quote(&self, symbol: &Symbol) -> Result<Quote, QuoteError>;

    /// Latest quotes for many symbols. Symbols without a quote are omitted.
    async fn get_quotes(&self, symbols: &[Symbol]) -> Result<Vec<Quote>, QuoteError>;
}

/// Port for option chains.
#[async_trait]
pub trait OptionChainPort: Send + Sync {
    /// Strike ladders for every listed expiration of `symbol`.
    async fn get_chain(&self, symbol: &Symbol) -> Result<OptionChain, OptionChainError>;
}
