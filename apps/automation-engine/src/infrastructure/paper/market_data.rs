//! In-memory quotes and option chains.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use rust_decimal::Decimal;

use crate::application::ports::{OptionChainError, OptionChainPort, QuoteError, QuoteSourcePort};
use crate::domain::market::{OptionChain, Quote};
use crate::domain::shared::Symbol;

/// Market data held in memory.
#[derive(Debug, Default)]
pub struct InMemoryMarketData {
    quotes: RwLock<HashMap<Symbol, Quote>>,
    chains: RwLock<HashMap<Symbol, OptionChain>>,
    outage: RwLock<Option<String>>,
}

impl InMemoryMarketData {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a quote, replacing any previous one for the symbol.
    pub fn set_quote(&self, quote: Quote) {
        self.quotes.write().insert(quote.symbol.clone(), quote);
    }

    /// Shortcut for a quote with only a last price.
    pub fn set_price(&self, symbol: &str, last: Decimal) {
        self.set_quote(Quote::new(Symbol::new(symbol), last));
    }

    /// Store a chain, replacing any previous one for the symbol.
    pub fn set_chain(&self, chain: OptionChain) {
        self.chains.write().insert(chain.symbol.clone(), chain);
    }

    /// Make every read fail with `message` until cleared with `None`.
    pub fn set_outage(&self, message: Option<&str>) {
        *self.outage.write() = message.map(str::to_string);
    }

    fn outage(&self) -> Option<String> {
        self.outage.read().clone()
    }
}

#[async_trait]
impl QuoteSourcePort for InMemoryMarketData {
    async fn get_quote(&self, symbol: &Symbol) -> Result<Quote, QuoteError> {
        if let Some(message) = self.outage() {
            return Err(QuoteError::Unavailable { message });
        }
        self.quotes
            .read()
            .get(symbol)
            .cloned()
            .ok_or_else(|| QuoteError::NotFound {
                symbol: symbol.to_string(),
            })
    }

    async fn get_quotes(&self, symbols: &[Symbol]) -> Result<Vec<Quote>, QuoteError> {
        if let Some(message) = self.outage() {
            return Err(QuoteError::Unavailable { message });
        }
        let quotes = self.quotes.read();
        Ok(symbols.iter().filter_map(|s| quotes.get(s).cloned()).collect())
    }
}

#[async_trait]
impl OptionChainPort for InMemoryMarketData {
    async fn get_chain(&self, symbol: &Symbol) -> Result<OptionChain, OptionChainError> {
        if let Some(message) = self.outage() {
            return Err(OptionChainError::Unavailable { message });
        }
        self.chains
            .read()
            .get(symbol)
            .cloned()
            .ok_or_else(|| OptionChainError::NotFound {
                symbol: symbol.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::chain_fixtures::chain;
    use crate::domain::position::fixtures::date;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn get_quote_not_found() {
        let market = InMemoryMarketData::new();
        let result = market.get_quote(&Symbol::new("SPY")).await;
        assert!(matches!(result, Err(QuoteError::NotFound { .. })));
    }

    #[tokio::test]
    async fn get_quotes_omits_unknown_symbols() {
        let market = InMemoryMarketData::new();
        market.set_price("SPY", dec!(400));
        market.set_price("VIX", dec!(18));

        let quotes = market
            .get_quotes(&[Symbol::new("SPY"), Symbol::new("QQQ")])
            .await
            .unwrap();
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].last, dec!(400));
    }

    #[tokio::test]
    async fn chain_lookup_and_outage() {
        let market = InMemoryMarketData::new();
        market.set_chain(chain("SPY", dec!(400), &[date(2026, 11, 20)]));

        let found = market.get_chain(&Symbol::new("SPY")).await.unwrap();
        assert_eq!(found.expirations.len(), 1);
        assert!(matches!(
            market.get_chain(&Symbol::new("QQQ")).await,
            Err(OptionChainError::NotFound { .. })
        ));

        market.set_outage(Some("feed down"));
        assert!(matches!(
            market.get_chain(&Symbol::new("SPY")).await,
            Err(OptionChainError::Unavailable { .. })
        ));
        assert!(market.get_quotes(&[Symbol::new("SPY")]).await.is_err());
    }
}
