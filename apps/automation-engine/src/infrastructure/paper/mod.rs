//! Paper adapters.
//!
//! In-memory implementations of every data port plus an order preparer that
//! records intents, so the engine runs end to end without a broker.

mod market_data;
mod order_preparer;
mod portfolio;

use std::sync::Arc;

pub use market_data::InMemoryMarketData;
pub use order_preparer::{PaperOrderPreparer, select_strikes};
pub use portfolio::InMemoryPortfolio;

use super::snapshot::PortfolioSnapshot;
use crate::application::ports::{Clock, OptionChainPort};
use crate::application::services::Collaborators;
use crate::domain::market::AccountSnapshot;
use crate::domain::position::Position;

/// A paper portfolio, market and order desk sharing one clock.
#[derive(Clone)]
pub struct PaperVenue {
    /// Positions and account.
    pub portfolio: Arc<InMemoryPortfolio>,
    /// Quotes and chains.
    pub market: Arc<InMemoryMarketData>,
    /// Recorded intents.
    pub orders: Arc<PaperOrderPreparer>,
    /// Shared clock.
    pub clock: Arc<dyn Clock>,
}

impl PaperVenue {
    /// Venue with the given book and no market data.
    #[must_use]
    pub fn new(positions: Vec<Position>, account: AccountSnapshot, clock: Arc<dyn Clock>) -> Self {
        let market = Arc::new(InMemoryMarketData::new());
        let chains: Arc<dyn OptionChainPort> = market.clone();
        Self {
            portfolio: Arc::new(InMemoryPortfolio::new(positions, account)),
            orders: Arc::new(PaperOrderPreparer::new(chains, Arc::clone(&clock))),
            market,
            clock,
        }
    }

    /// Venue seeded from a snapshot file.
    #[must_use]
    pub fn from_snapshot(snapshot: PortfolioSnapshot, clock: Arc<dyn Clock>) -> Self {
        let venue = Self::new(snapshot.positions, snapshot.account, clock);
        for quote in snapshot.quotes {
            venue.market.set_quote(quote);
        }
        for chain in snapshot.chains {
            venue.market.set_chain(chain);
        }
        venue
    }

    /// Port handles for the engine.
    #[must_use]
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            positions: self.portfolio.clone(),
            accounts: self.portfolio.clone(),
            quotes: self.market.clone(),
            chains: self.market.clone(),
            orders: self.orders.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}
