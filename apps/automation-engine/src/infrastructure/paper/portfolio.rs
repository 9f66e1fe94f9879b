//! In-memory position and account source.

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::application::ports::{
    AccountSourceError, AccountSourcePort, PositionSourceError, PositionSourcePort,
};
use crate::domain::market::AccountSnapshot;
use crate::domain::position::Position;

/// Portfolio held in memory, replaced wholesale by the caller.
#[derive(Debug)]
pub struct InMemoryPortfolio {
    positions: RwLock<Vec<Position>>,
    account: RwLock<AccountSnapshot>,
    outage: RwLock<Option<String>>,
}

impl InMemoryPortfolio {
    /// Create a portfolio.
    #[must_use]
    pub const fn new(positions: Vec<Position>, account: AccountSnapshot) -> Self {
        Self {
            positions: RwLock::new(positions),
            account: RwLock::new(account),
            outage: RwLock::new(None),
        }
    }

    /// Replace the open positions.
    pub fn set_positions(&self, positions: Vec<Position>) {
        *self.positions.write() = positions;
    }

    /// Replace the account snapshot.
    pub fn set_account(&self, account: AccountSnapshot) {
        *self.account.write() = account;
    }

    /// Make every read fail with `message` until cleared with `None`.
    pub fn set_outage(&self, message: Option<&str>) {
        *self.outage.write() = message.map(str::to_string);
    }
}

#[async_trait]
impl PositionSourcePort for InMemoryPortfolio {
    async fn get_positions(&self) -> Result<Vec<Position>, PositionSourceError> {
        if let Some(message) = self.outage.read().clone() {
            return Err(PositionSourceError::Unavailable { message });
        }
        Ok(self.positions.read().clone())
    }
}

#[async_trait]
impl AccountSourcePort for InMemoryPortfolio {
    async fn get_account(&self) -> Result<AccountSnapshot, AccountSourceError> {
        if let Some(message) = self.outage.read().clone() {
            return Err(AccountSourceError::Unavailable { message });
        }
        Ok(self.account.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::fixtures::{date, strangle};
    use rust_decimal_macros::dec;

    fn account() -> AccountSnapshot {
        AccountSnapshot {
            net_liquidation: dec!(100000),
            daily_pnl: dec!(0),
            buying_power_used: dec!(10000),
            buying_power_total: dec!(100000),
        }
    }

    #[tokio::test]
    async fn serves_latest_snapshot() {
        let portfolio = InMemoryPortfolio::new(Vec::new(), account());
        assert!(portfolio.get_positions().await.unwrap().is_empty());

        portfolio.set_positions(vec![strangle(date(2026, 11, 20), dec!(300), dec!(0))]);
        let positions = portfolio.get_positions().await.unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].id, "pos-strangle");
    }

    #[tokio::test]
    async fn outage_fails_both_reads() {
        let portfolio = InMemoryPortfolio::new(Vec::new(), account());
        portfolio.set_outage(Some("broker down"));

        assert!(matches!(
            portfolio.get_positions().await,
            Err(PositionSourceError::Unavailable { .. })
        ));
        assert!(portfolio.get_account().await.is_err());

        portfolio.set_outage(None);
        assert_eq!(portfolio.get_account().await.unwrap(), account());
    }
}
