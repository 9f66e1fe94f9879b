//! Account snapshot.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Balances reported by the account source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// Net liquidation value.
    pub net_liquidation: Decimal,
    /// Profit/loss since the start of the trading day.
    pub daily_pnl: Decimal,
    /// Buying power currently committed.
    pub buying_power_used: Decimal,
    /// Total buying power.
    pub buying_power_total: Decimal,
}

impl AccountSnapshot {
    /// Percentage of buying power in use. Zero when total is zero.
    #[must_use]
    pub fn buying_power_utilization_pct(&self) -> Decimal {
        if self.buying_power_total <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.buying_power_used / self.buying_power_total * Decimal::ONE_HUNDRED
    }

    /// Daily loss as a percentage of net liquidation.
    ///
    /// Zero when the day is flat or positive, or net liquidation is not positive.
    #[must_use]
    pub fn daily_drawdown_pct(&self) -> Decimal {
        if self.daily_pnl >= Decimal::ZERO || self.net_liquidation <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.daily_pnl.abs() / self.net_liquidation * Decimal::ONE_HUNDRED
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn account(net_liq: Decimal, daily: Decimal) -> AccountSnapshot {
        AccountSnapshot {
            net_liquidation: net_liq,
            daily_pnl: daily,
            buying_power_used: dec!(30000),
            buying_power_total: dec!(100000),
        }
    }

    #[test]
    fn drawdown_for_losing_day() {
        assert_eq!(
            account(dec!(100000), dec!(-12000)).daily_drawdown_pct(),
            dec!(12)
        );
    }

    #[test]
    fn drawdown_zero_for_winning_day() {
        assert_eq!(
            account(dec!(100000), dec!(5000)).daily_drawdown_pct(),
            Decimal::ZERO
        );
    }

    #[test]
    fn drawdown_zero_without_net_liq() {
        assert_eq!(
            account(Decimal::ZERO, dec!(-5000)).daily_drawdown_pct(),
            Decimal::ZERO
        );
    }

    #[test]
    fn buying_power_utilization() {
        assert_eq!(
            account(dec!(100000), Decimal::ZERO).buying_power_utilization_pct(),
            dec!(30)
        );
    }
}
