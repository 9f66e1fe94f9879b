//! Paper order preparation.
//!
//! Records every intent instead of routing it, and picks strikes from
//! whatever chain the configured chain source returns.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::application::ports::{
    Clock, IntentPurpose, OptionChainError, OptionChainPort, OrderIntent, OrderPreparationError,
    OrderPreparationPort, RollIntent, RollRequest, StrikeRequest, StrikeSelection, closing_legs,
};
use crate::domain::action::EntryIntent;
use crate::domain::market::OptionChain;
use crate::domain::position::{OptionLeg, OptionRight, Position, StrategyKind};
use crate::domain::shared::Symbol;

/// Order preparer that keeps intents in memory.
pub struct PaperOrderPreparer {
    chains: Arc<dyn OptionChainPort>,
    clock: Arc<dyn Clock>,
    intents: Mutex<Vec<OrderIntent>>,
    rejected: Mutex<HashSet<Symbol>>,
}

impl PaperOrderPreparer {
    /// Create a preparer backed by `chains`.
    #[must_use]
    pub fn new(chains: Arc<dyn OptionChainPort>, clock: Arc<dyn Clock>) -> Self {
        Self {
            chains,
            clock,
            intents: Mutex::new(Vec::new()),
            rejected: Mutex::new(HashSet::new()),
        }
    }

    /// Refuse every request for `symbol`.
    pub fn reject_symbol(&self, symbol: &str) {
        self.rejected.lock().insert(Symbol::new(symbol));
    }

    /// Accept requests for `symbol` again.
    pub fn accept_symbol(&self, symbol: &str) {
        self.rejected.lock().remove(&Symbol::new(symbol));
    }

    /// Every intent prepared so far, oldest first.
    #[must_use]
    pub fn intents(&self) -> Vec<OrderIntent> {
        self.intents.lock().clone()
    }

    fn check(&self, symbol: &Symbol) -> Result<(), OrderPreparationError> {
        if self.rejected.lock().contains(symbol) {
            return Err(OrderPreparationError::Rejected {
                symbol: symbol.to_string(),
                reason: "symbol rejected by paper preparer".to_string(),
            });
        }
        Ok(())
    }

    fn record(&self, intent: OrderIntent) -> OrderIntent {
        tracing::info!(
            intent_id = %intent.id,
            symbol = %intent.symbol,
            purpose = ?intent.purpose,
            legs = intent.legs.len(),
            "Paper intent recorded"
        );
        self.intents.lock().push(intent.clone());
        intent
    }
}

#[async_trait]
impl OrderPreparationPort for PaperOrderPreparer {
    async fn prepare_close(
        &self,
        position: &Position,
        reason: &str,
    ) -> Result<OrderIntent, OrderPreparationError> {
        self.check(&position.symbol)?;
        tracing::debug!(symbol = %position.symbol, reason, "Preparing close");
        Ok(self.record(OrderIntent::new(
            position.symbol.clone(),
            IntentPurpose::Close,
            closing_legs(&position.legs),
            None,
            self.clock.now(),
        )))
    }

    async fn prepare_roll(&self, request: &RollRequest) -> Result<RollIntent, OrderPreparationError> {
        let symbol = &request.position.symbol;
        self.check(symbol)?;
        let now = self.clock.now();

        let close = self.record(OrderIntent::new(
            symbol.clone(),
            IntentPurpose::Close,
            closing_legs(&request.close_legs),
            None,
            now,
        ));
        let open = self.record(OrderIntent::new(
            symbol.clone(),
            IntentPurpose::Open,
            request.open_legs.clone(),
            request.limit_price,
            now,
        ));
        Ok(RollIntent { close, open })
    }

    async fn prepare_entry(&self, intent: &EntryIntent) -> Result<OrderIntent, OrderPreparationError> {
        self.check(&intent.symbol)?;
        Ok(self.record(OrderIntent::new(
            intent.symbol.clone(),
            IntentPurpose::Open,
            intent.legs.clone(),
            Some(intent.limit_price),
            self.clock.now(),
        )))
    }

    async fn find_optimal_strikes(
        &self,
        request: &StrikeRequest,
    ) -> Result<Option<StrikeSelection>, OrderPreparationError> {
        self.check(&request.symbol)?;
        let chain = match self.chains.get_chain(&request.symbol).await {
            Ok(chain) => chain,
            Err(OptionChainError::NotFound { .. }) => return Ok(None),
            Err(OptionChainError::Unavailable { message }) => {
                return Err(OrderPreparationError::Unavailable { message });
            }
        };
        Ok(select_strikes(&chain, request, self.clock.now().date_naive()))
    }
}

/// One-lot strikes for `request`.
///
/// Short legs sit at the requested |delta| on each requested right; a wing
/// width adds a long leg that far out. Long-dated requests buy the delta
/// strike instead. The limit is the net mid, positive for a credit.
#[must_use]
pub fn select_strikes(
    chain: &OptionChain,
    request: &StrikeRequest,
    today: NaiveDate,
) -> Option<StrikeSelection> {
    let ladder = match request.expiration {
        Some(date) => chain.expiration(date)?,
        None => chain.closest_to_dte(today, request.target_dte)?,
    };
    let rights: &[OptionRight] = match request.right {
        Some(OptionRight::Put) => &[OptionRight::Put],
        Some(OptionRight::Call) => &[OptionRight::Call],
        None => &[OptionRight::Put, OptionRight::Call],
    };

    let expiration = ladder.expiration;
    let mut legs = Vec::new();
    let mut net = Decimal::ZERO;

    for &right in rights {
        let primary = ladder.find_by_delta(right, request.delta)?;

        if request.strategy == StrategyKind::LongDated {
            legs.push(OptionLeg::long(right, primary.strike, expiration, 1));
            net -= primary.mid();
            continue;
        }

        legs.push(OptionLeg::short(right, primary.strike, expiration, 1));
        net += primary.mid();

        if let Some(width) = request.wing_width {
            let target = match right {
                OptionRight::Put => primary.strike - width,
                OptionRight::Call => primary.strike + width,
            };
            let wing = ladder
                .nearest_strike(right, target)
                .filter(|q| q.strike != primary.strike)?;
            legs.push(OptionLeg::long(right, wing.strike, expiration, 1));
            net -= wing.mid();
        }
    }

    Some(StrikeSelection {
        expiration,
        legs,
        limit_price: net,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::chain_fixtures::chain;
    use crate::domain::position::fixtures::{date, strangle};
    use crate::infrastructure::clock::ManualClock;
    use crate::infrastructure::paper::InMemoryMarketData;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        date(2026, 10, 19)
    }

    fn request(strategy: StrategyKind, right: Option<OptionRight>, wing: Option<Decimal>) -> StrikeRequest {
        StrikeRequest {
            symbol: Symbol::new("SPY"),
            strategy,
            target_dte: 30,
            expiration: None,
            delta: dec!(0.30),
            right,
            wing_width: wing,
        }
    }

    fn preparer(market: Arc<InMemoryMarketData>) -> PaperOrderPreparer {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 10, 19, 15, 0, 0).unwrap());
        PaperOrderPreparer::new(market, Arc::new(clock))
    }

    #[test]
    fn condor_with_wings() {
        let chain = chain("SPY", dec!(400), &[date(2026, 11, 20), date(2027, 1, 15)]);
        let selection = select_strikes(
            &chain,
            &request(StrategyKind::IronCondor, None, Some(dec!(10))),
            today(),
        )
        .unwrap();

        assert_eq!(selection.expiration, date(2026, 11, 20));
        let strikes: Vec<(OptionRight, Decimal, i32)> = selection
            .legs
            .iter()
            .map(|l| (l.right, l.strike, l.quantity))
            .collect();
        assert_eq!(
            strikes,
            vec![
                (OptionRight::Put, dec!(375), -1),
                (OptionRight::Put, dec!(365), 1),
                (OptionRight::Call, dec!(425), -1),
                (OptionRight::Call, dec!(435), 1),
            ]
        );
        // 3.75 short, 2.85 wing on each side.
        assert_eq!(selection.limit_price, dec!(1.80));
    }

    #[test]
    fn strangle_and_single_side() {
        let chain = chain("SPY", dec!(400), &[date(2026, 11, 20)]);

        let strangle = select_strikes(&chain, &request(StrategyKind::Strangle, None, None), today()).unwrap();
        assert_eq!(strangle.legs.len(), 2);
        assert!(strangle.legs.iter().all(OptionLeg::is_short));
        assert_eq!(strangle.limit_price, dec!(7.50));

        let call_only = select_strikes(
            &chain,
            &request(StrategyKind::Strangle, Some(OptionRight::Call), None),
            today(),
        )
        .unwrap();
        assert_eq!(call_only.legs.len(), 1);
        assert_eq!(call_only.legs[0].strike, dec!(425));
    }

    #[test]
    fn long_dated_buys_a_debit() {
        let chain = chain("SPY", dec!(400), &[date(2026, 11, 20), date(2027, 3, 19)]);
        let mut req = request(StrategyKind::LongDated, Some(OptionRight::Call), None);
        req.target_dte = 150;

        let selection = select_strikes(&chain, &req, today()).unwrap();
        assert_eq!(selection.expiration, date(2027, 3, 19));
        assert!(selection.legs[0].is_long());
        assert_eq!(selection.limit_price, dec!(-3.75));
    }

    #[test]
    fn missing_expiration_selects_nothing() {
        let chain = chain("SPY", dec!(400), &[date(2026, 11, 20)]);
        let mut req = request(StrategyKind::ZeroDte, None, Some(dec!(5)));
        req.expiration = Some(today());
        assert!(select_strikes(&chain, &req, today()).is_none());
    }

    #[tokio::test]
    async fn records_intents_and_honours_rejections() {
        let market = Arc::new(InMemoryMarketData::new());
        let orders = preparer(Arc::clone(&market));
        let position = strangle(date(2026, 11, 20), dec!(300), dec!(0));

        let intent = orders.prepare_close(&position, "test").await.unwrap();
        assert_eq!(intent.purpose, IntentPurpose::Close);
        assert!(intent.legs.iter().all(OptionLeg::is_long));
        assert!(!intent.submitted);

        orders.reject_symbol("SPY");
        assert!(matches!(
            orders.prepare_close(&position, "test").await,
            Err(OrderPreparationError::Rejected { .. })
        ));
        orders.accept_symbol("SPY");

        let roll = orders
            .prepare_roll(&RollRequest {
                position: position.clone(),
                close_legs: position.legs.clone(),
                open_legs: position.legs.clone(),
                limit_price: Some(dec!(0.50)),
            })
            .await
            .unwrap();
        assert_eq!(roll.open.limit_price, Some(dec!(0.50)));
        assert_eq!(orders.intents().len(), 3);
    }

    #[tokio::test]
    async fn strike_search_maps_chain_errors() {
        let market = Arc::new(InMemoryMarketData::new());
        let orders = preparer(Arc::clone(&market));
        let req = request(StrategyKind::Strangle, None, None);

        assert_eq!(orders.find_optimal_strikes(&req).await.unwrap(), None);

        market.set_chain(chain("SPY", dec!(400), &[date(2026, 11, 20)]));
        assert!(orders.find_optimal_strikes(&req).await.unwrap().is_some());

        market.set_outage(Some("feed down"));
        assert!(matches!(
            orders.find_optimal_strikes(&req).await,
            Err(OrderPreparationError::Unavailable { .. })
        ));
    }
}
