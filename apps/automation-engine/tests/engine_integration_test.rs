//! Engine Integration Tests
//!
//! Drives whole ticks against the paper venue with a manual clock:
//! position management, emergency flattening, entry gating and cool-down.

// Allow unwrap in tests - tests should panic on unexpected errors
#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::broadcast;

use automation_engine::application::ports::IntentPurpose;
use automation_engine::domain::market::{AccountSnapshot, ChainExpiration, OptionChain, Quote, StrikeQuote};
use automation_engine::domain::position::{OptionLeg, OptionRight, Position, StrategyKind};
use automation_engine::domain::shared::Symbol;
use automation_engine::{
    ActionType, AutomationEngine, AutomationEvent, Config, ManualClock, PaperVenue,
    load_config_from_string,
};

// =============================================================================
// Fixtures
// =============================================================================

/// Monday 2026-10-19, 11:00 New York.
fn monday() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 15, 0, 0).unwrap()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn in_days(days: i64) -> NaiveDate {
    today() + Duration::days(days)
}

fn account(daily_pnl: Decimal) -> AccountSnapshot {
    AccountSnapshot {
        net_liquidation: dec!(100000),
        daily_pnl,
        buying_power_used: dec!(20000),
        buying_power_total: dec!(100000),
    }
}

fn strangle(id: &str, symbol: &str, expiration: NaiveDate, credit: Decimal, pnl: Decimal) -> Position {
    Position {
        id: id.to_string(),
        symbol: Symbol::new(symbol),
        strategy: StrategyKind::Strangle,
        legs: vec![
            OptionLeg::short(OptionRight::Put, dec!(380), expiration, 1),
            OptionLeg::short(OptionRight::Call, dec!(420), expiration, 1),
        ],
        credit_received: credit,
        cost_basis: Decimal::ZERO,
        unrealized_pnl: pnl,
        multiplier: dec!(100),
        entry_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
    }
}

/// Strikes every 5 points around `spot`, |delta| falling 0.04 per step
/// from 0.50, premium falling 0.45 per step from 6.00.
fn ladder(expiration: NaiveDate, spot: Decimal) -> ChainExpiration {
    let mut strikes = Vec::new();
    for step in -12i64..=12 {
        let strike = spot + Decimal::from(step * 5);
        let distance = Decimal::from(step.abs());
        let otm_delta = (dec!(0.50) - distance * dec!(0.04)).max(dec!(0.02));
        let premium = (dec!(6.00) - distance * dec!(0.45)).max(dec!(0.10));
        let itm_premium = premium + distance * dec!(5);

        let (call_delta, call_premium, put_delta, put_premium) = if step >= 0 {
            (otm_delta, premium, -(Decimal::ONE - otm_delta), itm_premium)
        } else {
            (Decimal::ONE - otm_delta, itm_premium, -otm_delta, premium)
        };

        for (right, delta, mid) in [
            (OptionRight::Call, call_delta, call_premium),
            (OptionRight::Put, put_delta, put_premium),
        ] {
            strikes.push(StrikeQuote {
                strike,
                right,
                bid: mid - dec!(0.05),
                ask: mid + dec!(0.05),
                delta,
                theta: -(mid * dec!(0.02)),
                implied_volatility: None,
            });
        }
    }
    ChainExpiration { expiration, strikes }
}

fn chain(symbol: &str, spot: Decimal, expirations: &[NaiveDate]) -> OptionChain {
    OptionChain {
        symbol: Symbol::new(symbol),
        underlying_price: Some(spot),
        expirations: expirations.iter().map(|e| ladder(*e, spot)).collect(),
    }
}

struct Harness {
    clock: Arc<ManualClock>,
    venue: PaperVenue,
    engine: AutomationEngine,
    events: broadcast::Receiver<AutomationEvent>,
}

fn harness(config: Config, positions: Vec<Position>, now: DateTime<Utc>) -> Harness {
    let clock = Arc::new(ManualClock::new(now));
    let venue = PaperVenue::new(positions, account(dec!(0)), clock.clone());
    venue.market.set_price("SPY", dec!(400));
    let engine = AutomationEngine::new(config, venue.collaborators()).unwrap();
    let events = engine.subscribe();
    Harness {
        clock,
        venue,
        engine,
        events,
    }
}

fn drain_events(events: &mut broadcast::Receiver<AutomationEvent>) -> Vec<AutomationEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

// =============================================================================
// Position management
// =============================================================================

#[tokio::test]
async fn management_window_rolls_to_best_expiration() {
    let mut h = harness(
        Config::default(),
        vec![strangle("pos-1", "SPY", in_days(15), dec!(400), dec!(40))],
        monday(),
    );
    h.venue
        .market
        .set_chain(chain("SPY", dec!(400), &[in_days(35), in_days(50), in_days(58)]));

    let report = h.engine.run_regular_tick().await.unwrap();
    assert_eq!(report.queued, 1);
    assert_eq!(report.executed, 1);

    let events = drain_events(&mut h.events);
    assert_eq!(events.len(), 2);
    match &events[0] {
        AutomationEvent::PositionRolled {
            new_expiration,
            net_credit,
            ..
        } => {
            assert_eq!(*new_expiration, in_days(50));
            assert_eq!(*net_credit, dec!(165));
        }
        other => panic!("expected PositionRolled, got {other:?}"),
    }
    assert!(matches!(
        &events[1],
        AutomationEvent::ActionExecuted { action_type: ActionType::Manage21Dte, .. }
    ));

    let intents = h.venue.orders.intents();
    assert_eq!(intents.len(), 2);
    assert_eq!(intents[0].purpose, IntentPurpose::Close);
    assert_eq!(intents[1].purpose, IntentPurpose::Open);
    assert_eq!(intents[1].legs[0].strike, dec!(360));
}

#[tokio::test]
async fn losing_position_near_expiry_closes_once() {
    let mut h = harness(
        Config::default(),
        vec![strangle("pos-1", "SPY", in_days(5), dec!(400), dec!(-120))],
        monday(),
    );

    let report = h.engine.run_regular_tick().await.unwrap();
    // DEFENSIVE_URGENT and MANAGE_21DTE both queue; the urgent close runs first
    // and the roll finds the position already handled.
    assert_eq!(report.queued, 2);
    assert_eq!(report.executed, 1);
    assert_eq!(report.skipped, 1);

    let events = drain_events(&mut h.events);
    assert!(matches!(events[0], AutomationEvent::PositionClosed { .. }));
    assert!(matches!(
        &events[1],
        AutomationEvent::ActionExecuted { action_type: ActionType::DefensiveUrgent, .. }
    ));
    assert_eq!(h.venue.orders.intents().len(), 1);
}

#[tokio::test]
async fn cool_down_suppresses_repeat_actions() {
    let h = harness(
        Config::default(),
        vec![strangle("pos-1", "SPY", in_days(30), dec!(400), dec!(240))],
        monday(),
    );

    assert_eq!(h.engine.run_regular_tick().await.unwrap().executed, 1);
    assert_eq!(h.engine.run_regular_tick().await.unwrap().queued, 0);

    h.clock.advance(Duration::minutes(59));
    assert_eq!(h.engine.run_regular_tick().await.unwrap().queued, 0);

    h.clock.advance(Duration::minutes(2));
    assert_eq!(h.engine.run_regular_tick().await.unwrap().executed, 1);
    assert_eq!(h.venue.orders.intents().len(), 2);
}

// =============================================================================
// Emergency
// =============================================================================

#[tokio::test]
async fn drawdown_flattens_everything_in_tick() {
    let mut h = harness(
        Config::default(),
        vec![
            strangle("pos-1", "SPY", in_days(30), dec!(400), dec!(100)),
            strangle("pos-2", "QQQ", in_days(0), dec!(400), dec!(-50)),
            strangle("pos-3", "IWM", in_days(40), dec!(400), dec!(-80)),
        ],
        monday(),
    );
    h.venue.portfolio.set_account(account(dec!(-12000)));

    let report = h.engine.run_emergency_tick().await.unwrap();
    assert_eq!(report.emergency_reasons.len(), 1);
    assert_eq!(report.queued, 3);
    assert_eq!(report.executed, 3);
    assert_eq!(h.engine.status().queue_depth, 0);

    let events = drain_events(&mut h.events);
    match &events[0] {
        AutomationEvent::EmergencyTriggered { reasons, positions, .. } => {
            assert_eq!(*positions, 3);
            assert!(reasons[0].contains("drawdown"));
        }
        other => panic!("expected EmergencyTriggered, got {other:?}"),
    }

    // Expiring first, then losing, then the rest.
    let closed: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            AutomationEvent::PositionClosed { symbol, .. } => Some(symbol.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(closed, vec!["QQQ", "IWM", "SPY"]);

    let intents = h.venue.orders.intents();
    assert_eq!(intents.len(), 3);
    assert!(intents.iter().all(|i| i.purpose == IntentPurpose::Close));
}

#[tokio::test]
async fn emergency_flattens_position_defended_inside_cool_down() {
    let mut h = harness(
        Config::default(),
        vec![strangle("pos-1", "SPY", in_days(40), dec!(400), dec!(0))],
        monday(),
    );
    h.venue.market.set_price("SPY", dec!(385));
    h.venue.market.set_chain(chain("SPY", dec!(385), &[in_days(40)]));

    let report = h.engine.run_regular_tick().await.unwrap();
    assert_eq!(report.executed, 1);
    let events = drain_events(&mut h.events);
    assert!(matches!(events[0], AutomationEvent::PositionDefended { .. }));

    // Still tested and still inside the cool-down when the drawdown hits.
    h.clock.advance(Duration::minutes(10));
    h.venue.portfolio.set_account(account(dec!(-12000)));

    let report = h.engine.run_emergency_tick().await.unwrap();
    assert_eq!(report.emergency_reasons, vec!["daily drawdown 12.00%".to_string()]);
    assert_eq!(report.queued, 1);
    assert_eq!(report.executed, 1);
    let events = drain_events(&mut h.events);
    assert!(events.iter().any(|e| matches!(
        e,
        AutomationEvent::ActionExecuted { action_type: ActionType::EmergencyClose, .. }
    )));

    // The emergency close itself is not repeated on the next fast tick.
    h.clock.advance(Duration::seconds(5));
    let report = h.engine.run_emergency_tick().await.unwrap();
    assert_eq!(report.queued, 0);
    assert_eq!(report.skipped, 1);
}

#[tokio::test]
async fn volatility_spike_triggers_without_drawdown() {
    let h = harness(
        Config::default(),
        vec![strangle("pos-1", "SPY", in_days(30), dec!(400), dec!(0))],
        monday(),
    );
    h.venue.market.set_price("VIX", dec!(45));

    let report = h.engine.run_emergency_tick().await.unwrap();
    assert_eq!(report.emergency_reasons, vec!["volatility index at 45".to_string()]);
    assert_eq!(report.executed, 1);
}

// =============================================================================
// Entries
// =============================================================================

const ZERO_DTE_ONLY: &str = r"
engine:
  auto_entry_enabled: true
entry:
  long_dated:
    enabled: false
  strangle:
    enabled: false
";

fn zero_dte_harness(now: DateTime<Utc>) -> Harness {
    let config = load_config_from_string(ZERO_DTE_ONLY).unwrap();
    let h = harness(config, Vec::new(), now);
    h.venue.market.set_quote(Quote::new(Symbol::new("VIX"), dec!(18)));
    h.venue
        .market
        .set_chain(chain("SPY", dec!(400), &[NaiveDate::from_ymd_opt(2026, 10, 23).unwrap()]));
    h
}

#[tokio::test]
async fn zero_dte_enters_on_friday_after_cutoff() {
    // Friday 11:00 New York.
    let mut h = zero_dte_harness(Utc.with_ymd_and_hms(2026, 10, 23, 15, 0, 0).unwrap());

    let report = h.engine.run_regular_tick().await.unwrap();
    assert_eq!(report.entry_signals, 1);
    assert_eq!(report.executed, 1);

    let events = drain_events(&mut h.events);
    match &events[0] {
        AutomationEvent::EntrySignalGenerated {
            strategy, quantity, ..
        } => {
            assert_eq!(*strategy, StrategyKind::ZeroDte);
            assert_eq!(*quantity, 2);
        }
        other => panic!("expected EntrySignalGenerated, got {other:?}"),
    }

    let intents = h.venue.orders.intents();
    assert_eq!(intents.len(), 1);
    let strikes: Vec<(Decimal, i32)> = intents[0].legs.iter().map(|l| (l.strike, l.quantity)).collect();
    assert_eq!(
        strikes,
        vec![(dec!(350), -2), (dec!(345), 2), (dec!(450), -2), (dec!(455), 2)]
    );
    assert_eq!(intents[0].limit_price, Some(dec!(0.90)));
}

#[tokio::test]
async fn zero_dte_waits_for_cutoff_and_weekday() {
    // Friday 10:00 New York, before the 10:30 cutoff.
    let h = zero_dte_harness(Utc.with_ymd_and_hms(2026, 10, 23, 14, 0, 0).unwrap());
    assert_eq!(h.engine.run_regular_tick().await.unwrap().entry_signals, 0);

    // Thursday 11:00 New York.
    let h = zero_dte_harness(Utc.with_ymd_and_hms(2026, 10, 22, 15, 0, 0).unwrap());
    assert_eq!(h.engine.run_regular_tick().await.unwrap().entry_signals, 0);
    assert!(h.venue.orders.intents().is_empty());
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn loops_tick_until_stopped() {
    let mut config = Config::default();
    config.engine.regular_interval_secs = 1;
    let h = harness(
        config,
        vec![strangle("pos-1", "SPY", in_days(30), dec!(400), dec!(240))],
        monday(),
    );

    // Both loops tick once immediately on start.
    h.engine.start().unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    assert_eq!(h.venue.orders.intents().len(), 1);

    h.engine.stop();
    assert!(!h.engine.status().running);
    assert!(matches!(
        h.engine.run_regular_tick().await,
        Err(automation_engine::TickError::Halted)
    ));

    // Past the cool-down, a live loop would close the position again.
    h.clock.advance(Duration::hours(2));
    tokio::time::sleep(std::time::Duration::from_millis(1200)).await;
    assert_eq!(h.venue.orders.intents().len(), 1);
}
