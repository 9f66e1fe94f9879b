//! Automation Engine
//!
//! Owns the action queue and runs two periodic loops over it:
//!
//! - regular cadence: position evaluation, entry scanning, queue drain
//! - fast cadence: emergency checks, with an in-tick drain when one fires
//!
//! Both loops take the same async tick gate, so ticks never interleave.
//! Queue state sits behind a synchronous lock that is only held between
//! awaits. Every commit first checks the halted flag, so a tick still in
//! flight when `stop()` is called cannot change anything afterwards.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::action_executor::{ActionExecutor, MarketSnapshot};
use super::emergency_monitor::EmergencyMonitor;
use super::entry_evaluator::{DailyEntryCounter, EntryEvaluator, EntryOpportunity};
use super::position_evaluator::PositionEvaluator;
use super::roll_analyzer::RollAnalyzer;
use crate::application::ports::{
    AccountSourceError, AccountSourcePort, Clock, OptionChainPort, OrderPreparationPort,
    PositionSourceError, PositionSourcePort, QuoteError, QuoteSourcePort,
};
use crate::config::{Config, ConfigError, validate_config};
use crate::domain::action::{
    ActionQueue, ActionVerb, EnqueueOutcome, EntryIntent, ExecutionKey, PendingAction,
    execution_key_for,
};
use crate::domain::events::AutomationEvent;
use crate::domain::market::{MarketConditions, Quote};
use crate::domain::position::{OptionLeg, Position};
use crate::domain::shared::Symbol;
use crate::observability::metrics;

/// External collaborators the engine consumes.
#[derive(Clone)]
pub struct Collaborators {
    /// Open positions.
    pub positions: Arc<dyn PositionSourcePort>,
    /// Account balances.
    pub accounts: Arc<dyn AccountSourcePort>,
    /// Latest quotes.
    pub quotes: Arc<dyn QuoteSourcePort>,
    /// Option chains.
    pub chains: Arc<dyn OptionChainPort>,
    /// Order intents and strike selection.
    pub orders: Arc<dyn OrderPreparationPort>,
    /// Wall clock.
    pub clock: Arc<dyn Clock>,
}

/// Snapshot returned by [`AutomationEngine::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineStatus {
    /// Regular-cadence position management.
    pub position_management_enabled: bool,
    /// Fast-cadence emergency checks.
    pub emergency_monitor_enabled: bool,
    /// Automated entries on the regular cadence.
    pub auto_entry_enabled: bool,
    /// Loops are active.
    pub running: bool,
    /// Actions waiting in the queue.
    pub queue_depth: usize,
    /// Executions still inside the cool-down window.
    pub cooling_down: usize,
}

/// Engine lifecycle errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// `start()` called while loops are active.
    #[error("automation engine is already running")]
    AlreadyRunning,

    /// Configuration rejected at construction.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Reasons a tick was abandoned.
#[derive(Debug, Error)]
pub enum TickError {
    /// Position source failed.
    #[error("position fetch failed: {0}")]
    Positions(#[from] PositionSourceError),

    /// Account source failed.
    #[error("account fetch failed: {0}")]
    Account(#[from] AccountSourceError),

    /// Quote source failed.
    #[error("quote fetch failed: {0}")]
    Quotes(#[from] QuoteError),

    /// The engine was stopped while the tick was in flight.
    #[error("automation engine is stopped")]
    Halted,
}

impl TickError {
    const fn status(&self) -> &'static str {
        match self {
            Self::Halted => "halted",
            _ => "error",
        }
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Positions fetched.
    pub positions: usize,
    /// Actions that entered the queue.
    pub queued: usize,
    /// Actions skipped as duplicates or for positions cooling down.
    pub skipped: usize,
    /// Actions executed successfully.
    pub executed: usize,
    /// Failed actions put back on the queue.
    pub requeued: usize,
    /// Failed emergency actions dropped.
    pub dropped: usize,
    /// Entry signals generated.
    pub entry_signals: usize,
    /// Emergency checks that fired.
    pub emergency_reasons: Vec<String>,
}

#[derive(Debug, Default)]
struct EngineState {
    queue: ActionQueue,
    entries: DailyEntryCounter,
}

#[derive(Debug, Clone, Copy)]
enum Cadence {
    Regular,
    Emergency,
}

impl Cadence {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Emergency => "emergency",
        }
    }
}

struct EngineInner {
    config: Config,
    ports: Collaborators,
    time_zone: Tz,
    evaluator: PositionEvaluator,
    emergency: EmergencyMonitor,
    entries: EntryEvaluator,
    executor: ActionExecutor,
    state: Mutex<EngineState>,
    tick_gate: tokio::sync::Mutex<()>,
    halted: AtomicBool,
    shutdown: Mutex<Option<CancellationToken>>,
    events: broadcast::Sender<AutomationEvent>,
}

/// Position automation engine.
///
/// Cheap to clone; clones share the same queue and loops.
#[derive(Clone)]
pub struct AutomationEngine {
    inner: Arc<EngineInner>,
}

impl AutomationEngine {
    /// Build an engine from a configuration and its collaborators.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Config` if the configuration does not validate.
    pub fn new(config: Config, ports: Collaborators) -> Result<Self, EngineError> {
        validate_config(&config)?;

        let entries = EntryEvaluator::new(config.entry.clone(), config.correlation_groups.clone())?;
        let analyzer = RollAnalyzer::new(
            config.roll.clone(),
            config.management.management_dte,
            config.management.tested_buffer_pct,
        );
        let executor = ActionExecutor::new(
            Arc::clone(&ports.orders),
            Arc::clone(&ports.chains),
            analyzer,
            config.management.tested_buffer_pct,
        );
        let cooldown = config.engine.cooldown()?;
        let (events, _) = broadcast::channel(config.engine.event_capacity);

        Ok(Self {
            inner: Arc::new(EngineInner {
                time_zone: entries.time_zone(),
                evaluator: PositionEvaluator::new(config.management.clone()),
                emergency: EmergencyMonitor::new(config.emergency.clone()),
                entries,
                executor,
                state: Mutex::new(EngineState {
                    queue: ActionQueue::new(cooldown),
                    entries: DailyEntryCounter::default(),
                }),
                tick_gate: tokio::sync::Mutex::new(()),
                halted: AtomicBool::new(false),
                shutdown: Mutex::new(None),
                events,
                config,
                ports,
            }),
        })
    }

    /// Subscribe to engine events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AutomationEvent> {
        self.inner.events.subscribe()
    }

    /// Current flags and queue counters.
    #[must_use]
    pub fn status(&self) -> EngineStatus {
        let inner = &self.inner;
        let now = inner.ports.clock.now();
        let (queue_depth, cooling_down) = {
            let state = inner.state.lock();
            (state.queue.len(), state.queue.cooling_down_count(now))
        };

        EngineStatus {
            position_management_enabled: inner.config.engine.position_management_enabled,
            emergency_monitor_enabled: inner.config.engine.emergency_monitor_enabled,
            auto_entry_enabled: inner.config.engine.auto_entry_enabled,
            running: inner.shutdown.lock().is_some(),
            queue_depth,
            cooling_down,
        }
    }

    /// Spawn the periodic loops.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::AlreadyRunning` if the loops are already active.
    pub fn start(&self) -> Result<(), EngineError> {
        let inner = &self.inner;
        let token = {
            let mut shutdown = inner.shutdown.lock();
            if shutdown.is_some() {
                return Err(EngineError::AlreadyRunning);
            }
            let token = CancellationToken::new();
            *shutdown = Some(token.clone());
            token
        };
        inner.halted.store(false, Ordering::SeqCst);

        let engine = &inner.config.engine;
        if engine.position_management_enabled || engine.auto_entry_enabled {
            spawn_loop(
                Arc::clone(inner),
                Cadence::Regular,
                Duration::from_secs(engine.regular_interval_secs),
                token.clone(),
            );
        }
        if engine.emergency_monitor_enabled {
            spawn_loop(
                Arc::clone(inner),
                Cadence::Emergency,
                Duration::from_secs(engine.emergency_interval_secs),
                token,
            );
        }

        tracing::info!(
            regular_interval_secs = engine.regular_interval_secs,
            emergency_interval_secs = engine.emergency_interval_secs,
            position_management = engine.position_management_enabled,
            emergency_monitor = engine.emergency_monitor_enabled,
            auto_entry = engine.auto_entry_enabled,
            "Automation engine started"
        );
        inner.publish(AutomationEvent::EngineStarted {
            reason: "started".to_string(),
            timestamp: inner.ports.clock.now(),
        });
        Ok(())
    }

    /// Cancel both loops. Ticks already in flight finish without committing.
    pub fn stop(&self) {
        let inner = &self.inner;
        inner.halted.store(true, Ordering::SeqCst);

        let Some(token) = inner.shutdown.lock().take() else {
            return;
        };
        token.cancel();

        tracing::info!("Automation engine stopped");
        inner.publish(AutomationEvent::EngineStopped {
            reason: "stopped".to_string(),
            timestamp: inner.ports.clock.now(),
        });
    }

    /// Run one regular-cadence tick now.
    ///
    /// # Errors
    ///
    /// Returns `TickError` if a data fetch failed or the engine was stopped;
    /// nothing from the abandoned tick is committed.
    pub async fn run_regular_tick(&self) -> Result<TickReport, TickError> {
        self.inner.timed(Cadence::Regular).await
    }

    /// Run one emergency-cadence tick now.
    ///
    /// # Errors
    ///
    /// Returns `TickError` if a data fetch failed or the engine was stopped.
    pub async fn run_emergency_tick(&self) -> Result<TickReport, TickError> {
        self.inner.timed(Cadence::Emergency).await
    }
}

fn spawn_loop(inner: Arc<EngineInner>, cadence: Cadence, period: Duration, shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = inner.timed(cadence).await {
                        tracing::warn!(cadence = cadence.as_str(), error = %e, "Tick abandoned");
                    }
                }
                () = shutdown.cancelled() => {
                    tracing::info!(cadence = cadence.as_str(), "Automation loop shutting down");
                    break;
                }
            }
        }
    });
}

impl EngineInner {
    async fn timed(&self, cadence: Cadence) -> Result<TickReport, TickError> {
        let _gate = self.tick_gate.lock().await;
        let started = Instant::now();

        let result = match cadence {
            Cadence::Regular => self.regular_tick().await,
            Cadence::Emergency => self.emergency_tick().await,
        };

        let status = result.as_ref().map_or_else(TickError::status, |_| "ok");
        metrics::record_tick(cadence.as_str(), status, started.elapsed().as_secs_f64());
        result
    }

    fn local_today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.time_zone).date_naive()
    }

    fn ensure_running(&self) -> Result<(), TickError> {
        if self.halted.load(Ordering::SeqCst) {
            Err(TickError::Halted)
        } else {
            Ok(())
        }
    }

    fn publish(&self, event: AutomationEvent) {
        tracing::info!(
            event = event.kind(),
            symbol = event.symbol().map(Symbol::as_str),
            reason = %event.reason(),
            "Automation event"
        );
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    async fn regular_tick(&self) -> Result<TickReport, TickError> {
        let cfg = &self.config;
        let now = self.ports.clock.now();
        let today = self.local_today(now);

        let positions = self.ports.positions.get_positions().await?;
        let account = self.ports.accounts.get_account().await?;
        let quotes = self.ports.quotes.get_quotes(&self.quote_symbols(&positions)).await?;
        let snapshot = self.market_snapshot(&quotes, today);

        let mut report = TickReport {
            positions: positions.len(),
            ..TickReport::default()
        };

        let mut actions = Vec::new();
        if cfg.engine.position_management_enabled {
            let state = self.state.lock();
            actions = self.evaluator.evaluate_all(&positions, &snapshot.prices, today, |p| {
                state.queue.is_cooling_down(&execution_key_for(p), now)
            });
        }

        let mut entries = Vec::new();
        if cfg.engine.auto_entry_enabled {
            let conditions = MarketConditions::build(
                find_quote(&quotes, &cfg.engine.volatility_symbol),
                find_quote(&quotes, &cfg.engine.benchmark_symbol),
                &positions,
                &account,
                &cfg.correlation_groups,
                &cfg.entry.regime,
                cfg.entry.trend_threshold_pct,
            );
            let entries_today = self.state.lock().entries.count_on(today);
            let local_now = now.with_timezone(&self.time_zone);
            for opportunity in self.entries.evaluate(&conditions, local_now, entries_today) {
                if let Some(intent) = self.select_strikes(&opportunity).await {
                    entries.push((opportunity, intent));
                }
            }
        }

        self.ensure_running()?;
        let mut signals = Vec::new();
        {
            let mut state = self.state.lock();
            state.queue.prune(now);

            for action in actions {
                enqueue(&mut state.queue, action, now, &mut report);
            }

            for (opportunity, intent) in entries {
                let action = PendingAction::entry(intent, cfg.entry.priority, opportunity.reason.clone());
                if enqueue(&mut state.queue, action, now, &mut report) {
                    state.entries.record(today);
                    report.entry_signals += 1;
                    metrics::record_entry_signal(&opportunity.strategy.to_string());
                    signals.push(AutomationEvent::EntrySignalGenerated {
                        symbol: opportunity.symbol,
                        strategy: opportunity.strategy,
                        score: opportunity.score,
                        quantity: opportunity.quantity,
                        reason: opportunity.reason,
                        timestamp: now,
                    });
                }
            }
        }
        for event in signals {
            self.publish(event);
        }

        self.drain(&snapshot, &mut report).await?;

        tracing::debug!(
            positions = report.positions,
            queued = report.queued,
            executed = report.executed,
            requeued = report.requeued,
            entry_signals = report.entry_signals,
            "Regular tick complete"
        );
        Ok(report)
    }

    async fn emergency_tick(&self) -> Result<TickReport, TickError> {
        let now = self.ports.clock.now();
        let today = self.local_today(now);

        let positions = self.ports.positions.get_positions().await?;
        let account = self.ports.accounts.get_account().await?;
        // Quotes only feed the spike check and any drain; losing them must
        // not block drawdown or concentration checks.
        let quotes = match self.ports.quotes.get_quotes(&self.quote_symbols(&positions)).await {
            Ok(quotes) => quotes,
            Err(e) => {
                tracing::warn!(error = %e, "Quote fetch failed, volatility check disabled this tick");
                Vec::new()
            }
        };
        let snapshot = self.market_snapshot(&quotes, today);

        let mut report = TickReport {
            positions: positions.len(),
            ..TickReport::default()
        };

        let occupancy = self.config.correlation_groups.occupancy(&positions);
        let triggers = self.emergency.check(&account, snapshot.volatility, &occupancy);
        if triggers.is_empty() {
            return Ok(report);
        }

        for trigger in &triggers {
            metrics::record_emergency_trigger(trigger.label());
        }
        report.emergency_reasons = triggers.iter().map(ToString::to_string).collect();
        tracing::warn!(
            reasons = %report.emergency_reasons.join("; "),
            positions = positions.len(),
            "Emergency triggered"
        );

        let actions = self.emergency.emergency_actions(&positions, &triggers, today);

        self.ensure_running()?;
        {
            let mut state = self.state.lock();
            for action in actions {
                enqueue(&mut state.queue, action, now, &mut report);
            }
        }
        self.publish(AutomationEvent::EmergencyTriggered {
            reasons: report.emergency_reasons.clone(),
            positions: report.queued,
            timestamp: now,
        });

        self.drain(&snapshot, &mut report).await?;
        Ok(report)
    }

    /// Execute everything queued, most urgent first.
    async fn drain(&self, snapshot: &MarketSnapshot, report: &mut TickReport) -> Result<(), TickError> {
        self.ensure_running()?;
        let actions = self.state.lock().queue.take_sorted();
        // Positions acted on earlier in this drain, and whether they were closed.
        let mut acted: HashMap<ExecutionKey, bool> = HashMap::new();

        for action in actions {
            let key = action.execution_key();
            let superseded = acted
                .get(&key)
                .is_some_and(|closed| *closed || !action.action_type.is_emergency());
            if superseded {
                tracing::info!(
                    symbol = %action.symbol(),
                    action_type = %action.action_type,
                    "Position already acted on, skipping"
                );
                report.skipped += 1;
                metrics::record_action_skipped(action.action_type.as_str(), "already_acted");
                continue;
            }

            let result = self
                .executor
                .execute(&action, snapshot, self.ports.clock.now())
                .await;

            if self.halted.load(Ordering::SeqCst) {
                tracing::info!(
                    symbol = %action.symbol(),
                    action_type = %action.action_type,
                    "Engine stopped mid-drain, discarding remaining results"
                );
                return Err(TickError::Halted);
            }

            let now = self.ports.clock.now();
            let action_type = action.action_type.as_str();
            match result {
                Ok(events) => {
                    self.state.lock().queue.mark_executed(&action, now);
                    let closed = action.verb == ActionVerb::Close;
                    acted.entry(key).and_modify(|c| *c |= closed).or_insert(closed);
                    report.executed += 1;
                    metrics::record_action_executed(action_type);
                    for event in events {
                        self.publish(event);
                    }
                }
                Err(e) if action.action_type.is_emergency() => {
                    tracing::error!(
                        symbol = %action.symbol(),
                        action_type,
                        error = %e,
                        "Emergency action failed, dropping"
                    );
                    report.dropped += 1;
                    metrics::record_action_failed(action_type, false);
                }
                Err(e) => {
                    tracing::warn!(
                        symbol = %action.symbol(),
                        action_type,
                        error = %e,
                        "Action failed, requeueing"
                    );
                    if self.state.lock().queue.requeue(action) {
                        report.requeued += 1;
                    }
                    metrics::record_action_failed(action_type, true);
                }
            }
        }

        let (depth, cooling) = {
            let state = self.state.lock();
            let now = self.ports.clock.now();
            (state.queue.len(), state.queue.cooling_down_count(now))
        };
        metrics::update_queue_gauges(depth, cooling);
        Ok(())
    }

    /// Position underlyings plus the volatility and benchmark symbols.
    fn quote_symbols(&self, positions: &[Position]) -> Vec<Symbol> {
        let mut symbols: BTreeSet<Symbol> = positions.iter().map(|p| p.symbol.clone()).collect();
        symbols.insert(self.config.engine.volatility_symbol.clone());
        symbols.insert(self.config.engine.benchmark_symbol.clone());
        symbols.into_iter().collect()
    }

    fn market_snapshot(&self, quotes: &[Quote], today: NaiveDate) -> MarketSnapshot {
        let prices: HashMap<Symbol, Decimal> = quotes
            .iter()
            .filter(|q| q.has_price())
            .map(|q| (q.symbol.clone(), q.last))
            .collect();
        let volatility = prices.get(&self.config.engine.volatility_symbol).copied();
        MarketSnapshot {
            today,
            prices,
            volatility,
        }
    }

    /// Resolve strikes for an opportunity; `None` skips it.
    async fn select_strikes(&self, opportunity: &EntryOpportunity) -> Option<EntryIntent> {
        let selection = match self.ports.orders.find_optimal_strikes(&opportunity.request).await {
            Ok(Some(selection)) => selection,
            Ok(None) => {
                tracing::info!(
                    symbol = %opportunity.symbol,
                    strategy = %opportunity.strategy,
                    "No strikes found, skipping entry"
                );
                return None;
            }
            Err(e) => {
                tracing::warn!(
                    symbol = %opportunity.symbol,
                    strategy = %opportunity.strategy,
                    error = %e,
                    "Strike selection failed, skipping entry"
                );
                return None;
            }
        };

        let lots = i32::try_from(opportunity.quantity).unwrap_or(i32::MAX);
        let legs = selection
            .legs
            .iter()
            .map(|leg| OptionLeg::new(leg.right, leg.strike, leg.expiration, leg.quantity.saturating_mul(lots)))
            .collect();

        Some(EntryIntent {
            symbol: opportunity.symbol.clone(),
            strategy: opportunity.strategy,
            legs,
            expiration: selection.expiration,
            quantity: opportunity.quantity,
            limit_price: selection.limit_price,
            score: opportunity.score,
        })
    }
}

/// Enqueue with logging and metrics. True when the action was queued.
fn enqueue(queue: &mut ActionQueue, action: PendingAction, now: DateTime<Utc>, report: &mut TickReport) -> bool {
    let action_type = action.action_type.as_str();
    let symbol = action.symbol().clone();
    let priority = action.priority;

    match queue.enqueue(action, now) {
        EnqueueOutcome::Queued => {
            tracing::info!(symbol = %symbol, action_type, priority, "Action queued");
            report.queued += 1;
            metrics::record_action_queued(action_type);
            true
        }
        EnqueueOutcome::Duplicate => {
            tracing::debug!(symbol = %symbol, action_type, "Duplicate action ignored");
            report.skipped += 1;
            metrics::record_action_skipped(action_type, "duplicate");
            false
        }
        EnqueueOutcome::CoolingDown => {
            tracing::debug!(symbol = %symbol, action_type, "Position cooling down, action ignored");
            report.skipped += 1;
            metrics::record_action_skipped(action_type, "cooling_down");
            false
        }
    }
}

fn find_quote<'a>(quotes: &'a [Quote], symbol: &Symbol) -> Option<&'a Quote> {
    quotes.iter().find(|q| &q.symbol == symbol)
}
