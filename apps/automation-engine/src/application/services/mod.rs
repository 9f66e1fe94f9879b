//! Application Services
//!
//! Policy evaluators are synchronous and pure over their inputs. The
//! executor and the engine own the async side: port calls, the queue and
//! the periodic loops.

mod action_executor;
mod emergency_monitor;
mod engine;
mod entry_evaluator;
mod position_evaluator;
mod roll_analyzer;

pub use action_executor::{ActionExecutor, ExecutionError, MarketSnapshot};
pub use emergency_monitor::{EmergencyMonitor, EmergencyTrigger};
pub use engine::{
    AutomationEngine, Collaborators, EngineError, EngineStatus, TickError, TickReport,
};
pub use entry_evaluator::{
    DailyEntryCounter, EntryEvaluator, EntryOpportunity, long_dated_score, size, strangle_score,
    zero_dte_score,
};
pub use position_evaluator::PositionEvaluator;
pub use roll_analyzer::{
    Advisability, CostBenefit, RollAnalyzer, RollCandidate, RollContext, RollRecommendation,
    RollType,
};
