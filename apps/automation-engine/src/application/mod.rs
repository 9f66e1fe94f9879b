//! Application Layer
//!
//! Orchestrates the domain through the ports:
//!
//! - **Ports**: Interfaces for positions, account, quotes, chains, orders, time
//! - **Services**: Evaluators, roll analyzer, executor, and the engine loops

pub mod ports;
pub mod services;
