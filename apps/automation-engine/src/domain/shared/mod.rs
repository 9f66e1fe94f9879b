//! Shared Domain Types
//!
//! Value objects and errors shared across the domain modules.

pub mod errors;
mod symbol;

pub use errors::DomainError;
pub use symbol::Symbol;
