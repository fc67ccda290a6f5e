//! State Management Module
//!
//! Explicit store for every piece of mutable engine state: nonce counters,
//! access registry, circuit breaker and the audit event log. The executor
//! receives it by reference, so tests construct isolated instances.

mod events;
mod store;

pub use events::EventLog;
pub use store::EngineState;
