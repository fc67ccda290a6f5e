//! Access Control Module
//!
//! - AccessRegistry: owner, target whitelist and relayer whitelist
//! - CircuitBreaker: global pause flag gating every submission
//!
//! All writes are owner-gated and return the audit event they produce.

mod breaker;
mod registry;

pub use breaker::CircuitBreaker;
pub use registry::AccessRegistry;
