//! Nonce Registry Module
//!
//! Per-user monotonic counters. This is the only replay protection the
//! engine has: a signed plan is valid for exactly the counter value it names.

mod registry;
pub use registry::NonceRegistry;
