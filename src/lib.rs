//! This crate implements an authorization-and-execution engine for signed intents.
//! A user signs a compact EIP-712 digest of a plan; a whitelisted relayer later
//! submits the plan with its batch of operations, and the engine verifies and
//! executes the batch as a single all-or-nothing unit.

pub mod types; // Plans, batches, receipts and audit events.
pub mod error; // Error taxonomy shared by every component.
pub mod digest; // EIP-712 digest construction and batch commitments.
pub mod signature; // ECDSA signer recovery.
pub mod nonce; // Per-user replay protection counters.
pub mod access; // Owner, target/relayer whitelists and the circuit breaker.
pub mod state; // Explicit store holding all mutable engine state.
pub mod host; // Execution environment abstraction and an in-memory host.
pub mod executor; // The batch executor: ordered checks and atomic dispatch.
pub mod api; // JSON-RPC relayer surface.
pub mod config; // Defines and loads system configuration.

// Re-export commonly used types and configurations for easier access.
pub use types::*;
pub use error::{EngineError, NonceError, VerificationError};
pub use digest::DomainContext;
pub use nonce::NonceRegistry;
pub use access::{AccessRegistry, CircuitBreaker};
pub use state::{EngineState, EventLog};
pub use executor::{IntentEngine, Submission};
pub use config::Config;
