//! Execution Host Module
//!
//! The environment that runs dispatched operations. The engine only needs
//! a clock, an atomicity primitive (checkpoint / commit / revert) and a way
//! to make an opaque call. Everything about what a call *does* belongs to
//! the host.

mod in_memory;

pub use in_memory::{CallHandler, InMemoryHost};

use ethers::types::{Address, Bytes};
use serde::{Deserialize, Serialize};

/// Opaque identifier returned by `ExecutionHost::checkpoint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(pub usize);

/// One operation as seen by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchCall {
    /// Engine account making the call
    pub caller: Address,
    /// User whose plan authorized the call
    pub on_behalf_of: Address,
    pub target: Address,
    pub payload: Bytes,
}

/// Surrounding execution environment.
///
/// `dispatch` returns the call's return data on success and its revert
/// payload on failure. Effects of dispatched calls must be undone by
/// `revert` and made permanent by `commit`.
pub trait ExecutionHost {
    /// Current time as a unix timestamp in seconds
    fn now(&self) -> u64;

    fn checkpoint(&mut self) -> Checkpoint;

    fn commit(&mut self, checkpoint: Checkpoint);

    fn revert(&mut self, checkpoint: Checkpoint);

    fn dispatch(&mut self, call: &DispatchCall) -> Result<Bytes, Bytes>;
}
