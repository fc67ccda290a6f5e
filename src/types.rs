use ethers::types::{Address, Bytes, H256, U256};
use serde::{Deserialize, Serialize};

/// Maximum number of operations a single batch may carry.
pub const MAX_BATCH_SIZE: usize = 15;

/// The record a user signs to authorize a batch.
///
/// Only these four fields are covered by the signed digest. The operations
/// themselves are bound through `plan_hash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    /// Caller-assigned identifier, used for auditing only
    pub plan_id: H256,
    /// Commitment to the full operation list
    pub plan_hash: H256,
    /// Must equal the signer's current counter
    pub nonce: U256,
    /// Unix timestamp (seconds) after which the plan is rejected
    pub expiry: u64,
}

/// Ordered operations submitted alongside a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub targets: Vec<Address>,
    pub payloads: Vec<Bytes>,
    /// Commitment to the content-addressed batch description
    pub cid_hash: H256,
}

impl Batch {
    /// Iterate `(index, target, payload)` in submission order.
    pub fn operations(&self) -> impl Iterator<Item = (usize, Address, &Bytes)> {
        self.targets
            .iter()
            .zip(self.payloads.iter())
            .enumerate()
            .map(|(index, (target, payload))| (index, *target, payload))
    }
}

/// Returned to the submitter when a batch commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReceipt {
    pub user: Address,
    pub plan_id: H256,
    pub cid_hash: H256,
    pub submitter: Address,
    /// The nonce value consumed by this submission
    pub nonce: U256,
    pub digest: H256,
    /// Return data of each operation, in submission order
    pub results: Vec<Bytes>,
}

/// Audit events consumed by the external indexing service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum EngineEvent {
    #[serde(rename_all = "camelCase")]
    ExecutionCompleted {
        user: Address,
        plan_id: H256,
        cid_hash: H256,
        submitter: Address,
        nonce: U256,
    },
    TargetWhitelistUpdated { target: Address, allowed: bool },
    RelayerWhitelistUpdated { relayer: Address, allowed: bool },
    #[serde(rename_all = "camelCase")]
    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
    },
    Paused { by: Address },
    Unpaused { by: Address },
}

/// Lifecycle of a single submission inside the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStage {
    Idle,
    Authenticating,
    Dispatching,
    Committed,
    Aborted,
}
