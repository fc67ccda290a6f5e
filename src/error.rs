//! Error taxonomy for the engine.
//!
//! Every variant is terminal for the submission that produced it. The
//! engine never retries; the relayer decides whether to resubmit with
//! corrected inputs.

use ethers::types::{Address, Bytes, H256, U256};
use thiserror::Error;

/// Failures of signature recovery.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerificationError {
    /// Not a 65-byte r || s || v encoding, or an unknown recovery id
    #[error("Malformed signature")]
    MalformedSignature,

    /// Recovery produced no identity (invalid curve point, zero address,
    /// or a malleable high-s value)
    #[error("Invalid signature")]
    InvalidSignature,
}

/// Failures of the nonce registry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NonceError {
    #[error("Stale or future nonce: expected {expected}, got {got}")]
    StaleOrFutureNonce { expected: U256, got: U256 },
}

/// Errors surfaced by every engine entry point.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("Engine is paused")]
    EnginePaused,

    #[error("Submitter {0:?} is not a whitelisted relayer")]
    UnauthorizedRelayer(Address),

    #[error("Plan expired at {expiry}, current time {now}")]
    PlanExpired { expiry: u64, now: u64 },

    #[error("Arity mismatch: {targets} targets, {payloads} payloads")]
    ArityMismatch { targets: usize, payloads: usize },

    #[error("Invalid batch size: {0}")]
    InvalidBatchSize(usize),

    #[error("Malformed signature")]
    MalformedSignature,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Signer mismatch: expected {expected:?}, recovered {recovered:?}")]
    SignerMismatch { expected: Address, recovered: Address },

    #[error("Batch hash {computed:?} does not match signed plan hash {signed:?}")]
    PlanHashMismatch { signed: H256, computed: H256 },

    #[error("Stale or future nonce: expected {expected}, got {got}")]
    StaleOrFutureNonce { expected: U256, got: U256 },

    #[error("Target {target:?} at index {index} is not whitelisted")]
    TargetNotWhitelisted { index: usize, target: Address },

    /// The failed operation's revert payload, unmodified
    #[error("Operation {index} reverted: {cause}")]
    OperationReverted { index: usize, cause: Bytes },

    #[error("Caller {caller:?} is not the owner")]
    Unauthorized { caller: Address },

    #[error("Owner cannot be the zero address")]
    ZeroOwner,

    #[error("Re-entrant call rejected")]
    ReentrantCall,
}

impl EngineError {
    /// Stable camelCase name of the variant, for callers that match on the
    /// kind of rejection rather than its message.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::EnginePaused => "enginePaused",
            EngineError::UnauthorizedRelayer(_) => "unauthorizedRelayer",
            EngineError::PlanExpired { .. } => "planExpired",
            EngineError::ArityMismatch { .. } => "arityMismatch",
            EngineError::InvalidBatchSize(_) => "invalidBatchSize",
            EngineError::MalformedSignature => "malformedSignature",
            EngineError::InvalidSignature => "invalidSignature",
            EngineError::SignerMismatch { .. } => "signerMismatch",
            EngineError::PlanHashMismatch { .. } => "planHashMismatch",
            EngineError::StaleOrFutureNonce { .. } => "staleOrFutureNonce",
            EngineError::TargetNotWhitelisted { .. } => "targetNotWhitelisted",
            EngineError::OperationReverted { .. } => "operationReverted",
            EngineError::Unauthorized { .. } => "unauthorized",
            EngineError::ZeroOwner => "zeroOwner",
            EngineError::ReentrantCall => "reentrantCall",
        }
    }

    /// Index of the operation the error refers to, if any
    pub fn operation_index(&self) -> Option<usize> {
        match self {
            EngineError::TargetNotWhitelisted { index, .. }
            | EngineError::OperationReverted { index, .. } => Some(*index),
            _ => None,
        }
    }
}

impl From<VerificationError> for EngineError {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::MalformedSignature => EngineError::MalformedSignature,
            VerificationError::InvalidSignature => EngineError::InvalidSignature,
        }
    }
}

impl From<NonceError> for EngineError {
    fn from(err: NonceError) -> Self {
        match err {
            NonceError::StaleOrFutureNonce { expected, got } => {
                EngineError::StaleOrFutureNonce { expected, got }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_indices() {
        let reverted = EngineError::OperationReverted {
            index: 2,
            cause: Bytes::from(vec![0xde, 0xad]),
        };
        assert_eq!(reverted.code(), "operationReverted");
        assert_eq!(reverted.operation_index(), Some(2));

        let stale: EngineError = NonceError::StaleOrFutureNonce {
            expected: U256::one(),
            got: U256::zero(),
        }
        .into();
        assert_eq!(stale.code(), "staleOrFutureNonce");
        assert_eq!(stale.operation_index(), None);
    }
}
