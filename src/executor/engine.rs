//! Batch Executor
//!
//! Runs one submission through the ordered checks and dispatches its
//! operations as a single all-or-nothing unit.
//!
//! # Check order
//! 1. Circuit breaker inactive
//! 2. Submitter is a whitelisted relayer
//! 3. Plan not expired
//! 4. Targets and payloads have equal length
//! 5. Batch holds 1..=15 operations
//! 6. Signature recovers to the claimed user
//! 7. Batch hashes to the signed plan hash (when enforced)
//! 8. Nonce consumed (before any dispatch)
//! 9. Each target whitelisted, then dispatched in order
//!
//! Cheap, non-cryptographic checks come first. The nonce advances before
//! dispatch so that nothing a dispatched call does can reuse the signature.

use crate::{
    Batch, DomainContext, EngineError, EngineEvent, EngineState, ExecutionReceipt,
    MAX_BATCH_SIZE, Plan, SubmissionStage,
    digest::{batch_hash, build_digest},
    host::{Checkpoint, DispatchCall, ExecutionHost},
    signature::recover_signer,
};
use ethers::types::{Address, Bytes, H256, U256};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError};
use tracing::{debug, info, warn};

/// The authorization-and-execution engine.
///
/// Submissions and admin writes hold `submission_lock` for their whole
/// duration and never wait for it: a second entry while one is in flight
/// is rejected with `ReentrantCall`. `state` is only locked for short
/// sections and never across a dispatched call.
pub struct IntentEngine {
    domain: DomainContext,
    enforce_batch_hash: bool,
    submission_lock: Mutex<()>,
    state: RwLock<EngineState>,
}

/// Everything a relayer submits for one execution attempt.
#[derive(Debug, Clone)]
pub struct Submission<'a> {
    pub submitter: Address,
    pub user: Address,
    pub plan: &'a Plan,
    pub batch: &'a Batch,
    pub signature: &'a [u8],
}

impl IntentEngine {
    /// Creates an engine with empty whitelists and the batch hash check on.
    ///
    /// Fails with `ZeroOwner` if `owner` is the zero address.
    pub fn new(domain: DomainContext, owner: Address) -> Result<Self, EngineError> {
        Ok(Self::with_state(domain, EngineState::new(owner)?))
    }

    pub fn with_state(domain: DomainContext, state: EngineState) -> Self {
        Self {
            domain,
            enforce_batch_hash: true,
            submission_lock: Mutex::new(()),
            state: RwLock::new(state),
        }
    }

    /// Toggle the check that the submitted batch hashes to `plan.plan_hash`.
    ///
    /// With the check off, the match between the signed hash and the
    /// submitted operations is entirely the relayer's responsibility.
    pub fn enforce_batch_hash(mut self, enforce: bool) -> Self {
        self.enforce_batch_hash = enforce;
        self
    }

    pub fn domain(&self) -> &DomainContext {
        &self.domain
    }

    /// Digest a user must sign to authorize `plan` on this engine.
    pub fn digest_for(&self, plan: &Plan) -> H256 {
        build_digest(&self.domain, plan)
    }

    // ---------------------------------------------------------------------
    // Read-only queries
    // ---------------------------------------------------------------------

    pub fn current_nonce(&self, user: &Address) -> U256 {
        self.read_state().current_nonce(user)
    }

    pub fn is_paused(&self) -> bool {
        self.read_state().breaker.is_paused()
    }

    pub fn is_target_allowed(&self, target: &Address) -> bool {
        self.read_state().access.is_target_allowed(target)
    }

    pub fn is_relayer_allowed(&self, relayer: &Address) -> bool {
        self.read_state().access.is_relayer_allowed(relayer)
    }

    pub fn owner(&self) -> Address {
        self.read_state().access.owner()
    }

    /// Events emitted at or after position `cursor`.
    pub fn events_since(&self, cursor: usize) -> Vec<EngineEvent> {
        self.read_state().events.since(cursor).to_vec()
    }

    // ---------------------------------------------------------------------
    // Owner-gated administration
    // ---------------------------------------------------------------------

    pub fn set_target_whitelist(
        &self,
        caller: Address,
        target: Address,
        allowed: bool,
    ) -> Result<(), EngineError> {
        let _guard = self.enter()?;
        self.write_state().set_target_whitelist(caller, target, allowed)
    }

    pub fn set_relayer_whitelist(
        &self,
        caller: Address,
        relayer: Address,
        allowed: bool,
    ) -> Result<(), EngineError> {
        let _guard = self.enter()?;
        self.write_state().set_relayer_whitelist(caller, relayer, allowed)
    }

    pub fn transfer_owner(&self, caller: Address, new_owner: Address) -> Result<(), EngineError> {
        let _guard = self.enter()?;
        self.write_state().transfer_owner(caller, new_owner)
    }

    pub fn pause(&self, caller: Address) -> Result<(), EngineError> {
        let _guard = self.enter()?;
        self.write_state().pause(caller)
    }

    pub fn unpause(&self, caller: Address) -> Result<(), EngineError> {
        let _guard = self.enter()?;
        self.write_state().unpause(caller)
    }

    // ---------------------------------------------------------------------
    // Execution
    // ---------------------------------------------------------------------

    /// Verify and execute one submission.
    ///
    /// On any error the engine state and the host are exactly as they were
    /// before the call.
    ///
    /// # Panics
    /// A panic raised by the host while dispatching is re-raised after the
    /// host checkpoint is reverted and the nonce restored.
    pub fn execute_batch(
        &self,
        host: &mut dyn ExecutionHost,
        submission: Submission<'_>,
    ) -> Result<ExecutionReceipt, EngineError> {
        let _guard = self.enter()?;

        let mut stage = SubmissionStage::Idle;
        let result = self.process(host, &submission, &mut stage);

        match &result {
            Ok(receipt) => info!(
                "Plan {:?} for {:?} committed by {:?} (nonce {})",
                receipt.plan_id, receipt.user, receipt.submitter, receipt.nonce
            ),
            Err(e) => {
                advance(&mut stage, SubmissionStage::Aborted);
                warn!(
                    "Plan {:?} for {:?} rejected: {}",
                    submission.plan.plan_id, submission.user, e
                );
            }
        }

        result
    }

    fn process(
        &self,
        host: &mut dyn ExecutionHost,
        submission: &Submission<'_>,
        stage: &mut SubmissionStage,
    ) -> Result<ExecutionReceipt, EngineError> {
        let Submission {
            submitter,
            user,
            plan,
            batch,
            signature,
        } = *submission;

        advance(stage, SubmissionStage::Authenticating);

        {
            let state = self.read_state();
            state.breaker.ensure_active()?;
            if !state.access.is_relayer_allowed(&submitter) {
                return Err(EngineError::UnauthorizedRelayer(submitter));
            }
        }

        let now = host.now();
        if now > plan.expiry {
            return Err(EngineError::PlanExpired {
                expiry: plan.expiry,
                now,
            });
        }

        let len = batch.targets.len();
        if len != batch.payloads.len() {
            return Err(EngineError::ArityMismatch {
                targets: len,
                payloads: batch.payloads.len(),
            });
        }
        if len == 0 || len > MAX_BATCH_SIZE {
            return Err(EngineError::InvalidBatchSize(len));
        }

        let digest = self.digest_for(plan);
        debug!("Verifying digest {:?} for {:?}", digest, user);
        let recovered = recover_signer(digest, signature)?;
        if recovered != user {
            return Err(EngineError::SignerMismatch {
                expected: user,
                recovered,
            });
        }

        if self.enforce_batch_hash {
            let computed = batch_hash(batch);
            if computed != plan.plan_hash {
                return Err(EngineError::PlanHashMismatch {
                    signed: plan.plan_hash,
                    computed,
                });
            }
        }

        // Advance the nonce before any external call
        self.write_state().nonces.consume(user, plan.nonce)?;

        advance(stage, SubmissionStage::Dispatching);
        let checkpoint = host.checkpoint();

        // A panicking host call rolls back like a revert, then keeps unwinding
        let dispatched =
            panic::catch_unwind(AssertUnwindSafe(|| self.dispatch_all(&mut *host, user, batch)));
        let results = match dispatched {
            Ok(Ok(results)) => results,
            Ok(Err(e)) => {
                self.roll_back(host, checkpoint, user, plan.nonce);
                return Err(e);
            }
            Err(payload) => {
                warn!("Host panicked while dispatching plan {:?}", plan.plan_id);
                self.roll_back(host, checkpoint, user, plan.nonce);
                advance(stage, SubmissionStage::Aborted);
                panic::resume_unwind(payload);
            }
        };

        host.commit(checkpoint);
        self.write_state().emit(EngineEvent::ExecutionCompleted {
            user,
            plan_id: plan.plan_id,
            cid_hash: batch.cid_hash,
            submitter,
            nonce: plan.nonce,
        });
        advance(stage, SubmissionStage::Committed);

        Ok(ExecutionReceipt {
            user,
            plan_id: plan.plan_id,
            cid_hash: batch.cid_hash,
            submitter,
            nonce: plan.nonce,
            digest,
            results,
        })
    }

    fn dispatch_all(
        &self,
        host: &mut dyn ExecutionHost,
        user: Address,
        batch: &Batch,
    ) -> Result<Vec<Bytes>, EngineError> {
        let mut results = Vec::with_capacity(batch.targets.len());

        for (index, target, payload) in batch.operations() {
            if !self.is_target_allowed(&target) {
                return Err(EngineError::TargetNotWhitelisted { index, target });
            }

            let call = DispatchCall {
                caller: self.domain.verifying_contract,
                on_behalf_of: user,
                target,
                payload: payload.clone(),
            };
            debug!("Dispatching operation {} to {:?}", index, target);
            let output = host
                .dispatch(&call)
                .map_err(|cause| EngineError::OperationReverted { index, cause })?;
            results.push(output);
        }

        Ok(results)
    }

    /// Undo everything a submission did after its nonce was consumed.
    fn roll_back(
        &self,
        host: &mut dyn ExecutionHost,
        checkpoint: Checkpoint,
        user: Address,
        consumed: U256,
    ) {
        host.revert(checkpoint);
        self.write_state().nonces.restore(user, consumed);
    }

    /// Take the submission lock without waiting.
    fn enter(&self) -> Result<MutexGuard<'_, ()>, EngineError> {
        match self.submission_lock.try_lock() {
            Ok(guard) => Ok(guard),
            // Poisoned only by a host panic, which was rolled back before unwinding
            Err(TryLockError::Poisoned(poisoned)) => Ok(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => {
                warn!("Rejected re-entrant call into the engine");
                Err(EngineError::ReentrantCall)
            }
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, EngineState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, EngineState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn advance(stage: &mut SubmissionStage, next: SubmissionStage) {
    debug!("Submission stage {:?} -> {:?}", stage, next);
    *stage = next;
}
