use crate::{AccessRegistry, CircuitBreaker, EngineError, EngineEvent, NonceRegistry};
use crate::state::EventLog;
use ethers::types::{Address, U256};

/// All mutable engine state.
///
/// The only write a submission makes before dispatch is its nonce; an
/// aborted submission undoes it with `NonceRegistry::restore`.
#[derive(Debug, Clone)]
pub struct EngineState {
    pub nonces: NonceRegistry,
    pub access: AccessRegistry,
    pub breaker: CircuitBreaker,
    pub events: EventLog,
}

impl EngineState {
    /// Fresh state administered by `owner`, which must not be the zero address.
    pub fn new(owner: Address) -> Result<Self, EngineError> {
        if owner == Address::zero() {
            return Err(EngineError::ZeroOwner);
        }

        Ok(Self {
            nonces: NonceRegistry::new(),
            access: AccessRegistry::new(owner),
            breaker: CircuitBreaker::new(),
            events: EventLog::new(),
        })
    }

    pub fn current_nonce(&self, user: &Address) -> U256 {
        self.nonces.peek(user)
    }

    pub fn set_target_whitelist(
        &mut self,
        caller: Address,
        target: Address,
        allowed: bool,
    ) -> Result<(), EngineError> {
        let event = self.access.set_target_whitelist(caller, target, allowed)?;
        self.events.emit(event);
        Ok(())
    }

    pub fn set_relayer_whitelist(
        &mut self,
        caller: Address,
        relayer: Address,
        allowed: bool,
    ) -> Result<(), EngineError> {
        let event = self.access.set_relayer_whitelist(caller, relayer, allowed)?;
        self.events.emit(event);
        Ok(())
    }

    pub fn transfer_owner(&mut self, caller: Address, new_owner: Address) -> Result<(), EngineError> {
        let event = self.access.transfer_owner(caller, new_owner)?;
        self.events.emit(event);
        Ok(())
    }

    pub fn pause(&mut self, caller: Address) -> Result<(), EngineError> {
        let event = self.breaker.pause(&self.access, caller)?;
        self.events.emit(event);
        Ok(())
    }

    pub fn unpause(&mut self, caller: Address) -> Result<(), EngineError> {
        let event = self.breaker.unpause(&self.access, caller)?;
        self.events.emit(event);
        Ok(())
    }

    pub fn emit(&mut self, event: EngineEvent) {
        self.events.emit(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_owner_rejected() {
        assert_eq!(EngineState::new(Address::zero()).unwrap_err(), EngineError::ZeroOwner);
    }

    #[test]
    fn test_new_state_is_unpaused_and_empty() {
        let owner = Address::repeat_byte(0x0a);
        let state = EngineState::new(owner).unwrap();

        assert_eq!(state.access.owner(), owner);
        assert!(!state.breaker.is_paused());
        assert!(state.events.is_empty());
    }
}
