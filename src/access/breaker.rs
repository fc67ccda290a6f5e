use crate::{AccessRegistry, EngineError, EngineEvent};
use ethers::types::Address;
use tracing::{info, warn};

/// Global kill switch. Starts inactive.
#[derive(Debug, Clone, Default)]
pub struct CircuitBreaker {
    paused: bool,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(
        &mut self,
        access: &AccessRegistry,
        caller: Address,
    ) -> Result<EngineEvent, EngineError> {
        access.ensure_owner(caller)?;
        self.paused = true;
        warn!("Engine paused by {:?}", caller);
        Ok(EngineEvent::Paused { by: caller })
    }

    pub fn unpause(
        &mut self,
        access: &AccessRegistry,
        caller: Address,
    ) -> Result<EngineEvent, EngineError> {
        access.ensure_owner(caller)?;
        self.paused = false;
        info!("Engine unpaused by {:?}", caller);
        Ok(EngineEvent::Unpaused { by: caller })
    }

    /// First check of every submission.
    pub fn ensure_active(&self) -> Result<(), EngineError> {
        if self.paused {
            return Err(EngineError::EnginePaused);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pause_cycle() {
        let owner = Address::repeat_byte(0x0a);
        let access = AccessRegistry::new(owner);
        let mut breaker = CircuitBreaker::new();

        assert!(!breaker.is_paused());
        assert!(breaker.ensure_active().is_ok());

        assert_eq!(breaker.pause(&access, owner), Ok(EngineEvent::Paused { by: owner }));
        assert!(breaker.is_paused());
        assert_eq!(breaker.ensure_active(), Err(EngineError::EnginePaused));

        breaker.unpause(&access, owner).unwrap();
        assert!(breaker.ensure_active().is_ok());
    }

    #[test]
    fn test_only_owner_may_toggle() {
        let owner = Address::repeat_byte(0x0a);
        let intruder = Address::repeat_byte(0xee);
        let access = AccessRegistry::new(owner);
        let mut breaker = CircuitBreaker::new();

        assert_eq!(
            breaker.pause(&access, intruder),
            Err(EngineError::Unauthorized { caller: intruder })
        );
        assert!(!breaker.is_paused());

        breaker.pause(&access, owner).unwrap();
        assert!(breaker.unpause(&access, intruder).is_err());
        assert!(breaker.is_paused());
    }
}
