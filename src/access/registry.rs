use crate::{EngineError, EngineEvent};
use ethers::types::Address;
use std::collections::HashMap;
use tracing::{info, warn};

/// Owner and the two whitelists.
///
/// Entries absent from a whitelist read as not allowed.
#[derive(Debug, Clone)]
pub struct AccessRegistry {
    owner: Address,
    targets: HashMap<Address, bool>,
    relayers: HashMap<Address, bool>,
}

impl AccessRegistry {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            targets: HashMap::new(),
            relayers: HashMap::new(),
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_target_allowed(&self, target: &Address) -> bool {
        self.targets.get(target).copied().unwrap_or(false)
    }

    pub fn is_relayer_allowed(&self, relayer: &Address) -> bool {
        self.relayers.get(relayer).copied().unwrap_or(false)
    }

    /// Fail with `Unauthorized` unless `caller` is the current owner.
    pub fn ensure_owner(&self, caller: Address) -> Result<(), EngineError> {
        if caller != self.owner {
            warn!("Rejected admin call from non-owner {:?}", caller);
            return Err(EngineError::Unauthorized { caller });
        }
        Ok(())
    }

    pub fn set_target_whitelist(
        &mut self,
        caller: Address,
        target: Address,
        allowed: bool,
    ) -> Result<EngineEvent, EngineError> {
        self.ensure_owner(caller)?;
        self.targets.insert(target, allowed);
        info!("Target {:?} whitelist set to {}", target, allowed);
        Ok(EngineEvent::TargetWhitelistUpdated { target, allowed })
    }

    pub fn set_relayer_whitelist(
        &mut self,
        caller: Address,
        relayer: Address,
        allowed: bool,
    ) -> Result<EngineEvent, EngineError> {
        self.ensure_owner(caller)?;
        self.relayers.insert(relayer, allowed);
        info!("Relayer {:?} whitelist set to {}", relayer, allowed);
        Ok(EngineEvent::RelayerWhitelistUpdated { relayer, allowed })
    }

    pub fn transfer_owner(
        &mut self,
        caller: Address,
        new_owner: Address,
    ) -> Result<EngineEvent, EngineError> {
        self.ensure_owner(caller)?;
        if new_owner == Address::zero() {
            return Err(EngineError::ZeroOwner);
        }
        let previous_owner = std::mem::replace(&mut self.owner, new_owner);
        info!("Ownership transferred from {:?} to {:?}", previous_owner, new_owner);
        Ok(EngineEvent::OwnershipTransferred {
            previous_owner,
            new_owner,
        })
    }
}
