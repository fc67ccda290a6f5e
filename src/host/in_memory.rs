use crate::host::{Checkpoint, DispatchCall, ExecutionHost};
use ethers::types::{Address, Bytes};
use std::collections::HashMap;
use tracing::debug;

/// Behaviour attached to a target address.
pub type CallHandler = Box<dyn FnMut(&DispatchCall) -> Result<Bytes, Bytes> + Send>;

/// In-process host keeping a ledger of committed calls.
///
/// Targets without a handler accept any payload and return empty data,
/// like a call to an account without code.
pub struct InMemoryHost {
    fixed_time: Option<u64>,
    handlers: HashMap<Address, CallHandler>,
    ledger: Vec<DispatchCall>,
}

impl InMemoryHost {
    /// Host using the system clock
    pub fn new() -> Self {
        Self {
            fixed_time: None,
            handlers: HashMap::new(),
            ledger: Vec::new(),
        }
    }

    /// Host whose clock always reads `timestamp`
    pub fn at(timestamp: u64) -> Self {
        Self {
            fixed_time: Some(timestamp),
            ..Self::new()
        }
    }

    pub fn set_time(&mut self, timestamp: u64) {
        self.fixed_time = Some(timestamp);
    }

    pub fn register(&mut self, target: Address, handler: CallHandler) {
        self.handlers.insert(target, handler);
    }

    /// Register a target whose every call fails with `revert_data`.
    pub fn register_reverting(&mut self, target: Address, revert_data: Bytes) {
        self.register(target, Box::new(move |_| Err(revert_data.clone())));
    }

    /// Calls that survived their submission, oldest first
    pub fn ledger(&self) -> &[DispatchCall] {
        &self.ledger
    }
}

impl Default for InMemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionHost for InMemoryHost {
    fn now(&self) -> u64 {
        self.fixed_time
            .unwrap_or_else(|| chrono::Utc::now().timestamp().max(0) as u64)
    }

    fn checkpoint(&mut self) -> Checkpoint {
        Checkpoint(self.ledger.len())
    }

    fn commit(&mut self, checkpoint: Checkpoint) {
        debug!(
            "Committed {} calls",
            self.ledger.len().saturating_sub(checkpoint.0)
        );
    }

    fn revert(&mut self, checkpoint: Checkpoint) {
        debug!(
            "Reverting {} calls",
            self.ledger.len().saturating_sub(checkpoint.0)
        );
        self.ledger.truncate(checkpoint.0);
    }

    fn dispatch(&mut self, call: &DispatchCall) -> Result<Bytes, Bytes> {
        let output = match self.handlers.get_mut(&call.target) {
            Some(handler) => handler(call)?,
            None => Bytes::new(),
        };
        self.ledger.push(call.clone());
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(target: Address) -> DispatchCall {
        DispatchCall {
            caller: Address::repeat_byte(0x71),
            on_behalf_of: Address::repeat_byte(0x01),
            target,
            payload: Bytes::from(vec![1, 2, 3]),
        }
    }

    #[test]
    fn test_revert_discards_calls_after_checkpoint() {
        let mut host = InMemoryHost::at(100);
        host.dispatch(&call(Address::repeat_byte(1))).unwrap();

        let checkpoint = host.checkpoint();
        host.dispatch(&call(Address::repeat_byte(2))).unwrap();
        host.revert(checkpoint);

        assert_eq!(host.ledger().len(), 1);
        assert_eq!(host.ledger()[0].target, Address::repeat_byte(1));
    }

    #[test]
    fn test_reverting_handler_is_not_recorded() {
        let mut host = InMemoryHost::at(100);
        let target = Address::repeat_byte(3);
        host.register_reverting(target, Bytes::from(vec![0xde, 0xad]));

        assert_eq!(host.dispatch(&call(target)), Err(Bytes::from(vec![0xde, 0xad])));
        assert!(host.ledger().is_empty());
    }

    #[test]
    fn test_handler_return_data() {
        let mut host = InMemoryHost::at(100);
        let target = Address::repeat_byte(4);
        host.register(target, Box::new(|call| Ok(call.payload.clone())));

        assert_eq!(host.dispatch(&call(target)), Ok(Bytes::from(vec![1, 2, 3])));
        assert_eq!(host.now(), 100);
    }
}
