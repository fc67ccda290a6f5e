use crate::NonceError;
use ethers::types::{Address, U256};
use std::collections::HashMap;
use tracing::warn;

/// Per-user counters. Users never seen before read as zero.
#[derive(Debug, Clone, Default)]
pub struct NonceRegistry {
    counters: HashMap<Address, U256>,
}

impl NonceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current counter value for `user`
    pub fn peek(&self, user: &Address) -> U256 {
        self.counters.get(user).copied().unwrap_or_default()
    }

    /// Advance the counter by one if `expected` is exactly the current value.
    pub fn consume(&mut self, user: Address, expected: U256) -> Result<(), NonceError> {
        let current = self.peek(&user);

        if expected != current {
            warn!(
                "Nonce check failed for {:?}: expected {}, got {}",
                user, current, expected
            );
            return Err(NonceError::StaleOrFutureNonce {
                expected: current,
                got: expected,
            });
        }

        // An exhausted counter accepts nothing further
        let next = current.checked_add(U256::one()).ok_or_else(|| {
            warn!("Nonce counter for {:?} is exhausted", user);
            NonceError::StaleOrFutureNonce {
                expected: current,
                got: expected,
            }
        })?;
        self.counters.insert(user, next);
        Ok(())
    }

    /// Undo a `consume` of `consumed` whose submission aborted.
    ///
    /// Only valid while the aborting submission still holds the engine's
    /// submission lock; the counter must read `consumed + 1`.
    pub(crate) fn restore(&mut self, user: Address, consumed: U256) {
        debug_assert_eq!(self.peek(&user).checked_sub(U256::one()), Some(consumed));
        self.counters.insert(user, consumed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_user_starts_at_zero() {
        let registry = NonceRegistry::new();
        assert_eq!(registry.peek(&Address::repeat_byte(1)), U256::zero());
    }

    #[test]
    fn test_consume_increments_by_one() {
        let mut registry = NonceRegistry::new();
        let user = Address::repeat_byte(1);

        registry.consume(user, U256::zero()).unwrap();
        assert_eq!(registry.peek(&user), U256::one());

        registry.consume(user, U256::one()).unwrap();
        assert_eq!(registry.peek(&user), U256::from(2));
    }

    #[test]
    fn test_consumed_value_is_never_valid_again() {
        let mut registry = NonceRegistry::new();
        let user = Address::repeat_byte(1);

        registry.consume(user, U256::zero()).unwrap();
        assert_eq!(
            registry.consume(user, U256::zero()),
            Err(NonceError::StaleOrFutureNonce {
                expected: U256::one(),
                got: U256::zero(),
            })
        );
        assert_eq!(registry.peek(&user), U256::one());
    }

    #[test]
    fn test_future_nonce_rejected_without_side_effects() {
        let mut registry = NonceRegistry::new();
        let user = Address::repeat_byte(1);

        assert!(registry.consume(user, U256::from(5)).is_err());
        assert_eq!(registry.peek(&user), U256::zero());
    }

    #[test]
    fn test_users_are_independent() {
        let mut registry = NonceRegistry::new();
        let alice = Address::repeat_byte(1);
        let bob = Address::repeat_byte(2);

        registry.consume(alice, U256::zero()).unwrap();
        assert_eq!(registry.peek(&bob), U256::zero());
        registry.consume(bob, U256::zero()).unwrap();
        assert_eq!(registry.peek(&alice), U256::one());
    }

    #[test]
    fn test_exhausted_counter_rejects_last_value() {
        let mut registry = NonceRegistry::new();
        let user = Address::repeat_byte(1);
        registry.counters.insert(user, U256::MAX);

        assert_eq!(
            registry.consume(user, U256::MAX),
            Err(NonceError::StaleOrFutureNonce {
                expected: U256::MAX,
                got: U256::MAX,
            })
        );
        assert_eq!(registry.peek(&user), U256::MAX);
    }
}
