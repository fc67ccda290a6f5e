//! Configuration Module
//!
//! This module defines all configuration structures for the engine.
//! Configuration is loaded from TOML files and parsed using serde.

use crate::{DomainContext, EngineState, IntentEngine};
use ethers::types::Address;
use serde::Deserialize;
use std::fs;
use tracing::info;

/// Main configuration structure
///
/// # Example TOML
/// ```toml
/// [engine]
/// name = "IntentWallet"
/// version = "1"
/// chain_id = 1043
/// verifying_contract = "0x718a09981d305c2293d0c85e9d957ad25cb2a1c7"
/// owner = "0x0000000000000000000000000000000000000a0a"
/// enforce_batch_hash = true
///
/// [access]
/// targets = ["0x1b227DF9c8D34CaB880774737FBf426E66Ba98Ed"]
/// relayers = ["0x0000000000000000000000000000000000000b0b"]
///
/// [relayer]
/// address = "0x0000000000000000000000000000000000000b0b"
///
/// [api]
/// host = "127.0.0.1"
/// port = 8545
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub engine: EngineConfig,
    #[serde(default)]
    pub access: AccessConfig,
    pub relayer: RelayerConfig,
    pub api: ApiConfig,
}

/// Domain identity and owner of the engine instance
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    pub verifying_contract: Address,
    pub owner: Address,
    /// Reject batches that do not hash to the signed plan hash
    #[serde(default = "default_enforce_batch_hash")]
    pub enforce_batch_hash: bool,
}

/// Whitelist entries applied by the owner at startup
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccessConfig {
    #[serde(default)]
    pub targets: Vec<Address>,
    #[serde(default)]
    pub relayers: Vec<Address>,
}

/// Identity this node submits batches under
#[derive(Debug, Clone, Deserialize)]
pub struct RelayerConfig {
    pub address: Address,
}

/// JSON-RPC bind address
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

fn default_name() -> String {
    "IntentWallet".to_string()
}

fn default_version() -> String {
    "1".to_string()
}

fn default_chain_id() -> u64 {
    1043
}

fn default_enforce_batch_hash() -> bool {
    true
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the TOML file
    ///
    /// # Returns
    /// The parsed configuration, or an error if the file cannot be read
    /// or a required field is missing
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text, filling in defaults
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Signing domain described by the `[engine]` section
    pub fn domain(&self) -> DomainContext {
        DomainContext::new(
            self.engine.name.clone(),
            self.engine.version.clone(),
            self.engine.chain_id,
            self.engine.verifying_contract,
        )
    }

    /// Build an engine and apply the configured whitelists as the owner.
    ///
    /// The whitelist writes go through the owner-gated path, so they show
    /// up in the audit log like any later change.
    ///
    /// # Returns
    /// The bootstrapped engine, or an error if `engine.owner` is the zero
    /// address
    pub fn build_engine(&self) -> anyhow::Result<IntentEngine> {
        // Step 1: An engine nobody can administer is refused outright
        let owner = self.engine.owner;
        if owner == Address::zero() {
            anyhow::bail!("engine.owner must not be the zero address");
        }
        let mut state = EngineState::new(owner)?;

        // Step 2: Whitelist writes, each recorded as an audit event
        for target in &self.access.targets {
            state.set_target_whitelist(owner, *target, true)?;
        }
        for relayer in &self.access.relayers {
            state.set_relayer_whitelist(owner, *relayer, true)?;
        }
        info!(
            "Engine bootstrapped with {} targets and {} relayers",
            self.access.targets.len(),
            self.access.relayers.len()
        );

        // Step 3: Wrap the state with the signing domain
        Ok(IntentEngine::with_state(self.domain(), state)
            .enforce_batch_hash(self.engine.enforce_batch_hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [engine]
        verifying_contract = "0x718a09981d305c2293d0c85e9d957ad25cb2a1c7"
        owner = "0x0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a"

        [access]
        targets = ["0x1b227DF9c8D34CaB880774737FBf426E66Ba98Ed"]
        relayers = ["0x0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b"]

        [relayer]
        address = "0x0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b"

        [api]
        host = "127.0.0.1"
        port = 8545
    "#;

    #[test]
    fn test_defaults_applied() {
        let config = Config::parse(SAMPLE).unwrap();
        assert_eq!(config.engine.name, "IntentWallet");
        assert_eq!(config.engine.version, "1");
        assert_eq!(config.engine.chain_id, 1043);
        assert!(config.engine.enforce_batch_hash);
    }

    #[test]
    fn test_build_engine_applies_whitelists() {
        let config = Config::parse(SAMPLE).unwrap();
        let engine = config.build_engine().unwrap();

        let target: Address = "0x1b227DF9c8D34CaB880774737FBf426E66Ba98Ed".parse().unwrap();
        assert!(engine.is_target_allowed(&target));
        assert!(engine.is_relayer_allowed(&config.relayer.address));
        assert_eq!(engine.owner(), Address::repeat_byte(0x0a));
        assert_eq!(engine.events_since(0).len(), 2);
    }

    #[test]
    fn test_zero_owner_rejected() {
        let zero = SAMPLE.replace(
            "0x0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a",
            "0x0000000000000000000000000000000000000000",
        );
        let config = Config::parse(&zero).unwrap();

        let err = config.build_engine().err().unwrap();
        assert!(err.to_string().contains("zero address"));
    }

    #[test]
    fn test_missing_owner_rejected() {
        let broken = SAMPLE.replace(
            "owner = \"0x0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a\"",
            "",
        );
        assert!(Config::parse(&broken).is_err());
    }
}
