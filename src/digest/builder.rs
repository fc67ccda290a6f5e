use crate::{Batch, Plan};
use ethers::abi::{Token, encode};
use ethers::types::{Address, H256, U256};
use ethers::utils::keccak256;
use serde::{Deserialize, Serialize};

pub const DOMAIN_TYPEHASH_STRING: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

pub const PLAN_TYPEHASH_STRING: &str =
    "Plan(bytes32 planId,bytes32 planHash,uint256 nonce,uint256 expiry)";

/// Identity of the engine instance a digest is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainContext {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl DomainContext {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        chain_id: u64,
        verifying_contract: Address,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            chain_id,
            verifying_contract,
        }
    }

    /// keccak256(abi.encode(DOMAIN_TYPEHASH, keccak256(name), keccak256(version), chainId, verifyingContract))
    pub fn separator(&self) -> H256 {
        let encoded = encode(&[
            Token::FixedBytes(keccak256(DOMAIN_TYPEHASH_STRING).to_vec()),
            Token::FixedBytes(keccak256(self.name.as_bytes()).to_vec()),
            Token::FixedBytes(keccak256(self.version.as_bytes()).to_vec()),
            Token::Uint(U256::from(self.chain_id)),
            Token::Address(self.verifying_contract),
        ]);
        H256::from(keccak256(encoded))
    }
}

/// keccak256(abi.encode(PLAN_TYPEHASH, planId, planHash, nonce, expiry))
pub fn plan_struct_hash(plan: &Plan) -> H256 {
    let encoded = encode(&[
        Token::FixedBytes(keccak256(PLAN_TYPEHASH_STRING).to_vec()),
        Token::FixedBytes(plan.plan_id.as_bytes().to_vec()),
        Token::FixedBytes(plan.plan_hash.as_bytes().to_vec()),
        Token::Uint(plan.nonce),
        Token::Uint(U256::from(plan.expiry)),
    ]);
    H256::from(keccak256(encoded))
}

/// Final digest: keccak256("\x19\x01" || domainSeparator || structHash)
pub fn build_digest(domain: &DomainContext, plan: &Plan) -> H256 {
    let mut buf = Vec::with_capacity(2 + 32 + 32);
    buf.extend_from_slice(b"\x19\x01");
    buf.extend_from_slice(domain.separator().as_bytes());
    buf.extend_from_slice(plan_struct_hash(plan).as_bytes());
    H256::from(keccak256(buf))
}

/// Canonical commitment to a batch's operations:
/// keccak256(abi.encode(address[] targets, bytes[] payloads)).
///
/// The cid hash is not part of the commitment; it only locates the
/// off-engine description.
pub fn batch_hash(batch: &Batch) -> H256 {
    let targets = batch.targets.iter().copied().map(Token::Address).collect();
    let payloads = batch
        .payloads
        .iter()
        .map(|payload| Token::Bytes(payload.to_vec()))
        .collect();
    let encoded = encode(&[Token::Array(targets), Token::Array(payloads)]);
    H256::from(keccak256(encoded))
}
