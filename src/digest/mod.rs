//! Digest Builder Module
//!
//! Encodes a `Plan` into the 32-byte EIP-712 digest a user signs.
//! The digest is bound to a single engine instance through the domain
//! separator (name, version, chain id, verifying contract), so a signature
//! for one deployment cannot be replayed against another.

mod builder;


pub use builder::{
    DomainContext, DOMAIN_TYPEHASH_STRING, PLAN_TYPEHASH_STRING, batch_hash, build_digest,
    plan_struct_hash,
};
