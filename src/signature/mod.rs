//! Signature Verification Module
//!
//! Recovers the signing identity from a digest and a 65-byte ECDSA
//! signature. Stateless: comparing the recovered identity against the
//! claimed user is the caller's job.

mod verifier;
pub use verifier::{SIGNATURE_LENGTH, recover_signer};
