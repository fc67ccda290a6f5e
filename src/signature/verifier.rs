use crate::VerificationError;
use ethers::types::{Address, H256, Signature, U256};
use tracing::debug;

/// r (32) || s (32) || v (1)
pub const SIGNATURE_LENGTH: usize = 65;

/// secp256k1n / 2; signatures with a larger `s` are the malleable twin (EIP-2).
const SECP256K1N_HALF: [u8; 32] = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b, 0x20, 0xa0,
];

/// Recover the address that signed `digest`.
///
/// Accepts `v` in {0, 1, 27, 28}. A well-formed signature from some other
/// key recovers successfully to that other address.
pub fn recover_signer(digest: H256, signature: &[u8]) -> Result<Address, VerificationError> {
    if signature.len() != SIGNATURE_LENGTH {
        debug!("Rejecting signature of length {}", signature.len());
        return Err(VerificationError::MalformedSignature);
    }

    let mut signature =
        Signature::try_from(signature).map_err(|_| VerificationError::MalformedSignature)?;
    signature.v = match signature.v {
        0 | 1 => signature.v + 27,
        27 | 28 => signature.v,
        _ => return Err(VerificationError::MalformedSignature),
    };

    if signature.s > U256::from_big_endian(&SECP256K1N_HALF) {
        debug!("Rejecting high-s signature");
        return Err(VerificationError::InvalidSignature);
    }

    let recovered = signature
        .recover(digest)
        .map_err(|_| VerificationError::InvalidSignature)?;

    // Zero address signals a mathematically invalid recovery input
    if recovered == Address::zero() {
        return Err(VerificationError::InvalidSignature);
    }

    Ok(recovered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::signers::{LocalWallet, Signer};

    const TEST_KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    fn wallet() -> LocalWallet {
        TEST_KEY.parse().unwrap()
    }

    fn sign(digest: H256) -> Vec<u8> {
        wallet().sign_hash(digest).unwrap().to_vec()
    }

    #[test]
    fn test_recovers_known_signer() {
        let digest = H256::repeat_byte(0x42);
        let recovered = recover_signer(digest, &sign(digest)).unwrap();
        // Address of the well-known test key above
        let expected: Address = "0x2c7536e3605d9c16a7a3d7b1898e529396a65c23".parse().unwrap();
        assert_eq!(recovered, expected);
        assert_eq!(recovered, wallet().address());
    }

    #[test]
    fn test_accepts_zero_based_recovery_id() {
        let digest = H256::repeat_byte(0x42);
        let mut sig = sign(digest);
        sig[64] -= 27;
        assert_eq!(recover_signer(digest, &sig).unwrap(), wallet().address());
    }

    #[test]
    fn test_other_digest_recovers_other_identity() {
        let sig = sign(H256::repeat_byte(0x42));
        let recovered = recover_signer(H256::repeat_byte(0x43), &sig);
        // Well-formed but for another message: either a different identity or no identity
        assert_ne!(recovered, Ok(wallet().address()));
    }

    #[test]
    fn test_rejects_wrong_length() {
        let digest = H256::repeat_byte(0x42);
        let sig = sign(digest);
        assert_eq!(
            recover_signer(digest, &sig[..64]),
            Err(VerificationError::MalformedSignature)
        );
        let mut long = sig.clone();
        long.push(0);
        assert_eq!(recover_signer(digest, &long), Err(VerificationError::MalformedSignature));
        assert_eq!(recover_signer(digest, &[]), Err(VerificationError::MalformedSignature));
    }

    #[test]
    fn test_rejects_unknown_recovery_id() {
        let digest = H256::repeat_byte(0x42);
        let mut sig = sign(digest);
        sig[64] = 29;
        assert_eq!(recover_signer(digest, &sig), Err(VerificationError::MalformedSignature));
    }

    #[test]
    fn test_rejects_zeroed_signature() {
        let mut sig = vec![0u8; SIGNATURE_LENGTH];
        sig[64] = 27;
        assert_eq!(
            recover_signer(H256::repeat_byte(0x42), &sig),
            Err(VerificationError::InvalidSignature)
        );
    }

    #[test]
    fn test_rejects_high_s_twin() {
        let digest = H256::repeat_byte(0x42);
        let signature = wallet().sign_hash(digest).unwrap();

        // n - s with the parity flipped recovers the same key on a lax verifier
        let n = U256::from_big_endian(&[
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
            0xff, 0xfe, 0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c,
            0xd0, 0x36, 0x41, 0x41,
        ]);
        let twin = Signature {
            r: signature.r,
            s: n - signature.s,
            v: if signature.v == 27 { 28 } else { 27 },
        };
        assert_eq!(
            recover_signer(digest, &twin.to_vec()),
            Err(VerificationError::InvalidSignature)
        );
    }
}
