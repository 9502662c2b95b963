//! BLS12-381 signature primitives, Ethereum flavor.
//!
//! Thin, typed wrappers over `blst`'s `min_pk` scheme: 48-byte compressed G1
//! public keys, 96-byte compressed G2 signatures, and the Ethereum
//! hash-to-curve domain separation tag. Serialized forms are the canonical
//! compressed big-endian encodings and must stay bit-for-bit interoperable
//! with the rest of the protocol.
//!
//! [`init`] must have returned `true` before anything else in this module is
//! used. Every other operation touches only its receiver and arguments, so
//! independent keys and signatures can be processed from many threads at once.

mod keys;
mod signature;

pub use keys::{PublicKey, SecretKey};
pub use signature::Signature;

use sha2::{Digest, Sha256};
use std::sync::OnceLock;
use thiserror::Error;

/// Domain separation tag for Ethereum BLS signatures.
pub(crate) const DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

/// Serialized secret key length in bytes (big-endian scalar).
pub const SECRET_KEY_LEN: usize = 32;

/// Serialized public key length in bytes (compressed G1 point).
pub const PUBLIC_KEY_LEN: usize = 48;

/// Serialized signature length in bytes (compressed G2 point).
pub const SIGNATURE_LEN: usize = 96;

/// Message digest length in bytes.
pub const MESSAGE_LEN: usize = 32;

/// Errors raised by the signature layer.
///
/// These are the recoverable failures: malformed or wrong-length encodings,
/// and caller-contract violations on aggregate inputs. Verification verdicts
/// are plain `bool`s, never errors.
#[derive(Debug, Error)]
pub enum BlsError {
    #[error("Invalid input length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("Invalid point or scalar encoding: {0:?}")]
    InvalidEncoding(blst::BLST_ERROR),

    #[error("Secret key scalar is zero")]
    ZeroSecretKey,

    #[error("Aggregate operation over an empty input sequence")]
    EmptyAggregation,

    #[error("Unsupported radix {0}: only 10 and 16 are supported")]
    UnsupportedRadix(u32),

    #[error("String is not a valid scalar below the group order")]
    InvalidScalarString,
}

/// A 32-byte message digest.
///
/// Sign and verify operations take digests, never raw payloads; callers must
/// pre-hash, e.g. through [`Message::digest`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Message(pub [u8; MESSAGE_LEN]);

impl Message {
    /// SHA256 an arbitrary payload down to a signable digest.
    pub fn digest(payload: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(payload);
        Self(hasher.finalize().into())
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, BlsError> {
        let digest: [u8; MESSAGE_LEN] =
            bytes
                .try_into()
                .map_err(|_| BlsError::InvalidLength {
                    expected: MESSAGE_LEN,
                    got: bytes.len(),
                })?;
        Ok(Self(digest))
    }

    pub fn as_bytes(&self) -> &[u8; MESSAGE_LEN] {
        &self.0
    }
}

impl From<[u8; MESSAGE_LEN]> for Message {
    fn from(digest: [u8; MESSAGE_LEN]) -> Self {
        Self(digest)
    }
}

static INIT: OnceLock<bool> = OnceLock::new();

/// One-time, process-wide initialization of the pairing backend.
///
/// The first caller runs a sign/verify self-test; its outcome is cached, and
/// every later call, from any thread, returns the cached result without
/// re-entering the backend. Idempotent and safe to call redundantly. No other
/// operation in this module may be used until this has returned `true`.
pub fn init() -> bool {
    *INIT.get_or_init(self_test)
}

/// Sign and verify a fixed vector to prove the backend is operational.
fn self_test() -> bool {
    let ikm = [0x5au8; 32];
    let Ok(sk) = blst::min_pk::SecretKey::key_gen(&ikm, &[]) else {
        return false;
    };
    let pk = sk.sk_to_pk();
    let digest = [0u8; MESSAGE_LEN];
    let sig = sk.sign(&digest, DST, &[]);
    sig.verify(true, &digest, DST, &[], &pk, true) == blst::BLST_ERROR::BLST_SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_init_succeeds_and_is_idempotent() {
        assert!(init());
        assert!(init());
    }

    #[test]
    fn test_init_is_safe_to_call_from_many_threads() {
        let handles: Vec<_> = (0..8).map(|_| std::thread::spawn(init)).collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }

    #[test]
    fn test_message_digest_is_sha256() {
        // SHA256("") is a fixed vector.
        let expected =
            hex!("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855");
        assert_eq!(Message::digest(b"").0, expected);
        assert_eq!(Message::digest(b"abc"), Message::digest(b"abc"));
        assert_ne!(Message::digest(b"abc"), Message::digest(b"abd"));
    }

    #[test]
    fn test_message_from_slice_requires_exact_length() {
        assert!(Message::from_slice(&[0u8; 32]).is_ok());
        assert!(matches!(
            Message::from_slice(&[0u8; 31]),
            Err(BlsError::InvalidLength { expected: 32, got: 31 })
        ));
        assert!(Message::from_slice(&[0u8; 33]).is_err());
    }
}
