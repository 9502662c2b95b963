//! Secret and public keys.

use crate::bls::signature::Signature;
use crate::bls::{BlsError, Message, DST, PUBLIC_KEY_LEN, SECRET_KEY_LEN};
use blst::min_pk;
use blst::BLST_ERROR;
use num_bigint::BigUint;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

/// Scalar field order of BLS12-381, hexadecimal.
const SCALAR_ORDER_HEX: &[u8] =
    b"73eda753299d7d483339d80809a1d80553bda402fffe5bfeffffffff00000001";

fn scalar_order() -> BigUint {
    BigUint::parse_bytes(SCALAR_ORDER_HEX, 16).expect("group order constant parses")
}

/// A BLS12-381 secret key: a nonzero scalar in the curve's scalar field.
#[derive(Clone)]
pub struct SecretKey(pub(super) min_pk::SecretKey);

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material.
        f.write_str("SecretKey(<redacted>)")
    }
}

impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        self.serialize() == other.serialize()
    }
}

impl Eq for SecretKey {}

impl SecretKey {
    /// Draw a fresh key from the operating system CSPRNG.
    ///
    /// Panics if the CSPRNG fails: a broken entropy source is not safe to
    /// continue from.
    pub fn random() -> Self {
        let mut ikm = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut ikm)
            .unwrap_or_else(|e| panic!("OS CSPRNG failure: {e}"));
        let sk = min_pk::SecretKey::key_gen(&ikm, &[])
            .unwrap_or_else(|e| panic!("key generation rejected CSPRNG output: {e:?}"));
        ikm.zeroize();
        Self(sk)
    }

    /// Canonical fixed-size big-endian encoding.
    pub fn serialize(&self) -> [u8; SECRET_KEY_LEN] {
        self.0.to_bytes()
    }

    /// Decode a canonical encoding. The entire input must be consumed and
    /// encode a valid nonzero scalar; partial consumption is a failure.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, BlsError> {
        if bytes.len() != SECRET_KEY_LEN {
            return Err(BlsError::InvalidLength {
                expected: SECRET_KEY_LEN,
                got: bytes.len(),
            });
        }
        min_pk::SecretKey::from_bytes(bytes)
            .map(Self)
            .map_err(BlsError::InvalidEncoding)
    }

    /// Reduce an arbitrary-length big-endian byte string modulo the scalar
    /// field order.
    ///
    /// Panics on an empty input: the length is a caller contract, not data.
    pub fn from_be_bytes_mod(bytes: &[u8]) -> Result<Self, BlsError> {
        Self::reduce_mod_order(bytes, true)
    }

    /// Little-endian counterpart of [`from_be_bytes_mod`](Self::from_be_bytes_mod).
    pub fn from_le_bytes_mod(bytes: &[u8]) -> Result<Self, BlsError> {
        Self::reduce_mod_order(bytes, false)
    }

    fn reduce_mod_order(bytes: &[u8], big_endian: bool) -> Result<Self, BlsError> {
        assert!(!bytes.is_empty(), "reduction over an empty byte string");

        let mut scalar = blst::blst_scalar { b: [0u8; 32] };
        // SAFETY: `scalar` is a live 32-byte output struct and `bytes` is a
        // valid non-empty slice of the stated length.
        let nonzero = unsafe {
            if big_endian {
                blst::blst_scalar_from_be_bytes(&mut scalar, bytes.as_ptr(), bytes.len())
            } else {
                blst::blst_scalar_from_le_bytes(&mut scalar, bytes.as_ptr(), bytes.len())
            }
        };
        if !nonzero {
            return Err(BlsError::ZeroSecretKey);
        }

        let mut be = [0u8; SECRET_KEY_LEN];
        // SAFETY: `be` is a live 32-byte output buffer.
        unsafe { blst::blst_bendian_from_scalar(be.as_mut_ptr(), &scalar) };
        let result = min_pk::SecretKey::from_bytes(&be)
            .map(Self)
            .map_err(BlsError::InvalidEncoding);
        be.zeroize();
        result
    }

    /// Parse a scalar from a decimal (`radix == 10`) or hexadecimal
    /// (`radix == 16`, optional `0x` prefix) string. Values at or above the
    /// group order are rejected, not reduced.
    pub fn from_str_radix(s: &str, radix: u32) -> Result<Self, BlsError> {
        if radix != 10 && radix != 16 {
            return Err(BlsError::UnsupportedRadix(radix));
        }
        let digits = if radix == 16 {
            s.strip_prefix("0x").unwrap_or(s)
        } else {
            s
        };
        let value =
            BigUint::parse_bytes(digits.as_bytes(), radix).ok_or(BlsError::InvalidScalarString)?;
        if value >= scalar_order() {
            return Err(BlsError::InvalidScalarString);
        }

        let magnitude = value.to_bytes_be();
        let mut be = [0u8; SECRET_KEY_LEN];
        be[SECRET_KEY_LEN - magnitude.len()..].copy_from_slice(&magnitude);
        let result = min_pk::SecretKey::from_bytes(&be)
            .map(Self)
            .map_err(BlsError::InvalidEncoding);
        be.zeroize();
        result
    }

    /// Render the scalar as a decimal or hexadecimal string.
    pub fn to_str_radix(&self, radix: u32) -> Result<String, BlsError> {
        if radix != 10 && radix != 16 {
            return Err(BlsError::UnsupportedRadix(radix));
        }
        Ok(BigUint::from_bytes_be(&self.serialize()).to_str_radix(radix))
    }

    /// Derive the corresponding public key (scalar multiple of the G1
    /// generator).
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.sk_to_pk())
    }

    /// Sign a pre-hashed 32-byte message digest.
    pub fn sign(&self, message: &Message) -> Signature {
        Signature(self.0.sign(message.as_bytes(), DST, &[]))
    }

    /// In-place scalar addition modulo the group order, for key aggregation
    /// and derivation schemes. Fails if the sum reduces to zero.
    pub fn add_assign(&mut self, rhs: &Self) -> Result<(), BlsError> {
        let mut lhs_bytes = self.serialize();
        let mut rhs_bytes = rhs.serialize();
        let mut a = blst::blst_scalar { b: [0u8; 32] };
        let mut b = blst::blst_scalar { b: [0u8; 32] };
        let mut sum = blst::blst_scalar { b: [0u8; 32] };
        // SAFETY: every pointer references a live 32-byte buffer.
        let valid = unsafe {
            blst::blst_scalar_from_bendian(&mut a, lhs_bytes.as_ptr());
            blst::blst_scalar_from_bendian(&mut b, rhs_bytes.as_ptr());
            blst::blst_sk_add_n_check(&mut sum, &a, &b)
        };
        lhs_bytes.zeroize();
        rhs_bytes.zeroize();
        if !valid {
            return Err(BlsError::ZeroSecretKey);
        }

        let mut be = [0u8; SECRET_KEY_LEN];
        // SAFETY: `be` is a live 32-byte output buffer.
        unsafe { blst::blst_bendian_from_scalar(be.as_mut_ptr(), &sum) };
        let next = min_pk::SecretKey::from_bytes(&be).map_err(BlsError::InvalidEncoding);
        be.zeroize();
        self.0 = next?;
        Ok(())
    }
}

/// A BLS12-381 public key: a point in G1, serialized as 48 compressed bytes.
#[derive(Clone)]
pub struct PublicKey(pub(super) min_pk::PublicKey);

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey(0x{})", hex::encode(self.serialize()))
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.serialize() == other.serialize()
    }
}

impl Eq for PublicKey {}

impl Serialize for PublicKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(PublicKey::serialize(self)))
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        PublicKey::deserialize(&bytes).map_err(serde::de::Error::custom)
    }
}

impl PublicKey {
    /// Canonical compressed big-endian encoding.
    pub fn serialize(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.0.to_bytes()
    }

    /// Decode and fully validate a compressed encoding (subgroup and
    /// infinity checks included).
    pub fn deserialize(bytes: &[u8]) -> Result<Self, BlsError> {
        if bytes.len() != PUBLIC_KEY_LEN {
            return Err(BlsError::InvalidLength {
                expected: PUBLIC_KEY_LEN,
                got: bytes.len(),
            });
        }
        let pk = min_pk::PublicKey::from_bytes(bytes).map_err(BlsError::InvalidEncoding)?;
        pk.validate().map_err(BlsError::InvalidEncoding)?;
        Ok(Self(pk))
    }

    /// Single-signature pairing check against a pre-hashed digest.
    pub fn verify(&self, signature: &Signature, message: &Message) -> bool {
        signature
            .0
            .verify(true, message.as_bytes(), DST, &[], &self.0, false)
            == BLST_ERROR::BLST_SUCCESS
    }

    /// In-place point addition, for public-key aggregation.
    pub fn add_assign(&mut self, rhs: &Self) -> Result<(), BlsError> {
        let mut aggregate = min_pk::AggregatePublicKey::from_public_key(&self.0);
        aggregate
            .add_public_key(&rhs.0, false)
            .map_err(BlsError::InvalidEncoding)?;
        self.0 = aggregate.to_public_key();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bls;

    fn make_secret_key(seed: u8) -> SecretKey {
        let ikm = [seed; 32];
        SecretKey(min_pk::SecretKey::key_gen(&ikm, &[]).unwrap())
    }

    #[test]
    fn test_random_keys_are_distinct() {
        assert!(bls::init());
        assert_ne!(SecretKey::random(), SecretKey::random());
    }

    #[test]
    fn test_secret_key_round_trip() {
        let sk = make_secret_key(1);
        let restored = SecretKey::deserialize(&sk.serialize()).unwrap();
        assert_eq!(restored, sk);
    }

    #[test]
    fn test_secret_key_deserialize_requires_exact_length() {
        assert!(matches!(
            SecretKey::deserialize(&[1u8; 31]),
            Err(BlsError::InvalidLength { expected: 32, got: 31 })
        ));
        assert!(SecretKey::deserialize(&[1u8; 33]).is_err());
        // Zero is not a valid scalar.
        assert!(SecretKey::deserialize(&[0u8; 32]).is_err());
    }

    #[test]
    fn test_reduction_is_identity_below_the_order() {
        let sk = make_secret_key(2);
        let bytes = sk.serialize();

        let from_be = SecretKey::from_be_bytes_mod(&bytes).unwrap();
        assert_eq!(from_be, sk);

        let mut le = bytes;
        le.reverse();
        let from_le = SecretKey::from_le_bytes_mod(&le).unwrap();
        assert_eq!(from_le, sk);
    }

    #[test]
    fn test_reduction_accepts_oversized_input() {
        // 64 bytes of 0xff is far above the order; reduction must land on a
        // valid scalar rather than fail.
        let sk = SecretKey::from_be_bytes_mod(&[0xff; 64]).unwrap();
        assert_eq!(sk.serialize().len(), SECRET_KEY_LEN);
    }

    #[test]
    #[should_panic(expected = "empty byte string")]
    fn test_reduction_panics_on_empty_input() {
        let _ = SecretKey::from_be_bytes_mod(&[]);
    }

    #[test]
    fn test_str_radix_round_trip() {
        let sk = make_secret_key(3);

        let decimal = sk.to_str_radix(10).unwrap();
        assert_eq!(SecretKey::from_str_radix(&decimal, 10).unwrap(), sk);

        let hex_str = sk.to_str_radix(16).unwrap();
        assert_eq!(SecretKey::from_str_radix(&hex_str, 16).unwrap(), sk);
        let prefixed = format!("0x{hex_str}");
        assert_eq!(SecretKey::from_str_radix(&prefixed, 16).unwrap(), sk);
    }

    #[test]
    fn test_str_radix_rejects_bad_input() {
        assert!(matches!(
            SecretKey::from_str_radix("12", 2),
            Err(BlsError::UnsupportedRadix(2))
        ));
        assert!(SecretKey::from_str_radix("not a number", 10).is_err());
        // The order itself is out of range.
        let order = std::str::from_utf8(SCALAR_ORDER_HEX).unwrap();
        assert!(matches!(
            SecretKey::from_str_radix(order, 16),
            Err(BlsError::InvalidScalarString)
        ));
    }

    #[test]
    fn test_sign_and_verify() {
        assert!(bls::init());
        let sk = make_secret_key(4);
        let pk = sk.public_key();
        let message = Message::digest(b"attestation data");

        let signature = sk.sign(&message);
        assert!(pk.verify(&signature, &message));
        assert!(!pk.verify(&signature, &Message::digest(b"other data")));
        assert!(!make_secret_key(5).public_key().verify(&signature, &message));
    }

    #[test]
    fn test_public_key_round_trip() {
        let pk = make_secret_key(6).public_key();
        let restored = PublicKey::deserialize(&pk.serialize()).unwrap();
        assert_eq!(restored, pk);
    }

    #[test]
    fn test_public_key_deserialize_rejects_garbage() {
        assert!(matches!(
            PublicKey::deserialize(&[0u8; 47]),
            Err(BlsError::InvalidLength { expected: 48, got: 47 })
        ));
        // Right length, not a curve point.
        assert!(PublicKey::deserialize(&[0x11; 48]).is_err());
    }

    #[test]
    fn test_scalar_addition_matches_point_addition() {
        // g * (a + b) == g * a + g * b, so adding secret keys and adding
        // their public keys must agree.
        assert!(bls::init());
        let mut sk_sum = make_secret_key(7);
        let sk_b = make_secret_key(8);
        let mut pk_sum = sk_sum.public_key();
        let pk_b = sk_b.public_key();

        sk_sum.add_assign(&sk_b).unwrap();
        pk_sum.add_assign(&pk_b).unwrap();

        assert_eq!(sk_sum.public_key(), pk_sum);

        // And the combined key signs messages the combined pubkey accepts.
        let message = Message::digest(b"combined");
        assert!(pk_sum.verify(&sk_sum.sign(&message), &message));
    }

    #[test]
    fn test_public_key_hex_serde() {
        let pk = make_secret_key(9).public_key();
        let json = serde_json::to_string(&pk).unwrap();
        let decoded: PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, pk);
    }
}
