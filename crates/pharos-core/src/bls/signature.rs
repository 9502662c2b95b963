//! Signatures and aggregation.

use crate::bls::keys::PublicKey;
use crate::bls::{BlsError, Message, DST, MESSAGE_LEN, SIGNATURE_LEN};
use blst::min_pk::{self, AggregateSignature};
use blst::BLST_ERROR;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A BLS12-381 signature: a point in G2, serialized as 96 compressed bytes.
#[derive(Clone)]
pub struct Signature(pub(super) min_pk::Signature);

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature(0x{})", hex::encode(self.serialize()))
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.serialize() == other.serialize()
    }
}

impl Eq for Signature {}

impl Serialize for Signature {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(Signature::serialize(self)))
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        Signature::deserialize(&bytes).map_err(serde::de::Error::custom)
    }
}

impl Signature {
    /// Canonical compressed big-endian encoding.
    pub fn serialize(&self) -> [u8; SIGNATURE_LEN] {
        self.0.to_bytes()
    }

    /// Decode and group-check a compressed encoding.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, BlsError> {
        if bytes.len() != SIGNATURE_LEN {
            return Err(BlsError::InvalidLength {
                expected: SIGNATURE_LEN,
                got: bytes.len(),
            });
        }
        let sig = min_pk::Signature::from_bytes(bytes).map_err(BlsError::InvalidEncoding)?;
        sig.validate(true).map_err(BlsError::InvalidEncoding)?;
        Ok(Self(sig))
    }

    /// In-place point addition.
    pub fn add_assign(&mut self, rhs: &Self) -> Result<(), BlsError> {
        let mut aggregate = AggregateSignature::from_signature(&self.0);
        aggregate
            .add_signature(&rhs.0, false)
            .map_err(BlsError::InvalidEncoding)?;
        self.0 = aggregate.to_signature();
        Ok(())
    }

    /// Combine signatures into one by repeated point addition.
    ///
    /// An empty input yields [`BlsError::EmptyAggregation`] and no result.
    pub fn aggregate(signatures: &[Signature]) -> Result<Signature, BlsError> {
        let (first, rest) = signatures.split_first().ok_or(BlsError::EmptyAggregation)?;
        let mut aggregate = AggregateSignature::from_signature(&first.0);
        for signature in rest {
            aggregate
                .add_signature(&signature.0, false)
                .map_err(BlsError::InvalidEncoding)?;
        }
        Ok(Signature(aggregate.to_signature()))
    }

    /// Verify this aggregate signature against many public keys that all
    /// signed the same digest.
    ///
    /// An empty key set is a caller-contract violation, surfaced as
    /// [`BlsError::EmptyAggregation`] rather than a plain rejection so the
    /// caller can halt instead of treating it as an invalid signature.
    pub fn fast_aggregate_verify(
        &self,
        public_keys: &[PublicKey],
        message: &Message,
    ) -> Result<bool, BlsError> {
        if public_keys.is_empty() {
            return Err(BlsError::EmptyAggregation);
        }
        let pk_refs: Vec<&min_pk::PublicKey> = public_keys.iter().map(|pk| &pk.0).collect();
        Ok(self
            .0
            .fast_aggregate_verify(true, message.as_bytes(), DST, &pk_refs)
            == BLST_ERROR::BLST_SUCCESS)
    }

    /// Verify this aggregate signature against parallel sequences of public
    /// keys and per-signer digests, without checking that the digests are
    /// pairwise distinct. The caller asserts uniqueness.
    ///
    /// Returns `false` if either sequence is empty or their lengths differ.
    pub fn aggregate_verify_nocheck(
        &self,
        public_keys: &[PublicKey],
        messages: &[Message],
    ) -> bool {
        if public_keys.is_empty() || messages.is_empty() || public_keys.len() != messages.len() {
            return false;
        }
        let pk_refs: Vec<&min_pk::PublicKey> = public_keys.iter().map(|pk| &pk.0).collect();
        let msg_refs: Vec<&[u8]> = messages
            .iter()
            .map(|message| message.as_bytes().as_slice())
            .collect();
        self.0.aggregate_verify(true, &msg_refs, DST, &pk_refs, false) == BLST_ERROR::BLST_SUCCESS
    }

    /// Like [`aggregate_verify_nocheck`](Self::aggregate_verify_nocheck),
    /// but first rejects duplicate digests. Aggregate verification over
    /// repeated messages is forgeable, so the distinctness gate runs before
    /// any pairing work.
    pub fn aggregate_verify(&self, public_keys: &[PublicKey], messages: &[Message]) -> bool {
        let mut seen: HashSet<&[u8; MESSAGE_LEN]> = HashSet::with_capacity(messages.len());
        for message in messages {
            if !seen.insert(message.as_bytes()) {
                return false;
            }
        }
        self.aggregate_verify_nocheck(public_keys, messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bls::{self, SecretKey};

    fn make_keypair(seed: u8) -> (SecretKey, PublicKey) {
        let sk = SecretKey::deserialize(&{
            let mut bytes = [0u8; 32];
            bytes[31] = seed;
            bytes
        })
        .unwrap();
        let pk = sk.public_key();
        (sk, pk)
    }

    fn make_signers(count: u8, message: &Message) -> (Vec<PublicKey>, Vec<Signature>) {
        let mut public_keys = Vec::new();
        let mut signatures = Vec::new();
        for seed in 1..=count {
            let (sk, pk) = make_keypair(seed);
            signatures.push(sk.sign(message));
            public_keys.push(pk);
        }
        (public_keys, signatures)
    }

    #[test]
    fn test_signature_round_trip() {
        assert!(bls::init());
        let (sk, _) = make_keypair(1);
        let signature = sk.sign(&Message::digest(b"round trip"));
        let restored = Signature::deserialize(&signature.serialize()).unwrap();
        assert_eq!(restored, signature);
    }

    #[test]
    fn test_signature_deserialize_rejects_garbage() {
        assert!(matches!(
            Signature::deserialize(&[0u8; 95]),
            Err(BlsError::InvalidLength { expected: 96, got: 95 })
        ));
        assert!(Signature::deserialize(&[0x22; 96]).is_err());
    }

    #[test]
    fn test_aggregate_and_fast_aggregate_verify() {
        assert!(bls::init());
        let message = Message::digest(b"same message for everyone");
        let (public_keys, signatures) = make_signers(5, &message);

        let aggregate = Signature::aggregate(&signatures).unwrap();
        assert!(aggregate
            .fast_aggregate_verify(&public_keys, &message)
            .unwrap());

        // Wrong digest fails the pairing, not the contract.
        assert!(!aggregate
            .fast_aggregate_verify(&public_keys, &Message::digest(b"different"))
            .unwrap());

        // Missing one signer's key fails verification.
        assert!(!aggregate
            .fast_aggregate_verify(&public_keys[..4], &message)
            .unwrap());
    }

    #[test]
    fn test_fast_aggregate_verify_rejects_empty_key_set() {
        assert!(bls::init());
        let (sk, _) = make_keypair(1);
        let message = Message::digest(b"empty");
        let signature = sk.sign(&message);

        assert!(matches!(
            signature.fast_aggregate_verify(&[], &message),
            Err(BlsError::EmptyAggregation)
        ));
    }

    #[test]
    fn test_aggregate_rejects_empty_input() {
        assert!(matches!(
            Signature::aggregate(&[]),
            Err(BlsError::EmptyAggregation)
        ));
    }

    #[test]
    fn test_add_assign_matches_aggregate() {
        assert!(bls::init());
        let message = Message::digest(b"additivity");
        let (_, signatures) = make_signers(3, &message);

        let mut running = signatures[0].clone();
        running.add_assign(&signatures[1]).unwrap();
        running.add_assign(&signatures[2]).unwrap();

        assert_eq!(running, Signature::aggregate(&signatures).unwrap());
    }

    #[test]
    fn test_aggregate_verify_distinct_messages() {
        assert!(bls::init());
        let mut public_keys = Vec::new();
        let mut signatures = Vec::new();
        let messages: Vec<Message> = (0u8..4).map(|i| Message::digest(&[i])).collect();
        for (i, message) in messages.iter().enumerate() {
            let (sk, pk) = make_keypair(i as u8 + 1);
            signatures.push(sk.sign(message));
            public_keys.push(pk);
        }
        let aggregate = Signature::aggregate(&signatures).unwrap();

        assert!(aggregate.aggregate_verify(&public_keys, &messages));
        assert!(aggregate.aggregate_verify_nocheck(&public_keys, &messages));

        // Reordering the messages breaks the key/message pairing.
        let mut shuffled = messages.clone();
        shuffled.swap(0, 1);
        assert!(!aggregate.aggregate_verify(&public_keys, &shuffled));
    }

    #[test]
    fn test_aggregate_verify_rejects_duplicate_digests() {
        // Two signers over the same digest: the underlying pairing accepts
        // it (the nocheck variant proves that), but the checked variant must
        // refuse before doing any pairing work.
        assert!(bls::init());
        let message = Message::digest(b"duplicated");
        let (public_keys, signatures) = make_signers(2, &message);
        let aggregate = Signature::aggregate(&signatures).unwrap();
        let messages = [message, message];

        assert!(aggregate.aggregate_verify_nocheck(&public_keys, &messages));
        assert!(!aggregate.aggregate_verify(&public_keys, &messages));
    }

    #[test]
    fn test_aggregate_verify_rejects_empty_and_mismatched_inputs() {
        assert!(bls::init());
        let message = Message::digest(b"shape checks");
        let (public_keys, signatures) = make_signers(2, &message);
        let aggregate = Signature::aggregate(&signatures).unwrap();

        assert!(!aggregate.aggregate_verify_nocheck(&[], &[message]));
        assert!(!aggregate.aggregate_verify_nocheck(&public_keys, &[]));
        assert!(!aggregate.aggregate_verify_nocheck(&public_keys, &[message]));
        assert!(!aggregate.aggregate_verify(&public_keys, &[message]));
    }

    #[test]
    fn test_signature_hex_serde() {
        assert!(bls::init());
        let (sk, _) = make_keypair(3);
        let signature = sk.sign(&Message::digest(b"serde"));
        let json = serde_json::to_string(&signature).unwrap();
        let decoded: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, signature);
    }
}
