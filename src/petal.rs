//! Petal zone: the private, encrypted claim map and its crown binding.
//!
//! The petal always carries a `digest` claim: the hex SHA-256 of the final
//! crown's canonical JSON. The digest detects crown tampering and
//! crown/petal desynchronization independently of the thorn signature.

use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::ClaimMap;
use crate::cipher::PetalCipher;
use crate::codec;
use crate::error::{JptError, JptResult};

/// Name of the binding claim. The codec owns it; caller values are
/// overwritten unconditionally.
pub const DIGEST_CLAIM: &str = "digest";

/// Builds and parses the petal zone.
pub(crate) struct PetalCodec;

impl PetalCodec {
    /// Hex SHA-256 over the canonical JSON of a crown.
    pub(crate) fn digest(crown: &ClaimMap) -> JptResult<String> {
        let canonical = codec::canonical_json(crown)?;
        Ok(hex::encode(Sha256::digest(canonical.as_bytes())))
    }

    /// Assemble the final petal and its encrypted wire segment.
    pub(crate) fn build<C>(
        private_claims: &ClaimMap,
        final_crown: &ClaimMap,
        cipher: &C,
    ) -> JptResult<(ClaimMap, String)>
    where
        C: PetalCipher + ?Sized,
    {
        let mut petal = private_claims.clone();
        petal.insert(DIGEST_CLAIM.to_string(), json!(Self::digest(final_crown)?));
        petal.retain(|_, value| !value.is_null());

        let plaintext = codec::canonical_json(&petal)?;
        let ciphertext = cipher.encrypt(plaintext.as_bytes())?;
        Ok((petal, codec::b64url_encode(&ciphertext)))
    }

    /// Decrypt and decode the petal wire segment.
    pub(crate) fn decode<C>(encrypted: &str, cipher: &C) -> JptResult<ClaimMap>
    where
        C: PetalCipher + ?Sized,
    {
        let ciphertext = codec::b64url_decode(encrypted)?;
        let plaintext = cipher.decrypt(&ciphertext)?;
        let petal: ClaimMap = serde_json::from_slice(&plaintext)?;
        if !petal.contains_key(DIGEST_CLAIM) {
            return Err(JptError::InvalidPetal("missing digest claim".to_string()));
        }
        Ok(petal)
    }

    /// Recompute the crown digest and compare it to the petal's copy in
    /// constant time.
    pub(crate) fn verify_digest(petal: &ClaimMap, crown: &ClaimMap) -> JptResult<bool> {
        let expected = Self::digest(crown)?;
        let stored = match petal.get(DIGEST_CLAIM).and_then(Value::as_str) {
            Some(stored) => stored,
            None => return Ok(false),
        };
        Ok(expected.as_bytes().ct_eq(stored.as_bytes()).into())
    }
}
