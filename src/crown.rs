//! Crown zone: the public, unencrypted claim map.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{Value, json};
use sha2::{Digest, Sha256};

use crate::ClaimMap;
use crate::codec;
use crate::config::TokenConfig;
use crate::error::{JptError, JptResult};

/// Claim names only the issuing process may write. Caller attempts to set
/// or unset them are silently ignored.
pub const RESERVED_CLAIMS: [&str; 9] = [
    "iss", "sub", "aud", "nbf", "iat", "exp", "jti", "alg", "typ",
];

/// Builds and parses the crown zone.
pub(crate) struct CrownCodec;

impl CrownCodec {
    /// Assemble the final crown from caller claims and configuration.
    ///
    /// Reserved keys supplied by the caller are stripped first, then the
    /// issuing process writes its own. Null-valued claims are dropped so
    /// the wire form never carries nulls.
    pub(crate) fn build(config: &TokenConfig, caller_claims: &ClaimMap, now: i64) -> ClaimMap {
        let mut crown = ClaimMap::new();
        for (key, value) in caller_claims {
            if !RESERVED_CLAIMS.contains(&key.as_str()) {
                crown.insert(key.clone(), value.clone());
            }
        }

        crown.insert("alg".to_string(), json!(config.alg().name()));
        crown.insert("iss".to_string(), json!(config.issuer()));
        if let Some(sub) = config.subject() {
            if !sub.is_empty() {
                crown.insert("sub".to_string(), json!(sub));
            }
        }
        crown.insert("aud".to_string(), json!(config.audience()));
        crown.insert("iat".to_string(), json!(now));
        crown.insert("nbf".to_string(), json!(config.not_before().unwrap_or(now)));
        crown.insert("exp".to_string(), json!(now + config.ttl()));
        crown.insert("jti".to_string(), json!(token_id()));
        crown.insert("typ".to_string(), json!("JPT"));

        crown.retain(|_, value| !value.is_null());
        crown
    }

    /// Decode the crown wire segment.
    pub(crate) fn decode(crown_b64: &str) -> JptResult<ClaimMap> {
        let crown = codec::decode_json(crown_b64)?;
        if !crown.get("alg").is_some_and(Value::is_string) {
            return Err(JptError::InvalidCrown("missing alg claim".to_string()));
        }
        Ok(crown)
    }
}

/// Unique token id: `jpt.` plus 16 random bytes, hex-encoded.
///
/// If the OS randomness source fails the id degrades to a time-and-counter
/// scheme. That is unfit for security-sensitive deployments, so it is
/// surfaced loudly rather than swallowed.
fn token_id() -> String {
    let mut bytes = [0u8; 16];
    match getrandom::fill(&mut bytes) {
        Ok(()) => format!("jpt.{}", hex::encode(bytes)),
        Err(err) => {
            tracing::warn!(
                error = %err,
                "secure randomness unavailable, degrading to non-cryptographic token id"
            );
            format!("jpt.{}", fallback_id())
        }
    }
}

fn fallback_id() -> String {
    static SEQUENCE: AtomicU64 = AtomicU64::new(0);

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);

    let mut hasher = Sha256::new();
    hasher.update(nanos.to_le_bytes());
    hasher.update(seq.to_le_bytes());
    hasher.update(std::process::id().to_le_bytes());
    hex::encode(&hasher.finalize()[..16])
}
