//! URL-safe base64 and canonical JSON plumbing shared by all three zones.
//!
//! Wire segments are base64url without padding (RFC 7515 style). Canonical
//! JSON here means serde_json's default output: slashes and non-ASCII stay
//! unescaped, and map order is preserved, so the crown digest is stable
//! across encode/decode round trips.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

use crate::ClaimMap;
use crate::error::JptResult;

/// Base64 URL-safe encoding without padding.
#[inline]
pub(crate) fn b64url_encode(input: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

/// Base64 URL-safe decoding without padding.
#[inline]
pub(crate) fn b64url_decode(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(input)
}

/// Canonical JSON text of a claim map.
pub(crate) fn canonical_json(map: &ClaimMap) -> JptResult<String> {
    Ok(serde_json::to_string(map)?)
}

/// Encode a claim map as a wire segment: canonical JSON, then base64url.
pub(crate) fn encode_json(map: &ClaimMap) -> JptResult<String> {
    Ok(b64url_encode(canonical_json(map)?.as_bytes()))
}

/// Decode a wire segment into a claim map. Anything that is not valid
/// base64url wrapping a JSON object is a decode failure.
pub(crate) fn decode_json(segment: &str) -> JptResult<ClaimMap> {
    let bytes = b64url_decode(segment)?;
    Ok(serde_json::from_slice(&bytes)?)
}
