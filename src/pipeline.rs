//! Issue and validation pipelines.
//!
//! Validation is a strictly ordered state machine; every step is a
//! terminal failure point and the order is a security property. The
//! signature is checked before the petal is ever decrypted, so forged
//! ciphertext never reaches the cipher, and trust decisions (allow-lists,
//! time window) only run over authenticated data.

use serde_json::Value;

use crate::ClaimMap;
use crate::algorithm::Algorithm;
use crate::cipher::PetalCipher;
use crate::codec;
use crate::config::TokenConfig;
use crate::crown::CrownCodec;
use crate::error::{JptError, JptResult};
use crate::payload::TokenPayload;
use crate::petal::PetalCodec;
use crate::thorn::ThornCodec;

/// Encode pipeline: build crown, bind and encrypt petal, sign, join.
pub(crate) fn issue<C>(
    config: &TokenConfig,
    cipher: &C,
    crown_claims: &ClaimMap,
    petal_claims: &ClaimMap,
    now: i64,
) -> JptResult<(String, ClaimMap, ClaimMap)>
where
    C: PetalCipher + ?Sized,
{
    let signer = config.alg().signer();

    let crown = CrownCodec::build(config, crown_claims, now);
    let crown_b64 = codec::encode_json(&crown)?;
    let (petal, petal_encrypted) = PetalCodec::build(petal_claims, &crown, cipher)?;
    let thorn = ThornCodec::sign(&crown_b64, &petal_encrypted, signer.as_ref(), config.keys())?;

    Ok((format!("{crown_b64}.{petal_encrypted}.{thorn}"), crown, petal))
}

/// Decode-and-verify pipeline. See the module docs for the ordering
/// contract; each numbered step below is terminal on failure.
pub(crate) fn validate<C>(
    token: &str,
    config: &TokenConfig,
    cipher: &C,
    now: i64,
) -> JptResult<TokenPayload>
where
    C: PetalCipher + ?Sized,
{
    // 1. Split: exactly three segments.
    let segments: Vec<&str> = token.split('.').collect();
    let [crown_b64, petal_encrypted, thorn] = segments.as_slice() else {
        return Err(JptError::MalformedToken);
    };

    // 2. Decode crown; algorithm must be present and supported.
    let crown = CrownCodec::decode(crown_b64)?;
    let alg_name = crown
        .get("alg")
        .and_then(Value::as_str)
        .ok_or_else(|| JptError::InvalidCrown("missing alg claim".to_string()))?;
    let alg = Algorithm::from_name(alg_name)?;

    // 3. Verify signature before touching the petal ciphertext.
    let signer = alg.signer();
    if !ThornCodec::verify(crown_b64, petal_encrypted, thorn, signer.as_ref(), config.keys())? {
        return Err(JptError::SignatureInvalid);
    }

    // 4. Decode petal.
    let petal = PetalCodec::decode(petal_encrypted, cipher)?;

    // 5. Verify the crown digest binding.
    if !PetalCodec::verify_digest(&petal, &crown)? {
        return Err(JptError::DigestMismatch);
    }

    // 6. Issuer allow-list.
    let iss = crown.get("iss").and_then(Value::as_str).unwrap_or_default();
    if !config.allows_issuer(iss) {
        return Err(JptError::IssuerNotAllowed);
    }

    // 7. Audience allow-list.
    let aud = crown.get("aud").and_then(Value::as_str).unwrap_or_default();
    if !config.allows_audience(aud) {
        return Err(JptError::AudienceNotAllowed);
    }

    // 8. Not-before window.
    if let Some(nbf) = crown.get("nbf").and_then(Value::as_i64) {
        if now + config.leeway() < nbf {
            return Err(JptError::NotYetValid);
        }
    }

    // 9. Expiry window.
    if let Some(exp) = crown.get("exp").and_then(Value::as_i64) {
        if now >= exp + config.leeway() {
            return Err(JptError::Expired);
        }
    }

    // 10. Accept.
    Ok(TokenPayload::from_zones(token, crown, petal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::SealedPetalCipher;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000;

    fn config() -> TokenConfig {
        TokenConfig::builder()
            .secret(b"test-secret".to_vec())
            .issuer("auth.example.com")
            .audience("payments")
            .ttl(600)
            .allow_issuer("auth.example.com")
            .allow_audience("payments")
            .build()
    }

    fn cipher(config: &TokenConfig) -> SealedPetalCipher {
        SealedPetalCipher::new(config.keys().secret().unwrap_or_default())
    }

    fn issue_token(config: &TokenConfig) -> String {
        let mut crown_claims = ClaimMap::new();
        crown_claims.insert("role".to_string(), json!("admin"));
        let mut petal_claims = ClaimMap::new();
        petal_claims.insert("env".to_string(), json!("prod"));
        let (token, _, _) =
            issue(config, &cipher(config), &crown_claims, &petal_claims, NOW).unwrap();
        token
    }

    #[test]
    fn round_trip_preserves_claims() {
        let config = config();
        let token = issue_token(&config);
        let payload = validate(&token, &config, &cipher(&config), NOW).unwrap();

        assert_eq!(payload.issuer(), "auth.example.com");
        assert_eq!(payload.audience(), "payments");
        assert_eq!(payload.issued_at(), NOW);
        assert_eq!(payload.not_before(), NOW);
        assert_eq!(payload.expires_at(), NOW + 600);
        assert_eq!(payload.algorithm(), "HS256");
        assert_eq!(payload.token_type(), "JPT");
        assert!(payload.token_id().starts_with("jpt."));
        assert_eq!(payload.crown_claim("role"), Some(&json!("admin")));
        assert_eq!(payload.petal_claim("env"), Some(&json!("prod")));
    }

    #[test]
    fn wrong_segment_counts_fail_before_decoding() {
        let config = config();
        let cipher = cipher(&config);
        for bad in ["a", "a.b", "a.b.c.d", ""] {
            let err = validate(bad, &config, &cipher, NOW).unwrap_err();
            assert_eq!(err.code(), Some(401_001), "token {bad:?}");
        }
    }

    #[test]
    fn thorn_tampering_is_signature_invalid() {
        let config = config();
        let token = issue_token(&config);

        let (head, thorn) = token.rsplit_once('.').unwrap();
        let flipped = if thorn.as_bytes()[0] == b'A' { 'B' } else { 'A' };
        let tampered = format!("{head}.{flipped}{}", &thorn[1..]);

        let err = validate(&tampered, &config, &cipher(&config), NOW).unwrap_err();
        assert_eq!(err.code(), Some(401_005));
    }

    #[test]
    fn crown_tampering_without_resigning_is_signature_invalid() {
        let config = config();
        let token = issue_token(&config);
        let parts: Vec<&str> = token.split('.').collect();

        let mut crown = CrownCodec::decode(parts[0]).unwrap();
        crown.insert("exp".to_string(), json!(NOW + 999_999));
        let forged_crown = codec::encode_json(&crown).unwrap();

        let forged = format!("{forged_crown}.{}.{}", parts[1], parts[2]);
        let err = validate(&forged, &config, &cipher(&config), NOW).unwrap_err();
        assert_eq!(err.code(), Some(401_005));
    }

    #[test]
    fn crown_tampering_with_resigning_is_digest_mismatch() {
        let config = config();
        let token = issue_token(&config);
        let parts: Vec<&str> = token.split('.').collect();

        // Attacker who somehow holds the signing secret still trips the
        // digest binding if the petal is not rebuilt to match.
        let mut crown = CrownCodec::decode(parts[0]).unwrap();
        crown.insert("exp".to_string(), json!(NOW + 999_999));
        let forged_crown = codec::encode_json(&crown).unwrap();
        let signer = Algorithm::Hs256.signer();
        let forged_thorn =
            ThornCodec::sign(&forged_crown, parts[1], signer.as_ref(), config.keys()).unwrap();

        let forged = format!("{forged_crown}.{}.{forged_thorn}", parts[1]);
        let err = validate(&forged, &config, &cipher(&config), NOW).unwrap_err();
        assert_eq!(err.code(), Some(401_006));
    }

    #[test]
    fn unsupported_algorithm_in_crown() {
        let config = config();
        let mut crown = ClaimMap::new();
        crown.insert("alg".to_string(), json!("ES256"));
        let token = format!("{}.petal.thorn", codec::encode_json(&crown).unwrap());
        let err = validate(&token, &config, &cipher(&config), NOW).unwrap_err();
        assert_eq!(err.code(), Some(401_004));
    }

    #[test]
    fn mismatched_cipher_seed_is_a_decode_failure() {
        let config = config();
        let token = issue_token(&config);
        let err = validate(&token, &config, &SealedPetalCipher::new(b"other"), NOW).unwrap_err();
        assert_eq!(err.code(), Some(401_013));
    }

    #[test]
    fn issuer_allow_list_is_enforced() {
        let issuing = TokenConfig::builder()
            .secret(b"test-secret".to_vec())
            .issuer("B")
            .audience("payments")
            .build();
        let token = issue_token(&issuing);

        let verifying = TokenConfig::builder()
            .secret(b"test-secret".to_vec())
            .allow_issuer("A")
            .allow_audience("*")
            .build();
        let err = validate(&token, &verifying, &cipher(&verifying), NOW).unwrap_err();
        assert_eq!(err.code(), Some(401_007));

        let wildcard = TokenConfig::builder()
            .secret(b"test-secret".to_vec())
            .allow_issuer("*")
            .allow_audience("*")
            .build();
        assert!(validate(&token, &wildcard, &cipher(&wildcard), NOW).is_ok());
    }

    #[test]
    fn audience_allow_list_is_enforced() {
        let config = config();
        let token = issue_token(&config);

        let verifying = TokenConfig::builder()
            .secret(b"test-secret".to_vec())
            .allow_issuer("*")
            .allow_audience("billing")
            .build();
        let err = validate(&token, &verifying, &cipher(&verifying), NOW).unwrap_err();
        assert_eq!(err.code(), Some(401_008));
    }

    #[test]
    fn leeway_absorbs_future_nbf() {
        let base = TokenConfig::builder()
            .secret(b"test-secret".to_vec())
            .issuer("A")
            .audience("B")
            .not_before(NOW + 5)
            .allow_issuer("*")
            .allow_audience("*");

        let strict = base.clone().leeway(4).build();
        let token = issue_token(&strict);
        let err = validate(&token, &strict, &cipher(&strict), NOW).unwrap_err();
        assert_eq!(err.code(), Some(401_010));

        let lenient = base.leeway(5).build();
        assert!(validate(&token, &lenient, &cipher(&lenient), NOW).is_ok());
    }

    #[test]
    fn zero_ttl_token_is_already_expired() {
        let config = TokenConfig::builder()
            .secret(b"test-secret".to_vec())
            .ttl(0)
            .allow_issuer("*")
            .allow_audience("*")
            .build();
        let token = issue_token(&config);
        let err = validate(&token, &config, &cipher(&config), NOW).unwrap_err();
        assert_eq!(err.code(), Some(401_012));
    }

    #[test]
    fn expiry_leeway_extends_the_window() {
        let config = TokenConfig::builder()
            .secret(b"test-secret".to_vec())
            .ttl(0)
            .leeway(10)
            .allow_issuer("*")
            .allow_audience("*")
            .build();
        let token = issue_token(&config);
        assert!(validate(&token, &config, &cipher(&config), NOW + 9).is_ok());
        let err = validate(&token, &config, &cipher(&config), NOW + 10).unwrap_err();
        assert_eq!(err.code(), Some(401_012));
    }

    #[test]
    fn reserved_caller_claims_never_reach_the_wire() {
        let config = config();
        let mut crown_claims = ClaimMap::new();
        crown_claims.insert("iat".to_string(), json!(1));
        let (token, _, _) =
            issue(&config, &cipher(&config), &crown_claims, &ClaimMap::new(), NOW).unwrap();
        let payload = validate(&token, &config, &cipher(&config), NOW).unwrap();
        assert_eq!(payload.issued_at(), NOW);
    }
}
