//! Immutable view of a successfully validated token.

use serde_json::Value;

use crate::ClaimMap;

/// Read-only result of validation (or of the issue-and-wrap convenience
/// path). Never constructed from unverified data and never mutated.
#[derive(Debug, Clone)]
pub struct TokenPayload {
    iss: String,
    sub: Option<String>,
    aud: String,
    iat: i64,
    exp: i64,
    nbf: i64,
    jti: String,
    alg: String,
    typ: String,
    token: String,
    crown: ClaimMap,
    petal: ClaimMap,
}

impl TokenPayload {
    pub(crate) fn from_zones(token: &str, crown: ClaimMap, petal: ClaimMap) -> Self {
        let string_claim = |key: &str| {
            crown
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let numeric_claim = |key: &str| crown.get(key).and_then(Value::as_i64).unwrap_or(0);

        let iat = numeric_claim("iat");
        Self {
            iss: string_claim("iss"),
            sub: crown.get("sub").and_then(Value::as_str).map(String::from),
            aud: string_claim("aud"),
            iat,
            exp: numeric_claim("exp"),
            nbf: crown.get("nbf").and_then(Value::as_i64).unwrap_or(iat),
            jti: string_claim("jti"),
            alg: string_claim("alg"),
            typ: crown
                .get("typ")
                .and_then(Value::as_str)
                .unwrap_or("JPT")
                .to_string(),
            token: token.to_string(),
            crown,
            petal,
        }
    }

    /// Issuer.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.iss
    }

    /// Subject, if present.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.sub.as_deref()
    }

    /// Audience.
    #[must_use]
    pub fn audience(&self) -> &str {
        &self.aud
    }

    /// Issued-at, unix seconds.
    #[must_use]
    pub fn issued_at(&self) -> i64 {
        self.iat
    }

    /// Expiry, unix seconds.
    #[must_use]
    pub fn expires_at(&self) -> i64 {
        self.exp
    }

    /// Not-before, unix seconds. Defaults to the issued-at time.
    #[must_use]
    pub fn not_before(&self) -> i64 {
        self.nbf
    }

    /// Unique token id.
    #[must_use]
    pub fn token_id(&self) -> &str {
        &self.jti
    }

    /// Algorithm tag from the crown.
    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.alg
    }

    /// Token type tag, `"JPT"`.
    #[must_use]
    pub fn token_type(&self) -> &str {
        &self.typ
    }

    /// The raw token string this payload was validated from.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The full crown map.
    #[must_use]
    pub fn crown(&self) -> &ClaimMap {
        &self.crown
    }

    /// The full petal map (including the binding digest).
    #[must_use]
    pub fn petal(&self) -> &ClaimMap {
        &self.petal
    }

    /// Look up a single crown claim.
    #[must_use]
    pub fn crown_claim(&self, key: &str) -> Option<&Value> {
        self.crown.get(key)
    }

    /// Look up a single petal claim.
    #[must_use]
    pub fn petal_claim(&self, key: &str) -> Option<&Value> {
        self.petal.get(key)
    }

    /// Seconds until expiry as of `now`, clamped at zero.
    #[must_use]
    pub fn expires_in(&self, now: i64) -> i64 {
        (self.exp - now).max(0)
    }
}
