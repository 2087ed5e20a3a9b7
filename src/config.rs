//! Immutable token configuration.
//!
//! A [`TokenConfig`] is built once and never mutated mid-operation. Changing
//! the secret produces a new snapshot via [`TokenConfig::with_secret`];
//! in-flight operations keep seeing the snapshot they started with.

use std::collections::HashSet;
use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::algorithm::Algorithm;

const DEFAULT_PARTY: &str = "nameless";
const DEFAULT_TTL: i64 = 3600;

/// Key bytes that are wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub(crate) struct Secret(Vec<u8>);

impl Secret {
    fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Key material a signer may draw on. Symmetric secret, asymmetric private
/// key (PKCS#8 DER), asymmetric public key (SPKI DER).
#[derive(Clone, Default)]
pub struct KeyMaterial {
    secret: Option<Secret>,
    private_key: Option<Secret>,
    passphrase: Option<Secret>,
    public_key: Option<Vec<u8>>,
}

impl KeyMaterial {
    /// Symmetric secret, if configured.
    #[must_use]
    pub fn secret(&self) -> Option<&[u8]> {
        self.secret.as_ref().map(Secret::as_bytes)
    }

    /// Asymmetric private key (PKCS#8 DER), if configured.
    #[must_use]
    pub fn private_key(&self) -> Option<&[u8]> {
        self.private_key.as_ref().map(Secret::as_bytes)
    }

    /// Passphrase for an encrypted private key, if configured.
    #[must_use]
    pub fn passphrase(&self) -> Option<&[u8]> {
        self.passphrase.as_ref().map(Secret::as_bytes)
    }

    /// Asymmetric public key (SPKI DER), if configured.
    #[must_use]
    pub fn public_key(&self) -> Option<&[u8]> {
        self.public_key.as_deref()
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<redacted>"))
            .field("public_key", &self.public_key.as_ref().map(|k| k.len()))
            .finish()
    }
}

/// Immutable configuration for issuing and validating tokens.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    alg: Algorithm,
    keys: KeyMaterial,
    iss: String,
    aud: String,
    sub: Option<String>,
    ttl: i64,
    leeway: i64,
    nbf: Option<i64>,
    allowed_issuers: HashSet<String>,
    allowed_audiences: HashSet<String>,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            alg: Algorithm::Hs256,
            keys: KeyMaterial::default(),
            iss: DEFAULT_PARTY.to_string(),
            aud: DEFAULT_PARTY.to_string(),
            sub: None,
            ttl: DEFAULT_TTL,
            leeway: 0,
            nbf: None,
            allowed_issuers: HashSet::new(),
            allowed_audiences: HashSet::new(),
        }
    }
}

impl TokenConfig {
    /// Start building a configuration.
    #[must_use]
    pub fn builder() -> TokenConfigBuilder {
        TokenConfigBuilder {
            config: TokenConfig::default(),
        }
    }

    /// Signature algorithm used at issuance.
    #[must_use]
    pub fn alg(&self) -> Algorithm {
        self.alg
    }

    /// Configured key material.
    #[must_use]
    pub fn keys(&self) -> &KeyMaterial {
        &self.keys
    }

    /// Issuer written into the crown.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.iss
    }

    /// Audience written into the crown.
    #[must_use]
    pub fn audience(&self) -> &str {
        &self.aud
    }

    /// Subject written into the crown, if any.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.sub.as_deref()
    }

    /// Token lifetime in seconds.
    #[must_use]
    pub fn ttl(&self) -> i64 {
        self.ttl
    }

    /// Clock-skew tolerance in seconds applied to nbf/exp checks.
    #[must_use]
    pub fn leeway(&self) -> i64 {
        self.leeway
    }

    /// Fixed not-before timestamp, if any. Defaults to the issuance time.
    #[must_use]
    pub fn not_before(&self) -> Option<i64> {
        self.nbf
    }

    /// Whether a token issuer passes the allow-list. The `"*"` sentinel
    /// accepts any issuer.
    #[must_use]
    pub fn allows_issuer(&self, iss: &str) -> bool {
        self.allowed_issuers.contains("*") || self.allowed_issuers.contains(iss)
    }

    /// Whether a token audience passes the allow-list. The `"*"` sentinel
    /// accepts any audience.
    #[must_use]
    pub fn allows_audience(&self, aud: &str) -> bool {
        self.allowed_audiences.contains("*") || self.allowed_audiences.contains(aud)
    }

    /// New configuration snapshot with a replaced symmetric secret.
    ///
    /// Any cipher or signer state keyed on the old secret must be
    /// re-derived from the returned snapshot.
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<Vec<u8>>) -> Self {
        self.keys.secret = Some(Secret::new(secret.into()));
        self
    }
}

/// Consuming builder for [`TokenConfig`]. Each setter returns a new value;
/// nothing is shared until `build`.
#[derive(Debug, Clone)]
pub struct TokenConfigBuilder {
    config: TokenConfig,
}

impl TokenConfigBuilder {
    /// Set the signature algorithm.
    #[must_use]
    pub fn algorithm(mut self, alg: Algorithm) -> Self {
        self.config.alg = alg;
        self
    }

    /// Set the symmetric secret (HMAC signing and petal cipher seed).
    #[must_use]
    pub fn secret(mut self, secret: impl Into<Vec<u8>>) -> Self {
        self.config.keys.secret = Some(Secret::new(secret.into()));
        self
    }

    /// Set the RSA private key, PKCS#8 DER. Encrypted keys additionally
    /// need [`TokenConfigBuilder::passphrase`].
    #[must_use]
    pub fn private_key(mut self, der: impl Into<Vec<u8>>) -> Self {
        self.config.keys.private_key = Some(Secret::new(der.into()));
        self
    }

    /// Set the passphrase for an encrypted PKCS#8 private key.
    #[must_use]
    pub fn passphrase(mut self, passphrase: impl Into<Vec<u8>>) -> Self {
        self.config.keys.passphrase = Some(Secret::new(passphrase.into()));
        self
    }

    /// Set the RSA public key, SPKI DER.
    #[must_use]
    pub fn public_key(mut self, der: impl Into<Vec<u8>>) -> Self {
        self.config.keys.public_key = Some(der.into());
        self
    }

    /// Set the issuer claim.
    #[must_use]
    pub fn issuer(mut self, iss: impl Into<String>) -> Self {
        self.config.iss = iss.into();
        self
    }

    /// Set the audience claim.
    #[must_use]
    pub fn audience(mut self, aud: impl Into<String>) -> Self {
        self.config.aud = aud.into();
        self
    }

    /// Set the subject claim.
    #[must_use]
    pub fn subject(mut self, sub: impl Into<String>) -> Self {
        self.config.sub = Some(sub.into());
        self
    }

    /// Set the token lifetime in seconds. Negative values are ignored.
    #[must_use]
    pub fn ttl(mut self, ttl: i64) -> Self {
        if ttl >= 0 {
            self.config.ttl = ttl;
        }
        self
    }

    /// Set the clock-skew tolerance in seconds. Negative values are ignored.
    #[must_use]
    pub fn leeway(mut self, leeway: i64) -> Self {
        if leeway >= 0 {
            self.config.leeway = leeway;
        }
        self
    }

    /// Pin the not-before timestamp instead of defaulting it to the
    /// issuance time.
    #[must_use]
    pub fn not_before(mut self, nbf: i64) -> Self {
        self.config.nbf = Some(nbf);
        self
    }

    /// Add one allowed issuer (`"*"` accepts any).
    #[must_use]
    pub fn allow_issuer(mut self, iss: impl Into<String>) -> Self {
        self.config.allowed_issuers.insert(iss.into());
        self
    }

    /// Replace the issuer allow-list.
    #[must_use]
    pub fn allowed_issuers<I, S>(mut self, issuers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.allowed_issuers = issuers.into_iter().map(Into::into).collect();
        self
    }

    /// Add one allowed audience (`"*"` accepts any).
    #[must_use]
    pub fn allow_audience(mut self, aud: impl Into<String>) -> Self {
        self.config.allowed_audiences.insert(aud.into());
        self
    }

    /// Replace the audience allow-list.
    #[must_use]
    pub fn allowed_audiences<I, S>(mut self, audiences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.allowed_audiences = audiences.into_iter().map(Into::into).collect();
        self
    }

    /// Finish the configuration.
    #[must_use]
    pub fn build(self) -> TokenConfig {
        self.config
    }
}
