//! JPT: a three-segment security token (`crown.petal.thorn`).
//!
//! This crate provides:
//! - A public claim zone (crown) and an encrypted claim zone (petal),
//!   bound together by a SHA-256 digest of the canonical crown
//! - Pluggable signature algorithms: HS256/384/512 and RS256/384/512
//! - A strictly ordered validation pipeline with stable numeric
//!   failure codes
//! - An AES-256-GCM petal cipher, swappable for any [`PetalCipher`]
//!
//! ```no_run
//! use jpt::{Jpt, TokenConfig};
//!
//! # fn main() -> Result<(), jpt::JptError> {
//! let config = TokenConfig::builder()
//!     .secret(b"0123456789abcdef0123456789abcdef".to_vec())
//!     .issuer("auth.example.com")
//!     .audience("payments")
//!     .allow_issuer("auth.example.com")
//!     .allow_audience("payments")
//!     .build();
//!
//! let jpt = Jpt::new(config);
//! let token = jpt.issue(&jpt::ClaimMap::new(), &jpt::ClaimMap::new())?;
//! let payload = jpt.validate(&token)?;
//! assert_eq!(payload.issuer(), "auth.example.com");
//! # Ok(())
//! # }
//! ```

mod algorithm;
mod cipher;
mod codec;
mod config;
mod crown;
mod error;
mod payload;
mod petal;
mod pipeline;
mod signer;
mod thorn;

pub use algorithm::Algorithm;
pub use cipher::{PetalCipher, SealedPetalCipher};
pub use config::{KeyMaterial, TokenConfig, TokenConfigBuilder};
pub use crown::RESERVED_CLAIMS;
pub use error::{JptError, JptResult};
pub use payload::TokenPayload;
pub use petal::DIGEST_CLAIM;
pub use signer::{HmacSigner, RsaSigner, Signer};

use chrono::Utc;

/// Ordered string-to-JSON claim map used for both crown and petal zones.
pub type ClaimMap = serde_json::Map<String, serde_json::Value>;

/// Token issuer and validator: an immutable configuration snapshot plus a
/// petal cipher keyed on it.
///
/// Safe for concurrent read-only use; each issue/validate call works on
/// its own local claim maps.
pub struct Jpt<C: PetalCipher = SealedPetalCipher> {
    config: TokenConfig,
    cipher: C,
}

impl Jpt<SealedPetalCipher> {
    /// Create an issuer/validator whose petal cipher is seeded from the
    /// configured secret.
    #[must_use]
    pub fn new(config: TokenConfig) -> Self {
        let cipher = SealedPetalCipher::new(config.keys().secret().unwrap_or_default());
        Self { config, cipher }
    }
}

impl<C: PetalCipher> Jpt<C> {
    /// Create an issuer/validator with an externally supplied petal
    /// cipher.
    pub fn with_cipher(config: TokenConfig, cipher: C) -> Self {
        Self { config, cipher }
    }

    /// The configuration snapshot in use.
    #[must_use]
    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Replace the secret, producing a new snapshot with a re-keyed
    /// cipher. Tokens signed under the old secret no longer validate.
    #[must_use]
    pub fn update_secret(mut self, secret: impl Into<Vec<u8>>) -> Self {
        let secret = secret.into();
        self.cipher.update_seed(&secret);
        self.config = self.config.with_secret(secret);
        self
    }

    /// Issue a token from caller crown and petal claims.
    ///
    /// Reserved crown claims and the petal `digest` claim are owned by
    /// the issuing process; caller values for them are ignored.
    pub fn issue(&self, crown_claims: &ClaimMap, petal_claims: &ClaimMap) -> JptResult<String> {
        let now = Utc::now().timestamp();
        let (token, _, _) =
            pipeline::issue(&self.config, &self.cipher, crown_claims, petal_claims, now)?;
        Ok(token)
    }

    /// Issue a token and immediately wrap it in a [`TokenPayload`],
    /// skipping the redundant validation pass.
    pub fn issue_payload(
        &self,
        crown_claims: &ClaimMap,
        petal_claims: &ClaimMap,
    ) -> JptResult<TokenPayload> {
        let now = Utc::now().timestamp();
        let (token, crown, petal) =
            pipeline::issue(&self.config, &self.cipher, crown_claims, petal_claims, now)?;
        Ok(TokenPayload::from_zones(&token, crown, petal))
    }

    /// Validate a token, returning its immutable payload or the first
    /// terminal failure.
    pub fn validate(&self, token: &str) -> JptResult<TokenPayload> {
        let now = Utc::now().timestamp();
        match pipeline::validate(token, &self.config, &self.cipher, now) {
            Ok(payload) => Ok(payload),
            Err(err) => {
                tracing::debug!(error = %err, code = ?err.code(), "token validation failed");
                Err(err)
            }
        }
    }
}
