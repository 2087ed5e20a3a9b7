//! Error taxonomy for token issuance and validation.
//!
//! Validation failures carry the stable numeric codes used on the wire by
//! existing deployments; see [`JptError::code`].

use thiserror::Error;

/// Result type for token operations.
pub type JptResult<T> = Result<T, JptError>;

/// Token operation errors.
///
/// Every validation failure is terminal; nothing in the pipeline retries.
#[derive(Debug, Error)]
pub enum JptError {
    /// Token does not consist of exactly three dot-separated segments.
    #[error("malformed token: expected 3 segments")]
    MalformedToken,

    /// Crown zone decoded but is structurally unusable.
    #[error("invalid crown data: {0}")]
    InvalidCrown(String),

    /// Petal zone decoded but is structurally unusable.
    #[error("invalid petal data: {0}")]
    InvalidPetal(String),

    /// Algorithm tag is not in the supported set.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Thorn segment does not match the signed content.
    #[error("token signature verification failed")]
    SignatureInvalid,

    /// Petal digest does not match the recomputed crown digest.
    #[error("crown digest mismatch")]
    DigestMismatch,

    /// Crown issuer is not in the allow-list.
    #[error("token issuer not allowed")]
    IssuerNotAllowed,

    /// Crown audience is not in the allow-list.
    #[error("token audience not allowed")]
    AudienceNotAllowed,

    /// Current time (plus leeway) is before the token's nbf.
    #[error("token not yet valid")]
    NotYetValid,

    /// Current time is at or past the token's exp (plus leeway).
    #[error("token has expired")]
    Expired,

    /// Base64, JSON, or cipher decode failure.
    #[error("decode failure: {0}")]
    Decode(String),

    /// Key material present but unusable.
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    /// Key material required by the operation is absent.
    #[error("missing key material: {0}")]
    MissingKey(String),

    /// Underlying cryptographic primitive failed, distinct from a
    /// verification mismatch.
    #[error("crypto backend failure: {0}")]
    CryptoBackend(String),
}

impl JptError {
    /// Stable numeric code reported to callers for validation failures.
    ///
    /// Key and backend errors are operator problems, not token verdicts,
    /// and carry no wire code.
    #[must_use]
    pub fn code(&self) -> Option<u32> {
        match self {
            JptError::MalformedToken => Some(401_001),
            JptError::InvalidCrown(_) => Some(401_002),
            JptError::InvalidPetal(_) => Some(401_003),
            JptError::UnsupportedAlgorithm(_) => Some(401_004),
            JptError::SignatureInvalid => Some(401_005),
            JptError::DigestMismatch => Some(401_006),
            JptError::IssuerNotAllowed => Some(401_007),
            JptError::AudienceNotAllowed => Some(401_008),
            JptError::NotYetValid => Some(401_010),
            JptError::Expired => Some(401_012),
            JptError::Decode(_) => Some(401_013),
            JptError::InvalidKey(_) | JptError::MissingKey(_) | JptError::CryptoBackend(_) => None,
        }
    }
}

impl From<base64::DecodeError> for JptError {
    fn from(err: base64::DecodeError) -> Self {
        JptError::Decode(format!("base64 decode error: {err}"))
    }
}

impl From<serde_json::Error> for JptError {
    fn from(err: serde_json::Error) -> Self {
        JptError::Decode(format!("JSON decode error: {err}"))
    }
}
