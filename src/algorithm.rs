//! Supported signature algorithm tags and signer dispatch.

use std::fmt;

use crate::error::{JptError, JptResult};
use crate::signer::{HmacSigner, RsaSigner, Signer};

/// Signature algorithms a token may carry in its crown `alg` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// HMAC-SHA256.
    Hs256,
    /// HMAC-SHA384.
    Hs384,
    /// HMAC-SHA512.
    Hs512,
    /// RSA PKCS#1 v1.5 with SHA-256.
    Rs256,
    /// RSA PKCS#1 v1.5 with SHA-384.
    Rs384,
    /// RSA PKCS#1 v1.5 with SHA-512.
    Rs512,
}

impl Algorithm {
    /// Wire name of the algorithm, as carried in the crown.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Hs256 => "HS256",
            Algorithm::Hs384 => "HS384",
            Algorithm::Hs512 => "HS512",
            Algorithm::Rs256 => "RS256",
            Algorithm::Rs384 => "RS384",
            Algorithm::Rs512 => "RS512",
        }
    }

    /// Resolve a wire name. Unknown tags are rejected, never defaulted.
    pub fn from_name(name: &str) -> JptResult<Self> {
        match name {
            "HS256" => Ok(Algorithm::Hs256),
            "HS384" => Ok(Algorithm::Hs384),
            "HS512" => Ok(Algorithm::Hs512),
            "RS256" => Ok(Algorithm::Rs256),
            "RS384" => Ok(Algorithm::Rs384),
            "RS512" => Ok(Algorithm::Rs512),
            other => Err(JptError::UnsupportedAlgorithm(other.to_string())),
        }
    }

    /// Whether the algorithm signs and verifies with the same secret.
    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        matches!(self, Algorithm::Hs256 | Algorithm::Hs384 | Algorithm::Hs512)
    }

    /// Signer implementation for this tag.
    pub(crate) fn signer(&self) -> Box<dyn Signer> {
        if self.is_symmetric() {
            Box::new(HmacSigner::new(*self))
        } else {
            Box::new(RsaSigner::new(*self))
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
