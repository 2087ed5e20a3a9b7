//! HMAC-SHA signer (HS256 / HS384 / HS512).

use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;

use crate::algorithm::Algorithm;
use crate::codec;
use crate::config::KeyMaterial;
use crate::error::{JptError, JptResult};
use crate::signer::Signer;

type HmacSha256 = Hmac<Sha256>;
type HmacSha384 = Hmac<Sha384>;
type HmacSha512 = Hmac<Sha512>;

/// Symmetric signer backed by the configured secret.
pub struct HmacSigner {
    alg: Algorithm,
}

impl HmacSigner {
    /// Create a signer for the given tag. Non-HMAC tags are rejected at
    /// sign and verify time.
    #[must_use]
    pub fn new(alg: Algorithm) -> Self {
        Self { alg }
    }

    fn raw_sign(&self, data: &str, secret: &[u8]) -> JptResult<Vec<u8>> {
        let invalid_key = |_| JptError::InvalidKey("invalid HMAC key".to_string());
        match self.alg {
            Algorithm::Hs256 => {
                let mut mac = HmacSha256::new_from_slice(secret).map_err(invalid_key)?;
                mac.update(data.as_bytes());
                Ok(mac.finalize().into_bytes().to_vec())
            }
            Algorithm::Hs384 => {
                let mut mac = HmacSha384::new_from_slice(secret).map_err(invalid_key)?;
                mac.update(data.as_bytes());
                Ok(mac.finalize().into_bytes().to_vec())
            }
            Algorithm::Hs512 => {
                let mut mac = HmacSha512::new_from_slice(secret).map_err(invalid_key)?;
                mac.update(data.as_bytes());
                Ok(mac.finalize().into_bytes().to_vec())
            }
            other => Err(JptError::UnsupportedAlgorithm(other.name().to_string())),
        }
    }
}

impl Signer for HmacSigner {
    fn algorithm(&self) -> Algorithm {
        self.alg
    }

    fn sign(&self, data: &str, keys: &KeyMaterial) -> JptResult<String> {
        let secret = keys
            .secret()
            .ok_or_else(|| JptError::MissingKey("secret required for HMAC signing".to_string()))?;
        let raw = self.raw_sign(data, secret)?;
        Ok(codec::b64url_encode(&raw))
    }

    fn verify(&self, data: &str, signature: &str, keys: &KeyMaterial) -> JptResult<bool> {
        let expected = self.sign(data, keys)?;
        // Constant-time over the encoded form, never a short-circuiting
        // byte comparison.
        Ok(expected.as_bytes().ct_eq(signature.as_bytes()).into())
    }
}
