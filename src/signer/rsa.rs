//! RSA PKCS#1 v1.5 signer (RS256 / RS384 / RS512).
//!
//! Private keys are PKCS#8 DER, plaintext or encrypted; an encrypted key
//! is unlocked with the configured passphrase. Public keys are SPKI DER.
//! Key parse and decrypt failures are key errors; a signature that simply
//! does not match is a clean `false`, never an error.

use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::sha2::{Sha256, Sha384, Sha512};
use rsa::signature::{SignatureEncoding, Signer as _, Verifier as _};
use rsa::{
    RsaPrivateKey, RsaPublicKey,
    pkcs8::{DecodePrivateKey, DecodePublicKey},
};

use crate::algorithm::Algorithm;
use crate::codec;
use crate::config::KeyMaterial;
use crate::error::{JptError, JptResult};
use crate::signer::Signer;

/// Asymmetric signer backed by the configured RSA key pair.
pub struct RsaSigner {
    alg: Algorithm,
}

impl RsaSigner {
    /// Create a signer for the given tag. Non-RSA tags are rejected at
    /// sign and verify time.
    #[must_use]
    pub fn new(alg: Algorithm) -> Self {
        Self { alg }
    }

    fn load_private_key(
        private_der: &[u8],
        passphrase: Option<&[u8]>,
    ) -> JptResult<RsaPrivateKey> {
        let parsed = match passphrase {
            Some(passphrase) => RsaPrivateKey::from_pkcs8_encrypted_der(private_der, passphrase),
            None => RsaPrivateKey::from_pkcs8_der(private_der),
        };
        parsed.map_err(|e| JptError::InvalidKey(format!("invalid RSA private key: {e}")))
    }

    fn raw_sign(
        &self,
        data: &str,
        private_der: &[u8],
        passphrase: Option<&[u8]>,
    ) -> JptResult<Vec<u8>> {
        let private_key = Self::load_private_key(private_der, passphrase)?;
        let backend = |e| JptError::CryptoBackend(format!("RSA signing failed: {e}"));

        match self.alg {
            Algorithm::Rs256 => {
                let signing_key = SigningKey::<Sha256>::new(private_key);
                let signature = signing_key.try_sign(data.as_bytes()).map_err(backend)?;
                Ok(signature.to_bytes().as_ref().to_vec())
            }
            Algorithm::Rs384 => {
                let signing_key = SigningKey::<Sha384>::new(private_key);
                let signature = signing_key.try_sign(data.as_bytes()).map_err(backend)?;
                Ok(signature.to_bytes().as_ref().to_vec())
            }
            Algorithm::Rs512 => {
                let signing_key = SigningKey::<Sha512>::new(private_key);
                let signature = signing_key.try_sign(data.as_bytes()).map_err(backend)?;
                Ok(signature.to_bytes().as_ref().to_vec())
            }
            other => Err(JptError::UnsupportedAlgorithm(other.name().to_string())),
        }
    }

    fn raw_verify(&self, data: &str, raw_signature: &[u8], public_der: &[u8]) -> JptResult<bool> {
        let public_key = RsaPublicKey::from_public_key_der(public_der)
            .map_err(|e| JptError::InvalidKey(format!("invalid RSA public key: {e}")))?;

        let signature = match Signature::try_from(raw_signature) {
            Ok(signature) => signature,
            Err(_) => return Ok(false),
        };

        let valid = match self.alg {
            Algorithm::Rs256 => VerifyingKey::<Sha256>::new(public_key)
                .verify(data.as_bytes(), &signature)
                .is_ok(),
            Algorithm::Rs384 => VerifyingKey::<Sha384>::new(public_key)
                .verify(data.as_bytes(), &signature)
                .is_ok(),
            Algorithm::Rs512 => VerifyingKey::<Sha512>::new(public_key)
                .verify(data.as_bytes(), &signature)
                .is_ok(),
            other => return Err(JptError::UnsupportedAlgorithm(other.name().to_string())),
        };
        Ok(valid)
    }
}

impl Signer for RsaSigner {
    fn algorithm(&self) -> Algorithm {
        self.alg
    }

    fn sign(&self, data: &str, keys: &KeyMaterial) -> JptResult<String> {
        let private_der = keys.private_key().ok_or_else(|| {
            JptError::MissingKey("private key required for RSA signing".to_string())
        })?;
        let raw = self.raw_sign(data, private_der, keys.passphrase())?;
        Ok(codec::b64url_encode(&raw))
    }

    /// The backend's verification error is opaque, so internal verifier
    /// failures on this path are indistinguishable from a mismatch and
    /// surface as `Ok(false)`.
    fn verify(&self, data: &str, signature: &str, keys: &KeyMaterial) -> JptResult<bool> {
        let public_der = keys.public_key().ok_or_else(|| {
            JptError::MissingKey("public key required for RSA verification".to_string())
        })?;
        let raw = match codec::b64url_decode(signature) {
            Ok(raw) => raw,
            Err(_) => return Ok(false),
        };
        self.raw_verify(data, &raw, public_der)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey};
    use std::sync::OnceLock;

    static TEST_KEY: OnceLock<(Vec<u8>, Vec<u8>)> = OnceLock::new();

    // Key generation is slow, share one pair across the module.
    fn test_key() -> &'static (Vec<u8>, Vec<u8>) {
        TEST_KEY.get_or_init(|| {
            let mut rng = rand::rng();
            let private_key = RsaPrivateKey::new(&mut rng, 2048).unwrap();
            let private_der = private_key.to_pkcs8_der().unwrap().as_bytes().to_vec();
            let public_der = private_key
                .to_public_key()
                .to_public_key_der()
                .unwrap()
                .as_bytes()
                .to_vec();
            (private_der, public_der)
        })
    }

    fn keys() -> KeyMaterial {
        let (private_der, public_der) = test_key();
        crate::TokenConfig::builder()
            .private_key(private_der.clone())
            .public_key(public_der.clone())
            .build()
            .keys()
            .clone()
    }

    #[test]
    fn sign_verify_round_trip() {
        let keys = keys();
        for alg in [Algorithm::Rs256, Algorithm::Rs384, Algorithm::Rs512] {
            let signer = RsaSigner::new(alg);
            let sig = signer.sign("crown.petal", &keys).unwrap();
            assert!(signer.verify("crown.petal", &sig, &keys).unwrap());
            assert!(!signer.verify("crown.petal2", &sig, &keys).unwrap());
        }
    }

    #[test]
    fn garbage_signature_is_false_not_error() {
        let signer = RsaSigner::new(Algorithm::Rs256);
        assert!(!signer.verify("data", "AAAA", &keys()).unwrap());
        assert!(!signer.verify("data", "!!%%", &keys()).unwrap());
    }

    #[test]
    fn missing_keys_are_key_errors() {
        let signer = RsaSigner::new(Algorithm::Rs256);
        let empty = KeyMaterial::default();
        assert!(matches!(
            signer.sign("data", &empty).unwrap_err(),
            JptError::MissingKey(_)
        ));
        assert!(matches!(
            signer.verify("data", "sig", &empty).unwrap_err(),
            JptError::MissingKey(_)
        ));
    }

    #[test]
    fn encrypted_private_key_unlocks_with_passphrase() {
        let (private_der, public_der) = test_key();
        let private_key = RsaPrivateKey::from_pkcs8_der(private_der).unwrap();
        let encrypted_der = private_key
            .to_pkcs8_encrypted_der("hunter2")
            .unwrap()
            .as_bytes()
            .to_vec();

        let keys = crate::TokenConfig::builder()
            .private_key(encrypted_der)
            .public_key(public_der.clone())
            .passphrase("hunter2")
            .build()
            .keys()
            .clone();

        let signer = RsaSigner::new(Algorithm::Rs256);
        let sig = signer.sign("crown.petal", &keys).unwrap();
        assert!(signer.verify("crown.petal", &sig, &keys).unwrap());
    }

    #[test]
    fn encrypted_private_key_without_passphrase_is_a_key_error() {
        let (private_der, _) = test_key();
        let private_key = RsaPrivateKey::from_pkcs8_der(private_der).unwrap();
        let encrypted_der = private_key
            .to_pkcs8_encrypted_der("hunter2")
            .unwrap()
            .as_bytes()
            .to_vec();

        let signer = RsaSigner::new(Algorithm::Rs256);

        let locked = crate::TokenConfig::builder()
            .private_key(encrypted_der.clone())
            .build()
            .keys()
            .clone();
        assert!(matches!(
            signer.sign("data", &locked).unwrap_err(),
            JptError::InvalidKey(_)
        ));

        let wrong = crate::TokenConfig::builder()
            .private_key(encrypted_der)
            .passphrase("wrong")
            .build()
            .keys()
            .clone();
        assert!(matches!(
            signer.sign("data", &wrong).unwrap_err(),
            JptError::InvalidKey(_)
        ));
    }

    #[test]
    fn malformed_der_is_a_key_error() {
        let signer = RsaSigner::new(Algorithm::Rs256);
        let bogus = crate::TokenConfig::builder()
            .private_key(b"not-der".to_vec())
            .build()
            .keys()
            .clone();
        assert!(matches!(
            signer.sign("data", &bogus).unwrap_err(),
            JptError::InvalidKey(_)
        ));
    }

    #[test]
    fn hmac_tag_is_unsupported_here() {
        let signer = RsaSigner::new(Algorithm::Hs256);
        let err = signer.sign("data", &keys()).unwrap_err();
        assert_eq!(err.code(), Some(401_004));
    }
}
