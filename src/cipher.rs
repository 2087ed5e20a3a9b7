//! Petal cipher collaborator.
//!
//! The token layer treats the petal ciphertext as opaque: it hands the
//! cipher canonical JSON bytes and gets bytes back. [`SealedPetalCipher`]
//! is the provided implementation; any [`PetalCipher`] can be swapped in
//! via [`crate::Jpt::with_cipher`].

use aes_gcm::{
    Aes256Gcm, KeyInit,
    aead::{Aead, generic_array::GenericArray},
};
use hkdf::Hkdf;
use rand::Rng;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{JptError, JptResult};

/// Symmetric cipher guarding the petal zone.
///
/// Implementations must not panic on attacker-controlled ciphertext;
/// decryption failures are reported as errors and surface to callers as
/// decode failures.
pub trait PetalCipher: Send + Sync {
    /// Encrypt petal plaintext.
    fn encrypt(&self, plaintext: &[u8]) -> JptResult<Vec<u8>>;

    /// Decrypt petal ciphertext.
    fn decrypt(&self, ciphertext: &[u8]) -> JptResult<Vec<u8>>;

    /// Re-key the cipher from a new seed. Called when the owning
    /// configuration's secret is replaced.
    fn update_seed(&mut self, seed: &[u8]);
}

const NONCE_LEN: usize = 12;
const KEY_INFO: &[u8] = b"jpt.petal.v1";

/// AES-256-GCM petal cipher keyed via HKDF-SHA256 from a seed.
///
/// Wire layout: 12-byte random nonce followed by the GCM ciphertext and
/// tag. The token layer never inspects this format.
pub struct SealedPetalCipher {
    key: Zeroizing<[u8; 32]>,
}

impl SealedPetalCipher {
    /// Derive a cipher from a seed (normally the configured secret).
    #[must_use]
    pub fn new(seed: &[u8]) -> Self {
        Self {
            key: Zeroizing::new(derive_key(seed)),
        }
    }
}

fn derive_key(seed: &[u8]) -> [u8; 32] {
    let hk = Hkdf::<Sha256>::new(None, seed);
    let mut okm = [0u8; 32];
    // 32 bytes is within the HKDF-SHA256 output bound, expand cannot fail.
    let _ = hk.expand(KEY_INFO, &mut okm);
    okm
}

impl PetalCipher for SealedPetalCipher {
    fn encrypt(&self, plaintext: &[u8]) -> JptResult<Vec<u8>> {
        let cipher = Aes256Gcm::new(GenericArray::from_slice(self.key.as_ref()));

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce_bytes);

        let ciphertext = cipher
            .encrypt(GenericArray::from_slice(&nonce_bytes), plaintext)
            .map_err(|_| JptError::CryptoBackend("petal encryption failed".to_string()))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> JptResult<Vec<u8>> {
        if ciphertext.len() < NONCE_LEN {
            return Err(JptError::Decode("petal ciphertext too short".to_string()));
        }
        let (nonce, body) = ciphertext.split_at(NONCE_LEN);

        let cipher = Aes256Gcm::new(GenericArray::from_slice(self.key.as_ref()));
        cipher
            .decrypt(GenericArray::from_slice(nonce), body)
            .map_err(|_| JptError::Decode("petal decryption failed".to_string()))
    }

    fn update_seed(&mut self, seed: &[u8]) {
        self.key = Zeroizing::new(derive_key(seed));
    }
}
