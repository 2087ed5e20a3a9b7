//! Signature capability: one trait, symmetric and asymmetric backends.

mod hmac;
mod rsa;

pub use hmac::HmacSigner;
pub use rsa::RsaSigner;

use crate::algorithm::Algorithm;
use crate::config::KeyMaterial;
use crate::error::JptResult;

/// Signing algorithm interface.
///
/// Signatures travel on the wire as base64url text; `sign` returns that
/// text and `verify` compares against it without timing leaks.
/// Implementations must be thread-safe and hold no per-call state.
pub trait Signer: Send + Sync {
    /// Algorithm tag this signer implements.
    fn algorithm(&self) -> Algorithm;

    /// Sign `data`, returning the base64url-encoded signature.
    fn sign(&self, data: &str, keys: &KeyMaterial) -> JptResult<String>;

    /// Verify a base64url-encoded signature over `data`.
    ///
    /// A mismatched signature is `Ok(false)`; errors are reserved for
    /// unusable key material or backend failures.
    fn verify(&self, data: &str, signature: &str, keys: &KeyMaterial) -> JptResult<bool>;
}
