//! Thorn zone: the signature over the first two wire segments.
//!
//! Signed content is `crownB64 + "." + petalEncrypted`, exactly as it
//! appears on the wire, so verification needs no decoding beyond the
//! crown's algorithm tag.

use crate::config::KeyMaterial;
use crate::error::JptResult;
use crate::signer::Signer;

pub(crate) struct ThornCodec;

impl ThornCodec {
    pub(crate) fn sign(
        crown_b64: &str,
        petal_encrypted: &str,
        signer: &dyn Signer,
        keys: &KeyMaterial,
    ) -> JptResult<String> {
        signer.sign(&format!("{crown_b64}.{petal_encrypted}"), keys)
    }

    pub(crate) fn verify(
        crown_b64: &str,
        petal_encrypted: &str,
        signature: &str,
        signer: &dyn Signer,
        keys: &KeyMaterial,
    ) -> JptResult<bool> {
        signer.verify(&format!("{crown_b64}.{petal_encrypted}"), signature, keys)
    }
}
