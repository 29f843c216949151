//! Signature envelope binding a bundle to an external signer
//!
//! The core is algorithm-agnostic: it defines the provider shape and the
//! exact bytes that get signed (the bundle's canonical JSON with the
//! `signature` and `signerId` members excluded). `Ed25519Signer` is the
//! in-tree reference provider.

use crate::bundle::TraceBundle;
use crate::canonical::{canonical_json, to_value_without};
use crate::error::{Result, TraceError};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

/// Abstract sign/verify capability supplied by the embedding application
pub trait SignatureProvider {
    /// Stable identifier recorded on signed bundles
    fn signer_id(&self) -> &str;

    /// Sign the payload, returning raw signature bytes
    ///
    /// Errors here are provider-level failures (I/O, key material) and
    /// propagate to the caller.
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>>;

    /// Verify a signature over the payload for the named signer
    fn verify(&self, payload: &[u8], signature: &[u8], signer_id: &str) -> Result<bool>;
}

/// Canonical bytes a signature covers: the bundle without its envelope
pub fn signing_bytes(bundle: &TraceBundle) -> Result<Vec<u8>> {
    let value = to_value_without(bundle, &["signature", "signerId"])?;
    Ok(canonical_json(&value).into_bytes())
}

/// Sign a bundle, returning a new bundle carrying the envelope
///
/// The input bundle is untouched.
pub fn sign_bundle(bundle: &TraceBundle, provider: &dyn SignatureProvider) -> Result<TraceBundle> {
    let payload = signing_bytes(bundle)?;
    let signature = provider.sign(&payload)?;
    let mut signed = bundle.clone();
    signed.signature = Some(hex::encode(signature));
    signed.signer_id = Some(provider.signer_id().to_string());
    Ok(signed)
}

/// Check a bundle's signature envelope against a provider
///
/// Returns `Ok(false)` for every detectable mismatch: missing envelope,
/// wrong signer, undecodable or invalid signature. Only provider failures
/// surface as errors.
pub fn verify_bundle_signature(
    bundle: &TraceBundle,
    provider: &dyn SignatureProvider,
) -> Result<bool> {
    let (Some(signature), Some(signer_id)) = (&bundle.signature, &bundle.signer_id) else {
        return Ok(false);
    };
    if signer_id != provider.signer_id() {
        return Ok(false);
    }
    let Ok(signature_bytes) = hex::decode(signature) else {
        return Ok(false);
    };
    let payload = signing_bytes(bundle)?;
    provider.verify(&payload, &signature_bytes, signer_id)
}

/// Ed25519 reference provider
#[derive(Clone)]
pub struct Ed25519Signer {
    signer_id: String,
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl std::fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519Signer")
            .field("signer_id", &self.signer_id)
            .field("signing_key", &"[redacted]")
            .finish()
    }
}

impl Ed25519Signer {
    /// Generate a new random signer
    pub fn generate(signer_id: impl Into<String>) -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();
        Self {
            signer_id: signer_id.into(),
            signing_key,
            verifying_key,
        }
    }

    /// Create a signer from raw key bytes
    pub fn from_bytes(signer_id: impl Into<String>, bytes: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(bytes);
        let verifying_key = signing_key.verifying_key();
        Self {
            signer_id: signer_id.into(),
            signing_key,
            verifying_key,
        }
    }

    /// Raw public key bytes for distribution to verifiers
    pub fn verifying_key_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }
}

impl SignatureProvider for Ed25519Signer {
    fn signer_id(&self) -> &str {
        &self.signer_id
    }

    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>> {
        Ok(self.signing_key.sign(payload).to_bytes().to_vec())
    }

    fn verify(&self, payload: &[u8], signature: &[u8], signer_id: &str) -> Result<bool> {
        if signer_id != self.signer_id {
            return Ok(false);
        }
        let Ok(signature_bytes) = <[u8; 64]>::try_from(signature) else {
            return Ok(false);
        };
        let signature = Signature::from_bytes(&signature_bytes);
        Ok(self.verifying_key.verify(payload, &signature).is_ok())
    }
}
