//! ECDSA signature verification.
//!
//! Both verifiers hash the signed bytes with SHA-256 and check the
//! signature against the prehash. For P-192 the 32-byte digest is truncated
//! to the field size as mandated by FIPS 186.

use sha2::{Digest, Sha256};

use crate::error::CryptoError;
use crate::keys::EcPublicKey;
use crate::types::{EcCurve, SignatureAlgorithm, SignatureFormat};

/// Verifies a signature over a byte message.
///
/// `Ok(false)` means the inputs were well formed and the signature does not
/// match. Malformed keys or signatures are reported as errors so callers can
/// tell the two apart.
pub trait SignatureVerifier: Send + Sync {
    /// Algorithm implemented by this verifier.
    fn algorithm(&self) -> SignatureAlgorithm;

    /// Verify `signature` over `data` with `public_key`.
    fn verify(&self, public_key: &[u8], data: &[u8], signature: &[u8]) -> Result<bool, CryptoError>;
}

/// SHA-256 digest of the signed bytes.
#[must_use]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

fn check_raw_len(curve: EcCurve, signature: &[u8]) -> Result<(), CryptoError> {
    let expected = curve.raw_signature_size();
    if signature.len() != expected {
        return Err(CryptoError::invalid_signature(format!(
            "expected {expected} bytes for {curve:?}, got {}",
            signature.len()
        )));
    }
    Ok(())
}

/// ECDSA P-256 / SHA-256 verifier.
#[cfg(feature = "ecdsa-p256")]
#[derive(Debug, Clone, Copy)]
pub struct P256Verifier {
    format: SignatureFormat,
}

#[cfg(feature = "ecdsa-p256")]
impl P256Verifier {
    /// Verifier for raw `r || s` signatures.
    #[must_use]
    pub fn raw() -> Self {
        Self {
            format: SignatureFormat::Raw,
        }
    }

    /// Verifier for DER encoded signatures.
    #[must_use]
    pub fn der() -> Self {
        Self {
            format: SignatureFormat::Der,
        }
    }
}

#[cfg(feature = "ecdsa-p256")]
impl Default for P256Verifier {
    fn default() -> Self {
        Self::raw()
    }
}

#[cfg(feature = "ecdsa-p256")]
impl SignatureVerifier for P256Verifier {
    fn algorithm(&self) -> SignatureAlgorithm {
        SignatureAlgorithm::EcdsaP256Sha256
    }

    fn verify(&self, public_key: &[u8], data: &[u8], signature: &[u8]) -> Result<bool, CryptoError> {
        use p256::ecdsa::signature::hazmat::PrehashVerifier;
        use p256::ecdsa::{Signature, VerifyingKey};

        let key = EcPublicKey::parse(public_key)?;
        key.require_curve(EcCurve::P256)?;
        let vk = VerifyingKey::from_sec1_bytes(key.sec1_bytes())
            .map_err(|e| CryptoError::invalid_public_key(e.to_string()))?;

        let sig = match self.format {
            SignatureFormat::Raw => {
                check_raw_len(EcCurve::P256, signature)?;
                Signature::from_slice(signature)
            },
            SignatureFormat::Der => Signature::from_der(signature),
        }
        .map_err(|e| CryptoError::invalid_signature(e.to_string()))?;

        Ok(vk.verify_prehash(&sha256(data), &sig).is_ok())
    }
}

/// ECDSA P-192 / SHA-256 verifier for raw `r || s` signatures.
#[cfg(feature = "ecdsa-p192")]
#[derive(Debug, Clone, Copy, Default)]
pub struct P192Verifier;

#[cfg(feature = "ecdsa-p192")]
impl P192Verifier {
    /// Create a new verifier.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "ecdsa-p192")]
impl SignatureVerifier for P192Verifier {
    fn algorithm(&self) -> SignatureAlgorithm {
        SignatureAlgorithm::EcdsaP192Sha256
    }

    fn verify(&self, public_key: &[u8], data: &[u8], signature: &[u8]) -> Result<bool, CryptoError> {
        use p192::ecdsa::signature::hazmat::PrehashVerifier;
        use p192::ecdsa::{Signature, VerifyingKey};

        let key = EcPublicKey::parse(public_key)?;
        key.require_curve(EcCurve::P192)?;
        let vk = VerifyingKey::from_sec1_bytes(key.sec1_bytes())
            .map_err(|e| CryptoError::invalid_public_key(e.to_string()))?;

        check_raw_len(EcCurve::P192, signature)?;
        let sig = Signature::from_slice(signature)
            .map_err(|e| CryptoError::invalid_signature(e.to_string()))?;

        Ok(vk.verify_prehash(&sha256(data), &sig).is_ok())
    }
}
