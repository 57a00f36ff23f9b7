//! # transparency-crypto
//!
//! Signature primitives for verifying signed meter values.
//!
//! Charge-point meters sign their readings with ECDSA. Two curves are in
//! the field:
//! - **P-192 / SHA-256**: first generation EDL meters (48-byte signatures)
//! - **P-256 / SHA-256**: current EDL meters, OCMF and Alfen controllers
//!
//! Every verifier implements [`SignatureVerifier`], which separates malformed
//! input (`Err`) from a signature that simply does not match (`Ok(false)`).
//! Callers rely on that split to decide whether another algorithm variant
//! is worth trying.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod keys;
mod types;

#[cfg(any(feature = "ecdsa-p256", feature = "ecdsa-p192"))]
mod ecdsa;

pub use error::CryptoError;
pub use keys::EcPublicKey;
pub use types::{EcCurve, SignatureAlgorithm, SignatureFormat};

#[cfg(any(feature = "ecdsa-p256", feature = "ecdsa-p192"))]
pub use ecdsa::{sha256, SignatureVerifier};

#[cfg(feature = "ecdsa-p256")]
pub use ecdsa::P256Verifier;

#[cfg(feature = "ecdsa-p192")]
pub use ecdsa::P192Verifier;
