//! Curve and algorithm identifiers used by meter signatures.

use serde::{Deserialize, Serialize};

/// Elliptic curves found in charge-point meter signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EcCurve {
    /// NIST P-192 (secp192r1), used by the first EDL generation.
    P192,
    /// NIST P-256 (secp256r1).
    P256,
}

impl EcCurve {
    /// Named-curve OID as carried in `SubjectPublicKeyInfo` parameters.
    #[must_use]
    pub const fn oid(&self) -> &'static str {
        match self {
            Self::P192 => "1.2.840.10045.3.1.1", // prime192v1
            Self::P256 => "1.2.840.10045.3.1.7", // prime256v1
        }
    }

    /// Size of one field element in bytes.
    #[must_use]
    pub const fn field_size(&self) -> usize {
        match self {
            Self::P192 => 24,
            Self::P256 => 32,
        }
    }

    /// Size of a raw `r || s` signature in bytes.
    #[must_use]
    pub const fn raw_signature_size(&self) -> usize {
        self.field_size() * 2
    }

    /// Guess the curve from the length of a SEC1 encoded point.
    #[must_use]
    pub fn from_point_len(len: usize) -> Option<Self> {
        match len {
            25 | 49 => Some(Self::P192),
            33 | 65 => Some(Self::P256),
            _ => None,
        }
    }
}

/// How signature bytes are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignatureFormat {
    /// Fixed-size big-endian `r || s`.
    Raw,
    /// ASN.1 DER `SEQUENCE { r INTEGER, s INTEGER }`.
    Der,
}

/// Signature algorithms understood by the verifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureAlgorithm {
    /// ECDSA over P-192 with a SHA-256 digest.
    EcdsaP192Sha256,
    /// ECDSA over P-256 with a SHA-256 digest.
    EcdsaP256Sha256,
}

impl SignatureAlgorithm {
    /// Curve used by this algorithm.
    #[must_use]
    pub const fn curve(&self) -> EcCurve {
        match self {
            Self::EcdsaP192Sha256 => EcCurve::P192,
            Self::EcdsaP256Sha256 => EcCurve::P256,
        }
    }

    /// Canonical identifier in the OCMF notation.
    #[must_use]
    pub const fn identifier(&self) -> &'static str {
        match self {
            Self::EcdsaP192Sha256 => "ECDSA-secp192r1-SHA256",
            Self::EcdsaP256Sha256 => "ECDSA-secp256r1-SHA256",
        }
    }

    /// Parse an algorithm identifier.
    ///
    /// Accepts the OCMF notation as well as the compact EDL names
    /// (`ECDSA192SHA256`, `ECDSA256SHA256`). Matching is case-insensitive.
    #[must_use]
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        match identifier.trim().to_ascii_uppercase().as_str() {
            "ECDSA-SECP192R1-SHA256" | "ECDSA192SHA256" => Some(Self::EcdsaP192Sha256),
            "ECDSA-SECP256R1-SHA256" | "ECDSA256SHA256" => Some(Self::EcdsaP256Sha256),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_round_trip() {
        for alg in [
            SignatureAlgorithm::EcdsaP192Sha256,
            SignatureAlgorithm::EcdsaP256Sha256,
        ] {
            assert_eq!(SignatureAlgorithm::from_identifier(alg.identifier()), Some(alg));
        }
    }

    #[test]
    fn test_compact_identifiers() {
        assert_eq!(
            SignatureAlgorithm::from_identifier("ECDSA192SHA256"),
            Some(SignatureAlgorithm::EcdsaP192Sha256)
        );
        assert_eq!(
            SignatureAlgorithm::from_identifier("ecdsa256sha256"),
            Some(SignatureAlgorithm::EcdsaP256Sha256)
        );
        assert_eq!(SignatureAlgorithm::from_identifier("RSA-SHA1"), None);
    }

    #[test]
    fn test_signature_sizes() {
        assert_eq!(EcCurve::P192.raw_signature_size(), 48);
        assert_eq!(EcCurve::P256.raw_signature_size(), 64);
    }

    #[test]
    fn test_curve_from_point_len() {
        assert_eq!(EcCurve::from_point_len(49), Some(EcCurve::P192));
        assert_eq!(EcCurve::from_point_len(65), Some(EcCurve::P256));
        assert_eq!(EcCurve::from_point_len(64), None);
    }
}
