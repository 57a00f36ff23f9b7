//! Public key normalisation.
//!
//! Meter vendors ship keys in several shapes: DER `SubjectPublicKeyInfo`,
//! SEC1 points (compressed or uncompressed) and bare `x || y` coordinates.
//! [`EcPublicKey::parse`] turns all of them into a SEC1 point plus the curve
//! the key belongs to.

use spki::{ObjectIdentifier, SubjectPublicKeyInfoRef};

use crate::error::CryptoError;
use crate::types::EcCurve;

const ID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
const PRIME192V1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.1");
const PRIME256V1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");

/// A parsed elliptic-curve public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcPublicKey {
    curve: EcCurve,
    sec1: Vec<u8>,
}

impl EcPublicKey {
    /// Parse key bytes in any supported layout.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidPublicKey`] if the bytes are neither a
    /// DER `SubjectPublicKeyInfo` for a supported curve nor a point of a
    /// recognisable length.
    pub fn parse(bytes: &[u8]) -> Result<Self, CryptoError> {
        match bytes.first() {
            None => Err(CryptoError::invalid_public_key("empty key")),
            Some(0x30) => Self::from_spki_der(bytes),
            Some(_) => Self::from_point(bytes),
        }
    }

    /// Parse a DER encoded `SubjectPublicKeyInfo`.
    pub fn from_spki_der(der: &[u8]) -> Result<Self, CryptoError> {
        let info = SubjectPublicKeyInfoRef::try_from(der)
            .map_err(|e| CryptoError::invalid_public_key(e.to_string()))?;

        if info.algorithm.oid != ID_EC_PUBLIC_KEY {
            return Err(CryptoError::invalid_public_key(format!(
                "not an EC key (algorithm {})",
                info.algorithm.oid
            )));
        }

        let curve_oid = info
            .algorithm
            .parameters_oid()
            .map_err(|e| CryptoError::invalid_public_key(e.to_string()))?;
        let curve = if curve_oid == PRIME192V1 {
            EcCurve::P192
        } else if curve_oid == PRIME256V1 {
            EcCurve::P256
        } else {
            return Err(CryptoError::invalid_public_key(format!(
                "unsupported curve {curve_oid}"
            )));
        };

        let point = info
            .subject_public_key
            .as_bytes()
            .ok_or_else(|| CryptoError::invalid_public_key("bit string has unused bits"))?;

        Ok(Self {
            curve,
            sec1: point.to_vec(),
        })
    }

    /// Parse a SEC1 point or bare `x || y` coordinates.
    pub fn from_point(bytes: &[u8]) -> Result<Self, CryptoError> {
        let sec1 = match bytes.len() {
            // bare coordinates without the 0x04 tag
            48 | 64 => {
                let mut tagged = Vec::with_capacity(bytes.len() + 1);
                tagged.push(0x04);
                tagged.extend_from_slice(bytes);
                tagged
            },
            _ => bytes.to_vec(),
        };

        let curve = EcCurve::from_point_len(sec1.len()).ok_or_else(|| {
            CryptoError::invalid_public_key(format!("unexpected key length {}", bytes.len()))
        })?;

        if !matches!(sec1.first(), Some(0x02..=0x04)) {
            return Err(CryptoError::invalid_public_key("invalid SEC1 tag"));
        }

        Ok(Self { curve, sec1 })
    }

    /// Curve the key belongs to.
    #[must_use]
    pub fn curve(&self) -> EcCurve {
        self.curve
    }

    /// SEC1 encoded point.
    #[must_use]
    pub fn sec1_bytes(&self) -> &[u8] {
        &self.sec1
    }

    /// Fail unless the key is on `expected`.
    pub fn require_curve(&self, expected: EcCurve) -> Result<&Self, CryptoError> {
        if self.curve == expected {
            Ok(self)
        } else {
            Err(CryptoError::CurveMismatch {
                expected,
                actual: self.curve,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // P-256 public key from an OCMF sample, DER SubjectPublicKeyInfo.
    const P256_SPKI_HEX: &str = "3059301306072a8648ce3d020106082a8648ce3d03010703420004\
        90731a7a8b3f0f3cf2884237953842f2b196393404edc1485b67b4e5c7b2c3d5\
        bd5934a12485aceb68c341ecc7068775c3a953d86d6e4c70f4ac05aa7533211c";

    fn hex_bytes(s: &str) -> Vec<u8> {
        let clean: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        hex::decode(clean).unwrap()
    }

    #[test]
    fn test_parse_spki() {
        let key = EcPublicKey::parse(&hex_bytes(P256_SPKI_HEX)).unwrap();
        assert_eq!(key.curve(), EcCurve::P256);
        assert_eq!(key.sec1_bytes().len(), 65);
        assert_eq!(key.sec1_bytes()[0], 0x04);
    }

    #[test]
    fn test_parse_bare_coordinates() {
        let spki = hex_bytes(P256_SPKI_HEX);
        let bare = &spki[spki.len() - 64..];
        let key = EcPublicKey::parse(bare).unwrap();
        assert_eq!(key.curve(), EcCurve::P256);
        assert_eq!(&key.sec1_bytes()[1..], bare);
    }

    #[test]
    fn test_p192_point_length() {
        let mut point = vec![0x04];
        point.extend_from_slice(&[0x11; 48]);
        let key = EcPublicKey::parse(&point).unwrap();
        assert_eq!(key.curve(), EcCurve::P192);
        assert!(key.require_curve(EcCurve::P256).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(EcPublicKey::parse(&[]).is_err());
        assert!(EcPublicKey::parse(&[0x04, 0x01, 0x02]).is_err());
        assert!(EcPublicKey::parse(&[0x30, 0x03, 0x01, 0x02, 0x03]).is_err());
    }
}
