//! Parsed and (possibly) verified data, one variant per format family.

use serde::ser::Serializer;
use serde::Serialize;

use crate::encoding::{to_formatted_hex, EncodingType};
use crate::error::VerifyError;
use crate::format::alfen::AlfenVerifiedData;
use crate::format::mennekes::MennekesVerifiedData;
use crate::format::ocmf::OcmfVerifiedData;
use crate::format::sml::SmlVerifiedData;
use crate::law::{self, LawConformity};
use crate::types::{Meter, VerificationType};

/// A named value shown alongside the meter readings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Detail {
    /// Display name.
    pub name: String,
    /// Display value.
    pub value: String,
}

impl Detail {
    /// Create a detail entry.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Variant tag of [`VerifiedData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum VerifiedDataKind {
    /// SML frame or signature-only blob.
    Sml,
    /// OCMF record.
    Ocmf,
    /// Alfen record.
    Alfen,
    /// Mennekes charging process.
    Mennekes,
}

/// Data extracted from a signed payload.
///
/// Built whenever parsing succeeds, including when the signature is then
/// rejected, so callers can show what the payload claims.
#[derive(Debug, Clone, PartialEq)]
pub enum VerifiedData {
    /// SML frame or signature-only blob.
    Sml(SmlVerifiedData),
    /// OCMF record.
    Ocmf(OcmfVerifiedData),
    /// Alfen record.
    Alfen(AlfenVerifiedData),
    /// Mennekes charging process.
    Mennekes(MennekesVerifiedData),
}

impl VerifiedData {
    /// Variant tag.
    #[must_use]
    pub fn kind(&self) -> VerifiedDataKind {
        match self {
            Self::Sml(_) => VerifiedDataKind::Sml,
            Self::Ocmf(_) => VerifiedDataKind::Ocmf,
            Self::Alfen(_) => VerifiedDataKind::Alfen,
            Self::Mennekes(_) => VerifiedDataKind::Mennekes,
        }
    }

    /// Format the data was read as.
    #[must_use]
    pub fn format(&self) -> VerificationType {
        match self {
            Self::Sml(d) => d.verification_type,
            Self::Ocmf(_) => VerificationType::Ocmf,
            Self::Alfen(_) => VerificationType::Alfen,
            Self::Mennekes(_) => VerificationType::Mennekes,
        }
    }

    /// Encoding of the binary parts of the payload.
    #[must_use]
    pub fn encoding(&self) -> EncodingType {
        match self {
            Self::Sml(d) => d.encoding,
            Self::Ocmf(d) => d.encoding(),
            Self::Alfen(_) | Self::Mennekes(_) => EncodingType::PlainHex,
        }
    }

    /// Raw public key the data was checked against.
    #[must_use]
    pub fn public_key_bytes(&self) -> &[u8] {
        match self {
            Self::Sml(d) => &d.public_key,
            Self::Ocmf(d) => &d.public_key,
            Self::Alfen(d) => &d.public_key,
            Self::Mennekes(d) => &d.public_key,
        }
    }

    /// Public key as grouped upper-case hex.
    #[must_use]
    pub fn public_key(&self) -> String {
        self.formatted_public_key(4)
    }

    /// Public key as upper-case hex in groups of `group` digits.
    #[must_use]
    pub fn formatted_public_key(&self, group: usize) -> String {
        to_formatted_hex(self.public_key_bytes(), group)
    }

    /// Meter readings in order of appearance.
    #[must_use]
    pub fn meters(&self) -> Vec<Meter> {
        match self {
            Self::Sml(d) => d.meters(),
            Self::Ocmf(d) => d.meters(),
            Self::Alfen(d) => d.meters(),
            Self::Mennekes(d) => d.meters(),
        }
    }

    /// Meter identity, where the format carries one.
    #[must_use]
    pub fn meter_id(&self) -> Option<String> {
        match self {
            Self::Sml(d) => Some(d.meter_id()),
            Self::Ocmf(d) => d.record.meter_id().map(str::to_string),
            Self::Alfen(d) => Some(d.meter_id()),
            Self::Mennekes(d) => Some(d.meter_id()),
        }
    }

    /// Meter model or vendor, where the format carries one.
    #[must_use]
    pub fn meter_model(&self) -> Option<String> {
        match self {
            Self::Ocmf(d) => {
                let p = &d.record.payload;
                p.meter_model.clone().or_else(|| p.meter_vendor.clone())
            },
            _ => None,
        }
    }

    /// Format specific fields for display.
    #[must_use]
    pub fn additional_data(&self) -> Vec<Detail> {
        match self {
            Self::Sml(d) => d.additional_data(),
            Self::Ocmf(d) => d.additional_data(),
            Self::Alfen(d) => d.additional_data(),
            Self::Mennekes(d) => d.additional_data(),
        }
    }

    /// Check this start record against the transaction's `stop` record.
    ///
    /// # Errors
    ///
    /// A validation error when the records cannot be compared, a regulation
    /// error on a hard violation.
    pub fn law_conform(&self, stop: &VerifiedData) -> Result<LawConformity, VerifyError> {
        match (self, stop) {
            (Self::Sml(start), Self::Sml(stop)) => start.law_conform(stop),
            (Self::Ocmf(start), Self::Ocmf(stop)) => start.law_conform(stop),
            (Self::Alfen(start), Self::Alfen(stop)) => start.law_conform(stop),
            (Self::Mennekes(start), Self::Mennekes(stop)) => start.law_conform(stop),
            _ => Err(law::incomparable(self.format().name(), stop.format().name())),
        }
    }
}

#[derive(Serialize)]
struct VerifiedDataView {
    format: VerificationType,
    encoding: EncodingType,
    public_key: String,
    meters: Vec<Meter>,
    additional_data: Vec<Detail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meter_id: Option<String>,
}

impl Serialize for VerifiedData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        VerifiedDataView {
            format: self.format(),
            encoding: self.encoding(),
            public_key: self.public_key(),
            meters: self.meters(),
            additional_data: self.additional_data(),
            meter_id: self.meter_id(),
        }
        .serialize(serializer)
    }
}
