//! Verified-data view of an OCMF record.

use crate::encoding::{to_formatted_hex, EncodingType};
use crate::error::VerifyError;
use crate::law::{self, LawConformity};
use crate::types::Meter;
use crate::verified_data::Detail;

use super::OcmfSignature;

/// An OCMF record with the key it was checked against.
#[derive(Debug, Clone, PartialEq)]
pub struct OcmfVerifiedData {
    /// Public key, empty if none was available.
    pub public_key: Vec<u8>,
    /// The parsed record.
    pub record: OcmfSignature,
}

impl OcmfVerifiedData {
    /// Transaction readings.
    #[must_use]
    pub fn meters(&self) -> Vec<Meter> {
        self.record.meters()
    }

    /// Encoding of the signature data.
    #[must_use]
    pub fn encoding(&self) -> EncodingType {
        self.record.signature_encoding
    }

    /// Payload metadata and extra registers.
    #[must_use]
    pub fn additional_data(&self) -> Vec<Detail> {
        let p = &self.record.payload;
        let optional = [
            ("Format version", &p.format_version),
            ("Gateway ID", &p.gateway_id),
            ("Gateway serial", &p.gateway_serial),
            ("Gateway version", &p.gateway_version),
            ("Pagination", &p.pagination),
            ("Meter vendor", &p.meter_vendor),
            ("Meter model", &p.meter_model),
            ("Meter serial", &p.meter_serial),
            ("Meter firmware", &p.meter_firmware),
            ("Identification level", &p.identification_level),
            ("Identification type", &p.identification_type),
            ("Identification data", &p.identification_data),
            ("Tariff", &p.tariff_text),
            ("Charge point ID type", &p.charge_point_id_type),
            ("Charge point ID", &p.charge_point_id),
        ];

        let mut details: Vec<Detail> = optional
            .into_iter()
            .filter_map(|(name, value)| value.as_ref().map(|v| Detail::new(name, v.clone())))
            .collect();

        if let Some(status) = p.identification_status {
            details.push(Detail::new("Identification status", status.to_string()));
        }
        if !p.identification_flags.is_empty() {
            details.push(Detail::new(
                "Identification flags",
                p.identification_flags.join(", "),
            ));
        }
        for register in self.record.extra_registers() {
            let name = register.identifier.as_deref().unwrap_or("Register");
            details.push(Detail::new(
                format!("Register {name}"),
                format!("{} {}", register.meter.value, register.meter.unit),
            ));
        }
        details.push(Detail::new("Signature algorithm", self.record.algorithm.identifier()));
        details.push(Detail::new(
            "Signature",
            to_formatted_hex(&self.record.signature_bytes, 4),
        ));
        details
    }

    /// Compare this start record with `stop`.
    ///
    /// The start value is the first `B` reading of this record, the stop
    /// value the last closing reading of `stop`. Both may be the same record.
    pub fn law_conform(&self, stop: &OcmfVerifiedData) -> Result<LawConformity, VerifyError> {
        law_conform_records(&self.record, &stop.record)
    }
}

pub(crate) fn law_conform_records(
    start: &OcmfSignature,
    stop: &OcmfSignature,
) -> Result<LawConformity, VerifyError> {
    let mut conformity = LawConformity::conformant();

    law::check_same_meter(
        start.meter_id().unwrap_or_default().as_bytes(),
        stop.meter_id().unwrap_or_default().as_bytes(),
    )?;

    let (Some(first), Some(last)) = (start.start_reading(), stop.stop_reading()) else {
        return Ok(conformity);
    };
    law::check_same_unit(&first.meter.unit, &last.meter.unit)?;
    law::check_time_order(first.meter.timestamp, last.meter.timestamp)?;
    law::check_monotonic(
        &first.meter.value,
        &last.meter.value,
        last.reset_declared,
        &mut conformity,
    )?;
    law::check_same_session(
        "Identification data",
        start.payload.identification_data.as_deref().unwrap_or_default(),
        stop.payload.identification_data.as_deref().unwrap_or_default(),
        &mut conformity,
    );
    Ok(conformity)
}
