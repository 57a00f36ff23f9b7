//! Verified-data view of an Alfen record.

use crate::encoding::{printable_ascii, to_formatted_hex};
use crate::error::VerifyError;
use crate::law::{self, LawConformity};
use crate::types::{format_obis, Meter};
use crate::verified_data::Detail;

use super::AlfenSignature;

/// An Alfen record with the key it was checked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlfenVerifiedData {
    /// Public key, empty if none was available.
    pub public_key: Vec<u8>,
    /// The parsed record.
    pub record: AlfenSignature,
}

fn text(bytes: &[u8]) -> String {
    printable_ascii(bytes).unwrap_or_else(|| to_formatted_hex(bytes, 4))
}

impl AlfenVerifiedData {
    /// The single reading.
    #[must_use]
    pub fn meters(&self) -> Vec<Meter> {
        vec![self.record.fields.meter()]
    }

    /// Meter identity as text.
    #[must_use]
    pub fn meter_id(&self) -> String {
        text(&self.record.fields.meter_id)
    }

    /// Dataset fields not covered by [`AlfenVerifiedData::meters`].
    #[must_use]
    pub fn additional_data(&self) -> Vec<Detail> {
        let f = &self.record.fields;
        vec![
            Detail::new("Version", self.record.version.to_string()),
            Detail::new("Adapter ID", text(&f.adapter_id)),
            Detail::new("Adapter firmware", text(&f.adapter_firmware)),
            Detail::new("Adapter checksum", format!("{:04X}", f.adapter_checksum)),
            Detail::new("Meter ID", self.meter_id()),
            Detail::new("Meter status", format!("{:08X}", f.meter_status)),
            Detail::new("Adapter status", format!("{:08X}", f.adapter_status)),
            Detail::new("Second index", f.second_index.to_string()),
            Detail::new("OBIS", format_obis(&f.obis)),
            Detail::new("UID", text(&f.uid)),
            Detail::new("Session ID", f.session_id.to_string()),
            Detail::new("Paging", f.paging.to_string()),
            Detail::new("Signature", to_formatted_hex(&self.record.signature, 4)),
        ]
    }

    /// Compare this start reading with `stop`.
    pub fn law_conform(&self, stop: &AlfenVerifiedData) -> Result<LawConformity, VerifyError> {
        let (start, stop) = (&self.record.fields, &stop.record.fields);
        let mut conformity = LawConformity::conformant();

        law::check_same_meter(&start.meter_id, &stop.meter_id)?;
        law::check_same_unit(&start.unit.to_string(), &stop.unit.to_string())?;
        law::check_same_obis(&start.obis, &stop.obis)?;
        law::check_time_order(start.time(), stop.time())?;
        law::check_monotonic(
            &start.value_kwh(),
            &stop.value_kwh(),
            stop.meter_status != 0,
            &mut conformity,
        )?;
        law::check_counter(
            "Paging",
            u64::from(start.paging),
            u64::from(stop.paging),
            &mut conformity,
        );
        law::check_same_session(
            "Session ID",
            &start.session_id.to_string(),
            &stop.session_id.to_string(),
            &mut conformity,
        );
        Ok(conformity)
    }
}
