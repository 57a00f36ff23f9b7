//! Verified-data view of an SML reading.

use crate::encoding::{printable_ascii, to_formatted_hex, EncodingType};
use crate::error::VerifyError;
use crate::law::{self, LawConformity};
use crate::types::{format_obis, Meter, MeterRole, VerificationType};
use crate::verified_data::Detail;

use super::SmlSignature;

/// An SML reading with the context it was verified in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmlVerifiedData {
    /// Full frame or signature only.
    pub verification_type: VerificationType,
    /// Transport encoding of the input.
    pub encoding: EncodingType,
    /// Key the record was checked against, empty if none was available.
    pub public_key: Vec<u8>,
    /// The parsed record.
    pub record: SmlSignature,
}

impl SmlVerifiedData {
    /// The single reading.
    #[must_use]
    pub fn meters(&self) -> Vec<Meter> {
        vec![self.record.meter(MeterRole::Intermediate)]
    }

    /// Meter identity as text.
    #[must_use]
    pub fn meter_id(&self) -> String {
        identifier_text(self.record.server_id_trimmed())
    }

    /// Record fields not covered by [`SmlVerifiedData::meters`].
    #[must_use]
    pub fn additional_data(&self) -> Vec<Detail> {
        let r = &self.record;
        let mut details = vec![
            Detail::new("Server ID", self.meter_id()),
            Detail::new("Timestamp", r.timestamp.to_string()),
            Detail::new("Status", format!("{:02X}", r.status)),
            Detail::new("Second index", r.second_index.to_string()),
            Detail::new("Pagination", r.pagination.to_string()),
            Detail::new("OBIS", format_obis(&r.obis)),
            Detail::new("Unit", r.unit.to_string()),
            Detail::new("Scaler", r.scaler.to_string()),
            Detail::new("Meter position", r.meter_position.to_string()),
            Detail::new("Log book", r.log_book.to_string()),
        ];
        let customer = r.customer_id_trimmed();
        if !customer.is_empty() {
            details.push(Detail::new("Customer ID", identifier_text(customer)));
        }
        if let Some(method) = r.method {
            details.push(Detail::new("Signature method", method.identifier()));
        }
        if let Some(signature) = &r.provided_signature {
            details.push(Detail::new("Signature", to_formatted_hex(signature, 4)));
        }
        details
    }

    /// Compare this start reading with `stop`.
    pub fn law_conform(&self, stop: &SmlVerifiedData) -> Result<LawConformity, VerifyError> {
        if self.verification_type != stop.verification_type {
            return Err(law::incomparable(
                self.verification_type.name(),
                stop.verification_type.name(),
            ));
        }
        law_conform_records(&self.record, &stop.record)
    }
}

/// Law checks between two SML readings of one transaction.
pub(crate) fn law_conform_records(
    start: &SmlSignature,
    stop: &SmlSignature,
) -> Result<LawConformity, VerifyError> {
    let mut conformity = LawConformity::conformant();

    law::check_same_meter(start.server_id_trimmed(), stop.server_id_trimmed())?;
    law::check_same_unit(&start.unit.to_string(), &stop.unit.to_string())?;
    law::check_same_obis(&start.obis, &stop.obis)?;
    law::check_time_order(start.time(), stop.time())?;
    law::check_monotonic(
        &start.value_kwh(),
        &stop.value_kwh(),
        stop.reset_declared(),
        &mut conformity,
    )?;
    law::check_counter(
        "Pagination",
        u64::from(start.pagination),
        u64::from(stop.pagination),
        &mut conformity,
    );
    law::check_same_session(
        "Customer ID",
        &identifier_text(start.customer_id_trimmed()),
        &identifier_text(stop.customer_id_trimmed()),
        &mut conformity,
    );
    Ok(conformity)
}

fn identifier_text(bytes: &[u8]) -> String {
    printable_ascii(bytes).unwrap_or_else(|| to_formatted_hex(bytes, 4))
}
