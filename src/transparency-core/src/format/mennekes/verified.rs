//! Verified-data view of a Mennekes charging process.

use crate::encoding::{printable_ascii, to_formatted_hex};
use crate::error::VerifyError;
use crate::format::sml::verified::law_conform_records;
use crate::law::LawConformity;
use crate::types::{Meter, MeterRole};
use crate::verified_data::Detail;

use super::MennekesChargingProcess;

/// A charging process with the key it was checked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MennekesVerifiedData {
    /// Public key, empty if none was available.
    pub public_key: Vec<u8>,
    /// The parsed process.
    pub process: MennekesChargingProcess,
}

impl MennekesVerifiedData {
    /// Start and end reading.
    #[must_use]
    pub fn meters(&self) -> Vec<Meter> {
        vec![
            self.process.start.meter(MeterRole::Start),
            self.process.end.meter(MeterRole::Stop),
        ]
    }

    /// Meter identity as text.
    #[must_use]
    pub fn meter_id(&self) -> String {
        let id = self.process.start.server_id_trimmed();
        printable_ascii(id).unwrap_or_else(|| to_formatted_hex(id, 4))
    }

    /// Identifiers and counters of both readings.
    #[must_use]
    pub fn additional_data(&self) -> Vec<Detail> {
        let (start, end) = (&self.process.start, &self.process.end);
        let mut details = vec![
            Detail::new("Server ID", self.meter_id()),
            Detail::new("Pagination start", start.pagination.to_string()),
            Detail::new("Pagination end", end.pagination.to_string()),
            Detail::new("Status start", format!("{:02X}", start.status)),
            Detail::new("Status end", format!("{:02X}", end.status)),
        ];
        let customer = start.customer_id_trimmed();
        if !customer.is_empty() {
            let text = printable_ascii(customer).unwrap_or_else(|| to_formatted_hex(customer, 4));
            details.push(Detail::new("Customer ID", text));
        }
        details
    }

    /// Law checks between the two readings of this process.
    pub fn internal_conformity(&self) -> Result<LawConformity, VerifyError> {
        law_conform_records(&self.process.start, &self.process.end)
    }

    /// Compare this process's start reading with `stop`'s end reading.
    pub fn law_conform(&self, stop: &MennekesVerifiedData) -> Result<LawConformity, VerifyError> {
        law_conform_records(&self.process.start, &stop.process.end)
    }
}
