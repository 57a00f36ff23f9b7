//! Encode signed readings as SML transport frames.
//!
//! Meter simulators and test fixtures need frames that the reader accepts;
//! this produces the open / get-list / close sequence an EDL meter sends.

use super::frame::{encode_message, tag, time, wrap_transport};
use super::tl::SmlValue;
use super::{obis, SmlSignature};

fn register(code: [u8; 6], value: SmlValue) -> SmlValue {
    SmlValue::List(vec![
        SmlValue::Octets(code.to_vec()),
        SmlValue::Absent,
        SmlValue::Absent,
        SmlValue::Absent,
        SmlValue::Absent,
        value,
        SmlValue::Absent,
    ])
}

fn time_value(choice: u64, value: u32) -> SmlValue {
    SmlValue::List(vec![SmlValue::Unsigned(choice), SmlValue::Unsigned(u64::from(value))])
}

impl SmlSignature {
    /// Complete transport frame carrying this reading.
    #[must_use]
    pub fn to_frame(&self) -> Vec<u8> {
        let energy = SmlValue::List(vec![
            SmlValue::Octets(self.obis.to_vec()),
            SmlValue::Unsigned(u64::from(self.status)),
            time_value(time::TIMESTAMP, self.timestamp),
            SmlValue::Unsigned(u64::from(self.unit)),
            SmlValue::Int(i64::from(self.scaler)),
            SmlValue::Int(self.meter_position),
            self.provided_signature
                .as_ref()
                .map_or(SmlValue::Absent, |s| SmlValue::Octets(s.clone())),
        ]);

        let mut entries = vec![
            energy,
            register(obis::PAGINATION, SmlValue::Unsigned(u64::from(self.pagination))),
            register(obis::LOG_BOOK, SmlValue::Unsigned(u64::from(self.log_book))),
            register(obis::CUSTOMER_ID, SmlValue::Octets(self.customer_id.clone())),
        ];
        if let Some(key) = &self.public_key {
            entries.push(register(obis::PUBLIC_KEY, SmlValue::Octets(key.clone())));
        }

        let open = SmlValue::List(vec![
            SmlValue::Absent,
            SmlValue::Absent,
            SmlValue::Octets(vec![0x00, 0x01]),
            SmlValue::Octets(self.server_id.clone()),
            SmlValue::Absent,
            SmlValue::Absent,
        ]);
        let get_list = SmlValue::List(vec![
            SmlValue::Absent,
            SmlValue::Octets(self.server_id.clone()),
            SmlValue::Absent,
            time_value(time::SEC_INDEX, self.second_index),
            SmlValue::List(entries),
            SmlValue::Absent,
            SmlValue::Absent,
        ]);
        let close = SmlValue::List(vec![SmlValue::Absent]);

        let mut messages = encode_message(&[0x01], tag::OPEN_RESPONSE, open);
        messages.extend(encode_message(&[0x02], tag::GET_LIST_RESPONSE, get_list));
        messages.extend(encode_message(&[0x03], tag::CLOSE_RESPONSE, close));
        wrap_transport(&messages)
    }

    /// Signature-only blob: signed message followed by the signature.
    ///
    /// Returns `None` when the identifiers do not fit or no signature is set.
    #[must_use]
    pub fn to_blob(&self) -> Option<Vec<u8>> {
        let mut blob = self.signed_message().ok()?;
        blob.extend_from_slice(self.provided_signature.as_ref()?);
        Some(blob)
    }
}
