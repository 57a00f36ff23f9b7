//! SML transport frames and the messages inside them.
//!
//! ```text
//! 1B1B1B1B 01010101 | messages ... | 00 padding | 1B1B1B1B 1A <pad> <crc16>
//! ```
//!
//! The trailing CRC-16/X.25 covers everything before it. Each message is a
//! list of six elements whose fifth element is a CRC over the preceding
//! bytes of the message.

use crc::{Crc, CRC_16_IBM_SDLC};
use tracing::debug;

use super::tl::{SmlValue, TlReader};
use super::{obis, SmlSignature};
use crate::error::ValidationError;

/// CRC-16/X.25 as used by SML.
pub const X25: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_SDLC);

/// Escape sequence opening every transport command.
pub const ESCAPE: [u8; 4] = [0x1B; 4];
/// Transport start sequence.
pub const START: [u8; 8] = [0x1B, 0x1B, 0x1B, 0x1B, 0x01, 0x01, 0x01, 0x01];
const END_MARKER: u8 = 0x1A;

/// Message body tags.
pub mod tag {
    /// `SML_PublicOpen.Res`
    pub const OPEN_RESPONSE: u64 = 0x0101;
    /// `SML_PublicClose.Res`
    pub const CLOSE_RESPONSE: u64 = 0x0201;
    /// `SML_GetList.Res`
    pub const GET_LIST_RESPONSE: u64 = 0x0701;
}

/// SML time choice tags.
pub mod time {
    /// Seconds since meter power-up.
    pub const SEC_INDEX: u64 = 1;
    /// Unix timestamp.
    pub const TIMESTAMP: u64 = 2;
}

/// One SML message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmlMessage {
    /// Transaction id.
    pub transaction_id: Vec<u8>,
    /// Body tag, see [`tag`].
    pub tag: u64,
    /// Body content.
    pub body: SmlValue,
}

/// Whether `bytes` starts like an SML transport frame.
#[must_use]
pub fn has_start_sequence(bytes: &[u8]) -> bool {
    bytes.starts_with(&START)
}

/// Strip the transport envelope and return the message bytes.
///
/// # Errors
///
/// Fails when the start or end sequence is missing, the padding is
/// inconsistent or the checksum does not match.
pub fn unwrap_transport(bytes: &[u8]) -> Result<&[u8], ValidationError> {
    if !has_start_sequence(bytes) {
        return Err(ValidationError::sml("Missing SML start sequence"));
    }
    if bytes.len() < START.len() + 8 {
        return Err(ValidationError::sml("Truncated SML frame"));
    }

    let end = &bytes[bytes.len() - 8..];
    if end[..4] != ESCAPE || end[4] != END_MARKER {
        return Err(ValidationError::sml("Missing SML end sequence"));
    }

    let expected = u16::from_be_bytes([end[6], end[7]]);
    let actual = X25.checksum(&bytes[..bytes.len() - 2]);
    if expected != actual {
        return Err(ValidationError::sml(format!(
            "SML frame checksum mismatch: expected {expected:04X}, computed {actual:04X}"
        )));
    }

    let padding = usize::from(end[5]);
    let body_end = bytes.len() - 8;
    if padding > 3 || body_end < START.len() + padding {
        return Err(ValidationError::sml("Invalid SML padding"));
    }
    Ok(&bytes[START.len()..body_end - padding])
}

/// Wrap message bytes in a transport frame.
#[must_use]
pub fn wrap_transport(messages: &[u8]) -> Vec<u8> {
    let padding = (4 - messages.len() % 4) % 4;
    let mut frame = Vec::with_capacity(messages.len() + 20);
    frame.extend_from_slice(&START);
    frame.extend_from_slice(messages);
    frame.resize(frame.len() + padding, 0x00);
    frame.extend_from_slice(&ESCAPE);
    frame.push(END_MARKER);
    frame.push(padding as u8);
    let crc = X25.checksum(&frame);
    frame.extend_from_slice(&crc.to_be_bytes());
    frame
}

/// Decode all messages in an unwrapped frame, checking message CRCs.
pub fn read_messages(body: &[u8]) -> Result<Vec<SmlMessage>, ValidationError> {
    let mut reader = TlReader::new(body);
    let mut messages = Vec::new();

    while !reader.is_empty() {
        // trailing fill inside the body
        if reader.peek() == Some(0x00) {
            let _ = reader.read_value()?;
            continue;
        }

        let start = reader.position();
        if reader.read_list_header()? != 6 {
            return Err(ValidationError::sml("SML message must have six elements"));
        }
        let transaction_id = reader.read_value()?;
        let _group_no = reader.read_value()?;
        let _abort_on_error = reader.read_value()?;
        let body = reader.read_value()?;
        let covered = X25.checksum(reader.consumed_since(start));
        let crc = reader.read_value()?;
        if reader.read_value()? != SmlValue::EndOfMessage {
            return Err(ValidationError::sml("Missing SML end of message"));
        }

        if let Some(expected) = crc.as_u64() {
            if expected != u64::from(covered) {
                return Err(ValidationError::sml("SML message checksum mismatch"));
            }
        }

        let (tag, body) = match body {
            SmlValue::List(mut choice) if choice.len() == 2 => {
                let content = choice.pop().unwrap_or(SmlValue::Absent);
                let tag = choice[0]
                    .as_u64()
                    .ok_or_else(|| ValidationError::sml("Invalid SML message tag"))?;
                (tag, content)
            },
            _ => return Err(ValidationError::sml("Invalid SML message body")),
        };

        messages.push(SmlMessage {
            transaction_id: transaction_id.as_octets().unwrap_or_default().to_vec(),
            tag,
            body,
        });
    }
    Ok(messages)
}

/// Encode one message, computing its CRC.
#[must_use]
pub fn encode_message(transaction_id: &[u8], tag: u64, body: SmlValue) -> Vec<u8> {
    let mut out = vec![0x76];
    SmlValue::Octets(transaction_id.to_vec()).encode_into(&mut out);
    SmlValue::Unsigned(0).encode_into(&mut out);
    SmlValue::Unsigned(0).encode_into(&mut out);
    SmlValue::List(vec![SmlValue::Unsigned(tag), body]).encode_into(&mut out);
    let crc = X25.checksum(&out);
    out.push(0x63);
    out.extend_from_slice(&crc.to_be_bytes());
    out.push(0x00);
    out
}

/// Read the signed energy reading and its companion registers from a frame.
///
/// # Errors
///
/// Fails on transport or message errors, or when the frame carries no
/// `GetList` response with an energy register.
pub fn read_signature(bytes: &[u8]) -> Result<SmlSignature, ValidationError> {
    let body = unwrap_transport(bytes)?;
    let messages = read_messages(body)?;
    debug!(count = messages.len(), "decoded SML messages");

    let list = messages
        .iter()
        .find(|m| m.tag == tag::GET_LIST_RESPONSE)
        .and_then(|m| m.body.as_list())
        .ok_or_else(|| ValidationError::sml("No SML GetList response in frame"))?;
    if list.len() != 7 {
        return Err(ValidationError::sml("Invalid SML GetList response"));
    }

    let mut record = SmlSignature {
        server_id: list[1].as_octets().unwrap_or_default().to_vec(),
        ..SmlSignature::default()
    };
    if let Some((time::SEC_INDEX, index)) = read_time(&list[3]) {
        record.second_index = u32::try_from(index)
            .map_err(|_| ValidationError::sml("Second index out of range"))?;
    }

    let entries = list[4]
        .as_list()
        .ok_or_else(|| ValidationError::sml("Invalid SML value list"))?;
    let mut found_energy = false;

    for entry in entries {
        let fields = entry
            .as_list()
            .filter(|f| f.len() == 7)
            .ok_or_else(|| ValidationError::sml("Invalid SML list entry"))?;
        let Some(code) = fields[0].as_octets() else {
            continue;
        };

        match code {
            c if c == obis::ENERGY_IMPORT => {
                found_energy = true;
                record.obis = obis::ENERGY_IMPORT;
                read_energy(fields, &mut record)?;
            },
            c if c == obis::PUBLIC_KEY => {
                record.public_key = fields[5].as_octets().map(<[u8]>::to_vec);
            },
            c if c == obis::PAGINATION => {
                record.pagination = u32::try_from(fields[5].as_u64().unwrap_or(0))
                    .map_err(|_| ValidationError::sml("Pagination out of range"))?;
            },
            c if c == obis::CUSTOMER_ID => {
                record.customer_id = fields[5].as_octets().unwrap_or_default().to_vec();
            },
            c if c == obis::LOG_BOOK => {
                record.log_book = u16::try_from(fields[5].as_u64().unwrap_or(0))
                    .map_err(|_| ValidationError::sml("Log book counter out of range"))?;
            },
            _ => {},
        }
    }

    if !found_energy {
        return Err(ValidationError::sml("No energy register in SML frame"));
    }
    Ok(record)
}

fn read_energy(fields: &[SmlValue], record: &mut SmlSignature) -> Result<(), ValidationError> {
    record.status = fields[1]
        .as_u64()
        .map_or(Ok(0), u8::try_from)
        .map_err(|_| ValidationError::sml("Status out of range"))?;

    match read_time(&fields[2]) {
        Some((time::TIMESTAMP, ts)) => {
            record.timestamp = u32::try_from(ts)
                .map_err(|_| ValidationError::sml("Timestamp out of range"))?;
        },
        _ => return Err(ValidationError::sml("Energy register has no timestamp")),
    }

    record.unit = fields[3]
        .as_u64()
        .and_then(|u| u8::try_from(u).ok())
        .ok_or_else(|| ValidationError::sml("Energy register has no unit"))?;
    record.scaler = fields[4]
        .as_i64()
        .map_or(Ok(0), i8::try_from)
        .map_err(|_| ValidationError::sml("Scaler out of range"))?;
    record.meter_position = fields[5]
        .as_i64()
        .ok_or_else(|| ValidationError::sml("Energy register has no value"))?;
    record.provided_signature = fields[6].as_octets().map(<[u8]>::to_vec);
    Ok(())
}

fn read_time(value: &SmlValue) -> Option<(u64, u64)> {
    match value.as_list()? {
        [choice, v] => Some((choice.as_u64()?, v.as_u64()?)),
        _ => None,
    }
}
