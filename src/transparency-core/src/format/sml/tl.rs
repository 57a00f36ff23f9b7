//! SML type-length encoding.
//!
//! Each value starts with one or more TL bytes: bit 7 says another TL byte
//! follows, bits 6..4 of the first byte give the type, and the low nibbles
//! concatenate into the length. For scalars the length counts the TL bytes
//! themselves; for lists it is the number of elements.

use crate::error::ValidationError;

const TYPE_OCTETS: u8 = 0;
const TYPE_BOOL: u8 = 4;
const TYPE_INT: u8 = 5;
const TYPE_UNSIGNED: u8 = 6;
const TYPE_LIST: u8 = 7;

const MAX_DEPTH: usize = 16;

/// A decoded SML value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmlValue {
    /// Octet string.
    Octets(Vec<u8>),
    /// Boolean.
    Bool(bool),
    /// Signed integer, sign-extended.
    Int(i64),
    /// Unsigned integer.
    Unsigned(u64),
    /// Sequence or choice.
    List(Vec<SmlValue>),
    /// Optional value not present (`0x01`).
    Absent,
    /// End of message marker (`0x00`).
    EndOfMessage,
}

impl SmlValue {
    /// Octet string contents.
    #[must_use]
    pub fn as_octets(&self) -> Option<&[u8]> {
        match self {
            Self::Octets(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Integer value of either signedness.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Unsigned(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Unsigned value.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Unsigned(v) => Some(*v),
            Self::Int(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// List elements.
    #[must_use]
    pub fn as_list(&self) -> Option<&[SmlValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Whether the value is the absent marker.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Append the TL encoding of this value to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Self::Absent => out.push(0x01),
            Self::EndOfMessage => out.push(0x00),
            Self::Bool(v) => {
                out.push(0x42);
                out.push(u8::from(*v));
            },
            Self::Octets(bytes) => {
                write_scalar_tl(out, TYPE_OCTETS, bytes.len());
                out.extend_from_slice(bytes);
            },
            Self::Unsigned(v) => {
                let width = unsigned_width(*v);
                write_scalar_tl(out, TYPE_UNSIGNED, width);
                out.extend_from_slice(&v.to_be_bytes()[8 - width..]);
            },
            Self::Int(v) => {
                let width = signed_width(*v);
                write_scalar_tl(out, TYPE_INT, width);
                out.extend_from_slice(&v.to_be_bytes()[8 - width..]);
            },
            Self::List(items) => {
                write_tl(out, TYPE_LIST, items.len(), count_tl_len(items.len()));
                for item in items {
                    item.encode_into(out);
                }
            },
        }
    }

    /// TL encoding of this value.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }
}

fn unsigned_width(v: u64) -> usize {
    match v {
        0..=0xFF => 1,
        0x100..=0xFFFF => 2,
        0x1_0000..=0xFFFF_FFFF => 4,
        _ => 8,
    }
}

fn signed_width(v: i64) -> usize {
    if i8::try_from(v).is_ok() {
        1
    } else if i16::try_from(v).is_ok() {
        2
    } else if i32::try_from(v).is_ok() {
        4
    } else {
        8
    }
}

fn count_tl_len(count: usize) -> usize {
    let mut n = 1;
    while count >= 1 << (4 * n) {
        n += 1;
    }
    n
}

fn write_scalar_tl(out: &mut Vec<u8>, kind: u8, payload: usize) {
    let mut n = 1;
    while payload + n >= 1 << (4 * n) {
        n += 1;
    }
    write_tl(out, kind, payload + n, n);
}

fn write_tl(out: &mut Vec<u8>, kind: u8, length: usize, tl_bytes: usize) {
    for i in 0..tl_bytes {
        let shift = 4 * (tl_bytes - 1 - i);
        let mut byte = ((length >> shift) & 0x0F) as u8;
        if i == 0 {
            byte |= kind << 4;
        }
        if i + 1 < tl_bytes {
            byte |= 0x80;
        }
        out.push(byte);
    }
}

/// Cursor decoding TL values from a byte slice.
#[derive(Debug)]
pub struct TlReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> TlReader<'a> {
    /// Start reading at the beginning of `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Whether all input was consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Next byte without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /// Raw bytes between `start` and the current position.
    #[must_use]
    pub fn consumed_since(&self, start: usize) -> &'a [u8] {
        &self.data[start.min(self.pos)..self.pos]
    }

    /// Read a list header and return its element count.
    pub fn read_list_header(&mut self) -> Result<usize, ValidationError> {
        let (kind, length, _) = self.read_tl()?;
        if kind != TYPE_LIST {
            return Err(ValidationError::sml(format!(
                "Expected SML list at offset {}",
                self.pos
            )));
        }
        Ok(length)
    }

    /// Read one value, recursing into lists.
    pub fn read_value(&mut self) -> Result<SmlValue, ValidationError> {
        self.read_nested(0)
    }

    fn read_nested(&mut self, depth: usize) -> Result<SmlValue, ValidationError> {
        if depth > MAX_DEPTH {
            return Err(ValidationError::sml("SML nesting too deep"));
        }
        match self.peek() {
            Some(0x00) => {
                self.pos += 1;
                return Ok(SmlValue::EndOfMessage);
            },
            Some(0x01) => {
                self.pos += 1;
                return Ok(SmlValue::Absent);
            },
            _ => {},
        }

        let (kind, length, tl_bytes) = self.read_tl()?;
        if kind == TYPE_LIST {
            let mut items = Vec::with_capacity(length.min(64));
            for _ in 0..length {
                items.push(self.read_nested(depth + 1)?);
            }
            return Ok(SmlValue::List(items));
        }

        let payload_len = length.checked_sub(tl_bytes).ok_or_else(|| {
            ValidationError::sml(format!("Invalid SML length at offset {}", self.pos))
        })?;
        let payload = self.take(payload_len)?;

        match kind {
            TYPE_OCTETS => Ok(SmlValue::Octets(payload.to_vec())),
            TYPE_BOOL => match payload {
                [b] => Ok(SmlValue::Bool(*b != 0)),
                _ => Err(ValidationError::sml("Invalid SML boolean")),
            },
            TYPE_INT => {
                check_int_width(payload)?;
                let fill = if payload[0] & 0x80 != 0 { 0xFF } else { 0x00 };
                let mut buf = [fill; 8];
                buf[8 - payload.len()..].copy_from_slice(payload);
                Ok(SmlValue::Int(i64::from_be_bytes(buf)))
            },
            TYPE_UNSIGNED => {
                check_int_width(payload)?;
                let mut buf = [0u8; 8];
                buf[8 - payload.len()..].copy_from_slice(payload);
                Ok(SmlValue::Unsigned(u64::from_be_bytes(buf)))
            },
            other => Err(ValidationError::sml(format!("Unknown SML type {other}"))),
        }
    }

    fn read_tl(&mut self) -> Result<(u8, usize, usize), ValidationError> {
        let first = self.byte()?;
        let kind = (first >> 4) & 0x07;
        let mut length = usize::from(first & 0x0F);
        let mut tl_bytes = 1;
        let mut current = first;

        while current & 0x80 != 0 {
            current = self.byte()?;
            if current & 0x70 != 0 {
                return Err(ValidationError::sml("Invalid SML length continuation"));
            }
            length = (length << 4) | usize::from(current & 0x0F);
            tl_bytes += 1;
            if tl_bytes > 4 {
                return Err(ValidationError::sml("SML length field too long"));
            }
        }
        Ok((kind, length, tl_bytes))
    }

    fn byte(&mut self) -> Result<u8, ValidationError> {
        let b = self
            .peek()
            .ok_or_else(|| ValidationError::sml("Truncated SML data"))?;
        self.pos += 1;
        Ok(b)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ValidationError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| ValidationError::sml("Truncated SML data"))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }
}

fn check_int_width(payload: &[u8]) -> Result<(), ValidationError> {
    if payload.is_empty() || payload.len() > 8 {
        return Err(ValidationError::sml(format!(
            "Invalid SML integer width {}",
            payload.len()
        )));
    }
    Ok(())
}
