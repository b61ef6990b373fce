//! Tag-length-value wire format.
//!
//! Bit-exact with the protobuf binary encoding for wire types 0 (varint),
//! 1 (fixed64), 2 (length-delimited) and 5 (fixed32). Groups (3, 4) are not
//! supported and surface as [`WireError::UnknownWireType`].

use std::fmt;

use bytes::Bytes;

use crate::error::{WireError, WireResult};

/// Largest field number the tag encoding can carry.
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// How a record's payload is framed on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WireType {
    Varint,
    Fixed64,
    LengthDelimited,
    Fixed32,
}

impl WireType {
    /// The 3-bit code stored in the low bits of a tag.
    pub fn code(self) -> u8 {
        match self {
            Self::Varint => 0,
            Self::Fixed64 => 1,
            Self::LengthDelimited => 2,
            Self::Fixed32 => 5,
        }
    }

    /// Parse a 3-bit wire type code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Varint),
            1 => Some(Self::Fixed64),
            2 => Some(Self::LengthDelimited),
            5 => Some(Self::Fixed32),
            _ => None,
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Varint => write!(f, "varint"),
            Self::Fixed64 => write!(f, "fixed64"),
            Self::LengthDelimited => write!(f, "length-delimited"),
            Self::Fixed32 => write!(f, "fixed32"),
        }
    }
}

/// A raw payload as read off the wire, before schema interpretation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WireValue {
    Varint(u64),
    Fixed64(u64),
    Bytes(Bytes),
    Fixed32(u32),
}

impl WireValue {
    pub fn wire_type(&self) -> WireType {
        match self {
            Self::Varint(_) => WireType::Varint,
            Self::Fixed64(_) => WireType::Fixed64,
            Self::Bytes(_) => WireType::LengthDelimited,
            Self::Fixed32(_) => WireType::Fixed32,
        }
    }
}

/// One (field number, payload) pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WireRecord {
    pub field_number: u32,
    pub value: WireValue,
}

impl WireRecord {
    pub fn wire_type(&self) -> WireType {
        self.value.wire_type()
    }
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Cursor over an encoded buffer.
///
/// Length-delimited payloads are returned as slices of the input [`Bytes`],
/// so decoding never copies embedded data.
#[derive(Clone, Debug)]
pub struct WireReader {
    buf: Bytes,
    pos: usize,
}

impl WireReader {
    pub fn new(buf: impl Into<Bytes>) -> Self {
        Self {
            buf: buf.into(),
            pos: 0,
        }
    }

    /// Current byte offset into the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns `true` once every byte has been consumed.
    pub fn is_eof(&self) -> bool {
        self.pos >= self.buf.len()
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// Read a base-128 varint (least-significant group first).
    pub fn read_varint(&mut self) -> WireResult<u64> {
        let start = self.pos;
        let mut value: u64 = 0;
        let mut shift: u32 = 0;
        loop {
            let Some(&byte) = self.buf.get(self.pos) else {
                return Err(WireError::UnexpectedEof { offset: start });
            };
            self.pos += 1;
            // The tenth byte may only carry the single remaining bit.
            if shift == 63 && byte > 1 {
                return Err(WireError::VarintOverflow { offset: start });
            }
            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }

    pub fn read_fixed32(&mut self) -> WireResult<u32> {
        let bytes = self.take(4)?;
        let mut arr = [0u8; 4];
        arr.copy_from_slice(&bytes);
        Ok(u32::from_le_bytes(arr))
    }

    pub fn read_fixed64(&mut self) -> WireResult<u64> {
        let bytes = self.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(&bytes);
        Ok(u64::from_le_bytes(arr))
    }

    /// Read a varint length prefix followed by that many bytes.
    pub fn read_length_delimited(&mut self) -> WireResult<Bytes> {
        let start = self.pos;
        let len = self.read_varint()?;
        let len = usize::try_from(len).map_err(|_| WireError::UnexpectedEof { offset: start })?;
        self.take(len)
    }

    /// Read a tag and split it into `(field_number, wire_type_code)`.
    pub fn read_tag(&mut self) -> WireResult<(u32, u8)> {
        let key = self.read_varint()?;
        let field_number = key >> 3;
        if field_number == 0 || field_number > u64::from(MAX_FIELD_NUMBER) {
            return Err(WireError::InvalidFieldNumber(field_number));
        }
        Ok((field_number as u32, (key & 0b111) as u8))
    }

    /// Read the next record, or `None` at a clean end of stream.
    ///
    /// End of stream in the middle of a record is an error.
    pub fn read_record(&mut self) -> WireResult<Option<WireRecord>> {
        if self.is_eof() {
            return Ok(None);
        }
        let offset = self.pos;
        let (field_number, code) = self.read_tag()?;
        let wire_type = WireType::from_code(code).ok_or(WireError::UnknownWireType {
            wire_type: code,
            offset,
        })?;
        let value = match wire_type {
            WireType::Varint => WireValue::Varint(self.read_varint()?),
            WireType::Fixed64 => WireValue::Fixed64(self.read_fixed64()?),
            WireType::LengthDelimited => WireValue::Bytes(self.read_length_delimited()?),
            WireType::Fixed32 => WireValue::Fixed32(self.read_fixed32()?),
        };
        Ok(Some(WireRecord {
            field_number,
            value,
        }))
    }

    fn take(&mut self, len: usize) -> WireResult<Bytes> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or(WireError::UnexpectedEof { offset: self.pos })?;
        let slice = self.buf.slice(self.pos..end);
        self.pos = end;
        Ok(slice)
    }
}

impl Iterator for WireReader {
    type Item = WireResult<WireRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => {
                // Poison the cursor so iteration stops after the first error.
                self.pos = self.buf.len();
                Some(Err(e))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Append-only encoder; the exact inverse of [`WireReader`].
#[derive(Clone, Debug, Default)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn write_varint(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buf.push(0x80 | (value & 0x7F) as u8);
            value >>= 7;
        }
        self.buf.push(value as u8);
    }

    pub fn write_fixed32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_fixed64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_length_delimited(&mut self, data: &[u8]) {
        self.write_varint(data.len() as u64);
        self.buf.extend_from_slice(data);
    }

    pub fn write_tag(&mut self, field_number: u32, wire_type: WireType) {
        self.write_varint((u64::from(field_number) << 3) | u64::from(wire_type.code()));
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn encode_varint(value: u64) -> Vec<u8> {
        let mut w = WireWriter::new();
        w.write_varint(value);
        w.into_bytes()
    }

    #[test]
    fn varint_known_encodings() {
        assert_eq!(encode_varint(0), vec![0x00]);
        assert_eq!(encode_varint(1), vec![0x01]);
        assert_eq!(encode_varint(127), vec![0x7F]);
        assert_eq!(encode_varint(128), vec![0x80, 0x01]);
        assert_eq!(encode_varint(300), vec![0xAC, 0x02]);
        assert_eq!(encode_varint(u64::MAX).len(), 10);
    }

    #[test]
    fn truncated_varint_is_unexpected_eof() {
        let mut r = WireReader::new(vec![0x80, 0x80, 0x80]);
        assert_eq!(
            r.read_varint(),
            Err(WireError::UnexpectedEof { offset: 0 })
        );
    }

    #[test]
    fn empty_stream_varint_is_unexpected_eof() {
        let mut r = WireReader::new(Vec::new());
        assert!(matches!(
            r.read_varint(),
            Err(WireError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn overlong_varint_is_overflow() {
        let mut data = vec![0xFF; 9];
        data.push(0x02);
        let mut r = WireReader::new(data);
        assert_eq!(r.read_varint(), Err(WireError::VarintOverflow { offset: 0 }));
    }

    #[test]
    fn fixed_width_little_endian() {
        let mut w = WireWriter::new();
        w.write_fixed32(0x0403_0201);
        w.write_fixed64(0x0807_0605_0403_0201);
        let bytes = w.into_bytes();
        assert_eq!(&bytes[..4], &[1, 2, 3, 4]);
        assert_eq!(&bytes[4..], &[1, 2, 3, 4, 5, 6, 7, 8]);

        let mut r = WireReader::new(bytes);
        assert_eq!(r.read_fixed32().unwrap(), 0x0403_0201);
        assert_eq!(r.read_fixed64().unwrap(), 0x0807_0605_0403_0201);
        assert!(r.is_eof());
    }

    #[test]
    fn truncated_fixed_is_unexpected_eof() {
        let mut r = WireReader::new(vec![1, 2, 3]);
        assert!(matches!(
            r.read_fixed32(),
            Err(WireError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn length_delimited_slices_input() {
        let mut w = WireWriter::new();
        w.write_length_delimited(b"hello");
        let mut r = WireReader::new(w.into_bytes());
        assert_eq!(r.read_length_delimited().unwrap(), Bytes::from_static(b"hello"));
        assert!(r.is_eof());
    }

    #[test]
    fn truncated_length_delimited() {
        // Declares 5 bytes, provides 2.
        let mut r = WireReader::new(vec![0x05, b'h', b'i']);
        assert!(matches!(
            r.read_length_delimited(),
            Err(WireError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn tag_decomposition() {
        let mut w = WireWriter::new();
        w.write_tag(2, WireType::LengthDelimited);
        assert_eq!(w.as_slice(), &[0x12]);
        let mut r = WireReader::new(w.into_bytes());
        assert_eq!(r.read_tag().unwrap(), (2, 2));
    }

    #[test]
    fn field_number_zero_is_rejected() {
        let mut r = WireReader::new(vec![0x00, 0x01]);
        assert_eq!(r.read_tag(), Err(WireError::InvalidFieldNumber(0)));
    }

    #[test]
    fn read_record_dispatches_on_wire_type() {
        let mut w = WireWriter::new();
        w.write_tag(1, WireType::Varint);
        w.write_varint(150);
        w.write_tag(2, WireType::LengthDelimited);
        w.write_length_delimited(b"abc");
        w.write_tag(3, WireType::Fixed32);
        w.write_fixed32(7);
        w.write_tag(4, WireType::Fixed64);
        w.write_fixed64(9);

        let records: Vec<WireRecord> = WireReader::new(w.into_bytes())
            .collect::<WireResult<_>>()
            .unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].value, WireValue::Varint(150));
        assert_eq!(records[1].value, WireValue::Bytes(Bytes::from_static(b"abc")));
        assert_eq!(records[2].value, WireValue::Fixed32(7));
        assert_eq!(records[3].value, WireValue::Fixed64(9));
        assert_eq!(records[3].field_number, 4);
        assert_eq!(records[1].wire_type(), WireType::LengthDelimited);
    }

    #[test]
    fn unknown_wire_type_is_reported() {
        // Field 1, wire type 3 (start group).
        let mut r = WireReader::new(vec![0x0B]);
        assert_eq!(
            r.read_record(),
            Err(WireError::UnknownWireType {
                wire_type: 3,
                offset: 0
            })
        );
    }

    #[test]
    fn clean_eof_ends_records() {
        let mut r = WireReader::new(vec![0x08, 0x03]);
        assert!(r.read_record().unwrap().is_some());
        assert_eq!(r.read_record().unwrap(), None);
    }

    #[test]
    fn iterator_stops_after_error() {
        let mut r = WireReader::new(vec![0x08]);
        assert!(matches!(r.next(), Some(Err(_))));
        assert!(r.next().is_none());
    }

    proptest! {
        #[test]
        fn varint_roundtrip(value in any::<u64>()) {
            let mut r = WireReader::new(encode_varint(value));
            prop_assert_eq!(r.read_varint().unwrap(), value);
            prop_assert!(r.is_eof());
        }

        #[test]
        fn varint_missing_last_byte_fails(value in 128u64..) {
            let mut bytes = encode_varint(value);
            bytes.pop();
            let mut r = WireReader::new(bytes);
            prop_assert!(
                matches!(r.read_varint(), Err(WireError::UnexpectedEof { .. })),
                "expected UnexpectedEof"
            );
        }

        #[test]
        fn length_delimited_roundtrip(data in proptest::collection::vec(any::<u8>(), 0..512)) {
            let mut w = WireWriter::new();
            w.write_length_delimited(&data);
            let mut r = WireReader::new(w.into_bytes());
            let got = r.read_length_delimited().unwrap();
            prop_assert_eq!(got.as_ref(), data.as_slice());
        }
    }
}
