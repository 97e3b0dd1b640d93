//! Thrift compact-protocol primitives for the footer blob.
//!
//! [`CompactReader`] is a stateful cursor over a byte slice producing typed
//! field events. It is a pure syntax layer: it knows nothing about parquet
//! metadata semantics, which live in [`crate::file::decode`]. Field ids are
//! delta-encoded relative to the previously read id within the current
//! struct; the caller holds that `last_field_id` per nesting level so the
//! reader itself carries no struct-scoped state.
//!
//! [`CompactWriter`] is the matching encoder. The crate never writes parquet
//! files; the writer exists so tests can build synthetic footers and round
//! trip them through the decoder.

use crate::errors::{ParquetError, Result, decode_err};

/// Longest legal varint encoding of a u64.
const MAX_VARINT_BYTES: usize = 10;

/// Maximum container nesting depth when skipping unknown fields. Real
/// footers nest a handful of levels; anything deeper is a malformed or
/// hostile input and must fail as a decode error, not a stack overflow.
const MAX_SKIP_DEPTH: u32 = 64;

/// Compact-protocol type tags.
///
/// Booleans are folded into the field header: a bool field's value is
/// carried by the type nibble itself (`BoolTrue`/`BoolFalse`), with no
/// separate value byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Stop,
    BoolTrue,
    BoolFalse,
    I8,
    I16,
    I32,
    I64,
    Double,
    Binary,
    List,
    Set,
    Map,
    Struct,
}

impl FieldType {
    fn from_nibble(nibble: u8, pos: usize) -> Result<FieldType> {
        Ok(match nibble {
            0 => FieldType::Stop,
            1 => FieldType::BoolTrue,
            2 => FieldType::BoolFalse,
            3 => FieldType::I8,
            4 => FieldType::I16,
            5 => FieldType::I32,
            6 => FieldType::I64,
            7 => FieldType::Double,
            8 => FieldType::Binary,
            9 => FieldType::List,
            10 => FieldType::Set,
            11 => FieldType::Map,
            12 => FieldType::Struct,
            other => {
                return Err(decode_err!("unknown compact type {} at offset {}", other, pos));
            }
        })
    }

    fn to_nibble(self) -> u8 {
        match self {
            FieldType::Stop => 0,
            FieldType::BoolTrue => 1,
            FieldType::BoolFalse => 2,
            FieldType::I8 => 3,
            FieldType::I16 => 4,
            FieldType::I32 => 5,
            FieldType::I64 => 6,
            FieldType::Double => 7,
            FieldType::Binary => 8,
            FieldType::List => 9,
            FieldType::Set => 10,
            FieldType::Map => 11,
            FieldType::Struct => 12,
        }
    }
}

/// A decoded field header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldHeader {
    pub field_type: FieldType,
    pub id: i16,
}

/// Compact-protocol reader over a borrowed byte slice.
#[derive(Debug)]
pub struct CompactReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> CompactReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        CompactReader { buf, pos: 0 }
    }

    /// Byte offset of the next read, for error context.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn eof(&self) -> ParquetError {
        decode_err!("unexpected end of buffer at offset {}", self.pos)
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        let b = *self.buf.get(self.pos).ok_or_else(|| self.eof())?;
        self.pos += 1;
        Ok(b)
    }

    /// Reads an unsigned LEB128 varint.
    pub fn read_varint(&mut self) -> Result<u64> {
        let mut result = 0u64;
        let mut shift = 0u32;
        loop {
            let b = self.read_byte()?;
            result |= ((b & 0x7F) as u64) << shift;
            if b & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
            if shift as usize >= MAX_VARINT_BYTES * 7 {
                return Err(decode_err!("varint exceeds 10 bytes at offset {}", self.pos));
            }
        }
    }

    /// Reads a zig-zag encoded signed integer.
    pub fn read_i64(&mut self) -> Result<i64> {
        let n = self.read_varint()?;
        Ok(((n >> 1) as i64) ^ -((n & 1) as i64))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let n = self.read_varint()?;
        let n = u32::try_from(n)
            .map_err(|_| decode_err!("varint {} overflows i32 at offset {}", n, self.pos))?;
        Ok(((n >> 1) as i32) ^ -((n & 1) as i32))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        let n = self.read_varint()?;
        let n = u16::try_from(n)
            .map_err(|_| decode_err!("varint {} overflows i16 at offset {}", n, self.pos))?;
        Ok(((n >> 1) as i16) ^ -((n & 1) as i16))
    }

    /// Reads a length-prefixed byte string, borrowing from the buffer.
    pub fn read_binary(&mut self) -> Result<&'a [u8]> {
        let len = self.read_varint()? as usize;
        let end = self.pos.checked_add(len).ok_or_else(|| self.eof())?;
        if end > self.buf.len() {
            return Err(self.eof());
        }
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn read_string(&mut self) -> Result<&'a str> {
        let pos = self.pos;
        let bytes = self.read_binary()?;
        std::str::from_utf8(bytes)
            .map_err(|_| decode_err!("invalid utf-8 in string at offset {}", pos))
    }

    /// Reads a field header. Delta-encoded ids resolve against
    /// `last_field_id`, which the caller scopes to the current struct.
    pub fn read_field_begin(&mut self, last_field_id: i16) -> Result<FieldHeader> {
        let pos = self.pos;
        let b = self.read_byte()?;
        if b == 0 {
            return Ok(FieldHeader {
                field_type: FieldType::Stop,
                id: 0,
            });
        }
        let field_type = FieldType::from_nibble(b & 0x0F, pos)?;
        let delta = (b >> 4) & 0x0F;
        let id = if delta != 0 {
            last_field_id + delta as i16
        } else {
            // Long form: absolute id as zig-zag i16.
            self.read_i16()?
        };
        Ok(FieldHeader { field_type, id })
    }

    /// Reads a list (or set) header: element type and count. Counts below 15
    /// are packed into the header byte, larger counts follow as a varint.
    pub fn read_list_begin(&mut self) -> Result<(FieldType, usize)> {
        let pos = self.pos;
        let b = self.read_byte()?;
        let elem_type = FieldType::from_nibble(b & 0x0F, pos)?;
        let size_nibble = (b >> 4) & 0x0F;
        let count = if size_nibble == 0x0F {
            self.read_varint()? as usize
        } else {
            size_nibble as usize
        };
        Ok((elem_type, count))
    }

    /// Skips a value of the given type. This is what makes unknown field ids
    /// tolerable at any nesting level, with nesting capped at
    /// [`MAX_SKIP_DEPTH`] so recursion stays bounded on hostile input.
    pub fn skip(&mut self, field_type: FieldType) -> Result<()> {
        self.skip_inner(field_type, MAX_SKIP_DEPTH)
    }

    fn skip_inner(&mut self, field_type: FieldType, depth: u32) -> Result<()> {
        if depth == 0 {
            return Err(decode_err!(
                "skipped value exceeds {} nesting levels at offset {}",
                MAX_SKIP_DEPTH,
                self.pos
            ));
        }
        match field_type {
            FieldType::Stop => {
                return Err(decode_err!("cannot skip a stop field at offset {}", self.pos));
            }
            // Bool values live in the field header; nothing follows.
            FieldType::BoolTrue | FieldType::BoolFalse => {}
            FieldType::I8 => {
                self.read_byte()?;
            }
            FieldType::I16 | FieldType::I32 | FieldType::I64 => {
                self.read_varint()?;
            }
            FieldType::Double => {
                let end = self.pos.checked_add(8).ok_or_else(|| self.eof())?;
                if end > self.buf.len() {
                    return Err(self.eof());
                }
                self.pos = end;
            }
            FieldType::Binary => {
                self.read_binary()?;
            }
            FieldType::List | FieldType::Set => self.skip_list(depth - 1)?,
            FieldType::Map => self.skip_map(depth - 1)?,
            FieldType::Struct => self.skip_struct(depth - 1)?,
        }
        Ok(())
    }

    fn skip_struct(&mut self, depth: u32) -> Result<()> {
        // Each struct level gets its own last-field-id frame.
        let mut last_field_id = 0i16;
        loop {
            let header = self.read_field_begin(last_field_id)?;
            if header.field_type == FieldType::Stop {
                return Ok(());
            }
            self.skip_inner(header.field_type, depth)?;
            last_field_id = header.id;
        }
    }

    fn skip_list(&mut self, depth: u32) -> Result<()> {
        let (elem_type, count) = self.read_list_begin()?;
        for _ in 0..count {
            // List bool elements are one byte each, unlike field bools.
            match elem_type {
                FieldType::BoolTrue | FieldType::BoolFalse => {
                    self.read_byte()?;
                }
                other => self.skip_inner(other, depth)?,
            }
        }
        Ok(())
    }

    fn skip_map(&mut self, depth: u32) -> Result<()> {
        let count = self.read_varint()? as usize;
        if count == 0 {
            return Ok(());
        }
        let pos = self.pos;
        let types = self.read_byte()?;
        let key_type = FieldType::from_nibble((types >> 4) & 0x0F, pos)?;
        let val_type = FieldType::from_nibble(types & 0x0F, pos)?;
        for _ in 0..count {
            self.skip_inner(key_type, depth)?;
            self.skip_inner(val_type, depth)?;
        }
        Ok(())
    }
}

/// Compact-protocol encoder used by tests to build synthetic footers.
#[derive(Debug, Default)]
pub struct CompactWriter {
    buf: Vec<u8>,
}

impl CompactWriter {
    pub fn new() -> Self {
        CompactWriter { buf: Vec::new() }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_field_begin(&mut self, field_type: FieldType, id: i16, last_field_id: i16) {
        let delta = id.wrapping_sub(last_field_id);
        if (1..=15).contains(&delta) {
            self.buf.push(((delta as u8) << 4) | field_type.to_nibble());
        } else {
            self.buf.push(field_type.to_nibble());
            self.write_i16(id);
        }
    }

    pub fn write_stop(&mut self) {
        self.buf.push(0);
    }

    pub fn write_varint(&mut self, mut v: u64) {
        loop {
            let b = (v & 0x7F) as u8;
            v >>= 7;
            if v == 0 {
                self.buf.push(b);
                return;
            }
            self.buf.push(b | 0x80);
        }
    }

    pub fn write_i64(&mut self, v: i64) {
        self.write_varint(((v << 1) ^ (v >> 63)) as u64);
    }

    pub fn write_i32(&mut self, v: i32) {
        self.write_varint((((v << 1) ^ (v >> 31)) as u32) as u64);
    }

    pub fn write_i16(&mut self, v: i16) {
        self.write_varint((((v << 1) ^ (v >> 15)) as u16) as u64);
    }

    pub fn write_binary(&mut self, bytes: &[u8]) {
        self.write_varint(bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_string(&mut self, s: &str) {
        self.write_binary(s.as_bytes());
    }

    pub fn write_list_begin(&mut self, elem_type: FieldType, count: usize) {
        if count < 15 {
            self.buf.push(((count as u8) << 4) | elem_type.to_nibble());
        } else {
            self.buf.push(0xF0 | elem_type.to_nibble());
            self.write_varint(count as u64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_roundtrip() {
        let mut w = CompactWriter::new();
        for v in [0u64, 1, 127, 128, 300, u32::MAX as u64, u64::MAX] {
            w.write_varint(v);
        }
        let buf = w.into_bytes();
        let mut r = CompactReader::new(&buf);
        for v in [0u64, 1, 127, 128, 300, u32::MAX as u64, u64::MAX] {
            assert_eq!(r.read_varint().unwrap(), v);
        }
        assert_eq!(r.position(), buf.len());
    }

    #[test]
    fn varint_known_encoding() {
        // 300 = 0b1_0010_1100 encodes as [0xAC, 0x02].
        let mut r = CompactReader::new(&[0xAC, 0x02, 0x7F]);
        assert_eq!(r.read_varint().unwrap(), 300);
        assert_eq!(r.read_varint().unwrap(), 127);
    }

    #[test]
    fn varint_too_long() {
        let buf = [0xFF; 11];
        let mut r = CompactReader::new(&buf);
        let err = r.read_varint().unwrap_err();
        assert!(err.to_string().contains("varint exceeds"));
    }

    #[test]
    fn zigzag_roundtrip() {
        let mut w = CompactWriter::new();
        w.write_i64(-1);
        w.write_i64(i64::MIN);
        w.write_i32(-123456);
        w.write_i16(i16::MAX);
        let buf = w.into_bytes();
        let mut r = CompactReader::new(&buf);
        assert_eq!(r.read_i64().unwrap(), -1);
        assert_eq!(r.read_i64().unwrap(), i64::MIN);
        assert_eq!(r.read_i32().unwrap(), -123456);
        assert_eq!(r.read_i16().unwrap(), i16::MAX);
    }

    #[test]
    fn field_header_short_and_long_form() {
        let mut w = CompactWriter::new();
        w.write_field_begin(FieldType::I32, 1, 0); // delta 1
        w.write_field_begin(FieldType::I64, 3, 1); // delta 2
        w.write_field_begin(FieldType::Binary, 100, 3); // delta 97, long form
        w.write_stop();
        let buf = w.into_bytes();

        let mut r = CompactReader::new(&buf);
        let mut last = 0i16;
        let h = r.read_field_begin(last).unwrap();
        assert_eq!((h.field_type, h.id), (FieldType::I32, 1));
        last = h.id;
        let h = r.read_field_begin(last).unwrap();
        assert_eq!((h.field_type, h.id), (FieldType::I64, 3));
        last = h.id;
        let h = r.read_field_begin(last).unwrap();
        assert_eq!((h.field_type, h.id), (FieldType::Binary, 100));
        last = h.id;
        let h = r.read_field_begin(last).unwrap();
        assert_eq!(h.field_type, FieldType::Stop);
    }

    #[test]
    fn bool_fields_inline_in_header() {
        let mut w = CompactWriter::new();
        w.write_field_begin(FieldType::BoolTrue, 7, 0);
        w.write_field_begin(FieldType::BoolFalse, 8, 7);
        w.write_stop();
        let buf = w.into_bytes();

        let mut r = CompactReader::new(&buf);
        let h = r.read_field_begin(0).unwrap();
        assert_eq!((h.field_type, h.id), (FieldType::BoolTrue, 7));
        let h = r.read_field_begin(7).unwrap();
        assert_eq!((h.field_type, h.id), (FieldType::BoolFalse, 8));
    }

    #[test]
    fn list_header_short_and_long_form() {
        let mut w = CompactWriter::new();
        w.write_list_begin(FieldType::I32, 3);
        w.write_list_begin(FieldType::Struct, 20);
        let buf = w.into_bytes();

        let mut r = CompactReader::new(&buf);
        assert_eq!(r.read_list_begin().unwrap(), (FieldType::I32, 3));
        assert_eq!(r.read_list_begin().unwrap(), (FieldType::Struct, 20));
    }

    #[test]
    fn skip_nested_struct() {
        // Unknown struct field with nested struct, list, binary and bool
        // members; the skip must consume exactly the struct's bytes.
        let mut w = CompactWriter::new();
        w.write_field_begin(FieldType::I32, 1, 0);
        w.write_i32(42);
        w.write_field_begin(FieldType::Struct, 2, 1);
        {
            w.write_field_begin(FieldType::BoolTrue, 1, 0);
            w.write_field_begin(FieldType::Binary, 2, 1);
            w.write_binary(b"opaque");
            w.write_field_begin(FieldType::List, 3, 2);
            w.write_list_begin(FieldType::I64, 2);
            w.write_i64(-5);
            w.write_i64(5);
            w.write_stop();
        }
        w.write_field_begin(FieldType::I32, 3, 2);
        w.write_i32(43);
        w.write_stop();
        let buf = w.into_bytes();

        let mut r = CompactReader::new(&buf);
        let mut last = 0i16;
        let h = r.read_field_begin(last).unwrap();
        assert_eq!(r.read_i32().unwrap(), 42);
        last = h.id;
        let h = r.read_field_begin(last).unwrap();
        assert_eq!(h.field_type, FieldType::Struct);
        r.skip(FieldType::Struct).unwrap();
        last = h.id;
        let h = r.read_field_begin(last).unwrap();
        assert_eq!((h.field_type, h.id), (FieldType::I32, 3));
        assert_eq!(r.read_i32().unwrap(), 43);
    }

    #[test]
    fn skip_depth_is_bounded() {
        // Every 0x1C byte reads as "struct field, id delta 1", so this
        // buffer encodes structs nested as deep as it is long. The skip
        // must fail at the depth cap instead of recursing per level.
        let buf = vec![0x1C; 1024];
        let mut r = CompactReader::new(&buf);
        let err = r.skip(FieldType::Struct).unwrap_err();
        assert!(err.to_string().contains("nesting levels"));

        // Same for lists: each 0x19 byte is a one-element list of lists.
        let buf = vec![0x19; 1024];
        let mut r = CompactReader::new(&buf);
        let err = r.skip(FieldType::List).unwrap_err();
        assert!(err.to_string().contains("nesting levels"));
    }

    #[test]
    fn skip_within_depth_cap() {
        let mut w = CompactWriter::new();
        for _ in 0..10 {
            w.write_field_begin(FieldType::Struct, 1, 0);
        }
        w.write_field_begin(FieldType::I32, 2, 1);
        w.write_i32(7);
        for _ in 0..=10 {
            w.write_stop();
        }
        let buf = w.into_bytes();
        let mut r = CompactReader::new(&buf);
        r.skip(FieldType::Struct).unwrap();
        assert_eq!(r.position(), buf.len());
    }

    #[test]
    fn narrow_varints_reject_overflow() {
        let mut w = CompactWriter::new();
        w.write_varint(u64::from(u32::MAX) + 1);
        let buf = w.into_bytes();
        let err = CompactReader::new(&buf).read_i32().unwrap_err();
        assert!(err.to_string().contains("overflows i32"));

        let mut w = CompactWriter::new();
        w.write_varint(u64::from(u16::MAX) + 1);
        let buf = w.into_bytes();
        let err = CompactReader::new(&buf).read_i16().unwrap_err();
        assert!(err.to_string().contains("overflows i16"));
    }

    #[test]
    fn read_past_end_fails() {
        let mut r = CompactReader::new(&[0x80]);
        let err = r.read_varint().unwrap_err();
        assert!(err.to_string().contains("unexpected end of buffer"));

        let mut r = CompactReader::new(&[0x04, b'a', b'b']);
        let err = r.read_binary().unwrap_err();
        assert!(err.to_string().contains("unexpected end of buffer"));
    }

    #[test]
    fn binary_roundtrip() {
        let mut w = CompactWriter::new();
        w.write_string("point.x");
        w.write_binary(&[0, 159, 146, 150]);
        let buf = w.into_bytes();
        let mut r = CompactReader::new(&buf);
        assert_eq!(r.read_string().unwrap(), "point.x");
        assert_eq!(r.read_binary().unwrap(), &[0, 159, 146, 150]);
    }

    #[test]
    fn invalid_utf8_string() {
        let mut w = CompactWriter::new();
        w.write_binary(&[0xFF, 0xFE]);
        let buf = w.into_bytes();
        let mut r = CompactReader::new(&buf);
        let err = r.read_string().unwrap_err();
        assert!(err.to_string().contains("invalid utf-8"));
    }
}
