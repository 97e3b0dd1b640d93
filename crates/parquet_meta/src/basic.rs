//! Enums mirroring the fixed integer tables in the parquet footer.
//!
//! Each enum decodes from the small integer stored in the footer via
//! `TryFrom<i32>`. An unrecognized integer is a decode error, never a
//! silent default; metadata correctness matters more than lenient reads.

use std::fmt;

use crate::errors::{ParquetError, Result, decode_err};

/// Physical type of a leaf column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum Type {
    BOOLEAN,
    INT32,
    INT64,
    INT96,
    FLOAT,
    DOUBLE,
    BYTE_ARRAY,
    FIXED_LEN_BYTE_ARRAY,
}

impl TryFrom<i32> for Type {
    type Error = ParquetError;

    fn try_from(value: i32) -> Result<Self> {
        Ok(match value {
            0 => Type::BOOLEAN,
            1 => Type::INT32,
            2 => Type::INT64,
            3 => Type::INT96,
            4 => Type::FLOAT,
            5 => Type::DOUBLE,
            6 => Type::BYTE_ARRAY,
            7 => Type::FIXED_LEN_BYTE_ARRAY,
            other => return Err(decode_err!("unknown physical type id {}", other)),
        })
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Repetition of a schema element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum Repetition {
    REQUIRED,
    OPTIONAL,
    REPEATED,
}

impl TryFrom<i32> for Repetition {
    type Error = ParquetError;

    fn try_from(value: i32) -> Result<Self> {
        Ok(match value {
            0 => Repetition::REQUIRED,
            1 => Repetition::OPTIONAL,
            2 => Repetition::REPEATED,
            other => return Err(decode_err!("unknown repetition id {}", other)),
        })
    }
}

impl fmt::Display for Repetition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Compression codec applied to a column chunk's pages.
///
/// This crate only reads the codec tag, it never decompresses anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum Compression {
    UNCOMPRESSED,
    SNAPPY,
    GZIP,
    LZO,
    BROTLI,
    LZ4,
    ZSTD,
    LZ4_RAW,
}

impl TryFrom<i32> for Compression {
    type Error = ParquetError;

    fn try_from(value: i32) -> Result<Self> {
        Ok(match value {
            0 => Compression::UNCOMPRESSED,
            1 => Compression::SNAPPY,
            2 => Compression::GZIP,
            3 => Compression::LZO,
            4 => Compression::BROTLI,
            5 => Compression::LZ4,
            6 => Compression::ZSTD,
            7 => Compression::LZ4_RAW,
            other => return Err(decode_err!("unknown codec id {}", other)),
        })
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Page encoding used within a column chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum Encoding {
    PLAIN = 0,
    // Id 1 was never assigned.
    PLAIN_DICTIONARY = 2,
    RLE = 3,
    BIT_PACKED = 4,
    DELTA_BINARY_PACKED = 5,
    DELTA_LENGTH_BYTE_ARRAY = 6,
    DELTA_BYTE_ARRAY = 7,
    RLE_DICTIONARY = 8,
    BYTE_STREAM_SPLIT = 9,
}

impl TryFrom<i32> for Encoding {
    type Error = ParquetError;

    fn try_from(value: i32) -> Result<Self> {
        Ok(match value {
            0 => Encoding::PLAIN,
            2 => Encoding::PLAIN_DICTIONARY,
            3 => Encoding::RLE,
            4 => Encoding::BIT_PACKED,
            5 => Encoding::DELTA_BINARY_PACKED,
            6 => Encoding::DELTA_LENGTH_BYTE_ARRAY,
            7 => Encoding::DELTA_BYTE_ARRAY,
            8 => Encoding::RLE_DICTIONARY,
            9 => Encoding::BYTE_STREAM_SPLIT,
            other => return Err(decode_err!("unknown encoding id {}", other)),
        })
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn physical_type_from_id() {
        assert_eq!(Type::try_from(0).unwrap(), Type::BOOLEAN);
        assert_eq!(Type::try_from(7).unwrap(), Type::FIXED_LEN_BYTE_ARRAY);
        Type::try_from(8).unwrap_err();
        Type::try_from(-1).unwrap_err();
    }

    #[test]
    fn codec_from_id() {
        assert_eq!(Compression::try_from(1).unwrap(), Compression::SNAPPY);
        assert_eq!(Compression::try_from(6).unwrap(), Compression::ZSTD);
        // Unknown codec must fail loudly, not default to UNCOMPRESSED.
        let err = Compression::try_from(42).unwrap_err();
        assert!(err.to_string().contains("unknown codec id 42"));
    }

    #[test]
    fn encoding_from_id() {
        assert_eq!(Encoding::try_from(0).unwrap(), Encoding::PLAIN);
        // 1 was never assigned in the format.
        Encoding::try_from(1).unwrap_err();
        assert_eq!(Encoding::try_from(9).unwrap(), Encoding::BYTE_STREAM_SPLIT);
    }

    #[test]
    fn repetition_from_id() {
        assert_eq!(Repetition::try_from(2).unwrap(), Repetition::REPEATED);
        Repetition::try_from(3).unwrap_err();
    }
}
