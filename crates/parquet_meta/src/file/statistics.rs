//! Typed min/max/null-count statistics for column chunks.
//!
//! Min/max values are stored as raw byte strings; decoding them needs the
//! column's physical type. Fixed-width types are little-endian, int96 is
//! kept as an opaque 12-byte value (no timestamp interpretation here), and
//! byte-array types stay raw bytes whose min/max ordering is lexicographic,
//! not numeric.
//!
//! Every field may be absent. Absent decodes to `None`, which is distinct
//! from a present zero and must never be defaulted.

use std::fmt;

use crate::basic::Type;
use crate::errors::{Result, decode_err};

/// Statistics fields as they appear in the footer, still undecoded.
///
/// Ids 1/2 (`max`/`min`) are the deprecated signed-ordering fields; ids 5/6
/// (`max_value`/`min_value`) supersede them and win whenever present.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct RawStatistics {
    pub max: Option<Vec<u8>>,
    pub min: Option<Vec<u8>>,
    pub null_count: Option<i64>,
    pub distinct_count: Option<i64>,
    pub max_value: Option<Vec<u8>>,
    pub min_value: Option<Vec<u8>>,
}

/// An int96 value, kept as its on-disk 12-byte layout.
///
/// Legacy timestamps encode nanoseconds-of-day in the first 8 bytes and a
/// Julian day in the last 4; reinterpreting that is a collaborator concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Int96(pub [u8; 12]);

impl AsRef<[u8]> for Int96 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Decoded statistics for one column chunk.
///
/// Use pattern matching to get at the typed min/max values.
#[derive(Debug, Clone, PartialEq)]
pub enum Statistics {
    Boolean(ValueStatistics<bool>),
    Int32(ValueStatistics<i32>),
    Int64(ValueStatistics<i64>),
    Int96(ValueStatistics<Int96>),
    Float(ValueStatistics<f32>),
    Double(ValueStatistics<f64>),
    ByteArray(ValueStatistics<Vec<u8>>),
    FixedLenByteArray(ValueStatistics<Vec<u8>>),
}

macro_rules! statistic_enum_field {
    ($self:ident, $field:ident) => {{
        match *$self {
            Statistics::Boolean(ref typed) => typed.$field,
            Statistics::Int32(ref typed) => typed.$field,
            Statistics::Int64(ref typed) => typed.$field,
            Statistics::Int96(ref typed) => typed.$field,
            Statistics::Float(ref typed) => typed.$field,
            Statistics::Double(ref typed) => typed.$field,
            Statistics::ByteArray(ref typed) => typed.$field,
            Statistics::FixedLenByteArray(ref typed) => typed.$field,
        }
    }};
}

impl Statistics {
    /// Number of nulls recorded for the chunk, if the writer recorded it.
    pub fn null_count(&self) -> Option<u64> {
        statistic_enum_field![self, null_count]
    }

    /// Number of distinct values, if the writer recorded it.
    pub fn distinct_count(&self) -> Option<u64> {
        statistic_enum_field![self, distinct_count]
    }

    /// Returns whether both min and max are present.
    pub fn has_min_max_set(&self) -> bool {
        match self {
            Self::Boolean(v) => v.min.is_some() && v.max.is_some(),
            Self::Int32(v) => v.min.is_some() && v.max.is_some(),
            Self::Int64(v) => v.min.is_some() && v.max.is_some(),
            Self::Int96(v) => v.min.is_some() && v.max.is_some(),
            Self::Float(v) => v.min.is_some() && v.max.is_some(),
            Self::Double(v) => v.min.is_some() && v.max.is_some(),
            Self::ByteArray(v) => v.min.is_some() && v.max.is_some(),
            Self::FixedLenByteArray(v) => v.min.is_some() && v.max.is_some(),
        }
    }

    /// Physical type the statistics were decoded with.
    pub fn physical_type(&self) -> Type {
        match self {
            Statistics::Boolean(_) => Type::BOOLEAN,
            Statistics::Int32(_) => Type::INT32,
            Statistics::Int64(_) => Type::INT64,
            Statistics::Int96(_) => Type::INT96,
            Statistics::Float(_) => Type::FLOAT,
            Statistics::Double(_) => Type::DOUBLE,
            Statistics::ByteArray(_) => Type::BYTE_ARRAY,
            Statistics::FixedLenByteArray(_) => Type::FIXED_LEN_BYTE_ARRAY,
        }
    }
}

/// Typed statistics values. Any subset may be unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueStatistics<T> {
    pub min: Option<T>,
    pub max: Option<T>,
    pub null_count: Option<u64>,
    pub distinct_count: Option<u64>,
}

impl<T> ValueStatistics<T> {
    pub fn new(
        min: Option<T>,
        max: Option<T>,
        null_count: Option<u64>,
        distinct_count: Option<u64>,
    ) -> Self {
        ValueStatistics {
            min,
            max,
            null_count,
            distinct_count,
        }
    }
}

impl<T: fmt::Debug> fmt::Display for ValueStatistics<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{min: ")?;
        match &self.min {
            Some(value) => write!(f, "{value:?}")?,
            None => write!(f, "unknown")?,
        }
        write!(f, ", max: ")?;
        match &self.max {
            Some(value) => write!(f, "{value:?}")?,
            None => write!(f, "unknown")?,
        }
        write!(f, ", null_count: ")?;
        match self.null_count {
            Some(value) => write!(f, "{value}")?,
            None => write!(f, "unknown")?,
        }
        write!(f, ", distinct_count: ")?;
        match self.distinct_count {
            Some(value) => write!(f, "{value}")?,
            None => write!(f, "unknown")?,
        }
        write!(f, "}}")
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Statistics::Boolean(typed) => write!(f, "{typed}"),
            Statistics::Int32(typed) => write!(f, "{typed}"),
            Statistics::Int64(typed) => write!(f, "{typed}"),
            Statistics::Int96(typed) => write!(f, "{typed}"),
            Statistics::Float(typed) => write!(f, "{typed}"),
            Statistics::Double(typed) => write!(f, "{typed}"),
            Statistics::ByteArray(typed) => write!(f, "{typed}"),
            Statistics::FixedLenByteArray(typed) => write!(f, "{typed}"),
        }
    }
}

/// Converts raw footer statistics into typed statistics.
pub(crate) fn from_thrift(
    physical_type: Type,
    raw: Option<RawStatistics>,
) -> Result<Option<Statistics>> {
    let raw = match raw {
        Some(raw) => raw,
        None => return Ok(None),
    };

    let null_count = match raw.null_count {
        Some(n) if n < 0 => {
            return Err(decode_err!("statistics null count is negative: {}", n));
        }
        Some(n) => Some(n as u64),
        None => None,
    };
    let distinct_count = match raw.distinct_count {
        Some(n) if n < 0 => {
            return Err(decode_err!("statistics distinct count is negative: {}", n));
        }
        Some(n) => Some(n as u64),
        None => None,
    };

    // Writers predating min_value/max_value only set the deprecated fields.
    let old_format = raw.min_value.is_none() && raw.max_value.is_none();
    let min = if old_format { raw.min } else { raw.min_value };
    let max = if old_format { raw.max } else { raw.max_value };

    // Values use the PLAIN encoding, except that variable-length byte
    // arrays carry no length prefix.
    let stats = match physical_type {
        Type::BOOLEAN => Statistics::Boolean(ValueStatistics::new(
            min.as_deref().map(decode_bool).transpose()?,
            max.as_deref().map(decode_bool).transpose()?,
            null_count,
            distinct_count,
        )),
        Type::INT32 => Statistics::Int32(ValueStatistics::new(
            min.as_deref().map(|d| fixed(d, "INT32").map(i32::from_le_bytes)).transpose()?,
            max.as_deref().map(|d| fixed(d, "INT32").map(i32::from_le_bytes)).transpose()?,
            null_count,
            distinct_count,
        )),
        Type::INT64 => Statistics::Int64(ValueStatistics::new(
            min.as_deref().map(|d| fixed(d, "INT64").map(i64::from_le_bytes)).transpose()?,
            max.as_deref().map(|d| fixed(d, "INT64").map(i64::from_le_bytes)).transpose()?,
            null_count,
            distinct_count,
        )),
        Type::INT96 => Statistics::Int96(ValueStatistics::new(
            min.as_deref().map(|d| fixed(d, "INT96").map(Int96)).transpose()?,
            max.as_deref().map(|d| fixed(d, "INT96").map(Int96)).transpose()?,
            null_count,
            distinct_count,
        )),
        Type::FLOAT => Statistics::Float(ValueStatistics::new(
            min.as_deref().map(|d| fixed(d, "FLOAT").map(f32::from_le_bytes)).transpose()?,
            max.as_deref().map(|d| fixed(d, "FLOAT").map(f32::from_le_bytes)).transpose()?,
            null_count,
            distinct_count,
        )),
        Type::DOUBLE => Statistics::Double(ValueStatistics::new(
            min.as_deref().map(|d| fixed(d, "DOUBLE").map(f64::from_le_bytes)).transpose()?,
            max.as_deref().map(|d| fixed(d, "DOUBLE").map(f64::from_le_bytes)).transpose()?,
            null_count,
            distinct_count,
        )),
        Type::BYTE_ARRAY => Statistics::ByteArray(ValueStatistics::new(
            min, max, null_count, distinct_count,
        )),
        Type::FIXED_LEN_BYTE_ARRAY => Statistics::FixedLenByteArray(ValueStatistics::new(
            min, max, null_count, distinct_count,
        )),
    };

    Ok(Some(stats))
}

fn decode_bool(data: &[u8]) -> Result<bool> {
    match data {
        [b] => Ok(*b != 0),
        _ => Err(decode_err!(
            "statistics value for BOOLEAN is {} bytes, expected 1",
            data.len()
        )),
    }
}

fn fixed<const N: usize>(data: &[u8], type_name: &str) -> Result<[u8; N]> {
    // Fixed-width values must be exactly their PLAIN width; decoding a
    // prefix of an oversized value would fabricate a statistic.
    <[u8; N]>::try_from(data).map_err(|_| {
        decode_err!(
            "statistics value for {} is {} bytes, expected {}",
            type_name,
            data.len(),
            N
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_count_only() {
        // min/max absent must decode to unknown, never zero.
        let raw = RawStatistics {
            null_count: Some(42),
            ..Default::default()
        };
        let stats = from_thrift(Type::INT64, Some(raw)).unwrap().unwrap();
        match &stats {
            Statistics::Int64(typed) => {
                assert_eq!(typed.min, None);
                assert_eq!(typed.max, None);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
        assert_eq!(stats.null_count(), Some(42));
        assert_eq!(stats.distinct_count(), None);
        assert!(!stats.has_min_max_set());
    }

    #[test]
    fn absent_statistics() {
        assert_eq!(from_thrift(Type::INT32, None).unwrap(), None);
    }

    #[test]
    fn int32_little_endian() {
        let raw = RawStatistics {
            min_value: Some((-123i32).to_le_bytes().to_vec()),
            max_value: Some(234i32.to_le_bytes().to_vec()),
            null_count: Some(0),
            ..Default::default()
        };
        let stats = from_thrift(Type::INT32, Some(raw)).unwrap().unwrap();
        match stats {
            Statistics::Int32(typed) => {
                assert_eq!(typed.min, Some(-123));
                assert_eq!(typed.max, Some(234));
                // Present zero stays a present zero.
                assert_eq!(typed.null_count, Some(0));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn deprecated_min_max_used_when_new_fields_absent() {
        let raw = RawStatistics {
            min: Some(1i64.to_le_bytes().to_vec()),
            max: Some(9i64.to_le_bytes().to_vec()),
            ..Default::default()
        };
        let stats = from_thrift(Type::INT64, Some(raw)).unwrap().unwrap();
        assert!(stats.has_min_max_set());

        // New fields win over deprecated ones when both are present.
        let raw = RawStatistics {
            min: Some(1i64.to_le_bytes().to_vec()),
            max: Some(9i64.to_le_bytes().to_vec()),
            min_value: Some(2i64.to_le_bytes().to_vec()),
            max_value: Some(8i64.to_le_bytes().to_vec()),
            ..Default::default()
        };
        match from_thrift(Type::INT64, Some(raw)).unwrap().unwrap() {
            Statistics::Int64(typed) => {
                assert_eq!(typed.min, Some(2));
                assert_eq!(typed.max, Some(8));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn byte_array_stays_raw() {
        let raw = RawStatistics {
            min_value: Some(b"apple".to_vec()),
            max_value: Some(b"pear".to_vec()),
            ..Default::default()
        };
        match from_thrift(Type::BYTE_ARRAY, Some(raw)).unwrap().unwrap() {
            Statistics::ByteArray(typed) => {
                assert_eq!(typed.min.as_deref(), Some(b"apple".as_slice()));
                assert_eq!(typed.max.as_deref(), Some(b"pear".as_slice()));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn int96_opaque() {
        let bytes = [1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];
        let raw = RawStatistics {
            min_value: Some(bytes.to_vec()),
            ..Default::default()
        };
        match from_thrift(Type::INT96, Some(raw)).unwrap().unwrap() {
            Statistics::Int96(typed) => assert_eq!(typed.min, Some(Int96(bytes))),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn negative_null_count() {
        let raw = RawStatistics {
            null_count: Some(-10),
            ..Default::default()
        };
        from_thrift(Type::INT32, Some(raw)).unwrap_err();
    }

    #[test]
    fn value_too_short() {
        let raw = RawStatistics {
            min_value: Some(vec![1, 2]),
            ..Default::default()
        };
        let err = from_thrift(Type::INT64, Some(raw)).unwrap_err();
        assert!(err.to_string().contains("is 2 bytes, expected 8"));
    }

    #[test]
    fn value_too_long() {
        // An 8-byte value for a 4-byte column must not decode from its
        // prefix.
        let raw = RawStatistics {
            min_value: Some(7i64.to_le_bytes().to_vec()),
            ..Default::default()
        };
        let err = from_thrift(Type::INT32, Some(raw)).unwrap_err();
        assert!(err.to_string().contains("is 8 bytes, expected 4"));

        let raw = RawStatistics {
            max_value: Some(vec![1, 0]),
            ..Default::default()
        };
        let err = from_thrift(Type::BOOLEAN, Some(raw)).unwrap_err();
        assert!(err.to_string().contains("is 2 bytes, expected 1"));
    }
}
