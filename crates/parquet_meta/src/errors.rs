//! Error taxonomy for footer metadata reads.
//!
//! `Format` means the file is not parquet (or its trailer is damaged),
//! `Decode` means the footer bytes violate the compact encoding or the
//! metadata field tables, `Range` means a facade accessor was handed an
//! out-of-bounds index. All three are terminal for the call that raised
//! them; there is no partial-result recovery.

#[derive(Debug, thiserror::Error)]
pub enum ParquetError {
    #[error("format error: {0}")]
    Format(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("range error: {0}")]
    Range(String),

    /// Error raised by the underlying byte source.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = ParquetError> = std::result::Result<T, E>;

macro_rules! format_err {
    ($fmt:expr) => {
        $crate::errors::ParquetError::Format(format!($fmt))
    };
    ($fmt:expr, $($args:expr),*) => {
        $crate::errors::ParquetError::Format(format!($fmt, $($args),*))
    };
}

macro_rules! decode_err {
    ($fmt:expr) => {
        $crate::errors::ParquetError::Decode(format!($fmt))
    };
    ($fmt:expr, $($args:expr),*) => {
        $crate::errors::ParquetError::Decode(format!($fmt, $($args),*))
    };
}

macro_rules! range_err {
    ($fmt:expr) => {
        $crate::errors::ParquetError::Range(format!($fmt))
    };
    ($fmt:expr, $($args:expr),*) => {
        $crate::errors::ParquetError::Range(format!($fmt, $($args),*))
    };
}

pub(crate) use {decode_err, format_err, range_err};
