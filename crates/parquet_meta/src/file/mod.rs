//! Reading parquet footer metadata.
//!
//! Provides the footer locator, the metadata decoder, and the read-only
//! query facade over the decoded tree. Data pages are never touched.

pub mod decode;
pub mod footer;
pub mod metadata;
pub mod reader;
pub mod statistics;

/// The length of the parquet trailer in bytes: a 4-byte little-endian
/// footer length followed by the 4-byte magic.
pub const FOOTER_SIZE: usize = 8;

/// Magic value terminating parquet files.
pub const PARQUET_MAGIC: &[u8; 4] = b"PAR1";
