//! Locating and decoding the footer.
//!
//! A parquet file ends with an 8-byte trailer: a little-endian u32 giving
//! the length of the compact-encoded metadata blob, followed by the magic
//! `PAR1`. The metadata blob sits immediately before the trailer.

use tracing::debug;

use super::decode;
use super::metadata::ParquetMetaData;
use super::reader::ChunkReader;
use super::{FOOTER_SIZE, PARQUET_MAGIC};
use crate::errors::{Result, format_err};

/// Validates the 8-byte trailer and returns the metadata length.
pub fn decode_footer(trailer: &[u8]) -> Result<usize> {
    if trailer.len() != FOOTER_SIZE {
        return Err(format_err!(
            "invalid trailer length {}, expected {}",
            trailer.len(),
            FOOTER_SIZE
        ));
    }
    if &trailer[4..] != PARQUET_MAGIC {
        return Err(format_err!("not a recognized parquet file: bad magic"));
    }
    let len = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    Ok(len as usize)
}

/// Reads and decodes the footer metadata from a random-access byte source.
///
/// This is the single parse entry point: one bounded pass over the footer
/// region, producing an immutable [`ParquetMetaData`] tree.
pub fn parse_metadata<R: ChunkReader>(reader: &R) -> Result<ParquetMetaData> {
    let file_size = reader.len();
    if file_size < FOOTER_SIZE as u64 {
        return Err(format_err!(
            "file of {} bytes is too small to hold a parquet trailer",
            file_size
        ));
    }

    let trailer = reader.get_bytes(file_size - FOOTER_SIZE as u64, FOOTER_SIZE)?;
    let footer_len = decode_footer(trailer.as_ref())?;
    debug!(footer_len, file_size, "decoded parquet trailer");

    if footer_len as u64 + FOOTER_SIZE as u64 > file_size {
        return Err(format_err!(
            "truncated file: footer length {} exceeds file size {}",
            footer_len,
            file_size
        ));
    }

    let metadata_start = file_size - FOOTER_SIZE as u64 - footer_len as u64;
    let metadata = reader.get_bytes(metadata_start, footer_len)?;
    decode_metadata(metadata.as_ref())
}

/// Decodes an already-extracted metadata blob.
pub fn decode_metadata(buf: &[u8]) -> Result<ParquetMetaData> {
    decode::decode_file_metadata(buf)
}
