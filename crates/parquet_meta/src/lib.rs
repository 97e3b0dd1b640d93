//! Reader for the metadata footer of parquet files.
//!
//! Decodes the thrift compact-protocol footer into a typed object graph
//! without touching any page data, so inspecting a multi-gigabyte file
//! costs two small reads. Nothing here decompresses or decodes column
//! values.
//!
//! ```no_run
//! use std::fs::File;
//!
//! use parquet_meta::file::footer::parse_metadata;
//!
//! # fn main() -> parquet_meta::errors::Result<()> {
//! let file = File::open("data.parquet")?;
//! let meta = parse_metadata(&file)?;
//! println!("{} rows in {} row groups", meta.file_metadata().num_rows(), meta.num_row_groups());
//! for (rg, col, chunk) in meta.column_chunks() {
//!     println!("  [{rg}:{col}] {} {} bytes", chunk.column_path(), chunk.compressed_size());
//! }
//! # Ok(())
//! # }
//! ```

pub mod basic;
pub mod errors;
pub mod file;
pub mod schema;
pub mod thrift;
