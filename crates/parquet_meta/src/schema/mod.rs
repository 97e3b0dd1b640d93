//! Parquet schema tree and column descriptors.

pub mod types;
