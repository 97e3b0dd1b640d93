//! The decoded metadata object graph and its query facade.
//!
//! [`ParquetMetaData`] is built once by a parse call and is read-only
//! afterwards; it holds no interior mutability, so a single tree can be
//! shared across reporting threads without locking.

use std::sync::Arc;

use crate::basic::{Compression, Encoding, Type};
use crate::errors::{Result, range_err};
use crate::file::statistics::Statistics;
use crate::schema::types::{ColumnDescriptor, ColumnPath, SchemaDescriptor};

/// Root of the decoded footer: file-level metadata plus the ordered row
/// groups. This is the sole structure handed to reporting collaborators.
#[derive(Debug, Clone)]
pub struct ParquetMetaData {
    file_metadata: FileMetaData,
    row_groups: Vec<RowGroupMetaData>,
}

impl ParquetMetaData {
    pub(crate) fn new(file_metadata: FileMetaData, row_groups: Vec<RowGroupMetaData>) -> Self {
        ParquetMetaData {
            file_metadata,
            row_groups,
        }
    }

    pub fn file_metadata(&self) -> &FileMetaData {
        &self.file_metadata
    }

    pub fn num_row_groups(&self) -> usize {
        self.row_groups.len()
    }

    /// Number of leaf columns; every row group has exactly this many chunks.
    pub fn num_columns(&self) -> usize {
        self.file_metadata.schema_descr().num_columns()
    }

    /// Row group metadata by index.
    pub fn row_group(&self, i: usize) -> Result<&RowGroupMetaData> {
        self.row_groups.get(i).ok_or_else(|| {
            range_err!("row group index {} out of range, file has {}", i, self.row_groups.len())
        })
    }

    pub fn row_groups(&self) -> &[RowGroupMetaData] {
        &self.row_groups
    }

    /// Column chunk lookup by (row group, column) index pair.
    pub fn column_chunk(&self, row_group: usize, column: usize) -> Result<&ColumnChunkMetaData> {
        let rg = self.row_group(row_group)?;
        rg.columns().get(column).ok_or_else(|| {
            range_err!(
                "column index {} out of range, row group {} has {} chunks",
                column,
                row_group,
                rg.columns().len()
            )
        })
    }

    /// Dotted paths of all leaf columns, in schema order.
    pub fn column_paths(&self) -> impl Iterator<Item = &ColumnPath> {
        self.file_metadata.schema_descr().column_paths()
    }

    /// Lazily iterates every column chunk in row-group-major order, yielding
    /// `(row_group_index, column_index, chunk)` triples.
    ///
    /// This is the iteration primitive aggregate reports are built from;
    /// each call starts a fresh pass and no tree re-scan happens per item.
    pub fn column_chunks(&self) -> ColumnChunkIter<'_> {
        ColumnChunkIter {
            row_groups: &self.row_groups,
            row_group: 0,
            column: 0,
        }
    }
}

/// Iterator over all `(row_group, column, chunk)` triples of a file.
#[derive(Debug)]
pub struct ColumnChunkIter<'a> {
    row_groups: &'a [RowGroupMetaData],
    row_group: usize,
    column: usize,
}

impl<'a> Iterator for ColumnChunkIter<'a> {
    type Item = (usize, usize, &'a ColumnChunkMetaData);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let rg = self.row_groups.get(self.row_group)?;
            match rg.columns().get(self.column) {
                Some(chunk) => {
                    let item = (self.row_group, self.column, chunk);
                    self.column += 1;
                    return Some(item);
                }
                None => {
                    self.row_group += 1;
                    self.column = 0;
                }
            }
        }
    }
}

/// File-level metadata.
#[derive(Debug, Clone)]
pub struct FileMetaData {
    version: i32,
    num_rows: i64,
    created_by: Option<String>,
    key_value_metadata: Option<Vec<KeyValue>>,
    schema_descr: Arc<SchemaDescriptor>,
}

impl FileMetaData {
    pub(crate) fn new(
        version: i32,
        num_rows: i64,
        created_by: Option<String>,
        key_value_metadata: Option<Vec<KeyValue>>,
        schema_descr: Arc<SchemaDescriptor>,
    ) -> Self {
        FileMetaData {
            version,
            num_rows,
            created_by,
            key_value_metadata,
            schema_descr,
        }
    }

    /// Format version recorded by the writer.
    pub fn version(&self) -> i32 {
        self.version
    }

    /// Total number of rows across all row groups.
    pub fn num_rows(&self) -> i64 {
        self.num_rows
    }

    /// Application string of the writer, e.g.
    /// `parquet-mr version 1.8.0 (build 0fda28af...)`.
    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    pub fn key_value_metadata(&self) -> Option<&[KeyValue]> {
        self.key_value_metadata.as_deref()
    }

    pub fn schema_descr(&self) -> &SchemaDescriptor {
        &self.schema_descr
    }

    pub fn schema_descr_ptr(&self) -> Arc<SchemaDescriptor> {
        Arc::clone(&self.schema_descr)
    }
}

/// Arbitrary writer-supplied key/value metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: Option<String>,
}

/// Metadata for one row group. Its identity is its index in the owning
/// sequence; there is no separate id field.
#[derive(Debug, Clone)]
pub struct RowGroupMetaData {
    columns: Vec<ColumnChunkMetaData>,
    num_rows: i64,
    total_byte_size: i64,
    file_offset: Option<i64>,
    ordinal: Option<i16>,
}

impl RowGroupMetaData {
    pub(crate) fn new(
        columns: Vec<ColumnChunkMetaData>,
        num_rows: i64,
        total_byte_size: i64,
        file_offset: Option<i64>,
        ordinal: Option<i16>,
    ) -> Self {
        RowGroupMetaData {
            columns,
            num_rows,
            total_byte_size,
            file_offset,
            ordinal,
        }
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, i: usize) -> Result<&ColumnChunkMetaData> {
        self.columns.get(i).ok_or_else(|| {
            range_err!("column index {} out of range, row group has {}", i, self.columns.len())
        })
    }

    pub fn columns(&self) -> &[ColumnChunkMetaData] {
        &self.columns
    }

    pub fn num_rows(&self) -> i64 {
        self.num_rows
    }

    /// Total uncompressed byte size of all column data in this row group.
    pub fn total_byte_size(&self) -> i64 {
        self.total_byte_size
    }

    /// Total compressed size, summed over the column chunks.
    pub fn compressed_size(&self) -> i64 {
        self.columns.iter().map(|c| c.total_compressed_size).sum()
    }

    /// Offset of the row group from the beginning of the file, if recorded.
    pub fn file_offset(&self) -> Option<i64> {
        self.file_offset
    }

    /// Ordinal recorded by the writer, if any. The authoritative row group
    /// number is the index in [`ParquetMetaData::row_groups`].
    pub fn ordinal(&self) -> Option<i16> {
        self.ordinal
    }
}

/// Metadata for one column chunk.
#[derive(Debug, Clone)]
pub struct ColumnChunkMetaData {
    pub(crate) column_descr: Arc<ColumnDescriptor>,
    pub(crate) encodings: Vec<Encoding>,
    pub(crate) file_path: Option<String>,
    pub(crate) file_offset: i64,
    pub(crate) num_values: i64,
    pub(crate) compression: Compression,
    pub(crate) total_compressed_size: i64,
    pub(crate) total_uncompressed_size: i64,
    pub(crate) data_page_offset: i64,
    pub(crate) index_page_offset: Option<i64>,
    pub(crate) dictionary_page_offset: Option<i64>,
    pub(crate) statistics: Option<Statistics>,
}

impl ColumnChunkMetaData {
    /// Dotted path of the column this chunk belongs to.
    pub fn column_path(&self) -> &ColumnPath {
        self.column_descr.path()
    }

    pub fn column_descr(&self) -> &ColumnDescriptor {
        &self.column_descr
    }

    pub fn physical_type(&self) -> Type {
        self.column_descr.physical_type()
    }

    /// All encodings used for pages of this chunk.
    pub fn encodings(&self) -> &[Encoding] {
        &self.encodings
    }

    /// File the chunk data lives in; `None` means the same file as the
    /// footer.
    pub fn file_path(&self) -> Option<&str> {
        self.file_path.as_deref()
    }

    pub fn file_offset(&self) -> i64 {
        self.file_offset
    }

    pub fn num_values(&self) -> i64 {
        self.num_values
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn compressed_size(&self) -> i64 {
        self.total_compressed_size
    }

    /// Uncompressed size of the chunk data. Note that a store-only codec
    /// makes this equal to the compressed size, and corrupt files may even
    /// invert the relation; neither is rejected here.
    pub fn uncompressed_size(&self) -> i64 {
        self.total_uncompressed_size
    }

    pub fn data_page_offset(&self) -> i64 {
        self.data_page_offset
    }

    pub fn index_page_offset(&self) -> Option<i64> {
        self.index_page_offset
    }

    pub fn dictionary_page_offset(&self) -> Option<i64> {
        self.dictionary_page_offset
    }

    /// Statistics recorded for this chunk, or `None` if the writer recorded
    /// none.
    pub fn statistics(&self) -> Option<&Statistics> {
        self.statistics.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::Repetition;
    use crate::schema::types::{SchemaElement, schema_from_elements};

    fn test_metadata(num_row_groups: usize, num_columns: usize) -> ParquetMetaData {
        let mut elements = vec![SchemaElement {
            name: "schema".to_owned(),
            physical_type: None,
            type_length: None,
            repetition: None,
            num_children: Some(num_columns as i32),
        }];
        for i in 0..num_columns {
            elements.push(SchemaElement {
                name: format!("c{i}"),
                physical_type: Some(Type::INT32),
                type_length: None,
                repetition: Some(Repetition::REQUIRED),
                num_children: None,
            });
        }
        let descr =
            Arc::new(SchemaDescriptor::new(schema_from_elements(elements).unwrap()).unwrap());

        let row_groups = (0..num_row_groups)
            .map(|rg| {
                let columns = descr
                    .columns()
                    .iter()
                    .map(|col| ColumnChunkMetaData {
                        column_descr: Arc::clone(col),
                        encodings: vec![Encoding::PLAIN],
                        file_path: None,
                        file_offset: 0,
                        num_values: 10,
                        compression: Compression::UNCOMPRESSED,
                        total_compressed_size: 100,
                        total_uncompressed_size: 100,
                        data_page_offset: 4,
                        index_page_offset: None,
                        dictionary_page_offset: None,
                        statistics: None,
                    })
                    .collect();
                RowGroupMetaData::new(columns, 10, 100, None, Some(rg as i16))
            })
            .collect();

        let file_metadata = FileMetaData::new(
            2,
            (num_row_groups * 10) as i64,
            None,
            None,
            descr,
        );
        ParquetMetaData::new(file_metadata, row_groups)
    }

    #[test]
    fn bounds_checked_lookups() {
        let meta = test_metadata(2, 3);
        assert!(meta.row_group(1).is_ok());
        let err = meta.row_group(2).unwrap_err();
        assert!(err.to_string().contains("row group index 2 out of range"));

        assert!(meta.column_chunk(1, 2).is_ok());
        let err = meta.column_chunk(0, 3).unwrap_err();
        assert!(err.to_string().contains("column index 3 out of range"));
        meta.column_chunk(2, 0).unwrap_err();
    }

    #[test]
    fn chunk_iterator_order_and_cardinality() {
        let meta = test_metadata(3, 2);
        let triples: Vec<(usize, usize)> =
            meta.column_chunks().map(|(rg, col, _)| (rg, col)).collect();
        assert_eq!(triples.len(), meta.num_row_groups() * meta.num_columns());
        // Row-group-major order, every pair unique.
        assert_eq!(triples, [(0, 0), (0, 1), (1, 0), (1, 1), (2, 0), (2, 1)]);
    }

    #[test]
    fn chunk_iterator_restartable() {
        let meta = test_metadata(2, 2);
        let first: Vec<_> = meta.column_chunks().map(|(rg, col, _)| (rg, col)).collect();
        let second: Vec<_> = meta.column_chunks().map(|(rg, col, _)| (rg, col)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn row_group_compressed_size_sums_columns() {
        let meta = test_metadata(1, 3);
        assert_eq!(meta.row_group(0).unwrap().compressed_size(), 300);
    }

    #[test]
    fn metadata_is_shareable() {
        fn assert_sync_send<T: Sync + Send>() {}
        assert_sync_send::<ParquetMetaData>();
    }
}
