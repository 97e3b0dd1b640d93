//! Decoding of the footer's thrift structs into the metadata object graph.
//!
//! Each struct decoder follows the same shape: loop over field headers,
//! match on field id, skip anything unrecognized. Unknown ids are how the
//! format evolves, so skipping must work at any nesting depth. Fields can
//! arrive in any id order; everything is first collected into raw structs
//! and only assembled (and cross-checked against the schema) once the
//! enclosing struct's stop field has been seen.

use std::sync::Arc;

use crate::basic::{Compression, Encoding, Repetition, Type};
use crate::errors::{Result, decode_err};
use crate::file::metadata::{
    ColumnChunkMetaData, FileMetaData, KeyValue, ParquetMetaData, RowGroupMetaData,
};
use crate::file::statistics::{self, RawStatistics};
use crate::schema::types::{
    ColumnDescriptor, SchemaDescriptor, SchemaElement, schema_from_elements,
};
use crate::thrift::{CompactReader, FieldHeader, FieldType};

/// Decodes a complete `FileMetaData` struct from the footer blob.
pub(crate) fn decode_file_metadata(buf: &[u8]) -> Result<ParquetMetaData> {
    let mut reader = CompactReader::new(buf);

    let mut version = None;
    let mut schema_elements = None;
    let mut num_rows = None;
    let mut raw_row_groups = None;
    let mut key_value_metadata = None;
    let mut created_by = None;

    let mut last_field_id = 0i16;
    loop {
        let header = reader.read_field_begin(last_field_id)?;
        if header.field_type == FieldType::Stop {
            break;
        }
        match header.id {
            1 => {
                expect_type(&header, FieldType::I32, "FileMetaData")?;
                version = Some(reader.read_i32()?);
            }
            2 => {
                expect_type(&header, FieldType::List, "FileMetaData")?;
                schema_elements = Some(read_schema_elements(&mut reader)?);
            }
            3 => {
                expect_type(&header, FieldType::I64, "FileMetaData")?;
                num_rows = Some(reader.read_i64()?);
            }
            4 => {
                expect_type(&header, FieldType::List, "FileMetaData")?;
                raw_row_groups = Some(read_row_groups(&mut reader)?);
            }
            5 => {
                expect_type(&header, FieldType::List, "FileMetaData")?;
                key_value_metadata = Some(read_key_values(&mut reader)?);
            }
            6 => {
                expect_type(&header, FieldType::Binary, "FileMetaData")?;
                created_by = Some(reader.read_string()?.to_owned());
            }
            // Column orders (7) and anything newer are skipped.
            _ => reader.skip(header.field_type)?,
        }
        last_field_id = header.id;
    }

    let version = version.ok_or_else(|| missing("FileMetaData", "version"))?;
    let num_rows = num_rows.ok_or_else(|| missing("FileMetaData", "num_rows"))?;
    let elements = schema_elements.ok_or_else(|| missing("FileMetaData", "schema"))?;
    let raw_row_groups = raw_row_groups.ok_or_else(|| missing("FileMetaData", "row_groups"))?;

    let schema = schema_from_elements(elements)?;
    let schema_descr = Arc::new(SchemaDescriptor::new(schema)?);

    let row_groups = raw_row_groups
        .into_iter()
        .enumerate()
        .map(|(idx, raw)| raw.into_metadata(idx, &schema_descr))
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(
        version,
        num_rows,
        num_row_groups = row_groups.len(),
        num_columns = schema_descr.num_columns(),
        "decoded file metadata"
    );

    let file_metadata =
        FileMetaData::new(version, num_rows, created_by, key_value_metadata, schema_descr);
    Ok(ParquetMetaData::new(file_metadata, row_groups))
}

fn expect_type(
    header: &FieldHeader,
    expected: FieldType,
    struct_name: &str,
) -> Result<()> {
    if header.field_type != expected {
        return Err(decode_err!(
            "unexpected type {:?} for field {} of {}, expected {:?}",
            header.field_type,
            header.id,
            struct_name,
            expected
        ));
    }
    Ok(())
}

fn missing(struct_name: &str, field: &str) -> crate::errors::ParquetError {
    decode_err!("{} is missing required field '{}'", struct_name, field)
}

fn expect_list_of(
    reader: &mut CompactReader,
    expected: FieldType,
    what: &str,
) -> Result<usize> {
    let (elem_type, count) = reader.read_list_begin()?;
    // An empty list may carry any element type tag.
    if count > 0 && elem_type != expected {
        return Err(decode_err!(
            "list of {} has element type {:?}, expected {:?}",
            what,
            elem_type,
            expected
        ));
    }
    Ok(count)
}

fn read_schema_elements(reader: &mut CompactReader) -> Result<Vec<SchemaElement>> {
    let count = expect_list_of(reader, FieldType::Struct, "schema elements")?;
    let mut elements = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        elements.push(read_schema_element(reader)?);
    }
    Ok(elements)
}

fn read_schema_element(reader: &mut CompactReader) -> Result<SchemaElement> {
    let mut physical_type = None;
    let mut type_length = None;
    let mut repetition = None;
    let mut name = None;
    let mut num_children = None;

    let mut last_field_id = 0i16;
    loop {
        let header = reader.read_field_begin(last_field_id)?;
        if header.field_type == FieldType::Stop {
            break;
        }
        match header.id {
            1 => {
                expect_type(&header, FieldType::I32, "SchemaElement")?;
                physical_type = Some(Type::try_from(reader.read_i32()?)?);
            }
            2 => {
                expect_type(&header, FieldType::I32, "SchemaElement")?;
                type_length = Some(reader.read_i32()?);
            }
            3 => {
                expect_type(&header, FieldType::I32, "SchemaElement")?;
                repetition = Some(Repetition::try_from(reader.read_i32()?)?);
            }
            4 => {
                expect_type(&header, FieldType::Binary, "SchemaElement")?;
                name = Some(reader.read_string()?.to_owned());
            }
            5 => {
                expect_type(&header, FieldType::I32, "SchemaElement")?;
                num_children = Some(reader.read_i32()?);
            }
            // Converted/logical types carry no structural information here.
            _ => reader.skip(header.field_type)?,
        }
        last_field_id = header.id;
    }

    Ok(SchemaElement {
        name: name.ok_or_else(|| missing("SchemaElement", "name"))?,
        physical_type,
        type_length,
        repetition,
        num_children,
    })
}

fn read_key_values(reader: &mut CompactReader) -> Result<Vec<KeyValue>> {
    let count = expect_list_of(reader, FieldType::Struct, "key/value metadata")?;
    let mut pairs = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        let mut key = None;
        let mut value = None;
        let mut last_field_id = 0i16;
        loop {
            let header = reader.read_field_begin(last_field_id)?;
            if header.field_type == FieldType::Stop {
                break;
            }
            match header.id {
                1 => {
                    expect_type(&header, FieldType::Binary, "KeyValue")?;
                    key = Some(reader.read_string()?.to_owned());
                }
                2 => {
                    expect_type(&header, FieldType::Binary, "KeyValue")?;
                    value = Some(reader.read_string()?.to_owned());
                }
                _ => reader.skip(header.field_type)?,
            }
            last_field_id = header.id;
        }
        pairs.push(KeyValue {
            key: key.ok_or_else(|| missing("KeyValue", "key"))?,
            value,
        });
    }
    Ok(pairs)
}

/// A row group as decoded, before cross-checking against the schema.
struct RawRowGroup {
    columns: Vec<RawColumnChunk>,
    total_byte_size: i64,
    num_rows: i64,
    file_offset: Option<i64>,
    ordinal: Option<i16>,
}

impl RawRowGroup {
    fn into_metadata(
        self,
        row_group_idx: usize,
        schema_descr: &SchemaDescriptor,
    ) -> Result<RowGroupMetaData> {
        if self.columns.len() != schema_descr.num_columns() {
            return Err(decode_err!(
                "row group {} has {} column chunks but the schema has {} leaf columns",
                row_group_idx,
                self.columns.len(),
                schema_descr.num_columns()
            ));
        }
        let columns = self
            .columns
            .into_iter()
            .zip(schema_descr.columns())
            .map(|(raw, descr)| raw.into_metadata(descr))
            .collect::<Result<Vec<_>>>()?;
        Ok(RowGroupMetaData::new(
            columns,
            self.num_rows,
            self.total_byte_size,
            self.file_offset,
            self.ordinal,
        ))
    }
}

fn read_row_groups(reader: &mut CompactReader) -> Result<Vec<RawRowGroup>> {
    let count = expect_list_of(reader, FieldType::Struct, "row groups")?;
    let mut row_groups = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        row_groups.push(read_row_group(reader)?);
    }
    Ok(row_groups)
}

fn read_row_group(reader: &mut CompactReader) -> Result<RawRowGroup> {
    let mut columns = None;
    let mut total_byte_size = None;
    let mut num_rows = None;
    let mut file_offset = None;
    let mut ordinal = None;

    let mut last_field_id = 0i16;
    loop {
        let header = reader.read_field_begin(last_field_id)?;
        if header.field_type == FieldType::Stop {
            break;
        }
        match header.id {
            1 => {
                expect_type(&header, FieldType::List, "RowGroup")?;
                let count = expect_list_of(reader, FieldType::Struct, "column chunks")?;
                let mut chunks = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    chunks.push(read_column_chunk(reader)?);
                }
                columns = Some(chunks);
            }
            2 => {
                expect_type(&header, FieldType::I64, "RowGroup")?;
                total_byte_size = Some(reader.read_i64()?);
            }
            3 => {
                expect_type(&header, FieldType::I64, "RowGroup")?;
                num_rows = Some(reader.read_i64()?);
            }
            5 => {
                expect_type(&header, FieldType::I64, "RowGroup")?;
                file_offset = Some(reader.read_i64()?);
            }
            7 => {
                expect_type(&header, FieldType::I16, "RowGroup")?;
                ordinal = Some(reader.read_i16()?);
            }
            // Sorting columns (4) and the rest carry no sizing information.
            _ => reader.skip(header.field_type)?,
        }
        last_field_id = header.id;
    }

    Ok(RawRowGroup {
        columns: columns.ok_or_else(|| missing("RowGroup", "columns"))?,
        total_byte_size: total_byte_size.ok_or_else(|| missing("RowGroup", "total_byte_size"))?,
        num_rows: num_rows.ok_or_else(|| missing("RowGroup", "num_rows"))?,
        file_offset,
        ordinal,
    })
}

/// A column chunk as decoded, before binding to its leaf descriptor.
struct RawColumnChunk {
    file_path: Option<String>,
    file_offset: i64,
    meta_data: Option<RawColumnMetaData>,
}

struct RawColumnMetaData {
    physical_type: Type,
    encodings: Vec<Encoding>,
    path_in_schema: Vec<String>,
    codec: Compression,
    num_values: i64,
    total_uncompressed_size: i64,
    total_compressed_size: i64,
    data_page_offset: i64,
    index_page_offset: Option<i64>,
    dictionary_page_offset: Option<i64>,
    statistics: Option<RawStatistics>,
}

impl RawColumnChunk {
    fn into_metadata(self, descr: &Arc<ColumnDescriptor>) -> Result<ColumnChunkMetaData> {
        let meta = self.meta_data.ok_or_else(|| {
            decode_err!("column chunk for '{}' has no embedded metadata", descr.path())
        })?;
        if meta.physical_type != descr.physical_type() {
            return Err(decode_err!(
                "column chunk for '{}' has type {} but the schema says {}",
                descr.path(),
                meta.physical_type,
                descr.physical_type()
            ));
        }
        if meta.path_in_schema != descr.path().parts() {
            return Err(decode_err!(
                "column chunk path '{}' does not match schema leaf '{}'",
                meta.path_in_schema.join("."),
                descr.path()
            ));
        }
        let statistics = statistics::from_thrift(descr.physical_type(), meta.statistics)?;
        Ok(ColumnChunkMetaData {
            column_descr: Arc::clone(descr),
            encodings: meta.encodings,
            file_path: self.file_path,
            file_offset: self.file_offset,
            num_values: meta.num_values,
            compression: meta.codec,
            total_compressed_size: meta.total_compressed_size,
            total_uncompressed_size: meta.total_uncompressed_size,
            data_page_offset: meta.data_page_offset,
            index_page_offset: meta.index_page_offset,
            dictionary_page_offset: meta.dictionary_page_offset,
            statistics,
        })
    }
}

fn read_column_chunk(reader: &mut CompactReader) -> Result<RawColumnChunk> {
    let mut file_path = None;
    let mut file_offset = None;
    let mut meta_data = None;

    let mut last_field_id = 0i16;
    loop {
        let header = reader.read_field_begin(last_field_id)?;
        if header.field_type == FieldType::Stop {
            break;
        }
        match header.id {
            1 => {
                expect_type(&header, FieldType::Binary, "ColumnChunk")?;
                file_path = Some(reader.read_string()?.to_owned());
            }
            2 => {
                expect_type(&header, FieldType::I64, "ColumnChunk")?;
                file_offset = Some(reader.read_i64()?);
            }
            3 => {
                expect_type(&header, FieldType::Struct, "ColumnChunk")?;
                meta_data = Some(read_column_meta_data(reader)?);
            }
            _ => reader.skip(header.field_type)?,
        }
        last_field_id = header.id;
    }

    Ok(RawColumnChunk {
        file_path,
        file_offset: file_offset.ok_or_else(|| missing("ColumnChunk", "file_offset"))?,
        meta_data,
    })
}

fn read_column_meta_data(reader: &mut CompactReader) -> Result<RawColumnMetaData> {
    let mut physical_type = None;
    let mut encodings = None;
    let mut path_in_schema = None;
    let mut codec = None;
    let mut num_values = None;
    let mut total_uncompressed_size = None;
    let mut total_compressed_size = None;
    let mut data_page_offset = None;
    let mut index_page_offset = None;
    let mut dictionary_page_offset = None;
    let mut statistics = None;

    let mut last_field_id = 0i16;
    loop {
        let header = reader.read_field_begin(last_field_id)?;
        if header.field_type == FieldType::Stop {
            break;
        }
        match header.id {
            1 => {
                expect_type(&header, FieldType::I32, "ColumnMetaData")?;
                physical_type = Some(Type::try_from(reader.read_i32()?)?);
            }
            2 => {
                expect_type(&header, FieldType::List, "ColumnMetaData")?;
                let count = expect_list_of(reader, FieldType::I32, "encodings")?;
                let mut list = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    list.push(Encoding::try_from(reader.read_i32()?)?);
                }
                encodings = Some(list);
            }
            3 => {
                expect_type(&header, FieldType::List, "ColumnMetaData")?;
                let count = expect_list_of(reader, FieldType::Binary, "schema path")?;
                let mut parts = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    parts.push(reader.read_string()?.to_owned());
                }
                path_in_schema = Some(parts);
            }
            4 => {
                expect_type(&header, FieldType::I32, "ColumnMetaData")?;
                codec = Some(Compression::try_from(reader.read_i32()?)?);
            }
            5 => {
                expect_type(&header, FieldType::I64, "ColumnMetaData")?;
                num_values = Some(reader.read_i64()?);
            }
            6 => {
                expect_type(&header, FieldType::I64, "ColumnMetaData")?;
                total_uncompressed_size = Some(reader.read_i64()?);
            }
            7 => {
                expect_type(&header, FieldType::I64, "ColumnMetaData")?;
                total_compressed_size = Some(reader.read_i64()?);
            }
            9 => {
                expect_type(&header, FieldType::I64, "ColumnMetaData")?;
                data_page_offset = Some(reader.read_i64()?);
            }
            10 => {
                expect_type(&header, FieldType::I64, "ColumnMetaData")?;
                index_page_offset = Some(reader.read_i64()?);
            }
            11 => {
                expect_type(&header, FieldType::I64, "ColumnMetaData")?;
                dictionary_page_offset = Some(reader.read_i64()?);
            }
            12 => {
                expect_type(&header, FieldType::Struct, "ColumnMetaData")?;
                statistics = Some(read_statistics(reader)?);
            }
            // Key/value metadata (8), encoding stats (13) and the rest are
            // not sizing or placement information.
            _ => reader.skip(header.field_type)?,
        }
        last_field_id = header.id;
    }

    Ok(RawColumnMetaData {
        physical_type: physical_type.ok_or_else(|| missing("ColumnMetaData", "type"))?,
        encodings: encodings.ok_or_else(|| missing("ColumnMetaData", "encodings"))?,
        path_in_schema: path_in_schema
            .ok_or_else(|| missing("ColumnMetaData", "path_in_schema"))?,
        codec: codec.ok_or_else(|| missing("ColumnMetaData", "codec"))?,
        num_values: num_values.ok_or_else(|| missing("ColumnMetaData", "num_values"))?,
        total_uncompressed_size: total_uncompressed_size
            .ok_or_else(|| missing("ColumnMetaData", "total_uncompressed_size"))?,
        total_compressed_size: total_compressed_size
            .ok_or_else(|| missing("ColumnMetaData", "total_compressed_size"))?,
        data_page_offset: data_page_offset
            .ok_or_else(|| missing("ColumnMetaData", "data_page_offset"))?,
        index_page_offset,
        dictionary_page_offset,
        statistics,
    })
}

fn read_statistics(reader: &mut CompactReader) -> Result<RawStatistics> {
    let mut stats = RawStatistics::default();

    let mut last_field_id = 0i16;
    loop {
        let header = reader.read_field_begin(last_field_id)?;
        if header.field_type == FieldType::Stop {
            break;
        }
        match header.id {
            1 => {
                expect_type(&header, FieldType::Binary, "Statistics")?;
                stats.max = Some(reader.read_binary()?.to_vec());
            }
            2 => {
                expect_type(&header, FieldType::Binary, "Statistics")?;
                stats.min = Some(reader.read_binary()?.to_vec());
            }
            3 => {
                expect_type(&header, FieldType::I64, "Statistics")?;
                stats.null_count = Some(reader.read_i64()?);
            }
            4 => {
                expect_type(&header, FieldType::I64, "Statistics")?;
                stats.distinct_count = Some(reader.read_i64()?);
            }
            5 => {
                expect_type(&header, FieldType::Binary, "Statistics")?;
                stats.max_value = Some(reader.read_binary()?.to_vec());
            }
            6 => {
                expect_type(&header, FieldType::Binary, "Statistics")?;
                stats.min_value = Some(reader.read_binary()?.to_vec());
            }
            _ => reader.skip(header.field_type)?,
        }
        last_field_id = header.id;
    }

    Ok(stats)
}
