//! Translates the Thrift `ColumnChunk`/`ColumnMetaData` structs into typed
//! metadata (spec section 3, `ColumnChunk`/`ColumnMetaData` entities).

use super::column_descriptor::ColumnDescriptor;
use super::statistics::Statistics;
use crate::compression::Compression;
use crate::encoding::Encoding;
use crate::error::Result;
use crate::thrift::value::ThriftStruct;

#[derive(Debug, Clone)]
pub struct ColumnChunkMetaData {
    column_descr: ColumnDescriptor,
    file_path: Option<String>,
    file_offset: i64,
    encodings: Vec<Encoding>,
    compression: Compression,
    num_values: i64,
    total_uncompressed_size: i64,
    total_compressed_size: i64,
    data_page_offset: i64,
    index_page_offset: Option<i64>,
    dictionary_page_offset: Option<i64>,
    statistics: Option<Statistics>,
    bloom_filter_offset: Option<i64>,
    bloom_filter_length: Option<i32>,
    offset_index_offset: Option<i64>,
    offset_index_length: Option<i32>,
    column_index_offset: Option<i64>,
    column_index_length: Option<i32>,
}

impl ColumnChunkMetaData {
    /// Translates from Thrift. `chunk` is the `ColumnChunk` struct; `descr`
    /// is the already-built descriptor for this leaf, in row-group column
    /// order.
    pub fn try_from_thrift(descr: ColumnDescriptor, chunk: &ThriftStruct) -> Result<Self> {
        let meta = chunk
            .struct_(3)
            .map_err(|_| general_err!("column chunk is missing meta_data"))?;
        let encodings: Vec<Encoding> = meta
            .list(2)?
            .iter()
            .map(|v| Encoding::from_thrift_id(v.as_i32()?))
            .collect::<Result<_>>()?;
        let compression = Compression::from_thrift_id(meta.i32(4)?)?;
        let statistics = meta
            .opt_struct(12)
            .map(|s| Statistics::from_thrift(s, descr.element()))
            .transpose()?
            .flatten();
        Ok(ColumnChunkMetaData {
            column_descr: descr,
            file_path: chunk.opt_string(1),
            file_offset: chunk.i64(2)?,
            encodings,
            compression,
            num_values: meta.i64(5)?,
            total_uncompressed_size: meta.i64(6)?,
            total_compressed_size: meta.i64(7)?,
            data_page_offset: meta.i64(9)?,
            index_page_offset: meta.opt_i64(10),
            dictionary_page_offset: meta.opt_i64(11),
            statistics,
            bloom_filter_offset: meta.opt_i64(14),
            bloom_filter_length: meta.opt_i32(15),
            offset_index_offset: chunk.opt_i64(4),
            offset_index_length: chunk.opt_i32(5),
            column_index_offset: chunk.opt_i64(6),
            column_index_length: chunk.opt_i32(7),
        })
    }

    pub fn column_descriptor(&self) -> &ColumnDescriptor {
        &self.column_descr
    }

    pub fn file_path(&self) -> Option<&str> {
        self.file_path.as_deref()
    }

    pub fn encodings(&self) -> &[Encoding] {
        &self.encodings
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn num_values(&self) -> i64 {
        self.num_values
    }

    pub fn uncompressed_size(&self) -> i64 {
        self.total_uncompressed_size
    }

    pub fn compressed_size(&self) -> i64 {
        self.total_compressed_size
    }

    pub fn data_page_offset(&self) -> i64 {
        self.data_page_offset
    }

    pub fn dictionary_page_offset(&self) -> Option<i64> {
        self.dictionary_page_offset
    }

    pub fn index_page_offset(&self) -> Option<i64> {
        self.index_page_offset
    }

    pub fn statistics(&self) -> Option<&Statistics> {
        self.statistics.as_ref()
    }

    pub fn bloom_filter_range(&self) -> Option<(u64, u64)> {
        match (self.bloom_filter_offset, self.bloom_filter_length) {
            (Some(offset), Some(len)) => Some((offset as u64, len as u64)),
            _ => None,
        }
    }

    pub fn offset_index_range(&self) -> Option<(u64, u64)> {
        match (self.offset_index_offset, self.offset_index_length) {
            (Some(offset), Some(len)) => Some((offset as u64, len as u64)),
            _ => None,
        }
    }

    pub fn column_index_range(&self) -> Option<(u64, u64)> {
        match (self.column_index_offset, self.column_index_length) {
            (Some(offset), Some(len)) => Some((offset as u64, len as u64)),
            _ => None,
        }
    }

    /// The chunk's byte range within the file (spec section 3's "range
    /// invariant"): starts at the dictionary page if present and earlier
    /// than the first data page, spans `total_compressed_size` bytes.
    pub fn byte_range(&self) -> (u64, u64) {
        let start = match self.dictionary_page_offset {
            Some(dict) if dict < self.data_page_offset => dict,
            _ => self.data_page_offset,
        };
        (start as u64, self.total_compressed_size as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PhysicalType, Repetition, SchemaElement, SchemaNode};
    use crate::thrift::value::ThriftValue;
    use std::collections::HashMap;

    fn descr() -> ColumnDescriptor {
        let leaf = SchemaNode {
            element: SchemaElement {
                name: "a".to_owned(),
                physical_type: Some(PhysicalType::Int32),
                type_length: None,
                repetition: Repetition::Required,
                num_children: None,
                converted_type: None,
                scale: None,
                precision: None,
                field_id: None,
                logical_type: None,
            },
            children: vec![],
        };
        let root = SchemaNode {
            element: SchemaElement {
                name: "schema".to_owned(),
                physical_type: None,
                type_length: None,
                repetition: Repetition::Required,
                num_children: Some(1),
                converted_type: None,
                scale: None,
                precision: None,
                field_id: None,
                logical_type: None,
            },
            children: vec![leaf],
        };
        ColumnDescriptor::from_path(&[&root, &root.children[0]])
    }

    fn chunk_struct() -> ThriftStruct {
        let mut meta = HashMap::new();
        meta.insert(
            2,
            ThriftValue::List(vec![ThriftValue::I32(0)]), // PLAIN
        );
        meta.insert(4, ThriftValue::I32(0)); // UNCOMPRESSED
        meta.insert(5, ThriftValue::I64(100));
        meta.insert(6, ThriftValue::I64(400));
        meta.insert(7, ThriftValue::I64(300));
        meta.insert(9, ThriftValue::I64(1000));
        meta.insert(11, ThriftValue::I64(900));

        let mut fields = HashMap::new();
        fields.insert(2, ThriftValue::I64(900));
        fields.insert(3, ThriftValue::Struct(ThriftStruct { fields: meta }));
        ThriftStruct { fields }
    }

    #[test]
    fn computes_byte_range_from_dictionary_offset() {
        let meta = ColumnChunkMetaData::try_from_thrift(descr(), &chunk_struct()).unwrap();
        assert_eq!(meta.byte_range(), (900, 300));
        assert_eq!(meta.num_values(), 100);
        assert_eq!(meta.compression(), Compression::Uncompressed);
    }
}
