//! Translates a Thrift `RowGroup` struct into typed metadata (spec section
//! 3, `RowGroup` entity).

use super::column_chunk_metadata::ColumnChunkMetaData;
use super::schema_descriptor::SchemaDescriptor;
use crate::error::Result;
use crate::thrift::value::ThriftStruct;

#[derive(Debug, Clone)]
pub struct RowGroupMetaData {
    columns: Vec<ColumnChunkMetaData>,
    num_rows: i64,
    total_byte_size: i64,
}

impl RowGroupMetaData {
    /// `rg`'s `columns` field (id 1) must have exactly one entry per leaf of
    /// `schema_descr`, in the same left-to-right order.
    pub fn try_from_thrift(schema_descr: &SchemaDescriptor, rg: &ThriftStruct) -> Result<Self> {
        let chunks = rg.list(1)?;
        if chunks.len() != schema_descr.num_columns() {
            return Err(out_of_spec_err!(
                "row group declares {} columns, schema has {} leaves",
                chunks.len(),
                schema_descr.num_columns()
            ));
        }
        let columns = chunks
            .iter()
            .zip(schema_descr.columns())
            .map(|(chunk, descr)| {
                ColumnChunkMetaData::try_from_thrift(descr.clone(), chunk.as_struct()?)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(RowGroupMetaData {
            columns,
            num_rows: rg.i64(2)?,
            total_byte_size: rg.i64(3)?,
        })
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, i: usize) -> &ColumnChunkMetaData {
        &self.columns[i]
    }

    pub fn columns(&self) -> &[ColumnChunkMetaData] {
        &self.columns
    }

    pub fn num_rows(&self) -> i64 {
        self.num_rows
    }

    pub fn total_byte_size(&self) -> i64 {
        self.total_byte_size
    }

    pub fn compressed_size(&self) -> i64 {
        self.columns.iter().map(|c| c.compressed_size()).sum()
    }
}
