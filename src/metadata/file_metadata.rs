//! Translates the top-level Thrift `FileMetaData` struct (spec section 3).

use super::row_metadata::RowGroupMetaData;
use super::schema_descriptor::SchemaDescriptor;
use crate::error::Result;
use crate::schema::SchemaTree;
use crate::thrift::value::ThriftStruct;

/// One entry of the file's free-form `key_value_metadata` map (Thrift
/// `KeyValue`: field 1 `key`, field 2 `value`).
#[derive(Debug, Clone, PartialEq)]
pub struct KeyValue {
    pub key: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FileMetaData {
    version: i32,
    num_rows: i64,
    created_by: Option<String>,
    key_value_metadata: Vec<KeyValue>,
    schema_descr: SchemaDescriptor,
    row_groups: Vec<RowGroupMetaData>,
}

impl FileMetaData {
    /// Translates a decoded `FileMetaData` Thrift struct (field ids: 1
    /// `version`, 2 `schema`, 3 `num_rows`, 4 `row_groups`, 5
    /// `key_value_metadata`, 6 `created_by`).
    pub fn try_from_thrift(root: &ThriftStruct) -> Result<Self> {
        let schema_elements = root.list(2)?;
        let elements: Vec<ThriftStruct> = schema_elements
            .iter()
            .map(|v| v.as_struct().map(|s| s.clone()))
            .collect::<Result<_>>()?;
        let tree = SchemaTree::build(&elements)?;
        let schema_descr = SchemaDescriptor::new(tree);

        let declared_num_rows = root.i64(3)?;
        let row_groups = root
            .list(4)?
            .iter()
            .map(|v| RowGroupMetaData::try_from_thrift(&schema_descr, v.as_struct()?))
            .collect::<Result<Vec<_>>>()?;

        let total_rows: i64 = row_groups.iter().map(|rg| rg.num_rows()).sum();
        let num_rows = if !row_groups.is_empty() && total_rows != declared_num_rows {
            tracing::warn!(
                declared = declared_num_rows,
                summed = total_rows,
                "FileMetaData.num_rows disagrees with the sum of row group row counts; \
                 trusting the row groups"
            );
            total_rows
        } else {
            declared_num_rows
        };

        let key_value_metadata = root
            .opt_list(5)
            .unwrap_or(&[])
            .iter()
            .map(|v| {
                let kv = v.as_struct()?;
                Ok(KeyValue {
                    key: kv.string(1)?,
                    value: kv.opt_string(2),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(FileMetaData {
            version: root.i32(1)?,
            num_rows,
            created_by: root.opt_string(6),
            key_value_metadata,
            schema_descr,
            row_groups,
        })
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn num_rows(&self) -> i64 {
        self.num_rows
    }

    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    pub fn key_value_metadata(&self) -> &[KeyValue] {
        &self.key_value_metadata
    }

    pub fn schema_descr(&self) -> &SchemaDescriptor {
        &self.schema_descr
    }

    pub fn row_groups(&self) -> &[RowGroupMetaData] {
        &self.row_groups
    }
}
