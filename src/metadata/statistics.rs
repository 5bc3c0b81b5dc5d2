//! Eager statistics decoding (spec section 4.3, step 6): a column chunk's
//! (or page's) `min`/`max` byte strings are single PLAIN-encoded values,
//! decoded here using the owning column's physical and logical type so
//! filter pruning (spec section 4.11) can compare typed values directly.

use crate::error::Result;
use crate::logical::{self, LogicalValue, RawValue};
use crate::schema::SchemaElement;
use crate::thrift::value::ThriftStruct;

/// Decoded statistics for one column chunk or page.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub min: Option<LogicalValue>,
    pub max: Option<LogicalValue>,
    pub null_count: Option<i64>,
    pub distinct_count: Option<i64>,
    pub is_min_exact: bool,
    pub is_max_exact: bool,
}

impl Statistics {
    /// Translates a Thrift `Statistics` struct (field ids: 1 `max` (legacy,
    /// unsigned byte order), 2 `min` (legacy), 3 `null_count`, 4
    /// `distinct_count`, 5 `max_value`, 6 `min_value`, 7 `is_max_value_exact`,
    /// 8 `is_min_value_exact`). The modern `min_value`/`max_value` fields are
    /// preferred when present; the legacy `min`/`max` pair is used only as a
    /// fallback for older writers.
    pub fn from_thrift(s: &ThriftStruct, element: &SchemaElement) -> Result<Option<Self>> {
        let min_bytes = s.opt_binary(6).or_else(|| s.opt_binary(2));
        let max_bytes = s.opt_binary(5).or_else(|| s.opt_binary(1));
        let null_count = s.opt_i64(3);
        let distinct_count = s.opt_i64(4);
        if min_bytes.is_none()
            && max_bytes.is_none()
            && null_count.is_none()
            && distinct_count.is_none()
        {
            return Ok(None);
        }
        let physical = match element.physical_type {
            Some(p) => p,
            None => return Ok(None),
        };
        let min = min_bytes
            .map(|b| decode_stat(physical, element, b))
            .transpose()?;
        let max = max_bytes
            .map(|b| decode_stat(physical, element, b))
            .transpose()?;
        Ok(Some(Statistics {
            min,
            max,
            null_count,
            distinct_count,
            is_min_exact: s.opt_bool(8).unwrap_or(true),
            is_max_exact: s.opt_bool(7).unwrap_or(true),
        }))
    }
}

fn decode_stat(
    physical: crate::schema::PhysicalType,
    element: &SchemaElement,
    bytes: &[u8],
) -> Result<LogicalValue> {
    let raw = RawValue::from_stat_bytes(physical, element.type_length, bytes)?;
    logical::convert(raw, element.converted_type, element.logical_type.as_ref(), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PhysicalType, Repetition};
    use crate::thrift::value::ThriftValue;
    use std::collections::HashMap;

    fn int32_element() -> SchemaElement {
        SchemaElement {
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
        }
    }

    #[test]
    fn decodes_modern_min_max_fields() {
        let mut fields = HashMap::new();
        fields.insert(6, ThriftValue::Binary(1i32.to_le_bytes().to_vec()));
        fields.insert(5, ThriftValue::Binary(9i32.to_le_bytes().to_vec()));
        fields.insert(3, ThriftValue::I64(0));
        let stats = Statistics::from_thrift(&ThriftStruct { fields }, &int32_element())
            .unwrap()
            .unwrap();
        assert_eq!(stats.min, Some(LogicalValue::Int32(1)));
        assert_eq!(stats.max, Some(LogicalValue::Int32(9)));
        assert_eq!(stats.null_count, Some(0));
    }

    #[test]
    fn absent_statistics_struct_yields_none() {
        let stats = Statistics::from_thrift(&ThriftStruct::default(), &int32_element()).unwrap();
        assert!(stats.is_none());
    }
}
