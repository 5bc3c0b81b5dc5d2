//! The leaf-level vocabulary of a `SchemaElement` (spec section 3):
//! physical/converted/logical types and repetition kind, translated from
//! their Thrift wire representation.

use crate::error::Result;
use crate::thrift::value::{ThriftStruct, ThriftValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicalType {
    Boolean,
    Int32,
    Int64,
    Int96,
    Float,
    Double,
    ByteArray,
    FixedLenByteArray,
}

impl PhysicalType {
    fn from_thrift_id(id: i32) -> Result<Self> {
        Ok(match id {
            0 => PhysicalType::Boolean,
            1 => PhysicalType::Int32,
            2 => PhysicalType::Int64,
            3 => PhysicalType::Int96,
            4 => PhysicalType::Float,
            5 => PhysicalType::Double,
            6 => PhysicalType::ByteArray,
            7 => PhysicalType::FixedLenByteArray,
            other => return Err(out_of_spec_err!("unknown physical type id {}", other)),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repetition {
    Required,
    Optional,
    Repeated,
}

impl Repetition {
    fn from_thrift_id(id: i32) -> Result<Self> {
        Ok(match id {
            0 => Repetition::Required,
            1 => Repetition::Optional,
            2 => Repetition::Repeated,
            other => return Err(out_of_spec_err!("unknown repetition id {}", other)),
        })
    }
}

/// The legacy `ConvertedType` enum, kept alongside `LogicalType` since older
/// writers only populate this field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertedType {
    Utf8,
    Map,
    MapKeyValue,
    List,
    Enum,
    Decimal,
    Date,
    TimeMillis,
    TimeMicros,
    TimestampMillis,
    TimestampMicros,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Int8,
    Int16,
    Int32,
    Int64,
    Json,
    Bson,
    Interval,
}

impl ConvertedType {
    fn from_thrift_id(id: i32) -> Result<Self> {
        use ConvertedType::*;
        Ok(match id {
            0 => Utf8,
            1 => Map,
            2 => MapKeyValue,
            3 => List,
            4 => Enum,
            5 => Decimal,
            6 => Date,
            7 => TimeMillis,
            8 => TimeMicros,
            9 => TimestampMillis,
            10 => TimestampMicros,
            11 => Uint8,
            12 => Uint16,
            13 => Uint32,
            14 => Uint64,
            15 => Int8,
            16 => Int16,
            17 => Int32,
            18 => Int64,
            19 => Json,
            20 => Bson,
            21 => Interval,
            other => return Err(out_of_spec_err!("unknown converted type id {}", other)),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Millis,
    Micros,
    Nanos,
}

/// The modern `LogicalType` union (spec section 3). `String`/`Json`/`Bson`
/// etc. carry no payload; the ones below do.
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalType {
    String,
    Map,
    List,
    Enum,
    Decimal { scale: i32, precision: i32 },
    Date,
    Time { unit: TimeUnit, is_adjusted_to_utc: bool },
    Timestamp { unit: TimeUnit, is_adjusted_to_utc: bool },
    Integer { bit_width: i8, is_signed: bool },
    Null,
    Json,
    Bson,
    Uuid,
    Float16,
    Variant,
    Geometry,
}

impl LogicalType {
    fn from_thrift(value: &ThriftValue) -> Result<Self> {
        let s = value.as_struct()?;
        // a Thrift union is wire-compatible with a struct carrying exactly
        // one populated field; the field id is the tag.
        let (tag, _) = s
            .fields
            .iter()
            .next()
            .ok_or_else(|| out_of_spec_err!("empty LogicalType union"))?;
        Ok(match tag {
            1 => LogicalType::String,
            2 => LogicalType::Map,
            3 => LogicalType::List,
            4 => LogicalType::Enum,
            5 => {
                let decimal = s.struct_(5)?;
                LogicalType::Decimal {
                    scale: decimal.i32(1)?,
                    precision: decimal.i32(2)?,
                }
            }
            6 => LogicalType::Date,
            7 => {
                let time = s.struct_(7)?;
                LogicalType::Time {
                    is_adjusted_to_utc: time.bool(1)?,
                    unit: parse_time_unit(time.struct_(2)?)?,
                }
            }
            8 => {
                let ts = s.struct_(8)?;
                LogicalType::Timestamp {
                    is_adjusted_to_utc: ts.bool(1)?,
                    unit: parse_time_unit(ts.struct_(2)?)?,
                }
            }
            10 => {
                let int = s.struct_(10)?;
                LogicalType::Integer {
                    bit_width: int.i32(1)? as i8,
                    is_signed: int.bool(2)?,
                }
            }
            11 => LogicalType::Null,
            12 => LogicalType::Json,
            13 => LogicalType::Bson,
            14 => LogicalType::Uuid,
            15 => LogicalType::Float16,
            16 => LogicalType::Variant,
            17 => LogicalType::Geometry,
            other => return Err(out_of_spec_err!("unknown LogicalType tag {}", other)),
        })
    }
}

fn parse_time_unit(s: &ThriftStruct) -> Result<TimeUnit> {
    let (tag, _) = s
        .fields
        .iter()
        .next()
        .ok_or_else(|| out_of_spec_err!("empty TimeUnit union"))?;
    Ok(match tag {
        1 => TimeUnit::Millis,
        2 => TimeUnit::Micros,
        3 => TimeUnit::Nanos,
        other => return Err(out_of_spec_err!("unknown TimeUnit tag {}", other)),
    })
}

/// A translated `SchemaElement` (spec section 3).
#[derive(Debug, Clone)]
pub struct SchemaElement {
    pub name: String,
    pub physical_type: Option<PhysicalType>,
    pub type_length: Option<i32>,
    pub repetition: Repetition,
    pub num_children: Option<i32>,
    pub converted_type: Option<ConvertedType>,
    pub scale: Option<i32>,
    pub precision: Option<i32>,
    pub field_id: Option<i32>,
    pub logical_type: Option<LogicalType>,
}

impl SchemaElement {
    pub fn from_thrift(s: &ThriftStruct) -> Result<Self> {
        let physical_type = match s.opt_i32(1) {
            Some(id) => Some(PhysicalType::from_thrift_id(id)?),
            None => None,
        };
        let repetition = match s.opt_i32(3) {
            Some(id) => Repetition::from_thrift_id(id)?,
            // the root element carries no repetition_type.
            None => Repetition::Required,
        };
        let converted_type = match s.opt_i32(6) {
            Some(id) => Some(ConvertedType::from_thrift_id(id)?),
            None => None,
        };
        let logical_type = match s.get(10) {
            Some(v) => Some(LogicalType::from_thrift(v)?),
            None => None,
        };
        Ok(SchemaElement {
            name: s.string(4)?,
            physical_type,
            type_length: s.opt_i32(2),
            repetition,
            num_children: s.opt_i32(5),
            converted_type,
            scale: s.opt_i32(7),
            precision: s.opt_i32(8),
            field_id: s.opt_i32(9),
            logical_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn decodes_a_required_int32_leaf() {
        let mut fields = HashMap::new();
        fields.insert(1, ThriftValue::I32(1)); // INT32
        fields.insert(3, ThriftValue::I32(0)); // REQUIRED
        fields.insert(4, ThriftValue::Binary(b"a".to_vec()));
        let element = SchemaElement::from_thrift(&ThriftStruct { fields }).unwrap();
        assert_eq!(element.physical_type, Some(PhysicalType::Int32));
        assert_eq!(element.repetition, Repetition::Required);
        assert_eq!(element.name, "a");
    }

    #[test]
    fn decodes_decimal_logical_type() {
        let mut inner = HashMap::new();
        inner.insert(1, ThriftValue::I32(2));
        inner.insert(2, ThriftValue::I32(9));
        let mut logical_fields = HashMap::new();
        logical_fields.insert(5, ThriftValue::Struct(ThriftStruct { fields: inner }));

        let mut fields = HashMap::new();
        fields.insert(1, ThriftValue::I32(6)); // BYTE_ARRAY
        fields.insert(3, ThriftValue::I32(0));
        fields.insert(4, ThriftValue::Binary(b"amount".to_vec()));
        fields.insert(
            10,
            ThriftValue::Struct(ThriftStruct {
                fields: logical_fields,
            }),
        );
        let element = SchemaElement::from_thrift(&ThriftStruct { fields }).unwrap();
        assert_eq!(
            element.logical_type,
            Some(LogicalType::Decimal {
                scale: 2,
                precision: 9
            })
        );
    }
}
