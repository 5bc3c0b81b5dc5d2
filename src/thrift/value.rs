use std::collections::HashMap;

use crate::error::{ParquetError, Result};

/// A decoded Thrift value. `Map`/`Set`/`Uuid` are never produced: Parquet
/// never uses them, and a compact-protocol reader that meets one raises
/// [`ParquetError::UnsupportedLogicalType`]-shaped `UnsupportedThriftType`
/// (modeled here as [`ParquetError::OutOfSpec`], since it indicates a file
/// outside what this decoder's target format can contain).
#[derive(Debug, Clone, PartialEq)]
pub enum ThriftValue {
    Bool(bool),
    Byte(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Double(f64),
    Binary(Vec<u8>),
    List(Vec<ThriftValue>),
    Struct(ThriftStruct),
}

/// A struct decoded into a key-indexed mapping `field_id -> value`, per
/// spec section 4.2.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThriftStruct {
    pub fields: HashMap<i16, ThriftValue>,
}

impl ThriftStruct {
    pub fn get(&self, id: i16) -> Option<&ThriftValue> {
        self.fields.get(&id)
    }

    pub fn i32(&self, id: i16) -> Result<i32> {
        match self.get(id) {
            Some(ThriftValue::I32(v)) => Ok(*v),
            Some(ThriftValue::I16(v)) => Ok(*v as i32),
            Some(ThriftValue::Byte(v)) => Ok(*v as i32),
            other => Err(out_of_spec_err!(
                "expected i32 thrift field {}, found {:?}",
                id,
                other
            )),
        }
    }

    pub fn opt_i32(&self, id: i16) -> Option<i32> {
        self.i32(id).ok()
    }

    pub fn i64(&self, id: i16) -> Result<i64> {
        match self.get(id) {
            Some(ThriftValue::I64(v)) => Ok(*v),
            Some(ThriftValue::I32(v)) => Ok(*v as i64),
            Some(ThriftValue::I16(v)) => Ok(*v as i64),
            Some(ThriftValue::Byte(v)) => Ok(*v as i64),
            other => Err(out_of_spec_err!(
                "expected i64 thrift field {}, found {:?}",
                id,
                other
            )),
        }
    }

    pub fn opt_i64(&self, id: i16) -> Option<i64> {
        self.i64(id).ok()
    }

    pub fn bool(&self, id: i16) -> Result<bool> {
        match self.get(id) {
            Some(ThriftValue::Bool(v)) => Ok(*v),
            other => Err(out_of_spec_err!(
                "expected bool thrift field {}, found {:?}",
                id,
                other
            )),
        }
    }

    pub fn opt_bool(&self, id: i16) -> Option<bool> {
        match self.get(id) {
            Some(ThriftValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn binary(&self, id: i16) -> Result<&[u8]> {
        match self.get(id) {
            Some(ThriftValue::Binary(v)) => Ok(v),
            other => Err(out_of_spec_err!(
                "expected binary thrift field {}, found {:?}",
                id,
                other
            )),
        }
    }

    pub fn opt_binary(&self, id: i16) -> Option<&[u8]> {
        match self.get(id) {
            Some(ThriftValue::Binary(v)) => Some(v),
            _ => None,
        }
    }

    pub fn string(&self, id: i16) -> Result<String> {
        Ok(String::from_utf8(self.binary(id)?.to_vec())?)
    }

    pub fn opt_string(&self, id: i16) -> Option<String> {
        self.opt_binary(id)
            .and_then(|b| String::from_utf8(b.to_vec()).ok())
    }

    pub fn struct_(&self, id: i16) -> Result<&ThriftStruct> {
        match self.get(id) {
            Some(ThriftValue::Struct(v)) => Ok(v),
            other => Err(out_of_spec_err!(
                "expected struct thrift field {}, found {:?}",
                id,
                other
            )),
        }
    }

    pub fn opt_struct(&self, id: i16) -> Option<&ThriftStruct> {
        match self.get(id) {
            Some(ThriftValue::Struct(v)) => Some(v),
            _ => None,
        }
    }

    pub fn list(&self, id: i16) -> Result<&[ThriftValue]> {
        match self.get(id) {
            Some(ThriftValue::List(v)) => Ok(v),
            other => Err(out_of_spec_err!(
                "expected list thrift field {}, found {:?}",
                id,
                other
            )),
        }
    }

    pub fn opt_list(&self, id: i16) -> Option<&[ThriftValue]> {
        match self.get(id) {
            Some(ThriftValue::List(v)) => Some(v),
            _ => None,
        }
    }
}

impl ThriftValue {
    pub fn as_struct(&self) -> Result<&ThriftStruct> {
        match self {
            ThriftValue::Struct(s) => Ok(s),
            other => Err(out_of_spec_err!("expected struct, found {:?}", other)),
        }
    }

    pub fn as_i32(&self) -> Result<i32> {
        match self {
            ThriftValue::I32(v) => Ok(*v),
            ThriftValue::I16(v) => Ok(*v as i32),
            ThriftValue::Byte(v) => Ok(*v as i32),
            other => Err(out_of_spec_err!("expected i32, found {:?}", other)),
        }
    }

    pub fn as_binary(&self) -> Result<&[u8]> {
        match self {
            ThriftValue::Binary(v) => Ok(v),
            other => Err(out_of_spec_err!("expected binary, found {:?}", other)),
        }
    }
}

/// Raised when the decoder reaches a Thrift wire type that Parquet never
/// uses (`MAP`, `SET`, `UUID`).
pub(crate) fn unsupported_thrift_type(type_id: u8) -> ParquetError {
    ParquetError::OutOfSpec(format!(
        "UnsupportedThriftType: compact protocol type {} is unreachable in Parquet",
        type_id
    ))
}
