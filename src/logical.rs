//! Logical-type conversion (spec section 4.7): turning a physically decoded
//! scalar plus its converted/logical type annotation into a rich value.

use crate::schema::types::{ConvertedType, LogicalType, PhysicalType, TimeUnit};
use crate::types::int96_to_i64;

/// A physically decoded scalar, prior to logical conversion.
#[derive(Debug, Clone, Copy)]
pub enum RawValue<'a> {
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Int96([u8; 12]),
    Float(f32),
    Double(f64),
    ByteArray(&'a [u8]),
    FixedLenByteArray(&'a [u8]),
}

impl<'a> RawValue<'a> {
    /// Parses a statistics `min`/`max` byte string (a single PLAIN-encoded
    /// value, spec section 4.3 step 6).
    pub fn from_stat_bytes(
        physical: PhysicalType,
        type_length: Option<i32>,
        bytes: &'a [u8],
    ) -> crate::error::Result<Self> {
        Ok(match physical {
            PhysicalType::Boolean => RawValue::Boolean(bytes.first().copied().unwrap_or(0) != 0),
            PhysicalType::Int32 => RawValue::Int32(i32::from_le_bytes(
                bytes
                    .get(0..4)
                    .and_then(|b| b.try_into().ok())
                    .ok_or_else(|| truncated_err!("stat bytes too short for INT32"))?,
            )),
            PhysicalType::Int64 => RawValue::Int64(i64::from_le_bytes(
                bytes
                    .get(0..8)
                    .and_then(|b| b.try_into().ok())
                    .ok_or_else(|| truncated_err!("stat bytes too short for INT64"))?,
            )),
            PhysicalType::Int96 => RawValue::Int96(
                bytes
                    .get(0..12)
                    .and_then(|b| b.try_into().ok())
                    .ok_or_else(|| truncated_err!("stat bytes too short for INT96"))?,
            ),
            PhysicalType::Float => RawValue::Float(f32::from_le_bytes(
                bytes
                    .get(0..4)
                    .and_then(|b| b.try_into().ok())
                    .ok_or_else(|| truncated_err!("stat bytes too short for FLOAT"))?,
            )),
            PhysicalType::Double => RawValue::Double(f64::from_le_bytes(
                bytes
                    .get(0..8)
                    .and_then(|b| b.try_into().ok())
                    .ok_or_else(|| truncated_err!("stat bytes too short for DOUBLE"))?,
            )),
            PhysicalType::ByteArray => RawValue::ByteArray(bytes),
            PhysicalType::FixedLenByteArray => {
                if let Some(len) = type_length {
                    if bytes.len() != len as usize {
                        return Err(out_of_spec_err!(
                            "FIXED_LEN_BYTE_ARRAY stat value has {} bytes, type_length is {}",
                            bytes.len(),
                            len
                        ));
                    }
                }
                RawValue::FixedLenByteArray(bytes)
            }
        })
    }
}

/// A logically converted scalar (spec section 4.7's conversion table).
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalValue {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Int96Raw(i64),
    Float(f32),
    Double(f64),
    Bytes(Vec<u8>),
    String(String),
    /// Epoch days.
    Date(i32),
    /// Milliseconds since midnight.
    TimeMillis(i32),
    /// Sub-millisecond time unit, raw count since midnight.
    Time { value: i64, unit: TimeUnit },
    Timestamp {
        value: i64,
        unit: TimeUnit,
        is_adjusted_to_utc: bool,
    },
    /// Unscaled big integer and its `scale`; the rational value is
    /// `unscaled * 10^-scale`.
    Decimal { unscaled: i128, scale: i32 },
    Float16(f32),
    Uuid(String),
    Json(serde_json::Value),
    Geometry(serde_json::Value),
}

/// Per-logical-type conversion overrides (spec section 6, `parsers`):
/// keyed by the converted/logical type name (e.g. `"DECIMAL"`, `"UUID"`),
/// consulted ahead of the built-in table in [`convert`] for byte-backed raw
/// values (`ByteArray`/`FixedLenByteArray`).
#[derive(Default)]
pub struct ParserOverrides {
    overrides: std::collections::HashMap<String, Box<dyn Fn(&[u8]) -> crate::error::Result<LogicalValue> + Send + Sync>>,
}

impl ParserOverrides {
    pub fn register(
        &mut self,
        logical_type: impl Into<String>,
        f: impl Fn(&[u8]) -> crate::error::Result<LogicalValue> + Send + Sync + 'static,
    ) {
        self.overrides.insert(logical_type.into(), Box::new(f));
    }

    pub fn get(&self, logical_type: &str) -> Option<&(dyn Fn(&[u8]) -> crate::error::Result<LogicalValue> + Send + Sync)> {
        self.overrides.get(logical_type).map(|f| f.as_ref())
    }
}

/// The override-lookup key for a converted/logical type pair, matching the
/// names used in the Thrift `ConvertedType`/`LogicalType` enums.
fn logical_type_name(converted: Option<ConvertedType>, logical: Option<&LogicalType>) -> Option<&'static str> {
    use LogicalType as L;
    if let Some(l) = logical {
        return Some(match l {
            L::String => "STRING",
            L::Enum => "ENUM",
            L::Json => "JSON",
            L::Bson => "BSON",
            L::Geometry => "GEOMETRY",
            L::Date => "DATE",
            L::Time { .. } => "TIME",
            L::Timestamp { .. } => "TIMESTAMP",
            L::Integer { .. } => "INTEGER",
            L::Decimal { .. } => "DECIMAL",
            L::Float16 => "FLOAT16",
            L::Uuid => "UUID",
            L::Variant => "VARIANT",
        });
    }
    converted.map(|ct| match ct {
        ConvertedType::Utf8 => "UTF8",
        ConvertedType::Enum => "ENUM",
        ConvertedType::Json => "JSON",
        ConvertedType::Bson => "BSON",
        ConvertedType::Date => "DATE",
        ConvertedType::TimeMillis => "TIME_MILLIS",
        ConvertedType::TimeMicros => "TIME_MICROS",
        ConvertedType::TimestampMillis => "TIMESTAMP_MILLIS",
        ConvertedType::TimestampMicros => "TIMESTAMP_MICROS",
        ConvertedType::Decimal => "DECIMAL",
        ConvertedType::Interval => "INTERVAL",
        ConvertedType::Uint8 => "UINT_8",
        ConvertedType::Uint16 => "UINT_16",
        ConvertedType::Uint32 => "UINT_32",
        ConvertedType::Uint64 => "UINT_64",
        ConvertedType::Int8 => "INT_8",
        ConvertedType::Int16 => "INT_16",
        ConvertedType::Int32 => "INT_32",
        ConvertedType::Int64 => "INT_64",
    })
}

/// Converts a raw physical scalar into its logical representation, per the
/// table in spec section 4.7. `BSON` and `INTERVAL` are rejected with
/// [`crate::error::ParquetError::UnsupportedLogicalType`]. When `parsers`
/// holds an override registered for this column's converted/logical type
/// name and `raw` is byte-backed, the override runs instead of the built-in
/// table.
pub fn convert(
    raw: RawValue,
    converted: Option<ConvertedType>,
    logical: Option<&LogicalType>,
    parsers: Option<&ParserOverrides>,
) -> crate::error::Result<LogicalValue> {
    use LogicalType as L;

    if let Some(bytes) = match raw {
        RawValue::ByteArray(b) | RawValue::FixedLenByteArray(b) => Some(b),
        _ => None,
    } {
        if let Some(name) = logical_type_name(converted, logical) {
            if let Some(f) = parsers.and_then(|p| p.get(name)) {
                return f(bytes);
            }
        }
    }

    if let Some(L::Bson) | Some(L::Variant) = logical {
        // VARIANT has its own decoder (crate::variant); callers that need it
        // should route BYTE_ARRAY + VARIANT columns there instead of here.
        return Err(crate::error::ParquetError::UnsupportedLogicalType(
            "BSON/VARIANT have no scalar logical-value conversion".to_owned(),
        ));
    }
    if converted == Some(ConvertedType::Bson) || converted == Some(ConvertedType::Interval) {
        return Err(crate::error::ParquetError::UnsupportedLogicalType(format!(
            "{:?} is not supported",
            converted
        )));
    }

    match (raw, logical, converted) {
        (RawValue::ByteArray(b), Some(L::String), _)
        | (RawValue::ByteArray(b), Some(L::Enum), _)
        | (RawValue::ByteArray(b), _, Some(ConvertedType::Utf8))
        | (RawValue::ByteArray(b), _, Some(ConvertedType::Enum)) => {
            Ok(LogicalValue::String(std::str::from_utf8(b)?.to_owned()))
        }
        (RawValue::ByteArray(b), Some(L::Json), _) | (RawValue::ByteArray(b), _, Some(ConvertedType::Json)) => {
            Ok(LogicalValue::Json(serde_json::from_slice(b)?))
        }
        (RawValue::ByteArray(b), Some(L::Geometry), _) => {
            Ok(LogicalValue::Geometry(crate::geometry::wkb_to_geojson(b)?))
        }
        (RawValue::Int32(days), Some(L::Date), _) | (RawValue::Int32(days), _, Some(ConvertedType::Date)) => {
            Ok(LogicalValue::Date(days))
        }
        (RawValue::Int32(ms), _, Some(ConvertedType::TimeMillis)) => {
            Ok(LogicalValue::TimeMillis(ms))
        }
        (RawValue::Int32(v), Some(L::Time { unit, .. }), _) => {
            Ok(LogicalValue::Time { value: v as i64, unit: *unit })
        }
        (RawValue::Int64(v), Some(L::Time { unit, .. }), _) => {
            Ok(LogicalValue::Time { value: v, unit: *unit })
        }
        (RawValue::Int64(micros), _, Some(ConvertedType::TimeMicros)) => Ok(LogicalValue::Time {
            value: micros,
            unit: TimeUnit::Micros,
        }),
        (RawValue::Int64(v), Some(L::Timestamp { unit, is_adjusted_to_utc }), _) => {
            Ok(LogicalValue::Timestamp {
                value: v,
                unit: *unit,
                is_adjusted_to_utc: *is_adjusted_to_utc,
            })
        }
        (RawValue::Int64(ms), _, Some(ConvertedType::TimestampMillis)) => {
            Ok(LogicalValue::Timestamp {
                value: ms,
                unit: TimeUnit::Millis,
                is_adjusted_to_utc: true,
            })
        }
        (RawValue::Int64(us), _, Some(ConvertedType::TimestampMicros)) => {
            Ok(LogicalValue::Timestamp {
                value: us,
                unit: TimeUnit::Micros,
                is_adjusted_to_utc: true,
            })
        }
        (RawValue::Int32(v), Some(L::Integer { bit_width, is_signed }), _) => {
            Ok(LogicalValue::Int32(sign_or_zero_extend_32(v, *bit_width, *is_signed)))
        }
        (RawValue::Int32(v), _, Some(ct)) if is_legacy_int(ct) => {
            let (bit_width, is_signed) = legacy_int_width(ct);
            Ok(LogicalValue::Int32(sign_or_zero_extend_32(v, bit_width, is_signed)))
        }
        (RawValue::FixedLenByteArray(b), Some(L::Float16), _) | (RawValue::FixedLenByteArray(b), Some(L::Uuid), _) => {
            if matches!(logical, Some(L::Float16)) {
                Ok(LogicalValue::Float16(decode_float16(b)?))
            } else {
                Ok(LogicalValue::Uuid(format_uuid(b)?))
            }
        }
        (raw, Some(L::Decimal { scale, .. }), _) => decode_decimal(raw, *scale),
        (raw, _, Some(ConvertedType::Decimal)) => decode_decimal(raw, 0),
        (RawValue::Boolean(v), _, _) => Ok(LogicalValue::Boolean(v)),
        (RawValue::Int32(v), _, _) => Ok(LogicalValue::Int32(v)),
        (RawValue::Int64(v), _, _) => Ok(LogicalValue::Int64(v)),
        (RawValue::Int96(b), _, _) => Ok(LogicalValue::Int96Raw(int96_to_i64(b))),
        (RawValue::Float(v), _, _) => Ok(LogicalValue::Float(v)),
        (RawValue::Double(v), _, _) => Ok(LogicalValue::Double(v)),
        (RawValue::ByteArray(b), _, _) => Ok(LogicalValue::Bytes(b.to_vec())),
        (RawValue::FixedLenByteArray(b), _, _) => Ok(LogicalValue::Bytes(b.to_vec())),
    }
}

fn is_legacy_int(ct: ConvertedType) -> bool {
    use ConvertedType::*;
    matches!(ct, Uint8 | Uint16 | Uint32 | Uint64 | Int8 | Int16 | Int32 | Int64)
}

fn legacy_int_width(ct: ConvertedType) -> (i8, bool) {
    use ConvertedType::*;
    match ct {
        Uint8 => (8, false),
        Uint16 => (16, false),
        Uint32 => (32, false),
        Uint64 => (64, false),
        Int8 => (8, true),
        Int16 => (16, true),
        Int32 => (32, true),
        Int64 => (64, true),
        _ => (32, true),
    }
}

fn sign_or_zero_extend_32(v: i32, bit_width: i8, is_signed: bool) -> i32 {
    if bit_width >= 32 {
        return v;
    }
    let mask = (1i32 << bit_width) - 1;
    let truncated = v & mask;
    if is_signed && (truncated & (1 << (bit_width - 1))) != 0 {
        truncated | !mask
    } else {
        truncated
    }
}

fn decode_float16(bytes: &[u8]) -> crate::error::Result<f32> {
    if bytes.len() < 2 {
        return Err(truncated_err!("FLOAT16 value shorter than 2 bytes"));
    }
    let half = u16::from_le_bytes([bytes[0], bytes[1]]);
    Ok(half_to_f32(half))
}

fn half_to_f32(half: u16) -> f32 {
    let sign = (half >> 15) & 1;
    let exponent = (half >> 10) & 0x1F;
    let mantissa = half & 0x3FF;
    let value = if exponent == 0 {
        (mantissa as f32) * 2f32.powi(-24)
    } else if exponent == 0x1F {
        if mantissa == 0 {
            f32::INFINITY
        } else {
            f32::NAN
        }
    } else {
        (1.0 + mantissa as f32 / 1024.0) * 2f32.powi(exponent as i32 - 15)
    };
    if sign == 1 {
        -value
    } else {
        value
    }
}

fn format_uuid(bytes: &[u8]) -> crate::error::Result<String> {
    if bytes.len() != 16 {
        return Err(out_of_spec_err!(
            "UUID logical type value must be 16 bytes, got {}",
            bytes.len()
        ));
    }
    Ok(uuid::Uuid::from_slice(bytes)
        .map_err(|e| out_of_spec_err!("invalid UUID bytes: {}", e))?
        .to_string())
}

fn decode_decimal(raw: RawValue, scale: i32) -> crate::error::Result<LogicalValue> {
    let unscaled = match raw {
        RawValue::Int32(v) => v as i128,
        RawValue::Int64(v) => v as i128,
        RawValue::ByteArray(b) | RawValue::FixedLenByteArray(b) => be_twos_complement_to_i128(b)?,
        other => {
            return Err(out_of_spec_err!(
                "DECIMAL logical type applied to non-integer raw value {:?}",
                other
            ))
        }
    };
    Ok(LogicalValue::Decimal { unscaled, scale })
}

/// Parses an arbitrary-width big-endian two's-complement integer into an
/// `i128` (spec section 4.7, "BYTE_ARRAY path parses arbitrary-width signed
/// integer").
fn be_twos_complement_to_i128(bytes: &[u8]) -> crate::error::Result<i128> {
    if bytes.is_empty() {
        return Err(out_of_spec_err!("empty DECIMAL byte array"));
    }
    if bytes.len() > 16 {
        return Err(out_of_spec_err!(
            "DECIMAL byte array of {} bytes exceeds the 128-bit accumulator",
            bytes.len()
        ));
    }
    let negative = bytes[0] & 0x80 != 0;
    let mut buf = [if negative { 0xFFu8 } else { 0u8 }; 16];
    buf[16 - bytes.len()..].copy_from_slice(bytes);
    Ok(i128::from_be_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_utf8_byte_array() {
        let v = convert(RawValue::ByteArray(b"hello"), None, Some(&LogicalType::String), None).unwrap();
        assert_eq!(v, LogicalValue::String("hello".to_owned()));
    }

    #[test]
    fn converts_date() {
        let v = convert(RawValue::Int32(100), None, Some(&LogicalType::Date), None).unwrap();
        assert_eq!(v, LogicalValue::Date(100));
    }

    #[test]
    fn decimal_from_byte_array_two_s_complement() {
        // -1 encoded as a single 0xFF byte, scale 2 -> -0.01
        let v = convert(
            RawValue::ByteArray(&[0xFF]),
            None,
            Some(&LogicalType::Decimal { scale: 2, precision: 4 }),
            None,
        )
        .unwrap();
        assert_eq!(
            v,
            LogicalValue::Decimal {
                unscaled: -1,
                scale: 2
            }
        );
    }

    #[test]
    fn sign_extends_legacy_int8() {
        let v = convert(RawValue::Int32(-1i32 & 0xFF), Some(ConvertedType::Int8), None, None).unwrap();
        assert_eq!(v, LogicalValue::Int32(-1));
    }

    #[test]
    fn rejects_bson() {
        assert!(convert(RawValue::ByteArray(b"x"), None, Some(&LogicalType::Bson), None).is_err());
    }

    #[test]
    fn parser_override_wins_over_builtin_table() {
        let mut parsers = ParserOverrides::default();
        parsers.register("UUID", |_bytes| Ok(LogicalValue::String("overridden".to_owned())));
        let v = convert(
            RawValue::FixedLenByteArray(&[0u8; 16]),
            None,
            Some(&LogicalType::Uuid),
            Some(&parsers),
        )
        .unwrap();
        assert_eq!(v, LogicalValue::String("overridden".to_owned()));
    }
}
