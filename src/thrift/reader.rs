use super::value::{unsupported_thrift_type, ThriftStruct, ThriftValue};
use crate::error::Result;

// Compact-protocol wire types (Thrift's `TType` compact encoding).
const C_STOP: u8 = 0x00;
const C_BOOLEAN_TRUE: u8 = 0x01;
const C_BOOLEAN_FALSE: u8 = 0x02;
const C_BYTE: u8 = 0x03;
const C_I16: u8 = 0x04;
const C_I32: u8 = 0x05;
const C_I64: u8 = 0x06;
const C_DOUBLE: u8 = 0x07;
const C_BINARY: u8 = 0x08;
const C_LIST: u8 = 0x09;
const C_SET: u8 = 0x0A;
const C_MAP: u8 = 0x0B;
const C_STRUCT: u8 = 0x0C;
const C_UUID: u8 = 0x0D;

/// A cursor over an in-memory Thrift-compact-protocol byte stream.
///
/// Every `read_*` method advances the cursor by exactly the number of bytes
/// it consumed and returns `Err` rather than panicking on truncated input.
pub struct CompactProtocolReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> CompactProtocolReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Number of bytes consumed so far.
    pub fn consumed(&self) -> usize {
        self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.pos + n > self.buf.len() {
            return Err(truncated_err!(
                "thrift compact protocol: need {} bytes at offset {}, only {} available",
                n,
                self.pos,
                self.buf.len() - self.pos
            ));
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn read_byte(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Unsigned LEB128 varint, widened to a 128-bit accumulator: Thrift's
    /// compact `i64` is zig-zag over up to 10 continuation bytes (70 raw
    /// bits), so a 64-bit accumulator can overflow on malformed input
    /// before the final right-shift narrows it back down (spec section
    /// 4.2 / design notes).
    fn read_varint(&mut self) -> Result<u128> {
        let mut result: u128 = 0;
        let mut shift = 0u32;
        loop {
            let byte = self.read_byte()?;
            result |= ((byte & 0x7F) as u128) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
            if shift > 140 {
                return Err(truncated_err!("thrift varint longer than 20 bytes"));
            }
        }
        Ok(result)
    }

    fn read_zigzag_i64(&mut self) -> Result<i64> {
        let u = self.read_varint()? as u64;
        Ok(((u >> 1) as i64) ^ -((u & 1) as i64))
    }

    fn read_zigzag_i32(&mut self) -> Result<i32> {
        Ok(self.read_zigzag_i64()? as i32)
    }

    fn read_zigzag_i16(&mut self) -> Result<i16> {
        Ok(self.read_zigzag_i64()? as i16)
    }

    fn read_double(&mut self) -> Result<f64> {
        let bytes: [u8; 8] = self.take(8)?.try_into().unwrap();
        Ok(f64::from_le_bytes(bytes))
    }

    fn read_binary(&mut self) -> Result<Vec<u8>> {
        let len = self.read_varint()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    /// Reads one value of the given compact wire type. `bool_value` is
    /// `Some` only when the caller already consumed a `BOOLEAN_TRUE`/
    /// `BOOLEAN_FALSE` field header (booleans outside of struct fields,
    /// e.g. inside a list, still carry a one-byte element type and must be
    /// read as a value, not folded into a header nibble).
    fn read_value(&mut self, type_id: u8) -> Result<ThriftValue> {
        Ok(match type_id {
            C_BOOLEAN_TRUE => ThriftValue::Bool(true),
            C_BOOLEAN_FALSE => ThriftValue::Bool(false),
            C_BYTE => ThriftValue::Byte(self.read_byte()? as i8),
            C_I16 => ThriftValue::I16(self.read_zigzag_i16()?),
            C_I32 => ThriftValue::I32(self.read_zigzag_i32()?),
            C_I64 => ThriftValue::I64(self.read_zigzag_i64()?),
            C_DOUBLE => ThriftValue::Double(self.read_double()?),
            C_BINARY => ThriftValue::Binary(self.read_binary()?),
            C_LIST => ThriftValue::List(self.read_list()?),
            C_STRUCT => ThriftValue::Struct(self.read_struct()?),
            C_SET | C_MAP | C_UUID => return Err(unsupported_thrift_type(type_id)),
            other => return Err(unsupported_thrift_type(other)),
        })
    }

    fn read_list(&mut self) -> Result<Vec<ThriftValue>> {
        let header = self.read_byte()?;
        let elem_type = header & 0x0F;
        let mut size = (header >> 4) as u64;
        if size == 15 {
            size = self.read_varint()? as u64;
        }
        let mut out = Vec::with_capacity(size as usize);
        for _ in 0..size {
            out.push(self.read_value(elem_type)?);
        }
        Ok(out)
    }

    /// Reads a Thrift compact-protocol struct: a sequence of field headers
    /// followed by their values, terminated by a `STOP` byte.
    ///
    /// The field-id delta is carried in the header's high nibble; a delta
    /// of zero means the full zig-zag field id follows as its own varint
    /// (spec section 4.2).
    pub fn read_struct(&mut self) -> Result<ThriftStruct> {
        let mut fields = std::collections::HashMap::new();
        let mut last_field_id: i16 = 0;
        loop {
            let header = self.read_byte()?;
            if header == C_STOP {
                break;
            }
            let delta = (header & 0xF0) >> 4;
            let type_id = header & 0x0F;
            let field_id = if delta == 0 {
                let id = self.read_zigzag_i16()?;
                last_field_id = id;
                id
            } else {
                last_field_id += delta as i16;
                last_field_id
            };
            let value = self.read_value(type_id)?;
            fields.insert(field_id, value);
        }
        Ok(ThriftStruct { fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_flat_struct() {
        // field 1 (i32, delta=1) = 5; field 2 (bool true, delta=1); STOP
        let data = [0x15, 0x0A, 0x21, 0x00];
        let mut r = CompactProtocolReader::new(&data);
        let s = r.read_struct().unwrap();
        assert_eq!(s.i32(1).unwrap(), 5);
        assert!(s.bool(2).unwrap());
        assert_eq!(r.consumed(), data.len());
    }

    #[test]
    fn decodes_nested_struct_and_list() {
        // field 1 (list<i32>, delta=1): [1, 2, 3]; STOP
        // list header: (3 << 4 | I32) = 0x35, then zigzag(1)=2, zigzag(2)=4, zigzag(3)=6
        let data = [0x19, 0x35, 0x02, 0x04, 0x06, 0x00];
        let mut r = CompactProtocolReader::new(&data);
        let s = r.read_struct().unwrap();
        let list = s.list(1).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].as_i32().unwrap(), 1);
        assert_eq!(list[2].as_i32().unwrap(), 3);
    }

    #[test]
    fn delta_zero_reads_full_field_id() {
        // delta=0, type=I32 (0x05), then zigzag field id 20 -> zigzag(20)=40=0x28
        // then value zigzag(7)=14=0x0E
        let data = [0x05, 0x28, 0x0E, 0x00];
        let mut r = CompactProtocolReader::new(&data);
        let s = r.read_struct().unwrap();
        assert_eq!(s.i32(20).unwrap(), 7);
    }

    #[test]
    fn truncated_input_errors() {
        let data = [0x15];
        let mut r = CompactProtocolReader::new(&data);
        assert!(r.read_struct().is_err());
    }
}
