//! WKB (Well-Known Binary) → GeoJSON conversion (spec section 4.10),
//! invoked by the logical-type converter for `BYTE_ARRAY + GEOMETRY`
//! columns.
//!
//! Layout: one byte-order byte, then a 4-byte type code whose high bits
//! encode `Z`/`M`/`SRID` dimensionality (the modern ISO flags, bits 0x8000
//! for Z, 0x4000 for M) as well as the older `+1000`/`+2000`/`+3000`
//! dimensional offsets used by some writers. The low two decimal digits of
//! the type code select the geometry kind (1=Point .. 7=GeometryCollection).
//! Each element of a `Multi*`/`GeometryCollection` carries its own
//! endianness and type bytes, exactly like a top-level geometry.

use crate::error::Result;
use serde_json::{json, Value};

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    little_endian: bool,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            little_endian: true,
        }
    }

    fn read_u8(&mut self) -> Result<u8> {
        let b = *self
            .data
            .get(self.pos)
            .ok_or_else(|| truncated_err!("WKB: truncated input"))?;
        self.pos += 1;
        Ok(b)
    }

    fn read_u32(&mut self) -> Result<u32> {
        let bytes: [u8; 4] = self
            .data
            .get(self.pos..self.pos + 4)
            .ok_or_else(|| truncated_err!("WKB: truncated u32"))?
            .try_into()
            .unwrap();
        self.pos += 4;
        Ok(if self.little_endian {
            u32::from_le_bytes(bytes)
        } else {
            u32::from_be_bytes(bytes)
        })
    }

    fn read_f64(&mut self) -> Result<f64> {
        let bytes: [u8; 8] = self
            .data
            .get(self.pos..self.pos + 8)
            .ok_or_else(|| truncated_err!("WKB: truncated f64"))?
            .try_into()
            .unwrap();
        self.pos += 8;
        Ok(if self.little_endian {
            f64::from_le_bytes(bytes)
        } else {
            f64::from_be_bytes(bytes)
        })
    }

    fn read_header(&mut self) -> Result<(u32, bool, bool)> {
        let endian = self.read_u8()?;
        self.little_endian = endian != 0;
        let raw_type = self.read_u32()?;
        let mut has_z = raw_type & 0x8000_0000 != 0;
        let mut has_m = raw_type & 0x4000_0000 != 0;
        let has_srid = raw_type & 0x2000_0000 != 0;
        let mut kind = raw_type & 0xFFFF;
        if has_srid {
            self.read_u32()?; // SRID, not represented in GeoJSON
        }
        // legacy dimensional offsets.
        if kind >= 3000 {
            has_z = true;
            has_m = true;
            kind -= 3000;
        } else if kind >= 2000 {
            has_m = true;
            kind -= 2000;
        } else if kind >= 1000 {
            has_z = true;
            kind -= 1000;
        }
        Ok((kind, has_z, has_m))
    }

    fn read_point(&mut self, has_z: bool, has_m: bool) -> Result<Vec<f64>> {
        let mut coords = vec![self.read_f64()?, self.read_f64()?];
        if has_z {
            coords.push(self.read_f64()?);
        }
        if has_m {
            coords.push(self.read_f64()?);
        }
        Ok(coords)
    }

    fn read_points(&mut self, has_z: bool, has_m: bool) -> Result<Vec<Vec<f64>>> {
        let count = self.read_u32()?;
        (0..count).map(|_| self.read_point(has_z, has_m)).collect()
    }

    fn read_rings(&mut self, has_z: bool, has_m: bool) -> Result<Vec<Vec<Vec<f64>>>> {
        let count = self.read_u32()?;
        (0..count).map(|_| self.read_points(has_z, has_m)).collect()
    }
}

/// Decodes a WKB-encoded geometry into a GeoJSON `Value`.
pub fn wkb_to_geojson(data: &[u8]) -> Result<Value> {
    let mut cursor = Cursor::new(data);
    decode_geometry(&mut cursor)
}

fn decode_geometry(cursor: &mut Cursor) -> Result<Value> {
    let (kind, has_z, has_m) = cursor.read_header()?;
    Ok(match kind {
        1 => json!({
            "type": "Point",
            "coordinates": cursor.read_point(has_z, has_m)?,
        }),
        2 => json!({
            "type": "LineString",
            "coordinates": cursor.read_points(has_z, has_m)?,
        }),
        3 => json!({
            "type": "Polygon",
            "coordinates": cursor.read_rings(has_z, has_m)?,
        }),
        4 => {
            let count = cursor.read_u32()?;
            let mut points = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let element = decode_geometry(cursor)?;
                points.push(element["coordinates"].clone());
            }
            json!({ "type": "MultiPoint", "coordinates": points })
        }
        5 => {
            let count = cursor.read_u32()?;
            let mut lines = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let element = decode_geometry(cursor)?;
                lines.push(element["coordinates"].clone());
            }
            json!({ "type": "MultiLineString", "coordinates": lines })
        }
        6 => {
            let count = cursor.read_u32()?;
            let mut polygons = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let element = decode_geometry(cursor)?;
                polygons.push(element["coordinates"].clone());
            }
            json!({ "type": "MultiPolygon", "coordinates": polygons })
        }
        7 => {
            let count = cursor.read_u32()?;
            let mut geometries = Vec::with_capacity(count as usize);
            for _ in 0..count {
                geometries.push(decode_geometry(cursor)?);
            }
            json!({ "type": "GeometryCollection", "geometries": geometries })
        }
        other => return Err(out_of_spec_err!("WKB: unknown geometry type code {}", other)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_wkb(x: f64, y: f64) -> Vec<u8> {
        let mut out = vec![1u8]; // little-endian
        out.extend_from_slice(&1u32.to_le_bytes()); // Point
        out.extend_from_slice(&x.to_le_bytes());
        out.extend_from_slice(&y.to_le_bytes());
        out
    }

    #[test]
    fn decodes_a_point() {
        let geojson = wkb_to_geojson(&point_wkb(1.5, -2.5)).unwrap();
        assert_eq!(geojson["type"], "Point");
        assert_eq!(geojson["coordinates"], json!([1.5, -2.5]));
    }

    #[test]
    fn decodes_a_multipoint_of_two_points() {
        let mut data = vec![1u8];
        data.extend_from_slice(&4u32.to_le_bytes()); // MultiPoint
        data.extend_from_slice(&2u32.to_le_bytes()); // 2 elements
        data.extend_from_slice(&point_wkb(0.0, 0.0));
        data.extend_from_slice(&point_wkb(1.0, 1.0));
        let geojson = wkb_to_geojson(&data).unwrap();
        assert_eq!(geojson["type"], "MultiPoint");
        assert_eq!(geojson["coordinates"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn rejects_unknown_type_code() {
        let mut data = vec![1u8];
        data.extend_from_slice(&99u32.to_le_bytes());
        assert!(wkb_to_geojson(&data).is_err());
    }
}
