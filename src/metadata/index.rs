//! Page-level offset and column indexes (spec section 3, `OffsetIndex` /
//! `ColumnIndex`), fetched on demand via a chunk's
//! `offset_index_offset`/`column_index_offset` byte ranges rather than
//! being embedded in `FileMetaData`.

use crate::error::Result;
use crate::logical::{self, LogicalValue, RawValue};
use crate::schema::SchemaElement;
use crate::thrift::reader::CompactProtocolReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryOrder {
    Unordered,
    Ascending,
    Descending,
}

impl BoundaryOrder {
    fn from_thrift_id(id: i32) -> Result<Self> {
        Ok(match id {
            0 => BoundaryOrder::Unordered,
            1 => BoundaryOrder::Ascending,
            2 => BoundaryOrder::Descending,
            other => return Err(out_of_spec_err!("unknown BoundaryOrder id {}", other)),
        })
    }
}

/// One page's location inside its column chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLocation {
    pub offset: i64,
    pub compressed_page_size: i32,
    pub first_row_index: i64,
}

/// Decoded `OffsetIndex`: lets the reader fetch only the pages overlapping
/// a row selection instead of the whole chunk (spec section 4.9).
#[derive(Debug, Clone)]
pub struct OffsetIndex {
    pub page_locations: Vec<PageLocation>,
}

impl OffsetIndex {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = CompactProtocolReader::new(data);
        let s = reader.read_struct()?;
        let page_locations = s
            .list(1)?
            .iter()
            .map(|v| {
                let loc = v.as_struct()?;
                Ok(PageLocation {
                    offset: loc.i64(1)?,
                    compressed_page_size: loc.i32(2)?,
                    first_row_index: loc.i64(3)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(OffsetIndex { page_locations })
    }

    /// The pages whose row range overlaps `[row_start, row_end)`, given the
    /// chunk's total row count (needed for the last page's implicit end).
    pub fn pages_overlapping(
        &self,
        row_start: i64,
        row_end: i64,
        total_rows: i64,
    ) -> Vec<(usize, &PageLocation)> {
        self.page_locations
            .iter()
            .enumerate()
            .filter(|(i, loc)| {
                let next_start = self
                    .page_locations
                    .get(i + 1)
                    .map(|n| n.first_row_index)
                    .unwrap_or(total_rows);
                loc.first_row_index < row_end && next_start > row_start
            })
            .collect()
    }
}

/// Per-page min/max/null-count summary (spec section 3's `ColumnIndex`).
#[derive(Debug, Clone, PartialEq)]
pub struct PageIndexEntry {
    pub min: Option<LogicalValue>,
    pub max: Option<LogicalValue>,
    pub null_count: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct ColumnIndex {
    pub pages: Vec<PageIndexEntry>,
    pub boundary_order: BoundaryOrder,
}

impl ColumnIndex {
    pub fn parse(data: &[u8], element: &SchemaElement) -> Result<Self> {
        let mut reader = CompactProtocolReader::new(data);
        let s = reader.read_struct()?;
        let null_pages = s.list(1)?;
        let min_values = s.list(2)?;
        let max_values = s.list(3)?;
        let boundary_order = BoundaryOrder::from_thrift_id(s.i32(4)?)?;
        let null_counts = s.opt_list(5);
        let physical = element
            .physical_type
            .ok_or_else(|| out_of_spec_err!("ColumnIndex present for a group node"))?;

        let mut pages = Vec::with_capacity(null_pages.len());
        for i in 0..null_pages.len() {
            let is_null_page = matches!(
                null_pages.get(i),
                Some(crate::thrift::value::ThriftValue::Bool(true))
            );
            let null_count = null_counts.and_then(|l| l.get(i)).and_then(|v| v.as_i32().ok()).map(|v| v as i64);
            let (min, max) = if is_null_page {
                (None, None)
            } else {
                let min_bytes = min_values.get(i).map(|v| v.as_binary()).transpose()?;
                let max_bytes = max_values.get(i).map(|v| v.as_binary()).transpose()?;
                let min = min_bytes
                    .map(|b| decode_stat(physical, element, b))
                    .transpose()?;
                let max = max_bytes
                    .map(|b| decode_stat(physical, element, b))
                    .transpose()?;
                (min, max)
            };
            pages.push(PageIndexEntry {
                min,
                max,
                null_count,
            });
        }
        Ok(ColumnIndex {
            pages,
            boundary_order,
        })
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

    #[test]
    fn boundary_order_rejects_unknown_id() {
        assert!(BoundaryOrder::from_thrift_id(9).is_err());
    }

    #[test]
    fn pages_overlapping_selects_touching_pages() {
        let index = OffsetIndex {
            page_locations: vec![
                PageLocation {
                    offset: 0,
                    compressed_page_size: 10,
                    first_row_index: 0,
                },
                PageLocation {
                    offset: 10,
                    compressed_page_size: 10,
                    first_row_index: 100,
                },
                PageLocation {
                    offset: 20,
                    compressed_page_size: 10,
                    first_row_index: 200,
                },
            ],
        };
        let hits = index.pages_overlapping(150, 250, 300);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].1.first_row_index, 100);
        assert_eq!(hits[1].1.first_row_index, 200);
    }
}
