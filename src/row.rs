//! Row transposition: joining per-column [`Assembled`] arrays into the
//! caller's chosen row shape (spec section 6, `rowFormat ∈ {array,
//! object}`).

use crate::assemble::Assembled;

/// How each materialised row is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFormat {
    /// An ordered array following `columns`' order (or schema order, when
    /// `columns` was not restricted).
    Array,
    /// A mapping keyed by column name.
    Object,
}

/// One transposed row, in either shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    Array(Vec<Assembled>),
    Object(Vec<(String, Assembled)>),
}

/// Transposes `columns` (name, assembled-column) pairs, all of the same
/// length, into `row_count` rows in the requested format.
///
/// Column order is preserved exactly as given, including duplicate names:
/// `Row::Object` keeps every `(name, value)` pair rather than
/// deduplicating, since the caller (not this function) decides which
/// columns to pass and in what order.
pub fn transpose(columns: Vec<(String, Vec<Assembled>)>, row_count: usize, format: RowFormat) -> Vec<Row> {
    let mut iters: Vec<(String, std::vec::IntoIter<Assembled>)> = columns
        .into_iter()
        .map(|(name, col)| (name, col.into_iter()))
        .collect();

    let mut rows = Vec::with_capacity(row_count);
    for _ in 0..row_count {
        match format {
            RowFormat::Array => {
                let values = iters
                    .iter_mut()
                    .map(|(_, it)| it.next().unwrap_or(Assembled::Null))
                    .collect();
                rows.push(Row::Array(values));
            }
            RowFormat::Object => {
                let fields = iters
                    .iter_mut()
                    .map(|(name, it)| (name.clone(), it.next().unwrap_or(Assembled::Null)))
                    .collect();
                rows.push(Row::Object(fields));
            }
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logical::LogicalValue;

    fn scalar(v: i32) -> Assembled {
        Assembled::Scalar(LogicalValue::Int32(v))
    }

    #[test]
    fn transposes_into_arrays_preserving_column_order() {
        let columns = vec![
            ("b".to_owned(), vec![scalar(1), scalar(2)]),
            ("a".to_owned(), vec![scalar(10), scalar(20)]),
        ];
        let rows = transpose(columns, 2, RowFormat::Array);
        assert_eq!(rows[0], Row::Array(vec![scalar(1), scalar(10)]));
        assert_eq!(rows[1], Row::Array(vec![scalar(2), scalar(20)]));
    }

    #[test]
    fn transposes_into_objects_by_name() {
        let columns = vec![("x".to_owned(), vec![scalar(1), scalar(2)])];
        let rows = transpose(columns, 2, RowFormat::Object);
        assert_eq!(rows[0], Row::Object(vec![("x".to_owned(), scalar(1))]));
    }

    #[test]
    fn short_columns_pad_with_null() {
        let columns = vec![("x".to_owned(), vec![scalar(1)])];
        let rows = transpose(columns, 2, RowFormat::Array);
        assert_eq!(rows[1], Row::Array(vec![Assembled::Null]));
    }
}
