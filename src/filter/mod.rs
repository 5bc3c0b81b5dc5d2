//! Typed row filter (spec section 4.11). The REDESIGN FLAGS ask for this
//! crate's own typed `Filter` enum in place of the original's MongoDB-style
//! object tree; comparators and dot-notation fields are kept, since those
//! map directly onto Rust enum variants and `Vec<String>` paths.
//!
//! This module only prunes whole row groups against column chunk
//! statistics (spec section 4.9, step 3); it never filters individual
//! rows -- a provably-false group is skipped, everything else is read and
//! left to the caller to filter further if it wants exact semantics.

use crate::logical::LogicalValue;
use crate::metadata::{RowGroupMetaData, SchemaDescriptor};

/// A single field comparator. `Not` wraps another comparator rather than
/// negating a whole [`Filter`] subtree, matching the original's per-field
/// `$not`.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparator {
    Eq(LogicalValue),
    Ne(LogicalValue),
    Gt(LogicalValue),
    Gte(LogicalValue),
    Lt(LogicalValue),
    Lte(LogicalValue),
    In(Vec<LogicalValue>),
    Nin(Vec<LogicalValue>),
    Not(Box<Comparator>),
}

/// A filter tree. `Field` paths use dot-notation segments (`["a", "b"]`
/// for `a.b`), resolved against a column's dotted [`ColumnDescriptor`]
/// path (spec section 4.11).
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Nor(Vec<Filter>),
    Field(Vec<String>, Comparator),
}

/// Orders two logical values for statistics pruning, when they are
/// directly comparable. Cross-variant comparisons (e.g. `Int32` vs
/// `String`) and variants with no natural order (`Json`, `Geometry`)
/// return `None`, so callers treat them as "cannot prove, don't skip".
fn compare(a: &LogicalValue, b: &LogicalValue) -> Option<std::cmp::Ordering> {
    use LogicalValue::*;
    match (a, b) {
        (Boolean(x), Boolean(y)) => x.partial_cmp(y),
        (Int32(x), Int32(y)) => x.partial_cmp(y),
        (Int64(x), Int64(y)) => x.partial_cmp(y),
        (Int96Raw(x), Int96Raw(y)) => x.partial_cmp(y),
        (Float(x), Float(y)) => x.partial_cmp(y),
        (Double(x), Double(y)) => x.partial_cmp(y),
        (Float16(x), Float16(y)) => x.partial_cmp(y),
        (Bytes(x), Bytes(y)) => x.partial_cmp(y),
        (String(x), String(y)) => x.partial_cmp(y),
        (Date(x), Date(y)) => x.partial_cmp(y),
        (TimeMillis(x), TimeMillis(y)) => x.partial_cmp(y),
        (Time { value: x, .. }, Time { value: y, .. }) => x.partial_cmp(y),
        (Timestamp { value: x, .. }, Timestamp { value: y, .. }) => x.partial_cmp(y),
        (Decimal { unscaled: x, scale: sx }, Decimal { unscaled: y, scale: sy }) if sx == sy => {
            x.partial_cmp(y)
        }
        (Uuid(x), Uuid(y)) => x.partial_cmp(y),
        _ => None,
    }
}

fn equal(a: &LogicalValue, b: &LogicalValue) -> bool {
    compare(a, b) == Some(std::cmp::Ordering::Equal)
}

/// Whether `comparator` is provably false for every value in `[min, max]`.
fn comparator_provably_false(comparator: &Comparator, min: &LogicalValue, max: &LogicalValue) -> bool {
    match comparator {
        Comparator::Gt(t) => compare(max, t).map_or(false, |o| o != std::cmp::Ordering::Greater),
        Comparator::Gte(t) => compare(max, t) == Some(std::cmp::Ordering::Less),
        Comparator::Lt(t) => compare(min, t).map_or(false, |o| o != std::cmp::Ordering::Less),
        Comparator::Lte(t) => compare(min, t) == Some(std::cmp::Ordering::Greater),
        Comparator::Eq(t) => {
            let below_min = compare(t, min) == Some(std::cmp::Ordering::Less);
            let above_max = compare(t, max) == Some(std::cmp::Ordering::Greater);
            below_min || above_max
        }
        Comparator::Ne(t) => equal(min, max) && equal(min, t),
        Comparator::In(values) => values
            .iter()
            .all(|v| comparator_provably_false(&Comparator::Eq(v.clone()), min, max)),
        Comparator::Nin(_) => false,
        Comparator::Not(inner) => match negate(inner) {
            Some(negated) => comparator_provably_false(&negated, min, max),
            None => false,
        },
    }
}

/// Dualises a comparator so `Not(c)` can reuse the same pruning logic as
/// its negation, where the negation is itself expressible as a single
/// comparator (every variant except `In`/`Nin`, which would need a
/// conjunction this enum cannot hold without nesting `Filter`).
fn negate(comparator: &Comparator) -> Option<Comparator> {
    Some(match comparator {
        Comparator::Eq(t) => Comparator::Ne(t.clone()),
        Comparator::Ne(t) => Comparator::Eq(t.clone()),
        Comparator::Gt(t) => Comparator::Lte(t.clone()),
        Comparator::Gte(t) => Comparator::Lt(t.clone()),
        Comparator::Lt(t) => Comparator::Gte(t.clone()),
        Comparator::Lte(t) => Comparator::Gt(t.clone()),
        Comparator::Not(inner) => return Some((**inner).clone()),
        Comparator::In(_) | Comparator::Nin(_) => return None,
    })
}

/// Returns `true` when `row_group` can be skipped entirely because
/// `filter` is provably false over every column chunk's `[min, max]`
/// range it touches (spec section 4.9, step 3). Columns with no
/// statistics, or comparisons between incompatible types, are treated as
/// "cannot prove" rather than an error: pruning is an optimisation, never
/// a correctness requirement.
pub fn can_skip_row_group(filter: &Filter, row_group: &RowGroupMetaData, schema: &SchemaDescriptor) -> bool {
    match filter {
        Filter::And(children) => children.iter().any(|f| can_skip_row_group(f, row_group, schema)),
        Filter::Or(children) => {
            !children.is_empty() && children.iter().all(|f| can_skip_row_group(f, row_group, schema))
        }
        // Nor == not(or(children)): provably false requires proving the
        // disjunction unconditionally true, which min/max statistics
        // cannot establish, so this never prunes.
        Filter::Nor(_) => false,
        Filter::Field(path, comparator) => {
            let Some(index) = schema.columns().iter().position(|c| c.path() == path.as_slice()) else {
                return false;
            };
            let Some(chunk) = row_group.columns().get(index) else {
                return false;
            };
            let Some(stats) = chunk.statistics() else {
                return false;
            };
            match (&stats.min, &stats.max) {
                (Some(min), Some(max)) => comparator_provably_false(comparator, min, max),
                _ => false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gt_is_provably_false_when_max_at_or_below_threshold() {
        let c = Comparator::Gt(LogicalValue::Int32(10));
        assert!(comparator_provably_false(&c, &LogicalValue::Int32(1), &LogicalValue::Int32(10)));
        assert!(!comparator_provably_false(&c, &LogicalValue::Int32(1), &LogicalValue::Int32(11)));
    }

    #[test]
    fn eq_is_provably_false_outside_range() {
        let c = Comparator::Eq(LogicalValue::Int32(100));
        assert!(comparator_provably_false(&c, &LogicalValue::Int32(1), &LogicalValue::Int32(10)));
        assert!(!comparator_provably_false(&c, &LogicalValue::Int32(1), &LogicalValue::Int32(200)));
    }

    #[test]
    fn in_is_provably_false_when_every_candidate_misses() {
        let c = Comparator::In(vec![LogicalValue::Int32(100), LogicalValue::Int32(200)]);
        assert!(comparator_provably_false(&c, &LogicalValue::Int32(1), &LogicalValue::Int32(10)));
        let c2 = Comparator::In(vec![LogicalValue::Int32(5), LogicalValue::Int32(200)]);
        assert!(!comparator_provably_false(&c2, &LogicalValue::Int32(1), &LogicalValue::Int32(10)));
    }

    #[test]
    fn cross_type_comparisons_never_prune() {
        let c = Comparator::Gt(LogicalValue::String("z".to_owned()));
        assert!(!comparator_provably_false(&c, &LogicalValue::Int32(1), &LogicalValue::Int32(10)));
    }

    #[test]
    fn not_gt_behaves_like_lte() {
        let c = Comparator::Not(Box::new(Comparator::Gt(LogicalValue::Int32(10))));
        // NOT(x > 10) is provably false when min > 10, i.e. every value satisfies x > 10.
        assert!(comparator_provably_false(&c, &LogicalValue::Int32(11), &LogicalValue::Int32(20)));
        assert!(!comparator_provably_false(&c, &LogicalValue::Int32(1), &LogicalValue::Int32(20)));
    }
}
