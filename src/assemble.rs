//! Dremel assembly (spec section 4.8): reconstructing nested values from a
//! flat `(values, definition levels, repetition levels)` triple, then
//! assembling groups (structs, lists, maps) bottom-up by walking the schema
//! tree over the per-leaf results.

use crate::logical::LogicalValue;
use crate::metadata::SchemaDescriptor;
use crate::schema::{Repetition, SchemaNode};
use std::collections::HashMap;

/// A reconstructed value: either a scalar leaf, an absent (null) value, or
/// a list of further `Assembled` values (used for both repeated lists and,
/// after struct transposition, object-like records).
#[derive(Debug, Clone, PartialEq)]
pub enum Assembled {
    Null,
    Scalar(LogicalValue),
    List(Vec<Assembled>),
    /// A struct/map record: ordered `(name, value)` pairs.
    Record(Vec<(String, Assembled)>),
}

/// Reassembles one leaf's flat arrays into one `Assembled` value per
/// top-level record (spec section 4.8, the per-index state machine).
///
/// `repetition_path` holds the repetition kind of every node from the root
/// (index 0, conventionally REQUIRED) down to and including the leaf; the
/// assembler never creates a container for the leaf itself, so pushing
/// stops at `repetition_path.len() - 2`.
pub fn assemble_leaf(
    mut values: impl Iterator<Item = LogicalValue>,
    def_levels: &[i16],
    rep_levels: &[i16],
    repetition_path: &[Repetition],
    max_definition_level: i16,
    row_count: usize,
) -> Vec<Assembled> {
    let deepest_list_depth = repetition_path.len().saturating_sub(2) as i64;
    let mut stack: Vec<Vec<Assembled>> = vec![vec![]];
    let mut current_depth: i64 = 0;
    let mut current_def_level: i16 = 0;
    let mut current_rep_level: i16 = 0;

    let n = if def_levels.is_empty() && rep_levels.is_empty() {
        row_count
    } else {
        def_levels.len().max(rep_levels.len())
    };

    for i in 0..n {
        let def = def_levels.get(i).copied().unwrap_or(max_definition_level);
        let rep = rep_levels.get(i).copied().unwrap_or(0);

        while current_depth > 0
            && (rep < current_rep_level
                || repetition_path[current_depth as usize] == Repetition::Optional)
        {
            let finished = stack.pop().unwrap();
            let node = repetition_path[current_depth as usize];
            if node == Repetition::Repeated {
                current_rep_level -= 1;
            }
            if node != Repetition::Required {
                current_def_level -= 1;
            }
            current_depth -= 1;
            stack.last_mut().unwrap().push(Assembled::List(finished));
        }

        while current_depth < deepest_list_depth && current_def_level < def {
            current_depth += 1;
            let node = repetition_path[current_depth as usize];
            if node != Repetition::Required {
                stack.push(Vec::new());
                current_def_level += 1;
            }
            if node == Repetition::Repeated {
                current_rep_level += 1;
            }
        }

        let top = stack.last_mut().unwrap();
        if def == max_definition_level {
            if let Some(value) = values.next() {
                top.push(Assembled::Scalar(value));
            }
        } else if current_depth == deepest_list_depth {
            top.push(Assembled::Null);
        } else {
            top.push(Assembled::List(Vec::new()));
        }
    }

    while current_depth > 0 {
        let finished = stack.pop().unwrap();
        current_depth -= 1;
        stack.last_mut().unwrap().push(Assembled::List(finished));
    }

    stack.pop().unwrap()
}

/// Unwraps one layer of the singleton `{ list: [ { element: v } ] }`
/// wrapping a LIST group's inner structure reduces to, once its element
/// column has been assembled (spec section 4.8, `flattenAtDepth`).
pub fn flatten_list_wrapping(assembled: Vec<Assembled>) -> Vec<Assembled> {
    assembled
        .into_iter()
        .map(|row| match row {
            Assembled::List(items) => Assembled::List(
                items
                    .into_iter()
                    .map(|item| match item {
                        Assembled::Record(mut fields) if fields.len() == 1 => fields.remove(0).1,
                        other => other,
                    })
                    .collect(),
            ),
            other => other,
        })
        .collect()
}

/// Transposes named per-child columns into records (spec section 4.8,
/// STRUCT groups). Sibling leaves under a shared ancestor carry identical
/// List nesting from that ancestor (every leaf's assembly bakes in its full
/// root-to-leaf repetition chain), so zipping recurses through matching
/// `List` layers via [`zip_record_fields`] to reach the right depth for
/// structs nested inside lists, instead of only zipping the top level.
pub fn transpose_struct(children: Vec<(String, Vec<Assembled>)>, row_count: usize) -> Vec<Assembled> {
    let mut iters: Vec<(String, std::vec::IntoIter<Assembled>)> = children
        .into_iter()
        .map(|(name, col)| (name, col.into_iter()))
        .collect();
    let mut out = Vec::with_capacity(row_count);
    for _ in 0..row_count {
        let row: Vec<(String, Assembled)> = iters
            .iter_mut()
            .map(|(name, iter)| (name.clone(), iter.next().unwrap_or(Assembled::Null)))
            .collect();
        out.push(zip_record_fields(row));
    }
    out
}

/// One row's worth of named sibling values. When every field is a `List`
/// (a shared REPEATED ancestor between this struct and the caller), zips
/// element-wise and recurses; otherwise the fields have reached this
/// struct's own depth and are combined directly into a `Record`.
fn zip_record_fields(children: Vec<(String, Assembled)>) -> Assembled {
    if !children.is_empty() && children.iter().all(|(_, v)| matches!(v, Assembled::List(_))) {
        let lists: Vec<(String, Vec<Assembled>)> = children
            .into_iter()
            .map(|(name, v)| match v {
                Assembled::List(l) => (name, l),
                _ => unreachable!("just checked every field is a List"),
            })
            .collect();
        let len = lists.iter().map(|(_, l)| l.len()).max().unwrap_or(0);
        let mut out = Vec::with_capacity(len);
        for idx in 0..len {
            let row: Vec<(String, Assembled)> = lists
                .iter()
                .map(|(name, l)| (name.clone(), l.get(idx).cloned().unwrap_or(Assembled::Null)))
                .collect();
            out.push(zip_record_fields(row));
        }
        Assembled::List(out)
    } else {
        Assembled::Record(children)
    }
}

/// Zips a key column and a value column pairwise into map records (spec
/// section 4.8, MAP groups). Recurses through shared `List` ancestor layers
/// via [`zip_map_entry`] the same way [`transpose_struct`] does, so maps
/// nested inside lists or other repeated ancestors zip at the right depth.
pub fn zip_map(keys: Vec<Assembled>, values: Vec<Assembled>) -> Vec<Assembled> {
    keys.into_iter().zip(values).map(|(k, v)| zip_map_entry(k, v)).collect()
}

fn zip_map_entry(key: Assembled, value: Assembled) -> Assembled {
    match (key, value) {
        (Assembled::List(ks), Assembled::List(vs)) => {
            let mut vs = vs.into_iter();
            let mut entries = Vec::with_capacity(ks.len());
            for k in ks {
                let v = vs.next().unwrap_or(Assembled::Null);
                entries.push(zip_map_entry(k, v));
            }
            Assembled::List(entries)
        }
        (Assembled::Null, _) | (_, Assembled::Null) => Assembled::Null,
        (k, v) => Assembled::Record(vec![("key".to_owned(), k), ("value".to_owned(), v)]),
    }
}

/// Computes the REPEATED/OPTIONAL/REQUIRED path from `root` to `leaf`, for
/// use as `assemble_leaf`'s `repetition_path` argument.
///
/// A leaf that is itself REPEATED with no wrapping LIST group
/// (legacy `repeated <type> name;` fields, the source of the
/// `repeated_no_annotation.parquet` quirk) has no dedicated container node
/// for `assemble_leaf`'s push/pop formula to target: duplicating the
/// leaf's own REPEATED marker as a synthetic intermediate container gives
/// it one, matching the canonical 3-level list shape without disturbing
/// columns that already have a real wrapping group.
pub fn repetition_path_to<'a>(path: &[&'a SchemaNode]) -> Vec<Repetition> {
    let mut out: Vec<Repetition> = path.iter().map(|n| n.element.repetition).collect();
    if out.len() >= 2 && out[out.len() - 1] == Repetition::Repeated {
        let leaf = out.pop().unwrap();
        out.push(leaf);
        out.push(leaf);
    }
    out
}

/// Assembles every top-level field of `schema` from its per-leaf results
/// (spec section 4.8, "Assemble groups (structs, lists, maps) bottom-up by
/// name"). `leaf_rows` holds one fully assembled leaf column per
/// `ColumnDescriptor` index, as produced by [`assemble_leaf`]; this function
/// walks the schema tree, matching each leaf to its column by dotted path,
/// and composes `transpose_struct`/`zip_map`/`flatten_list_wrapping` bottom
/// up wherever the tree names a group instead of a leaf.
pub fn assemble_top_level(
    schema: &SchemaDescriptor,
    leaf_rows: HashMap<usize, Vec<Assembled>>,
    row_count: usize,
) -> Vec<(String, Vec<Assembled>)> {
    let mut leaves: HashMap<Vec<String>, Vec<Assembled>> = HashMap::new();
    for (column_index, rows) in leaf_rows {
        leaves.insert(schema.column(column_index).path().to_vec(), rows);
    }

    let root = &schema.root().root;
    let mut path = Vec::new();
    root.children
        .iter()
        .map(|child| {
            path.push(child.element.name.clone());
            let column = assemble_node(child, &mut path, &leaves, row_count);
            path.pop();
            (child.element.name.clone(), column)
        })
        .collect()
}

/// Recursively assembles one schema node's column, dispatching on whether
/// it is a leaf, a LIST-like group, a MAP-like group, or a plain struct
/// group (spec section 4.4's classification, consulted here rather than at
/// the call site so nesting at any depth gets the same treatment).
fn assemble_node(
    node: &SchemaNode,
    path: &mut Vec<String>,
    leaves: &HashMap<Vec<String>, Vec<Assembled>>,
    row_count: usize,
) -> Vec<Assembled> {
    if node.is_leaf() {
        return leaves
            .get(path.as_slice())
            .cloned()
            .unwrap_or_else(|| vec![Assembled::Null; row_count]);
    }

    if node.is_map_like() {
        let entry = &node.children[0];
        let key_node = entry.children.iter().find(|c| c.element.name == "key").unwrap();
        let value_node = entry.children.iter().find(|c| c.element.name == "value").unwrap();
        path.push(entry.element.name.clone());
        path.push(key_node.element.name.clone());
        let keys = assemble_node(key_node, path, leaves, row_count);
        path.pop();
        path.push(value_node.element.name.clone());
        let values = assemble_node(value_node, path, leaves, row_count);
        path.pop();
        path.pop();
        return zip_map(keys, values);
    }

    if node.is_list_like() {
        let repeated = &node.children[0];
        let element = &repeated.children[0];
        path.push(repeated.element.name.clone());
        path.push(element.element.name.clone());
        let inner = assemble_node(element, path, leaves, row_count);
        path.pop();
        path.pop();
        return flatten_list_wrapping(inner);
    }

    let fields: Vec<(String, Vec<Assembled>)> = node
        .children
        .iter()
        .map(|child| {
            path.push(child.element.name.clone());
            let column = assemble_node(child, path, leaves, row_count);
            path.pop();
            (child.element.name.clone(), column)
        })
        .collect();
    transpose_struct(fields, row_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembles_a_flat_required_column() {
        let values = vec![
            LogicalValue::Int32(1),
            LogicalValue::Int32(2),
            LogicalValue::Int32(3),
        ];
        let path = vec![Repetition::Required, Repetition::Required];
        let out = assemble_leaf(values.into_iter(), &[], &[], &path, 0, 3);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], Assembled::Scalar(LogicalValue::Int32(1)));
    }

    #[test]
    fn assembles_an_optional_column_with_a_null() {
        let values = vec![LogicalValue::Int32(1), LogicalValue::Int32(3)];
        let def_levels = [1i16, 0, 1];
        let path = vec![Repetition::Required, Repetition::Optional];
        let out = assemble_leaf(values.into_iter(), &def_levels, &[], &path, 1, 3);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], Assembled::Scalar(LogicalValue::Int32(1)));
        assert_eq!(out[1], Assembled::Null);
        assert_eq!(out[2], Assembled::Scalar(LogicalValue::Int32(3)));
    }

    #[test]
    fn assembles_repeated_list_of_scalars() {
        // two records: [1, 2] and [3]. The leaf's own REPEATED marker is
        // duplicated (as `repetition_path_to` would do) so it has a
        // container slot distinct from the value-emitting position.
        let values = vec![
            LogicalValue::Int32(1),
            LogicalValue::Int32(2),
            LogicalValue::Int32(3),
        ];
        let def_levels = [1i16, 1, 1];
        let rep_levels = [0i16, 1, 0];
        let path = vec![
            Repetition::Required,
            Repetition::Repeated,
            Repetition::Repeated,
        ];
        let out = assemble_leaf(values.into_iter(), &def_levels, &rep_levels, &path, 1, 2);
        assert_eq!(
            out,
            vec![
                Assembled::List(vec![
                    Assembled::Scalar(LogicalValue::Int32(1)),
                    Assembled::Scalar(LogicalValue::Int32(2)),
                ]),
                Assembled::List(vec![Assembled::Scalar(LogicalValue::Int32(3))]),
            ]
        );
    }

    #[test]
    fn transpose_struct_zips_flat_fields_by_row() {
        let fields = vec![
            ("a".to_owned(), vec![Assembled::Scalar(LogicalValue::Int32(1)), Assembled::Null]),
            (
                "b".to_owned(),
                vec![
                    Assembled::Scalar(LogicalValue::String("x".to_owned())),
                    Assembled::Scalar(LogicalValue::String("y".to_owned())),
                ],
            ),
        ];
        let out = transpose_struct(fields, 2);
        assert_eq!(
            out,
            vec![
                Assembled::Record(vec![
                    ("a".to_owned(), Assembled::Scalar(LogicalValue::Int32(1))),
                    ("b".to_owned(), Assembled::Scalar(LogicalValue::String("x".to_owned()))),
                ]),
                Assembled::Record(vec![
                    ("a".to_owned(), Assembled::Null),
                    ("b".to_owned(), Assembled::Scalar(LogicalValue::String("y".to_owned()))),
                ]),
            ]
        );
    }

    #[test]
    fn transpose_struct_recurses_through_a_shared_list_ancestor() {
        // a struct nested inside a repeated group: each sibling column is a
        // per-row List of the struct's per-element values.
        let fields = vec![
            (
                "a".to_owned(),
                vec![Assembled::List(vec![
                    Assembled::Scalar(LogicalValue::Int32(1)),
                    Assembled::Scalar(LogicalValue::Int32(2)),
                ])],
            ),
            (
                "b".to_owned(),
                vec![Assembled::List(vec![
                    Assembled::Scalar(LogicalValue::Int32(10)),
                    Assembled::Scalar(LogicalValue::Int32(20)),
                ])],
            ),
        ];
        let out = transpose_struct(fields, 1);
        assert_eq!(
            out,
            vec![Assembled::List(vec![
                Assembled::Record(vec![
                    ("a".to_owned(), Assembled::Scalar(LogicalValue::Int32(1))),
                    ("b".to_owned(), Assembled::Scalar(LogicalValue::Int32(10))),
                ]),
                Assembled::Record(vec![
                    ("a".to_owned(), Assembled::Scalar(LogicalValue::Int32(2))),
                    ("b".to_owned(), Assembled::Scalar(LogicalValue::Int32(20))),
                ]),
            ])]
        );
    }

    #[test]
    fn zip_map_pairs_keys_and_values() {
        let keys = vec![Assembled::List(vec![
            Assembled::Scalar(LogicalValue::String("k1".to_owned())),
            Assembled::Scalar(LogicalValue::String("k2".to_owned())),
        ])];
        let values = vec![Assembled::List(vec![
            Assembled::Scalar(LogicalValue::Int32(1)),
            Assembled::Scalar(LogicalValue::Int32(2)),
        ])];
        let out = zip_map(keys, values);
        assert_eq!(
            out,
            vec![Assembled::List(vec![
                Assembled::Record(vec![
                    ("key".to_owned(), Assembled::Scalar(LogicalValue::String("k1".to_owned()))),
                    ("value".to_owned(), Assembled::Scalar(LogicalValue::Int32(1))),
                ]),
                Assembled::Record(vec![
                    ("key".to_owned(), Assembled::Scalar(LogicalValue::String("k2".to_owned()))),
                    ("value".to_owned(), Assembled::Scalar(LogicalValue::Int32(2))),
                ]),
            ])]
        );
    }

    #[test]
    fn zip_map_propagates_a_null_map() {
        let out = zip_map(vec![Assembled::Null], vec![Assembled::Null]);
        assert_eq!(out, vec![Assembled::Null]);
    }

    #[test]
    fn flatten_list_wrapping_unwraps_singleton_records_only() {
        let input = vec![Assembled::List(vec![
            Assembled::Record(vec![("element".to_owned(), Assembled::Scalar(LogicalValue::Int32(1)))]),
            Assembled::Scalar(LogicalValue::Int32(2)),
        ])];
        let out = flatten_list_wrapping(input);
        assert_eq!(
            out,
            vec![Assembled::List(vec![
                Assembled::Scalar(LogicalValue::Int32(1)),
                Assembled::Scalar(LogicalValue::Int32(2)),
            ])]
        );
    }

    fn schema_element(
        name: &str,
        repetition: Option<i32>,
        physical: Option<i32>,
        num_children: Option<i32>,
        converted: Option<i32>,
    ) -> crate::thrift::value::ThriftStruct {
        use crate::thrift::value::ThriftValue;
        let mut fields = HashMap::new();
        if let Some(p) = physical {
            fields.insert(1, ThriftValue::I32(p));
        }
        if let Some(r) = repetition {
            fields.insert(3, ThriftValue::I32(r));
        }
        fields.insert(4, ThriftValue::Binary(name.as_bytes().to_vec()));
        if let Some(n) = num_children {
            fields.insert(5, ThriftValue::I32(n));
        }
        if let Some(c) = converted {
            fields.insert(6, ThriftValue::I32(c));
        }
        crate::thrift::value::ThriftStruct { fields }
    }

    #[test]
    fn assemble_top_level_reassembles_a_list_of_structs() {
        use crate::schema::SchemaTree;

        // message schema { repeated group items { required int32 a; required int32 b; } }
        let elements = vec![
            schema_element("schema", None, None, Some(1), None),
            schema_element("items", Some(2), None, Some(2), None), // REPEATED group
            schema_element("a", Some(0), Some(1), None, None),
            schema_element("b", Some(0), Some(1), None, None),
        ];
        let tree = SchemaTree::build(&elements).unwrap();
        let schema = SchemaDescriptor::new(tree);

        // One row: items = [{a:1,b:10}, {a:2,b:20}].
        let a_path = vec![Repetition::Required, Repetition::Repeated, Repetition::Required];
        let a_rows = assemble_leaf(
            vec![LogicalValue::Int32(1), LogicalValue::Int32(2)].into_iter(),
            &[1, 1],
            &[0, 1],
            &a_path,
            1,
            1,
        );
        let b_rows = assemble_leaf(
            vec![LogicalValue::Int32(10), LogicalValue::Int32(20)].into_iter(),
            &[1, 1],
            &[0, 1],
            &a_path,
            1,
            1,
        );

        let mut leaf_rows = HashMap::new();
        leaf_rows.insert(0usize, a_rows);
        leaf_rows.insert(1usize, b_rows);

        let out = assemble_top_level(&schema, leaf_rows, 1);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, "items");
        assert_eq!(
            out[0].1,
            vec![Assembled::List(vec![
                Assembled::Record(vec![
                    ("a".to_owned(), Assembled::Scalar(LogicalValue::Int32(1))),
                    ("b".to_owned(), Assembled::Scalar(LogicalValue::Int32(10))),
                ]),
                Assembled::Record(vec![
                    ("a".to_owned(), Assembled::Scalar(LogicalValue::Int32(2))),
                    ("b".to_owned(), Assembled::Scalar(LogicalValue::Int32(20))),
                ]),
            ])]
        );
    }
}
