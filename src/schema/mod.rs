//! Schema tree construction (spec section 4.4): translating the flat,
//! pre-order `SchemaElement` list from `FileMetaData` into a tree, and the
//! definition/repetition-level bookkeeping and list/map/struct
//! classification that the Dremel assembler depends on.

pub mod types;

pub use types::{ConvertedType, LogicalType, PhysicalType, Repetition, SchemaElement};

use crate::error::Result;
use crate::thrift::value::ThriftStruct;

/// One node of the reconstructed schema tree.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub element: SchemaElement,
    pub children: Vec<SchemaNode>,
}

impl SchemaNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// A group is list-like iff its converted/logical type is LIST, it has
    /// exactly one REPEATED child, and that child has exactly one
    /// non-REPEATED child (spec section 4.4).
    pub fn is_list_like(&self) -> bool {
        if self.element.converted_type != Some(ConvertedType::List)
            && !matches!(self.element.logical_type, Some(LogicalType::List))
        {
            return false;
        }
        if self.children.len() != 1 {
            return false;
        }
        let repeated = &self.children[0];
        repeated.element.repetition == Repetition::Repeated
            && repeated.children.len() == 1
            && repeated.children[0].element.repetition != Repetition::Repeated
    }

    /// A group is map-like iff its converted/logical type is MAP, the sole
    /// REPEATED child has two named children `key` (REQUIRED) and `value`
    /// (not REPEATED).
    pub fn is_map_like(&self) -> bool {
        if self.element.converted_type != Some(ConvertedType::Map)
            && !matches!(self.element.logical_type, Some(LogicalType::Map))
        {
            return false;
        }
        if self.children.len() != 1 {
            return false;
        }
        let entry = &self.children[0];
        if entry.element.repetition != Repetition::Repeated || entry.children.len() != 2 {
            return false;
        }
        let key = entry.children.iter().find(|c| c.element.name == "key");
        let value = entry.children.iter().find(|c| c.element.name == "value");
        matches!(key, Some(k) if k.element.repetition == Repetition::Required)
            && matches!(value, Some(v) if v.element.repetition != Repetition::Repeated)
    }
}

/// A schema tree plus the per-leaf, left-to-right path index that matches
/// column order in every row group.
#[derive(Debug, Clone)]
pub struct SchemaTree {
    pub root: SchemaNode,
}

impl SchemaTree {
    /// Builds a tree from the flat, pre-order list of `SchemaElement` Thrift
    /// structs found in `FileMetaData`'s `schema` field. The first element
    /// is the root.
    pub fn build(elements: &[ThriftStruct]) -> Result<Self> {
        if elements.is_empty() {
            return Err(out_of_spec_err!("schema element list is empty"));
        }
        let parsed: Result<Vec<SchemaElement>> =
            elements.iter().map(SchemaElement::from_thrift).collect();
        let parsed = parsed?;
        let mut iter = parsed.into_iter();
        let root_element = iter.next().unwrap();
        let mut rest: Vec<SchemaElement> = iter.collect();
        rest.reverse(); // so `pop()` yields them in original order
        let root = build_node(root_element, &mut rest)?;
        if !rest.is_empty() {
            return Err(out_of_spec_err!(
                "schema element list has {} elements left over after tree construction",
                rest.len()
            ));
        }
        Ok(SchemaTree { root })
    }

    /// Returns the leaves in left-to-right order, matching column order in
    /// every row group.
    pub fn leaves(&self) -> Vec<&SchemaNode> {
        let mut out = Vec::new();
        collect_leaves(&self.root, &mut out);
        out
    }

    /// Resolves `name_parts` against successive children's names, returning
    /// the node path including the root.
    pub fn path_from_root<'a>(&'a self, name_parts: &[&str]) -> Result<Vec<&'a SchemaNode>> {
        let mut path = vec![&self.root];
        let mut current = &self.root;
        for part in name_parts {
            let child = current
                .children
                .iter()
                .find(|c| c.element.name == *part)
                .ok_or_else(|| out_of_spec_err!("no schema child named '{}'", part))?;
            path.push(child);
            current = child;
        }
        Ok(path)
    }
}

fn build_node(element: SchemaElement, remaining: &mut Vec<SchemaElement>) -> Result<SchemaNode> {
    let num_children = element.num_children.unwrap_or(0) as usize;
    let mut children = Vec::with_capacity(num_children);
    for _ in 0..num_children {
        let child_element = remaining
            .pop()
            .ok_or_else(|| out_of_spec_err!("schema element list truncated mid-subtree"))?;
        children.push(build_node(child_element, remaining)?);
    }
    if children.is_empty() && element.physical_type.is_none() {
        return Err(out_of_spec_err!(
            "group node '{}' declares no children and no physical type",
            element.name
        ));
    }
    Ok(SchemaNode { element, children })
}

fn collect_leaves<'a>(node: &'a SchemaNode, out: &mut Vec<&'a SchemaNode>) {
    if node.is_leaf() {
        out.push(node);
        return;
    }
    for child in &node.children {
        collect_leaves(child, out);
    }
}

/// Count of REPEATED nodes in `path` (spec section 4.4).
pub fn max_repetition_level(path: &[&SchemaNode]) -> i16 {
    path.iter()
        .filter(|n| n.element.repetition == Repetition::Repeated)
        .count() as i16
}

/// Count of non-REQUIRED nodes in `path`, excluding the root (spec section
/// 4.4).
pub fn max_definition_level(path: &[&SchemaNode]) -> i16 {
    path.iter()
        .skip(1)
        .filter(|n| n.element.repetition != Repetition::Required)
        .count() as i16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thrift::value::ThriftValue;
    use std::collections::HashMap;

    fn element(
        name: &str,
        repetition: Option<i32>,
        physical: Option<i32>,
        num_children: Option<i32>,
        converted: Option<i32>,
    ) -> ThriftStruct {
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
        ThriftStruct { fields }
    }

    #[test]
    fn builds_flat_two_column_tree() {
        let elements = vec![
            element("schema", None, None, Some(2), None),
            element("a", Some(0), Some(1), None, None), // REQUIRED INT32
            element("b", Some(1), Some(4), None, None), // OPTIONAL BYTE_ARRAY
        ];
        let tree = SchemaTree::build(&elements).unwrap();
        let leaves = tree.leaves();
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0].element.name, "a");
        assert_eq!(leaves[1].element.name, "b");
    }

    #[test]
    fn classifies_list_like_group() {
        let elements = vec![
            element("schema", None, None, Some(1), None),
            element("my_list", Some(1), None, Some(1), Some(3)), // LIST=3
            element("list", Some(1), None, Some(1), None),       // REPEATED group
            element("element", Some(0), Some(1), None, None),    // REQUIRED leaf
        ];
        let tree = SchemaTree::build(&elements).unwrap();
        let list_group = &tree.root.children[0];
        assert!(list_group.is_list_like());
    }
}
