//! Flattens a [`SchemaTree`] into the leaf-ordered view `ColumnChunkMetaData`
//! and the page decoder consume (spec section 4.4).

use super::column_descriptor::ColumnDescriptor;
use crate::schema::SchemaTree;

#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
    tree: SchemaTree,
    leaves: Vec<ColumnDescriptor>,
}

impl SchemaDescriptor {
    pub fn new(tree: SchemaTree) -> Self {
        let leaves = tree
            .leaves()
            .into_iter()
            .map(|leaf| {
                let name_path: Vec<&str> = leaf_name_path(&tree, leaf);
                let path = tree.path_from_root(&name_path).expect(
                    "leaf returned by SchemaTree::leaves must be reachable via path_from_root",
                );
                ColumnDescriptor::from_path(&path)
            })
            .collect();
        SchemaDescriptor { tree, leaves }
    }

    pub fn root(&self) -> &SchemaTree {
        &self.tree
    }

    pub fn num_columns(&self) -> usize {
        self.leaves.len()
    }

    pub fn column(&self, i: usize) -> &ColumnDescriptor {
        &self.leaves[i]
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.leaves
    }
}

/// Recovers the dotted name path to `target` by walking the tree; used once
/// per leaf at construction time, since `SchemaNode` does not store a back
/// pointer to its parent.
fn leaf_name_path<'a>(tree: &'a SchemaTree, target: &'a crate::schema::SchemaNode) -> Vec<&'a str> {
    let mut path = Vec::new();
    find_path(&tree.root, target, &mut path);
    path
}

fn find_path<'a>(
    node: &'a crate::schema::SchemaNode,
    target: &'a crate::schema::SchemaNode,
    path: &mut Vec<&'a str>,
) -> bool {
    if std::ptr::eq(node, target) {
        return true;
    }
    for child in &node.children {
        path.push(child.element.name.as_str());
        if find_path(child, target, path) {
            return true;
        }
        path.pop();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thrift::value::{ThriftStruct, ThriftValue};
    use std::collections::HashMap;

    fn element(
        name: &str,
        repetition: Option<i32>,
        physical: Option<i32>,
        num_children: Option<i32>,
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
        ThriftStruct { fields }
    }

    #[test]
    fn flattens_nested_group_into_dotted_leaf_paths() {
        let elements = vec![
            element("schema", None, None, Some(1)),
            element("g", Some(0), None, Some(2)),
            element("a", Some(0), Some(1), None),
            element("b", Some(1), Some(6), None),
        ];
        let tree = SchemaTree::build(&elements).unwrap();
        let descr = SchemaDescriptor::new(tree);
        assert_eq!(descr.num_columns(), 2);
        assert_eq!(descr.column(0).path(), ["g", "a"]);
        assert_eq!(descr.column(1).path(), ["g", "b"]);
        assert_eq!(descr.column(1).max_definition_level(), 1);
    }
}
