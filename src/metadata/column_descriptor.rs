//! Per-leaf bookkeeping the Dremel assembler and page decoder both need:
//! the leaf's schema element, its dotted path, and its max definition and
//! repetition levels (spec section 4.4).

use crate::assemble::repetition_path_to;
use crate::schema::{Repetition, SchemaElement, SchemaNode};

/// A descriptor for one leaf-level primitive column, built once per
/// [`SchemaDescriptor`](super::SchemaDescriptor) and shared by every row
/// group (leaf order is identical across row groups).
#[derive(Debug, Clone)]
pub struct ColumnDescriptor {
    element: SchemaElement,
    path: Vec<String>,
    repetition_path: Vec<Repetition>,
    max_definition_level: i16,
    max_repetition_level: i16,
}

impl ColumnDescriptor {
    pub(super) fn from_path(path: &[&SchemaNode]) -> Self {
        let leaf = path.last().expect("column path must include the leaf");
        ColumnDescriptor {
            element: leaf.element.clone(),
            path: path
                .iter()
                .skip(1) // exclude the root, whose name is the message name
                .map(|n| n.element.name.clone())
                .collect(),
            repetition_path: repetition_path_to(path),
            max_definition_level: crate::schema::max_definition_level(path),
            max_repetition_level: crate::schema::max_repetition_level(path),
        }
    }

    /// The leaf's own schema element (physical type, logical type, ...).
    pub fn element(&self) -> &SchemaElement {
        &self.element
    }

    /// Dotted path from (but excluding) the root, e.g. `["a", "b", "c"]`.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Column name: the last path segment.
    pub fn name(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or("")
    }

    /// The repetition kind of every ancestor from the root down to and
    /// including the leaf, as `assemble_leaf` expects it.
    pub fn repetition_path(&self) -> &[Repetition] {
        &self.repetition_path
    }

    pub fn max_definition_level(&self) -> i16 {
        self.max_definition_level
    }

    pub fn max_repetition_level(&self) -> i16 {
        self.max_repetition_level
    }
}
