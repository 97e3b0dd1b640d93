//! Schema tree reconstruction and leaf column addressing.
//!
//! The footer stores the schema as a flattened pre-order list of elements,
//! each group annotated with its child count. [`schema_from_elements`]
//! rebuilds the tree with an explicit stack of pending-children counters so
//! decode depth never tracks untrusted input nesting.

use std::fmt;
use std::sync::Arc;

use crate::basic::{Repetition, Type};
use crate::errors::{Result, decode_err};

/// A single element of the flattened schema list, as decoded from the
/// footer. Elements with `num_children > 0` are groups; the rest are leaf
/// (physical) columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaElement {
    pub name: String,
    pub physical_type: Option<Type>,
    pub type_length: Option<i32>,
    pub repetition: Option<Repetition>,
    pub num_children: Option<i32>,
}

/// A node in the reconstructed schema tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaType {
    Primitive(PrimitiveType),
    Group(GroupType),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimitiveType {
    pub name: String,
    pub repetition: Repetition,
    pub physical_type: Type,
    /// Byte length for FIXED_LEN_BYTE_ARRAY columns.
    pub type_length: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupType {
    pub name: String,
    /// The synthetic root carries no repetition.
    pub repetition: Option<Repetition>,
    pub fields: Vec<SchemaType>,
}

impl Drop for GroupType {
    fn drop(&mut self) {
        // The derived drop glue recurses per nesting level, which overflows
        // the stack on deep trees. Drain descendants into a worklist so
        // every group is dropped with empty fields.
        let mut worklist = std::mem::take(&mut self.fields);
        while let Some(node) = worklist.pop() {
            if let SchemaType::Group(mut group) = node {
                worklist.append(&mut group.fields);
            }
        }
    }
}

impl SchemaType {
    pub fn name(&self) -> &str {
        match self {
            SchemaType::Primitive(p) => &p.name,
            SchemaType::Group(g) => &g.name,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, SchemaType::Group(_))
    }
}

/// Rebuilds the schema tree from the flattened pre-order element list.
///
/// Each group on the stack tracks how many of its children remain to be
/// consumed; completing a group attaches it to its parent and may cascade
/// further completions.
pub fn schema_from_elements(elements: Vec<SchemaElement>) -> Result<SchemaType> {
    struct PendingGroup {
        name: String,
        repetition: Option<Repetition>,
        remaining: usize,
        fields: Vec<SchemaType>,
    }

    let mut iter = elements.into_iter();
    let root = iter
        .next()
        .ok_or_else(|| decode_err!("schema element list is empty"))?;
    let root_children = match root.num_children {
        Some(n) if n < 0 => {
            return Err(decode_err!("negative child count {} for schema root", n));
        }
        Some(n) => n as usize,
        None => 0,
    };
    if root_children == 0 {
        // A file with no columns still has a (childless) root.
        return Ok(SchemaType::Group(GroupType {
            name: root.name,
            repetition: None,
            fields: Vec::new(),
        }));
    }

    let mut stack = vec![PendingGroup {
        name: root.name,
        repetition: None,
        remaining: root_children,
        fields: Vec::new(),
    }];

    while let Some(elem) = iter.next() {
        let num_children = match elem.num_children {
            Some(n) if n < 0 => {
                return Err(decode_err!(
                    "negative child count {} for schema element '{}'",
                    n,
                    elem.name
                ));
            }
            Some(n) => n as usize,
            None => 0,
        };

        if num_children > 0 {
            stack.push(PendingGroup {
                name: elem.name,
                repetition: elem.repetition,
                remaining: num_children,
                fields: Vec::new(),
            });
            continue;
        }

        // Leaf column.
        let physical_type = elem.physical_type.ok_or_else(|| {
            decode_err!("schema leaf '{}' has no physical type", elem.name)
        })?;
        let repetition = elem.repetition.ok_or_else(|| {
            decode_err!("schema leaf '{}' has no repetition", elem.name)
        })?;
        let mut node = SchemaType::Primitive(PrimitiveType {
            name: elem.name,
            repetition,
            physical_type,
            type_length: elem.type_length,
        });

        // Attach, then cascade completed groups upward.
        loop {
            match stack.pop() {
                None => {
                    // `node` holds the completed root.
                    if iter.next().is_some() {
                        return Err(decode_err!(
                            "trailing schema elements after tree is complete"
                        ));
                    }
                    return Ok(node);
                }
                Some(mut top) => {
                    top.fields.push(node);
                    top.remaining -= 1;
                    if top.remaining > 0 {
                        stack.push(top);
                        break;
                    }
                    node = SchemaType::Group(GroupType {
                        name: top.name,
                        repetition: top.repetition,
                        fields: top.fields,
                    });
                }
            }
        }
    }

    Err(decode_err!(
        "schema tree truncated: {} group(s) still awaiting children",
        stack.len()
    ))
}

/// Dotted path from the schema root to a leaf column, root excluded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnPath {
    parts: Vec<String>,
}

impl ColumnPath {
    pub fn new(parts: Vec<String>) -> Self {
        ColumnPath { parts }
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    pub fn string(&self) -> String {
        self.parts.join(".")
    }
}

impl fmt::Display for ColumnPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.string())
    }
}

/// Descriptor for one leaf column: its dotted path, physical type, and the
/// definition/repetition levels implied by the ancestors' repetitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    path: ColumnPath,
    physical_type: Type,
    type_length: Option<i32>,
    max_def_level: i16,
    max_rep_level: i16,
}

impl ColumnDescriptor {
    pub fn path(&self) -> &ColumnPath {
        &self.path
    }

    pub fn physical_type(&self) -> Type {
        self.physical_type
    }

    pub fn type_length(&self) -> Option<i32> {
        self.type_length
    }

    pub fn max_def_level(&self) -> i16 {
        self.max_def_level
    }

    pub fn max_rep_level(&self) -> i16 {
        self.max_rep_level
    }
}

/// A schema tree paired with its leaf descriptors in schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDescriptor {
    schema: SchemaType,
    leaves: Vec<Arc<ColumnDescriptor>>,
}

impl SchemaDescriptor {
    pub fn new(schema: SchemaType) -> Result<Self> {
        if !schema.is_group() {
            return Err(decode_err!("schema root must be a group"));
        }
        let leaves = collect_leaves(&schema);
        Ok(SchemaDescriptor { schema, leaves })
    }

    pub fn root_schema(&self) -> &SchemaType {
        &self.schema
    }

    /// Number of leaf (physical) columns.
    pub fn num_columns(&self) -> usize {
        self.leaves.len()
    }

    pub fn columns(&self) -> &[Arc<ColumnDescriptor>] {
        &self.leaves
    }

    pub fn column_paths(&self) -> impl Iterator<Item = &ColumnPath> {
        self.leaves.iter().map(|descr| descr.path())
    }
}

/// Collects leaf descriptors in pre-order, iteratively.
fn collect_leaves(root: &SchemaType) -> Vec<Arc<ColumnDescriptor>> {
    struct Frame<'a> {
        node: &'a SchemaType,
        path: Vec<String>,
        def_level: i16,
        rep_level: i16,
    }

    let fields: &[SchemaType] = match root {
        SchemaType::Group(g) => &g.fields,
        SchemaType::Primitive(_) => return Vec::new(),
    };

    let mut leaves = Vec::new();
    // Reverse push keeps pre-order, which fixes the column indices.
    let mut stack: Vec<Frame> = fields
        .iter()
        .rev()
        .map(|node| Frame {
            node,
            path: Vec::new(),
            def_level: 0,
            rep_level: 0,
        })
        .collect();

    while let Some(frame) = stack.pop() {
        let repetition = match frame.node {
            SchemaType::Primitive(p) => Some(p.repetition),
            SchemaType::Group(g) => g.repetition,
        };
        let mut def_level = frame.def_level;
        let mut rep_level = frame.rep_level;
        match repetition {
            Some(Repetition::OPTIONAL) => def_level += 1,
            Some(Repetition::REPEATED) => {
                def_level += 1;
                rep_level += 1;
            }
            _ => {}
        }

        let mut path = frame.path;
        path.push(frame.node.name().to_owned());

        match frame.node {
            SchemaType::Primitive(p) => {
                leaves.push(Arc::new(ColumnDescriptor {
                    path: ColumnPath::new(path),
                    physical_type: p.physical_type,
                    type_length: p.type_length,
                    max_def_level: def_level,
                    max_rep_level: rep_level,
                }));
            }
            SchemaType::Group(g) => {
                for child in g.fields.iter().rev() {
                    stack.push(Frame {
                        node: child,
                        path: path.clone(),
                        def_level,
                        rep_level,
                    });
                }
            }
        }
    }

    leaves
}
