//! Depth-first serialization of a form tree into path records.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::node::{NodeId, NodeKind};
use crate::path::build_path;
use crate::tree::FormTree;

/// One serialized leaf: its dotted path, caption, and current value.
///
/// On the wire a record is the 3-tuple `[path, label, value]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(String, String, String)", into = "(String, String, String)")]
pub struct Record {
    /// Fully qualified dotted key.
    pub path: String,
    /// Caption of the field, or empty.
    pub label: String,
    /// Current value rendered as a string.
    pub value: String,
}

impl Record {
    /// Creates a record.
    pub fn new(
        path: impl Into<String>,
        label: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            label: label.into(),
            value: value.into(),
        }
    }
}

impl From<(String, String, String)> for Record {
    fn from((path, label, value): (String, String, String)) -> Self {
        Self { path, label, value }
    }
}

impl From<Record> for (String, String, String) {
    fn from(record: Record) -> Self {
        (record.path, record.label, record.value)
    }
}

/// A record plus whether every enclosing tab pane is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// The serialized leaf.
    pub record: Record,
    /// False when the leaf sits under a pane that is not the active one.
    pub active: bool,
    /// The leaf node that produced the record.
    pub node: NodeId,
}

/// The ordered output of one tree walk.
///
/// Entries are in document order. Callers pick [`records`](Self::records) or
/// [`records_rev`](Self::records_rev) depending on which duplicate should win
/// once the records are assembled with last-write-wins semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Walk {
    entries: Vec<WalkEntry>,
}

impl Walk {
    /// Returns every entry in document order.
    pub fn entries(&self) -> &[WalkEntry] {
        &self.entries
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether no leaf was found.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns records in document order.
    pub fn records(&self) -> Vec<Record> {
        self.entries.iter().map(|e| e.record.clone()).collect()
    }

    /// Returns records in reverse document order.
    pub fn records_rev(&self) -> Vec<Record> {
        self.entries.iter().rev().map(|e| e.record.clone()).collect()
    }

    /// Returns only records under selected tab panes, in document order.
    pub fn active_records(&self) -> Vec<Record> {
        self.entries
            .iter()
            .filter(|e| e.active)
            .map(|e| e.record.clone())
            .collect()
    }

    /// Returns the paths in document order.
    pub fn paths(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.record.path.as_str()).collect()
    }

    /// Returns paths that occur more than once, in order of second sighting.
    ///
    /// A non-empty result among active records means cloning or renumbering
    /// produced a structural defect.
    pub fn duplicate_paths(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for entry in self.entries.iter().filter(|e| e.active) {
            let path = entry.record.path.as_str();
            if !seen.insert(path) && !duplicates.contains(&path) {
                duplicates.push(path);
            }
        }
        duplicates
    }
}

/// Walks the tree under `root` depth first and emits one record per leaf.
///
/// List templates are prototypes and are skipped. Panes that are not
/// selected are still enumerated; their entries are marked inactive and it
/// is up to the consumer to ignore them.
pub fn walk(tree: &FormTree, root: NodeId) -> Result<Walk> {
    let mut walk = Walk::default();
    let active = is_active(tree, root)?;
    visit(tree, root, active, &mut walk)?;
    Ok(walk)
}

fn visit(tree: &FormTree, id: NodeId, active: bool, out: &mut Walk) -> Result<()> {
    let node = tree.node(id)?;
    match &node.kind {
        NodeKind::ListTemplate => return Ok(()),
        NodeKind::Leaf(field) => {
            out.entries.push(WalkEntry {
                record: Record {
                    path: build_path(tree, id)?,
                    label: node.label.display().into_owned(),
                    value: field.value_string(),
                },
                active,
                node: id,
            });
            return Ok(());
        }
        NodeKind::TabGroup(group) => {
            for &child in node.children() {
                let pane_active = tree
                    .node(child)?
                    .tab_pane()
                    .is_some_and(|pane| pane.controlled_by == group.active);
                visit(tree, child, active && pane_active, out)?;
            }
            return Ok(());
        }
        _ => {}
    }
    for &child in node.children() {
        visit(tree, child, active, out)?;
    }
    Ok(())
}

/// Returns whether every tab pane above `id` is the selected one.
fn is_active(tree: &FormTree, id: NodeId) -> Result<bool> {
    let mut cursor = id;
    while let Some(parent) = tree.parent(cursor) {
        if let (Some(pane), Some(group)) = (
            tree.node(cursor)?.tab_pane(),
            tree.node(parent)?.tab_group(),
        ) {
            if pane.controlled_by != group.active {
                return Ok(false);
            }
        }
        cursor = parent;
    }
    Ok(true)
}
