//! Repeatable list sections: adding, removing, and renumbering items.
//!
//! A list section holds one template child followed by its items. The K-th
//! item carries index K everywhere: its visible ordinal, its path segment,
//! and every attribute of its subtree that contains the placeholder.

use tracing::{debug, error, trace};

use crate::error::{FormError, Result};
use crate::identity::{reidentify, IdAllocator, Reidentified};
use crate::node::{NodeId, NodeKind};
use crate::tree::FormTree;

/// A freshly inserted list item and the identities it received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedItem {
    /// The new item.
    pub item: NodeId,
    /// Its index in the section.
    pub index: usize,
    /// Identity rewrites applied to the clone.
    pub identities: Reidentified,
}

/// Returns the template of a list section.
pub fn template_of(tree: &FormTree, section: NodeId) -> Result<NodeId> {
    ensure_section(tree, section)?;
    tree.children(section)
        .iter()
        .copied()
        .find(|&c| matches!(tree.get(c).map(|n| &n.kind), Some(NodeKind::ListTemplate)))
        .ok_or(FormError::MissingTemplate { section })
}

/// Returns the items of a list section in document order.
pub fn items(tree: &FormTree, section: NodeId) -> Result<Vec<NodeId>> {
    ensure_section(tree, section)?;
    Ok(tree
        .children(section)
        .iter()
        .copied()
        .filter(|&c| matches!(tree.get(c).map(|n| &n.kind), Some(NodeKind::ListItem)))
        .collect())
}

/// Returns every attached list section in document order.
pub fn sections(tree: &FormTree) -> Vec<NodeId> {
    tree.descendants(tree.root())
        .into_iter()
        .filter(|&id| matches!(tree.get(id).map(|n| &n.kind), Some(NodeKind::ListSection)))
        .collect()
}

/// Returns the index each item's segment is resolved against.
///
/// After [`renumber`] this is exactly `[Some(0), .., Some(count - 1)]`.
pub fn indices(tree: &FormTree, section: NodeId) -> Result<Vec<Option<usize>>> {
    items(tree, section)?
        .into_iter()
        .map(|item| Ok(tree.node(item)?.segment.index()))
        .collect()
}

/// Renumbers every item of a list section after its position.
///
/// Renumbering projects each placeholder from the immutable template text,
/// so running it twice yields the same attributes as running it once.
pub fn renumber(tree: &mut FormTree, section: NodeId) -> Result<()> {
    let items = items(tree, section)?;
    for (index, &item) in items.iter().enumerate() {
        debug!(section = section.0, item = item.0, index, "renumber");
        resolve_item(tree, item, index)?;
    }
    Ok(())
}

/// Clones the template, gives the clone fresh identities, numbers it, and
/// appends it as the last item.
///
/// The clone is reidentified and numbered while still detached; if either
/// step fails it is discarded and the section is left as it was.
pub fn add_item(
    tree: &mut FormTree,
    section: NodeId,
    ids: &mut dyn IdAllocator,
) -> Result<AddedItem> {
    let template = template_of(tree, section)?;
    let index = items(tree, section)?.len();

    let clone = tree.clone_subtree(template)?;
    tree.node_mut(clone)?.kind = NodeKind::ListItem;

    let prepared = reidentify(tree, clone, ids).and_then(|identities| {
        resolve_item(tree, clone, index)?;
        Ok(identities)
    });
    let identities = match prepared {
        Ok(identities) => identities,
        Err(err) => {
            error!(section = section.0, %err, "list item rejected");
            tree.discard(clone)?;
            return Err(err);
        }
    };

    tree.append_child(section, clone)?;
    renumber(tree, section)?;
    Ok(AddedItem {
        item: clone,
        index,
        identities,
    })
}

/// Removes an item and renumbers the remaining siblings.
pub fn remove_item(tree: &mut FormTree, item: NodeId) -> Result<NodeId> {
    let section = owning_section(tree, item).inspect_err(|err| {
        error!(item = item.0, %err, "list item not removed");
    })?;
    tree.discard(item)?;
    renumber(tree, section)?;
    Ok(section)
}

fn owning_section(tree: &FormTree, item: NodeId) -> Result<NodeId> {
    if !matches!(tree.node(item)?.kind, NodeKind::ListItem) {
        return Err(FormError::NotAListItem(item));
    }
    let section = tree.parent(item).ok_or(FormError::NotAListItem(item))?;
    ensure_section(tree, section)?;
    Ok(section)
}

/// Resolves every placeholder in an item's subtree against `index`.
///
/// Nested templates and nested items belong to an inner section and keep
/// their own numbering.
fn resolve_item(tree: &mut FormTree, item: NodeId, index: usize) -> Result<()> {
    let mut stack = vec![item];
    while let Some(id) = stack.pop() {
        let node = tree.node_mut(id)?;
        for templated in node.templated_mut().filter(|t| t.is_templated()) {
            templated.resolve(index);
            trace!(node = id.0, template = templated.template(), value = %templated.display(), "resolved");
        }
        let nested: Vec<NodeId> = tree
            .children(id)
            .iter()
            .copied()
            .filter(|&c| {
                !matches!(
                    tree.get(c).map(|n| &n.kind),
                    Some(NodeKind::ListTemplate | NodeKind::ListItem)
                )
            })
            .collect();
        stack.extend(nested);
    }
    Ok(())
}

fn ensure_section(tree: &FormTree, section: NodeId) -> Result<()> {
    match tree.node(section)?.kind {
        NodeKind::ListSection => Ok(()),
        _ => Err(FormError::NotAListSection(section)),
    }
}
