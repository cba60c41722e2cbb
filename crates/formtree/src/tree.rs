//! Arena holding every node of a rendered form.

use std::collections::HashSet;

use crate::error::{FormError, Result};
use crate::node::{Field, Node, NodeId, NodeKind};

/// The rendered form tree.
///
/// Nodes live in an arena and refer to each other by [`NodeId`]. Children are
/// owned by their parent in order; detached subtrees (fresh clones) exist in
/// the arena without a parent until they are appended.
///
/// The tree also keeps the set of every tab pane id and radio group name it
/// has ever seen. Freshly allocated identifiers are checked against it, so an
/// identifier is never reused for the lifetime of the document.
#[derive(Debug, Clone)]
pub struct FormTree {
    slots: Vec<Option<Node>>,
    root: NodeId,
    issued: HashSet<String>,
}

impl Default for FormTree {
    fn default() -> Self {
        Self::new(Node::new(NodeKind::Group))
    }
}

impl FormTree {
    /// Creates a tree with the given root node.
    pub fn new(root: Node) -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            root: NodeId(0),
            issued: HashSet::new(),
        };
        tree.root = tree.insert(root);
        tree
    }

    /// Returns the root node id.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the number of live nodes, attached or not.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Returns whether the tree holds only its root.
    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    /// Returns the node, if live.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    /// Returns the node or [`FormError::UnknownNode`].
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.get(id).ok_or(FormError::UnknownNode(id))
    }

    /// Returns the node mutably or [`FormError::UnknownNode`].
    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.slots
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(FormError::UnknownNode(id))
    }

    /// Returns the parent of a node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|node| node.parent)
    }

    /// Returns the ordered children of a node. Unknown ids have none.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|node| node.children.as_slice()).unwrap_or(&[])
    }

    /// Returns true if the node reaches the root through its parents.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == self.root {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Returns the node and all its descendants in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if self.get(current).is_none() {
                continue;
            }
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Stores a detached node and records its identifiers.
    pub fn insert(&mut self, node: Node) -> NodeId {
        self.register_identities(&node);
        self.push(node)
    }

    /// Stores a node and appends it to `parent`.
    pub fn append(&mut self, parent: NodeId, node: Node) -> Result<NodeId> {
        self.node(parent)?;
        let id = self.insert(node);
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Appends a detached node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.node(parent)?;
        self.node(child)?;
        if child == self.root || child == parent {
            return Err(FormError::invalid_document(format!(
                "cannot append {child} to {parent}"
            )));
        }

        // The new parent must not sit inside the child's subtree.
        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == child {
                return Err(FormError::invalid_document(format!(
                    "appending {child} to {parent} would create a cycle"
                )));
            }
            cursor = self.parent(current);
        }

        self.detach(child)?;
        self.node_mut(child)?.parent = Some(parent);
        self.node_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Removes a node from its parent, keeping it in the arena.
    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        let parent = self.node(id)?.parent;
        if let Some(parent) = parent {
            self.node_mut(parent)?.children.retain(|c| *c != id);
            self.node_mut(id)?.parent = None;
        }
        Ok(())
    }

    /// Detaches a subtree and frees every node in it.
    pub fn discard(&mut self, id: NodeId) -> Result<()> {
        if id == self.root {
            return Err(FormError::invalid_document("cannot discard the root"));
        }
        self.detach(id)?;
        for node in self.descendants(id) {
            if let Some(slot) = self.slots.get_mut(node.0) {
                *slot = None;
            }
        }
        Ok(())
    }

    /// Deep-copies a subtree into detached nodes and returns the copy's root.
    ///
    /// Identifiers are copied verbatim and are not registered; callers must
    /// give the copy fresh identities before inserting it.
    pub fn clone_subtree(&mut self, id: NodeId) -> Result<NodeId> {
        let mut source = self.node(id)?.clone();
        let children = std::mem::take(&mut source.children);
        source.parent = None;
        let copy = self.push(source);
        for child in children {
            let child_copy = self.clone_subtree(child)?;
            self.node_mut(child_copy)?.parent = Some(copy);
            self.node_mut(copy)?.children.push(child_copy);
        }
        Ok(copy)
    }

    /// Returns true if the identifier was issued in this document.
    pub fn is_issued(&self, identifier: &str) -> bool {
        self.issued.contains(identifier)
    }

    /// Records an identifier. Returns false if it was already issued.
    pub(crate) fn issue(&mut self, identifier: &str) -> bool {
        self.issued.insert(identifier.to_string())
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Some(node));
        id
    }

    fn register_identities(&mut self, node: &Node) {
        match &node.kind {
            NodeKind::TabPane(pane) if !pane.id.is_empty() => {
                self.issued.insert(pane.id.clone());
            }
            NodeKind::Leaf(Field::Choice(group)) if !group.name.is_empty() => {
                self.issued.insert(group.name.clone());
            }
            _ => {}
        }
    }
}
