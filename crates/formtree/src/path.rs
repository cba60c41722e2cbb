//! Dotted path keys for form nodes.

use tracing::error;

use crate::error::{FormError, Result};
use crate::node::NodeId;
use crate::tree::FormTree;

/// Separator between path segments.
pub const SEPARATOR: char = '.';

/// Builds the dotted path of a node from its ancestors' segments.
///
/// Segments are joined top level first; empty segments contribute nothing.
/// This is a pure join over already resolved segments: a segment that still
/// carries the index placeholder is a structural defect and fails with
/// [`FormError::UnresolvedPlaceholder`].
///
/// ```rust
/// use formtree::{path, Field, FormTree, Node, NodeKind};
///
/// let mut tree = FormTree::default();
/// let root = tree.root();
/// let server = tree.append(root, Node::new(NodeKind::Group).segment("flower_server")).unwrap();
/// let host = tree
///     .append(server, Node::new(NodeKind::Leaf(Field::Text("localhost".into()))).segment("server_host"))
///     .unwrap();
///
/// assert_eq!(path::build_path(&tree, host).unwrap(), "flower_server.server_host");
/// ```
pub fn build_path(tree: &FormTree, node: NodeId) -> Result<String> {
    join_segments(tree, node).inspect_err(|err| {
        if let FormError::UnresolvedPlaceholder { node, template } = err {
            error!(node = node.0, template = %template, "unresolved placeholder at path build time");
        }
    })
}

pub(crate) fn join_segments(tree: &FormTree, node: NodeId) -> Result<String> {
    let mut segments = Vec::new();
    let mut cursor = Some(node);
    while let Some(current) = cursor {
        let n = tree.node(current)?;
        if !n.segment.is_empty() {
            let value = n
                .segment
                .value()
                .ok_or_else(|| FormError::UnresolvedPlaceholder {
                    node: current,
                    template: n.segment.template().to_string(),
                })?;
            segments.push(value.into_owned());
        }
        cursor = n.parent();
    }
    segments.reverse();
    Ok(segments.join("."))
}

/// Finds the attached node whose own segment ends exactly at `path`.
///
/// Nodes with an empty segment share their ancestor's path and are never
/// returned; the lookup yields the node that contributes the last segment.
pub fn find(tree: &FormTree, path: &str) -> Result<NodeId> {
    for id in tree.descendants(tree.root()) {
        let node = tree.node(id)?;
        if node.segment.is_empty() || !node.segment.is_resolved() {
            continue;
        }
        if join_segments(tree, id).ok().as_deref() == Some(path) {
            return Ok(id);
        }
    }
    Err(FormError::UnknownPath(path.to_string()))
}

/// Splits a dotted path into its segments.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Field, Node, NodeKind};

    fn leaf(segment: &str) -> Node {
        Node::new(NodeKind::Leaf(Field::Text(String::new()))).segment(segment)
    }

    #[test]
    fn empty_segments_are_skipped() {
        let mut tree = FormTree::default();
        let root = tree.root();
        let a = tree.append(root, Node::new(NodeKind::Group).segment("a")).unwrap();
        let unnamed = tree.append(a, Node::new(NodeKind::Group)).unwrap();
        let b = tree.append(unnamed, leaf("b")).unwrap();
        assert_eq!(build_path(&tree, b).unwrap(), "a.b");
        assert_eq!(build_path(&tree, unnamed).unwrap(), "a");
        assert_eq!(build_path(&tree, root).unwrap(), "");
    }

    #[test]
    fn unresolved_placeholder_fails() {
        let mut tree = FormTree::default();
        let root = tree.root();
        let item = tree.append(root, Node::new(NodeKind::ListItem).segment("#")).unwrap();
        let name = tree.append(item, leaf("name")).unwrap();
        let err = build_path(&tree, name).unwrap_err();
        assert_eq!(
            err,
            FormError::UnresolvedPlaceholder {
                node: item,
                template: "#".into()
            }
        );

        tree.node_mut(item).unwrap().segment.resolve(3);
        assert_eq!(build_path(&tree, name).unwrap(), "3.name");
    }

    #[test]
    fn find_by_path() {
        let mut tree = FormTree::default();
        let root = tree.root();
        let net = tree.append(root, Node::new(NodeKind::Group).segment("network")).unwrap();
        let port = tree.append(net, leaf("server_port")).unwrap();
        assert_eq!(find(&tree, "network.server_port").unwrap(), port);
        assert_eq!(find(&tree, "network").unwrap(), net);
        assert_eq!(
            find(&tree, "network.nope"),
            Err(FormError::UnknownPath("network.nope".into()))
        );
    }

    #[test]
    fn segments_split() {
        assert_eq!(segments("a.0.b").collect::<Vec<_>>(), vec!["a", "0", "b"]);
    }
}
