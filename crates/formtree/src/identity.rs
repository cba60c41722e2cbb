//! Fresh identities for cloned subtrees.
//!
//! A list item is a deep copy of its template, so every tab pane id and radio
//! group name inside it starts out identical to the template's. Before the
//! copy is inserted, [`reidentify`] rewrites them to identifiers never issued
//! before in the document, so clones neither share tab state nor merge their
//! radio buttons into one group.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{FormError, Result};
use crate::node::{Field, NodeId, NodeKind};
use crate::tabs::validate_bindings;
use crate::tree::FormTree;

/// Source of fresh identifiers, injected wherever identities are rewritten.
pub trait IdAllocator {
    /// Returns an identifier tagged with `namespace`, distinct from every
    /// identifier this allocator returned before.
    fn allocate(&mut self, namespace: &str) -> String;
}

impl<A: IdAllocator + ?Sized> IdAllocator for &mut A {
    fn allocate(&mut self, namespace: &str) -> String {
        (**self).allocate(namespace)
    }
}

impl<A: IdAllocator + ?Sized> IdAllocator for Box<A> {
    fn allocate(&mut self, namespace: &str) -> String {
        (**self).allocate(namespace)
    }
}

/// Deterministic allocator producing `{scope}-{namespace}-{n}`.
///
/// `n` increases monotonically across namespaces, so two allocators with
/// different scopes never collide and one allocator never repeats itself.
///
/// ```rust
/// use formtree::{IdAllocator, SequenceAllocator};
///
/// let mut ids = SequenceAllocator::new("form");
/// assert_eq!(ids.allocate("tab"), "form-tab-0");
/// assert_eq!(ids.allocate("radio"), "form-radio-1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceAllocator {
    scope: String,
    next: u64,
}

impl SequenceAllocator {
    /// Creates an allocator starting at zero.
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            next: 0,
        }
    }

    /// Returns how many identifiers were allocated.
    pub fn allocated(&self) -> u64 {
        self.next
    }
}

impl Default for SequenceAllocator {
    fn default() -> Self {
        Self::new("form")
    }
}

impl IdAllocator for SequenceAllocator {
    fn allocate(&mut self, namespace: &str) -> String {
        let id = format!("{}-{}-{}", self.scope, namespace, self.next);
        self.next += 1;
        id
    }
}

/// What [`reidentify`] rewrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reidentified {
    /// Number of tab groups found.
    pub tab_groups: usize,
    /// Pane id rewrites as `(old, new)`.
    pub panes: Vec<(String, String)>,
    /// Radio group renames as `(old, new)`, one per distinct original name.
    pub radio_renames: Vec<(String, String)>,
    /// Radio fields that need their default selection re-applied.
    pub radio_fields: Vec<NodeId>,
}

struct PanePlan {
    group: NodeId,
    pane: NodeId,
    key: String,
    new_id: String,
}

/// Upper bound on draws per identifier before giving up.
const MAX_DRAWS: usize = 64;

/// Rewrites every tab pane id and radio group name under `subtree`.
///
/// For each tab group one fresh base id is allocated and pane `i` becomes
/// `{base}-{i}`; the controlling button's target is rewritten with it. For
/// radio fields, each distinct group name gets one fresh name, so distinct
/// groups in the template stay distinct in the clone.
///
/// A drawn identifier that the document already issued, or that this call
/// already planned, is discarded and drawn again. An allocator that keeps
/// returning used identifiers fails with [`FormError::IdentityCollision`].
///
/// All bindings are validated and all new identifiers planned before the
/// first write. On error nothing changes.
pub fn reidentify(
    tree: &mut FormTree,
    subtree: NodeId,
    ids: &mut dyn IdAllocator,
) -> Result<Reidentified> {
    let nodes = tree.descendants(subtree);
    let mut report = Reidentified::default();
    let mut planned = HashSet::new();

    let mut plans = Vec::new();
    for &id in &nodes {
        if tree.node(id)?.tab_group().is_none() {
            continue;
        }
        validate_bindings(tree, id)?;
        report.tab_groups += 1;
        let panes: Vec<(NodeId, String, String)> = tree
            .children(id)
            .iter()
            .filter_map(|&pane| {
                let p = tree.get(pane)?.tab_pane()?;
                Some((pane, p.id.clone(), p.controlled_by.clone()))
            })
            .collect();
        let base = draw(tree, &mut planned, ids, "tab", panes.len())?;
        for (i, (pane, old, key)) in panes.into_iter().enumerate() {
            let new_id = format!("{base}-{i}");
            report.panes.push((old, new_id.clone()));
            plans.push(PanePlan {
                group: id,
                pane,
                key,
                new_id,
            });
        }
    }

    for &id in &nodes {
        if let Some(Field::Choice(group)) = tree.node(id)?.field() {
            if !report.radio_renames.iter().any(|(old, _)| *old == group.name) {
                let name = group.name.clone();
                let fresh = draw(tree, &mut planned, ids, "radio", 0)?;
                report.radio_renames.push((name, fresh));
            }
            report.radio_fields.push(id);
        }
    }

    for plan in &plans {
        tree.issue(&plan.new_id);
        if let NodeKind::TabPane(pane) = &mut tree.node_mut(plan.pane)?.kind {
            debug!(from = %pane.id, to = %plan.new_id, "pane id");
            pane.id = plan.new_id.clone();
        }
        if let NodeKind::TabGroup(group) = &mut tree.node_mut(plan.group)?.kind {
            for button in group.buttons.iter_mut().filter(|b| b.key == plan.key) {
                debug!(key = %button.key, from = %button.target, to = %plan.new_id, "button target");
                button.target = plan.new_id.clone();
            }
        }
    }

    for (_, new) in &report.radio_renames {
        tree.issue(new);
    }
    for &id in &report.radio_fields {
        if let NodeKind::Leaf(Field::Choice(group)) = &mut tree.node_mut(id)?.kind {
            if let Some((old, new)) = report.radio_renames.iter().find(|(old, _)| *old == group.name) {
                debug!(from = %old, to = %new, "radio name");
                group.name = new.clone();
            }
        }
    }

    Ok(report)
}

/// Draws a base identifier whose expansions are all unused.
///
/// With `panes == 0` the base itself is the identifier; otherwise the
/// identifiers are `{base}-0` through `{base}-{panes - 1}`.
fn draw(
    tree: &FormTree,
    planned: &mut HashSet<String>,
    ids: &mut dyn IdAllocator,
    namespace: &str,
    panes: usize,
) -> Result<String> {
    let mut last = String::new();
    for _ in 0..MAX_DRAWS {
        let base = ids.allocate(namespace);
        let expanded: Vec<String> = if panes == 0 {
            vec![base.clone()]
        } else {
            (0..panes).map(|i| format!("{base}-{i}")).collect()
        };
        match expanded
            .iter()
            .find(|c| tree.is_issued(c) || planned.contains(*c))
        {
            Some(taken) => {
                debug!(identifier = %taken, "identifier in use, drawing again");
                last = taken.clone();
            }
            None => {
                planned.extend(expanded);
                return Ok(base);
            }
        }
    }
    Err(FormError::IdentityCollision(last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Node, RadioGroup, TabButton, TabGroup, TabPane};

    fn radio(name: &str) -> Node {
        Node::new(NodeKind::Leaf(Field::Choice(RadioGroup {
            name: name.into(),
            options: vec!["a".into(), "b".into()],
            selected: Some(0),
        })))
    }

    fn tabbed(tree: &mut FormTree, parent: NodeId) -> NodeId {
        let g = tree
            .append(
                parent,
                Node::new(NodeKind::TabGroup(TabGroup {
                    buttons: vec![
                        TabButton { key: "info".into(), caption: "Info".into(), target: "tab1-1".into() },
                        TabButton { key: "adv".into(), caption: "Advanced".into(), target: "tab1-2".into() },
                    ],
                    active: "info".into(),
                })),
            )
            .unwrap();
        for (id, key) in [("tab1-1", "info"), ("tab1-2", "adv")] {
            tree.append(
                g,
                Node::new(NodeKind::TabPane(TabPane { id: id.into(), controlled_by: key.into() })),
            )
            .unwrap();
        }
        g
    }

    #[test]
    fn sequence_allocator_is_monotonic() {
        let mut ids = SequenceAllocator::new("s");
        assert_eq!(ids.allocate("tab"), "s-tab-0");
        assert_eq!(ids.allocate("tab"), "s-tab-1");
        assert_eq!(ids.allocated(), 2);
    }

    #[test]
    fn panes_and_buttons_are_rewritten_together() {
        let mut tree = FormTree::default();
        let root = tree.root();
        let g = tabbed(&mut tree, root);
        let copy = tree.clone_subtree(g).unwrap();
        let mut ids = SequenceAllocator::new("t");

        let report = reidentify(&mut tree, copy, &mut ids).unwrap();
        assert_eq!(report.tab_groups, 1);
        assert_eq!(
            report.panes,
            vec![
                ("tab1-1".to_string(), "t-tab-0-0".to_string()),
                ("tab1-2".to_string(), "t-tab-0-1".to_string()),
            ]
        );

        let group = tree.node(copy).unwrap().tab_group().unwrap().clone();
        assert_eq!(group.button("info").unwrap().target, "t-tab-0-0");
        assert_eq!(group.button("adv").unwrap().target, "t-tab-0-1");
        assert!(validate_bindings(&tree, copy).is_ok());

        // The original is untouched.
        let original = tree.node(g).unwrap().tab_group().unwrap();
        assert_eq!(original.button("info").unwrap().target, "tab1-1");
    }

    #[test]
    fn distinct_radio_groups_stay_distinct() {
        let mut tree = FormTree::default();
        let root = tree.root();
        let holder = tree.append(root, Node::new(NodeKind::Group)).unwrap();
        let a1 = tree.append(holder, radio("option-1")).unwrap();
        let b = tree.append(holder, radio("option-2")).unwrap();
        let a2 = tree.append(holder, radio("option-1")).unwrap();

        let mut ids = SequenceAllocator::new("r");
        let report = reidentify(&mut tree, holder, &mut ids).unwrap();
        assert_eq!(report.radio_renames.len(), 2);
        assert_eq!(report.radio_fields, vec![a1, b, a2]);

        let name = |id| match tree.node(id).unwrap().field() {
            Some(Field::Choice(g)) => g.name.clone(),
            _ => unreachable!(),
        };
        assert_eq!(name(a1), name(a2));
        assert_ne!(name(a1), name(b));
        assert_eq!(name(a1), "r-radio-0");
    }

    /// Always hands out the same identifier.
    struct Stuck;

    impl IdAllocator for Stuck {
        fn allocate(&mut self, _namespace: &str) -> String {
            "tab1-1".into()
        }
    }

    #[test]
    fn collision_aborts_before_any_write() {
        let mut tree = FormTree::default();
        let root = tree.root();
        tabbed(&mut tree, root);
        let holder = tree.append(root, Node::new(NodeKind::Group)).unwrap();
        let field = tree.append(holder, radio("option-9")).unwrap();

        let err = reidentify(&mut tree, holder, &mut Stuck).unwrap_err();
        assert_eq!(err, FormError::IdentityCollision("tab1-1".into()));
        assert!(matches!(
            tree.node(field).unwrap().field(),
            Some(Field::Choice(g)) if g.name == "option-9"
        ));
    }

    #[test]
    fn mismatched_template_is_rejected() {
        let mut tree = FormTree::default();
        let root = tree.root();
        let g = tabbed(&mut tree, root);
        if let NodeKind::TabGroup(group) = &mut tree.node_mut(g).unwrap().kind {
            group.buttons.pop();
        }
        let copy = tree.clone_subtree(g).unwrap();
        let err = reidentify(&mut tree, copy, &mut SequenceAllocator::default()).unwrap_err();
        assert!(matches!(err, FormError::TabBindingMismatch { group, .. } if group == copy));
        let panes: Vec<_> = tree
            .children(copy)
            .iter()
            .map(|&p| tree.node(p).unwrap().tab_pane().unwrap().id.clone())
            .collect();
        assert_eq!(panes, vec!["tab1-1", "tab1-2"]);
    }

    #[test]
    fn identifiers_already_in_the_document_are_skipped() {
        let mut tree = FormTree::default();
        let root = tree.root();
        let g = tabbed(&mut tree, root);
        // A pane outside the clone already uses the allocator's first pick.
        let taken = tree.children(g)[0];
        if let NodeKind::TabPane(pane) = &mut tree.node_mut(taken).unwrap().kind {
            pane.id = "form-tab-0-0".into();
        }
        tree.issue("form-tab-0-0");
        if let NodeKind::TabGroup(group) = &mut tree.node_mut(g).unwrap().kind {
            group.buttons[0].target = "form-tab-0-0".into();
        }

        let copy = tree.clone_subtree(g).unwrap();
        let mut ids = SequenceAllocator::default();
        let report = reidentify(&mut tree, copy, &mut ids).unwrap();
        assert_eq!(
            report.panes,
            vec![
                ("form-tab-0-0".to_string(), "form-tab-1-0".to_string()),
                ("tab1-2".to_string(), "form-tab-1-1".to_string()),
            ]
        );
        assert!(validate_bindings(&tree, copy).is_ok());
    }

    /// Hands out the same identifier twice, then fresh ones.
    struct Repeats(u32);

    impl IdAllocator for Repeats {
        fn allocate(&mut self, namespace: &str) -> String {
            self.0 += 1;
            if self.0 <= 2 {
                format!("{namespace}-dup")
            } else {
                format!("{namespace}-{}", self.0)
            }
        }
    }

    #[test]
    fn one_call_never_plans_the_same_identifier_twice() {
        let mut tree = FormTree::default();
        let root = tree.root();
        let holder = tree.append(root, Node::new(NodeKind::Group)).unwrap();
        tree.append(holder, radio("option-1")).unwrap();
        tree.append(holder, radio("option-2")).unwrap();

        let report = reidentify(&mut tree, holder, &mut Repeats(0)).unwrap();
        assert_eq!(
            report.radio_renames,
            vec![
                ("option-1".to_string(), "radio-dup".to_string()),
                ("option-2".to_string(), "radio-3".to_string()),
            ]
        );
    }
}
