//! Tab groups: declared button/pane association and tab switching.
//!
//! Every pane names the key of the button controlling it and every button
//! names the id of the pane it shows. The pairing is declared when the
//! template is authored and validated on load, on clone, and on demand; a
//! mismatch fails loudly instead of leaving panes unbound.

use tracing::{debug, error};

use crate::error::{FormError, Result};
use crate::node::{NodeId, NodeKind, TabGroup};
use crate::path::join_segments;
use crate::tree::FormTree;

/// Checks that buttons and panes of a tab group pair up one to one.
pub fn validate_bindings(tree: &FormTree, group: NodeId) -> Result<()> {
    let tabs = tab_group(tree, group)?;
    let mismatch = |detail: String| FormError::TabBindingMismatch { group, detail };

    let mut panes = Vec::new();
    for &child in tree.children(group) {
        match tree.node(child)?.tab_pane() {
            Some(pane) => panes.push(pane),
            None => return Err(mismatch(format!("{child} is not a tab pane"))),
        }
    }

    for pane in &panes {
        let controllers: Vec<_> = tabs
            .buttons
            .iter()
            .filter(|b| b.key == pane.controlled_by)
            .collect();
        match controllers.as_slice() {
            [button] if button.target == pane.id => {}
            [button] => {
                return Err(mismatch(format!(
                    "button {:?} targets {:?} but its pane is {:?}",
                    button.key, button.target, pane.id
                )));
            }
            [] => {
                return Err(mismatch(format!(
                    "pane {:?} names missing button {:?}",
                    pane.id, pane.controlled_by
                )));
            }
            _ => {
                return Err(mismatch(format!(
                    "pane {:?} is controlled by {} buttons",
                    pane.id,
                    controllers.len()
                )));
            }
        }
    }

    for button in &tabs.buttons {
        let claimed = panes
            .iter()
            .filter(|p| p.controlled_by == button.key)
            .count();
        if claimed != 1 {
            return Err(mismatch(format!(
                "button {:?} controls {claimed} panes",
                button.key
            )));
        }
    }

    if !tabs.buttons.is_empty() && tabs.button(&tabs.active).is_none() {
        return Err(mismatch(format!("active key {:?} has no button", tabs.active)));
    }
    Ok(())
}

/// Selects the pane controlled by the button with `key`.
pub fn select_tab(tree: &mut FormTree, group: NodeId, key: &str) -> Result<()> {
    let known = tab_group(tree, group).and_then(|tabs| {
        tabs.button(key).map(|_| ()).ok_or_else(|| FormError::UnknownTab {
            group,
            key: key.to_string(),
        })
    });
    if let Err(err) = known {
        error!(group = group.0, key, %err, "tab not selected");
        return Err(err);
    }
    if let NodeKind::TabGroup(tabs) = &mut tree.node_mut(group)?.kind {
        debug!(group = group.0, from = %tabs.active, to = %key, "tab switch");
        tabs.active = key.to_string();
    }
    Ok(())
}

/// Returns the key of the selected button.
pub fn active_key(tree: &FormTree, group: NodeId) -> Result<&str> {
    Ok(tab_group(tree, group)?.active.as_str())
}

/// Returns every attached tab group in document order.
pub fn groups(tree: &FormTree) -> Vec<NodeId> {
    tree.descendants(tree.root())
        .into_iter()
        .filter(|&id| tree.get(id).is_some_and(|n| n.tab_group().is_some()))
        .collect()
}

/// Finds the first tab group whose enclosing path is `path`.
pub fn find_group(tree: &FormTree, path: &str) -> Result<NodeId> {
    groups(tree)
        .into_iter()
        .find(|&id| join_segments(tree, id).ok().as_deref() == Some(path))
        .ok_or_else(|| FormError::UnknownPath(path.to_string()))
}

fn tab_group(tree: &FormTree, group: NodeId) -> Result<&TabGroup> {
    tree.node(group)?
        .tab_group()
        .ok_or(FormError::NotATabGroup(group))
}
