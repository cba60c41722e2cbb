//! Applying command-line edits to a loaded form.

use anyhow::{Context, Result};
use formtree::{Field, Form, FormTree, NodeId, NodeKind};
use tracing::info;

use crate::cli::Input;

/// Checks the first option of a cloned radio group that has none checked.
pub fn default_selection(tree: &mut FormTree, field: NodeId) {
    if let Ok(node) = tree.node_mut(field) {
        if let NodeKind::Leaf(Field::Choice(group)) = &mut node.kind {
            if group.selected.is_none() && !group.options.is_empty() {
                group.selected = Some(0);
            }
        }
    }
}

impl Input {
    /// Applies every `--add`, then every `--remove`, then every `--tab`.
    pub fn apply(&self, form: &mut Form) -> Result<()> {
        for path in &self.add {
            let section = form
                .section(path)
                .with_context(|| format!("cannot add to {path:?}"))?;
            let added = form.add_item(section)?;
            info!(section = %path, index = added.index, "Added item");
        }
        for edit in &self.remove {
            let section = form
                .section(&edit.section)
                .with_context(|| format!("cannot remove from {:?}", edit.section))?;
            form.remove_item_at(section, edit.index)?;
            info!(section = %edit.section, index = edit.index, "Removed item");
        }
        for edit in &self.tab {
            let group = form
                .tab_group(&edit.group)
                .with_context(|| format!("no tab group under {:?}", edit.group))?;
            form.select_tab(group, &edit.key)?;
            info!(group = %edit.group, key = %edit.key, "Selected tab");
        }
        Ok(())
    }
}
