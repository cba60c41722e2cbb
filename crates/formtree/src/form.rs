//! The [`Form`] facade tying the tree to its identifier allocator.

use std::fmt;

use serde_json::Value;
use tracing::debug;

use crate::assemble::{self, Prefill, SpecialRules};
use crate::config::Config;
use crate::document;
use crate::error::{FormError, Result};
use crate::identity::{IdAllocator, SequenceAllocator};
use crate::list::{self, AddedItem};
use crate::node::{NodeId, NodeKind};
use crate::path;
use crate::tabs;
use crate::tree::FormTree;
use crate::walk::{walk, Record, Walk};

/// Callback run for every radio field of a freshly cloned list item.
pub type RadioInit = Box<dyn FnMut(&mut FormTree, NodeId)>;

/// A rendered form: the tree plus the allocator its clones draw ids from.
///
/// Every edit runs to completion before returning. Adding an item clones
/// the template, gives the clone fresh identities, numbers it, and only then
/// inserts it; a failure at any step leaves the tree untouched.
pub struct Form {
    tree: FormTree,
    ids: Box<dyn IdAllocator>,
    radio_init: Option<RadioInit>,
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("tree", &self.tree)
            .field("radio_init", &self.radio_init.is_some())
            .finish_non_exhaustive()
    }
}

impl Form {
    /// Wraps a tree with the default allocator.
    pub fn new(tree: FormTree) -> Self {
        Self::with_allocator(tree, SequenceAllocator::default())
    }

    /// Wraps a tree with an explicit allocator.
    pub fn with_allocator(tree: FormTree, ids: impl IdAllocator + 'static) -> Self {
        Self {
            tree,
            ids: Box::new(ids),
            radio_init: None,
        }
    }

    /// Loads a JSON tree document using the allocator scope from `config`.
    ///
    /// # Errors
    /// Returns any error raised while parsing or building the document.
    pub fn load(json: &str, config: &Config) -> Result<Self> {
        let mut ids = config.allocator();
        let tree = document::load(json, &mut ids)?;
        Ok(Self::with_allocator(tree, ids))
    }

    /// Sets the callback re-applying default selection to cloned radios.
    #[must_use]
    pub fn on_radio_cloned(mut self, init: impl FnMut(&mut FormTree, NodeId) + 'static) -> Self {
        self.radio_init = Some(Box::new(init));
        self
    }

    /// Returns the tree.
    pub fn tree(&self) -> &FormTree {
        &self.tree
    }

    /// Returns the tree mutably, for editing field values.
    pub fn tree_mut(&mut self) -> &mut FormTree {
        &mut self.tree
    }

    /// Appends a new item to a list section.
    pub fn add_item(&mut self, section: NodeId) -> Result<AddedItem> {
        let added = list::add_item(&mut self.tree, section, &mut *self.ids)?;
        if let Some(init) = self.radio_init.as_mut() {
            for &field in &added.identities.radio_fields {
                init(&mut self.tree, field);
            }
        }
        debug!(section = section.0, index = added.index, "item added");
        Ok(added)
    }

    /// Removes a list item and renumbers its siblings.
    pub fn remove_item(&mut self, item: NodeId) -> Result<NodeId> {
        list::remove_item(&mut self.tree, item)
    }

    /// Removes the item at `index` of a list section.
    pub fn remove_item_at(&mut self, section: NodeId, index: usize) -> Result<NodeId> {
        let item = list::items(&self.tree, section)?
            .get(index)
            .copied()
            .ok_or_else(|| {
                let prefix = path::build_path(&self.tree, section).unwrap_or_default();
                FormError::UnknownPath(format!("{prefix}.{index}"))
            })?;
        self.remove_item(item)
    }

    /// Switches a tab group to the pane controlled by `key`.
    pub fn select_tab(&mut self, group: NodeId, key: &str) -> Result<()> {
        tabs::select_tab(&mut self.tree, group, key)
    }

    /// Walks the whole form.
    pub fn walk(&self) -> Result<Walk> {
        walk(&self.tree, self.tree.root())
    }

    /// Records of selected panes only, last declared first.
    ///
    /// Assembling these last-write-wins lets earlier declared values override
    /// later defaults for duplicate paths.
    pub fn outbound_records(&self) -> Result<Vec<Record>> {
        let mut records = self.walk()?.active_records();
        records.reverse();
        Ok(records)
    }

    /// Builds the nested submission.
    pub fn submission(&self) -> Result<Value> {
        Ok(assemble::to_submission(&self.outbound_records()?))
    }

    /// Renders the submission as YAML.
    pub fn yaml(&self) -> Result<String> {
        assemble::to_yaml(&self.outbound_records()?)
    }

    /// Builds the prefill payload.
    ///
    /// Uses the same reversed records as [`submission`](Self::submission),
    /// so for duplicate paths the first declared value wins for special and
    /// pass-through records alike.
    pub fn prefill(&self, rules: &SpecialRules) -> Result<Prefill> {
        assemble::to_prefill(&self.outbound_records()?, rules)
    }

    /// Finds the node contributing the last segment of `path`.
    pub fn find(&self, path: &str) -> Result<NodeId> {
        path::find(&self.tree, path)
    }

    /// Finds the list section at `path`.
    pub fn section(&self, path: &str) -> Result<NodeId> {
        let id = self.find(path)?;
        match self.tree.node(id)?.kind {
            NodeKind::ListSection => Ok(id),
            _ => Err(FormError::NotAListSection(id)),
        }
    }

    /// Finds the tab group enclosed by `path`.
    pub fn tab_group(&self, path: &str) -> Result<NodeId> {
        tabs::find_group(&self.tree, path)
    }
}
