//! Node types stored in a [`FormTree`](crate::FormTree).

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Reserved character replaced by a list item's index during renumbering.
pub const PLACEHOLDER: char = '#';

/// Handle to a node in a [`FormTree`](crate::FormTree) arena.
///
/// Ids of removed nodes are never handed out again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node {}", self.0)
    }
}

// -----------------------------------------------------------------------------
// Templated
// -----------------------------------------------------------------------------

/// A string that may contain the index placeholder.
///
/// The template text is immutable. Renumbering records an index and the
/// visible text is projected from the template on every read, so resolving
/// twice never substitutes into an already substituted string.
///
/// ```rust
/// use formtree::Templated;
///
/// let mut segment = Templated::new("workers.#.name");
/// assert!(!segment.is_resolved());
///
/// segment.resolve(2);
/// assert_eq!(segment.value().as_deref(), Some("workers.2.name"));
///
/// segment.resolve(0);
/// assert_eq!(segment.value().as_deref(), Some("workers.0.name"));
/// assert_eq!(segment.template(), "workers.#.name");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Templated {
    template: String,
    index: Option<usize>,
}

impl Templated {
    /// Creates an unresolved templated string.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            index: None,
        }
    }

    /// Returns the raw template text.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the index this string is resolved against, if any.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Returns true if the template contains the placeholder.
    pub fn is_templated(&self) -> bool {
        self.template.contains(PLACEHOLDER)
    }

    /// Returns true if reading the value yields no placeholder.
    pub fn is_resolved(&self) -> bool {
        !self.is_templated() || self.index.is_some()
    }

    /// Records the index used to project the template.
    pub fn resolve(&mut self, index: usize) {
        self.index = Some(index);
    }

    /// Forgets the recorded index.
    pub fn reset(&mut self) {
        self.index = None;
    }

    /// Returns the projected text, or `None` while unresolved.
    pub fn value(&self) -> Option<Cow<'_, str>> {
        if !self.is_templated() {
            return Some(Cow::Borrowed(&self.template));
        }
        self.index
            .map(|index| Cow::Owned(self.template.replace(PLACEHOLDER, &index.to_string())))
    }

    /// Returns the projected text, falling back to the raw template.
    pub fn display(&self) -> Cow<'_, str> {
        self.value().unwrap_or(Cow::Borrowed(&self.template))
    }

    /// Returns true if the template is empty.
    pub fn is_empty(&self) -> bool {
        self.template.is_empty()
    }
}

impl From<&str> for Templated {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Templated {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// -----------------------------------------------------------------------------
// Fields
// -----------------------------------------------------------------------------

/// A set of mutually exclusive options sharing one group name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadioGroup {
    /// Group name shared by every option input.
    pub name: String,
    /// Option values in display order.
    pub options: Vec<String>,
    /// Index of the checked option.
    #[serde(default)]
    pub selected: Option<usize>,
}

impl RadioGroup {
    /// Returns the checked option's value.
    pub fn selected_value(&self) -> Option<&str> {
        self.selected
            .and_then(|i| self.options.get(i))
            .map(String::as_str)
    }
}

/// The editable value of a leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// Text, number, or read-only input.
    Text(String),
    /// Checkbox.
    Flag(bool),
    /// Radio button group.
    Choice(RadioGroup),
}

impl Field {
    /// Returns the current value as submitted.
    pub fn value_string(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Flag(checked) => checked.to_string(),
            Self::Choice(group) => group.selected_value().unwrap_or_default().to_string(),
        }
    }
}

// -----------------------------------------------------------------------------
// Tabs
// -----------------------------------------------------------------------------

/// A button switching a tab group to one pane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabButton {
    /// Stable key declared when the template is authored.
    pub key: String,
    /// Caption shown on the button.
    #[serde(default)]
    pub caption: String,
    /// Id of the pane this button shows.
    #[serde(default)]
    pub target: String,
}

/// Mutually exclusive panes and their buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabGroup {
    /// Buttons in display order.
    pub buttons: Vec<TabButton>,
    /// Key of the selected button.
    pub active: String,
}

impl TabGroup {
    /// Returns the button with this key.
    pub fn button(&self, key: &str) -> Option<&TabButton> {
        self.buttons.iter().find(|b| b.key == key)
    }
}

/// One pane of a tab group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabPane {
    /// Document-unique pane id.
    pub id: String,
    /// Key of the button controlling this pane.
    pub controlled_by: String,
}

// -----------------------------------------------------------------------------
// Node
// -----------------------------------------------------------------------------

/// What a node is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Plain fieldset.
    Group,
    /// Editable field.
    Leaf(Field),
    /// Repeatable list: one template child followed by items.
    ListSection,
    /// Prototype subtree cloned into new items.
    ListTemplate,
    /// One numbered item of a list section.
    ListItem,
    /// Container of tab panes.
    TabGroup(TabGroup),
    /// One pane of a tab group.
    TabPane(TabPane),
}

impl NodeKind {
    /// Short name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Leaf(_) => "leaf",
            Self::ListSection => "list-section",
            Self::ListTemplate => "list-template",
            Self::ListItem => "list-item",
            Self::TabGroup(_) => "tab-group",
            Self::TabPane(_) => "tab-pane",
        }
    }
}

/// A node of the form tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// Path segment contributed by this node. Empty segments are skipped.
    pub segment: Templated,
    /// Caption. For list items this is the visible ordinal.
    pub label: Templated,
    /// Extra attributes, renumbered like the segment.
    pub attrs: BTreeMap<String, Templated>,
    /// What this node is.
    pub kind: NodeKind,
}

impl Node {
    /// Creates a detached node.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            segment: Templated::default(),
            label: Templated::default(),
            attrs: BTreeMap::new(),
            kind,
        }
    }

    /// Sets the path segment.
    pub fn segment(mut self, segment: impl Into<Templated>) -> Self {
        self.segment = segment.into();
        self
    }

    /// Sets the caption.
    pub fn label(mut self, label: impl Into<Templated>) -> Self {
        self.label = label.into();
        self
    }

    /// Adds an attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<Templated>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Returns the parent, if attached.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns the ordered children.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Returns the field if this is a leaf.
    pub fn field(&self) -> Option<&Field> {
        match &self.kind {
            NodeKind::Leaf(field) => Some(field),
            _ => None,
        }
    }

    /// Returns the tab group data if this is a tab group.
    pub fn tab_group(&self) -> Option<&TabGroup> {
        match &self.kind {
            NodeKind::TabGroup(group) => Some(group),
            _ => None,
        }
    }

    /// Returns the pane data if this is a tab pane.
    pub fn tab_pane(&self) -> Option<&TabPane> {
        match &self.kind {
            NodeKind::TabPane(pane) => Some(pane),
            _ => None,
        }
    }

    /// Iterates over every templated string on this node.
    pub(crate) fn templated_mut(&mut self) -> impl Iterator<Item = &mut Templated> {
        std::iter::once(&mut self.segment)
            .chain(std::iter::once(&mut self.label))
            .chain(self.attrs.values_mut())
    }
}
