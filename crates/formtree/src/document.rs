//! JSON tree documents.
//!
//! A document describes a rendered form as nested nodes tagged by `kind`:
//!
//! ```json
//! {
//!   "kind": "group",
//!   "children": [
//!     {"kind": "text", "segment": "server_port", "label": "port", "value": "8080"},
//!     {
//!       "kind": "list",
//!       "segment": "workers",
//!       "items": 1,
//!       "template": {"kind": "group", "label": "#", "children": [
//!         {"kind": "text", "segment": "name", "value": ""}
//!       ]}
//!     }
//!   ]
//! }
//! ```
//!
//! Tab groups declare both sides of every button/pane pairing. A button
//! whose `target` is omitted targets the pane it controls. Bindings are
//! validated once the whole tree is built.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FormError, Result};
use crate::identity::IdAllocator;
use crate::list;
use crate::node::{
    Field, Node, NodeId, NodeKind, RadioGroup, TabButton, TabGroup, TabPane, PLACEHOLDER,
};
use crate::tabs::{groups, validate_bindings};
use crate::tree::FormTree;

/// One node of a tree document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Path segment, possibly containing the placeholder.
    #[serde(default)]
    pub segment: String,
    /// Caption.
    #[serde(default)]
    pub label: String,
    /// Extra renumbered attributes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    /// Kind-specific content.
    #[serde(flatten)]
    pub body: NodeBody,
}

/// Kind-specific content of a [`NodeSpec`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeBody {
    /// Plain fieldset.
    Group {
        /// Nested nodes.
        #[serde(default)]
        children: Vec<NodeSpec>,
    },
    /// Text input.
    Text {
        /// Current value.
        #[serde(default)]
        value: String,
    },
    /// Checkbox.
    Flag {
        /// Whether it is checked.
        #[serde(default)]
        value: bool,
    },
    /// Radio button group.
    Choice {
        /// Group name shared by the options.
        name: String,
        /// Option values.
        options: Vec<String>,
        /// Index of the checked option.
        #[serde(default)]
        selected: Option<usize>,
    },
    /// Repeatable list section.
    List {
        /// Prototype of every item. Must be a group.
        template: Box<NodeSpec>,
        /// Items created when the document is loaded.
        #[serde(default)]
        items: usize,
    },
    /// Tab group.
    Tabs {
        /// Buttons in display order.
        buttons: Vec<TabButton>,
        /// Panes with their declared controlling button.
        panes: Vec<PaneSpec>,
        /// Key of the selected button. Defaults to the first button.
        #[serde(default)]
        active: Option<String>,
    },
}

/// One pane of a tab group in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaneSpec {
    /// Document-unique pane id.
    pub id: String,
    /// Key of the controlling button.
    pub controlled_by: String,
    /// Path segment of the pane, usually empty.
    #[serde(default)]
    pub segment: String,
    /// Pane content.
    #[serde(default)]
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    fn with_body(segment: &str, body: NodeBody) -> Self {
        Self {
            segment: segment.to_string(),
            label: String::new(),
            attrs: BTreeMap::new(),
            body,
        }
    }

    /// A group node.
    pub fn group(segment: &str, children: Vec<NodeSpec>) -> Self {
        Self::with_body(segment, NodeBody::Group { children })
    }

    /// A text leaf.
    pub fn text(segment: &str, value: &str) -> Self {
        Self::with_body(
            segment,
            NodeBody::Text {
                value: value.to_string(),
            },
        )
    }

    /// A checkbox leaf.
    pub fn flag(segment: &str, value: bool) -> Self {
        Self::with_body(segment, NodeBody::Flag { value })
    }

    /// A radio group leaf with the first option selected.
    pub fn choice(segment: &str, name: &str, options: &[&str]) -> Self {
        Self::with_body(
            segment,
            NodeBody::Choice {
                name: name.to_string(),
                options: options.iter().map(ToString::to_string).collect(),
                selected: (!options.is_empty()).then_some(0),
            },
        )
    }

    /// A list section.
    pub fn list(segment: &str, template: NodeSpec, items: usize) -> Self {
        Self::with_body(
            segment,
            NodeBody::List {
                template: Box::new(template),
                items,
            },
        )
    }

    /// A tab group whose buttons target their panes.
    ///
    /// Each pane is `(id, key, children)`; one button per pane is created with
    /// the key as caption.
    pub fn tabs(panes: Vec<(&str, &str, Vec<NodeSpec>)>) -> Self {
        let buttons = panes
            .iter()
            .map(|(id, key, _)| TabButton {
                key: (*key).to_string(),
                caption: (*key).to_string(),
                target: (*id).to_string(),
            })
            .collect();
        let panes = panes
            .into_iter()
            .map(|(id, key, children)| PaneSpec {
                id: id.to_string(),
                controlled_by: key.to_string(),
                segment: String::new(),
                children,
            })
            .collect();
        Self::with_body(
            "",
            NodeBody::Tabs {
                buttons,
                panes,
                active: None,
            },
        )
    }

    /// Sets the caption.
    #[must_use]
    pub fn label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    /// Adds an attribute.
    #[must_use]
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    /// Selects a tab by key.
    #[must_use]
    pub fn active(mut self, key: &str) -> Self {
        if let NodeBody::Tabs { active, .. } = &mut self.body {
            *active = Some(key.to_string());
        }
        self
    }
}

/// Parses a JSON document and builds its tree.
///
/// # Errors
/// Returns [`FormError::InvalidDocument`] for malformed JSON or nodes, and any
/// structural error raised while validating tabs or creating initial items.
pub fn load(json: &str, ids: &mut dyn IdAllocator) -> Result<FormTree> {
    let spec: NodeSpec = serde_json::from_str(json)?;
    build(&spec, ids)
}

/// Builds a tree from a parsed document.
///
/// The root must be a group. Initial list items are added through the list
/// engine once every node exists, so they receive fresh identities like any
/// item added later.
pub fn build(spec: &NodeSpec, ids: &mut dyn IdAllocator) -> Result<FormTree> {
    let NodeBody::Group { children } = &spec.body else {
        return Err(FormError::invalid_document("root node must be a group"));
    };
    let mut tree = FormTree::new(base(spec, NodeKind::Group));
    let root = tree.root();
    let mut pending = Vec::new();
    for child in children {
        build_node(&mut tree, root, child, &mut pending)?;
    }

    for group in groups(&tree) {
        validate_bindings(&tree, group)?;
    }
    for (section, count) in pending {
        for _ in 0..count {
            list::add_item(&mut tree, section, ids)?;
        }
    }
    debug!(nodes = tree.len(), "document built");
    Ok(tree)
}

fn base(spec: &NodeSpec, kind: NodeKind) -> Node {
    spec.attrs.iter().fold(
        Node::new(kind)
            .segment(spec.segment.as_str())
            .label(spec.label.as_str()),
        |node, (name, value)| node.attr(name.as_str(), value.as_str()),
    )
}

fn build_node(
    tree: &mut FormTree,
    parent: NodeId,
    spec: &NodeSpec,
    pending: &mut Vec<(NodeId, usize)>,
) -> Result<NodeId> {
    match &spec.body {
        NodeBody::Group { children } => {
            let id = tree.append(parent, base(spec, NodeKind::Group))?;
            for child in children {
                build_node(tree, id, child, pending)?;
            }
            Ok(id)
        }
        NodeBody::Text { value } => {
            tree.append(parent, base(spec, NodeKind::Leaf(Field::Text(value.clone()))))
        }
        NodeBody::Flag { value } => {
            tree.append(parent, base(spec, NodeKind::Leaf(Field::Flag(*value))))
        }
        NodeBody::Choice {
            name,
            options,
            selected,
        } => {
            reserved("radio group name", name)?;
            if selected.is_some_and(|i| i >= options.len()) {
                return Err(FormError::invalid_document(format!(
                    "radio group {name:?} selects a missing option"
                )));
            }
            let group = RadioGroup {
                name: name.clone(),
                options: options.clone(),
                selected: *selected,
            };
            tree.append(parent, base(spec, NodeKind::Leaf(Field::Choice(group))))
        }
        NodeBody::List { template, items } => {
            let NodeBody::Group { children } = &template.body else {
                return Err(FormError::invalid_document(format!(
                    "template of list {:?} must be a group",
                    spec.segment
                )));
            };
            let section = tree.append(parent, base(spec, NodeKind::ListSection))?;
            let mut prototype = base(template, NodeKind::ListTemplate);
            if prototype.segment.is_empty() {
                prototype.segment = PLACEHOLDER.to_string().into();
            } else if !prototype.segment.is_templated() {
                return Err(FormError::invalid_document(format!(
                    "template segment {:?} of list {:?} has no {PLACEHOLDER} placeholder",
                    template.segment, spec.segment
                )));
            }
            let template_id = tree.append(section, prototype)?;
            for child in children {
                build_node(tree, template_id, child, pending)?;
            }
            pending.push((section, *items));
            Ok(section)
        }
        NodeBody::Tabs {
            buttons,
            panes,
            active,
        } => {
            let buttons: Vec<TabButton> = buttons
                .iter()
                .map(|button| -> Result<TabButton> {
                    reserved("tab key", &button.key)?;
                    let mut button = button.clone();
                    if button.target.is_empty() {
                        if let Some(pane) = panes.iter().find(|p| p.controlled_by == button.key) {
                            button.target = pane.id.clone();
                        }
                    }
                    Ok(button)
                })
                .collect::<Result<_>>()?;
            let active = active
                .clone()
                .or_else(|| buttons.first().map(|b| b.key.clone()))
                .unwrap_or_default();
            let group = tree.append(
                parent,
                base(spec, NodeKind::TabGroup(TabGroup { buttons, active })),
            )?;
            for pane in panes {
                reserved("pane id", &pane.id)?;
                let node = Node::new(NodeKind::TabPane(TabPane {
                    id: pane.id.clone(),
                    controlled_by: pane.controlled_by.clone(),
                }))
                .segment(pane.segment.as_str());
                let pane_id = tree.append(group, node)?;
                for child in &pane.children {
                    build_node(tree, pane_id, child, pending)?;
                }
            }
            Ok(group)
        }
    }
}

fn reserved(what: &str, value: &str) -> Result<()> {
    if value.contains(PLACEHOLDER) {
        return Err(FormError::invalid_document(format!(
            "{what} {value:?} contains the reserved placeholder"
        )));
    }
    Ok(())
}
