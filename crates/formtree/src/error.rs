//! Error types for form tree operations.

use thiserror::Error;

use crate::node::NodeId;

/// Errors that can occur while walking, editing, or assembling a form tree.
///
/// # Error Classes
///
/// | Class | Variants | Handling |
/// |-------|----------|----------|
/// | Structural | [`MissingTemplate`](FormError::MissingTemplate), [`UnresolvedPlaceholder`](FormError::UnresolvedPlaceholder), [`TabBindingMismatch`](FormError::TabBindingMismatch), ... | Abort the current edit, log, leave the tree as it was |
/// | Invariant | [`IdentityCollision`](FormError::IdentityCollision) | Must never happen; indicates an allocator defect |
/// | Input | [`MissingRecord`](FormError::MissingRecord), [`InvalidDocument`](FormError::InvalidDocument), [`Config`](FormError::Config) | Report to the caller |
/// | Collaborator | [`Transport`](FormError::Transport), [`Persistence`](FormError::Persistence), [`Io`](FormError::Io) | Show a failure indicator, retry |
///
/// Structural errors are a developer-facing defect class. Every operation that
/// can raise one runs its fallible steps before touching the live tree, so
/// the tree is never left mis-indexed or mis-bound.
///
/// # Note on Clone and PartialEq
///
/// Like the rest of the crate's value types this error implements `Clone`
/// and `PartialEq`, so collaborator failures carry a `String` message rather
/// than the underlying error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// A list section has no template child to clone from.
    #[error("list section {section} has no template")]
    MissingTemplate {
        /// The offending section.
        section: NodeId,
    },

    /// A path segment still carries the index placeholder.
    ///
    /// Segments inside a list item are resolved by renumbering; reaching the
    /// path builder with an unresolved `#` means an item was never numbered.
    #[error("unresolved placeholder in segment {template:?} of {node}")]
    UnresolvedPlaceholder {
        /// The node whose segment is unresolved.
        node: NodeId,
        /// The raw template text.
        template: String,
    },

    /// Tab buttons and panes do not pair up one to one.
    #[error("tab binding mismatch in {group}: {detail}")]
    TabBindingMismatch {
        /// The tab group being validated.
        group: NodeId,
        /// What failed to pair.
        detail: String,
    },

    /// The node is not a list section.
    #[error("{0} is not a list section")]
    NotAListSection(NodeId),

    /// The node is not an item of a list section.
    #[error("{0} is not a list item")]
    NotAListItem(NodeId),

    /// The node is not a tab group.
    #[error("{0} is not a tab group")]
    NotATabGroup(NodeId),

    /// The node id does not refer to a live node.
    #[error("{0} does not exist")]
    UnknownNode(NodeId),

    /// No button in the tab group has this key.
    #[error("unknown tab {key:?} in {group}")]
    UnknownTab {
        /// The tab group.
        group: NodeId,
        /// The requested key.
        key: String,
    },

    /// No node is reachable at this dotted path.
    #[error("no node at path {0:?}")]
    UnknownPath(String),

    /// A freshly allocated identifier was already issued in this document.
    #[error("identifier collision: {0}")]
    IdentityCollision(String),

    /// A record required to derive prefill values is absent.
    #[error("missing record: {0}")]
    MissingRecord(String),

    /// A tree document could not be parsed or is malformed.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Configuration could not be parsed.
    #[error("config error: {0}")]
    Config(String),

    /// The transport collaborator failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The persistence collaborator failed.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// IO error while reading documents or configuration.
    #[error("io error: {0}")]
    Io(String),
}

impl FormError {
    /// Creates a transport error with the given message.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a persistence error with the given message.
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }

    /// Creates an invalid document error with the given message.
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument(message.into())
    }

    /// Creates an IO error with the given message.
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(message.into())
    }

    /// Returns true for defects in the tree's structure or bindings.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::MissingTemplate { .. }
                | Self::UnresolvedPlaceholder { .. }
                | Self::TabBindingMismatch { .. }
                | Self::NotAListSection(_)
                | Self::NotAListItem(_)
                | Self::NotATabGroup(_)
                | Self::UnknownNode(_)
                | Self::UnknownTab { .. }
                | Self::UnknownPath(_)
        )
    }

    /// Returns true if an external collaborator failed.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Persistence(_))
    }

    /// Returns true if retrying the operation can succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Persistence(_) | Self::Io(_))
    }
}

impl From<std::io::Error> for FormError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for FormError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidDocument(err.to_string())
    }
}

/// A specialized [`Result`] type for form tree operations.
pub type Result<T> = std::result::Result<T, FormError>;
