#![forbid(unsafe_code)]
// Allow pedantic lints for early-stage API ergonomics.
#![allow(clippy::nursery)]
#![allow(clippy::pedantic)]

//! # Formtree
//!
//! Serialization engine for dynamically generated configuration forms.
//!
//! A form is a tree of groups, fields, repeatable list sections, and tab
//! groups. Formtree provides:
//! - A path builder turning nodes into dotted keys such as
//!   `flower_server.server_host`
//! - A tree walker emitting one `[path, label, value]` record per field
//! - List sections whose items are cloned from a template, given fresh tab
//!   and radio identities, and renumbered after every add or remove
//! - Assemblers building nested submissions, YAML documents, and prefill
//!   payloads from walked records
//!
//! ## Example
//!
//! ```rust
//! use formtree::{Config, Form};
//!
//! let doc = r##"{
//!     "kind": "group",
//!     "children": [
//!         {"kind": "list", "segment": "workers", "template": {
//!             "kind": "group", "label": "#", "children": [
//!                 {"kind": "text", "segment": "name", "value": "worker"}
//!             ]
//!         }}
//!     ]
//! }"##;
//!
//! let mut form = Form::load(doc, &Config::default()).unwrap();
//! let workers = form.section("workers").unwrap();
//! form.add_item(workers).unwrap();
//! form.add_item(workers).unwrap();
//!
//! let paths: Vec<String> = form.walk().unwrap().records().into_iter().map(|r| r.path).collect();
//! assert_eq!(paths, ["workers.0.name", "workers.1.name"]);
//! ```

pub mod assemble;
pub mod config;
pub mod document;
mod error;
mod form;
pub mod identity;
pub mod list;
mod node;
pub mod path;
pub mod session;
pub mod tabs;
mod tree;
pub mod walk;

pub use assemble::{ListenScope, OptionSetting, Prefill, SpecialRules, Visibility};
pub use config::Config;
pub use document::{NodeBody, NodeSpec, PaneSpec};
pub use error::{FormError, Result};
pub use form::{Form, RadioInit};
pub use identity::{IdAllocator, Reidentified, SequenceAllocator};
pub use list::AddedItem;
pub use node::{
    Field, Node, NodeId, NodeKind, RadioGroup, TabButton, TabGroup, TabPane, Templated,
    PLACEHOLDER,
};
pub use session::{Indicator, Navigator, Persistence, Session, Transport};
pub use tree::FormTree;
pub use walk::{Record, Walk, WalkEntry};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        Config, Field, Form, FormError, FormTree, IdAllocator, Node, NodeId, NodeKind, NodeSpec,
        Prefill, Record, Result, SequenceAllocator, Session, SpecialRules, Walk,
    };

    pub use crate::{assemble, list, path, tabs, walk};
}
