//! Assembles walked records into outbound payloads.
//!
//! Two shapes are produced from one record sequence:
//!
//! - a nested submission mirroring the dotted paths ([`to_submission`]),
//!   optionally rendered as a YAML document ([`to_yaml`]);
//! - a prefill payload used to pre-populate another form instance, with
//!   set and lock lists for options and derived values ([`to_prefill`]).
//!
//! Duplicate paths resolve last-write-wins. Callers choose which duplicate
//! wins by choosing the traversal order of the records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{FormError, Result};
use crate::path::segments;
use crate::walk::Record;

// -----------------------------------------------------------------------------
// Contract A: nested submission
// -----------------------------------------------------------------------------

/// Merges records into nested mappings keyed by path segment.
///
/// A scalar is replaced by a mapping when a deeper path needs one, and a
/// mapping is replaced by a scalar when a later record ends there.
///
/// ```rust
/// use formtree::{assemble, Record};
///
/// let records = [Record::new("a.b", "", "1"), Record::new("a.c", "", "2")];
/// let value = assemble::to_submission(&records);
/// assert_eq!(value, serde_json::json!({"a": {"b": "1", "c": "2"}}));
/// ```
pub fn to_submission(records: &[Record]) -> Value {
    let mut root = Map::new();
    for record in records {
        if record.path.is_empty() {
            warn!(label = %record.label, "skipping record with empty path");
            continue;
        }
        insert(&mut root, &record.path, &record.value);
    }
    Value::Object(root)
}

fn insert(root: &mut Map<String, Value>, path: &str, value: &str) {
    let keys: Vec<&str> = segments(path).collect();
    let Some((last, parents)) = keys.split_last() else {
        return;
    };
    let mut cursor = root;
    for key in parents {
        let slot = cursor
            .entry((*key).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(next) = slot else {
            return;
        };
        cursor = next;
    }
    cursor.insert((*last).to_string(), Value::String(value.to_string()));
}

/// Turns mappings whose keys are all decimal indices into sequences.
///
/// Only dense mappings convert: every index must be below the number of
/// keys, so `{"0": .., "1": ..}` becomes a sequence while `{"2": ..}` or a
/// huge index stays a mapping. Items are ordered by index.
pub fn to_document(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let converted: Map<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), to_document(v)))
                .collect();
            match indexed(&converted) {
                Some(items) => Value::Array(items),
                None => Value::Object(converted),
            }
        }
        other => other.clone(),
    }
}

fn indexed(map: &Map<String, Value>) -> Option<Vec<Value>> {
    if map.is_empty() {
        return None;
    }
    let mut items = vec![Value::Object(Map::new()); map.len()];
    for (key, value) in map {
        if !key.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let index = key.parse::<usize>().ok()?;
        *items.get_mut(index)? = value.clone();
    }
    Some(items)
}

/// Renders records as a YAML configuration document.
pub fn to_yaml(records: &[Record]) -> Result<String> {
    let document = to_document(&to_submission(records));
    serde_yaml::to_string(&document).map_err(|e| FormError::invalid_document(e.to_string()))
}

// -----------------------------------------------------------------------------
// Contract B: prefill
// -----------------------------------------------------------------------------

/// Whether a dependent option is shown in the target form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// The option's pane is selected.
    Visible,
    /// The option's pane is not selected.
    Hidden,
}

impl Visibility {
    /// Visible only when `protocol` is the secure one.
    pub fn from_protocol(protocol: Option<&str>, secure_protocol: &str) -> Self {
        if protocol == Some(secure_protocol) {
            Self::Visible
        } else {
            Self::Hidden
        }
    }

    /// Returns true for [`Visibility::Visible`].
    pub fn is_visible(self) -> bool {
        self == Self::Visible
    }
}

/// Which interfaces a server listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenScope {
    /// Every interface.
    WholeInternet,
    /// Loopback only.
    Loopback,
}

impl ListenScope {
    /// Maps the listen-to choice onto a scope.
    pub fn from_choice(choice: &str, whole_internet: &str) -> Self {
        if choice == whole_internet {
            Self::WholeInternet
        } else {
            Self::Loopback
        }
    }

    /// Returns the bracketed address literal.
    pub fn address(self) -> &'static str {
        match self {
            Self::WholeInternet => "[::]",
            Self::Loopback => "[::1]",
        }
    }
}

/// A value in `optionsSet`: either a plain value or a visibility selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionSetting {
    /// Selects the visible or hidden pane of an optional field.
    Visibility(Visibility),
    /// A value passed through verbatim.
    Value(String),
}

impl From<Visibility> for OptionSetting {
    fn from(value: Visibility) -> Self {
        Self::Visibility(value)
    }
}

impl From<&str> for OptionSetting {
    fn from(value: &str) -> Self {
        Self::Value(value.to_string())
    }
}

/// Which records are special and what the derived keys are called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialRules {
    /// Section holding `server_host`, `server_port`, `server_listen_to`,
    /// and `server_protocol`.
    pub section: String,
    /// Listen-to value meaning every interface.
    pub whole_internet: String,
    /// Protocol value that makes the visibility options visible.
    pub secure_protocol: String,
    /// Key of the derived listen address.
    pub listen_address_key: String,
    /// Key of the derived peer address.
    pub peer_address_key: String,
    /// Option keys whose visibility follows the protocol.
    pub visibility_options: Vec<String>,
    /// Value keys always locked in the target form.
    pub locked_values: Vec<String>,
}

impl Default for SpecialRules {
    fn default() -> Self {
        Self {
            section: "flower_server".to_string(),
            whole_internet: "the whole internet".to_string(),
            secure_protocol: "https".to_string(),
            listen_address_key: "server_listen_address".to_string(),
            peer_address_key: "server_address".to_string(),
            visibility_options: vec!["ssl".to_string()],
            locked_values: vec!["root_dir".to_string()],
        }
    }
}

impl SpecialRules {
    /// Default rules reading the special records from another section.
    pub fn for_section(section: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            ..Self::default()
        }
    }

    /// Returns the full path of a special field.
    pub fn key(&self, field: &str) -> String {
        if self.section.is_empty() {
            field.to_string()
        } else {
            format!("{}.{field}", self.section)
        }
    }

    fn special_keys(&self) -> [String; 4] {
        [
            self.key("server_host"),
            self.key("server_port"),
            self.key("server_listen_to"),
            self.key("server_protocol"),
        ]
    }
}

/// Set and lock lists used to pre-populate a target form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prefill {
    /// Option values, keyed by path.
    pub options_set: BTreeMap<String, OptionSetting>,
    /// Option keys rendered read-only.
    pub options_lock: Vec<String>,
    /// Derived values.
    pub values_set: BTreeMap<String, String>,
    /// Value keys rendered read-only.
    pub values_lock: Vec<String>,
}

impl Prefill {
    /// Serializes the payload as compact JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Builds the prefill payload.
///
/// Duplicate paths resolve last-write-wins, as in [`to_submission`]: both
/// the special records and the pass-through options take the value of the
/// last matching record in `records`.
pub fn to_prefill(records: &[Record], rules: &SpecialRules) -> Result<Prefill> {
    let [host_key, port_key, listen_key, protocol_key] = rules.special_keys();
    let lookup = |key: &str| records.iter().rev().find(|r| r.path == key);
    let required = |key: &String| lookup(key).ok_or_else(|| FormError::MissingRecord(key.clone()));

    let host = required(&host_key)?;
    let port = required(&port_key)?;
    let listen = required(&listen_key)?;
    let protocol = lookup(&protocol_key).map(|r| r.value.as_str());

    let scope = ListenScope::from_choice(&listen.value, &rules.whole_internet);
    let visibility = Visibility::from_protocol(protocol, &rules.secure_protocol);
    debug!(?scope, ?visibility, host = %host.value, port = %port.value, "prefill");

    let mut prefill = Prefill::default();
    prefill.values_set.insert(
        rules.listen_address_key.clone(),
        format!("{}:{}", scope.address(), port.value),
    );
    prefill.values_set.insert(
        rules.peer_address_key.clone(),
        format!("{}:{}", host.value, port.value),
    );
    let value_locks = rules
        .locked_values
        .iter()
        .chain([&rules.listen_address_key, &rules.peer_address_key]);
    for key in value_locks {
        push_unique(&mut prefill.values_lock, key);
    }

    for option in &rules.visibility_options {
        prefill.options_set.insert(option.clone(), visibility.into());
        push_unique(&mut prefill.options_lock, option);
    }

    let special = [&host_key, &port_key, &listen_key, &protocol_key];
    for record in records.iter().filter(|r| !special.contains(&&r.path)) {
        prefill
            .options_set
            .insert(record.path.clone(), OptionSetting::Value(record.value.clone()));
        push_unique(&mut prefill.options_lock, &record.path);
    }
    Ok(prefill)
}

fn push_unique(list: &mut Vec<String>, key: &str) {
    if !list.iter().any(|k| k == key) {
        list.push(key.to_string());
    }
}
