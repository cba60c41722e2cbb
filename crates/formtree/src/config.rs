//! Runtime configuration.
//!
//! [`Config`] collects everything a session needs besides the tree itself:
//! the identifier scope, backend endpoints, the suggested save name, and the
//! rules used to derive prefill payloads. Every field has a default, so an
//! empty file is a valid configuration.
//!
//! ```toml
//! [ids]
//! scope = "form"
//!
//! [endpoints]
//! model = "server"
//! check = "/config/{model}/json"
//!
//! [prefill]
//! section = "flower_server"
//! visibility_options = ["ssl"]
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assemble::SpecialRules;
use crate::error::{FormError, Result};
use crate::identity::SequenceAllocator;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Identifier allocation.
    pub ids: Ids,
    /// Backend endpoints used by the session.
    pub endpoints: Endpoints,
    /// Local save settings.
    pub save: Save,
    /// Rules for deriving the prefill payload.
    pub prefill: SpecialRules,
}

impl Config {
    /// Parses configuration from TOML text.
    ///
    /// # Errors
    /// Returns [`FormError::Config`] if the text is not valid TOML or has
    /// fields of the wrong type.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| FormError::Config(e.to_string()))
    }

    /// Reads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns [`FormError::Io`] if the file cannot be read and
    /// [`FormError::Config`] if it cannot be parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading config");
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Serializes this configuration back to TOML.
    ///
    /// # Errors
    /// Returns [`FormError::Config`] if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| FormError::Config(e.to_string()))
    }

    /// Creates the identifier allocator for a new document.
    pub fn allocator(&self) -> SequenceAllocator {
        SequenceAllocator::new(self.ids.scope.clone())
    }
}

/// Identifier allocation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ids {
    /// Prefix of every allocated identifier.
    pub scope: String,
}

impl Default for Ids {
    fn default() -> Self {
        Self {
            scope: "form".to_string(),
        }
    }
}

/// Backend endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// Endpoint validating a submission. `{model}` is replaced by [`model`](Self::model).
    pub check: String,
    /// Endpoint converting a submission to YAML.
    pub to_yaml: String,
    /// Configuration model name.
    pub model: String,
    /// Page opened with a prefill payload.
    pub prefill_target: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            check: "/config/{model}/json".to_string(),
            to_yaml: "/config/json/to_yaml".to_string(),
            model: "model".to_string(),
            prefill_target: "/server/config".to_string(),
        }
    }
}

impl Endpoints {
    /// Returns the check endpoint with the model substituted.
    pub fn check_url(&self) -> String {
        self.check.replace("{model}", &self.model)
    }
}

/// Local save settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Save {
    /// File name offered when saving a rendered configuration.
    pub suggested_name: String,
}

impl Default for Save {
    fn default() -> Self {
        Self {
            suggested_name: "config.yml".to_string(),
        }
    }
}
