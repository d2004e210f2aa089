//! Relation authorities: external answers to "what is the parent of this
//! relation?" for identifiers the schema does not map.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{AuthorityError, ConfigError};

/// Identifier prefix the authority answers for.
pub const DEFAULT_NAMESPACE: &str = "RO";
/// Identifier resolved when nothing else matches.
pub const DEFAULT_RELATION: &str = "skos:relatedMatch";

#[async_trait]
pub trait RelationAuthority: Send + Sync {
    /// Identifiers with this prefix are eligible for the parent walk.
    fn namespace(&self) -> &str;

    fn default_relation(&self) -> &str;

    /// Direct parents of `identifier`, as CURIEs, in authority order.
    async fn parents_of(&self, identifier: &str) -> Result<Vec<String>, AuthorityError>;
}

/// Prefix of a CURIE (`RO:0002606` → `RO`), compared case-insensitively by
/// callers.
pub fn curie_prefix(identifier: &str) -> Option<&str> {
    identifier.split_once(':').map(|(prefix, _)| prefix)
}

/// In-memory parent table.
#[derive(Debug, Clone)]
pub struct StaticAuthority {
    namespace: String,
    default_relation: String,
    parents: HashMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct StaticAuthorityFile {
    #[serde(default = "default_namespace")]
    namespace: String,
    #[serde(default = "default_relation")]
    default_relation: String,
    #[serde(default)]
    parents: HashMap<String, Vec<String>>,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_relation() -> String {
    DEFAULT_RELATION.to_string()
}

impl Default for StaticAuthority {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE, DEFAULT_RELATION)
    }
}

impl StaticAuthority {
    pub fn new(namespace: &str, default_relation: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            default_relation: default_relation.to_string(),
            parents: HashMap::new(),
        }
    }

    pub fn with_parent(mut self, child: &str, parent: &str) -> Self {
        self.parents
            .entry(child.to_string())
            .or_default()
            .push(parent.to_string());
        self
    }

    /// `{"namespace": "RO", "default_relation": "...", "parents": {"RO:1": ["RO:2"]}}`
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let file: StaticAuthorityFile =
            serde_json::from_str(text).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(Self {
            namespace: file.namespace,
            default_relation: file.default_relation,
            parents: file.parents,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Add the parent table of an authority file, keeping this authority's
    /// namespace and default relation.
    pub fn with_parents_from_path(mut self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = Self::from_path(path)?;
        for (child, parents) in file.parents {
            self.parents.entry(child).or_default().extend(parents);
        }
        Ok(self)
    }
}

#[async_trait]
impl RelationAuthority for StaticAuthority {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn default_relation(&self) -> &str {
        &self.default_relation
    }

    async fn parents_of(&self, identifier: &str) -> Result<Vec<String>, AuthorityError> {
        Ok(self.parents.get(identifier).cloned().unwrap_or_default())
    }
}
