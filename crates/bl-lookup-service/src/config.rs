//! Service configuration.
//!
//! Loaded from a JSON file, then overridden from `BL_LOOKUP_*` environment
//! variables. Every field has a default, so `{}` is a valid file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use url::Url;

use bl_lookup_index::{IndexOptions, QualifierTable, DEFAULT_ROOTS};

use crate::authority::{RelationAuthority, StaticAuthority, DEFAULT_NAMESPACE, DEFAULT_RELATION};
use crate::error::ConfigError;
use crate::resolver::ResolverConfig;
use crate::source::{FileSchemaSource, RoutedSchemaSource, SchemaSource};
use crate::ubergraph::UBERGRAPH_ENDPOINT;

pub const ENV_PREFIX: &str = "BL_LOOKUP_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthorityKind {
    /// In-memory parent table (optionally loaded from `parents_file`).
    #[default]
    Static,
    /// Ubergraph SPARQL endpoint.
    Ubergraph,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorityConfig {
    pub kind: AuthorityKind,
    pub namespace: String,
    pub default_relation: String,
    pub endpoint: String,
    /// Parent table merged into the static authority; `namespace` and
    /// `default_relation` above still apply.
    pub parents_file: Option<PathBuf>,
    pub request_timeout_ms: u64,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            kind: AuthorityKind::Static,
            namespace: DEFAULT_NAMESPACE.to_string(),
            default_relation: DEFAULT_RELATION.to_string(),
            endpoint: UBERGRAPH_ENDPOINT.to_string(),
            parents_file: None,
            request_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Version label → schema document (file path or http(s) URL).
    pub versions: BTreeMap<String, String>,
    /// Label used when a caller names no version.
    pub default_version: String,
    pub roots: Vec<String>,
    /// Replaces the bundled qualifier table.
    pub qualifier_table: Option<PathBuf>,
    /// Per-request limit for remote schema documents.
    pub schema_timeout_ms: u64,
    pub authority: AuthorityConfig,
    pub resolver: ResolverConfig,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            versions: BTreeMap::new(),
            default_version: "latest".to_string(),
            roots: DEFAULT_ROOTS.iter().map(|r| r.to_string()).collect(),
            qualifier_table: None,
            schema_timeout_ms: 30_000,
            authority: AuthorityConfig::default(),
            resolver: ResolverConfig::default(),
        }
    }
}

impl LookupConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// `BL_LOOKUP_CONFIG` (if set) with the remaining `BL_LOOKUP_*`
    /// variables applied on top.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(format!("{ENV_PREFIX}CONFIG")) {
            Ok(path) => Self::from_path(path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(format!("{ENV_PREFIX}{name}")).ok())?;
        Ok(config)
    }

    /// Apply overrides by variable name (without the prefix).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("DEFAULT_VERSION") {
            self.default_version = v;
        }
        if let Some(v) = lookup("ROOTS") {
            self.roots = v
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(v) = lookup("VERSIONS") {
            // label=location,label=location
            for pair in v.split(',').filter(|p| !p.trim().is_empty()) {
                let (label, location) = pair.split_once('=').ok_or_else(|| {
                    ConfigError::Invalid(format!("{ENV_PREFIX}VERSIONS entry `{pair}` is not label=location"))
                })?;
                self.versions
                    .insert(label.trim().to_string(), location.trim().to_string());
            }
        }
        if let Some(v) = lookup("SCHEMA_TIMEOUT_MS") {
            self.schema_timeout_ms = v
                .trim()
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("{ENV_PREFIX}SCHEMA_TIMEOUT_MS: {e}")))?;
        }
        if let Some(v) = lookup("QUALIFIER_TABLE") {
            self.qualifier_table = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("AUTHORITY") {
            self.authority.kind = match v.trim().to_ascii_lowercase().as_str() {
                "static" => AuthorityKind::Static,
                "ubergraph" => AuthorityKind::Ubergraph,
                other => {
                    return Err(ConfigError::Invalid(format!(
                        "unknown authority `{other}` (expected static|ubergraph)"
                    )))
                }
            };
        }
        if let Some(v) = lookup("AUTHORITY_ENDPOINT") {
            self.authority.endpoint = v;
        }
        if let Some(v) = lookup("AUTHORITY_NAMESPACE") {
            self.authority.namespace = v;
        }
        if let Some(v) = lookup("DEFAULT_RELATION") {
            self.authority.default_relation = v;
        }
        if let Some(v) = lookup("WALK_TIMEOUT_MS") {
            let ms: u64 = v
                .trim()
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("{ENV_PREFIX}WALK_TIMEOUT_MS: {e}")))?;
            self.resolver.walk_timeout_ms = (ms > 0).then_some(ms);
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.roots.is_empty() {
            return Err(ConfigError::Invalid("at least one hierarchy root is required".to_string()));
        }
        if self.authority.kind == AuthorityKind::Ubergraph {
            Url::parse(&self.authority.endpoint).map_err(|e| {
                ConfigError::Invalid(format!("authority endpoint `{}`: {e}", self.authority.endpoint))
            })?;
        }
        for (label, location) in &self.versions {
            if is_remote(location) {
                Url::parse(location)
                    .map_err(|e| ConfigError::Invalid(format!("version `{label}`: {e}")))?;
            }
        }
        Ok(())
    }

    pub fn index_options(&self) -> Result<IndexOptions, ConfigError> {
        let qualifiers = match &self.qualifier_table {
            Some(path) => QualifierTable::from_path(path),
            None => QualifierTable::bundled(),
        }
        .map_err(|e| ConfigError::Invalid(format!("qualifier table: {e}")))?;
        Ok(IndexOptions::new(self.roots.clone(), qualifiers))
    }

    pub fn build_authority(&self) -> Result<Arc<dyn RelationAuthority>, ConfigError> {
        let a = &self.authority;
        match a.kind {
            AuthorityKind::Static => {
                let authority = StaticAuthority::new(&a.namespace, &a.default_relation);
                let authority = match &a.parents_file {
                    Some(path) => authority.with_parents_from_path(path)?,
                    None => authority,
                };
                Ok(Arc::new(authority))
            }
            #[cfg(feature = "ubergraph")]
            AuthorityKind::Ubergraph => {
                let authority = crate::ubergraph::UbergraphAuthority::new(
                    &a.endpoint,
                    &a.namespace,
                    &a.default_relation,
                    std::time::Duration::from_millis(a.request_timeout_ms),
                )
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
                Ok(Arc::new(authority))
            }
            #[cfg(not(feature = "ubergraph"))]
            AuthorityKind::Ubergraph => Err(ConfigError::Invalid(
                "ubergraph authority requires the `ubergraph` feature".to_string(),
            )),
        }
    }

    /// One source serving every configured version.
    pub fn build_source(&self) -> Result<Arc<dyn SchemaSource>, ConfigError> {
        let mut files = FileSchemaSource::new();
        let mut remote: Vec<(&str, &str)> = Vec::new();
        for (label, location) in &self.versions {
            if is_remote(location) {
                remote.push((label.as_str(), location.as_str()));
            } else {
                files = files.with_version(label, location);
            }
        }

        let mut routed = RoutedSchemaSource::new().with_source(Arc::new(files));
        if !remote.is_empty() {
            routed = routed.with_source(self.remote_source(&remote)?);
        }
        Ok(Arc::new(routed))
    }

    #[cfg(feature = "remote")]
    fn remote_source(&self, urls: &[(&str, &str)]) -> Result<Arc<dyn SchemaSource>, ConfigError> {
        let mut source = crate::source::HttpSchemaSource::new(
            "{version}",
            std::time::Duration::from_millis(self.schema_timeout_ms),
        )
        .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        for (label, url) in urls {
            source = source.with_url(label, url);
        }
        Ok(Arc::new(source))
    }

    #[cfg(not(feature = "remote"))]
    fn remote_source(&self, urls: &[(&str, &str)]) -> Result<Arc<dyn SchemaSource>, ConfigError> {
        let labels: Vec<&str> = urls.iter().map(|(label, _)| *label).collect();
        Err(ConfigError::Invalid(format!(
            "versions {} are remote; enable the `remote` feature",
            labels.join(", ")
        )))
    }
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_object_is_the_default_config() {
        let config = LookupConfig::from_json_str("{}").unwrap();
        assert_eq!(config, LookupConfig::default());
        assert_eq!(config.roots, vec!["related to", "association", "named thing"]);
        assert_eq!(config.resolver.qualifier_major, 3);
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config = LookupConfig::from_json_str(
            r#"{"versions": {"v3.1.2": "/tmp/b.yaml"}, "authority": {"namespace": "RO"}}"#,
        )
        .unwrap();
        let env: HashMap<&str, &str> = [
            ("ROOTS", "related to, named thing"),
            ("VERSIONS", "latest=/tmp/latest.yaml"),
            ("WALK_TIMEOUT_MS", "0"),
            ("DEFAULT_RELATION", "biolink:related_to"),
        ]
        .into_iter()
        .collect();
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.roots, vec!["related to", "named thing"]);
        assert_eq!(config.versions.len(), 2);
        assert_eq!(config.resolver.walk_timeout_ms, None);
        assert_eq!(config.authority.default_relation, "biolink:related_to");
    }

    #[tokio::test]
    async fn static_authority_keeps_configured_identity_with_a_parents_file() {
        let dir = tempfile::tempdir().unwrap();
        let parents = dir.path().join("parents.json");
        std::fs::write(&parents, r#"{"parents": {"GO:0000001": ["GO:0000002"]}}"#).unwrap();

        let mut config = LookupConfig::default();
        config.authority.namespace = "GO".to_string();
        config.authority.parents_file = Some(parents);
        config
            .apply_overrides(|k| (k == "DEFAULT_RELATION").then(|| "biolink:related_to".to_string()))
            .unwrap();

        let authority = config.build_authority().unwrap();
        assert_eq!(authority.namespace(), "GO");
        assert_eq!(authority.default_relation(), "biolink:related_to");
        assert_eq!(authority.parents_of("GO:0000001").await.unwrap(), vec!["GO:0000002"]);
    }

    #[test]
    fn schema_downloads_have_their_own_timeout() {
        let mut config = LookupConfig::from_json_str(r#"{"authority": {"request_timeout_ms": 100}}"#).unwrap();
        assert_eq!(config.schema_timeout_ms, 30_000);
        config
            .apply_overrides(|k| (k == "SCHEMA_TIMEOUT_MS").then(|| "2500".to_string()))
            .unwrap();
        assert_eq!(config.schema_timeout_ms, 2_500);
        assert_eq!(config.authority.request_timeout_ms, 100);
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = LookupConfig::default();
        let err = config
            .apply_overrides(|k| (k == "AUTHORITY").then(|| "oracle".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        assert!(LookupConfig::from_json_str(r#"{"roots": []}"#).is_err());
        assert!(LookupConfig::from_json_str(r#"{"versions": {"x": "https://"}}"#).is_err());
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bl-lookup.json");
        std::fs::write(&path, r#"{"default_version": "v3.1.2"}"#).unwrap();
        let config = LookupConfig::from_path(&path).unwrap();
        assert_eq!(config.default_version, "v3.1.2");
        assert!(!config.index_options().unwrap().qualifiers.is_empty());
    }
}
