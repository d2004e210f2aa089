//! Where schema documents come from.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use bl_lookup_model::{snapshot_from_linkml_yaml, SchemaSnapshot};

use crate::error::SourceError;

#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// Fetch and parse the schema document for a version label.
    async fn fetch(&self, label: &str) -> Result<SchemaSnapshot, SourceError>;

    /// Labels this source can serve.
    fn labels(&self) -> Vec<String>;
}

fn unavailable(label: &str, reason: impl ToString) -> SourceError {
    SourceError::SchemaUnavailable {
        version: label.to_string(),
        reason: reason.to_string(),
    }
}

fn parse(label: &str, text: &str) -> Result<SchemaSnapshot, SourceError> {
    snapshot_from_linkml_yaml(text).map_err(|e| unavailable(label, e))
}

// ============================================================================
// Local files
// ============================================================================

/// Version label → LinkML YAML file on disk.
#[derive(Debug, Clone, Default)]
pub struct FileSchemaSource {
    paths: BTreeMap<String, PathBuf>,
}

impl FileSchemaSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(mut self, label: &str, path: impl Into<PathBuf>) -> Self {
        self.paths.insert(label.to_string(), path.into());
        self
    }
}

#[async_trait]
impl SchemaSource for FileSchemaSource {
    async fn fetch(&self, label: &str) -> Result<SchemaSnapshot, SourceError> {
        let path = self
            .paths
            .get(label)
            .ok_or_else(|| unavailable(label, "no schema file configured"))?;
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| unavailable(label, format!("{}: {e}", path.display())))?;
        parse(label, &text)
    }

    fn labels(&self) -> Vec<String> {
        self.paths.keys().cloned().collect()
    }
}

// ============================================================================
// Routing
// ============================================================================

/// Dispatches each label to the source configured for it.
#[derive(Default)]
pub struct RoutedSchemaSource {
    routes: BTreeMap<String, Arc<dyn SchemaSource>>,
}

impl RoutedSchemaSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route every label `source` serves to it. Later routes win.
    pub fn with_source(mut self, source: Arc<dyn SchemaSource>) -> Self {
        for label in source.labels() {
            self.routes.insert(label, Arc::clone(&source));
        }
        self
    }
}

#[async_trait]
impl SchemaSource for RoutedSchemaSource {
    async fn fetch(&self, label: &str) -> Result<SchemaSnapshot, SourceError> {
        match self.routes.get(label) {
            Some(source) => source.fetch(label).await,
            None => Err(unavailable(label, "no source configured for version")),
        }
    }

    fn labels(&self) -> Vec<String> {
        self.routes.keys().cloned().collect()
    }
}

// ============================================================================
// HTTP
// ============================================================================

#[cfg(feature = "remote")]
pub use http::HttpSchemaSource;

#[cfg(feature = "remote")]
mod http {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use async_trait::async_trait;
    use reqwest::Client;
    use url::Url;

    use bl_lookup_model::SchemaSnapshot;

    use super::{parse, unavailable, SchemaSource};
    use crate::error::SourceError;

    /// Fetches `biolink-model.yaml` from a URL template such as
    /// `https://raw.githubusercontent.com/biolink/biolink-model/{version}/biolink-model.yaml`.
    pub struct HttpSchemaSource {
        client: Client,
        template: String,
        /// Label → the `{version}` value substituted into the template.
        refs: BTreeMap<String, String>,
        /// Label → full document URL, bypassing the template.
        urls: BTreeMap<String, String>,
    }

    impl HttpSchemaSource {
        pub fn new(template: &str, timeout: Duration) -> Result<Self, SourceError> {
            let client = Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| unavailable("*", e))?;
            Ok(Self {
                client,
                template: template.to_string(),
                refs: BTreeMap::new(),
                urls: BTreeMap::new(),
            })
        }

        pub fn with_version(mut self, label: &str, git_ref: &str) -> Self {
            self.refs.insert(label.to_string(), git_ref.to_string());
            self
        }

        pub fn with_url(mut self, label: &str, url: &str) -> Self {
            self.urls.insert(label.to_string(), url.to_string());
            self
        }

        pub fn url_for(&self, label: &str) -> Result<Url, SourceError> {
            if let Some(url) = self.urls.get(label) {
                return Url::parse(url).map_err(|e| unavailable(label, format!("{url}: {e}")));
            }
            let git_ref = self.refs.get(label).map(String::as_str).unwrap_or(label);
            let raw = self.template.replace("{version}", git_ref);
            Url::parse(&raw).map_err(|e| unavailable(label, format!("{raw}: {e}")))
        }
    }

    #[async_trait]
    impl SchemaSource for HttpSchemaSource {
        async fn fetch(&self, label: &str) -> Result<SchemaSnapshot, SourceError> {
            let url = self.url_for(label)?;
            tracing::info!(version = %label, url = %url, "fetching schema");
            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| unavailable(label, e))?;
            if !response.status().is_success() {
                return Err(unavailable(label, format!("{url} returned {}", response.status())));
            }
            let text = response.text().await.map_err(|e| unavailable(label, e))?;
            parse(label, &text)
        }

        fn labels(&self) -> Vec<String> {
            let mut labels: Vec<String> = self.refs.keys().chain(self.urls.keys()).cloned().collect();
            labels.sort();
            labels.dedup();
            labels
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_source_reads_configured_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("biolink-model.yaml");
        std::fs::write(&path, "version: 3.1.2\nclasses:\n  named thing: {}\n").unwrap();

        let source = FileSchemaSource::new().with_version("v3.1.2", &path);
        let snap = source.fetch("v3.1.2").await.unwrap();
        assert_eq!(snap.schema_version.as_deref(), Some("3.1.2"));
        assert_eq!(source.labels(), vec!["v3.1.2"]);

        assert!(matches!(
            source.fetch("v9.9.9").await,
            Err(SourceError::SchemaUnavailable { version, .. }) if version == "v9.9.9"
        ));
    }

    #[tokio::test]
    async fn routed_source_dispatches_by_label() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.yaml");
        let b = dir.path().join("b.yaml");
        std::fs::write(&a, "version: 2.4.7\n").unwrap();
        std::fs::write(&b, "version: 3.1.2\n").unwrap();

        let routed = RoutedSchemaSource::new()
            .with_source(Arc::new(FileSchemaSource::new().with_version("v2.4.7", &a)))
            .with_source(Arc::new(FileSchemaSource::new().with_version("v3.1.2", &b)));
        assert_eq!(routed.labels(), vec!["v2.4.7", "v3.1.2"]);
        let snap = routed.fetch("v3.1.2").await.unwrap();
        assert_eq!(snap.schema_version.as_deref(), Some("3.1.2"));
        assert!(routed.fetch("latest").await.is_err());
    }

    #[tokio::test]
    async fn unparseable_documents_are_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "- just\n- a list\n").unwrap();

        let source = FileSchemaSource::new().with_version("broken", &path);
        assert!(source.fetch("broken").await.is_err());
    }
}
