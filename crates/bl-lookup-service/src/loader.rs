//! Fetch, index and publish schema versions.

use std::sync::Arc;

use tokio::task::JoinSet;

use bl_lookup_index::{IndexOptions, VersionIndex, VersionRegistry};

use crate::error::LookupError;
use crate::source::SchemaSource;

pub struct VersionLoader {
    source: Arc<dyn SchemaSource>,
    registry: Arc<VersionRegistry>,
    options: Arc<IndexOptions>,
}

impl VersionLoader {
    pub fn new(
        source: Arc<dyn SchemaSource>,
        registry: Arc<VersionRegistry>,
        options: IndexOptions,
    ) -> Self {
        Self {
            source,
            registry,
            options: Arc::new(options),
        }
    }

    pub fn registry(&self) -> &Arc<VersionRegistry> {
        &self.registry
    }

    /// Labels the source can serve.
    pub fn available(&self) -> Vec<String> {
        self.source.labels()
    }

    /// Fetch and index one version, then swap it into the registry.
    ///
    /// Also used to rebuild floating labels such as `latest`: the previous
    /// build keeps serving until the new one is installed, and stays if the
    /// rebuild fails.
    pub async fn load(&self, label: &str) -> Result<Arc<VersionIndex>, LookupError> {
        load_one(
            Arc::clone(&self.source),
            Arc::clone(&self.registry),
            Arc::clone(&self.options),
            label.to_string(),
        )
        .await
    }

    /// Load several versions concurrently. Each label reports on its own.
    pub async fn load_all(&self, labels: &[String]) -> Vec<(String, Result<(), LookupError>)> {
        let mut tasks = JoinSet::new();
        for label in labels {
            let source = Arc::clone(&self.source);
            let registry = Arc::clone(&self.registry);
            let options = Arc::clone(&self.options);
            let label = label.clone();
            tasks.spawn(async move {
                let result = load_one(source, registry, options, label.clone())
                    .await
                    .map(|_| ());
                (label, result)
            });
        }

        let mut reports = Vec::with_capacity(labels.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(err) => tracing::error!(error = %err, "version load task panicked"),
            }
        }
        reports.sort_by(|a, b| a.0.cmp(&b.0));
        reports
    }
}

async fn load_one(
    source: Arc<dyn SchemaSource>,
    registry: Arc<VersionRegistry>,
    options: Arc<IndexOptions>,
    label: String,
) -> Result<Arc<VersionIndex>, LookupError> {
    let snapshot = source.fetch(&label).await.map_err(|err| {
        tracing::warn!(version = %label, error = %err, "schema fetch failed");
        err
    })?;

    let build_label = label.clone();
    let index = tokio::task::spawn_blocking(move || VersionIndex::build(&build_label, snapshot, &options))
        .await
        .map_err(|e| LookupError::Task(e.to_string()))?
        .map_err(|err| {
            tracing::warn!(version = %label, error = %err, "schema indexing failed");
            LookupError::Index(err)
        })?;

    let (installed, replaced) = registry.install(index);
    tracing::info!(version = %label, replaced = replaced.is_some(), "schema version installed");
    Ok(installed)
}
