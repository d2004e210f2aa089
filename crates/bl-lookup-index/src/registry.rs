//! Per-version indexes and the table that serves them.
//!
//! A [`VersionIndex`] is built once, off to the side, and only then published
//! into the [`VersionRegistry`]. Readers clone an `Arc` under a short read
//! lock, so a lookup sees either the previous build of a version or the new
//! one, never a half-built index.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rayon::prelude::*;

use bl_lookup_model::{Entity, SchemaRelease, SchemaSnapshot};

use crate::error::IndexError;
use crate::hierarchy::{HierarchyIndex, HierarchyRecord, DEFAULT_ROOTS};
use crate::mapping::MappingIndex;
use crate::qualifiers::QualifierTable;

/// Inputs shared by every version build.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub roots: Vec<String>,
    pub qualifiers: Arc<QualifierTable>,
}

impl IndexOptions {
    pub fn new(roots: Vec<String>, qualifiers: QualifierTable) -> Self {
        Self {
            roots,
            qualifiers: Arc::new(qualifiers),
        }
    }

    /// Default roots with the bundled qualifier table.
    pub fn bundled() -> Result<Self, IndexError> {
        Ok(Self::new(default_roots(), QualifierTable::bundled()?))
    }
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self::new(default_roots(), QualifierTable::default())
    }
}

fn default_roots() -> Vec<String> {
    DEFAULT_ROOTS.iter().map(|r| r.to_string()).collect()
}

/// Everything the lookups of one version label need.
#[derive(Debug)]
pub struct VersionIndex {
    pub label: String,
    /// Release the label stands for, if one can be determined.
    pub release: Option<SchemaRelease>,
    pub snapshot: SchemaSnapshot,
    pub hierarchy: HierarchyIndex,
    pub mappings: MappingIndex,
    pub qualifiers: Arc<QualifierTable>,
}

impl VersionIndex {
    pub fn build(
        label: &str,
        snapshot: SchemaSnapshot,
        options: &IndexOptions,
    ) -> Result<Self, IndexError> {
        let hierarchy = HierarchyIndex::build(&snapshot, &options.roots)?;
        let mappings = MappingIndex::build(&snapshot, hierarchy.scope());
        let release = SchemaRelease::resolve(label, snapshot.schema_version.as_deref());
        if release.is_none() {
            tracing::warn!(
                version = %label,
                "no release number for version; epoch-dependent rewrites disabled"
            );
        }

        tracing::debug!(
            version = %label,
            entities = snapshot.len(),
            indexed = hierarchy.len(),
            identifiers = mappings.len(),
            "indexed schema version"
        );

        Ok(Self {
            label: label.to_string(),
            release,
            snapshot,
            hierarchy,
            mappings,
            qualifiers: Arc::clone(&options.qualifiers),
        })
    }

    /// Major release number, `0` when unknown.
    pub fn major(&self) -> u32 {
        self.release.map(|r| r.major).unwrap_or(0)
    }

    /// Look up by raw name, key or CURIE.
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.snapshot.get(name)
    }

    pub fn record(&self, key: &str) -> Option<&HierarchyRecord> {
        self.hierarchy.get(key)
    }
}

/// Outcome of one version in [`VersionRegistry::build_all`].
#[derive(Debug)]
pub struct BuildReport {
    pub label: String,
    pub result: Result<(), IndexError>,
}

#[derive(Debug, Default)]
pub struct VersionRegistry {
    versions: RwLock<BTreeMap<String, Arc<VersionIndex>>>,
}

impl VersionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, label: &str) -> Option<Arc<VersionIndex>> {
        self.versions.read().get(label).cloned()
    }

    pub fn require(&self, label: &str) -> Result<Arc<VersionIndex>, IndexError> {
        self.get(label).ok_or_else(|| IndexError::VersionNotFound {
            version: label.to_string(),
        })
    }

    /// Publish a complete index, replacing any previous build of the label.
    ///
    /// Returns the published index and the build it replaced. The first is
    /// exactly what was installed, even if another install of the same label
    /// has landed since.
    pub fn install(&self, index: VersionIndex) -> (Arc<VersionIndex>, Option<Arc<VersionIndex>>) {
        let label = index.label.clone();
        let index = Arc::new(index);
        let replaced = self.versions.write().insert(label, Arc::clone(&index));
        (index, replaced)
    }

    pub fn remove(&self, label: &str) -> Option<Arc<VersionIndex>> {
        self.versions.write().remove(label)
    }

    /// Loaded labels, sorted.
    pub fn labels(&self) -> Vec<String> {
        self.versions.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.versions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.read().is_empty()
    }

    /// Build and install several versions in parallel.
    ///
    /// Each version succeeds or fails on its own; a failed build leaves any
    /// previously installed index of that label in place.
    pub fn build_all(
        &self,
        snapshots: Vec<(String, SchemaSnapshot)>,
        options: &IndexOptions,
    ) -> Vec<BuildReport> {
        snapshots
            .into_par_iter()
            .map(|(label, snapshot)| {
                let result = VersionIndex::build(&label, snapshot, options).map(|index| {
                    self.install(index);
                });
                if let Err(err) = &result {
                    tracing::warn!(version = %label, error = %err, "failed to index schema version");
                }
                BuildReport { label, result }
            })
            .collect()
    }
}
