//! The single entry point for presentation layers.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use bl_lookup_index::{HierarchyField, MappingEntry, VersionIndex, VersionRegistry};
use bl_lookup_model::{normalize, Entity};

use crate::error::LookupError;
use crate::resolver::{PredicateResolution, PredicateResolver};

/// Summary of one loaded version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub label: String,
    pub schema_version: Option<String>,
    pub release: Option<String>,
    pub entities: usize,
    pub indexed: usize,
    pub identifiers: usize,
}

pub struct LookupFacade {
    registry: Arc<VersionRegistry>,
    resolver: PredicateResolver,
}

impl LookupFacade {
    pub fn new(registry: Arc<VersionRegistry>, resolver: PredicateResolver) -> Self {
        Self { registry, resolver }
    }

    pub fn registry(&self) -> &Arc<VersionRegistry> {
        &self.registry
    }

    /// Loaded version labels, sorted.
    pub fn list_versions(&self) -> Vec<String> {
        self.registry.labels()
    }

    pub fn version(&self, version: &str) -> Result<Arc<VersionIndex>, LookupError> {
        Ok(self.registry.require(version)?)
    }

    pub fn version_info(&self, version: &str) -> Result<VersionInfo, LookupError> {
        let v = self.version(version)?;
        Ok(VersionInfo {
            label: v.label.clone(),
            schema_version: v.snapshot.schema_version.clone(),
            release: v.release.map(|r| r.to_string()),
            entities: v.snapshot.len(),
            indexed: v.hierarchy.len(),
            identifiers: v.mappings.len(),
        })
    }

    /// Schema properties of an indexed entity, by raw name, key or CURIE.
    pub fn get_entity(&self, version: &str, name: &str) -> Result<Map<String, Value>, LookupError> {
        let v = self.version(version)?;
        let entity = indexed_entity(&v, name)?;
        Ok(entity.attributes.clone())
    }

    /// One hierarchy list of an entity, duplicates removed.
    pub fn get_hierarchy_field(
        &self,
        version: &str,
        name: &str,
        field: &str,
    ) -> Result<Vec<String>, LookupError> {
        let v = self.version(version)?;
        let entity = indexed_entity(&v, name)?;
        let field_kind = HierarchyField::parse(field).ok_or_else(|| LookupError::FieldNotFound {
            entity: entity.raw_name.clone(),
            field: field.to_string(),
        })?;
        let record = v.record(&entity.key).ok_or_else(|| LookupError::EntityNotFound {
            version: version.to_string(),
            key: entity.key.clone(),
        })?;

        let mut seen = HashSet::new();
        Ok(record
            .field(field_kind)
            .iter()
            .filter(|uri| seen.insert(uri.as_str()))
            .cloned()
            .collect())
    }

    /// Every entity claiming `identifier`, in index order.
    pub fn lookup_by_external_identifier(
        &self,
        version: &str,
        identifier: &str,
    ) -> Result<Vec<MappingEntry>, LookupError> {
        let v = self.version(version)?;
        Ok(v.mappings.get(identifier).to_vec())
    }

    /// Resolve a batch of relation identifiers. Only an unknown version fails;
    /// identifiers that resolve to nothing are left out of the result.
    pub async fn resolve_predicates<S: AsRef<str>>(
        &self,
        version: &str,
        identifiers: &[S],
    ) -> Result<BTreeMap<String, PredicateResolution>, LookupError> {
        let v = self.version(version)?;
        Ok(self.resolver.resolve_all(&v, identifiers).await)
    }
}

fn indexed_entity<'a>(v: &'a VersionIndex, name: &str) -> Result<&'a Entity, LookupError> {
    v.snapshot
        .get(name)
        .filter(|e| v.hierarchy.contains(&e.key))
        .ok_or_else(|| LookupError::EntityNotFound {
            version: v.label.clone(),
            key: normalize(name),
        })
}
