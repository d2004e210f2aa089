//! Immutable, already-parsed view of one schema version.

use std::collections::HashMap;

use serde::Serialize;

use crate::entity::Entity;
use crate::error::SnapshotError;
use crate::normalize::normalize;

/// All classes and relations of one schema version, in source order.
///
/// Source order is part of the contract: mapping ambiguity is resolved by
/// first-seen order, so it must match the schema document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchemaSnapshot {
    /// Release declared by the document itself (e.g. `3.1.2`).
    pub schema_version: Option<String>,
    pub default_prefix: String,
    entities: Vec<Entity>,
    #[serde(skip)]
    by_key: HashMap<String, usize>,
    /// `normalize(canonical_uri)`, for URIs whose local part is not the name.
    #[serde(skip)]
    by_uri_key: HashMap<String, usize>,
}

impl SchemaSnapshot {
    pub fn new(schema_version: Option<String>, default_prefix: &str) -> Self {
        Self {
            schema_version,
            default_prefix: default_prefix.to_string(),
            entities: Vec::new(),
            by_key: HashMap::new(),
            by_uri_key: HashMap::new(),
        }
    }

    /// Append an entity. Two elements whose names normalize to the same key
    /// cannot coexist in one version.
    pub fn insert(&mut self, entity: Entity) -> Result<(), SnapshotError> {
        if let Some(&existing) = self.by_key.get(&entity.key) {
            return Err(SnapshotError::DuplicateKey {
                key: entity.key.clone(),
                first: self.entities[existing].raw_name.clone(),
                second: entity.raw_name,
            });
        }
        let index = self.entities.len();
        self.by_key.insert(entity.key.clone(), index);
        self.by_uri_key
            .entry(normalize(&entity.canonical_uri))
            .or_insert(index);
        self.entities.push(entity);
        Ok(())
    }

    pub fn with(mut self, entity: Entity) -> Result<Self, SnapshotError> {
        self.insert(entity)?;
        Ok(self)
    }

    /// Look up by raw name, key, or CURIE. Names win over canonical URIs
    /// when both normalize to the same key.
    pub fn get(&self, name: &str) -> Option<&Entity> {
        let key = normalize(name);
        self.by_key
            .get(&key)
            .or_else(|| self.by_uri_key.get(&key))
            .map(|&i| &self.entities[i])
    }

    pub fn get_by_key(&self, key: &str) -> Option<&Entity> {
        self.by_key.get(key).map(|&i| &self.entities[i])
    }

    /// Source position of `key`.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.by_key.get(key).copied()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
