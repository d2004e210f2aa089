//! Qualifier rewrites for relations retired in the 3.x models.
//!
//! Keys are canonical relation URIs; values are the fields to merge into a
//! resolution (`predicate`, `label`, `qualified_predicate`,
//! `object_aspect_qualifier`, `object_direction_qualifier`, ...).

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::error::IndexError;

const BUNDLED: &str = include_str!("../resources/predicate_map.json");

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QualifierTable {
    rewrites: HashMap<String, BTreeMap<String, String>>,
}

impl QualifierTable {
    /// Table shipped with the crate.
    pub fn bundled() -> Result<Self, IndexError> {
        Self::from_json_str(BUNDLED)
    }

    pub fn from_json_str(text: &str) -> Result<Self, IndexError> {
        let rewrites: HashMap<String, BTreeMap<String, String>> =
            serde_json::from_str(text).map_err(|e| IndexError::QualifierTable(e.to_string()))?;
        Ok(Self { rewrites })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, IndexError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn get(&self, uri: &str) -> Option<&BTreeMap<String, String>> {
        self.rewrites.get(uri)
    }

    pub fn len(&self) -> usize {
        self.rewrites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewrites.is_empty()
    }
}
