//! External identifier → entity index.
//!
//! Every tier of every indexed entity is listed, in snapshot order. Several
//! entities may claim the same identifier; all claims are kept and callers
//! pick (see [`MappingIndex::preferred`]).

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use bl_lookup_model::{MappingTier, SchemaSnapshot};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    #[serde(rename = "mapping_type")]
    pub tier: MappingTier,
    /// Key of the claiming entity.
    #[serde(rename = "entity")]
    pub target: String,
    /// Canonical URI of the claiming entity.
    pub uri: String,
}

#[derive(Debug, Clone, Default)]
pub struct MappingIndex {
    entries: AHashMap<String, Vec<MappingEntry>>,
}

impl MappingIndex {
    /// Index the mappings of the entities at `scope` (snapshot positions).
    pub fn build(snapshot: &SchemaSnapshot, scope: &[usize]) -> Self {
        let entities = snapshot.entities();
        let mut entries: AHashMap<String, Vec<MappingEntry>> = AHashMap::new();
        for &i in scope {
            let entity = &entities[i];
            for (tier, identifier) in entity.tiered_mappings() {
                entries
                    .entry(identifier.to_string())
                    .or_default()
                    .push(MappingEntry {
                        tier,
                        target: entity.key.clone(),
                        uri: entity.canonical_uri.clone(),
                    });
            }
        }
        Self { entries }
    }

    /// All claims on `identifier`, in insertion order. Empty on a miss.
    pub fn get(&self, identifier: &str) -> &[MappingEntry] {
        self.entries
            .get(identifier)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The `exact` claim if one exists, otherwise the first claim.
    pub fn preferred(&self, identifier: &str) -> Option<&MappingEntry> {
        let claims = self.get(identifier);
        claims
            .iter()
            .find(|e| e.tier == MappingTier::Exact)
            .or_else(|| claims.first())
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    /// Number of distinct identifiers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
