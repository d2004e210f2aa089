//! Schema elements (classes and relations) as seen by the indexers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::normalize::normalize;

/// Confidence tier of an external-identifier mapping.
///
/// Declaration order is the order tiers are indexed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingTier {
    Exact,
    Narrow,
    Broad,
    Related,
    Close,
}

impl MappingTier {
    pub const ALL: [MappingTier; 5] = [
        MappingTier::Exact,
        MappingTier::Narrow,
        MappingTier::Broad,
        MappingTier::Related,
        MappingTier::Close,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MappingTier::Exact => "exact",
            MappingTier::Narrow => "narrow",
            MappingTier::Broad => "broad",
            MappingTier::Related => "related",
            MappingTier::Close => "close",
        }
    }

    /// Name of the LinkML slot listing this tier's identifiers.
    pub fn linkml_slot(self) -> &'static str {
        match self {
            MappingTier::Exact => "exact_mappings",
            MappingTier::Narrow => "narrow_mappings",
            MappingTier::Broad => "broad_mappings",
            MappingTier::Related => "related_mappings",
            MappingTier::Close => "close_mappings",
        }
    }
}

impl fmt::Display for MappingTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MappingTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "narrow" => Ok(Self::Narrow),
            "broad" => Ok(Self::Broad),
            "related" => Ok(Self::Related),
            "close" => Ok(Self::Close),
            other => Err(format!(
                "unknown mapping tier `{other}` (expected exact|narrow|broad|related|close)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Class,
    Relation,
}

/// One class or relation of a schema version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub raw_name: String,
    /// Lookup key (see [`normalize`]).
    pub key: String,
    pub canonical_uri: String,
    pub kind: EntityKind,
    /// Raw name of the structural (`is_a`) parent.
    pub parent: Option<String>,
    pub is_mixin: bool,
    /// Mixin roles. Never followed by the hierarchy walk.
    pub mixins: Vec<String>,
    pub mappings: BTreeMap<MappingTier, Vec<String>>,
    pub symmetric: bool,
    /// Raw name of the inverse relation.
    pub inverse: Option<String>,
    /// Marked as the preferred direction of the relation/inverse pair.
    pub canonical: bool,
    pub deprecated: bool,
    /// Schema-defined properties, returned verbatim to callers.
    pub attributes: Map<String, Value>,
}

impl Entity {
    pub fn new(raw_name: &str, canonical_uri: &str, kind: EntityKind) -> Self {
        Self {
            raw_name: raw_name.to_string(),
            key: normalize(raw_name),
            canonical_uri: canonical_uri.to_string(),
            kind,
            parent: None,
            is_mixin: false,
            mixins: Vec::new(),
            mappings: BTreeMap::new(),
            symmetric: false,
            inverse: None,
            canonical: false,
            deprecated: false,
            attributes: Map::new(),
        }
    }

    pub fn with_parent(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn with_mapping(mut self, tier: MappingTier, identifier: &str) -> Self {
        self.mappings
            .entry(tier)
            .or_default()
            .push(identifier.to_string());
        self
    }

    pub fn with_inverse(mut self, inverse: &str) -> Self {
        self.inverse = Some(inverse.to_string());
        self
    }

    pub fn symmetric(mut self) -> Self {
        self.symmetric = true;
        self
    }

    pub fn canonical(mut self) -> Self {
        self.canonical = true;
        self
    }

    pub fn mixin(mut self) -> Self {
        self.is_mixin = true;
        self
    }

    pub fn is_relation(&self) -> bool {
        self.kind == EntityKind::Relation
    }

    /// Mapped identifiers in tier order, then listing order.
    pub fn tiered_mappings(&self) -> impl Iterator<Item = (MappingTier, &str)> + '_ {
        self.mappings
            .iter()
            .flat_map(|(tier, ids)| ids.iter().map(move |id| (*tier, id.as_str())))
    }
}
