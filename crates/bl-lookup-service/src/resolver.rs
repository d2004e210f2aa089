//! Predicate resolution.
//!
//! An external relation identifier resolves in three stages:
//!
//! 1. local lookup in the version's [`MappingIndex`](bl_lookup_index::MappingIndex)
//!    (`exact` claim, else the first claim),
//! 2. for identifiers in the authority's namespace, a breadth-first walk up the
//!    authority's parent relation until some ancestor is mapped locally,
//! 3. the authority's default relation.
//!
//! The matched relation is then oriented (2.x and later models) and, for 3.x
//! and later models, rewritten through the qualifier table.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use bl_lookup_index::{MappingEntry, VersionIndex};
use bl_lookup_model::Entity;

use crate::authority::{curie_prefix, RelationAuthority};

// ============================================================================
// Results
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateResolution {
    /// Canonical URI of the resolved relation.
    pub predicate: String,
    pub label: String,
    /// The caller's subject and object must be swapped to use `predicate`.
    pub inverted: bool,
    #[serde(flatten)]
    pub qualifiers: BTreeMap<String, String>,
}

/// Which stage produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    Local,
    Authority,
    Default,
}

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// First major release whose relations carry a canonical direction.
    pub directionality_major: u32,
    /// First major release that uses qualifier rewrites.
    pub qualifier_major: u32,
    /// Upper bound on one authority walk; a timed-out walk matches nothing.
    /// Unbounded unless the caller sets one.
    pub walk_timeout_ms: Option<u64>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            directionality_major: 2,
            qualifier_major: 3,
            walk_timeout_ms: None,
        }
    }
}

impl ResolverConfig {
    pub fn walk_timeout(&self) -> Option<Duration> {
        self.walk_timeout_ms.map(Duration::from_millis)
    }
}

// ============================================================================
// Resolver
// ============================================================================

pub struct PredicateResolver {
    authority: Arc<dyn RelationAuthority>,
    config: ResolverConfig,
}

impl PredicateResolver {
    pub fn new(authority: Arc<dyn RelationAuthority>, config: ResolverConfig) -> Self {
        Self { authority, config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn authority(&self) -> &dyn RelationAuthority {
        self.authority.as_ref()
    }

    /// Resolve one identifier. `None` when not even the default relation is
    /// known to this version.
    pub async fn resolve(&self, version: &VersionIndex, raw: &str) -> Option<PredicateResolution> {
        let (entry, source) = self.find(version, raw).await?;
        let Some(entity) = version.snapshot.get_by_key(&entry.target) else {
            tracing::warn!(
                version = %version.label,
                target = %entry.target,
                "mapping target missing from snapshot"
            );
            return None;
        };
        tracing::debug!(identifier = %raw, uri = %entity.canonical_uri, ?source, "matched predicate");
        Some(self.finish(version, entity))
    }

    /// Resolve a batch. Identifiers that resolve to nothing are left out.
    pub async fn resolve_all<S: AsRef<str>>(
        &self,
        version: &VersionIndex,
        identifiers: &[S],
    ) -> BTreeMap<String, PredicateResolution> {
        let mut out = BTreeMap::new();
        for id in identifiers {
            let id = id.as_ref();
            if out.contains_key(id) {
                continue;
            }
            match self.resolve(version, id).await {
                Some(resolution) => {
                    out.insert(id.to_string(), resolution);
                }
                None => tracing::debug!(identifier = %id, version = %version.label, "unresolved"),
            }
        }
        out
    }

    async fn find(&self, version: &VersionIndex, raw: &str) -> Option<(MappingEntry, MatchSource)> {
        if let Some(hit) = local_match(version, raw) {
            return Some((hit, MatchSource::Local));
        }

        let in_namespace = curie_prefix(raw)
            .is_some_and(|p| p.eq_ignore_ascii_case(self.authority.namespace()));
        if in_namespace {
            if let Some(hit) = self.walk_with_timeout(version, raw).await {
                return Some((hit, MatchSource::Authority));
            }
        }

        self.default_match(version).map(|hit| (hit, MatchSource::Default))
    }

    fn default_match(&self, version: &VersionIndex) -> Option<MappingEntry> {
        let default = self.authority.default_relation();
        if let Some(hit) = version.mappings.preferred(default) {
            return Some(hit.clone());
        }
        // The default may also name a schema relation directly.
        version
            .entity(default)
            .filter(|e| version.hierarchy.contains(&e.key))
            .map(|e| MappingEntry {
                tier: bl_lookup_model::MappingTier::Exact,
                target: e.key.clone(),
                uri: e.canonical_uri.clone(),
            })
    }

    async fn walk_with_timeout(&self, version: &VersionIndex, start: &str) -> Option<MappingEntry> {
        let walk = self.walk(version, start);
        match self.config.walk_timeout() {
            Some(limit) => match tokio::time::timeout(limit, walk).await {
                Ok(hit) => hit,
                Err(_) => {
                    tracing::warn!(identifier = %start, timeout_ms = limit.as_millis() as u64, "authority walk timed out");
                    None
                }
            },
            None => walk.await,
        }
    }

    /// Level-by-level walk up the authority. Every identifier is asked about
    /// at most once, so the walk ends once a level brings no new parents.
    async fn walk(&self, version: &VersionIndex, start: &str) -> Option<MappingEntry> {
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(start.to_string());
        let mut frontier = vec![start.to_string()];

        while !frontier.is_empty() {
            let mut next = Vec::new();
            for id in &frontier {
                let parents = match self.authority.parents_of(id).await {
                    Ok(parents) => parents,
                    Err(err) => {
                        tracing::warn!(identifier = %id, error = %err, "relation authority failed");
                        return None;
                    }
                };
                for parent in parents {
                    if !visited.insert(parent.clone()) {
                        continue;
                    }
                    if let Some(hit) = version.mappings.preferred(&parent) {
                        return Some(hit.clone());
                    }
                    next.push(parent);
                }
            }
            frontier = next;
        }
        None
    }

    fn finish(&self, version: &VersionIndex, matched: &Entity) -> PredicateResolution {
        let (entity, inverted) = if version.major() >= self.config.directionality_major {
            orient(version, matched)
        } else {
            (matched, false)
        };

        let mut resolution = PredicateResolution {
            predicate: entity.canonical_uri.clone(),
            label: entity.raw_name.clone(),
            inverted,
            qualifiers: BTreeMap::new(),
        };

        if version.major() >= self.config.qualifier_major {
            if let Some(rewrite) = version.qualifiers.get(&entity.canonical_uri) {
                apply_rewrite(version, &mut resolution, rewrite);
            }
        }
        resolution
    }
}

/// Exact identifier first, then the same CURIE with an upper-cased prefix.
fn local_match(version: &VersionIndex, raw: &str) -> Option<MappingEntry> {
    if let Some(hit) = version.mappings.preferred(raw) {
        return Some(hit.clone());
    }
    let (prefix, local) = raw.split_once(':')?;
    let upper = format!("{}:{local}", prefix.to_ascii_uppercase());
    if upper == raw {
        return None;
    }
    version.mappings.preferred(&upper).cloned()
}

/// Report the canonical direction of a relation pair.
fn orient<'a>(version: &'a VersionIndex, entity: &'a Entity) -> (&'a Entity, bool) {
    if !entity.is_relation() || entity.symmetric || entity.canonical {
        return (entity, false);
    }
    let Some(inverse_name) = entity.inverse.as_deref() else {
        return (entity, false);
    };
    match version.entity(inverse_name) {
        Some(inverse) if inverse.canonical => (inverse, true),
        _ => (entity, false),
    }
}

fn apply_rewrite(
    version: &VersionIndex,
    resolution: &mut PredicateResolution,
    rewrite: &BTreeMap<String, String>,
) {
    let mut label = None;
    for (field, value) in rewrite {
        match field.as_str() {
            "predicate" => resolution.predicate = value.clone(),
            "label" => label = Some(value.clone()),
            _ => {
                let field = match field.strip_prefix("object_") {
                    Some(rest) if resolution.inverted => format!("subject_{rest}"),
                    _ => field.clone(),
                };
                resolution.qualifiers.insert(field, value.clone());
            }
        }
    }
    resolution.label = match label {
        Some(label) => label,
        None if rewrite.contains_key("predicate") => label_for(version, &resolution.predicate),
        None => std::mem::take(&mut resolution.label),
    };
}

/// Schema name of `uri`, or its local part with underscores as spaces.
fn label_for(version: &VersionIndex, uri: &str) -> String {
    match version.entity(uri) {
        Some(e) => e.raw_name.clone(),
        None => {
            let local = uri.rsplit_once(':').map(|(_, l)| l).unwrap_or(uri);
            local.replace('_', " ")
        }
    }
}
