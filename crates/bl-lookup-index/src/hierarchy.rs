//! Ancestor / descendant / lineage index.
//!
//! The schema is a single-inheritance forest over `is_a` plus an unrelated set
//! of mixin roles. Only `is_a` edges are walked here; mixin roles never appear
//! in a record.
//!
//! Indexed universe: the descendant closure of the configured roots (the roots
//! included) plus every element flagged `mixin`. Records hold canonical URIs,
//! not names or keys.

use std::collections::{HashSet, VecDeque};

use ahash::AHashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use bl_lookup_model::{normalize, Entity, SchemaSnapshot};

use crate::error::IndexError;

/// Roots of the indexed universe for Biolink models.
pub const DEFAULT_ROOTS: [&str; 3] = ["related to", "association", "named thing"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyRecord {
    /// Nearest parent first. Never contains the entity itself.
    pub ancestors: Vec<String>,
    /// Breadth-first, children in source order. Never contains the entity itself.
    pub descendants: Vec<String>,
    /// `ancestors ++ descendants`.
    pub lineage: Vec<String>,
}

impl HierarchyRecord {
    fn new(ancestors: Vec<String>, descendants: Vec<String>) -> Self {
        let mut lineage = Vec::with_capacity(ancestors.len() + descendants.len());
        lineage.extend(ancestors.iter().cloned());
        lineage.extend(descendants.iter().cloned());
        Self {
            ancestors,
            descendants,
            lineage,
        }
    }

    pub fn field(&self, field: HierarchyField) -> &[String] {
        match field {
            HierarchyField::Ancestors => &self.ancestors,
            HierarchyField::Descendants => &self.descendants,
            HierarchyField::Lineage => &self.lineage,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HierarchyField {
    Ancestors,
    Descendants,
    Lineage,
}

impl HierarchyField {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ancestors" => Some(Self::Ancestors),
            "descendants" => Some(Self::Descendants),
            "lineage" => Some(Self::Lineage),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ancestors => "ancestors",
            Self::Descendants => "descendants",
            Self::Lineage => "lineage",
        }
    }
}

/// Hierarchy records of one version, keyed by entity key.
#[derive(Debug, Clone, Default)]
pub struct HierarchyIndex {
    records: AHashMap<String, HierarchyRecord>,
    /// Snapshot positions of indexed entities, ascending.
    scope: Vec<usize>,
}

impl HierarchyIndex {
    pub fn build<S: AsRef<str>>(snapshot: &SchemaSnapshot, roots: &[S]) -> Result<Self, IndexError> {
        let entities = snapshot.entities();

        let mut children: Vec<Vec<usize>> = vec![Vec::new(); entities.len()];
        for (i, e) in entities.iter().enumerate() {
            if let Some(p) = parent_position(snapshot, e) {
                children[p].push(i);
            }
        }

        check_parent_chains(snapshot)?;

        let scope = indexed_scope(snapshot, roots, &children);

        let records = scope
            .par_iter()
            .map(|&i| {
                let entity = &entities[i];
                let ancestors = ancestor_uris(snapshot, i)?;
                let descendants = descendant_uris(entities, &children, i);
                Ok((entity.key.clone(), HierarchyRecord::new(ancestors, descendants)))
            })
            .collect::<Result<Vec<_>, IndexError>>()?;

        Ok(Self {
            records: records.into_iter().collect(),
            scope,
        })
    }

    pub fn get(&self, key: &str) -> Option<&HierarchyRecord> {
        self.records.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    /// Snapshot positions of every indexed entity, in source order.
    pub fn scope(&self) -> &[usize] {
        &self.scope
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn parent_position(snapshot: &SchemaSnapshot, entity: &Entity) -> Option<usize> {
    let parent = entity.parent.as_deref()?;
    snapshot.position(&normalize(parent))
}

/// Every `is_a` chain in the snapshot must terminate.
///
/// Checked over all elements, not only the indexed ones, so a cycle anywhere
/// fails the version instead of surfacing on some later lookup.
fn check_parent_chains(snapshot: &SchemaSnapshot) -> Result<(), IndexError> {
    // 0 = unvisited, 1 = on the current chain, 2 = known to terminate.
    let mut state = vec![0u8; snapshot.len()];
    for start in 0..snapshot.len() {
        if state[start] == 2 {
            continue;
        }
        let mut chain: Vec<usize> = Vec::new();
        let mut cur = Some(start);
        while let Some(i) = cur {
            match state[i] {
                2 => break,
                1 => {
                    let entities = snapshot.entities();
                    let from = chain.iter().position(|&c| c == i).unwrap_or(0);
                    let mut names: Vec<String> = chain[from..]
                        .iter()
                        .map(|&c| entities[c].raw_name.clone())
                        .collect();
                    names.push(entities[i].raw_name.clone());
                    return Err(IndexError::ParentCycle {
                        entity: entities[i].raw_name.clone(),
                        chain: names,
                    });
                }
                _ => {
                    state[i] = 1;
                    chain.push(i);
                    cur = parent_position(snapshot, &snapshot.entities()[i]);
                }
            }
        }
        for i in chain {
            state[i] = 2;
        }
    }
    Ok(())
}

fn indexed_scope<S: AsRef<str>>(
    snapshot: &SchemaSnapshot,
    roots: &[S],
    children: &[Vec<usize>],
) -> Vec<usize> {
    let mut in_scope = vec![false; snapshot.len()];

    let mut queue: VecDeque<usize> = VecDeque::new();
    for root in roots {
        match snapshot.position(&normalize(root.as_ref())) {
            Some(i) => queue.push_back(i),
            None => tracing::warn!(root = %root.as_ref(), "hierarchy root missing from schema"),
        }
    }
    while let Some(i) = queue.pop_front() {
        if in_scope[i] {
            continue;
        }
        in_scope[i] = true;
        queue.extend(children[i].iter().copied());
    }

    for (i, e) in snapshot.entities().iter().enumerate() {
        if e.is_mixin {
            in_scope[i] = true;
        }
    }

    in_scope
        .iter()
        .enumerate()
        .filter_map(|(i, &keep)| keep.then_some(i))
        .collect()
}

fn ancestor_uris(snapshot: &SchemaSnapshot, start: usize) -> Result<Vec<String>, IndexError> {
    let entities = snapshot.entities();
    let mut visited: HashSet<usize> = HashSet::new();
    visited.insert(start);

    let mut out = Vec::new();
    let mut cur = &entities[start];
    while let Some(parent) = cur.parent.as_deref() {
        let Some(p) = snapshot.position(&normalize(parent)) else {
            tracing::warn!(
                entity = %cur.raw_name,
                parent = %parent,
                "is_a target missing from schema; ancestor chain truncated"
            );
            break;
        };
        if !visited.insert(p) {
            return Err(IndexError::ParentCycle {
                entity: entities[start].raw_name.clone(),
                chain: vec![entities[start].raw_name.clone(), entities[p].raw_name.clone()],
            });
        }
        out.push(entities[p].canonical_uri.clone());
        cur = &entities[p];
    }
    Ok(out)
}

fn descendant_uris(entities: &[Entity], children: &[Vec<usize>], start: usize) -> Vec<String> {
    let mut visited: HashSet<usize> = HashSet::new();
    visited.insert(start);

    let mut out = Vec::new();
    let mut queue: VecDeque<usize> = children[start].iter().copied().collect();
    while let Some(i) = queue.pop_front() {
        if !visited.insert(i) {
            continue;
        }
        out.push(entities[i].canonical_uri.clone());
        queue.extend(children[i].iter().copied());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use bl_lookup_model::{EntityKind, SnapshotError};

    fn class(name: &str, uri: &str, parent: Option<&str>) -> Entity {
        let e = Entity::new(name, uri, EntityKind::Class);
        match parent {
            Some(p) => e.with_parent(p),
            None => e,
        }
    }

    fn small_schema() -> Result<SchemaSnapshot, SnapshotError> {
        SchemaSnapshot::new(Some("3.1.2".to_string()), "biolink")
            .with(class("entity", "biolink:Entity", None))?
            .with(class("named thing", "biolink:NamedThing", Some("entity")))?
            .with(class("biological entity", "biolink:BiologicalEntity", Some("named thing")))?
            .with(class("biological process", "biolink:BiologicalProcess", Some("biological entity")))?
            .with(class("pathway", "biolink:Pathway", Some("biological process")))?
            .with(class("disease", "biolink:Disease", Some("biological entity")))?
            .with(class("orphan", "biolink:Orphan", None))?
            .with(class("thing with taxon", "biolink:ThingWithTaxon", None).mixin())
    }

    #[test]
    fn ancestors_are_nearest_first_and_exclude_self() -> Result<(), Box<dyn std::error::Error>> {
        let snap = small_schema()?;
        let idx = HierarchyIndex::build(&snap, &DEFAULT_ROOTS)?;

        let rec = idx.get("biologicalprocess").expect("indexed");
        assert_eq!(
            rec.ancestors,
            vec!["biolink:BiologicalEntity", "biolink:NamedThing", "biolink:Entity"]
        );
        assert_eq!(rec.descendants, vec!["biolink:Pathway"]);
        assert_eq!(
            rec.lineage,
            vec![
                "biolink:BiologicalEntity",
                "biolink:NamedThing",
                "biolink:Entity",
                "biolink:Pathway"
            ]
        );
        Ok(())
    }

    #[test]
    fn descendants_are_breadth_first_in_source_order() -> Result<(), Box<dyn std::error::Error>> {
        let snap = small_schema()?;
        let idx = HierarchyIndex::build(&snap, &DEFAULT_ROOTS)?;

        let rec = idx.get("namedthing").expect("root indexed");
        assert_eq!(
            rec.descendants,
            vec![
                "biolink:BiologicalEntity",
                "biolink:BiologicalProcess",
                "biolink:Disease",
                "biolink:Pathway"
            ]
        );
        Ok(())
    }

    #[test]
    fn scope_is_root_closure_plus_mixins() -> Result<(), Box<dyn std::error::Error>> {
        let snap = small_schema()?;
        let idx = HierarchyIndex::build(&snap, &DEFAULT_ROOTS)?;

        // `entity` sits above the roots and `orphan` is unreachable.
        assert!(!idx.contains("entity"));
        assert!(!idx.contains("orphan"));

        let mixin = idx.get("thingwithtaxon").expect("mixins are always indexed");
        assert!(mixin.ancestors.is_empty());
        assert!(mixin.descendants.is_empty());
        assert_eq!(idx.len(), 6);
        Ok(())
    }

    #[test]
    fn mixin_roles_do_not_leak_into_the_walk() -> Result<(), Box<dyn std::error::Error>> {
        let mut gene = class("gene", "biolink:Gene", Some("named thing"));
        gene.mixins = vec!["thing with taxon".to_string()];
        let snap = small_schema()?.with(gene)?;
        let idx = HierarchyIndex::build(&snap, &DEFAULT_ROOTS)?;

        let rec = idx.get("gene").expect("gene");
        assert!(!rec.ancestors.contains(&"biolink:ThingWithTaxon".to_string()));
        let mixin = idx.get("thingwithtaxon").expect("mixin");
        assert!(mixin.descendants.is_empty());
        Ok(())
    }

    #[test]
    fn parent_cycles_fail_the_build() -> Result<(), Box<dyn std::error::Error>> {
        let snap = SchemaSnapshot::new(None, "biolink")
            .with(class("named thing", "biolink:NamedThing", None))?
            .with(class("a", "biolink:A", Some("b")))?
            .with(class("b", "biolink:B", Some("a")))?;

        let err = HierarchyIndex::build(&snap, &DEFAULT_ROOTS).unwrap_err();
        match err {
            IndexError::ParentCycle { chain, .. } => {
                assert_eq!(chain.first(), chain.last());
                assert!(chain.len() >= 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        Ok(())
    }

    #[test]
    fn missing_parent_truncates_the_chain() -> Result<(), Box<dyn std::error::Error>> {
        let snap = SchemaSnapshot::new(None, "biolink")
            .with(class("named thing", "biolink:NamedThing", Some("ghost")))?;
        let idx = HierarchyIndex::build(&snap, &DEFAULT_ROOTS)?;
        assert!(idx.get("namedthing").expect("root").ancestors.is_empty());
        Ok(())
    }

    #[test]
    fn fields_parse_by_name() {
        assert_eq!(HierarchyField::parse("Lineage"), Some(HierarchyField::Lineage));
        assert_eq!(HierarchyField::parse("descendents"), None);
    }
}
