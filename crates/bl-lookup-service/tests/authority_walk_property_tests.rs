use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use bl_lookup_index::{IndexOptions, VersionIndex};
use bl_lookup_model::snapshot_from_linkml_yaml;
use bl_lookup_service::{PredicateResolver, ResolverConfig, StaticAuthority};
use proptest::prelude::*;

const MAX_NODES: usize = 12;

const DOC: &str = r#"
version: 3.1.2
slots:
  related to:
    symmetric: true
    exact_mappings: [skos:relatedMatch]
  causes:
    is_a: related to
    exact_mappings: [RO:0002506]
"#;

/// Node `n` of an `n`-node graph is the one identifier the schema maps.
fn id(i: usize, n: usize) -> String {
    if i == n {
        "RO:0002506".to_string()
    } else {
        format!("RO:{i:07}")
    }
}

/// Random parent edges among `n` unmapped nodes and the mapped one, cycles
/// and self-loops included.
fn graph_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (1usize..=MAX_NODES).prop_flat_map(|n| {
        let edges = prop::collection::vec((0..n, 0..=n), 0..n * 3);
        (Just(n), edges)
    })
}

fn reaches_mapped(n: usize, edges: &[(usize, usize)]) -> bool {
    let mut seen = HashSet::from([0]);
    let mut queue = VecDeque::from([0]);
    while let Some(node) = queue.pop_front() {
        for &(_, parent) in edges.iter().filter(|(child, _)| *child == node) {
            if parent == n {
                return true;
            }
            if seen.insert(parent) {
                queue.push_back(parent);
            }
        }
    }
    false
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    #[test]
    fn any_authority_graph_resolves_to_a_reachable_relation((n, edges) in graph_strategy()) {
        let snap = snapshot_from_linkml_yaml(DOC).unwrap();
        let version = VersionIndex::build("v3.1.2", snap, &IndexOptions::default()).unwrap();

        let mut authority = StaticAuthority::default();
        for &(child, parent) in &edges {
            authority = authority.with_parent(&id(child, n), &id(parent, n));
        }
        let resolver = PredicateResolver::new(Arc::new(authority), ResolverConfig::default());

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let resolution = runtime.block_on(resolver.resolve(&version, &id(0, n)));

        let resolution = resolution.expect("the default relation is always mapped");
        let expected = if reaches_mapped(n, &edges) {
            "biolink:causes"
        } else {
            "biolink:related_to"
        };
        prop_assert_eq!(resolution.predicate.as_str(), expected);
        prop_assert!(!resolution.inverted);
    }
}
