use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bl_lookup_index::{IndexOptions, VersionIndex};
use bl_lookup_model::snapshot_from_linkml_yaml;
use bl_lookup_service::{
    AuthorityError, PredicateResolver, RelationAuthority, ResolverConfig, StaticAuthority,
};

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

fn version() -> VersionIndex {
    let snap = snapshot_from_linkml_yaml(DOC).unwrap();
    VersionIndex::build("v3.1.2", snap, &IndexOptions::default()).unwrap()
}

/// Fails every query.
struct Unreachable;

#[async_trait]
impl RelationAuthority for Unreachable {
    fn namespace(&self) -> &str {
        "RO"
    }

    fn default_relation(&self) -> &str {
        "skos:relatedMatch"
    }

    async fn parents_of(&self, _identifier: &str) -> Result<Vec<String>, AuthorityError> {
        Err(AuthorityError::Network("connection refused".to_string()))
    }
}

/// Answers correctly, but only after a delay.
struct Slow {
    delay: Duration,
    calls: AtomicUsize,
}

#[async_trait]
impl RelationAuthority for Slow {
    fn namespace(&self) -> &str {
        "RO"
    }

    fn default_relation(&self) -> &str {
        "skos:relatedMatch"
    }

    async fn parents_of(&self, _identifier: &str) -> Result<Vec<String>, AuthorityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(vec!["RO:0002506".to_string()])
    }
}

#[tokio::test]
async fn authority_errors_degrade_to_the_default() {
    let v = version();
    let r = PredicateResolver::new(Arc::new(Unreachable), ResolverConfig::default());
    let res = r.resolve(&v, "RO:0003303").await.unwrap();
    assert_eq!(res.predicate, "biolink:related_to");
    assert!(!res.inverted);
}

#[tokio::test]
async fn slow_walks_time_out_to_the_default() {
    let v = version();
    let config = ResolverConfig {
        walk_timeout_ms: Some(20),
        ..ResolverConfig::default()
    };
    let authority = Arc::new(Slow {
        delay: Duration::from_secs(5),
        calls: AtomicUsize::new(0),
    });
    let r = PredicateResolver::new(authority.clone(), config);

    let res = r.resolve(&v, "RO:0003303").await.unwrap();
    assert_eq!(res.predicate, "biolink:related_to");
    assert_eq!(authority.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn walks_within_the_limit_succeed() {
    let v = version();
    let authority = Arc::new(Slow {
        delay: Duration::from_millis(1),
        calls: AtomicUsize::new(0),
    });
    let r = PredicateResolver::new(authority, ResolverConfig::default());
    let res = r.resolve(&v, "RO:0003303").await.unwrap();
    assert_eq!(res.predicate, "biolink:causes");
}

#[tokio::test]
async fn identifiers_outside_the_namespace_skip_the_walk() {
    let v = version();
    let authority = Arc::new(Slow {
        delay: Duration::from_millis(1),
        calls: AtomicUsize::new(0),
    });
    let r = PredicateResolver::new(authority.clone(), ResolverConfig::default());
    let res = r.resolve(&v, "GO:0003303").await.unwrap();
    assert_eq!(res.predicate, "biolink:related_to");
    assert_eq!(authority.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn nothing_resolves_without_a_mapped_default() {
    let v = version();
    let r = PredicateResolver::new(
        Arc::new(StaticAuthority::new("RO", "EX:unmapped")),
        ResolverConfig::default(),
    );
    assert!(r.resolve(&v, "GARBAGE:NOTHING").await.is_none());
    let batch = r.resolve_all(&v, &["GARBAGE:NOTHING", "RO:0002506"]).await;
    assert_eq!(batch.keys().collect::<Vec<_>>(), vec!["RO:0002506"]);
}
