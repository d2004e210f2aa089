//! LinkML schema document reader (boundary adapter).
//!
//! Reads a `biolink-model.yaml`-shaped document into a [`SchemaSnapshot`].
//! Only the parts the indexers consume are interpreted:
//!
//! - top-level `version` and `default_prefix`
//! - `classes` and `slots` sections, in document order
//! - per element: `is_a`, `mixin`, `mixins`, `*_mappings`, `symmetric`,
//!   `inverse`, `deprecated`, `class_uri` / `slot_uri`, and the
//!   `canonical_predicate` annotation
//!
//! Everything else an element declares is kept verbatim in
//! [`Entity::attributes`].

use serde_json::{Map, Value as JsonValue};
use serde_yaml::{Mapping, Value};

use crate::entity::{Entity, EntityKind, MappingTier};
use crate::error::SnapshotError;
use crate::snapshot::SchemaSnapshot;

const DEFAULT_PREFIX: &str = "biolink";
const CANONICAL_ANNOTATION: &str = "canonical_predicate";

/// Parse a LinkML YAML document.
pub fn snapshot_from_linkml_yaml(text: &str) -> Result<SchemaSnapshot, SnapshotError> {
    let doc: Value = serde_yaml::from_str(text)?;
    let Value::Mapping(doc) = doc else {
        return Err(SnapshotError::Malformed(
            "top level of a schema document must be a mapping".to_string(),
        ));
    };

    let schema_version = doc.get("version").and_then(scalar_string);
    let default_prefix = doc
        .get("default_prefix")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_PREFIX)
        .to_string();

    let mut snapshot = SchemaSnapshot::new(schema_version, &default_prefix);

    for (section, body) in &doc {
        let kind = match section.as_str() {
            Some("classes") => EntityKind::Class,
            Some("slots") => EntityKind::Relation,
            _ => continue,
        };
        let elements = match body {
            Value::Mapping(m) => m,
            Value::Null => continue,
            _ => {
                return Err(SnapshotError::Malformed(format!(
                    "`{}` section must be a mapping",
                    section.as_str().unwrap_or("?")
                )))
            }
        };

        for (name, element) in elements {
            let Some(name) = name.as_str() else {
                return Err(SnapshotError::Malformed(format!(
                    "element names must be strings, got {name:?}"
                )));
            };
            let entity = entity_from_element(name, element, kind, &default_prefix)?;
            match snapshot.insert(entity) {
                Ok(()) => {}
                Err(SnapshotError::DuplicateKey { key, first, second }) => {
                    tracing::warn!(
                        key = %key,
                        kept = %first,
                        dropped = %second,
                        "schema elements collide on lookup key; keeping the first"
                    );
                }
                Err(other) => return Err(other),
            }
        }
    }

    Ok(snapshot)
}

fn entity_from_element(
    name: &str,
    element: &Value,
    kind: EntityKind,
    default_prefix: &str,
) -> Result<Entity, SnapshotError> {
    let empty = Mapping::new();
    let body = match element {
        Value::Mapping(m) => m,
        Value::Null => &empty,
        _ => {
            return Err(SnapshotError::Malformed(format!(
                "element `{name}` must be a mapping"
            )))
        }
    };

    let uri_slot = match kind {
        EntityKind::Class => "class_uri",
        EntityKind::Relation => "slot_uri",
    };
    let canonical_uri = body
        .get(uri_slot)
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| default_uri(name, kind, default_prefix));

    let mut entity = Entity::new(name, &canonical_uri, kind);
    entity.parent = body.get("is_a").and_then(Value::as_str).map(str::to_string);
    entity.is_mixin = flag(body.get("mixin"));
    entity.mixins = string_list(body.get("mixins"));
    entity.symmetric = flag(body.get("symmetric"));
    entity.inverse = body
        .get("inverse")
        .and_then(Value::as_str)
        .map(str::to_string);
    entity.deprecated = body.get("deprecated").is_some_and(|v| !v.is_null());
    entity.canonical = canonical_annotation(body.get("annotations"));

    for tier in MappingTier::ALL {
        let ids = string_list(body.get(tier.linkml_slot()));
        if !ids.is_empty() {
            entity.mappings.insert(tier, ids);
        }
    }

    let mut attributes = match serde_json::to_value(body) {
        Ok(JsonValue::Object(map)) => map,
        Ok(_) => Map::new(),
        Err(err) => {
            return Err(SnapshotError::Malformed(format!(
                "element `{name}` cannot be represented as JSON: {err}"
            )))
        }
    };
    attributes
        .entry("name")
        .or_insert_with(|| JsonValue::String(name.to_string()));
    attributes
        .entry(uri_slot)
        .or_insert_with(|| JsonValue::String(canonical_uri.clone()));
    entity.attributes = attributes;

    Ok(entity)
}

/// URI LinkML assigns when an element declares none.
pub fn default_uri(name: &str, kind: EntityKind, prefix: &str) -> String {
    match kind {
        EntityKind::Class => format!("{prefix}:{}", pascal_case(name)),
        EntityKind::Relation => format!("{prefix}:{}", snake_case(name)),
    }
}

/// `biological process` → `BiologicalProcess`; inner capitals are kept
/// (`RNA product` → `RNAProduct`).
pub fn pascal_case(name: &str) -> String {
    name.split(|c: char| c == ' ' || c == '_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Replace every non-word character with `_`.
pub fn snake_case(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn scalar_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn flag(v: Option<&Value>) -> bool {
    match v {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn string_list(v: Option<&Value>) -> Vec<String> {
    match v {
        Some(Value::Sequence(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Annotations appear either as `name: value` or as
/// `name: {tag: name, value: value}`.
fn canonical_annotation(annotations: Option<&Value>) -> bool {
    let Some(Value::Mapping(annotations)) = annotations else {
        return false;
    };
    match annotations.get(CANONICAL_ANNOTATION) {
        Some(Value::Mapping(tagged)) => flag(tagged.get("value")),
        other => flag(other),
    }
}
