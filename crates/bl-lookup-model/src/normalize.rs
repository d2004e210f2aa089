//! Lookup-key normalization.
//!
//! Every entity and relation is indexed under a *key* derived from its name.
//! Callers may spell the same element many ways:
//!
//! - `biological process` (schema-native name)
//! - `biological_process` (snake case, as used in slot URIs)
//! - `biolink:BiologicalProcess` (CURIE of the class URI)
//! - `BiOlogical ProCess` (whatever a user typed)
//!
//! All of these collapse to `biologicalprocess`.

use serde_json::Value;
use thiserror::Error;

/// Characters removed from a name before lowercasing.
const STRIPPED: [char; 4] = [' ', '_', ',', '-'];

/// Normalize a name, CURIE or URI-ish identifier into its lookup key.
///
/// Rules, in order:
/// 1. keep only the text after the last `:` (so CURIEs land on the bare name),
/// 2. drop spaces, underscores, commas and hyphens,
/// 3. lowercase.
///
/// The function is total and idempotent.
pub fn normalize(raw: &str) -> String {
    let local = match raw.rfind(':') {
        Some(pos) => &raw[pos + 1..],
        None => raw,
    };
    local
        .chars()
        .filter(|c| !STRIPPED.contains(c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Normalize a list of loosely-typed values element-wise.
///
/// Fails on the first element that is not a JSON string.
pub fn normalize_all(values: &[Value]) -> Result<Vec<String>, NormalizeError> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| match value {
            Value::String(s) => Ok(normalize(s)),
            other => Err(NormalizeError::InvalidInputKind {
                index,
                kind: value_kind(other),
            }),
        })
        .collect()
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("element {index} is a {kind}, expected a string")]
    InvalidInputKind { index: usize, kind: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn spellings_of_one_class_collapse() {
        let expected = "biologicalprocess";
        assert_eq!(normalize("biological process"), expected);
        assert_eq!(normalize("biological_process"), expected);
        assert_eq!(normalize("biolink:BiologicalProcess"), expected);
        assert_eq!(normalize("biolOgical proCess"), expected);
    }

    #[test]
    fn hyphens_and_commas_are_dropped() {
        assert_eq!(normalize("CHEMICAL-SUBSTANCE"), "chemicalsubstance");
        assert_eq!(normalize("gene, or product"), "geneorproduct");
    }

    #[test]
    fn only_text_after_last_colon_is_kept() {
        assert_eq!(normalize("a:b:Treats"), "treats");
        assert_eq!(normalize("trailing:"), "");
    }

    #[test]
    fn normalize_all_rejects_non_strings() {
        let ok = normalize_all(&[json!("Named Thing"), json!("biolink:Gene")]).unwrap();
        assert_eq!(ok, vec!["namedthing".to_string(), "gene".to_string()]);

        let err = normalize_all(&[json!("gene"), json!(3)]).unwrap_err();
        assert_eq!(
            err,
            NormalizeError::InvalidInputKind {
                index: 1,
                kind: "number"
            }
        );
    }
}
