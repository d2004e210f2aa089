//! Ubergraph SPARQL authority.
//!
//! Parents are `rdfs:subPropertyOf` objects in the Ubergraph ontology graph.
//! Results come back as OBO PURLs and are converted to CURIEs; blank-node
//! identifiers (`t1762439`) have no prefix and are dropped.

use crate::error::AuthorityError;

pub const UBERGRAPH_ENDPOINT: &str = "https://ubergraph.apps.renci.org/sparql";

const OBO_BASE: &str = "http://purl.obolibrary.org/obo/";

/// `RO:0002606` → `<http://purl.obolibrary.org/obo/RO_0002606>`
///
/// `None` unless both prefix and local part are plain `[A-Za-z0-9_.-]+`
/// tokens; anything else could not be written into the query as an IRI.
pub fn curie_to_obo(curie: &str) -> Option<String> {
    let (prefix, local) = curie.split_once(':')?;
    if !is_iri_token(prefix) || !is_iri_token(local) {
        return None;
    }
    Some(format!("<{OBO_BASE}{prefix}_{local}>"))
}

fn is_iri_token(part: &str) -> bool {
    !part.is_empty()
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// `http://purl.obolibrary.org/obo/RO_0002606` → `RO:0002606`
pub fn obo_to_curie(iri: &str) -> String {
    let last = iri.rsplit('/').next().unwrap_or(iri);
    last.split('_').collect::<Vec<_>>().join(":")
}

#[cfg_attr(not(feature = "ubergraph"), allow(dead_code))]
fn sub_property_query(child: &str) -> String {
    format!(
        "prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#>\n\
         SELECT DISTINCT ?parent\n\
         FROM <http://reasoner.renci.org/ontology>\n\
         WHERE {{ {child} rdfs:subPropertyOf ?parent . }}"
    )
}

/// CURIEs of `?parent` bindings in a SPARQL JSON result document.
pub fn parents_from_results(doc: &serde_json::Value) -> Result<Vec<String>, AuthorityError> {
    let bindings = doc
        .pointer("/results/bindings")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| AuthorityError::InvalidResponse("missing results.bindings".to_string()))?;

    let mut parents = Vec::new();
    for binding in bindings {
        let Some(iri) = binding.pointer("/parent/value").and_then(serde_json::Value::as_str) else {
            continue;
        };
        let curie = obo_to_curie(iri);
        if curie.contains(':') && !parents.contains(&curie) {
            parents.push(curie);
        }
    }
    Ok(parents)
}

#[cfg(feature = "ubergraph")]
pub use client::UbergraphAuthority;

#[cfg(feature = "ubergraph")]
mod client {
    use std::time::Duration;

    use async_trait::async_trait;
    use reqwest::Client;
    use url::Url;

    use super::{curie_to_obo, parents_from_results, sub_property_query, AuthorityError};
    use crate::authority::RelationAuthority;

    pub struct UbergraphAuthority {
        client: Client,
        endpoint: Url,
        namespace: String,
        default_relation: String,
    }

    impl UbergraphAuthority {
        pub fn new(
            endpoint: &str,
            namespace: &str,
            default_relation: &str,
            timeout: Duration,
        ) -> Result<Self, AuthorityError> {
            let endpoint = Url::parse(endpoint)
                .map_err(|e| AuthorityError::Network(format!("invalid endpoint `{endpoint}`: {e}")))?;
            let client = Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| AuthorityError::Network(e.to_string()))?;
            Ok(Self {
                client,
                endpoint,
                namespace: namespace.to_string(),
                default_relation: default_relation.to_string(),
            })
        }
    }

    #[async_trait]
    impl RelationAuthority for UbergraphAuthority {
        fn namespace(&self) -> &str {
            &self.namespace
        }

        fn default_relation(&self) -> &str {
            &self.default_relation
        }

        async fn parents_of(&self, identifier: &str) -> Result<Vec<String>, AuthorityError> {
            let Some(child) = curie_to_obo(identifier) else {
                return Ok(Vec::new());
            };
            let query = sub_property_query(&child);

            let response = self
                .client
                .post(self.endpoint.clone())
                .header("Accept", "application/sparql-results+json")
                .form(&[("query", query.as_str())])
                .send()
                .await
                .map_err(|e| AuthorityError::Network(e.to_string()))?;

            if !response.status().is_success() {
                return Err(AuthorityError::Network(format!(
                    "{} returned {}",
                    self.endpoint,
                    response.status()
                )));
            }

            let doc: serde_json::Value = response
                .json()
                .await
                .map_err(|e| AuthorityError::InvalidResponse(e.to_string()))?;
            parents_from_results(&doc)
        }
    }
}
