//! Biolink schema model for `bl-lookup`.
//!
//! This crate defines the point-in-time view of one schema release that every
//! other crate consumes:
//!
//! - [`normalize`]: the lookup-key function shared by all indexes,
//! - [`Entity`] / [`SchemaSnapshot`]: classes and relations in source order,
//! - [`linkml`]: a reader for LinkML YAML documents,
//! - [`SchemaRelease`]: release numbers used to select resolver behavior.
//!
//! Snapshots are immutable once built; the index crate derives everything
//! else from them.

pub mod entity;
pub mod error;
pub mod linkml;
pub mod normalize;
pub mod snapshot;
pub mod version;

pub use entity::{Entity, EntityKind, MappingTier};
pub use error::SnapshotError;
pub use linkml::snapshot_from_linkml_yaml;
pub use normalize::{normalize, normalize_all, NormalizeError};
pub use snapshot::SchemaSnapshot;
pub use version::SchemaRelease;
