//! Per-version indexes over Biolink schema snapshots.
//!
//! For each version label this crate builds:
//!
//! - a [`HierarchyIndex`]: ancestors, descendants and lineage of every entity
//!   under the configured roots (plus mixins),
//! - a [`MappingIndex`]: external identifier → claiming entities, all tiers,
//! - a shared [`QualifierTable`] of relation rewrites for 3.x models.
//!
//! The three are bundled into a [`VersionIndex`] and published through a
//! [`VersionRegistry`].

pub mod error;
pub mod hierarchy;
pub mod mapping;
pub mod qualifiers;
pub mod registry;

pub use error::IndexError;
pub use hierarchy::{HierarchyField, HierarchyIndex, HierarchyRecord, DEFAULT_ROOTS};
pub use mapping::{MappingEntry, MappingIndex};
pub use qualifiers::QualifierTable;
pub use registry::{BuildReport, IndexOptions, VersionIndex, VersionRegistry};
