//! Lookup service for Biolink schema versions.
//!
//! - [`LookupFacade`]: entity, hierarchy, mapping and predicate queries over a
//!   [`VersionRegistry`](bl_lookup_index::VersionRegistry),
//! - [`PredicateResolver`]: local lookup, authority walk, default relation,
//!   then orientation and qualifier rewrites,
//! - [`RelationAuthority`]: parent-of-relation answers (in-memory, or
//!   Ubergraph with the `ubergraph` feature),
//! - [`SchemaSource`] / [`VersionLoader`]: fetch, index and publish versions
//!   (HTTP sources with the `remote` feature),
//! - [`LookupConfig`]: JSON file + `BL_LOOKUP_*` environment configuration.

pub mod authority;
pub mod config;
pub mod error;
pub mod facade;
pub mod loader;
pub mod resolver;
pub mod source;
pub mod ubergraph;

pub use authority::{RelationAuthority, StaticAuthority};
pub use config::{AuthorityConfig, AuthorityKind, LookupConfig};
pub use error::{AuthorityError, ConfigError, LookupError, SourceError};
pub use facade::{LookupFacade, VersionInfo};
pub use loader::VersionLoader;
pub use resolver::{PredicateResolution, PredicateResolver, ResolverConfig};
pub use source::{FileSchemaSource, RoutedSchemaSource, SchemaSource};

#[cfg(feature = "remote")]
pub use source::HttpSchemaSource;
#[cfg(feature = "ubergraph")]
pub use ubergraph::UbergraphAuthority;
