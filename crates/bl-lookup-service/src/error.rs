use thiserror::Error;

use bl_lookup_index::IndexError;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("version `{version}` is not loaded")]
    VersionNotFound { version: String },
    #[error("no entity `{key}` in version `{version}`")]
    EntityNotFound { version: String, key: String },
    #[error("`{entity}` has no hierarchy field `{field}` (expected ancestors|descendants|lineage)")]
    FieldNotFound { entity: String, field: String },
    #[error("index error: {0}")]
    Index(IndexError),
    #[error("schema source error: {0}")]
    Source(#[from] SourceError),
    #[error("indexing task failed: {0}")]
    Task(String),
}

impl From<IndexError> for LookupError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::VersionNotFound { version } => Self::VersionNotFound { version },
            other => Self::Index(other),
        }
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("schema for version `{version}` unavailable: {reason}")]
    SchemaUnavailable { version: String, reason: String },
}

#[derive(Debug, Error)]
pub enum AuthorityError {
    #[error("authority request failed: {0}")]
    Network(String),
    #[error("invalid authority response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
