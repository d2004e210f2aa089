use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    /// The `is_a` chain of `entity` loops back on itself.
    #[error("parent cycle at `{entity}`: {}", chain.join(" -> "))]
    ParentCycle { entity: String, chain: Vec<String> },
    #[error("version `{version}` is not loaded")]
    VersionNotFound { version: String },
    #[error("invalid qualifier table: {0}")]
    QualifierTable(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
