use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("malformed schema document: {0}")]
    Malformed(String),
    #[error("`{first}` and `{second}` both normalize to key `{key}`")]
    DuplicateKey {
        key: String,
        first: String,
        second: String,
    },
}
