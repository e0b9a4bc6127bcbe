use std::path::PathBuf;

/// Failures on the query path. Both are recoverable and meant to be shown to the user.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RecommendError {
    #[error("query is empty")]
    EmptyQuery,

    #[error("no title matching '{query}' was found; check the spelling or try another title")]
    NotFound { query: String },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// Building over zero items. Queries must not be served until a non-empty catalog arrives.
    #[error("cannot build an index from an empty catalog")]
    EmptyCatalog,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
