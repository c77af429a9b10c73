use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimpleDbError {
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("JSON decode error: {0}")]
    DecodeError(#[from] serde_json::Error),

    #[error("Date/time parse error: {0}")]
    ParseError(String),

    #[error("JSON serialize error: {0}")]
    SerializeError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Relation error: {0}")]
    RelationError(String),
}

