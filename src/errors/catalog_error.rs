use crate::errors::storage_error::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("database exists: {0}")]
    DatabaseExists(String),

    #[error("database not found: {0}")]
    DatabaseNotFound(String),

    #[error("table exists: {0}")]
    TableExists(String),

    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("index exists: {0}")]
    IndexExists(String),

    #[error("index not found: {0}")]
    IndexNotFound(String),

    #[error("invalid catalog: {0}")]
    Invalid(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
