use crate::errors::catalog_error::CatalogError;
use crate::errors::storage_error::StorageError;
use crate::types::catalog_types::ColType;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    #[error("incompatible types: {lhs} vs {rhs}")]
    IncompatibleType { lhs: ColType, rhs: ColType },

    #[error("internal error: {0}")]
    Internal(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

pub type QueryResult<T> = Result<T, QueryError>;
