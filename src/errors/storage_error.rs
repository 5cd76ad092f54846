use crate::types::record_types::Rid;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("file exists: {0:?}")]
    FileExists(PathBuf),

    #[error("file not found: {0:?}")]
    FileNotFound(PathBuf),

    #[error("file not open: fd {0}")]
    FileNotOpen(i32),

    #[error("file still open: {0:?}")]
    FileStillOpen(PathBuf),

    #[error("page {page_no} does not exist in {file:?}")]
    PageNotExist { file: PathBuf, page_no: i32 },

    #[error("record not found at {0}")]
    RecordNotFound(Rid),

    #[error("slot already occupied at {0}")]
    SlotOccupied(Rid),

    #[error("no space left on device")]
    NoSpace,

    #[error("transaction aborted")]
    TransactionAborted,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
