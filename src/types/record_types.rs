use crate::consts::page_consts::{NO_PAGE, NO_SLOT};
use crate::types::filter_types::Value;
use std::fmt;

/// Physical position of a record: (page number, slot number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rid {
    pub page_no: i32,
    pub slot_no: i32,
}

impl Rid {
    pub const INVALID: Rid = Rid {
        page_no: NO_PAGE,
        slot_no: NO_SLOT,
    };

    pub fn new(page_no: i32, slot_no: i32) -> Self {
        Self { page_no, slot_no }
    }
}

impl fmt::Display for Rid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(page {}, slot {})", self.page_no, self.slot_no)
    }
}

/// A fixed-width record, owned independently of any pinned page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub data: Vec<u8>,
}

impl Record {
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0u8; size],
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            data: bytes.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Version metadata of a stored tuple: last writer timestamp and tombstone.
#[derive(Debug, Clone, Copy)]
pub struct TupleMeta {
    pub ts: u64,
    pub is_deleted: bool,
}

/// One entry of a tuple's undo chain, newest first.
///
/// Either a full before-image, or per-column patches selected by `modified`.
#[derive(Debug, Clone)]
pub struct UndoLog {
    pub ts: u64,
    pub is_deleted: bool,
    pub modified: Vec<bool>,
    pub values: Vec<Value>,
    pub full_image: Option<Record>,
}
