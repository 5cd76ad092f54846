pub const PAGE_SIZE: usize = 4096;          // total page size in bytes (4 KB)
pub const FILE_HDR_SIZE: usize = 20;        // serialized file header on page 0 (5 x i32)
pub const RECORD_PAGE_HDR_SIZE: usize = 8;  // record-page header (next_free_page_no, num_records)

pub const NO_PAGE: i32 = -1;                // "no page" sentinel, also end-of-scan
pub const NO_SLOT: i32 = -1;                // "no slot" sentinel
pub const FIRST_RECORD_PAGE: i32 = 1;       // page 0 holds the file header

// Pages preallocated at file creation: page 0 plus headroom.
pub const PREALLOCATED_PAGES: usize = 4;
