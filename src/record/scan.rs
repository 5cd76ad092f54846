use crate::consts::page_consts::{FIRST_RECORD_PAGE, NO_PAGE, NO_SLOT};
use crate::errors::storage_error::StorageError;
use crate::record::bitmap;
use crate::record::heap_file::HeapFile;
use crate::record::slotted_page::bitmap_range;
use crate::types::record_types::Rid;

/// Cursor over the live records of a heap file.
///
/// Each step pins the current page only long enough to probe its bitmap.
/// The scan observes whatever is live at the moment a page is pinned:
/// deletes behind the cursor are invisible, inserts ahead of it are seen.
pub struct RecordScan<'a> {
    file: &'a HeapFile,
    rid: Rid,
}

impl<'a> RecordScan<'a> {
    /// Position the cursor on the first live record (or at end).
    pub fn new(file: &'a HeapFile) -> Result<Self, StorageError> {
        let mut scan = Self {
            file,
            rid: Rid::new(FIRST_RECORD_PAGE, NO_SLOT),
        };
        scan.next()?;
        Ok(scan)
    }

    /// Advance to the next live record, or to end-of-scan.
    pub fn next(&mut self) -> Result<(), StorageError> {
        if self.rid.page_no == NO_PAGE {
            return Ok(());
        }
        let hdr = self.file.header();
        let n = hdr.num_records_per_page as usize;
        while self.rid.page_no < self.file.num_pages() {
            let page = self.file.fetch_page_handle(self.rid.page_no)?;
            let found =
                page.read(|bytes| bitmap::next_set_bit(&bytes[bitmap_range(&hdr)], n, self.rid.slot_no));
            drop(page);
            match found {
                Some(slot) => {
                    self.rid.slot_no = slot as i32;
                    return Ok(());
                }
                None => {
                    self.rid.page_no += 1;
                    self.rid.slot_no = NO_SLOT;
                }
            }
        }
        self.rid.page_no = NO_PAGE;
        Ok(())
    }

    pub fn is_end(&self) -> bool {
        self.rid.page_no == NO_PAGE
    }

    /// Position of the record the cursor currently rests on.
    pub fn rid(&self) -> Rid {
        self.rid
    }
}
