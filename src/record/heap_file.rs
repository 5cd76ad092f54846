use crate::consts::page_consts::{FIRST_RECORD_PAGE, NO_PAGE, PAGE_SIZE};
use crate::errors::storage_error::StorageError;
use crate::record::bitmap;
use crate::record::scan::RecordScan;
use crate::record::slotted_page::{bitmap_range, slot_range, FileHeader, RecordPageHeader};
use crate::storage::disk_manager::DiskManager;
use crate::storage::page::PageId;
use crate::storage::page_cache::{PageCache, PageGuard};
use crate::transaction::Context;
use crate::types::record_types::{Record, Rid};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Open handle to one slotted-page heap file.
///
/// The in-memory file header is the authoritative copy while the file is
/// open; it is mirrored back to page 0 at close. The header mutex doubles
/// as the file-level latch serializing free-list and page-count updates
/// against concurrent inserts and deletes.
pub struct HeapFile {
    fd: i32,
    path: PathBuf,
    cache: Arc<PageCache>,
    hdr: Mutex<FileHeader>,
}

impl HeapFile {
    /// Create a heap file for fixed-width records of `record_size` bytes and
    /// write its header page.
    pub fn create(disk: &DiskManager, path: &Path, record_size: usize) -> Result<(), StorageError> {
        let hdr = FileHeader::for_record_size(record_size).ok_or_else(|| {
            StorageError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("record of {} bytes does not fit a page", record_size),
            ))
        })?;
        disk.create_file(path)?;
        let fd = disk.open_file(path)?;
        let mut page0 = [0u8; PAGE_SIZE];
        page0[..hdr.to_bytes().len()].copy_from_slice(&hdr.to_bytes());
        let res = disk.write_page(fd, 0, &page0);
        disk.close_file(fd)?;
        if res.is_err() {
            let _ = disk.destroy_file(path);
        }
        res
    }

    /// Open an existing heap file, loading the header from page 0 and
    /// seeding the disk manager's page counter.
    pub fn open(cache: Arc<PageCache>, path: &Path) -> Result<Self, StorageError> {
        let fd = cache.disk().open_file(path)?;
        let mut page0 = [0u8; PAGE_SIZE];
        cache.disk().read_page(fd, 0, &mut page0)?;
        let hdr = FileHeader::from_bytes(&page0);
        cache.disk().set_page_count(fd, hdr.num_pages)?;
        debug!(path = %path.display(), fd, num_pages = hdr.num_pages, "opened heap file");
        Ok(Self {
            fd,
            path: path.to_path_buf(),
            cache,
            hdr: Mutex::new(hdr),
        })
    }

    /// Mirror the header to page 0, flush cached pages, and close the fd.
    pub fn close(self) -> Result<(), StorageError> {
        let hdr = *self.hdr.lock().unwrap();
        let mut page0 = [0u8; PAGE_SIZE];
        page0[..hdr.to_bytes().len()].copy_from_slice(&hdr.to_bytes());
        self.cache.disk().write_page(self.fd, 0, &page0)?;
        self.cache.evict_file(self.fd)?;
        self.cache.disk().close_file(self.fd)
    }

    /// Remove a heap file from disk. The file must be closed.
    pub fn destroy(disk: &DiskManager, path: &Path) -> Result<(), StorageError> {
        disk.destroy_file(path)
    }

    pub fn fd(&self) -> i32 {
        self.fd
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record_size(&self) -> usize {
        self.hdr.lock().unwrap().record_size as usize
    }

    pub fn num_pages(&self) -> i32 {
        self.hdr.lock().unwrap().num_pages
    }

    /// Snapshot of the file header. Geometry fields are immutable; only
    /// `num_pages` and `first_free_page_no` can be stale.
    pub fn header(&self) -> FileHeader {
        *self.hdr.lock().unwrap()
    }

    /// Pin a record page, bounds-checked against the current page count.
    pub fn fetch_page_handle(&self, page_no: i32) -> Result<PageGuard<'_>, StorageError> {
        let num_pages = self.hdr.lock().unwrap().num_pages;
        self.fetch_checked(page_no, num_pages)
    }

    fn fetch_checked(&self, page_no: i32, num_pages: i32) -> Result<PageGuard<'_>, StorageError> {
        if page_no < FIRST_RECORD_PAGE || page_no >= num_pages {
            return Err(StorageError::PageNotExist {
                file: self.path.clone(),
                page_no,
            });
        }
        self.cache.fetch_page(PageId::new(self.fd, page_no))
    }

    /// Allocate and initialize a fresh record page, pushing it onto the
    /// front of the free list before anything is inserted into it.
    fn create_new_page_handle(&self, hdr: &mut FileHeader) -> Result<PageGuard<'_>, StorageError> {
        let (page_no, mut page) = self.cache.new_page(self.fd)?;
        page.write(|bytes| {
            RecordPageHeader {
                next_free_page_no: hdr.first_free_page_no,
                num_records: 0,
            }
            .write(bytes);
            bytes[bitmap_range(hdr)].fill(0);
        });
        hdr.num_pages += 1;
        hdr.first_free_page_no = page_no;
        Ok(page)
    }

    /// Pin a page with at least one free slot, creating one if the free
    /// list is empty.
    fn create_page_handle(&self, hdr: &mut FileHeader) -> Result<PageGuard<'_>, StorageError> {
        if hdr.first_free_page_no == NO_PAGE {
            self.create_new_page_handle(hdr)
        } else {
            self.fetch_checked(hdr.first_free_page_no, hdr.num_pages)
        }
    }

    fn check_payload(&self, hdr: &FileHeader, buf: &[u8]) -> Result<(), StorageError> {
        if buf.len() != hdr.record_size as usize {
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "payload of {} bytes for record size {}",
                    buf.len(),
                    hdr.record_size
                ),
            )));
        }
        Ok(())
    }

    /// Insert a record into the first free slot of the first free page.
    /// Takes an exclusive table lock when a context is supplied.
    pub fn insert_record(&self, buf: &[u8], ctx: Option<&Context>) -> Result<Rid, StorageError> {
        if let Some(ctx) = ctx {
            ctx.lock_mgr.lock_exclusive_on_table(ctx.txn, self.fd)?;
        }
        let mut hdr = self.hdr.lock().unwrap();
        self.check_payload(&hdr, buf)?;
        let mut page = self.create_page_handle(&mut hdr)?;
        let n = hdr.num_records_per_page as usize;
        let geom = *hdr;
        let inserted = page.write(|bytes| {
            let slot_no = bitmap::first_clear_bit(&bytes[bitmap_range(&geom)], n)?;
            bytes[slot_range(&geom, slot_no as i32)].copy_from_slice(buf);
            bitmap::set_bit(&mut bytes[bitmap_range(&geom)], slot_no);
            let mut ph = RecordPageHeader::read(bytes);
            ph.num_records += 1;
            ph.write(bytes);
            Some((slot_no as i32, ph))
        });
        let (slot_no, ph) = inserted.ok_or_else(|| {
            StorageError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                "free-list page has no free slot",
            ))
        })?;
        // A page that just became full leaves the free list.
        if ph.num_records == hdr.num_records_per_page {
            hdr.first_free_page_no = ph.next_free_page_no;
        }
        Ok(Rid::new(page.page_no(), slot_no))
    }

    /// Insert a record at a caller-chosen position (replay and undo paths).
    /// No locking is taken; the slot must be vacant.
    pub fn insert_record_at(&self, rid: Rid, buf: &[u8]) -> Result<(), StorageError> {
        let mut hdr = self.hdr.lock().unwrap();
        self.check_payload(&hdr, buf)?;
        self.check_slot(&hdr, rid)?;
        let mut page = self.fetch_checked(rid.page_no, hdr.num_pages)?;
        let geom = *hdr;
        let occupied =
            page.read(|bytes| bitmap::test_bit(&bytes[bitmap_range(&geom)], rid.slot_no as usize));
        if occupied {
            return Err(StorageError::SlotOccupied(rid));
        }
        let ph = page.write(|bytes| {
            bytes[slot_range(&geom, rid.slot_no)].copy_from_slice(buf);
            bitmap::set_bit(&mut bytes[bitmap_range(&geom)], rid.slot_no as usize);
            let mut ph = RecordPageHeader::read(bytes);
            ph.num_records += 1;
            ph.write(bytes);
            ph
        });
        if ph.num_records == hdr.num_records_per_page {
            hdr.first_free_page_no = ph.next_free_page_no;
        }
        Ok(())
    }

    /// Copy the record at `rid` into an owned buffer. Takes a shared row
    /// lock when a context is supplied.
    pub fn get_record(&self, rid: Rid, ctx: Option<&Context>) -> Result<Record, StorageError> {
        if let Some(ctx) = ctx {
            ctx.lock_mgr.lock_shared_on_record(ctx.txn, rid, self.fd)?;
        }
        let hdr = *self.hdr.lock().unwrap();
        self.check_slot(&hdr, rid)?;
        let page = self.fetch_checked(rid.page_no, hdr.num_pages)?;
        let data = page.read(|bytes| bytes[slot_range(&hdr, rid.slot_no)].to_vec());
        Ok(Record { data })
    }

    /// Overwrite the record at `rid` in place. Takes an exclusive row lock
    /// when a context is supplied.
    pub fn update_record(
        &self,
        rid: Rid,
        buf: &[u8],
        ctx: Option<&Context>,
    ) -> Result<(), StorageError> {
        if let Some(ctx) = ctx {
            ctx.lock_mgr.lock_exclusive_on_record(ctx.txn, rid, self.fd)?;
        }
        let hdr = *self.hdr.lock().unwrap();
        self.check_payload(&hdr, buf)?;
        self.check_slot(&hdr, rid)?;
        let mut page = self.fetch_checked(rid.page_no, hdr.num_pages)?;
        let live =
            page.read(|bytes| bitmap::test_bit(&bytes[bitmap_range(&hdr)], rid.slot_no as usize));
        if !live {
            return Err(StorageError::RecordNotFound(rid));
        }
        page.write(|bytes| bytes[slot_range(&hdr, rid.slot_no)].copy_from_slice(buf));
        Ok(())
    }

    /// Delete the record at `rid`, returning the page to the free list when
    /// it was full. Takes an exclusive row lock when a context is supplied.
    pub fn delete_record(&self, rid: Rid, ctx: Option<&Context>) -> Result<(), StorageError> {
        if let Some(ctx) = ctx {
            ctx.lock_mgr.lock_exclusive_on_record(ctx.txn, rid, self.fd)?;
        }
        let mut hdr = self.hdr.lock().unwrap();
        self.check_slot(&hdr, rid)?;
        let mut page = self.fetch_checked(rid.page_no, hdr.num_pages)?;
        let geom = *hdr;
        let live =
            page.read(|bytes| bitmap::test_bit(&bytes[bitmap_range(&geom)], rid.slot_no as usize));
        if !live {
            return Err(StorageError::RecordNotFound(rid));
        }
        let first_free = hdr.first_free_page_no;
        let became_free = page.write(|bytes| {
            bitmap::clear_bit(&mut bytes[bitmap_range(&geom)], rid.slot_no as usize);
            let mut ph = RecordPageHeader::read(bytes);
            ph.num_records -= 1;
            let became_free = ph.num_records == geom.num_records_per_page - 1;
            if became_free {
                // Full -> not full: push the page onto the free list.
                ph.next_free_page_no = first_free;
            }
            ph.write(bytes);
            became_free
        });
        if became_free {
            hdr.first_free_page_no = rid.page_no;
        }
        Ok(())
    }

    fn check_slot(&self, hdr: &FileHeader, rid: Rid) -> Result<(), StorageError> {
        if rid.slot_no < 0 || rid.slot_no >= hdr.num_records_per_page {
            return Err(StorageError::RecordNotFound(rid));
        }
        Ok(())
    }

    /// Iterator over every live record, positioned on the first one.
    pub fn scan(&self) -> Result<RecordScan<'_>, StorageError> {
        RecordScan::new(self)
    }
}
