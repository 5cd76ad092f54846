use crate::errors::storage_error::StorageError;
use crate::storage::disk_manager::DiskManager;
use crate::storage::page::{Frame, PageId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type FrameRef = Arc<Mutex<Frame>>;

/// Pin-counted page cache in front of the disk manager.
///
/// There is no replacement policy: frames stay resident until their file is
/// flushed out at close. Dirty frames are written back by `flush_file` /
/// `evict_file`; unpinning only records the dirty bit.
pub struct PageCache {
    disk: Arc<DiskManager>,
    frames: Mutex<HashMap<PageId, FrameRef>>,
}

impl PageCache {
    pub fn new(disk: Arc<DiskManager>) -> Self {
        Self {
            disk,
            frames: Mutex::new(HashMap::new()),
        }
    }

    pub fn disk(&self) -> &DiskManager {
        &self.disk
    }

    /// Pin the page, reading it from disk on a miss. The returned guard
    /// unpins on drop, on every exit path.
    pub fn fetch_page(&self, id: PageId) -> Result<PageGuard<'_>, StorageError> {
        let frame = {
            let mut frames = self.frames.lock().unwrap();
            match frames.get(&id) {
                Some(f) => Arc::clone(f),
                None => {
                    let mut frame = Frame::zeroed();
                    self.disk.read_page(id.fd, id.page_no, &mut frame.data[..])?;
                    let f = Arc::new(Mutex::new(frame));
                    frames.insert(id, Arc::clone(&f));
                    f
                }
            }
        };
        frame.lock().unwrap().pin_count += 1;
        Ok(PageGuard {
            cache: self,
            id,
            frame,
            dirty: false,
        })
    }

    /// Allocate the next page of `fd` and pin a zeroed frame for it.
    pub fn new_page(&self, fd: i32) -> Result<(i32, PageGuard<'_>), StorageError> {
        let page_no = self.disk.allocate_page(fd)?;
        let id = PageId::new(fd, page_no);
        let frame = Arc::new(Mutex::new(Frame::zeroed()));
        frame.lock().unwrap().pin_count = 1;
        self.frames.lock().unwrap().insert(id, Arc::clone(&frame));
        Ok((
            page_no,
            PageGuard {
                cache: self,
                id,
                frame,
                dirty: false,
            },
        ))
    }

    fn unpin(&self, id: PageId, dirty: bool) {
        let frames = self.frames.lock().unwrap();
        if let Some(frame) = frames.get(&id) {
            let mut f = frame.lock().unwrap();
            debug_assert!(f.pin_count > 0, "unpin of an unpinned page");
            f.pin_count = f.pin_count.saturating_sub(1);
            f.dirty |= dirty;
        }
    }

    /// Write every dirty frame of `fd` back to disk.
    pub fn flush_file(&self, fd: i32) -> Result<(), StorageError> {
        let targets: Vec<(PageId, FrameRef)> = {
            let frames = self.frames.lock().unwrap();
            frames
                .iter()
                .filter(|(id, _)| id.fd == fd)
                .map(|(id, f)| (*id, Arc::clone(f)))
                .collect()
        };
        for (id, frame) in targets {
            let mut f = frame.lock().unwrap();
            if f.dirty {
                self.disk.write_page(id.fd, id.page_no, &f.data[..])?;
                f.dirty = false;
            }
        }
        Ok(())
    }

    /// Flush and drop every frame of `fd`. Called when the file closes.
    pub fn evict_file(&self, fd: i32) -> Result<(), StorageError> {
        self.flush_file(fd)?;
        self.frames.lock().unwrap().retain(|id, _| id.fd != fd);
        Ok(())
    }
}

/// Transient handle to a pinned page. Never stored across operator
/// boundaries; dropping it releases the pin with the accumulated dirty flag.
pub struct PageGuard<'a> {
    cache: &'a PageCache,
    id: PageId,
    frame: FrameRef,
    dirty: bool,
}

impl PageGuard<'_> {
    pub fn page_id(&self) -> PageId {
        self.id
    }

    pub fn page_no(&self) -> i32 {
        self.id.page_no
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Read access to the page bytes.
    pub fn read<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        let frame = self.frame.lock().unwrap();
        f(&frame.data[..])
    }

    /// Write access to the page bytes; marks the page dirty.
    pub fn write<R>(&mut self, f: impl FnOnce(&mut [u8]) -> R) -> R {
        self.dirty = true;
        let mut frame = self.frame.lock().unwrap();
        f(&mut frame.data[..])
    }
}

impl Drop for PageGuard<'_> {
    fn drop(&mut self) {
        self.cache.unpin(self.id, self.dirty);
    }
}
