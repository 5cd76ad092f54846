use crate::consts::page_consts::{PAGE_SIZE, PREALLOCATED_PAGES};
use crate::errors::storage_error::StorageError;
use std::collections::HashMap;
use std::fs::{self, DirBuilder, File, OpenOptions};
use std::io;
use std::os::unix::fs::{DirBuilderExt, FileExt};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

// ENOSPC / EDQUOT, surfaced as a distinct NoSpace error.
const ENOSPC: i32 = 28;
const EDQUOT: i32 = 122;

struct OpenFile {
    file: Arc<File>,
    path: PathBuf,
    // Next logical page number handed out for this fd.
    next_page_no: Arc<AtomicI32>,
}

#[derive(Default)]
struct Registry {
    path2fd: HashMap<PathBuf, i32>,
    fd2file: HashMap<i32, OpenFile>,
    next_fd: i32,
}

/// Page-granular persistence over named files, plus a single shared
/// append-only log file. File handles are crate-assigned integers; all I/O
/// is positional, so there is no shared cursor state between callers.
pub struct DiskManager {
    registry: Mutex<Registry>,
    log_fd: Mutex<Option<i32>>,
    log_path: Mutex<Option<PathBuf>>,
}

impl DiskManager {
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
            log_fd: Mutex::new(None),
            log_path: Mutex::new(None),
        }
    }

    pub fn is_file(path: &Path) -> bool {
        path.is_file()
    }

    pub fn is_dir(path: &Path) -> bool {
        path.is_dir()
    }

    /// Create `path` with its parent directories (mode 0755) and preallocate
    /// page 0 plus headroom. The partial file is removed if anything fails
    /// after creation.
    pub fn create_file(&self, path: &Path) -> Result<(), StorageError> {
        if Self::is_file(path) {
            return Err(StorageError::FileExists(path.to_path_buf()));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !Self::is_dir(parent) {
                DirBuilder::new().recursive(true).mode(0o755).create(parent)?;
            }
        }
        let file = File::create(path)?;
        if let Err(e) = file.set_len((PREALLOCATED_PAGES * PAGE_SIZE) as u64) {
            drop(file);
            let _ = fs::remove_file(path);
            return Err(map_io(e));
        }
        debug!(path = %path.display(), "created file");
        Ok(())
    }

    /// Unlink `path`. The file must exist and must not be open.
    pub fn destroy_file(&self, path: &Path) -> Result<(), StorageError> {
        if !Self::is_file(path) {
            return Err(StorageError::FileNotFound(path.to_path_buf()));
        }
        if self.registry.lock().unwrap().path2fd.contains_key(path) {
            return Err(StorageError::FileStillOpen(path.to_path_buf()));
        }
        fs::remove_file(path)?;
        debug!(path = %path.display(), "destroyed file");
        Ok(())
    }

    /// Open `path` read-write and register it. Idempotent: a second open of
    /// the same path returns the existing fd. The per-fd page counter starts
    /// at 0; the record layer seeds it from the file header.
    pub fn open_file(&self, path: &Path) -> Result<i32, StorageError> {
        let mut reg = self.registry.lock().unwrap();
        if let Some(&fd) = reg.path2fd.get(path) {
            return Ok(fd);
        }
        if !Self::is_file(path) {
            return Err(StorageError::FileNotFound(path.to_path_buf()));
        }
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let fd = reg.next_fd;
        reg.next_fd += 1;
        reg.path2fd.insert(path.to_path_buf(), fd);
        reg.fd2file.insert(
            fd,
            OpenFile {
                file: Arc::new(file),
                path: path.to_path_buf(),
                next_page_no: Arc::new(AtomicI32::new(0)),
            },
        );
        Ok(fd)
    }

    pub fn close_file(&self, fd: i32) -> Result<(), StorageError> {
        let mut reg = self.registry.lock().unwrap();
        let open = reg.fd2file.remove(&fd).ok_or(StorageError::FileNotOpen(fd))?;
        reg.path2fd.remove(&open.path);
        Ok(())
    }

    pub fn file_name(&self, fd: i32) -> Result<PathBuf, StorageError> {
        let reg = self.registry.lock().unwrap();
        reg.fd2file
            .get(&fd)
            .map(|f| f.path.clone())
            .ok_or(StorageError::FileNotOpen(fd))
    }

    pub fn file_fd(&self, path: &Path) -> Result<i32, StorageError> {
        if let Some(&fd) = self.registry.lock().unwrap().path2fd.get(path) {
            return Ok(fd);
        }
        self.open_file(path)
    }

    fn handle(&self, fd: i32) -> Result<Arc<File>, StorageError> {
        let reg = self.registry.lock().unwrap();
        reg.fd2file
            .get(&fd)
            .map(|f| Arc::clone(&f.file))
            .ok_or(StorageError::FileNotOpen(fd))
    }

    /// Read one page at `page_no * PAGE_SIZE` into `buf`. Reading past EOF
    /// zero-fills the buffer; any other short read is an I/O error.
    pub fn read_page(&self, fd: i32, page_no: i32, buf: &mut [u8]) -> Result<(), StorageError> {
        let file = self.handle(fd)?;
        let offset = page_no as u64 * PAGE_SIZE as u64;
        let n = file.read_at(buf, offset)?;
        if n == 0 {
            buf.fill(0);
        } else if n != buf.len() {
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("short read: {} of {} bytes", n, buf.len()),
            )));
        }
        Ok(())
    }

    /// Write one page at `page_no * PAGE_SIZE`.
    pub fn write_page(&self, fd: i32, page_no: i32, buf: &[u8]) -> Result<(), StorageError> {
        let file = self.handle(fd)?;
        let offset = page_no as u64 * PAGE_SIZE as u64;
        match file.write_at(buf, offset) {
            Ok(n) if n == buf.len() => Ok(()),
            Ok(n) => Err(StorageError::Io(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short write: {} of {} bytes", n, buf.len()),
            ))),
            Err(e) => Err(map_io(e)),
        }
    }

    /// Hand out the next logical page number for `fd`. Fetch-and-add, safe
    /// under concurrent callers.
    pub fn allocate_page(&self, fd: i32) -> Result<i32, StorageError> {
        let counter = {
            let reg = self.registry.lock().unwrap();
            reg.fd2file
                .get(&fd)
                .map(|f| Arc::clone(&f.next_page_no))
                .ok_or(StorageError::FileNotOpen(fd))?
        };
        Ok(counter.fetch_add(1, Ordering::Relaxed))
    }

    /// Logical no-op: files never shrink and page numbers are never reused.
    pub fn deallocate_page(&self, _page_no: i32) {}

    /// Seed the allocation counter after reading a file header.
    pub fn set_page_count(&self, fd: i32, num_pages: i32) -> Result<(), StorageError> {
        let reg = self.registry.lock().unwrap();
        let open = reg.fd2file.get(&fd).ok_or(StorageError::FileNotOpen(fd))?;
        open.next_page_no.store(num_pages, Ordering::Relaxed);
        Ok(())
    }

    /// Bind the shared log file. Called by the catalog when a database is
    /// opened; the log file itself is created at `create_db` time.
    pub fn open_log(&self, path: &Path) -> Result<(), StorageError> {
        let fd = self.open_file(path)?;
        *self.log_fd.lock().unwrap() = Some(fd);
        *self.log_path.lock().unwrap() = Some(path.to_path_buf());
        Ok(())
    }

    pub fn close_log(&self) -> Result<(), StorageError> {
        if let Some(fd) = self.log_fd.lock().unwrap().take() {
            self.close_file(fd)?;
        }
        *self.log_path.lock().unwrap() = None;
        Ok(())
    }

    fn log_handle(&self) -> Result<(i32, Arc<File>), StorageError> {
        let fd = self
            .log_fd
            .lock()
            .unwrap()
            .ok_or(StorageError::FileNotOpen(-1))?;
        Ok((fd, self.handle(fd)?))
    }

    /// Read up to `buf.len()` bytes of the log starting at `offset`.
    /// Returns `None` when `offset` lies beyond the end of the log.
    pub fn read_log(&self, buf: &mut [u8], offset: u64) -> Result<Option<usize>, StorageError> {
        let (_, file) = self.log_handle()?;
        let file_size = file.metadata()?.len();
        if offset > file_size {
            return Ok(None);
        }
        let len = buf.len().min((file_size - offset) as usize);
        if len == 0 {
            return Ok(Some(0));
        }
        file.read_exact_at(&mut buf[..len], offset)?;
        Ok(Some(len))
    }

    /// Append `data` at the current end of the log.
    pub fn write_log(&self, data: &[u8]) -> Result<(), StorageError> {
        let (_, file) = self.log_handle()?;
        let file_size = file.metadata()?.len();
        match file.write_at(data, file_size) {
            Ok(n) if n == data.len() => Ok(()),
            Ok(n) => Err(StorageError::Io(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short log write: {} of {} bytes", n, data.len()),
            ))),
            Err(e) => Err(map_io(e)),
        }
    }
}

impl Default for DiskManager {
    fn default() -> Self {
        Self::new()
    }
}

fn map_io(e: io::Error) -> StorageError {
    match e.raw_os_error() {
        Some(ENOSPC) | Some(EDQUOT) => StorageError::NoSpace,
        _ => StorageError::Io(e),
    }
}
