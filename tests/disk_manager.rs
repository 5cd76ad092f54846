use slotbase::consts::page_consts::{PAGE_SIZE, PREALLOCATED_PAGES};
use slotbase::errors::storage_error::StorageError;
use slotbase::storage::disk_manager::DiskManager;
use tempfile::TempDir;

#[test]
fn create_fails_on_existing_file() {
    let dir = TempDir::new().unwrap();
    let disk = DiskManager::new();
    let path = dir.path().join("t");
    disk.create_file(&path).unwrap();
    assert!(matches!(
        disk.create_file(&path),
        Err(StorageError::FileExists(_))
    ));
}

#[test]
fn create_preallocates_and_makes_parent_dirs() {
    let dir = TempDir::new().unwrap();
    let disk = DiskManager::new();
    let path = dir.path().join("nested").join("deeper").join("t");
    disk.create_file(&path).unwrap();
    let meta = std::fs::metadata(&path).unwrap();
    assert_eq!(meta.len(), (PREALLOCATED_PAGES * PAGE_SIZE) as u64);
}

#[test]
fn open_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let disk = DiskManager::new();
    assert!(matches!(
        disk.open_file(&dir.path().join("missing")),
        Err(StorageError::FileNotFound(_))
    ));
}

#[test]
fn open_is_idempotent_per_path() {
    let dir = TempDir::new().unwrap();
    let disk = DiskManager::new();
    let path = dir.path().join("t");
    disk.create_file(&path).unwrap();
    let fd1 = disk.open_file(&path).unwrap();
    let fd2 = disk.open_file(&path).unwrap();
    assert_eq!(fd1, fd2);
}

#[test]
fn close_unknown_fd_fails() {
    let disk = DiskManager::new();
    assert!(matches!(
        disk.close_file(99),
        Err(StorageError::FileNotOpen(99))
    ));
}

#[test]
fn destroy_rejects_missing_and_open_files() {
    let dir = TempDir::new().unwrap();
    let disk = DiskManager::new();
    let path = dir.path().join("t");
    assert!(matches!(
        disk.destroy_file(&path),
        Err(StorageError::FileNotFound(_))
    ));
    disk.create_file(&path).unwrap();
    let fd = disk.open_file(&path).unwrap();
    assert!(matches!(
        disk.destroy_file(&path),
        Err(StorageError::FileStillOpen(_))
    ));
    disk.close_file(fd).unwrap();
    disk.destroy_file(&path).unwrap();
    assert!(!path.exists());
}

#[test]
fn page_write_read_roundtrip() {
    let dir = TempDir::new().unwrap();
    let disk = DiskManager::new();
    let path = dir.path().join("t");
    disk.create_file(&path).unwrap();
    let fd = disk.open_file(&path).unwrap();

    let mut page = vec![0u8; PAGE_SIZE];
    page[0] = 0xAB;
    page[PAGE_SIZE - 1] = 0xCD;
    disk.write_page(fd, 2, &page).unwrap();

    let mut back = vec![0xFFu8; PAGE_SIZE];
    disk.read_page(fd, 2, &mut back).unwrap();
    assert_eq!(back, page);
}

#[test]
fn read_past_eof_zero_fills() {
    let dir = TempDir::new().unwrap();
    let disk = DiskManager::new();
    let path = dir.path().join("t");
    disk.create_file(&path).unwrap();
    let fd = disk.open_file(&path).unwrap();

    let mut buf = vec![0x55u8; PAGE_SIZE];
    disk.read_page(fd, 100, &mut buf).unwrap();
    assert!(buf.iter().all(|&b| b == 0));
}

#[test]
fn allocate_page_counts_up_from_seed() {
    let dir = TempDir::new().unwrap();
    let disk = DiskManager::new();
    let path = dir.path().join("t");
    disk.create_file(&path).unwrap();
    let fd = disk.open_file(&path).unwrap();

    assert_eq!(disk.allocate_page(fd).unwrap(), 0);
    assert_eq!(disk.allocate_page(fd).unwrap(), 1);
    disk.set_page_count(fd, 7).unwrap();
    assert_eq!(disk.allocate_page(fd).unwrap(), 7);
    assert_eq!(disk.allocate_page(fd).unwrap(), 8);
}

#[test]
fn log_append_and_read() {
    let dir = TempDir::new().unwrap();
    let disk = DiskManager::new();
    let path = dir.path().join("LOG");
    disk.create_file(&path).unwrap();
    // creation preallocates; the log grows from its current end
    let base = std::fs::metadata(&path).unwrap().len();
    disk.open_log(&path).unwrap();

    disk.write_log(b"hello ").unwrap();
    disk.write_log(b"world").unwrap();

    let mut buf = [0u8; 11];
    let n = disk.read_log(&mut buf, base).unwrap();
    assert_eq!(n, Some(11));
    assert_eq!(&buf, b"hello world");

    // offset at exact end reads zero bytes; past it reads nothing
    let end = base + 11;
    assert_eq!(disk.read_log(&mut buf, end).unwrap(), Some(0));
    assert_eq!(disk.read_log(&mut buf, end + 1).unwrap(), None);

    // short tail read
    let mut tail = [0u8; 32];
    let n = disk.read_log(&mut tail, base + 6).unwrap();
    assert_eq!(n, Some(5));
    assert_eq!(&tail[..5], b"world");
}
