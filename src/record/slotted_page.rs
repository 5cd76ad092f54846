use crate::consts::page_consts::{FILE_HDR_SIZE, NO_PAGE, PAGE_SIZE, RECORD_PAGE_HDR_SIZE};

/// File header, mirrored between memory and page 0 of every record file.
/// All geometry fields are fixed at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub record_size: i32,
    pub num_records_per_page: i32,
    pub bitmap_size: i32,
    pub num_pages: i32,
    pub first_free_page_no: i32,
}

impl FileHeader {
    /// Geometry for a given record size: the largest slot count N with
    /// header + ceil(N/8) + N * record_size <= PAGE_SIZE. Returns `None`
    /// when not even one record fits.
    pub fn for_record_size(record_size: usize) -> Option<Self> {
        let usable = PAGE_SIZE - RECORD_PAGE_HDR_SIZE;
        let mut n = (usable * 8) / (record_size * 8 + 1);
        while n > 0 && RECORD_PAGE_HDR_SIZE + (n + 7) / 8 + n * record_size > PAGE_SIZE {
            n -= 1;
        }
        if n == 0 {
            return None;
        }
        Some(Self {
            record_size: record_size as i32,
            num_records_per_page: n as i32,
            bitmap_size: ((n + 7) / 8) as i32,
            num_pages: 1, // page 0 is this header
            first_free_page_no: NO_PAGE,
        })
    }

    pub fn to_bytes(&self) -> [u8; FILE_HDR_SIZE] {
        let mut buf = [0u8; FILE_HDR_SIZE];
        buf[0..4].copy_from_slice(&self.record_size.to_le_bytes());
        buf[4..8].copy_from_slice(&self.num_records_per_page.to_le_bytes());
        buf[8..12].copy_from_slice(&self.bitmap_size.to_le_bytes());
        buf[12..16].copy_from_slice(&self.num_pages.to_le_bytes());
        buf[16..20].copy_from_slice(&self.first_free_page_no.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8]) -> Self {
        Self {
            record_size: i32::from_le_bytes(buf[0..4].try_into().unwrap()),
            num_records_per_page: i32::from_le_bytes(buf[4..8].try_into().unwrap()),
            bitmap_size: i32::from_le_bytes(buf[8..12].try_into().unwrap()),
            num_pages: i32::from_le_bytes(buf[12..16].try_into().unwrap()),
            first_free_page_no: i32::from_le_bytes(buf[16..20].try_into().unwrap()),
        }
    }
}

/// Header at the front of every record page (pages >= 1).
///
/// `next_free_page_no` is meaningful only while the page sits on the free
/// list; a full page's link must not be walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordPageHeader {
    pub next_free_page_no: i32,
    pub num_records: i32,
}

impl RecordPageHeader {
    pub fn read(page: &[u8]) -> Self {
        Self {
            next_free_page_no: i32::from_le_bytes(page[0..4].try_into().unwrap()),
            num_records: i32::from_le_bytes(page[4..8].try_into().unwrap()),
        }
    }

    pub fn write(&self, page: &mut [u8]) {
        page[0..4].copy_from_slice(&self.next_free_page_no.to_le_bytes());
        page[4..8].copy_from_slice(&self.num_records.to_le_bytes());
    }
}

/// Byte ranges of the three views into a record page:
/// [header | bitmap | fixed-width slots].
pub fn bitmap_range(hdr: &FileHeader) -> std::ops::Range<usize> {
    RECORD_PAGE_HDR_SIZE..RECORD_PAGE_HDR_SIZE + hdr.bitmap_size as usize
}

pub fn slot_range(hdr: &FileHeader, slot_no: i32) -> std::ops::Range<usize> {
    let base = RECORD_PAGE_HDR_SIZE
        + hdr.bitmap_size as usize
        + slot_no as usize * hdr.record_size as usize;
    base..base + hdr.record_size as usize
}
