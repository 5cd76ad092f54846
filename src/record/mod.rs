pub mod bitmap;
pub mod heap_file;
pub mod scan;
pub mod slotted_page;
