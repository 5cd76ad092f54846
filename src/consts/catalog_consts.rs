pub const DB_META_FILE: &str = "DB_META"; // serialized catalog inside the database dir
pub const LOG_FILE: &str = "LOG";         // shared append-only log file
