pub mod records;
pub mod sync_logs;
