pub mod prelude;

pub mod entity_records;
pub mod sync_logs;
