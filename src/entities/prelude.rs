pub use super::entity_records::Entity as EntityRecords;
pub use super::sync_logs::Entity as SyncLogs;
