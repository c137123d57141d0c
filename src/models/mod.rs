pub mod actor;
pub mod director;
pub mod experiment;
pub mod metadata;
pub mod movie;
pub mod record;

pub use actor::Actor;
pub use director::Director;
pub use experiment::Experiment;
pub use metadata::{EnrichedMovie, EnrichmentSource, PrimaryMovie};
pub use movie::Movie;
pub use record::{NewRecord, NewSyncLogEntry, StoredRecord, SyncLogEntry, Tracked};
