pub mod bulk_sync;
pub use bulk_sync::{BulkFailure, BulkSyncReport};

pub mod enrichment;
pub use enrichment::{EnrichmentError, EnrichmentService};

pub mod entity_syncer;
pub use entity_syncer::EntitySyncer;

mod inverse;

pub mod sync_service;
pub use sync_service::{KindSyncer, SyncEngine, SyncError, SyncOptions};
