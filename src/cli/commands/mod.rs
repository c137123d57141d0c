mod enrich;
mod logs;
mod records;
mod sync;

pub use enrich::cmd_enrich;
pub use logs::cmd_logs;
pub use records::{cmd_add_movie, cmd_list_records};
pub use sync::cmd_sync;
