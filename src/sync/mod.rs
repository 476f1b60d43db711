pub mod bridge;
pub mod postgrest;
pub mod remote;
pub mod row;

pub use bridge::{InitOutcome, SyncBridge, SyncStatus};
pub use postgrest::PostgrestRemote;
pub use remote::{MemoryRemote, RemoteStore, SyncError};
pub use row::RemoteRow;

use crate::config::SyncConfig;

/// The configured remote, or `None` for local-only mode. A broken `[sync]`
/// section is logged and treated as local-only.
pub fn remote_from_config(config: &SyncConfig) -> Option<Box<dyn RemoteStore>> {
    if !config.enabled {
        return None;
    }
    match PostgrestRemote::from_config(config) {
        Ok(remote) => Some(Box::new(remote)),
        Err(e) => {
            log::warn!("Remote sync disabled: {:#}", e);
            None
        }
    }
}
