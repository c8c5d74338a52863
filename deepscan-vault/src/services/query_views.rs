//! Read-only listings over stored records

use deepscan_common::Result;

use crate::db::RecordStore;
use crate::models::Record;

/// Records returned by the vault listing
pub const VAULT_LIMIT: u32 = 100;

/// Records returned by the comparison history
pub const HISTORY_LIMIT: u32 = 50;

/// Most recent records of every kind, newest first
pub async fn vault(store: &dyn RecordStore) -> Result<Vec<Record>> {
    store.find_recent(VAULT_LIMIT).await
}

/// Most recent two-file comparisons, newest first
pub async fn history(store: &dyn RecordStore) -> Result<Vec<Record>> {
    store.find_recent_comparisons(HISTORY_LIMIT).await
}
