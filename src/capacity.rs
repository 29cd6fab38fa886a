// Capacity check: refuse to start when the account cannot hold the file.

use tracing::info;

use crate::error::{MfError, Result};
use crate::model::AccountInfo;

/// Free bytes on the account. Over-quota accounts report zero.
pub fn free_space(info: &AccountInfo) -> u64 {
    info.storage_limit.saturating_sub(info.used_storage)
}

/// Returns the free space when it exceeds `local_size`.
pub fn check_capacity(info: &AccountInfo, local_size: u64) -> Result<u64> {
    let free = free_space(info);
    info!(
        limit = info.storage_limit,
        used = info.used_storage,
        free,
        local_size,
        "storage figures"
    );
    if free <= local_size {
        return Err(MfError::Capacity {
            free,
            required: local_size,
        });
    }
    info!("available space will suffice");
    Ok(free)
}
