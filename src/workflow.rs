// Workflow: capacity check first, then upload resolution. Nothing on the
// remote side is touched until the capacity check has passed.

use tracing::info;

use crate::capacity::check_capacity;
use crate::error::{MfError, Result};
use crate::model::UploadRequest;
use crate::resolver::{Resolution, Resolver};
use crate::store::RemoteStore;

pub fn run<S: RemoteStore + ?Sized>(store: &S, request: &UploadRequest) -> Result<Resolution> {
    run_at(store, request, chrono::Utc::now().timestamp())
}

/// Same as [`run`] with a fixed disambiguation timestamp.
pub fn run_at<S: RemoteStore + ?Sized>(
    store: &S,
    request: &UploadRequest,
    timestamp: i64,
) -> Result<Resolution> {
    let info = store.account_info().map_err(|e| match e {
        MfError::ServiceInfo(_) => e,
        other => MfError::ServiceInfo(other.to_string()),
    })?;
    info!(account = %info.display_name, "account holder");
    check_capacity(&info, request.size)?;

    Resolver::with_timestamp(store, request, timestamp).run()
}
