//! Resource guards.
//!
//! Handlers for report resources resolve the caller (401 via the
//! `RequireUser` extractor), then validate identifiers (400), then call one
//! of these guards (403) before touching any data. All decisions come from
//! [`crate::access`]; nothing here re-implements ownership or grant logic.

use crate::access::{self, AccessPolicy};
use crate::server::response::{ApiError, StoreResultExt};
use crate::store::Store;
use crate::types::ReportKey;

/// Normalizes a required report key, rejecting missing or blank keys.
pub fn require_report_key(raw: Option<&str>) -> Result<ReportKey, ApiError> {
    ReportKey::from_optional(raw).ok_or_else(|| ApiError::bad_request("report_key is required"))
}

/// Forbids the request unless `username` may read and write `key`.
pub fn require_report_access(
    store: &dyn Store,
    username: &str,
    key: &ReportKey,
) -> Result<(), ApiError> {
    if !access::is_allowed_for(store, key, username).api_err("Failed to check report access")? {
        return Err(ApiError::forbidden());
    }
    Ok(())
}

/// Forbids the request unless `username` may grant or revoke access to `key`.
pub fn require_access_manager(
    store: &dyn Store,
    policy: AccessPolicy,
    username: &str,
    key: &ReportKey,
) -> Result<(), ApiError> {
    if !access::can_manage_access(store, policy, key, username)
        .api_err("Failed to check report ownership")?
    {
        return Err(ApiError::forbidden());
    }
    Ok(())
}

/// Forbids the request unless `username` owns `key` or is an admin.
pub fn require_owner_or_admin(
    store: &dyn Store,
    username: &str,
    key: &ReportKey,
) -> Result<(), ApiError> {
    if access::is_owner(store, key, username).api_err("Failed to check report ownership")? {
        return Ok(());
    }
    if store.is_admin(username).api_err("Failed to check admin role")? {
        return Ok(());
    }
    Err(ApiError::forbidden())
}
