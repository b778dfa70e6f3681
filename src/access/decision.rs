use std::collections::BTreeSet;

use super::AccessPolicy;
use crate::error::Result;
use crate::store::Store;
use crate::types::{ReportKey, Revocation, normalize_username};

/// Returns true if `username` may read and write the report under `report_key`.
///
/// Blank inputs are denied. Admins are allowed unconditionally, before any
/// user or grant lookup. Otherwise the user must exist and either own the
/// key or hold an explicit grant on it. Store failures propagate as errors
/// and are never turned into a decision.
pub fn is_allowed(store: &dyn Store, report_key: &str, username: &str) -> Result<bool> {
    match ReportKey::new(report_key) {
        Some(key) => is_allowed_for(store, &key, username),
        None => Ok(false),
    }
}

/// Same as [`is_allowed`] for a key that has already been normalized.
pub fn is_allowed_for(store: &dyn Store, key: &ReportKey, username: &str) -> Result<bool> {
    let Some(username) = normalize_username(username) else {
        return Ok(false);
    };

    if store.is_admin(username)? {
        return Ok(true);
    }

    let Some(user) = store.get_user(username)? else {
        tracing::debug!("Denied '{}' on '{}': unknown user", username, key);
        return Ok(false);
    };

    if &user.report_key == key {
        return Ok(true);
    }

    let granted = store.has_grant(key, &user.username)?;
    if !granted {
        tracing::debug!("Denied '{}' on '{}': no grant", username, key);
    }
    Ok(granted)
}

/// Returns true if `username` is a known user whose own report is `key`.
pub fn is_owner(store: &dyn Store, key: &ReportKey, username: &str) -> Result<bool> {
    Ok(store
        .get_user(username)?
        .is_some_and(|user| &user.report_key == key))
}

/// Returns true if `username` may grant or revoke access to `key` for others.
///
/// This is the only place the owner-only rule is decided.
pub fn can_manage_access(
    store: &dyn Store,
    policy: AccessPolicy,
    key: &ReportKey,
    username: &str,
) -> Result<bool> {
    if normalize_username(username).is_none() {
        return Ok(false);
    }

    if is_owner(store, key, username)? {
        return Ok(true);
    }

    Ok(policy.admins_manage_access && store.is_admin(username)?)
}

/// Sorted keys of every report `username` may access.
///
/// Admins see every known key. Everyone else sees their own key plus the
/// keys explicitly granted to them. Unknown or blank usernames see nothing.
pub fn list_accessible_report_keys(store: &dyn Store, username: &str) -> Result<Vec<ReportKey>> {
    let Some(username) = normalize_username(username) else {
        return Ok(Vec::new());
    };

    if store.is_admin(username)? {
        return store.list_all_report_keys();
    }

    let Some(user) = store.get_user(username)? else {
        return Ok(Vec::new());
    };

    let mut keys = BTreeSet::from([user.report_key]);
    keys.extend(store.list_granted_keys_for(&user.username)?);
    Ok(keys.into_iter().collect())
}

/// Sorted usernames authorized for `report_key`: owners, grantees and admins.
///
/// For owner and admin facing listings only; decisions go through
/// [`is_allowed`].
pub fn list_authorized_users(store: &dyn Store, report_key: &str) -> Result<Vec<String>> {
    let Some(key) = ReportKey::new(report_key) else {
        return Ok(Vec::new());
    };

    let mut users: BTreeSet<String> = store
        .get_report_owner(&key)?
        .into_iter()
        .map(|user| user.username)
        .collect();
    users.extend(store.list_grantees(&key)?);
    users.extend(store.list_admins()?);
    Ok(users.into_iter().collect())
}

/// Grants `username` access to `report_key`.
///
/// Returns false without touching the store when either side is blank or the
/// grantee is not a known user.
pub fn grant_access(store: &dyn Store, report_key: &str, username: &str) -> Result<bool> {
    let (Some(key), Some(username)) = (ReportKey::new(report_key), normalize_username(username))
    else {
        return Ok(false);
    };

    let granted = store.grant(&key, username)?;
    if granted {
        tracing::info!("Granted '{}' access to report '{}'", username, key);
    }
    Ok(granted)
}

/// Removes an explicit grant. Ownership and admin rights are unaffected.
pub fn revoke_access(
    store: &dyn Store,
    report_key: &str,
    username: &str,
) -> Result<Option<Revocation>> {
    let (Some(key), Some(username)) = (ReportKey::new(report_key), normalize_username(username))
    else {
        return Ok(None);
    };

    let revocation = store.revoke(&key, username)?;
    tracing::info!(
        "Revoked '{}' access to report '{}' at {} (removed: {})",
        revocation.username,
        revocation.report_key,
        revocation.revoked_at.to_rfc3339(),
        revocation.removed
    );
    Ok(Some(revocation))
}
