use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

use crate::access;
use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::{MeResponse, ReportKeyQuery};
use crate::server::guard::{require_owner_or_admin, require_report_key};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};

/// Keys of every report the caller may open.
pub async fn list_report_keys(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let keys = access::list_accessible_report_keys(state.store.as_ref(), &user.username)
        .api_err("Failed to list report keys")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(keys)))
}

/// Everyone who may open a report. Restricted to its owner and admins.
pub async fn list_report_users(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportKeyQuery>,
) -> impl IntoResponse {
    let key = require_report_key(query.report_key.as_deref())?;

    require_owner_or_admin(state.store.as_ref(), &user.username, &key)?;

    let users = access::list_authorized_users(state.store.as_ref(), key.as_str())
        .api_err("Failed to list report users")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(users)))
}

pub async fn me(user: RequireUser, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let record = state
        .store
        .get_user(&user.username)
        .api_err("Failed to load user")?;
    let is_admin = state
        .store
        .is_admin(&user.username)
        .api_err("Failed to check admin role")?;

    let response = MeResponse {
        username: user.username,
        report_key: record.map(|u| u.report_key),
        is_admin,
    };

    Ok::<_, ApiError>(Json(ApiResponse::success(response)))
}
