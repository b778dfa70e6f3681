use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use crate::access;
use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::{ReportAccessRequest, ReportAccessResponse, ReportKeyQuery};
use crate::server::guard::{require_access_manager, require_owner_or_admin, require_report_key};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::{parse_body, validate_username};
use crate::types::ReportKey;

const TARGET_REQUIRED: &str = "report_key and user_id are required";

fn access_target(req: &ReportAccessRequest) -> Result<(ReportKey, String), ApiError> {
    let key = ReportKey::from_optional(req.report_key.as_deref())
        .ok_or_else(|| ApiError::bad_request(TARGET_REQUIRED))?;
    let username = validate_username(req.user_id.as_deref(), TARGET_REQUIRED)?;
    Ok((key, username))
}

pub async fn list_report_access(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportKeyQuery>,
) -> impl IntoResponse {
    let key = require_report_key(query.report_key.as_deref())?;

    require_owner_or_admin(state.store.as_ref(), &user.username, &key)?;

    let grants = state
        .store
        .list_grants(&key)
        .api_err("Failed to list report access")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(grants)))
}

pub async fn grant_report_access(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    body: Result<Json<ReportAccessRequest>, JsonRejection>,
) -> impl IntoResponse {
    let req = parse_body(body)?;
    let (key, grantee) = access_target(&req)?;

    require_access_manager(state.store.as_ref(), state.policy, &user.username, &key)?;

    let granted = access::grant_access(state.store.as_ref(), key.as_str(), &grantee)
        .api_err("Failed to grant report access")?;

    let response = ReportAccessResponse {
        report_key: key,
        user_id: grantee,
        granted,
    };

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(response))))
}

pub async fn revoke_report_access(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    body: Result<Json<ReportAccessRequest>, JsonRejection>,
) -> impl IntoResponse {
    let req = parse_body(body)?;
    let (key, grantee) = access_target(&req)?;

    require_access_manager(state.store.as_ref(), state.policy, &user.username, &key)?;

    // Both sides were validated above, so revoke_access always yields a record.
    let Some(revocation) = access::revoke_access(state.store.as_ref(), key.as_str(), &grantee)
        .api_err("Failed to revoke report access")?
    else {
        tracing::error!("Revoke on '{}' for '{}' produced no record", key, grantee);
        return Err(ApiError::internal("Failed to revoke report access"));
    };

    Ok::<_, ApiError>(Json(ApiResponse::success(revocation)))
}
