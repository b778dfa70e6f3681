use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireAdmin;
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::AdminRequest;
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::{parse_body, validate_username};

pub async fn list_admins(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let admins = state
        .store
        .list_admins()
        .api_err("Failed to list admins")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(admins)))
}

pub async fn add_admin(
    admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    body: Result<Json<AdminRequest>, JsonRejection>,
) -> impl IntoResponse {
    let req = parse_body(body)?;
    let username = validate_username(req.username.as_deref(), "username is required")?;

    let username = match state.store.add_admin(&username) {
        Ok(username) => username,
        Err(Error::ReportKeyTaken(key)) => {
            return Err(ApiError::conflict(format!(
                "Report key '{key}' belongs to another user"
            )));
        }
        Err(e) => {
            tracing::error!("Failed to add admin: {e}");
            return Err(ApiError::internal("Failed to add admin"));
        }
    };

    tracing::info!("Admin '{}' granted admin role to '{}'", admin.username, username);

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(username))))
}

pub async fn revoke_admin(
    admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> impl IntoResponse {
    let username = validate_username(Some(&username), "username is required")?;

    let removed = state
        .store
        .revoke_admin(&username)
        .api_err("Failed to revoke admin")?;

    if removed {
        tracing::info!("Admin '{}' revoked admin role from '{}'", admin.username, username);
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
