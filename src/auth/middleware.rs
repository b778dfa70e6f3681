use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::helpers::extract_username;
use crate::error::Error;
use crate::server::AppState;

/// Extractor that requires an authenticated user.
///
/// The username is provisioned on first sight, so every handler that takes
/// this extractor can rely on the user row existing.
pub struct RequireUser {
    pub username: String,
}

/// Extractor that requires an authenticated admin.
pub struct RequireAdmin {
    pub username: String,
}

#[derive(Debug)]
pub enum AuthError {
    MissingIdentity,
    /// The identity normalizes to a report key another user already owns.
    IdentityConflict,
    NotAdmin,
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingIdentity => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            AuthError::IdentityConflict | AuthError::NotAdmin => {
                (StatusCode::FORBIDDEN, "Forbidden")
            }
            AuthError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = json!({ "data": null, "error": message });

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer realm=\"snowline\""),
            );
        }

        response
    }
}

impl FromRequestParts<Arc<AppState>> for RequireUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let username = resolve_user(parts, state)?;
        Ok(RequireUser { username })
    }
}

impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let username = resolve_user(parts, state)?;

        let is_admin = state.store.is_admin(&username).map_err(|e| {
            tracing::error!("Failed to check admin role for '{username}': {e}");
            AuthError::InternalError
        })?;

        if !is_admin {
            return Err(AuthError::NotAdmin);
        }

        Ok(RequireAdmin { username })
    }
}

fn resolve_user(parts: &Parts, state: &Arc<AppState>) -> Result<String, AuthError> {
    let claimed = extract_username(&parts.headers, &state.identity_header)
        .ok_or(AuthError::MissingIdentity)?;

    state
        .store
        .get_or_create_user(&claimed, None)
        .map_err(|e| match e {
            Error::ReportKeyTaken(key) => {
                tracing::warn!("Refused '{claimed}': report key '{key}' belongs to another user");
                AuthError::IdentityConflict
            }
            e => {
                tracing::error!("Failed to provision user '{claimed}': {e}");
                AuthError::InternalError
            }
        })
}
