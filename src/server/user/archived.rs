use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    response::IntoResponse,
};

use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::{ReportKeyQuery, UpdateArchivedRequest};
use crate::server::guard::{require_report_access, require_report_key};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::{parse_body, require_field};

pub async fn get_archived(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportKeyQuery>,
) -> impl IntoResponse {
    let key = require_report_key(query.report_key.as_deref())?;

    require_report_access(state.store.as_ref(), &user.username, &key)?;

    let flags = state
        .store
        .get_archived(&key)
        .api_err("Failed to load archived state")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(flags)))
}

pub async fn update_archived(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    body: Result<Json<UpdateArchivedRequest>, JsonRejection>,
) -> impl IntoResponse {
    let req = parse_body(body)?;
    let key = require_report_key(req.report_key.as_deref())?;

    match (req.track_id.as_deref(), req.milestone, req.archived_by_track) {
        (Some(track_id), Some(milestone), _) => {
            let track_id = require_field(Some(track_id), "track_id cannot be empty")?;
            let milestone = milestone.to_string();

            require_report_access(state.store.as_ref(), &user.username, &key)?;

            let value = match req.value {
                Some(value) => value,
                None => {
                    let current = state
                        .store
                        .get_archived(&key)
                        .api_err("Failed to load archived state")?;
                    !current
                        .get(track_id)
                        .and_then(|m| m.get(&milestone))
                        .copied()
                        .unwrap_or(false)
                }
            };

            state
                .store
                .set_archived_flag(&key, track_id, &milestone, value, &user.username)
                .api_err("Failed to update archived state")?;
        }
        (_, _, Some(flags)) => {
            require_report_access(state.store.as_ref(), &user.username, &key)?;

            state
                .store
                .replace_archived(&key, &flags, &user.username)
                .api_err("Failed to update archived state")?;
        }
        _ => {
            return Err(ApiError::bad_request(
                "Provide (track_id and milestone) or archived_by_track",
            ));
        }
    }

    let updated = state
        .store
        .get_archived(&key)
        .api_err("Failed to load archived state")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(updated)))
}
