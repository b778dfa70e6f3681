use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    response::IntoResponse,
};

use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::{ReportKeyQuery, UpdateMilestonesRequest};
use crate::server::guard::{require_report_access, require_report_key};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::{parse_body, require_field};
use crate::types::MilestoneMap;

pub async fn get_milestones(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportKeyQuery>,
) -> impl IntoResponse {
    let key = require_report_key(query.report_key.as_deref())?;

    require_report_access(state.store.as_ref(), &user.username, &key)?;

    let levels = state
        .store
        .get_milestones(&key)
        .api_err("Failed to load milestones")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(levels)))
}

pub async fn update_milestones(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    body: Result<Json<UpdateMilestonesRequest>, JsonRejection>,
) -> impl IntoResponse {
    let req = parse_body(body)?;
    let key = require_report_key(req.report_key.as_deref())?;

    let levels = match (req.track_id.as_deref(), req.milestone, req.milestone_by_track) {
        (Some(track_id), Some(milestone), _) => {
            let track_id = require_field(Some(track_id), "track_id cannot be empty")?;
            MilestoneMap::from([(track_id.to_string(), milestone)])
        }
        (_, _, Some(levels)) => levels,
        _ => {
            return Err(ApiError::bad_request(
                "Provide (track_id and milestone) or milestone_by_track",
            ));
        }
    };

    require_report_access(state.store.as_ref(), &user.username, &key)?;

    state
        .store
        .set_milestones(&key, &levels, &user.username)
        .api_err("Failed to update milestones")?;

    let updated = state
        .store
        .get_milestones(&key)
        .api_err("Failed to load milestones")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(updated)))
}
