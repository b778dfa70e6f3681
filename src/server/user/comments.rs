use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::{CommentsQuery, CreateCommentRequest};
use crate::server::guard::require_report_access;
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::{
    parse_body, parse_optional_int, require_field, validate_comment_text, validate_track_id,
};
use crate::types::{Comment, ReportKey};

const LIST_REQUIRED: &str = "report_key, track_id, and milestone are required";
const CREATE_REQUIRED: &str = "report_key, track_id, milestone, and text are required";

pub async fn list_comments(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<CommentsQuery>,
) -> impl IntoResponse {
    let key = ReportKey::from_optional(query.report_key.as_deref())
        .ok_or_else(|| ApiError::bad_request(LIST_REQUIRED))?;
    let track_id = require_field(query.track_id.as_deref(), LIST_REQUIRED)?;
    let milestone = parse_optional_int(query.milestone.as_deref(), LIST_REQUIRED)?
        .ok_or_else(|| ApiError::bad_request(LIST_REQUIRED))?;
    let signal_index = parse_optional_int(
        query.signal_index.as_deref(),
        "signal_index must be an integer",
    )?;

    require_report_access(state.store.as_ref(), &user.username, &key)?;

    let comments = state
        .store
        .list_comments(&key, track_id, milestone, signal_index)
        .api_err("Failed to load comments")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(comments)))
}

pub async fn create_comment(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> impl IntoResponse {
    let req = parse_body(body)?;

    let key = ReportKey::from_optional(req.report_key.as_deref())
        .ok_or_else(|| ApiError::bad_request(CREATE_REQUIRED))?;
    let track_id = validate_track_id(req.track_id.as_deref(), CREATE_REQUIRED)?;
    let milestone = req
        .milestone
        .ok_or_else(|| ApiError::bad_request(CREATE_REQUIRED))?;
    let text = validate_comment_text(req.text.as_deref(), CREATE_REQUIRED)?;

    require_report_access(state.store.as_ref(), &user.username, &key)?;

    let comment = Comment {
        id: Uuid::new_v4().to_string(),
        report_key: key,
        track_id,
        milestone,
        signal_index: req.signal_index,
        author: user.username,
        text,
        parent_id: req.parent_id.filter(|p| !p.trim().is_empty()),
        created_at: Utc::now(),
    };

    state
        .store
        .add_comment(&comment)
        .api_err("Failed to add comment")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(comment))))
}
