mod archived;
mod comments;
mod milestones;
mod report_access;
mod reports;

use std::sync::Arc;

use axum::{Router, routing::get};

use crate::server::AppState;

pub fn user_router() -> Router<Arc<AppState>> {
    Router::new()
        // Report resources, guarded per report key
        .route(
            "/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/milestones",
            get(milestones::get_milestones).post(milestones::update_milestones),
        )
        .route(
            "/archived",
            get(archived::get_archived).post(archived::update_archived),
        )
        // Access management
        .route(
            "/report-access",
            get(report_access::list_report_access)
                .post(report_access::grant_report_access)
                .delete(report_access::revoke_report_access),
        )
        .route("/report-keys", get(reports::list_report_keys))
        .route("/report-users", get(reports::list_report_users))
        .route("/me", get(reports::me))
}
