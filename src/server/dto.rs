use serde::{Deserialize, Serialize};

use crate::types::{ArchivedMap, MilestoneMap, ReportKey};

// Request fields are optional so that missing identifiers reach the handler
// and come back as 400 with the API envelope, after the identity check.

#[derive(Debug, Default, Deserialize)]
pub struct ReportKeyQuery {
    #[serde(default)]
    pub report_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentsQuery {
    #[serde(default)]
    pub report_key: Option<String>,
    #[serde(default)]
    pub track_id: Option<String>,
    #[serde(default)]
    pub milestone: Option<String>,
    #[serde(default)]
    pub signal_index: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub report_key: Option<String>,
    #[serde(default)]
    pub track_id: Option<String>,
    #[serde(default)]
    pub milestone: Option<i64>,
    #[serde(default)]
    pub signal_index: Option<i64>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateMilestonesRequest {
    #[serde(default)]
    pub report_key: Option<String>,
    #[serde(default)]
    pub track_id: Option<String>,
    #[serde(default)]
    pub milestone: Option<i64>,
    #[serde(default)]
    pub milestone_by_track: Option<MilestoneMap>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateArchivedRequest {
    #[serde(default)]
    pub report_key: Option<String>,
    #[serde(default)]
    pub track_id: Option<String>,
    #[serde(default)]
    pub milestone: Option<i64>,
    /// Omitted means toggle the current flag.
    #[serde(default)]
    pub value: Option<bool>,
    #[serde(default)]
    pub archived_by_track: Option<ArchivedMap>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportAccessRequest {
    #[serde(default)]
    pub report_key: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReportAccessResponse {
    pub report_key: ReportKey,
    pub user_id: String,
    /// False when the grantee is not a known user and nothing was stored.
    pub granted: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminRequest {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub username: String,
    pub report_key: Option<ReportKey>,
    pub is_admin: bool,
}
