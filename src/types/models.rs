use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ReportKey;

/// The role string that grants access to every report.
pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    /// Normalized form of `username`; the key of the user's own report.
    pub report_key: ReportKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessGrant {
    pub report_key: ReportKey,
    pub username: String,
    pub granted_at: DateTime<Utc>,
}

/// Outcome of a revoke, kept so callers can log or audit the removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Revocation {
    pub report_key: ReportKey,
    pub username: String,
    pub removed: bool,
    pub revoked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub report_key: ReportKey,
    pub track_id: String,
    pub milestone: i64,
    /// Zero-based signal index within the milestone; None for milestone-level comments.
    pub signal_index: Option<i64>,
    pub author: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Track id to milestone level.
pub type MilestoneMap = BTreeMap<String, i64>;

/// Track id to (milestone to archived flag).
pub type ArchivedMap = BTreeMap<String, BTreeMap<String, bool>>;
