mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // User operations
    fn create_user(&self, username: &str, email: Option<&str>) -> Result<String>;
    fn get_user(&self, username: &str) -> Result<Option<User>>;
    /// Fails with `ReportKeyTaken` when the username is new but its report
    /// key already belongs to a different user.
    fn get_or_create_user(&self, username: &str, email: Option<&str>) -> Result<String>;
    fn get_report_owner(&self, key: &ReportKey) -> Result<Option<User>>;
    fn list_all_usernames(&self) -> Result<Vec<String>>;

    // Role operations
    fn has_role(&self, username: &str, role: &str) -> Result<bool>;
    fn add_role(&self, username: &str, role: &str) -> Result<String>;
    fn remove_role(&self, username: &str, role: &str) -> Result<bool>;
    fn list_role_members(&self, role: &str) -> Result<Vec<String>>;

    fn is_admin(&self, username: &str) -> Result<bool> {
        self.has_role(username, ADMIN_ROLE)
    }

    fn list_admins(&self) -> Result<Vec<String>> {
        self.list_role_members(ADMIN_ROLE)
    }

    /// Provisions the user if unknown, then grants the admin role.
    fn add_admin(&self, username: &str) -> Result<String> {
        self.add_role(username, ADMIN_ROLE)
    }

    fn revoke_admin(&self, username: &str) -> Result<bool> {
        self.remove_role(username, ADMIN_ROLE)
    }

    // Report access grant operations
    fn grant(&self, key: &ReportKey, username: &str) -> Result<bool>;
    fn revoke(&self, key: &ReportKey, username: &str) -> Result<Revocation>;
    fn has_grant(&self, key: &ReportKey, username: &str) -> Result<bool>;
    fn list_grants(&self, key: &ReportKey) -> Result<Vec<AccessGrant>>;
    fn list_grantees(&self, key: &ReportKey) -> Result<Vec<String>>;
    fn list_granted_keys_for(&self, username: &str) -> Result<Vec<ReportKey>>;

    /// Every key known to the system: user-owned keys plus keys that only
    /// survive in comment or archived rows.
    fn list_all_report_keys(&self) -> Result<Vec<ReportKey>>;

    // Comment operations
    fn add_comment(&self, comment: &Comment) -> Result<()>;
    fn list_comments(
        &self,
        key: &ReportKey,
        track_id: &str,
        milestone: i64,
        signal_index: Option<i64>,
    ) -> Result<Vec<Comment>>;

    // Milestone operations
    fn get_milestones(&self, key: &ReportKey) -> Result<MilestoneMap>;
    fn set_milestones(&self, key: &ReportKey, levels: &MilestoneMap, updated_by: &str)
    -> Result<()>;

    // Archived flag operations
    fn get_archived(&self, key: &ReportKey) -> Result<ArchivedMap>;
    fn replace_archived(&self, key: &ReportKey, flags: &ArchivedMap, archived_by: &str)
    -> Result<()>;
    fn set_archived_flag(
        &self,
        key: &ReportKey,
        track_id: &str,
        milestone: &str,
        value: bool,
        archived_by: &str,
    ) -> Result<()>;
}
