/// Policy knobs for who may manage report access.
///
/// Reading and writing a report's resources always follows
/// [`is_allowed`](super::is_allowed). Granting and revoking access is
/// stricter: by default only the owner may do it. Setting
/// `admins_manage_access` extends that right to admins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    pub admins_manage_access: bool,
}

impl AccessPolicy {
    #[must_use]
    pub const fn owner_only() -> Self {
        Self {
            admins_manage_access: false,
        }
    }

    #[must_use]
    pub const fn with_admin_management() -> Self {
        Self {
            admins_manage_access: true,
        }
    }
}
