//! Report authorization.
//!
//! Every protected operation asks this module whether a user may touch a
//! report. A user is allowed when they are an admin, own the report (their
//! normalized username equals the report key), or hold an explicit grant.
//! There is no deny list.

mod decision;
mod policy;

pub use decision::{
    can_manage_access, grant_access, is_allowed, is_allowed_for, is_owner,
    list_accessible_report_keys, list_authorized_users, revoke_access,
};
pub use policy::AccessPolicy;
