mod helpers;
mod middleware;

pub use helpers::extract_username;
pub use middleware::{AuthError, RequireAdmin, RequireUser};
