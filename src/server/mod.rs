mod admin;
pub mod dto;
pub mod guard;
pub mod response;
mod router;
mod user;
pub mod validation;

pub use admin::admin_router;
pub use router::{AppState, create_router};
pub use user::user_router;
