mod admins;
mod users;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get},
};

use crate::server::AppState;

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        // Admin role routes
        .route("/admins", get(admins::list_admins).post(admins::add_admin))
        .route("/admins/{username}", delete(admins::revoke_admin))
        // User routes
        .route("/users", get(users::list_users).post(users::create_user))
}
