//! # Snowline
//!
//! A self-hostable server for career-growth reports, usable both as a
//! standalone binary and as a library.
//!
//! Every report is keyed by its owner's normalized username. A user may read
//! and write a report when they own it, hold an explicit grant on it, or are
//! an admin. The decision lives in [`access`]; HTTP handlers in [`server`]
//! only call into it.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! snowline = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use snowline::config::ServerConfig;
//! use snowline::server::{AppState, create_router};
//! use snowline::store::{SqliteStore, Store};
//!
//! let config = ServerConfig::default();
//! let store = SqliteStore::new(config.db_path()).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(Arc::new(store), &config).unwrap());
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `snowline` binary. Disable with `default-features = false`.

pub mod access;
pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod types;
