mod server;

pub use server::{DEFAULT_IDENTITY_HEADER, ServerConfig};
