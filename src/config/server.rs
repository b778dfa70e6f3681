use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::access::AccessPolicy;
use crate::error::{Error, Result};

pub const DEFAULT_IDENTITY_HEADER: &str = "x-forwarded-user";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Request header carrying the username authenticated upstream
    /// (reverse proxy or identity provider). Its value is trusted as-is.
    pub identity_header: String,
    /// When true, admins may grant and revoke access on any report, not only
    /// the owner.
    pub admins_manage_access: bool,
    /// Usernames promoted to admin every time the server starts.
    pub bootstrap_admins: Vec<String>,
}

impl ServerConfig {
    /// Reads a TOML config file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.identity_header.trim().is_empty() {
            return Err(Error::Config("identity_header cannot be empty".to_string()));
        }
        if axum::http::HeaderName::from_bytes(self.identity_header.as_bytes()).is_err() {
            return Err(Error::Config(format!(
                "identity_header '{}' is not a valid header name",
                self.identity_header
            )));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("snowline.db")
    }

    #[must_use]
    pub fn access_policy(&self) -> AccessPolicy {
        AccessPolicy {
            admins_manage_access: self.admins_manage_access,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            identity_header: DEFAULT_IDENTITY_HEADER.to_string(),
            admins_manage_access: false,
            bootstrap_admins: Vec::new(),
        }
    }
}
