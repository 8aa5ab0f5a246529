//! Server settings loaded via OrthoConfig, and the server configuration
//! object built from them.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use actix_web::cookie::{Key, SameSite};
use helpdesk::domain::StorageDeadline;
use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SESSION_KEY_FILE: &str = "/var/run/secrets/session_key";
const DEFAULT_STORAGE_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_POOL_MAX_SIZE: u32 = 10;

/// Settings read from CLI flags, `HELPDESK_*` environment variables and
/// configuration files.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "HELPDESK")]
pub struct ServerSettings {
    /// Listen address, `host:port`.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL. Without it the server keeps data in memory.
    pub database_url: Option<String>,
    /// File holding the session cookie key material.
    pub session_key_file: Option<PathBuf>,
    /// Allow a generated session key outside debug builds.
    #[ortho_config(default = false)]
    pub session_allow_ephemeral: bool,
    /// `Secure` flag on the session cookie. Defaults to on.
    pub cookie_secure: Option<bool>,
    /// Bound on every storage call, in milliseconds.
    pub storage_timeout_ms: Option<u64>,
    pub pool_max_size: Option<u32>,
    /// Admin account created at startup when no user has this email.
    pub bootstrap_admin_email: Option<String>,
    pub bootstrap_admin_password: Option<String>,
}

impl std::fmt::Debug for ServerSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerSettings")
            .field("bind_addr", &self.bind_addr)
            .field("database_url", &self.database_url.as_ref().map(|_| ".."))
            .field("session_key_file", &self.session_key_file)
            .field("session_allow_ephemeral", &self.session_allow_ephemeral)
            .field("cookie_secure", &self.cookie_secure)
            .field("storage_timeout_ms", &self.storage_timeout_ms)
            .field("pool_max_size", &self.pool_max_size)
            .field("bootstrap_admin_email", &self.bootstrap_admin_email)
            .finish_non_exhaustive()
    }
}

/// Raised when a setting cannot be interpreted.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("bind address {value:?} is not a valid socket address")]
    BindAddr { value: String },
    #[error("bootstrap admin needs both email and password")]
    PartialBootstrapAdmin,
}

impl ServerSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|_| SettingsError::BindAddr {
            value: raw.to_owned(),
        })
    }

    pub fn session_key_file(&self) -> PathBuf {
        self.session_key_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_KEY_FILE))
    }

    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure.unwrap_or(true)
    }

    pub fn storage_deadline(&self) -> StorageDeadline {
        StorageDeadline::new(Duration::from_millis(
            self.storage_timeout_ms
                .unwrap_or(DEFAULT_STORAGE_TIMEOUT_MS)
                .max(1),
        ))
    }

    pub fn pool_max_size(&self) -> u32 {
        self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE)
    }

    /// Email and password for the bootstrap admin, when both are set.
    pub fn bootstrap_admin(&self) -> Result<Option<(&str, &str)>, SettingsError> {
        match (
            self.bootstrap_admin_email.as_deref(),
            self.bootstrap_admin_password.as_deref(),
        ) {
            (Some(email), Some(password)) => Ok(Some((email, password))),
            (None, None) => Ok(None),
            _ => Err(SettingsError::PartialBootstrapAdmin),
        }
    }
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
}

impl ServerConfig {
    #[must_use]
    pub fn new(key: Key, cookie_secure: bool, same_site: SameSite, bind_addr: SocketAddr) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
        }
    }
}
