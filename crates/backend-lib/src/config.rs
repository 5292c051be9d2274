// ============================
// canary-backend-lib/src/config.rs
// ============================
//! Configuration management.
use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;


/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Prefix for environment overrides, e.g. `CANARY_SESSION__TTL_SECS`
pub const ENV_PREFIX: &str = "CANARY_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Ten years
const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,
    /// HTTP listener
    pub server: ServerSettings,
    /// Persistent store
    pub storage: StorageSettings,
    /// Session lifetime and sweeping
    pub session: SessionSettings,
    /// Password hashing cost
    pub password: PasswordSettings,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Mark the session cookie `Secure`
    pub secure_cookies: bool,
}

/// Which store backend to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

/// Store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// SQLite database file
    pub path: PathBuf,
    /// Upper bound on waiting for a locked database
    pub busy_timeout_ms: u64,
}

/// Session lifetime settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Fixed validity window from creation
    pub ttl_secs: u64,
    /// Period of the expired-session sweep
    pub sweep_interval_secs: u64,
    /// Token generation attempts before giving up on a collision
    pub max_token_attempts: u32,
}

/// scrypt cost parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordSettings {
    pub scrypt_log_n: u8,
    pub scrypt_r: u32,
    pub scrypt_p: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            server: ServerSettings::default(),
            storage: StorageSettings::default(),
            session: SessionSettings::default(),
            password: PasswordSettings::default(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            secure_cookies: false,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            path: PathBuf::from("data/canary.db"),
            busy_timeout_ms: 5_000,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_secs: 30 * 24 * 60 * 60, // 30 days
            sweep_interval_secs: 60 * 60, // 1 hour
            max_token_attempts: 3,
        }
    }
}

impl Default for PasswordSettings {
    fn default() -> Self {
        Self {
            scrypt_log_n: scrypt::Params::RECOMMENDED_LOG_N,
            scrypt_r: scrypt::Params::RECOMMENDED_R,
            scrypt_p: scrypt::Params::RECOMMENDED_P,
        }
    }
}

impl Settings {
    /// Load settings from the default file plus environment overrides
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load settings from `path` plus environment overrides.
    /// A missing file leaves the defaults in place.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            bail!("Unknown log level: {}", self.log_level);
        }
        if self.session.ttl_secs == 0 || self.session.ttl_secs > MAX_TTL_SECS {
            bail!("session.ttl_secs must be between 1 and {MAX_TTL_SECS}");
        }
        if self.session.sweep_interval_secs == 0 {
            bail!("session.sweep_interval_secs must be positive");
        }
        if self.session.max_token_attempts == 0 {
            bail!("session.max_token_attempts must be at least 1");
        }
        if self.storage.backend == StorageBackend::Sqlite && self.storage.path.as_os_str().is_empty() {
            bail!("storage.path is required for the sqlite backend");
        }
        self.password.scrypt_params()?;
        Ok(())
    }

    /// `host:port` for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl SessionSettings {
    /// Session validity window
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.ttl_secs.min(MAX_TTL_SECS) as i64)
    }

    /// Sweep period
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl PasswordSettings {
    /// Validated scrypt parameters
    pub fn scrypt_params(&self) -> Result<scrypt::Params> {
        if self.scrypt_p == 0 {
            bail!("password.scrypt_p must be at least 1");
        }
        scrypt::Params::new(
            self.scrypt_log_n,
            self.scrypt_r,
            self.scrypt_p,
            scrypt::Params::RECOMMENDED_LEN,
        )
        .map_err(|e| anyhow::anyhow!("Invalid scrypt parameters: {e}"))
    }
}
