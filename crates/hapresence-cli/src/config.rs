//! CLI-owned configuration: a TOML file exposed to the core through
//! its `ConfigStore` seam, plus the token resolution chain
//! (env var → OS keyring → plaintext file value).
//!
//! Core never sees these types — it reads string keys through the trait.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use hapresence_core::{ConfigStore, keys};

use crate::error::CliError;

/// Environment variable consulted first for the access token.
pub const TOKEN_ENV: &str = "HAPRESENCE_TOKEN";

const KEYRING_SERVICE: &str = "hapresence";

// ── TOML shape ──────────────────────────────────────────────────────

/// On-disk values. Everything is a string to match the core lexicon;
/// unset keys fall back to core defaults at read time.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct StoredValues {
    pub ha_url: Option<String>,
    pub ha_token: Option<String>,
    pub ha_polling_interval: Option<String>,
    pub ha_connection_timeout: Option<String>,
    pub ha_verify_ssl: Option<String>,
    pub ha_allow_local: Option<String>,
}

impl StoredValues {
    fn get(&self, key: &str) -> Option<String> {
        match key {
            keys::HA_URL => self.ha_url.clone(),
            keys::HA_TOKEN => self.ha_token.clone(),
            keys::HA_POLLING_INTERVAL => self.ha_polling_interval.clone(),
            keys::HA_CONNECTION_TIMEOUT => self.ha_connection_timeout.clone(),
            keys::HA_VERIFY_SSL => self.ha_verify_ssl.clone(),
            keys::HA_ALLOW_LOCAL => self.ha_allow_local.clone(),
            _ => None,
        }
    }

    fn set(&mut self, key: &str, value: &str) {
        let slot = match key {
            keys::HA_URL => &mut self.ha_url,
            keys::HA_TOKEN => &mut self.ha_token,
            keys::HA_POLLING_INTERVAL => &mut self.ha_polling_interval,
            keys::HA_CONNECTION_TIMEOUT => &mut self.ha_connection_timeout,
            keys::HA_VERIFY_SSL => &mut self.ha_verify_ssl,
            keys::HA_ALLOW_LOCAL => &mut self.ha_allow_local,
            _ => return,
        };
        *slot = Some(value.to_owned());
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "hapresence", "hapresence").map_or_else(
        || {
            let mut p =
                PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("hapresence");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── File-backed store ───────────────────────────────────────────────

/// File-backed [`ConfigStore`]: TOML values overlaid with
/// `HAPRESENCE_*` environment variables, and the token chain for
/// `ha_token` reads. Writes land in memory; call
/// [`persist`](Self::persist) to flush them to disk.
pub struct FileConfig {
    path: PathBuf,
    values: Mutex<StoredValues>,
}

impl FileConfig {
    /// Load from the given path, or the platform default.
    pub fn load(path_override: Option<&Path>) -> Result<Self, CliError> {
        let path = path_override.map_or_else(config_path, Path::to_path_buf);

        let values: StoredValues = Figment::new()
            .merge(Serialized::defaults(StoredValues::default()))
            .merge(Toml::file(&path))
            .merge(Env::prefixed("HAPRESENCE_CFG_"))
            .extract()
            .map_err(|e| CliError::Config {
                message: e.to_string(),
            })?;

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the current values back to the config file.
    pub fn persist(&self) -> Result<(), CliError> {
        let values = self
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let toml_str = toml::to_string_pretty(&values).map_err(|e| CliError::Config {
            message: format!("failed to serialize config: {e}"),
        })?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CliError::Config {
                message: format!("failed to create {}: {e}", parent.display()),
            })?;
        }
        std::fs::write(&self.path, toml_str).map_err(|e| CliError::Config {
            message: format!("failed to write {}: {e}", self.path.display()),
        })
    }

    /// Resolve the access token through the credential chain:
    /// env var, then OS keyring, then the plaintext file value.
    fn resolve_token(&self) -> Option<String> {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.is_empty() {
                return Some(token);
            }
        }

        if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, keys::HA_TOKEN) {
            if let Ok(token) = entry.get_password() {
                return Some(token);
            }
        }

        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .ha_token
            .clone()
    }
}

impl ConfigStore for FileConfig {
    fn get(&self, key: &str) -> Option<String> {
        if key == keys::HA_TOKEN {
            return self.resolve_token();
        }
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set(key, value);
    }
}
