// ── Settings read/write path ──
//
// The write path is authorization-gated: letting any caller rewrite a
// shared integration's credentials is a security defect, so saves
// demand `Role::Admin` regardless of what the hosting surface enforces.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{ConfigStore, get_or_default, keys};
use crate::error::SettingsError;

/// Who is asking. The settings write path only accepts administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
}

/// The effective settings, with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub url: String,
    pub token: String,
    pub polling_interval: u64,
    pub connection_timeout: u64,
    pub verify_ssl: bool,
    pub allow_local: bool,
}

impl Settings {
    /// Read every setting from the store, applying documented defaults.
    pub fn read(store: &dyn ConfigStore) -> Self {
        Self {
            url: store.get(keys::HA_URL).unwrap_or_default(),
            token: store.get(keys::HA_TOKEN).unwrap_or_default(),
            polling_interval: parse_or_default(store, keys::HA_POLLING_INTERVAL),
            connection_timeout: parse_or_default(store, keys::HA_CONNECTION_TIMEOUT),
            verify_ssl: get_or_default(store, keys::HA_VERIFY_SSL) == "1",
            allow_local: get_or_default(store, keys::HA_ALLOW_LOCAL) == "1",
        }
    }
}

fn parse_or_default(store: &dyn ConfigStore, key: &str) -> u64 {
    get_or_default(store, key)
        .parse()
        .unwrap_or_else(|_| crate::config::default_for(key).parse().unwrap_or(0))
}

/// A settings write request. Values are normalized before persisting:
/// the polling interval is floored at 10 seconds and the connection
/// timeout clamped to [5, 60].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub url: String,
    pub token: String,
    pub polling_interval: u64,
    pub connection_timeout: u64,
    pub verify_ssl: bool,
    pub allow_local: bool,
}

/// Minimum polling interval / cache TTL in seconds.
pub const MIN_POLLING_INTERVAL: u64 = 10;
/// Connection timeout bounds in seconds.
pub const TIMEOUT_BOUNDS: (u64, u64) = (5, 60);

/// Persist a settings update. Fails with [`SettingsError::Forbidden`]
/// for non-admin callers without writing anything.
pub fn save(
    store: &dyn ConfigStore,
    role: Role,
    update: &SettingsUpdate,
) -> Result<(), SettingsError> {
    if role != Role::Admin {
        return Err(SettingsError::Forbidden);
    }

    let polling = update.polling_interval.max(MIN_POLLING_INTERVAL);
    let timeout = update
        .connection_timeout
        .clamp(TIMEOUT_BOUNDS.0, TIMEOUT_BOUNDS.1);

    store.set(keys::HA_URL, &update.url);
    store.set(keys::HA_TOKEN, &update.token);
    store.set(keys::HA_POLLING_INTERVAL, &polling.to_string());
    store.set(keys::HA_CONNECTION_TIMEOUT, &timeout.to_string());
    store.set(keys::HA_VERIFY_SSL, if update.verify_ssl { "1" } else { "0" });
    store.set(keys::HA_ALLOW_LOCAL, if update.allow_local { "1" } else { "0" });

    info!(
        polling_interval = polling,
        connection_timeout = timeout,
        verify_ssl = update.verify_ssl,
        "Home Assistant settings saved"
    );
    Ok(())
}

/// Validate and persist a single key (the CLI's `config set` path).
pub fn save_key(
    store: &dyn ConfigStore,
    role: Role,
    key: &str,
    value: &str,
) -> Result<String, SettingsError> {
    if role != Role::Admin {
        return Err(SettingsError::Forbidden);
    }

    let normalized = match key {
        keys::HA_URL | keys::HA_TOKEN => value.to_owned(),
        keys::HA_POLLING_INTERVAL => numeric(key, value)?.max(MIN_POLLING_INTERVAL).to_string(),
        keys::HA_CONNECTION_TIMEOUT => numeric(key, value)?
            .clamp(TIMEOUT_BOUNDS.0, TIMEOUT_BOUNDS.1)
            .to_string(),
        keys::HA_VERIFY_SSL | keys::HA_ALLOW_LOCAL => boolean(key, value)?,
        other => {
            return Err(SettingsError::Validation {
                field: other.to_owned(),
                reason: "unknown configuration key".to_owned(),
            });
        }
    };

    store.set(key, &normalized);
    Ok(normalized)
}

fn numeric(key: &str, value: &str) -> Result<u64, SettingsError> {
    value.parse().map_err(|_| SettingsError::Validation {
        field: key.to_owned(),
        reason: format!("expected a number of seconds, got '{value}'"),
    })
}

fn boolean(key: &str, value: &str) -> Result<String, SettingsError> {
    match value {
        "1" | "true" | "yes" | "on" => Ok("1".to_owned()),
        "0" | "false" | "no" | "off" => Ok("0".to_owned()),
        _ => Err(SettingsError::Validation {
            field: key.to_owned(),
            reason: format!("expected a boolean, got '{value}'"),
        }),
    }
}
