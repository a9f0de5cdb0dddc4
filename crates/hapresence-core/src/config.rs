// ── Configuration access ──
//
// The service reads everything through the narrow `ConfigStore` seam:
// string keys in, string values out. Hosts plug in whatever actually
// persists the values (TOML profile file, app-config table, env); tests
// use `MemoryConfig`. Core never touches disk.

use std::collections::HashMap;
use std::sync::Mutex;

/// String-typed configuration keys, with their documented defaults.
pub mod keys {
    /// Home Assistant base URL. Default: empty (not configured).
    pub const HA_URL: &str = "ha_url";
    /// Long-lived access token. Secret. Default: empty.
    pub const HA_TOKEN: &str = "ha_token";
    /// Polling interval / cache TTL in seconds. Default "30", minimum 10.
    pub const HA_POLLING_INTERVAL: &str = "ha_polling_interval";
    /// Connection timeout in seconds. Default "10", clamped to [5, 60].
    pub const HA_CONNECTION_TIMEOUT: &str = "ha_connection_timeout";
    /// Verify SSL certificates: "1" or "0". Default "1".
    pub const HA_VERIFY_SSL: &str = "ha_verify_ssl";
    /// Allow local/private destinations: "1" or "0". Default "0".
    pub const HA_ALLOW_LOCAL: &str = "ha_allow_local";
}

/// The stored default for a configuration key.
pub fn default_for(key: &str) -> &'static str {
    match key {
        keys::HA_POLLING_INTERVAL => "30",
        keys::HA_CONNECTION_TIMEOUT => "10",
        keys::HA_VERIFY_SSL => "1",
        keys::HA_ALLOW_LOCAL => "0",
        _ => "",
    }
}

/// All known configuration keys, in display order.
pub const ALL_KEYS: [&str; 6] = [
    keys::HA_URL,
    keys::HA_TOKEN,
    keys::HA_POLLING_INTERVAL,
    keys::HA_CONNECTION_TIMEOUT,
    keys::HA_VERIFY_SSL,
    keys::HA_ALLOW_LOCAL,
];

/// Narrow key-value seam between core logic and the host's config store.
///
/// `get` returns `None` for unset keys; callers apply [`default_for`].
/// Implementations must be safe to share across tasks.
pub trait ConfigStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// Read a key, falling back to its documented default.
pub fn get_or_default(store: &dyn ConfigStore, key: &str) -> String {
    store
        .get(key)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default_for(key).to_owned())
}

// ── In-memory store ─────────────────────────────────────────────────

/// `HashMap`-backed [`ConfigStore`] for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryConfig {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor from `(key, value)` pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let store = Self::new();
        for (k, v) in pairs {
            store.set(k, v);
        }
        store
    }
}

impl ConfigStore for MemoryConfig {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
    }
}
