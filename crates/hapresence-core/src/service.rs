// ── Presence service ──
//
// Owns the single-entry TTL cache, the remote fetch, the person
// filter, and the connectivity prober. Connection parameters are
// resolved from the ConfigStore at call time, so configuration edits
// take effect without rebuilding the service.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use secrecy::SecretString;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use hapresence_api::{HaClient, TransportConfig};

use crate::config::{ConfigStore, get_or_default, keys};
use crate::error::PresenceError;
use crate::model::PresenceRecord;

/// One memoized outcome of the presence fetch. Only successes are
/// cached; a failed fetch leaves the previous entry untouched so the
/// next call retries.
struct CacheEntry {
    captured_at: Instant,
    records: Vec<PresenceRecord>,
}

/// Outcome of the connectivity probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Probe {
    pub success: bool,
    pub message: String,
}

/// Per-call overrides for [`PresenceService::test_connection`].
///
/// `None` or empty/zero values fall back to the stored configuration.
#[derive(Debug, Clone, Default)]
pub struct ProbeOverrides {
    pub url: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: Option<u64>,
    pub verify_ssl: Option<bool>,
}

/// The effective connection tuple for one operation.
struct ConnectionSettings {
    url: String,
    token: SecretString,
    timeout: Duration,
    verify_ssl: bool,
    allow_local: bool,
}

impl ConnectionSettings {
    /// Resolve overrides against the stored configuration: explicit
    /// non-empty/non-zero values win, everything else falls back.
    fn resolve(store: &dyn ConfigStore, overrides: &ProbeOverrides) -> Self {
        let url = overrides
            .url
            .clone()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| store.get(keys::HA_URL).unwrap_or_default());

        let token = overrides
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| store.get(keys::HA_TOKEN).unwrap_or_default());

        let timeout_secs = overrides
            .timeout_secs
            .filter(|t| *t > 0)
            .unwrap_or_else(|| parse_secs(store, keys::HA_CONNECTION_TIMEOUT));

        let verify_ssl = overrides
            .verify_ssl
            .unwrap_or_else(|| get_or_default(store, keys::HA_VERIFY_SSL) == "1");

        Self {
            url,
            token: SecretString::from(token),
            timeout: Duration::from_secs(timeout_secs),
            verify_ssl,
            allow_local: get_or_default(store, keys::HA_ALLOW_LOCAL) == "1",
        }
    }

    fn is_configured(&self) -> bool {
        use secrecy::ExposeSecret;
        !self.url.is_empty() && !self.token.expose_secret().is_empty()
    }

    fn transport(&self) -> TransportConfig {
        TransportConfig {
            timeout: self.timeout,
            verify_ssl: self.verify_ssl,
            allow_local: self.allow_local,
        }
    }
}

fn parse_secs(store: &dyn ConfigStore, key: &str) -> u64 {
    let raw = get_or_default(store, key);
    raw.parse().unwrap_or_else(|_| {
        warn!(key, value = %raw, "non-numeric config value, using default");
        crate::config::default_for(key).parse().unwrap_or(0)
    })
}

/// Sanitize a URL for logging: scheme + host + port only, no path,
/// query, or credentials. Unparseable input becomes `"invalid-url"`.
pub fn sanitize_url(raw: &str) -> String {
    let Ok(url) = Url::parse(raw) else {
        return "invalid-url".to_owned();
    };
    let Some(host) = url.host_str() else {
        return "invalid-url".to_owned();
    };

    match url.port() {
        Some(port) => format!("{}://{host}:{port}", url.scheme()),
        None => format!("{}://{host}", url.scheme()),
    }
}

/// Fetches person presence from Home Assistant, with a single-entry
/// in-process cache keyed by the one query this service ever runs.
///
/// The cache lives exactly as long as the service instance; there is no
/// persistence, no eviction task, and no cross-process coherency.
/// Concurrent misses may both fetch — last write wins.
pub struct PresenceService {
    config: Arc<dyn ConfigStore>,
    cache: Mutex<Option<CacheEntry>>,
}

impl PresenceService {
    pub fn new(config: Arc<dyn ConfigStore>) -> Self {
        Self {
            config,
            cache: Mutex::new(None),
        }
    }

    /// Cache TTL in seconds, read fresh from configuration per call.
    fn cache_ttl(&self) -> Duration {
        Duration::from_secs(parse_secs(self.config.as_ref(), keys::HA_POLLING_INTERVAL))
    }

    fn cached_records(&self, ttl: Duration) -> Option<Vec<PresenceRecord>> {
        let cache = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let entry = cache.as_ref()?;
        let age = entry.captured_at.elapsed();
        if age < ttl {
            debug!(age_secs = age.as_secs(), ttl_secs = ttl.as_secs(), "returning cached presence data");
            Some(entry.records.clone())
        } else {
            None
        }
    }

    fn store_cache(&self, records: Vec<PresenceRecord>) {
        *self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(CacheEntry {
            captured_at: Instant::now(),
            records,
        });
    }

    /// Fetch all person presence entities.
    ///
    /// Serves from the cache while the entry is younger than the
    /// configured TTL; otherwise issues `GET /api/states`, keeps only
    /// `person.*` entities (in upstream order), refreshes the cache,
    /// and returns the records.
    pub async fn person_presence(&self) -> Result<Vec<PresenceRecord>, PresenceError> {
        let settings = ConnectionSettings::resolve(self.config.as_ref(), &ProbeOverrides::default());

        if !settings.is_configured() {
            warn!("Home Assistant is not configured");
            return Err(PresenceError::NotConfigured);
        }

        let ttl = self.cache_ttl();
        if let Some(records) = self.cached_records(ttl) {
            return Ok(records);
        }

        let sanitized = sanitize_url(&settings.url);
        debug!(
            url = %sanitized,
            timeout_secs = settings.timeout.as_secs(),
            verify_ssl = settings.verify_ssl,
            "cache miss, fetching fresh presence data"
        );

        let states = self.fetch_states(&settings).await.map_err(|err| {
            warn!(url = %sanitized, error = %err, "presence fetch failed");
            PresenceError::from(err)
        })?;

        let records: Vec<PresenceRecord> =
            states.iter().filter_map(PresenceRecord::from_state).collect();

        info!(person_count = records.len(), "fetched presence data");
        self.store_cache(records.clone());

        Ok(records)
    }

    async fn fetch_states(
        &self,
        settings: &ConnectionSettings,
    ) -> Result<Vec<hapresence_api::EntityState>, hapresence_api::Error> {
        let client = HaClient::new(&settings.url, &settings.token, &settings.transport())?;
        client.states().await
    }

    /// Live connectivity probe against `GET /api/`.
    ///
    /// Never reads or writes the presence cache. Every failure mode
    /// collapses into a `{success: false, message}` outcome; the
    /// message never carries transport error text.
    pub async fn test_connection(&self, overrides: ProbeOverrides) -> Probe {
        info!(
            url_provided = overrides.url.as_deref().is_some_and(|u| !u.is_empty()),
            token_provided = overrides.token.as_deref().is_some_and(|t| !t.is_empty()),
            "testing Home Assistant connection"
        );

        let settings = ConnectionSettings::resolve(self.config.as_ref(), &overrides);

        if !settings.is_configured() {
            warn!("Home Assistant URL or token is empty");
            return Probe {
                success: false,
                message: "Home Assistant URL and token must be configured".to_owned(),
            };
        }

        let sanitized = sanitize_url(&settings.url);
        debug!(url = %sanitized, timeout_secs = settings.timeout.as_secs(), "initiating connection test");

        let outcome = async {
            let client = HaClient::new(&settings.url, &settings.token, &settings.transport())?;
            client.ping().await
        }
        .await;

        match outcome {
            Ok(_) => {
                info!(url = %sanitized, "connection test successful");
                Probe {
                    success: true,
                    message: "Successfully connected to Home Assistant".to_owned(),
                }
            }
            Err(err) => {
                warn!(url = %sanitized, error = %err, "connection test failed");
                Probe {
                    success: false,
                    message: probe_failure_message(&PresenceError::from(err)),
                }
            }
        }
    }
}

/// Probe-flavored wording for each failure kind. The upstream variant
/// embeds the status code; nothing embeds transport detail.
fn probe_failure_message(err: &PresenceError) -> String {
    match err {
        PresenceError::Upstream { status } => format!("Failed to connect: HTTP {status}"),
        PresenceError::LocalDestinationBlocked => err.to_string(),
        PresenceError::NotConfigured => {
            "Home Assistant URL and token must be configured".to_owned()
        }
        PresenceError::InvalidResponse | PresenceError::ConnectionFailed => {
            "Could not connect to Home Assistant. Please verify the URL is correct \
             and the server is running and accessible."
                .to_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryConfig;
    use secrecy::ExposeSecret;

    #[test]
    fn sanitize_url_keeps_scheme_host_port_only() {
        assert_eq!(
            sanitize_url("http://ha.example:8123/api/states?token=x"),
            "http://ha.example:8123"
        );
        assert_eq!(
            sanitize_url("https://user:pw@ha.example/path"),
            "https://ha.example"
        );
        assert_eq!(sanitize_url("not a url"), "invalid-url");
        assert_eq!(sanitize_url(""), "invalid-url");
        assert_eq!(sanitize_url("unix:/tmp/sock"), "invalid-url");
    }

    #[test]
    fn overrides_win_over_stored_values() {
        let store = MemoryConfig::from_pairs([
            (keys::HA_URL, "http://stored.example:8123"),
            (keys::HA_TOKEN, "stored-token"),
            (keys::HA_CONNECTION_TIMEOUT, "20"),
        ]);

        let resolved = ConnectionSettings::resolve(
            &store,
            &ProbeOverrides {
                url: Some("http://override.example:8123".into()),
                token: None,
                timeout_secs: Some(5),
                verify_ssl: Some(false),
            },
        );

        assert_eq!(resolved.url, "http://override.example:8123");
        assert_eq!(resolved.token.expose_secret(), "stored-token");
        assert_eq!(resolved.timeout, Duration::from_secs(5));
        assert!(!resolved.verify_ssl);
    }

    #[test]
    fn empty_and_zero_overrides_fall_back() {
        let store = MemoryConfig::from_pairs([
            (keys::HA_URL, "http://stored.example:8123"),
            (keys::HA_TOKEN, "stored-token"),
        ]);

        let resolved = ConnectionSettings::resolve(
            &store,
            &ProbeOverrides {
                url: Some(String::new()),
                token: Some(String::new()),
                timeout_secs: Some(0),
                verify_ssl: None,
            },
        );

        assert_eq!(resolved.url, "http://stored.example:8123");
        assert_eq!(resolved.token.expose_secret(), "stored-token");
        assert_eq!(resolved.timeout, Duration::from_secs(10));
        assert!(resolved.verify_ssl);
    }

    #[test]
    fn malformed_interval_falls_back_to_default() {
        let store = MemoryConfig::from_pairs([(keys::HA_POLLING_INTERVAL, "soon")]);
        assert_eq!(parse_secs(&store, keys::HA_POLLING_INTERVAL), 30);
    }
}
