// hapresence-core: Presence fetching, caching, and settings logic
// between hapresence-api and consumers (CLI, embedding hosts).

pub mod config;
pub mod error;
pub mod model;
pub mod service;
pub mod settings;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ConfigStore, MemoryConfig, keys};
pub use error::{PresenceError, SettingsError};
pub use model::PresenceRecord;
pub use service::{PresenceService, Probe, ProbeOverrides, sanitize_url};
pub use settings::{Role, Settings, SettingsUpdate};
