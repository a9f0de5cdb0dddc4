// Wire types for the Home Assistant REST API.
//
// Everything is optional on the wire: upstream entities routinely omit
// attributes, and the filtering/defaulting rules live in hapresence-core.

use serde::Deserialize;

/// Response body of `GET /api/` — the liveness endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiStatus {
    #[serde(default)]
    pub message: Option<String>,
}

/// One entry of the `GET /api/states` response.
///
/// Order of the upstream array is preserved by the caller; fields that
/// the upstream omits stay `None` here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityState {
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub last_changed: Option<String>,
    #[serde(default)]
    pub attributes: EntityAttributes,
}

/// The subset of `attributes` this crate cares about.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityAttributes {
    #[serde(default)]
    pub friendly_name: Option<String>,
}
