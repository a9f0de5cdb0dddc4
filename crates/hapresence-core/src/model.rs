// ── Domain model ──

use hapresence_api::EntityState;
use serde::{Deserialize, Serialize};

/// Entity id prefix that identifies a tracked person.
pub const PERSON_PREFIX: &str = "person.";

/// One person's presence, as observed from Home Assistant.
///
/// Invariant: `entity_id` always starts with `person.` — the service
/// discards every other entity kind. Records keep the order in which
/// the upstream response listed them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceRecord {
    /// Stable identifier, `person.<slug>`.
    pub entity_id: String,
    /// Friendly name if upstream supplied one, otherwise the entity id.
    pub name: String,
    /// Free-text state; `"unknown"` when upstream omitted it.
    pub state: String,
    /// Upstream timestamp string, passed through verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_changed: Option<String>,
}

impl PresenceRecord {
    /// Build a record from a raw entity state, if it is a person.
    ///
    /// Returns `None` for entities without an id or outside the
    /// `person.` namespace.
    pub fn from_state(state: &EntityState) -> Option<Self> {
        let entity_id = state.entity_id.as_deref()?;
        if !entity_id.starts_with(PERSON_PREFIX) {
            return None;
        }

        Some(Self {
            entity_id: entity_id.to_owned(),
            name: state
                .attributes
                .friendly_name
                .clone()
                .unwrap_or_else(|| entity_id.to_owned()),
            state: state.state.clone().unwrap_or_else(|| "unknown".to_owned()),
            last_changed: state.last_changed.clone(),
        })
    }
}
