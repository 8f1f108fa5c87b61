//! The journal's event record.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::DomainError;

/// Who caused an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorType {
    /// The system itself (replay, fork, maintenance).
    System,
    /// A player at the table.
    Participant,
    /// The game master.
    Gm,
}

impl ActorType {
    /// Returns the lowercase wire name of this actor type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Participant => "participant",
            Self::Gm => "gm",
        }
    }
}

impl fmt::Display for ActorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActorType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Self::System),
            "participant" => Ok(Self::Participant),
            "gm" => Ok(Self::Gm),
            other => Err(DomainError::Validation(format!(
                "unknown actor type: {other}"
            ))),
        }
    }
}

/// An immutable fact in a campaign's journal.
///
/// `sequence` and `hash` are zero-valued/empty until the journal assigns
/// them at append time; after that the record never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// The campaign whose journal owns this event.
    pub campaign_id: Uuid,
    /// Per-campaign sequence number, starting at 1. 0 = not yet assigned.
    #[serde(default)]
    pub sequence: i64,
    /// 128-bit content hash, lowercase hex. Empty = not yet assigned.
    #[serde(default)]
    pub hash: String,
    /// Namespaced type, e.g. `"character.created"`.
    pub event_type: String,
    /// Occurrence timestamp (UTC).
    pub occurred_at: DateTime<Utc>,
    /// The session this event happened in, if any.
    #[serde(default)]
    pub session_id: Option<Uuid>,
    /// Request correlation identifier.
    #[serde(default)]
    pub request_id: Option<String>,
    /// Invocation correlation identifier.
    #[serde(default)]
    pub invocation_id: Option<String>,
    /// Who caused the event.
    pub actor_type: ActorType,
    /// Actor identifier; required unless the actor is `system`.
    #[serde(default)]
    pub actor_id: Option<String>,
    /// Affected-entity type, e.g. `"campaign"` or `"character"`.
    #[serde(default)]
    pub entity_type: Option<String>,
    /// Affected-entity identifier.
    #[serde(default)]
    pub entity_id: Option<String>,
    /// Opaque JSON payload; `{}` when absent.
    #[serde(default = "empty_payload")]
    pub payload: Value,
}

fn empty_payload() -> Value {
    Value::Object(serde_json::Map::new())
}

impl Event {
    /// Creates an unassigned event with an empty payload.
    #[must_use]
    pub fn new(
        campaign_id: Uuid,
        event_type: impl Into<String>,
        occurred_at: DateTime<Utc>,
        actor_type: ActorType,
    ) -> Self {
        Self {
            campaign_id,
            sequence: 0,
            hash: String::new(),
            event_type: event_type.into(),
            occurred_at,
            session_id: None,
            request_id: None,
            invocation_id: None,
            actor_type,
            actor_id: None,
            entity_type: None,
            entity_id: None,
            payload: empty_payload(),
        }
    }

    /// The event's domain: the type prefix up to the first `.`.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.event_type
            .split_once('.')
            .map_or(self.event_type.as_str(), |(domain, _)| domain)
    }

    /// Whether the journal has assigned sequence and hash.
    #[must_use]
    pub fn is_assigned(&self) -> bool {
        self.sequence > 0 && !self.hash.is_empty()
    }
}
