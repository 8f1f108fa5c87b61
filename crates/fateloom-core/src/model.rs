//! Read models other than the campaign aggregate.
//!
//! All of these are projections: they are written only by the applier (or
//! seeded by the fork engine) and rebuilt from the journal on replay.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A player at the table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// Participant identifier.
    pub id: Uuid,
    /// The campaign this participant belongs to.
    pub campaign_id: Uuid,
    /// Display name.
    pub display_name: String,
    /// When the participant joined.
    pub joined_at: DateTime<Utc>,
    /// Last record mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A player or GM character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    /// Character identifier.
    pub id: Uuid,
    /// The campaign this character belongs to.
    pub campaign_id: Uuid,
    /// The character's name.
    pub name: String,
    /// The participant who owns the character, if any.
    pub participant_id: Option<Uuid>,
    /// Opaque game-system profile fields.
    pub profile: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last record mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Per-character cross-session continuity snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterState {
    /// The character this snapshot belongs to.
    pub character_id: Uuid,
    /// The owning campaign.
    pub campaign_id: Uuid,
    /// Current hit points.
    pub hit_points: i32,
    /// Current stress.
    pub stress: i32,
    /// Current hope.
    pub hope: i32,
    /// When the snapshot last changed.
    pub updated_at: DateTime<Utc>,
}

/// Campaign-level continuity snapshot for the game master.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GmState {
    /// The owning campaign.
    pub campaign_id: Uuid,
    /// The GM's current fear pool.
    pub fear: i32,
    /// When the snapshot last changed.
    pub updated_at: DateTime<Utc>,
}

/// A play session. `ended_at = None` means the session is active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier.
    pub id: Uuid,
    /// The owning campaign.
    pub campaign_id: Uuid,
    /// Optional session title.
    pub title: Option<String>,
    /// When the session started.
    pub started_at: DateTime<Utc>,
    /// When the session ended; `None` while active.
    pub ended_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Whether this session has ended.
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.ended_at.is_some()
    }
}

/// Per-campaign record of fork ancestry. Absent for non-forked campaigns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForkMeta {
    /// The forked (target) campaign.
    pub campaign_id: Uuid,
    /// The immediate parent campaign.
    pub parent_campaign_id: Uuid,
    /// The parent's event sequence at which history branched.
    pub fork_event_seq: i64,
    /// The root campaign of the whole lineage chain.
    pub origin_campaign_id: Uuid,
}

/// Resolved ancestry for a campaign, depth included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lineage {
    /// The campaign the lineage was queried for.
    pub campaign_id: Uuid,
    /// Immediate parent; `None` for a root campaign.
    pub parent_campaign_id: Option<Uuid>,
    /// Root of the chain; the campaign itself when not forked.
    pub origin_campaign_id: Uuid,
    /// Fork sequence in the parent; `None` for a root campaign.
    pub fork_event_seq: Option<i64>,
    /// Hop count from this campaign to the origin.
    pub depth: u32,
}
