//! Typed event payloads.
//!
//! The journal stores payloads as opaque JSON; this module is the tagged
//! union keyed by the event-type string, decoded at the point of use (the
//! projection applier and the fork engine's copy filter). Unrecognized
//! types pass through as `Unknown`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::campaign::{CampaignStatus, GmMode};
use crate::error::DomainError;

/// Event type identifier for [`CampaignCreated`].
pub const CAMPAIGN_CREATED: &str = "campaign.created";
/// Event type identifier for [`CampaignForked`].
pub const CAMPAIGN_FORKED: &str = "campaign.forked";
/// Event type identifier for [`CampaignStatusChanged`].
pub const CAMPAIGN_STATUS_CHANGED: &str = "campaign.status_changed";
/// Event type identifier for [`CampaignUpdated`].
pub const CAMPAIGN_UPDATED: &str = "campaign.updated";
/// Event type identifier for [`ParticipantJoined`].
pub const PARTICIPANT_JOINED: &str = "participant.joined";
/// Event type identifier for [`ParticipantUpdated`].
pub const PARTICIPANT_UPDATED: &str = "participant.updated";
/// Event type identifier for [`ParticipantLeft`].
pub const PARTICIPANT_LEFT: &str = "participant.left";
/// Event type identifier for [`CharacterCreated`].
pub const CHARACTER_CREATED: &str = "character.created";
/// Event type identifier for [`CharacterProfileUpdated`].
pub const CHARACTER_PROFILE_UPDATED: &str = "character.profile_updated";
/// Event type identifier for [`CharacterStateChanged`].
pub const CHARACTER_STATE_CHANGED: &str = "character.state_changed";
/// Event type identifier for [`ControllerAssigned`].
pub const CHARACTER_CONTROLLER_ASSIGNED: &str = "character.controller_assigned";
/// Event type identifier for [`SessionStarted`].
pub const SESSION_STARTED: &str = "session.started";
/// Event type identifier for [`SessionEnded`].
pub const SESSION_ENDED: &str = "session.ended";
/// Event type identifier for [`GmFearChanged`].
pub const GM_FEAR_CHANGED: &str = "chronicle.gm_fear_changed";

/// Who controls a character by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Controller {
    /// The game master controls the character.
    Gm,
    /// A specific participant controls the character.
    Participant {
        /// The controlling participant.
        participant_id: Uuid,
    },
    /// No default controller.
    Unassigned,
}

/// A campaign came into existence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignCreated {
    /// Display name.
    pub name: String,
    /// The game system the campaign is played under.
    pub game_system: String,
    /// How the game master is run.
    pub gm_mode: GmMode,
    /// Free-form theme text.
    #[serde(default)]
    pub theme: Option<String>,
}

/// A campaign was branched from another campaign's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignForked {
    /// The immediate parent campaign.
    pub parent_campaign_id: Uuid,
    /// The parent's event sequence at which history branched.
    pub fork_event_seq: i64,
    /// The root campaign of the whole lineage chain.
    pub origin_campaign_id: Uuid,
    /// The new campaign's name.
    pub name: String,
}

/// A campaign moved through its status state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignStatusChanged {
    /// Status before the transition.
    pub from: CampaignStatus,
    /// Status after the transition.
    pub to: CampaignStatus,
}

/// A campaign's name or theme changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignUpdated {
    /// New name, when present.
    #[serde(default)]
    pub name: Option<String>,
    /// New theme, when present.
    #[serde(default)]
    pub theme: Option<String>,
}

/// A participant joined the campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantJoined {
    /// The participant identifier.
    pub participant_id: Uuid,
    /// Display name at join time.
    pub display_name: String,
}

/// A participant's record changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantUpdated {
    /// The participant identifier.
    pub participant_id: Uuid,
    /// New display name, when present.
    #[serde(default)]
    pub display_name: Option<String>,
}

/// A participant left the campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantLeft {
    /// The participant identifier.
    pub participant_id: Uuid,
}

/// A character was created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterCreated {
    /// The character identifier.
    pub character_id: Uuid,
    /// The character's name.
    pub name: String,
    /// The participant who owns the character, if any.
    #[serde(default)]
    pub participant_id: Option<Uuid>,
}

/// A character's profile changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterProfileUpdated {
    /// The character identifier.
    pub character_id: Uuid,
    /// New name, when present.
    #[serde(default)]
    pub name: Option<String>,
    /// Opaque game-system profile fields, when present.
    #[serde(default)]
    pub profile: Option<Value>,
}

/// A character's cross-session continuity state changed.
///
/// Absent fields leave the corresponding snapshot value untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterStateChanged {
    /// The character identifier.
    pub character_id: Uuid,
    /// New hit points, when present.
    #[serde(default)]
    pub hit_points: Option<i32>,
    /// New stress, when present.
    #[serde(default)]
    pub stress: Option<i32>,
    /// New hope, when present.
    #[serde(default)]
    pub hope: Option<i32>,
}

/// A character's default controller was assigned or cleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerAssigned {
    /// The character identifier.
    pub character_id: Uuid,
    /// The new default controller.
    pub controller: Controller,
}

/// A session started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStarted {
    /// The session identifier.
    pub session_id: Uuid,
    /// Optional session title.
    #[serde(default)]
    pub title: Option<String>,
}

/// A session ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEnded {
    /// The session identifier.
    pub session_id: Uuid,
}

/// The game master's fear pool changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GmFearChanged {
    /// The new fear value.
    pub fear: i32,
}

/// Tagged union over all known payloads, keyed by event type.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// `campaign.created`
    CampaignCreated(CampaignCreated),
    /// `campaign.forked`
    CampaignForked(CampaignForked),
    /// `campaign.status_changed`
    CampaignStatusChanged(CampaignStatusChanged),
    /// `campaign.updated`
    CampaignUpdated(CampaignUpdated),
    /// `participant.joined`
    ParticipantJoined(ParticipantJoined),
    /// `participant.updated`
    ParticipantUpdated(ParticipantUpdated),
    /// `participant.left`
    ParticipantLeft(ParticipantLeft),
    /// `character.created`
    CharacterCreated(CharacterCreated),
    /// `character.profile_updated`
    CharacterProfileUpdated(CharacterProfileUpdated),
    /// `character.state_changed`
    CharacterStateChanged(CharacterStateChanged),
    /// `character.controller_assigned`
    ControllerAssigned(ControllerAssigned),
    /// `session.started`
    SessionStarted(SessionStarted),
    /// `session.ended`
    SessionEnded(SessionEnded),
    /// `chronicle.gm_fear_changed`
    GmFearChanged(GmFearChanged),
    /// Any other event type; the payload passes through untouched.
    Unknown(Value),
}

fn of<T: DeserializeOwned>(payload: &Value) -> Result<T, DomainError> {
    serde_json::from_value(payload.clone())
        .map_err(|e| DomainError::Infrastructure(format!("event payload decode failed: {e}")))
}

impl EventPayload {
    /// Decodes a stored payload according to its event type.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` when a known type's payload does
    /// not match its schema. Unknown types never fail.
    pub fn decode(event_type: &str, payload: &Value) -> Result<Self, DomainError> {
        Ok(match event_type {
            CAMPAIGN_CREATED => Self::CampaignCreated(of(payload)?),
            CAMPAIGN_FORKED => Self::CampaignForked(of(payload)?),
            CAMPAIGN_STATUS_CHANGED => Self::CampaignStatusChanged(of(payload)?),
            CAMPAIGN_UPDATED => Self::CampaignUpdated(of(payload)?),
            PARTICIPANT_JOINED => Self::ParticipantJoined(of(payload)?),
            PARTICIPANT_UPDATED => Self::ParticipantUpdated(of(payload)?),
            PARTICIPANT_LEFT => Self::ParticipantLeft(of(payload)?),
            CHARACTER_CREATED => Self::CharacterCreated(of(payload)?),
            CHARACTER_PROFILE_UPDATED => Self::CharacterProfileUpdated(of(payload)?),
            CHARACTER_STATE_CHANGED => Self::CharacterStateChanged(of(payload)?),
            CHARACTER_CONTROLLER_ASSIGNED => Self::ControllerAssigned(of(payload)?),
            SESSION_STARTED => Self::SessionStarted(of(payload)?),
            SESSION_ENDED => Self::SessionEnded(of(payload)?),
            GM_FEAR_CHANGED => Self::GmFearChanged(of(payload)?),
            _ => Self::Unknown(payload.clone()),
        })
    }

    /// Serializes this payload back to its stored JSON form.
    #[must_use]
    pub fn encode(&self) -> Value {
        let value = match self {
            Self::CampaignCreated(p) => serde_json::to_value(p),
            Self::CampaignForked(p) => serde_json::to_value(p),
            Self::CampaignStatusChanged(p) => serde_json::to_value(p),
            Self::CampaignUpdated(p) => serde_json::to_value(p),
            Self::ParticipantJoined(p) => serde_json::to_value(p),
            Self::ParticipantUpdated(p) => serde_json::to_value(p),
            Self::ParticipantLeft(p) => serde_json::to_value(p),
            Self::CharacterCreated(p) => serde_json::to_value(p),
            Self::CharacterProfileUpdated(p) => serde_json::to_value(p),
            Self::CharacterStateChanged(p) => serde_json::to_value(p),
            Self::ControllerAssigned(p) => serde_json::to_value(p),
            Self::SessionStarted(p) => serde_json::to_value(p),
            Self::SessionEnded(p) => serde_json::to_value(p),
            Self::GmFearChanged(p) => serde_json::to_value(p),
            Self::Unknown(v) => return v.clone(),
        };
        value.expect("payload serialization is infallible")
    }
}
