//! Read-model store abstractions.
//!
//! One trait per projection facet. The applier is wired with whichever
//! subset a caller needs; implementations must provide atomic per-key
//! read/write but nothing stronger.

use async_trait::async_trait;
use uuid::Uuid;

use crate::campaign::Campaign;
use crate::error::DomainError;
use crate::model::{Character, CharacterState, ForkMeta, GmState, Participant, Session};
use crate::payload::Controller;

/// Campaign aggregate store.
#[async_trait]
pub trait CampaignStore: Send + Sync {
    /// Loads a campaign by id.
    async fn get(&self, id: Uuid) -> Result<Option<Campaign>, DomainError>;

    /// Inserts or replaces a campaign.
    async fn put(&self, campaign: Campaign) -> Result<(), DomainError>;
}

/// Participant store, keyed by (campaign, participant).
#[async_trait]
pub trait ParticipantStore: Send + Sync {
    /// Loads one participant.
    async fn get(
        &self,
        campaign_id: Uuid,
        participant_id: Uuid,
    ) -> Result<Option<Participant>, DomainError>;

    /// Inserts or replaces a participant.
    async fn put(&self, participant: Participant) -> Result<(), DomainError>;

    /// Removes a participant; removing an absent key is a no-op.
    async fn remove(&self, campaign_id: Uuid, participant_id: Uuid) -> Result<(), DomainError>;

    /// All participants of a campaign, in join order.
    async fn list(&self, campaign_id: Uuid) -> Result<Vec<Participant>, DomainError>;
}

/// Character store, keyed by (campaign, character).
#[async_trait]
pub trait CharacterStore: Send + Sync {
    /// Loads one character.
    async fn get(
        &self,
        campaign_id: Uuid,
        character_id: Uuid,
    ) -> Result<Option<Character>, DomainError>;

    /// Inserts or replaces a character.
    async fn put(&self, character: Character) -> Result<(), DomainError>;

    /// All characters of a campaign, in creation order.
    async fn list(&self, campaign_id: Uuid) -> Result<Vec<Character>, DomainError>;
}

/// Default-controller store, keyed by (campaign, character).
///
/// Character ids stay stable across forks, so the campaign id is part of
/// the key; a fork's controller assignments never clobber the source's.
#[async_trait]
pub trait ControlDefaultStore: Send + Sync {
    /// The character's default controller, if assigned.
    async fn get(
        &self,
        campaign_id: Uuid,
        character_id: Uuid,
    ) -> Result<Option<Controller>, DomainError>;

    /// Assigns the default controller.
    async fn put(
        &self,
        campaign_id: Uuid,
        character_id: Uuid,
        controller: Controller,
    ) -> Result<(), DomainError>;

    /// Clears the default controller; clearing an absent key is a no-op.
    async fn remove(&self, campaign_id: Uuid, character_id: Uuid) -> Result<(), DomainError>;
}

/// Cross-session continuity snapshots: GM fear and per-character state.
#[async_trait]
pub trait SystemStateStore: Send + Sync {
    /// The campaign's GM snapshot, if any.
    async fn gm_state(&self, campaign_id: Uuid) -> Result<Option<GmState>, DomainError>;

    /// Inserts or replaces the GM snapshot.
    async fn put_gm_state(&self, state: GmState) -> Result<(), DomainError>;

    /// One character's snapshot, if any.
    async fn character_state(
        &self,
        campaign_id: Uuid,
        character_id: Uuid,
    ) -> Result<Option<CharacterState>, DomainError>;

    /// Inserts or replaces a character snapshot.
    async fn put_character_state(&self, state: CharacterState) -> Result<(), DomainError>;

    /// All character snapshots of a campaign.
    async fn list_character_states(
        &self,
        campaign_id: Uuid,
    ) -> Result<Vec<CharacterState>, DomainError>;
}

/// Session store, keyed by (campaign, session).
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads one session.
    async fn get(&self, campaign_id: Uuid, session_id: Uuid)
    -> Result<Option<Session>, DomainError>;

    /// Inserts or replaces a session.
    async fn put(&self, session: Session) -> Result<(), DomainError>;

    /// The campaign's currently active (unended) session, if any.
    async fn active(&self, campaign_id: Uuid) -> Result<Option<Session>, DomainError>;
}

/// Fork-ancestry store, keyed by the target campaign.
#[async_trait]
pub trait ForkMetaStore: Send + Sync {
    /// The campaign's fork metadata; `None` for non-forked campaigns.
    async fn get(&self, campaign_id: Uuid) -> Result<Option<ForkMeta>, DomainError>;

    /// Inserts or replaces fork metadata.
    async fn put(&self, meta: ForkMeta) -> Result<(), DomainError>;
}
