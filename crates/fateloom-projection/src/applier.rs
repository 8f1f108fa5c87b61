//! The projection applier.
//!
//! One stored event in, updates to the wired read-model stores out. The
//! applier never writes to the journal, and it does not guard against
//! double-application: counters double-count if the same stored event is
//! applied twice, so callers must apply each event at most once per
//! logical projection.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use fateloom_core::campaign::{Campaign, CampaignStatus};
use fateloom_core::error::DomainError;
use fateloom_core::event::Event;
use fateloom_core::model::{Character, CharacterState, ForkMeta, GmState, Participant, Session};
use fateloom_core::payload::{
    CAMPAIGN_CREATED, CampaignCreated, CampaignStatusChanged, CampaignUpdated,
    CharacterCreated, CharacterProfileUpdated, CharacterStateChanged, Controller,
    ControllerAssigned, EventPayload, GmFearChanged, ParticipantJoined, ParticipantLeft,
    ParticipantUpdated, SessionEnded, SessionStarted,
};
use fateloom_core::stores::{
    CampaignStore, CharacterStore, ControlDefaultStore, ForkMetaStore, ParticipantStore,
    SessionStore, SystemStateStore,
};

/// Applies events to whichever read-model stores it was wired with.
///
/// Callers needing only a subset of effects wire only those stores;
/// events touching unwired facets are simply not applied for that facet.
#[derive(Clone, Default)]
pub struct Applier {
    campaigns: Option<Arc<dyn CampaignStore>>,
    participants: Option<Arc<dyn ParticipantStore>>,
    characters: Option<Arc<dyn CharacterStore>>,
    control_defaults: Option<Arc<dyn ControlDefaultStore>>,
    system_state: Option<Arc<dyn SystemStateStore>>,
    sessions: Option<Arc<dyn SessionStore>>,
    fork_meta: Option<Arc<dyn ForkMetaStore>>,
}

impl Applier {
    /// Creates an applier with no stores wired.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wires the campaign store.
    #[must_use]
    pub fn with_campaigns(mut self, store: Arc<dyn CampaignStore>) -> Self {
        self.campaigns = Some(store);
        self
    }

    /// Wires the participant store.
    #[must_use]
    pub fn with_participants(mut self, store: Arc<dyn ParticipantStore>) -> Self {
        self.participants = Some(store);
        self
    }

    /// Wires the character store.
    #[must_use]
    pub fn with_characters(mut self, store: Arc<dyn CharacterStore>) -> Self {
        self.characters = Some(store);
        self
    }

    /// Wires the default-controller store.
    #[must_use]
    pub fn with_control_defaults(mut self, store: Arc<dyn ControlDefaultStore>) -> Self {
        self.control_defaults = Some(store);
        self
    }

    /// Wires the continuity-snapshot store.
    #[must_use]
    pub fn with_system_state(mut self, store: Arc<dyn SystemStateStore>) -> Self {
        self.system_state = Some(store);
        self
    }

    /// Wires the session store.
    #[must_use]
    pub fn with_sessions(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.sessions = Some(store);
        self
    }

    /// Wires the fork-ancestry store.
    #[must_use]
    pub fn with_fork_meta(mut self, store: Arc<dyn ForkMetaStore>) -> Self {
        self.fork_meta = Some(store);
        self
    }

    /// Applies one stored event to the wired stores.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` when a known payload fails to
    /// decode or a store write fails. Unknown event types are a no-op (they
    /// still advance the campaign's last-activity timestamp).
    pub async fn apply(&self, event: &Event) -> Result<(), DomainError> {
        let payload = EventPayload::decode(&event.event_type, &event.payload)?;
        match payload {
            EventPayload::CampaignCreated(p) => self.campaign_created(event, p).await?,
            EventPayload::CampaignForked(p) => {
                if let Some(fork_meta) = &self.fork_meta {
                    fork_meta
                        .put(ForkMeta {
                            campaign_id: event.campaign_id,
                            parent_campaign_id: p.parent_campaign_id,
                            fork_event_seq: p.fork_event_seq,
                            origin_campaign_id: p.origin_campaign_id,
                        })
                        .await?;
                }
            }
            EventPayload::CampaignStatusChanged(p) => self.status_changed(event, p).await?,
            EventPayload::CampaignUpdated(p) => self.campaign_updated(event, p).await?,
            EventPayload::ParticipantJoined(p) => self.participant_joined(event, p).await?,
            EventPayload::ParticipantUpdated(p) => self.participant_updated(event, p).await?,
            EventPayload::ParticipantLeft(p) => self.participant_left(event, p).await?,
            EventPayload::CharacterCreated(p) => self.character_created(event, p).await?,
            EventPayload::CharacterProfileUpdated(p) => self.profile_updated(event, p).await?,
            EventPayload::CharacterStateChanged(p) => self.state_changed(event, p).await?,
            EventPayload::ControllerAssigned(p) => self.controller_assigned(event, &p).await?,
            EventPayload::SessionStarted(p) => self.session_started(event, p).await?,
            EventPayload::SessionEnded(p) => self.session_ended(event, &p).await?,
            EventPayload::GmFearChanged(p) => self.gm_fear_changed(event, &p).await?,
            EventPayload::Unknown(_) => {
                tracing::debug!(event_type = %event.event_type, "no projection for event type");
            }
        }
        self.touch_campaign(event).await
    }

    async fn campaign_created(
        &self,
        event: &Event,
        p: CampaignCreated,
    ) -> Result<(), DomainError> {
        let Some(campaigns) = &self.campaigns else {
            return Ok(());
        };
        campaigns
            .put(Campaign {
                id: event.campaign_id,
                name: p.name,
                game_system: p.game_system,
                status: CampaignStatus::Draft,
                gm_mode: p.gm_mode,
                participant_count: 0,
                character_count: 0,
                theme: p.theme,
                created_at: event.occurred_at,
                updated_at: event.occurred_at,
                last_activity_at: event.occurred_at,
                completed_at: None,
                archived_at: None,
            })
            .await
    }

    async fn status_changed(
        &self,
        event: &Event,
        p: CampaignStatusChanged,
    ) -> Result<(), DomainError> {
        self.update_campaign(event.campaign_id, |c| {
            c.apply_status(p.to, event.occurred_at);
        })
        .await
    }

    async fn campaign_updated(&self, event: &Event, p: CampaignUpdated) -> Result<(), DomainError> {
        self.update_campaign(event.campaign_id, |c| {
            if let Some(name) = p.name {
                c.name = name;
            }
            if let Some(theme) = p.theme {
                c.theme = Some(theme);
            }
            c.updated_at = event.occurred_at;
        })
        .await
    }

    async fn participant_joined(
        &self,
        event: &Event,
        p: ParticipantJoined,
    ) -> Result<(), DomainError> {
        if let Some(participants) = &self.participants {
            participants
                .put(Participant {
                    id: p.participant_id,
                    campaign_id: event.campaign_id,
                    display_name: p.display_name,
                    joined_at: event.occurred_at,
                    updated_at: event.occurred_at,
                })
                .await?;
        }
        self.update_campaign(event.campaign_id, |c| {
            c.participant_count += 1;
            c.updated_at = event.occurred_at;
        })
        .await
    }

    async fn participant_updated(
        &self,
        event: &Event,
        p: ParticipantUpdated,
    ) -> Result<(), DomainError> {
        let Some(participants) = &self.participants else {
            return Ok(());
        };
        if let Some(mut participant) = participants.get(event.campaign_id, p.participant_id).await?
        {
            if let Some(display_name) = p.display_name {
                participant.display_name = display_name;
            }
            participant.updated_at = event.occurred_at;
            participants.put(participant).await?;
        }
        Ok(())
    }

    async fn participant_left(&self, event: &Event, p: ParticipantLeft) -> Result<(), DomainError> {
        if let Some(participants) = &self.participants {
            participants
                .remove(event.campaign_id, p.participant_id)
                .await?;
        }
        self.update_campaign(event.campaign_id, |c| {
            c.participant_count -= 1;
            c.updated_at = event.occurred_at;
        })
        .await
    }

    async fn character_created(
        &self,
        event: &Event,
        p: CharacterCreated,
    ) -> Result<(), DomainError> {
        if let Some(characters) = &self.characters {
            characters
                .put(Character {
                    id: p.character_id,
                    campaign_id: event.campaign_id,
                    name: p.name,
                    participant_id: p.participant_id,
                    profile: serde_json::Value::Object(serde_json::Map::new()),
                    created_at: event.occurred_at,
                    updated_at: event.occurred_at,
                })
                .await?;
        }
        self.update_campaign(event.campaign_id, |c| {
            c.character_count += 1;
            c.updated_at = event.occurred_at;
        })
        .await
    }

    async fn profile_updated(
        &self,
        event: &Event,
        p: CharacterProfileUpdated,
    ) -> Result<(), DomainError> {
        let Some(characters) = &self.characters else {
            return Ok(());
        };
        if let Some(mut character) = characters.get(event.campaign_id, p.character_id).await? {
            if let Some(name) = p.name {
                character.name = name;
            }
            if let Some(profile) = p.profile {
                character.profile = profile;
            }
            character.updated_at = event.occurred_at;
            characters.put(character).await?;
        }
        Ok(())
    }

    async fn state_changed(
        &self,
        event: &Event,
        p: CharacterStateChanged,
    ) -> Result<(), DomainError> {
        let Some(system_state) = &self.system_state else {
            return Ok(());
        };
        let mut state = system_state
            .character_state(event.campaign_id, p.character_id)
            .await?
            .unwrap_or(CharacterState {
                character_id: p.character_id,
                campaign_id: event.campaign_id,
                hit_points: 0,
                stress: 0,
                hope: 0,
                updated_at: event.occurred_at,
            });
        if let Some(hit_points) = p.hit_points {
            state.hit_points = hit_points;
        }
        if let Some(stress) = p.stress {
            state.stress = stress;
        }
        if let Some(hope) = p.hope {
            state.hope = hope;
        }
        state.updated_at = event.occurred_at;
        system_state.put_character_state(state).await
    }

    async fn controller_assigned(
        &self,
        event: &Event,
        p: &ControllerAssigned,
    ) -> Result<(), DomainError> {
        let Some(control_defaults) = &self.control_defaults else {
            return Ok(());
        };
        match p.controller {
            Controller::Unassigned => {
                control_defaults
                    .remove(event.campaign_id, p.character_id)
                    .await
            }
            controller => {
                control_defaults
                    .put(event.campaign_id, p.character_id, controller)
                    .await
            }
        }
    }

    async fn session_started(&self, event: &Event, p: SessionStarted) -> Result<(), DomainError> {
        let Some(sessions) = &self.sessions else {
            return Ok(());
        };
        sessions
            .put(Session {
                id: p.session_id,
                campaign_id: event.campaign_id,
                title: p.title,
                started_at: event.occurred_at,
                ended_at: None,
            })
            .await
    }

    async fn session_ended(&self, event: &Event, p: &SessionEnded) -> Result<(), DomainError> {
        let Some(sessions) = &self.sessions else {
            return Ok(());
        };
        if let Some(mut session) = sessions.get(event.campaign_id, p.session_id).await? {
            session.ended_at = Some(event.occurred_at);
            sessions.put(session).await?;
        }
        Ok(())
    }

    async fn gm_fear_changed(&self, event: &Event, p: &GmFearChanged) -> Result<(), DomainError> {
        let Some(system_state) = &self.system_state else {
            return Ok(());
        };
        system_state
            .put_gm_state(GmState {
                campaign_id: event.campaign_id,
                fear: p.fear,
                updated_at: event.occurred_at,
            })
            .await
    }

    /// Mutates the owning campaign record in place, when both the store is
    /// wired and the record exists.
    async fn update_campaign(
        &self,
        campaign_id: Uuid,
        mutate: impl FnOnce(&mut Campaign) + Send,
    ) -> Result<(), DomainError> {
        let Some(campaigns) = &self.campaigns else {
            return Ok(());
        };
        if let Some(mut campaign) = campaigns.get(campaign_id).await? {
            mutate(&mut campaign);
            campaigns.put(campaign).await?;
        }
        Ok(())
    }

    /// Advances the owning campaign's last-activity timestamp. The creation
    /// event seeds its own timestamps.
    async fn touch_campaign(&self, event: &Event) -> Result<(), DomainError> {
        if event.event_type == CAMPAIGN_CREATED {
            return Ok(());
        }
        let occurred_at: DateTime<Utc> = event.occurred_at;
        self.update_campaign(event.campaign_id, |c| {
            c.last_activity_at = occurred_at;
        })
        .await
    }
}
