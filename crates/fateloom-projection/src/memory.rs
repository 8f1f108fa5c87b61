//! In-memory read-model stores.
//!
//! Projections are rebuilt from the journal on startup and on fork, so
//! process-memory residency is the intended deployment shape, not a test
//! shortcut. Each store provides atomic per-key read/write behind a mutex.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use fateloom_core::campaign::Campaign;
use fateloom_core::error::DomainError;
use fateloom_core::model::{Character, CharacterState, ForkMeta, GmState, Participant, Session};
use fateloom_core::payload::Controller;
use fateloom_core::stores::{
    CampaignStore, CharacterStore, ControlDefaultStore, ForkMetaStore, ParticipantStore,
    SessionStore, SystemStateStore,
};

fn poisoned(operation: &str) -> DomainError {
    DomainError::storage(operation, "store lock poisoned")
}

/// In-memory campaign store.
#[derive(Debug, Default)]
pub struct MemoryCampaignStore {
    inner: Mutex<HashMap<Uuid, Campaign>>,
}

impl MemoryCampaignStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CampaignStore for MemoryCampaignStore {
    async fn get(&self, id: Uuid) -> Result<Option<Campaign>, DomainError> {
        let inner = self.inner.lock().map_err(|_| poisoned("get campaign"))?;
        Ok(inner.get(&id).cloned())
    }

    async fn put(&self, campaign: Campaign) -> Result<(), DomainError> {
        let mut inner = self.inner.lock().map_err(|_| poisoned("put campaign"))?;
        inner.insert(campaign.id, campaign);
        Ok(())
    }
}

/// In-memory participant store; per-campaign vectors keep join order.
#[derive(Debug, Default)]
pub struct MemoryParticipantStore {
    inner: Mutex<HashMap<Uuid, Vec<Participant>>>,
}

impl MemoryParticipantStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ParticipantStore for MemoryParticipantStore {
    async fn get(
        &self,
        campaign_id: Uuid,
        participant_id: Uuid,
    ) -> Result<Option<Participant>, DomainError> {
        let inner = self.inner.lock().map_err(|_| poisoned("get participant"))?;
        Ok(inner
            .get(&campaign_id)
            .and_then(|list| list.iter().find(|p| p.id == participant_id))
            .cloned())
    }

    async fn put(&self, participant: Participant) -> Result<(), DomainError> {
        let mut inner = self.inner.lock().map_err(|_| poisoned("put participant"))?;
        let list = inner.entry(participant.campaign_id).or_default();
        if let Some(existing) = list.iter_mut().find(|p| p.id == participant.id) {
            *existing = participant;
        } else {
            list.push(participant);
        }
        Ok(())
    }

    async fn remove(&self, campaign_id: Uuid, participant_id: Uuid) -> Result<(), DomainError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| poisoned("remove participant"))?;
        if let Some(list) = inner.get_mut(&campaign_id) {
            list.retain(|p| p.id != participant_id);
        }
        Ok(())
    }

    async fn list(&self, campaign_id: Uuid) -> Result<Vec<Participant>, DomainError> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| poisoned("list participants"))?;
        Ok(inner.get(&campaign_id).cloned().unwrap_or_default())
    }
}

/// In-memory character store; per-campaign vectors keep creation order.
#[derive(Debug, Default)]
pub struct MemoryCharacterStore {
    inner: Mutex<HashMap<Uuid, Vec<Character>>>,
}

impl MemoryCharacterStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CharacterStore for MemoryCharacterStore {
    async fn get(
        &self,
        campaign_id: Uuid,
        character_id: Uuid,
    ) -> Result<Option<Character>, DomainError> {
        let inner = self.inner.lock().map_err(|_| poisoned("get character"))?;
        Ok(inner
            .get(&campaign_id)
            .and_then(|list| list.iter().find(|c| c.id == character_id))
            .cloned())
    }

    async fn put(&self, character: Character) -> Result<(), DomainError> {
        let mut inner = self.inner.lock().map_err(|_| poisoned("put character"))?;
        let list = inner.entry(character.campaign_id).or_default();
        if let Some(existing) = list.iter_mut().find(|c| c.id == character.id) {
            *existing = character;
        } else {
            list.push(character);
        }
        Ok(())
    }

    async fn list(&self, campaign_id: Uuid) -> Result<Vec<Character>, DomainError> {
        let inner = self.inner.lock().map_err(|_| poisoned("list characters"))?;
        Ok(inner.get(&campaign_id).cloned().unwrap_or_default())
    }
}

/// In-memory default-controller store.
#[derive(Debug, Default)]
pub struct MemoryControlDefaultStore {
    inner: Mutex<HashMap<(Uuid, Uuid), Controller>>,
}

impl MemoryControlDefaultStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ControlDefaultStore for MemoryControlDefaultStore {
    async fn get(
        &self,
        campaign_id: Uuid,
        character_id: Uuid,
    ) -> Result<Option<Controller>, DomainError> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| poisoned("get control default"))?;
        Ok(inner.get(&(campaign_id, character_id)).copied())
    }

    async fn put(
        &self,
        campaign_id: Uuid,
        character_id: Uuid,
        controller: Controller,
    ) -> Result<(), DomainError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| poisoned("put control default"))?;
        inner.insert((campaign_id, character_id), controller);
        Ok(())
    }

    async fn remove(&self, campaign_id: Uuid, character_id: Uuid) -> Result<(), DomainError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| poisoned("remove control default"))?;
        inner.remove(&(campaign_id, character_id));
        Ok(())
    }
}

/// In-memory continuity snapshots: GM fear plus per-character state.
#[derive(Debug, Default)]
pub struct MemorySystemStateStore {
    gm: Mutex<HashMap<Uuid, GmState>>,
    characters: Mutex<HashMap<Uuid, Vec<CharacterState>>>,
}

impl MemorySystemStateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SystemStateStore for MemorySystemStateStore {
    async fn gm_state(&self, campaign_id: Uuid) -> Result<Option<GmState>, DomainError> {
        let gm = self.gm.lock().map_err(|_| poisoned("get gm state"))?;
        Ok(gm.get(&campaign_id).cloned())
    }

    async fn put_gm_state(&self, state: GmState) -> Result<(), DomainError> {
        let mut gm = self.gm.lock().map_err(|_| poisoned("put gm state"))?;
        gm.insert(state.campaign_id, state);
        Ok(())
    }

    async fn character_state(
        &self,
        campaign_id: Uuid,
        character_id: Uuid,
    ) -> Result<Option<CharacterState>, DomainError> {
        let characters = self
            .characters
            .lock()
            .map_err(|_| poisoned("get character state"))?;
        Ok(characters
            .get(&campaign_id)
            .and_then(|list| list.iter().find(|s| s.character_id == character_id))
            .cloned())
    }

    async fn put_character_state(&self, state: CharacterState) -> Result<(), DomainError> {
        let mut characters = self
            .characters
            .lock()
            .map_err(|_| poisoned("put character state"))?;
        let list = characters.entry(state.campaign_id).or_default();
        if let Some(existing) = list.iter_mut().find(|s| s.character_id == state.character_id) {
            *existing = state;
        } else {
            list.push(state);
        }
        Ok(())
    }

    async fn list_character_states(
        &self,
        campaign_id: Uuid,
    ) -> Result<Vec<CharacterState>, DomainError> {
        let characters = self
            .characters
            .lock()
            .map_err(|_| poisoned("list character states"))?;
        Ok(characters.get(&campaign_id).cloned().unwrap_or_default())
    }
}

/// In-memory session store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<HashMap<Uuid, Vec<Session>>>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(
        &self,
        campaign_id: Uuid,
        session_id: Uuid,
    ) -> Result<Option<Session>, DomainError> {
        let inner = self.inner.lock().map_err(|_| poisoned("get session"))?;
        Ok(inner
            .get(&campaign_id)
            .and_then(|list| list.iter().find(|s| s.id == session_id))
            .cloned())
    }

    async fn put(&self, session: Session) -> Result<(), DomainError> {
        let mut inner = self.inner.lock().map_err(|_| poisoned("put session"))?;
        let list = inner.entry(session.campaign_id).or_default();
        if let Some(existing) = list.iter_mut().find(|s| s.id == session.id) {
            *existing = session;
        } else {
            list.push(session);
        }
        Ok(())
    }

    async fn active(&self, campaign_id: Uuid) -> Result<Option<Session>, DomainError> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| poisoned("get active session"))?;
        Ok(inner
            .get(&campaign_id)
            .and_then(|list| list.iter().find(|s| !s.is_ended()))
            .cloned())
    }
}

/// In-memory fork-ancestry store.
#[derive(Debug, Default)]
pub struct MemoryForkMetaStore {
    inner: Mutex<HashMap<Uuid, ForkMeta>>,
}

impl MemoryForkMetaStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ForkMetaStore for MemoryForkMetaStore {
    async fn get(&self, campaign_id: Uuid) -> Result<Option<ForkMeta>, DomainError> {
        let inner = self.inner.lock().map_err(|_| poisoned("get fork meta"))?;
        Ok(inner.get(&campaign_id).cloned())
    }

    async fn put(&self, meta: ForkMeta) -> Result<(), DomainError> {
        let mut inner = self.inner.lock().map_err(|_| poisoned("put fork meta"))?;
        inner.insert(meta.campaign_id, meta);
        Ok(())
    }
}
