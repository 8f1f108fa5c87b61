//! Shared application state.

use std::sync::Arc;

use uuid::Uuid;

use fateloom_core::campaign::Campaign;
use fateloom_core::clock::Clock;
use fateloom_core::error::DomainError;
use fateloom_core::event::Event;
use fateloom_core::id::IdGenerator;
use fateloom_core::journal::EventJournal;
use fateloom_core::stores::{
    CampaignStore, CharacterStore, ControlDefaultStore, ForkMetaStore, ParticipantStore,
    SessionStore, SystemStateStore,
};
use fateloom_fork::{ForkEngine, ForkEngineDeps};
use fateloom_projection::applier::Applier;
use fateloom_projection::memory::{
    MemoryCampaignStore, MemoryCharacterStore, MemoryControlDefaultStore, MemoryForkMetaStore,
    MemoryParticipantStore, MemorySessionStore, MemorySystemStateStore,
};
use fateloom_projection::replay::Replayer;

/// Application state shared across all request handlers.
///
/// The journal is the durable source of truth; the read-model stores are
/// memory-resident projections rebuilt from it at startup.
#[derive(Clone)]
pub struct AppState {
    /// The event journal.
    pub journal: Arc<dyn EventJournal>,
    /// Campaign read models.
    pub campaigns: Arc<dyn CampaignStore>,
    /// Participant read models.
    pub participants: Arc<dyn ParticipantStore>,
    /// Character read models.
    pub characters: Arc<dyn CharacterStore>,
    /// Default-controller read models.
    pub control_defaults: Arc<dyn ControlDefaultStore>,
    /// Continuity snapshots.
    pub system_state: Arc<dyn SystemStateStore>,
    /// Session read models.
    pub sessions: Arc<dyn SessionStore>,
    /// Fork ancestry records.
    pub fork_meta: Arc<dyn ForkMetaStore>,
    /// Applier wired with every store above.
    pub applier: Applier,
    /// The fork engine.
    pub fork: Arc<ForkEngine>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
    /// Identifier source.
    pub ids: Arc<dyn IdGenerator>,
}

impl AppState {
    /// Creates application state over the given journal, with fresh
    /// in-memory projections.
    #[must_use]
    pub fn new(
        journal: Arc<dyn EventJournal>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        let campaigns: Arc<dyn CampaignStore> = Arc::new(MemoryCampaignStore::new());
        let participants: Arc<dyn ParticipantStore> = Arc::new(MemoryParticipantStore::new());
        let characters: Arc<dyn CharacterStore> = Arc::new(MemoryCharacterStore::new());
        let control_defaults: Arc<dyn ControlDefaultStore> =
            Arc::new(MemoryControlDefaultStore::new());
        let system_state: Arc<dyn SystemStateStore> = Arc::new(MemorySystemStateStore::new());
        let sessions: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
        let fork_meta: Arc<dyn ForkMetaStore> = Arc::new(MemoryForkMetaStore::new());

        let applier = Applier::new()
            .with_campaigns(campaigns.clone())
            .with_participants(participants.clone())
            .with_characters(characters.clone())
            .with_control_defaults(control_defaults.clone())
            .with_system_state(system_state.clone())
            .with_sessions(sessions.clone())
            .with_fork_meta(fork_meta.clone());

        let fork = Arc::new(ForkEngine::new(ForkEngineDeps {
            journal: journal.clone(),
            campaigns: campaigns.clone(),
            sessions: sessions.clone(),
            fork_meta: fork_meta.clone(),
            system_state: system_state.clone(),
            applier: applier.clone(),
            clock: clock.clone(),
            ids: ids.clone(),
        }));

        Self {
            journal,
            campaigns,
            participants,
            characters,
            control_defaults,
            system_state,
            sessions,
            fork_meta,
            applier,
            fork,
            clock,
            ids,
        }
    }

    /// A replayer over this state's journal and applier; used for the
    /// startup projection rebuild.
    #[must_use]
    pub fn replayer(&self) -> Replayer {
        Replayer::new(self.journal.clone(), self.applier.clone())
    }

    /// Appends an event and applies it to the projections.
    ///
    /// # Errors
    ///
    /// Propagates journal and applier failures.
    pub async fn commit(&self, event: Event) -> Result<Event, DomainError> {
        let stored = self.journal.append(event).await?;
        self.applier.apply(&stored).await?;
        Ok(stored)
    }

    /// Loads a campaign or fails with `NotFound`.
    ///
    /// # Errors
    ///
    /// `DomainError::NotFound` for an unknown campaign.
    pub async fn load_campaign(&self, campaign_id: Uuid) -> Result<Campaign, DomainError> {
        self.campaigns
            .get(campaign_id)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                entity: "campaign",
                id: campaign_id.to_string(),
            })
    }
}
