//! The fork engine.
//!
//! Per request: resolve the fork point, create the target campaign, emit
//! fresh creation and lineage events, optionally seed continuity snapshots
//! from the source's current projections, then copy-filter-apply the
//! source's events up to the fork point.
//!
//! The fork is not transactional across these steps. A failure partway
//! leaves a partially-initialized target campaign; the error is surfaced
//! and the caller owns cleanup or a retry from scratch.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use fateloom_core::campaign::Campaign;
use fateloom_core::clock::Clock;
use fateloom_core::error::DomainError;
use fateloom_core::event::{ActorType, Event};
use fateloom_core::id::IdGenerator;
use fateloom_core::journal::EventJournal;
use fateloom_core::model::{CharacterState, GmState, Lineage};
use fateloom_core::payload::{
    CAMPAIGN_CREATED, CAMPAIGN_FORKED, CHARACTER_CONTROLLER_ASSIGNED, CHARACTER_STATE_CHANGED,
    CampaignCreated, CampaignForked, Controller, EventPayload, GM_FEAR_CHANGED,
};
use fateloom_core::stores::{CampaignStore, ForkMetaStore, SessionStore, SystemStateStore};
use fateloom_projection::applier::Applier;

/// Hop bound for lineage walks; tolerates a corrupt parent chain without
/// looping forever.
pub const MAX_LINEAGE_DEPTH: u32 = 100;

/// Page size for the copy walk over the source journal.
const COPY_PAGE_SIZE: u32 = 200;

/// Where a fork branches off the source's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForkPoint {
    /// An explicit source event sequence; 0 means "at the latest event".
    AtSequence(i64),
    /// The last event of a named session, which must have ended.
    AtSessionEnd(Uuid),
}

/// A fork request.
#[derive(Debug, Clone)]
pub struct ForkRequest {
    /// The campaign whose history is branched.
    pub source_campaign_id: Uuid,
    /// Where to branch.
    pub fork_point: ForkPoint,
    /// The new campaign's name.
    pub name: String,
    /// Whether participant lifecycle events are copied.
    pub copy_participants: bool,
    /// Actor recorded on the target's creation and lineage events.
    pub actor_type: ActorType,
    /// Actor identifier; required unless the actor is `system`.
    pub actor_id: Option<String>,
    /// Request correlation identifier.
    pub request_id: Option<String>,
}

/// What a successful fork produced.
#[derive(Debug, Clone)]
pub struct ForkOutcome {
    /// The new campaign's read model.
    pub campaign: Campaign,
    /// Resolved ancestry, depth included.
    pub lineage: Lineage,
    /// The source sequence the fork branched at.
    pub fork_event_seq: i64,
}

/// Dependencies for [`ForkEngine::new`]; all injected, none ambient.
pub struct ForkEngineDeps {
    /// The journal both campaigns live in.
    pub journal: Arc<dyn EventJournal>,
    /// Campaign read models.
    pub campaigns: Arc<dyn CampaignStore>,
    /// Session read models, for session-boundary fork points.
    pub sessions: Arc<dyn SessionStore>,
    /// Fork ancestry records.
    pub fork_meta: Arc<dyn ForkMetaStore>,
    /// Continuity snapshots, for seeding at-head forks.
    pub system_state: Arc<dyn SystemStateStore>,
    /// Applier wired with every store the target's projections need.
    pub applier: Applier,
    /// Time source.
    pub clock: Arc<dyn Clock>,
    /// Identifier source.
    pub ids: Arc<dyn IdGenerator>,
}

/// Creates new campaigns branched from an existing campaign's history.
pub struct ForkEngine {
    journal: Arc<dyn EventJournal>,
    campaigns: Arc<dyn CampaignStore>,
    sessions: Arc<dyn SessionStore>,
    fork_meta: Arc<dyn ForkMetaStore>,
    system_state: Arc<dyn SystemStateStore>,
    applier: Applier,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl ForkEngine {
    /// Creates a fork engine from its dependencies.
    #[must_use]
    pub fn new(deps: ForkEngineDeps) -> Self {
        Self {
            journal: deps.journal,
            campaigns: deps.campaigns,
            sessions: deps.sessions,
            fork_meta: deps.fork_meta,
            system_state: deps.system_state,
            applier: deps.applier,
            clock: deps.clock,
            ids: deps.ids,
        }
    }

    /// Forks a campaign at the requested point.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown source campaign or session;
    /// `FailedPrecondition` for a fork point beyond the source's history, an
    /// unended session, a session with no events, or a source with no events
    /// at all; `Validation` for a missing name; `Infrastructure` for storage
    /// failures, which may leave a partially-initialized target behind.
    pub async fn fork(&self, request: &ForkRequest) -> Result<ForkOutcome, DomainError> {
        if request.name.trim().is_empty() {
            return Err(DomainError::Validation("fork name is required".into()));
        }
        let source = self
            .campaigns
            .get(request.source_campaign_id)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                entity: "campaign",
                id: request.source_campaign_id.to_string(),
            })?;
        let latest = self.journal.latest_seq(source.id).await?;
        let fork_seq = self
            .resolve_fork_point(request.fork_point, source.id, latest)
            .await?;

        let target_id = self.ids.new_id();
        let now = self.clock.now();
        let origin_id = match self.fork_meta.get(source.id).await? {
            Some(meta) => meta.origin_campaign_id,
            None => source.id,
        };
        tracing::info!(
            source_campaign_id = %source.id,
            target_campaign_id = %target_id,
            fork_seq,
            copy_participants = request.copy_participants,
            "forking campaign"
        );

        self.commit(self.creation_event(request, &source, target_id, now))
            .await?;
        self.commit(self.lineage_event(request, source.id, origin_id, fork_seq, target_id, now))
            .await?;

        let seeding = fork_seq == latest;
        let mut seeded_types: HashSet<&'static str> = HashSet::new();
        if seeding {
            self.seed_snapshots(source.id, target_id, &mut seeded_types)
                .await?;
        }

        let last_selected_at = self
            .copy_events(source.id, target_id, fork_seq, request.copy_participants, &seeded_types)
            .await?;

        if seeding && let Some(occurred_at) = last_selected_at {
            // Seeded categories were never applied for the target, so the
            // activity timestamp has to be advanced by hand.
            if let Some(mut campaign) = self.campaigns.get(target_id).await? {
                campaign.last_activity_at = occurred_at;
                self.campaigns.put(campaign).await?;
            }
        }

        let lineage = self.lineage(target_id).await?;
        let campaign = self
            .campaigns
            .get(target_id)
            .await?
            .ok_or_else(|| {
                DomainError::Infrastructure("fork target campaign missing after replay".into())
            })?;
        Ok(ForkOutcome {
            campaign,
            lineage,
            fork_event_seq: fork_seq,
        })
    }

    /// Resolved ancestry for a campaign. Non-forked campaigns get a root
    /// lineage: no parent, themselves as origin, depth 0.
    ///
    /// # Errors
    ///
    /// `NotFound` when the campaign does not exist.
    pub async fn lineage(&self, campaign_id: Uuid) -> Result<Lineage, DomainError> {
        if self.campaigns.get(campaign_id).await?.is_none() {
            return Err(DomainError::NotFound {
                entity: "campaign",
                id: campaign_id.to_string(),
            });
        }
        match self.fork_meta.get(campaign_id).await? {
            None => Ok(Lineage {
                campaign_id,
                parent_campaign_id: None,
                origin_campaign_id: campaign_id,
                fork_event_seq: None,
                depth: 0,
            }),
            Some(meta) => {
                let depth = self.depth(campaign_id).await?;
                Ok(Lineage {
                    campaign_id,
                    parent_campaign_id: Some(meta.parent_campaign_id),
                    origin_campaign_id: meta.origin_campaign_id,
                    fork_event_seq: Some(meta.fork_event_seq),
                    depth,
                })
            }
        }
    }

    /// Forks whose immediate parent is the given campaign.
    ///
    /// # Errors
    ///
    /// Always returns `DomainError::Unimplemented`; the reverse index does
    /// not exist yet.
    pub async fn list_forks(&self, _parent_campaign_id: Uuid) -> Result<Vec<Lineage>, DomainError> {
        Err(DomainError::Unimplemented("list forks by parent"))
    }

    async fn resolve_fork_point(
        &self,
        fork_point: ForkPoint,
        source_id: Uuid,
        latest: i64,
    ) -> Result<i64, DomainError> {
        match fork_point {
            ForkPoint::AtSequence(seq) => {
                if seq < 0 {
                    return Err(DomainError::Validation(
                        "fork point must not be negative".into(),
                    ));
                }
                if seq > latest {
                    return Err(DomainError::FailedPrecondition(
                        "fork point is beyond current state".into(),
                    ));
                }
                if seq == 0 {
                    // "Fork at the latest known event."
                    if latest == 0 {
                        return Err(DomainError::FailedPrecondition(
                            "source campaign has no events".into(),
                        ));
                    }
                    return Ok(latest);
                }
                Ok(seq)
            }
            ForkPoint::AtSessionEnd(session_id) => {
                let session = self
                    .sessions
                    .get(source_id, session_id)
                    .await?
                    .ok_or_else(|| DomainError::NotFound {
                        entity: "session",
                        id: session_id.to_string(),
                    })?;
                if !session.is_ended() {
                    return Err(DomainError::FailedPrecondition(format!(
                        "session {session_id} has not ended"
                    )));
                }
                let mut last_seq = 0;
                loop {
                    let page = self
                        .journal
                        .list_by_session(source_id, session_id, last_seq, COPY_PAGE_SIZE)
                        .await?;
                    let Some(last) = page.last() else { break };
                    last_seq = last.sequence;
                }
                if last_seq == 0 {
                    return Err(DomainError::FailedPrecondition(format!(
                        "session {session_id} has no events"
                    )));
                }
                Ok(last_seq)
            }
        }
    }

    fn creation_event(
        &self,
        request: &ForkRequest,
        source: &Campaign,
        target_id: Uuid,
        now: DateTime<Utc>,
    ) -> Event {
        let mut event = Event::new(target_id, CAMPAIGN_CREATED, now, request.actor_type);
        event.actor_id = request.actor_id.clone();
        event.request_id = request.request_id.clone();
        event.entity_type = Some("campaign".to_owned());
        event.entity_id = Some(target_id.to_string());
        event.payload = EventPayload::CampaignCreated(CampaignCreated {
            name: request.name.clone(),
            game_system: source.game_system.clone(),
            gm_mode: source.gm_mode,
            theme: source.theme.clone(),
        })
        .encode();
        event
    }

    fn lineage_event(
        &self,
        request: &ForkRequest,
        parent_id: Uuid,
        origin_id: Uuid,
        fork_seq: i64,
        target_id: Uuid,
        now: DateTime<Utc>,
    ) -> Event {
        let mut event = Event::new(target_id, CAMPAIGN_FORKED, now, request.actor_type);
        event.actor_id = request.actor_id.clone();
        event.request_id = request.request_id.clone();
        event.entity_type = Some("campaign".to_owned());
        event.entity_id = Some(target_id.to_string());
        event.payload = EventPayload::CampaignForked(CampaignForked {
            parent_campaign_id: parent_id,
            fork_event_seq: fork_seq,
            origin_campaign_id: origin_id,
            name: request.name.clone(),
        })
        .encode();
        event
    }

    /// Copies the source's continuity snapshots to the target instead of
    /// re-deriving them from the whole `chronicle.*` history: O(character
    /// count) rather than O(history). Seeded categories are recorded so the
    /// copy pass skips their events.
    async fn seed_snapshots(
        &self,
        source_id: Uuid,
        target_id: Uuid,
        seeded_types: &mut HashSet<&'static str>,
    ) -> Result<(), DomainError> {
        if let Some(gm) = self.system_state.gm_state(source_id).await? {
            self.system_state
                .put_gm_state(GmState {
                    campaign_id: target_id,
                    ..gm
                })
                .await?;
            seeded_types.insert(GM_FEAR_CHANGED);
        }
        let states = self.system_state.list_character_states(source_id).await?;
        if !states.is_empty() {
            for state in states {
                self.system_state
                    .put_character_state(CharacterState {
                        campaign_id: target_id,
                        ..state
                    })
                    .await?;
            }
            seeded_types.insert(CHARACTER_STATE_CHANGED);
        }
        Ok(())
    }

    /// Walks the source journal up to the fork point, re-homing selected
    /// events onto the target and applying each as it lands. Returns the
    /// timestamp of the last selected event.
    async fn copy_events(
        &self,
        source_id: Uuid,
        target_id: Uuid,
        fork_seq: i64,
        copy_participants: bool,
        seeded_types: &HashSet<&'static str>,
    ) -> Result<Option<DateTime<Utc>>, DomainError> {
        let mut after_seq = 0;
        let mut last_selected_at = None;
        'pages: loop {
            let page = self
                .journal
                .list_after(source_id, after_seq, COPY_PAGE_SIZE)
                .await?;
            if page.is_empty() {
                break;
            }
            for event in page {
                if event.sequence > fork_seq {
                    break 'pages;
                }
                after_seq = event.sequence;
                if !should_copy(&event, copy_participants)? {
                    continue;
                }
                last_selected_at = Some(event.occurred_at);
                if seeded_types.contains(event.event_type.as_str()) {
                    continue;
                }
                let mut copy = event;
                copy.campaign_id = target_id;
                copy.sequence = 0;
                copy.hash = String::new();
                if copy.entity_type.as_deref() == Some("campaign") {
                    copy.entity_id = Some(target_id.to_string());
                }
                self.commit(copy).await?;
            }
        }
        Ok(last_selected_at)
    }

    async fn commit(&self, event: Event) -> Result<Event, DomainError> {
        let stored = self.journal.append(event).await?;
        self.applier.apply(&stored).await?;
        Ok(stored)
    }

    /// Hop count from `campaign_id` to its origin, bounded to
    /// [`MAX_LINEAGE_DEPTH`].
    async fn depth(&self, campaign_id: Uuid) -> Result<u32, DomainError> {
        let mut depth = 0;
        let mut current = campaign_id;
        while let Some(meta) = self.fork_meta.get(current).await? {
            depth += 1;
            current = meta.parent_campaign_id;
            if depth >= MAX_LINEAGE_DEPTH {
                tracing::warn!(
                    campaign_id = %campaign_id,
                    "lineage walk hit the depth bound; parent chain may be corrupt"
                );
                break;
            }
        }
        Ok(depth)
    }
}

/// Event-selection rules for the copy pass.
///
/// The source's own creation and lineage events never copy (the target
/// gets fresh ones). Participant lifecycle copies only on request. A
/// controller assignment naming a specific participant is dropped with the
/// participants it would dangle against; GM assignments and clears always
/// copy.
fn should_copy(event: &Event, copy_participants: bool) -> Result<bool, DomainError> {
    match event.event_type.as_str() {
        CAMPAIGN_CREATED | CAMPAIGN_FORKED => Ok(false),
        CHARACTER_CONTROLLER_ASSIGNED => {
            if copy_participants {
                return Ok(true);
            }
            match EventPayload::decode(&event.event_type, &event.payload)? {
                EventPayload::ControllerAssigned(p) => {
                    Ok(!matches!(p.controller, Controller::Participant { .. }))
                }
                _ => Ok(true),
            }
        }
        _ if event.domain() == "participant" => Ok(copy_participants),
        _ => Ok(true),
    }
}
