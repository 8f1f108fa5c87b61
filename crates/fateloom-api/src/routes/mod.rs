//! Route modules, one per resource.

use serde::Deserialize;
use uuid::Uuid;

use fateloom_core::event::{ActorType, Event};

use crate::state::AppState;

pub mod campaigns;
pub mod characters;
pub mod events;
pub mod forks;
pub mod health;
pub mod participants;
pub mod sessions;

/// Who is making a mutating request. Defaults to the system actor when a
/// request carries no actor block.
#[derive(Debug, Clone, Deserialize)]
pub struct ActorRef {
    /// The actor's type.
    pub actor_type: ActorType,
    /// The actor's identifier; required unless the type is `system`.
    #[serde(default)]
    pub actor_id: Option<String>,
}

/// Builds an unassigned event stamped with the current clock and the
/// request's actor.
pub(crate) fn base_event(
    state: &AppState,
    campaign_id: Uuid,
    event_type: &str,
    actor: Option<&ActorRef>,
) -> Event {
    let mut event = Event::new(
        campaign_id,
        event_type,
        state.clock.now(),
        actor.map_or(ActorType::System, |a| a.actor_type),
    );
    event.actor_id = actor.and_then(|a| a.actor_id.clone());
    event
}
