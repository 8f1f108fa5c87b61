//! Event fixture builder.

use chrono::{DateTime, Utc};
use fateloom_core::event::{ActorType, Event};
use serde_json::Value;
use uuid::Uuid;

use crate::clock::fixed_time;

/// Builds unassigned journal events with sensible test defaults: the fixed
/// test timestamp and a `system` actor.
#[derive(Debug)]
pub struct EventBuilder {
    event: Event,
}

impl EventBuilder {
    /// Starts a builder for the given campaign and event type.
    #[must_use]
    pub fn new(campaign_id: Uuid, event_type: &str) -> Self {
        Self {
            event: Event::new(campaign_id, event_type, fixed_time(), ActorType::System),
        }
    }

    /// Overrides the occurrence timestamp.
    #[must_use]
    pub fn at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.event.occurred_at = occurred_at;
        self
    }

    /// Attaches a session id.
    #[must_use]
    pub fn session(mut self, session_id: Uuid) -> Self {
        self.event.session_id = Some(session_id);
        self
    }

    /// Overrides the actor.
    #[must_use]
    pub fn actor(mut self, actor_type: ActorType, actor_id: &str) -> Self {
        self.event.actor_type = actor_type;
        self.event.actor_id = Some(actor_id.to_owned());
        self
    }

    /// Sets the affected entity.
    #[must_use]
    pub fn entity(mut self, entity_type: &str, entity_id: &str) -> Self {
        self.event.entity_type = Some(entity_type.to_owned());
        self.event.entity_id = Some(entity_id.to_owned());
        self
    }

    /// Sets the payload.
    #[must_use]
    pub fn payload(mut self, payload: Value) -> Self {
        self.event.payload = payload;
        self
    }

    /// Returns the built event.
    #[must_use]
    pub fn build(self) -> Event {
        self.event
    }
}
