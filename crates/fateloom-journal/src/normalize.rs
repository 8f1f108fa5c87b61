//! Append-time normalization, shared by every journal backend.

use fateloom_core::error::DomainError;
use fateloom_core::event::{ActorType, Event};

/// Validates and normalizes an event before sequence/hash assignment.
///
/// Client-assigned sequence or hash values are a programming error and are
/// rejected outright. A `null` payload becomes `{}`.
///
/// # Errors
///
/// Returns `DomainError::Validation` for any malformed field; nothing is
/// persisted on failure.
pub fn normalize_for_append(mut event: Event) -> Result<Event, DomainError> {
    if event.campaign_id.is_nil() {
        return Err(DomainError::Validation("campaign id is required".into()));
    }
    if event.event_type.is_empty() {
        return Err(DomainError::Validation("event type is required".into()));
    }
    if !event.event_type.contains('.') {
        return Err(DomainError::Validation(format!(
            "event type {:?} has no domain prefix",
            event.event_type
        )));
    }
    if event.sequence != 0 {
        return Err(DomainError::Validation(
            "sequence is assigned by the journal".into(),
        ));
    }
    if !event.hash.is_empty() {
        return Err(DomainError::Validation(
            "content hash is assigned by the journal".into(),
        ));
    }
    if event.actor_type != ActorType::System && event.actor_id.as_deref().is_none_or(str::is_empty)
    {
        return Err(DomainError::Validation(format!(
            "actor id is required for actor type {}",
            event.actor_type
        )));
    }
    if event.payload.is_null() {
        event.payload = serde_json::Value::Object(serde_json::Map::new());
    }
    Ok(event)
}
