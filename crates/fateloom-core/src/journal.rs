//! Event journal abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::event::{ActorType, Event};

/// Default page size for filtered event listings.
pub const DEFAULT_PAGE_SIZE: u32 = 50;
/// Upper bound for caller-requested page sizes.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Filter over a campaign's events for the paginated listing path.
///
/// The canonical string form binds cursors to the filter they were issued
/// under; changing any field between page requests invalidates the token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilter {
    /// Restrict to these event types (empty = all).
    #[serde(default)]
    pub event_types: Vec<String>,
    /// Restrict to a single session.
    #[serde(default)]
    pub session_id: Option<Uuid>,
    /// Restrict to a single actor type.
    #[serde(default)]
    pub actor_type: Option<ActorType>,
    /// Restrict to a single event domain (type prefix).
    #[serde(default)]
    pub domain: Option<String>,
}

impl EventFilter {
    /// Whether the filter restricts nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.event_types.is_empty()
            && self.session_id.is_none()
            && self.actor_type.is_none()
            && self.domain.is_none()
    }

    /// Stable canonical form used for cursor binding.
    #[must_use]
    pub fn canonical(&self) -> String {
        let mut types = self.event_types.clone();
        types.sort();
        format!(
            "types={};session={};actor={};domain={}",
            types.join(","),
            self.session_id.map_or_else(String::new, |s| s.to_string()),
            self.actor_type.map_or("", ActorType::as_str),
            self.domain.as_deref().unwrap_or(""),
        )
    }

    /// Whether `event` passes the filter.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        if !self.event_types.is_empty() && !self.event_types.contains(&event.event_type) {
            return false;
        }
        if let Some(session_id) = self.session_id
            && event.session_id != Some(session_id)
        {
            return false;
        }
        if let Some(actor_type) = self.actor_type
            && event.actor_type != actor_type
        {
            return false;
        }
        if let Some(domain) = &self.domain
            && event.domain() != domain
        {
            return false;
        }
        true
    }
}

/// Ordering for the paginated listing path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOrder {
    /// Ascending by sequence.
    #[default]
    SeqAsc,
    /// Descending by sequence.
    SeqDesc,
}

impl EventOrder {
    /// Stable canonical form used for cursor binding.
    #[must_use]
    pub fn canonical(self) -> &'static str {
        match self {
            Self::SeqAsc => "seq asc",
            Self::SeqDesc => "seq desc",
        }
    }
}

/// A filtered, ordered, cursor-paginated listing request.
#[derive(Debug, Clone)]
pub struct EventPageRequest {
    /// The campaign whose journal is listed.
    pub campaign_id: Uuid,
    /// Filter in effect.
    pub filter: EventFilter,
    /// Ordering in effect.
    pub order: EventOrder,
    /// Requested page size; clamped to [`MAX_PAGE_SIZE`].
    pub page_size: u32,
    /// Opaque token from a previous page, if continuing.
    pub page_token: Option<String>,
}

/// One page of a filtered listing.
#[derive(Debug, Clone)]
pub struct EventPage {
    /// The events on this page, in the requested order.
    pub events: Vec<Event>,
    /// Total number of events matching the filter.
    pub total_count: i64,
    /// Whether a later page exists.
    pub has_next: bool,
    /// Whether an earlier page exists.
    pub has_prev: bool,
    /// Token for the next page, when `has_next`.
    pub next_token: Option<String>,
    /// Token for the previous page, when `has_prev`.
    pub prev_token: Option<String>,
}

/// The append-only, per-campaign-sequenced, content-hashed event journal.
///
/// Sequence and hash assignment is atomic with respect to concurrent
/// appends for the same campaign; callers never observe a gap or a
/// duplicate. How a backend guarantees that (lock, transaction, optimistic
/// retry) is its own business.
#[async_trait]
pub trait EventJournal: Send + Sync {
    /// Normalizes, assigns sequence + hash, persists, and returns the
    /// stored form.
    ///
    /// # Errors
    ///
    /// `DomainError::Validation` for malformed input (never persisted);
    /// `DomainError::Infrastructure` for storage failures (no partial
    /// effect).
    async fn append(&self, event: Event) -> Result<Event, DomainError>;

    /// Lists events with `sequence > after_seq`, ascending, up to `limit`.
    async fn list_after(
        &self,
        campaign_id: Uuid,
        after_seq: i64,
        limit: u32,
    ) -> Result<Vec<Event>, DomainError>;

    /// Like `list_after`, restricted to a single session.
    async fn list_by_session(
        &self,
        campaign_id: Uuid,
        session_id: Uuid,
        after_seq: i64,
        limit: u32,
    ) -> Result<Vec<Event>, DomainError>;

    /// The campaign's latest assigned sequence; 0 when the journal is empty.
    async fn latest_seq(&self, campaign_id: Uuid) -> Result<i64, DomainError>;

    /// Filtered, ordered, cursor-paginated listing.
    ///
    /// # Errors
    ///
    /// `DomainError::InvalidArgument` when the page token is malformed or
    /// was issued under a different filter/order.
    async fn list_page(&self, request: &EventPageRequest) -> Result<EventPage, DomainError>;

    /// Point lookup by content hash.
    async fn get_by_hash(&self, campaign_id: Uuid, hash: &str) -> Result<Event, DomainError>;

    /// Point lookup by sequence number.
    async fn get_by_seq(&self, campaign_id: Uuid, seq: i64) -> Result<Event, DomainError>;
}
