//! In-memory journal backend.
//!
//! The single-process backend: appends for a campaign serialize behind one
//! mutex, which is what makes sequence/hash assignment atomic. Every test
//! in the workspace runs against this implementation; it shares the
//! normalization, hashing, and cursor code with the PostgreSQL backend.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use fateloom_core::error::DomainError;
use fateloom_core::event::Event;
use fateloom_core::journal::{EventJournal, EventOrder, EventPage, EventPageRequest};

use crate::cursor::{CursorDirection, clamp_page_size, decode_cursor, page_tokens};
use crate::hash::content_hash;
use crate::normalize::normalize_for_append;

/// Journal state held entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryJournal {
    campaigns: Mutex<HashMap<Uuid, Vec<Event>>>,
}

impl MemoryJournal {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Whether `seq` sorts strictly before `boundary` in the given order.
fn strictly_before(order: EventOrder, seq: i64, boundary: i64) -> bool {
    match order {
        EventOrder::SeqAsc => seq < boundary,
        EventOrder::SeqDesc => seq > boundary,
    }
}

fn at_or_before(order: EventOrder, seq: i64, boundary: i64) -> bool {
    seq == boundary || strictly_before(order, seq, boundary)
}

#[async_trait]
impl EventJournal for MemoryJournal {
    async fn append(&self, event: Event) -> Result<Event, DomainError> {
        let mut stored = normalize_for_append(event)?;
        let mut campaigns = self
            .campaigns
            .lock()
            .map_err(|_| DomainError::storage("append event", "journal lock poisoned"))?;
        let log = campaigns.entry(stored.campaign_id).or_default();
        stored.sequence = i64::try_from(log.len())
            .map_err(|_| DomainError::storage("append event", "sequence overflow"))?
            + 1;
        stored.hash = content_hash(&stored);
        log.push(stored.clone());
        Ok(stored)
    }

    async fn list_after(
        &self,
        campaign_id: Uuid,
        after_seq: i64,
        limit: u32,
    ) -> Result<Vec<Event>, DomainError> {
        let campaigns = self
            .campaigns
            .lock()
            .map_err(|_| DomainError::storage("list events", "journal lock poisoned"))?;
        let Some(log) = campaigns.get(&campaign_id) else {
            return Ok(Vec::new());
        };
        Ok(log
            .iter()
            .filter(|e| e.sequence > after_seq)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn list_by_session(
        &self,
        campaign_id: Uuid,
        session_id: Uuid,
        after_seq: i64,
        limit: u32,
    ) -> Result<Vec<Event>, DomainError> {
        let campaigns = self
            .campaigns
            .lock()
            .map_err(|_| DomainError::storage("list session events", "journal lock poisoned"))?;
        let Some(log) = campaigns.get(&campaign_id) else {
            return Ok(Vec::new());
        };
        Ok(log
            .iter()
            .filter(|e| e.session_id == Some(session_id) && e.sequence > after_seq)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn latest_seq(&self, campaign_id: Uuid) -> Result<i64, DomainError> {
        let campaigns = self
            .campaigns
            .lock()
            .map_err(|_| DomainError::storage("latest sequence", "journal lock poisoned"))?;
        let len = campaigns.get(&campaign_id).map_or(0, Vec::len);
        i64::try_from(len).map_err(|_| DomainError::storage("latest sequence", "sequence overflow"))
    }

    async fn list_page(&self, request: &EventPageRequest) -> Result<EventPage, DomainError> {
        let cursor = decode_cursor(request)?;
        let page_size = clamp_page_size(request.page_size);

        let campaigns = self
            .campaigns
            .lock()
            .map_err(|_| DomainError::storage("list event page", "journal lock poisoned"))?;
        let mut matched: Vec<Event> = campaigns
            .get(&request.campaign_id)
            .map(|log| {
                log.iter()
                    .filter(|e| request.filter.matches(e))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if request.order == EventOrder::SeqDesc {
            matched.reverse();
        }
        let total_count = i64::try_from(matched.len())
            .map_err(|_| DomainError::storage("list event page", "count overflow"))?;

        let (start, end) = match &cursor {
            None => (0, page_size.min(matched.len())),
            Some(c) => match c.direction {
                CursorDirection::Forward => {
                    let start = matched
                        .partition_point(|e| at_or_before(request.order, e.sequence, c.seq));
                    (start, (start + page_size).min(matched.len()))
                }
                CursorDirection::Backward => {
                    let end = matched
                        .partition_point(|e| strictly_before(request.order, e.sequence, c.seq));
                    (end.saturating_sub(page_size), end)
                }
            },
        };
        let events: Vec<Event> = matched[start..end].to_vec();

        let has_prev = start > 0;
        let has_next = end < matched.len();
        let (next_token, prev_token) = page_tokens(
            &events,
            has_next,
            has_prev,
            &request.filter.canonical(),
            request.order.canonical(),
        );

        Ok(EventPage {
            events,
            total_count,
            has_next,
            has_prev,
            next_token,
            prev_token,
        })
    }

    async fn get_by_hash(&self, campaign_id: Uuid, hash: &str) -> Result<Event, DomainError> {
        let campaigns = self
            .campaigns
            .lock()
            .map_err(|_| DomainError::storage("get event by hash", "journal lock poisoned"))?;
        campaigns
            .get(&campaign_id)
            .and_then(|log| log.iter().find(|e| e.hash == hash))
            .cloned()
            .ok_or_else(|| DomainError::NotFound {
                entity: "event",
                id: format!("{campaign_id}/{hash}"),
            })
    }

    async fn get_by_seq(&self, campaign_id: Uuid, seq: i64) -> Result<Event, DomainError> {
        let campaigns = self
            .campaigns
            .lock()
            .map_err(|_| DomainError::storage("get event by sequence", "journal lock poisoned"))?;
        campaigns
            .get(&campaign_id)
            .and_then(|log| {
                usize::try_from(seq.checked_sub(1)?)
                    .ok()
                    .and_then(|idx| log.get(idx))
            })
            .cloned()
            .ok_or_else(|| DomainError::NotFound {
                entity: "event",
                id: format!("{campaign_id}/{seq}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use fateloom_core::event::ActorType;
    use fateloom_core::journal::EventFilter;
    use serde_json::json;

    use super::*;

    fn campaign_id() -> Uuid {
        Uuid::from_u128(0xC0FFEE)
    }

    fn draft_event(event_type: &str) -> Event {
        let t = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        Event::new(campaign_id(), event_type, t, ActorType::System)
    }

    async fn seeded_journal(count: i64) -> MemoryJournal {
        let journal = MemoryJournal::new();
        for i in 1..=count {
            let mut event = draft_event("chronicle.gm_fear_changed");
            event.payload = json!({"fear": i});
            journal.append(event).await.unwrap();
        }
        journal
    }

    #[tokio::test]
    async fn test_append_assigns_gapless_sequences_from_one() {
        let journal = seeded_journal(3).await;
        let events = journal.list_after(campaign_id(), 0, 10).await.unwrap();
        let seqs: Vec<i64> = events.iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        assert!(events.iter().all(Event::is_assigned));
    }

    #[tokio::test]
    async fn test_append_rejects_preassigned_sequence() {
        let journal = MemoryJournal::new();
        let mut event = draft_event("session.started");
        event.sequence = 9;
        assert!(matches!(
            journal.append(event).await,
            Err(DomainError::Validation(_))
        ));
        assert_eq!(journal.latest_seq(campaign_id()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_appends_stay_gapless_and_duplicate_free() {
        let journal = Arc::new(MemoryJournal::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let journal = Arc::clone(&journal);
            handles.push(tokio::spawn(async move {
                for _ in 0..25 {
                    journal
                        .append(draft_event("chronicle.gm_fear_changed"))
                        .await
                        .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(journal.latest_seq(campaign_id()).await.unwrap(), 200);
        let events = journal.list_after(campaign_id(), 0, 500).await.unwrap();
        let seqs: HashSet<i64> = events.iter().map(|e| e.sequence).collect();
        assert_eq!(seqs.len(), 200);
        assert_eq!(seqs.iter().min(), Some(&1));
        assert_eq!(seqs.iter().max(), Some(&200));
    }

    #[tokio::test]
    async fn test_list_after_is_exclusive_and_bounded() {
        let journal = seeded_journal(5).await;
        let events = journal.list_after(campaign_id(), 2, 2).await.unwrap();
        let seqs: Vec<i64> = events.iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![3, 4]);
    }

    #[tokio::test]
    async fn test_list_by_session_filters_and_respects_bound() {
        let journal = MemoryJournal::new();
        let session = Uuid::from_u128(7);
        for i in 0..4 {
            let mut event = draft_event("chronicle.gm_fear_changed");
            if i % 2 == 0 {
                event.session_id = Some(session);
            }
            journal.append(event).await.unwrap();
        }

        let events = journal
            .list_by_session(campaign_id(), session, 0, 10)
            .await
            .unwrap();
        let seqs: Vec<i64> = events.iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![1, 3]);

        let after = journal
            .list_by_session(campaign_id(), session, 1, 10)
            .await
            .unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].sequence, 3);
    }

    #[tokio::test]
    async fn test_point_lookups_are_repeatable() {
        let journal = seeded_journal(3).await;
        let second = journal.get_by_seq(campaign_id(), 2).await.unwrap();

        let by_hash_a = journal
            .get_by_hash(campaign_id(), &second.hash)
            .await
            .unwrap();
        let by_hash_b = journal
            .get_by_hash(campaign_id(), &second.hash)
            .await
            .unwrap();
        assert_eq!(by_hash_a, by_hash_b);
        assert_eq!(by_hash_a, second);

        assert!(matches!(
            journal.get_by_seq(campaign_id(), 99).await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            journal.get_by_hash(campaign_id(), "0000").await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_page_walks_forward_with_tokens() {
        let journal = seeded_journal(5).await;
        let mut request = EventPageRequest {
            campaign_id: campaign_id(),
            filter: EventFilter::default(),
            order: EventOrder::SeqAsc,
            page_size: 2,
            page_token: None,
        };

        let first = journal.list_page(&request).await.unwrap();
        assert_eq!(first.total_count, 5);
        assert_eq!(
            first.events.iter().map(|e| e.sequence).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert!(first.has_next);
        assert!(!first.has_prev);

        request.page_token = first.next_token;
        let second = journal.list_page(&request).await.unwrap();
        assert_eq!(
            second.events.iter().map(|e| e.sequence).collect::<Vec<_>>(),
            vec![3, 4]
        );
        assert!(second.has_next);
        assert!(second.has_prev);

        request.page_token = second.next_token;
        let third = journal.list_page(&request).await.unwrap();
        assert_eq!(
            third.events.iter().map(|e| e.sequence).collect::<Vec<_>>(),
            vec![5]
        );
        assert!(!third.has_next);
        assert!(third.has_prev);
    }

    #[tokio::test]
    async fn test_list_page_walks_back_with_prev_token() {
        let journal = seeded_journal(5).await;
        let mut request = EventPageRequest {
            campaign_id: campaign_id(),
            filter: EventFilter::default(),
            order: EventOrder::SeqAsc,
            page_size: 2,
            page_token: None,
        };

        let first = journal.list_page(&request).await.unwrap();
        request.page_token = first.next_token;
        let second = journal.list_page(&request).await.unwrap();

        request.page_token = second.prev_token;
        let back = journal.list_page(&request).await.unwrap();
        assert_eq!(
            back.events.iter().map(|e| e.sequence).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert!(!back.has_prev);
        assert!(back.has_next);
    }

    #[tokio::test]
    async fn test_list_page_descending_order() {
        let journal = seeded_journal(4).await;
        let request = EventPageRequest {
            campaign_id: campaign_id(),
            filter: EventFilter::default(),
            order: EventOrder::SeqDesc,
            page_size: 3,
            page_token: None,
        };
        let page = journal.list_page(&request).await.unwrap();
        assert_eq!(
            page.events.iter().map(|e| e.sequence).collect::<Vec<_>>(),
            vec![4, 3, 2]
        );
        assert!(page.has_next);
    }

    #[tokio::test]
    async fn test_list_page_rejects_token_issued_under_other_filter() {
        let journal = seeded_journal(5).await;
        let mut request = EventPageRequest {
            campaign_id: campaign_id(),
            filter: EventFilter::default(),
            order: EventOrder::SeqAsc,
            page_size: 2,
            page_token: None,
        };
        let first = journal.list_page(&request).await.unwrap();

        request.page_token = first.next_token;
        request.filter = EventFilter {
            domain: Some("participant".to_owned()),
            ..EventFilter::default()
        };
        assert!(matches!(
            journal.list_page(&request).await,
            Err(DomainError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_list_page_rejects_token_issued_under_other_order() {
        let journal = seeded_journal(5).await;
        let mut request = EventPageRequest {
            campaign_id: campaign_id(),
            filter: EventFilter::default(),
            order: EventOrder::SeqAsc,
            page_size: 2,
            page_token: None,
        };
        let first = journal.list_page(&request).await.unwrap();

        request.page_token = first.next_token;
        request.order = EventOrder::SeqDesc;
        assert!(matches!(
            journal.list_page(&request).await,
            Err(DomainError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_list_page_filter_restricts_results_and_count() {
        let journal = MemoryJournal::new();
        for event_type in [
            "participant.joined",
            "chronicle.gm_fear_changed",
            "participant.left",
        ] {
            journal.append(draft_event(event_type)).await.unwrap();
        }

        let request = EventPageRequest {
            campaign_id: campaign_id(),
            filter: EventFilter {
                domain: Some("participant".to_owned()),
                ..EventFilter::default()
            },
            order: EventOrder::SeqAsc,
            page_size: 10,
            page_token: None,
        };
        let page = journal.list_page(&request).await.unwrap();
        assert_eq!(page.total_count, 2);
        assert_eq!(
            page.events.iter().map(|e| e.sequence).collect::<Vec<_>>(),
            vec![1, 3]
        );
    }
}
