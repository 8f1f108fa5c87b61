//! The replay engine.
//!
//! Walks a campaign's journal in order and feeds each event to an applier,
//! paginating internally. Used to reconstruct projections from scratch
//! (startup, fork) and for narrow snapshot-only catch-ups.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use fateloom_core::error::DomainError;
use fateloom_core::event::Event;
use fateloom_core::journal::EventJournal;

use crate::applier::Applier;

/// Internal page size for journal walks.
const REPLAY_PAGE_SIZE: u32 = 200;

/// Predicate deciding whether an event is applied during a bounded replay.
pub type EventPredicate = dyn Fn(&Event) -> bool + Send + Sync;

/// A replay aborted partway; `last_seq` is the last sequence that was
/// fully processed, so the caller can resume or report partial progress.
#[derive(Debug, Error)]
#[error("replay aborted after sequence {last_seq}: {source}")]
pub struct ReplayError {
    /// Last successfully-processed sequence.
    pub last_seq: i64,
    /// What stopped the walk.
    #[source]
    pub source: DomainError,
}

/// Drives an applier over a slice of a campaign's journal.
#[derive(Clone)]
pub struct Replayer {
    journal: Arc<dyn EventJournal>,
    applier: Applier,
}

impl Replayer {
    /// Creates a replayer over the given journal and applier.
    #[must_use]
    pub fn new(journal: Arc<dyn EventJournal>, applier: Applier) -> Self {
        Self { journal, applier }
    }

    /// Replays the campaign's entire journal. Returns the last sequence seen.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError`] when listing or applying fails; no automatic
    /// retry.
    pub async fn replay_all(&self, campaign_id: Uuid) -> Result<i64, ReplayError> {
        self.replay_bounded(campaign_id, 0, None, None).await
    }

    /// Replays events with `after_seq < sequence <= until_seq`.
    ///
    /// A `filter` predicate skips events without stopping the walk; an
    /// `until_seq` bound stops the walk (inclusive) without erroring.
    /// Returns the last sequence seen, skipped events included.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError`] when listing or applying fails; no automatic
    /// retry.
    pub async fn replay_bounded(
        &self,
        campaign_id: Uuid,
        after_seq: i64,
        until_seq: Option<i64>,
        filter: Option<&EventPredicate>,
    ) -> Result<i64, ReplayError> {
        let mut last_seq = after_seq;
        loop {
            let page = self
                .journal
                .list_after(campaign_id, last_seq, REPLAY_PAGE_SIZE)
                .await
                .map_err(|source| ReplayError { last_seq, source })?;
            if page.is_empty() {
                return Ok(last_seq);
            }
            for event in page {
                if let Some(until) = until_seq
                    && event.sequence > until
                {
                    return Ok(last_seq);
                }
                if let Some(predicate) = filter
                    && !predicate(&event)
                {
                    last_seq = event.sequence;
                    continue;
                }
                self.applier
                    .apply(&event)
                    .await
                    .map_err(|source| ReplayError { last_seq, source })?;
                last_seq = event.sequence;
            }
        }
    }
}
