//! PostgreSQL journal backend.
//!
//! Sequence assignment is optimistic: read the latest sequence, insert at
//! the next slot, and retry on the `(campaign_id, sequence)` unique
//! violation a concurrent append causes. Bounded retries keep contention
//! failures visible instead of spinning forever.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use fateloom_core::error::DomainError;
use fateloom_core::event::Event;
use fateloom_core::journal::{
    EventFilter, EventJournal, EventOrder, EventPage, EventPageRequest,
};

use crate::cursor::{Cursor, CursorDirection, clamp_page_size, decode_cursor, page_tokens};
use crate::hash::content_hash;
use crate::normalize::normalize_for_append;

const MAX_APPEND_ATTEMPTS: u32 = 5;

const EVENT_COLUMNS: &str = "campaign_id, sequence, hash, event_type, occurred_at, session_id, \
                             request_id, invocation_id, actor_type, actor_id, entity_type, \
                             entity_id, payload";

/// PostgreSQL-backed event journal.
#[derive(Debug, Clone)]
pub struct PgJournal {
    pool: PgPool,
}

impl PgJournal {
    /// Creates a new `PgJournal` over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Every campaign id present in the journal; used for the startup
    /// projection rebuild.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` on query failure.
    pub async fn campaign_ids(&self) -> Result<Vec<Uuid>, DomainError> {
        let rows = sqlx::query("SELECT DISTINCT campaign_id FROM campaign_events")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage("list campaigns", e))?;
        rows.iter()
            .map(|row| {
                row.try_get("campaign_id")
                    .map_err(|e| DomainError::storage("list campaigns", e))
            })
            .collect()
    }
}

fn row_to_event(row: &PgRow) -> Result<Event, DomainError> {
    let decode = |e: sqlx::Error| DomainError::storage("decode event row", e);
    let actor_type: String = row.try_get("actor_type").map_err(decode)?;
    let hash: String = row.try_get("hash").map_err(decode)?;
    Ok(Event {
        campaign_id: row.try_get("campaign_id").map_err(decode)?,
        sequence: row.try_get("sequence").map_err(decode)?,
        // CHAR(32) comes back space-padded when shorter than the column.
        hash: hash.trim_end().to_owned(),
        event_type: row.try_get("event_type").map_err(decode)?,
        occurred_at: row.try_get("occurred_at").map_err(decode)?,
        session_id: row.try_get("session_id").map_err(decode)?,
        request_id: row.try_get("request_id").map_err(decode)?,
        invocation_id: row.try_get("invocation_id").map_err(decode)?,
        actor_type: actor_type.parse()?,
        actor_id: row.try_get("actor_id").map_err(decode)?,
        entity_type: row.try_get("entity_type").map_err(decode)?,
        entity_id: row.try_get("entity_id").map_err(decode)?,
        payload: row.try_get::<Value, _>("payload").map_err(decode)?,
    })
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &EventFilter) {
    if !filter.event_types.is_empty() {
        builder.push(" AND event_type IN (");
        let mut separated = builder.separated(", ");
        for event_type in &filter.event_types {
            separated.push_bind(event_type.clone());
        }
        builder.push(")");
    }
    if let Some(session_id) = filter.session_id {
        builder.push(" AND session_id = ");
        builder.push_bind(session_id);
    }
    if let Some(actor_type) = filter.actor_type {
        builder.push(" AND actor_type = ");
        builder.push_bind(actor_type.as_str());
    }
    if let Some(domain) = &filter.domain {
        builder.push(" AND split_part(event_type, '.', 1) = ");
        builder.push_bind(domain.clone());
    }
}

#[async_trait]
impl EventJournal for PgJournal {
    async fn append(&self, event: Event) -> Result<Event, DomainError> {
        let event = normalize_for_append(event)?;
        for attempt in 1..=MAX_APPEND_ATTEMPTS {
            let mut stored = event.clone();
            stored.sequence = self.latest_seq(stored.campaign_id).await? + 1;
            stored.hash = content_hash(&stored);

            let result = sqlx::query(
                "INSERT INTO campaign_events (campaign_id, sequence, hash, event_type, \
                 occurred_at, session_id, request_id, invocation_id, actor_type, actor_id, \
                 entity_type, entity_id, payload) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
            )
            .bind(stored.campaign_id)
            .bind(stored.sequence)
            .bind(&stored.hash)
            .bind(&stored.event_type)
            .bind(stored.occurred_at)
            .bind(stored.session_id)
            .bind(&stored.request_id)
            .bind(&stored.invocation_id)
            .bind(stored.actor_type.as_str())
            .bind(&stored.actor_id)
            .bind(&stored.entity_type)
            .bind(&stored.entity_id)
            .bind(&stored.payload)
            .execute(&self.pool)
            .await;

            match result {
                Ok(_) => return Ok(stored),
                Err(e) if is_unique_violation(&e) => {
                    tracing::debug!(
                        campaign_id = %stored.campaign_id,
                        sequence = stored.sequence,
                        attempt,
                        "append lost the sequence race, retrying"
                    );
                }
                Err(e) => return Err(DomainError::storage("append event", e)),
            }
        }
        Err(DomainError::Infrastructure(
            "append event: sequence contention retries exhausted".into(),
        ))
    }

    async fn list_after(
        &self,
        campaign_id: Uuid,
        after_seq: i64,
        limit: u32,
    ) -> Result<Vec<Event>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM campaign_events \
             WHERE campaign_id = $1 AND sequence > $2 ORDER BY sequence ASC LIMIT $3"
        ))
        .bind(campaign_id)
        .bind(after_seq)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage("list events", e))?;
        rows.iter().map(row_to_event).collect()
    }

    async fn list_by_session(
        &self,
        campaign_id: Uuid,
        session_id: Uuid,
        after_seq: i64,
        limit: u32,
    ) -> Result<Vec<Event>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM campaign_events \
             WHERE campaign_id = $1 AND session_id = $2 AND sequence > $3 \
             ORDER BY sequence ASC LIMIT $4"
        ))
        .bind(campaign_id)
        .bind(session_id)
        .bind(after_seq)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage("list session events", e))?;
        rows.iter().map(row_to_event).collect()
    }

    async fn latest_seq(&self, campaign_id: Uuid) -> Result<i64, DomainError> {
        let row = sqlx::query(
            "SELECT COALESCE(MAX(sequence), 0) AS latest FROM campaign_events \
             WHERE campaign_id = $1",
        )
        .bind(campaign_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::storage("latest sequence", e))?;
        row.try_get("latest")
            .map_err(|e| DomainError::storage("latest sequence", e))
    }

    async fn list_page(&self, request: &EventPageRequest) -> Result<EventPage, DomainError> {
        let cursor = decode_cursor(request)?;
        let page_size = clamp_page_size(request.page_size);

        let mut count_builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) AS total FROM campaign_events WHERE campaign_id = ");
        count_builder.push_bind(request.campaign_id);
        push_filter(&mut count_builder, &request.filter);
        let total_count: i64 = count_builder
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage("count event page", e))?
            .try_get("total")
            .map_err(|e| DomainError::storage("count event page", e))?;

        let ascending = request.order == EventOrder::SeqAsc;
        // Backward tokens fetch in inverted order, then flip the rows.
        let inverted = matches!(
            &cursor,
            Some(Cursor {
                direction: CursorDirection::Backward,
                ..
            })
        );

        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT {EVENT_COLUMNS} FROM campaign_events WHERE campaign_id = "
        ));
        builder.push_bind(request.campaign_id);
        push_filter(&mut builder, &request.filter);
        if let Some(c) = &cursor {
            let beyond_boundary = match (ascending, c.direction) {
                (true, CursorDirection::Forward) | (false, CursorDirection::Backward) => {
                    " AND sequence > "
                }
                (false, CursorDirection::Forward) | (true, CursorDirection::Backward) => {
                    " AND sequence < "
                }
            };
            builder.push(beyond_boundary);
            builder.push_bind(c.seq);
        }
        let fetch_ascending = ascending != inverted;
        builder.push(if fetch_ascending {
            " ORDER BY sequence ASC LIMIT "
        } else {
            " ORDER BY sequence DESC LIMIT "
        });
        builder.push_bind(i64::try_from(page_size + 1).unwrap_or(i64::MAX));

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage("list event page", e))?;
        let mut events: Vec<Event> = rows
            .iter()
            .map(row_to_event)
            .collect::<Result<_, _>>()?;

        let overflow = events.len() > page_size;
        if overflow {
            events.truncate(page_size);
        }
        let (has_next, has_prev) = if inverted {
            // A backward token was issued from the first row of a later page,
            // so something always exists past the boundary.
            events.reverse();
            (true, overflow)
        } else {
            // A forward token was issued from the last row of an earlier page.
            (overflow, cursor.is_some())
        };

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
        let row = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM campaign_events \
             WHERE campaign_id = $1 AND hash = $2"
        ))
        .bind(campaign_id)
        .bind(hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage("get event by hash", e))?;
        row.as_ref()
            .map(row_to_event)
            .transpose()?
            .ok_or_else(|| DomainError::NotFound {
                entity: "event",
                id: format!("{campaign_id}/{hash}"),
            })
    }

    async fn get_by_seq(&self, campaign_id: Uuid, seq: i64) -> Result<Event, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM campaign_events \
             WHERE campaign_id = $1 AND sequence = $2"
        ))
        .bind(campaign_id)
        .bind(seq)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage("get event by sequence", e))?;
        row.as_ref()
            .map(row_to_event)
            .transpose()?
            .ok_or_else(|| DomainError::NotFound {
                entity: "event",
                id: format!("{campaign_id}/{seq}"),
            })
    }
}
