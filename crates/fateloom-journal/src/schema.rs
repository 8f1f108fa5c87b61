//! Journal database schema.

/// SQL to create the events table and its lookup indexes.
///
/// The `(campaign_id, sequence)` primary key is what makes optimistic
/// sequence assignment safe: a concurrent append racing for the same slot
/// hits a unique violation and retries.
pub const CREATE_EVENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS campaign_events (
    campaign_id   UUID NOT NULL,
    sequence      BIGINT NOT NULL,
    hash          CHAR(32) NOT NULL,
    event_type    VARCHAR(255) NOT NULL,
    occurred_at   TIMESTAMPTZ NOT NULL,
    session_id    UUID,
    request_id    VARCHAR(255),
    invocation_id VARCHAR(255),
    actor_type    VARCHAR(32) NOT NULL,
    actor_id      VARCHAR(255),
    entity_type   VARCHAR(64),
    entity_id     VARCHAR(255),
    payload       JSONB NOT NULL,
    PRIMARY KEY (campaign_id, sequence)
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_campaign_events_hash
    ON campaign_events (campaign_id, hash);

CREATE INDEX IF NOT EXISTS idx_campaign_events_session
    ON campaign_events (campaign_id, session_id, sequence);
";
