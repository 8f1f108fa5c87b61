//! Content hashing for journal events.

use std::fmt::Write as _;

use chrono::SecondsFormat;
use fateloom_core::event::Event;
use sha2::{Digest, Sha256};

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        // Writing to a String cannot fail.
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Deterministic digest over an event's canonical fields, truncated to
/// 128 bits (32 lowercase hex chars). Computed after sequence assignment;
/// the sequence is part of the hashed content.
#[must_use]
pub fn content_hash(event: &Event) -> String {
    let mut hasher = Sha256::new();
    for field in [
        event.campaign_id.to_string(),
        event.sequence.to_string(),
        event.event_type.clone(),
        event
            .occurred_at
            .to_rfc3339_opts(SecondsFormat::Micros, true),
        event
            .session_id
            .map_or_else(String::new, |id| id.to_string()),
        event.actor_type.as_str().to_owned(),
        event.actor_id.clone().unwrap_or_default(),
        event.entity_type.clone().unwrap_or_default(),
        event.entity_id.clone().unwrap_or_default(),
        event.payload.to_string(),
    ] {
        hasher.update(field.as_bytes());
        hasher.update(b"\n");
    }
    to_hex(&hasher.finalize()[..16])
}

/// 64-bit digest of a canonical filter/order string (16 lowercase hex
/// chars), used to bind cursors to the listing they were issued under.
#[must_use]
pub fn short_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    to_hex(&digest[..8])
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use fateloom_core::event::ActorType;
    use uuid::Uuid;

    use super::*;

    fn event(seq: i64) -> Event {
        let t = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let mut e = Event::new(
            Uuid::from_u128(1),
            "participant.joined",
            t,
            ActorType::Participant,
        );
        e.actor_id = Some("p-1".to_owned());
        e.sequence = seq;
        e
    }

    #[test]
    fn test_content_hash_is_deterministic_and_128_bits() {
        let a = content_hash(&event(1));
        let b = content_hash(&event(1));
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_content_hash_covers_the_sequence() {
        assert_ne!(content_hash(&event(1)), content_hash(&event(2)));
    }

    #[test]
    fn test_content_hash_covers_the_payload() {
        let mut changed = event(1);
        changed.payload = serde_json::json!({"display_name": "Tam"});
        assert_ne!(content_hash(&event(1)), content_hash(&changed));
    }

    #[test]
    fn test_short_hash_is_64_bits() {
        let digest = short_hash("types=;session=;actor=;domain=");
        assert_eq!(digest.len(), 16);
        assert_ne!(digest, short_hash("types=;session=;actor=;domain=chronicle"));
    }
}
