//! Opaque pagination tokens for the filtered event-listing path.
//!
//! A cursor binds the boundary sequence, traversal direction, and digests
//! of the filter/order it was issued under. Tokens presented against a
//! different filter or ordering are rejected, never reinterpreted.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use fateloom_core::error::DomainError;
use fateloom_core::event::Event;
use fateloom_core::journal::{DEFAULT_PAGE_SIZE, EventPageRequest, MAX_PAGE_SIZE};

use crate::hash::short_hash;

/// Which way a token walks the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorDirection {
    /// Continue past the boundary in listing order.
    Forward,
    /// Fetch the page preceding the boundary.
    Backward,
}

/// Decoded pagination token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Boundary sequence number.
    pub seq: i64,
    /// Traversal direction relative to the boundary.
    pub direction: CursorDirection,
    /// Whether the backend fetched rows in inverted order for this token.
    pub reversed: bool,
    /// Digest of the canonical filter string at issue time.
    pub filter_hash: String,
    /// Digest of the canonical order string at issue time.
    pub order_hash: String,
}

impl Cursor {
    /// Builds a cursor bound to the given canonical filter/order strings.
    #[must_use]
    pub fn new(
        seq: i64,
        direction: CursorDirection,
        reversed: bool,
        filter_canonical: &str,
        order_canonical: &str,
    ) -> Self {
        Self {
            seq,
            direction,
            reversed,
            filter_hash: short_hash(filter_canonical),
            order_hash: short_hash(order_canonical),
        }
    }

    /// Encodes this cursor as an opaque token.
    #[must_use]
    pub fn encode(&self) -> String {
        // Serialization of a plain struct to JSON is infallible.
        let bytes = serde_json::to_vec(self).expect("cursor serialization is infallible");
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Decodes an opaque token.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidArgument` for anything that is not a
    /// token this codec produced.
    pub fn decode(token: &str) -> Result<Self, DomainError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| DomainError::InvalidArgument("malformed page token".into()))?;
        serde_json::from_slice(&bytes)
            .map_err(|_| DomainError::InvalidArgument("malformed page token".into()))
    }

    /// Rejects the cursor when the caller's filter changed since issue.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidArgument` on a filter mismatch.
    pub fn validate_filter(&self, filter_canonical: &str) -> Result<(), DomainError> {
        if self.filter_hash == short_hash(filter_canonical) {
            return Ok(());
        }
        Err(DomainError::InvalidArgument(
            "page token was issued under a different filter".into(),
        ))
    }

    /// Rejects the cursor when the caller's ordering changed since issue.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidArgument` on an order mismatch.
    pub fn validate_order(&self, order_canonical: &str) -> Result<(), DomainError> {
        if self.order_hash == short_hash(order_canonical) {
            return Ok(());
        }
        Err(DomainError::InvalidArgument(
            "page token was issued under a different ordering".into(),
        ))
    }
}

pub(crate) fn clamp_page_size(requested: u32) -> usize {
    let size = if requested == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        requested.min(MAX_PAGE_SIZE)
    };
    size as usize
}

/// Decodes and validates a listing request's page token, if any.
pub(crate) fn decode_cursor(request: &EventPageRequest) -> Result<Option<Cursor>, DomainError> {
    let Some(token) = &request.page_token else {
        return Ok(None);
    };
    let cursor = Cursor::decode(token)?;
    cursor.validate_filter(&request.filter.canonical())?;
    cursor.validate_order(request.order.canonical())?;
    Ok(Some(cursor))
}

/// Builds next/prev tokens for a served page.
pub(crate) fn page_tokens(
    events: &[Event],
    has_next: bool,
    has_prev: bool,
    filter_canonical: &str,
    order_canonical: &str,
) -> (Option<String>, Option<String>) {
    let next_token = match (has_next, events.last()) {
        (true, Some(last)) => Some(
            Cursor::new(
                last.sequence,
                CursorDirection::Forward,
                false,
                filter_canonical,
                order_canonical,
            )
            .encode(),
        ),
        _ => None,
    };
    let prev_token = match (has_prev, events.first()) {
        (true, Some(first)) => Some(
            Cursor::new(
                first.sequence,
                CursorDirection::Backward,
                true,
                filter_canonical,
                order_canonical,
            )
            .encode(),
        ),
        _ => None,
    };
    (next_token, prev_token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_round_trip() {
        let cursor = Cursor::new(
            42,
            CursorDirection::Forward,
            false,
            "types=;session=;actor=;domain=",
            "seq asc",
        );
        let decoded = Cursor::decode(&cursor.encode()).unwrap();
        assert_eq!(decoded, cursor);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            Cursor::decode("not a token!"),
            Err(DomainError::InvalidArgument(_))
        ));
        let not_json = URL_SAFE_NO_PAD.encode(b"plain text");
        assert!(matches!(
            Cursor::decode(&not_json),
            Err(DomainError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_validate_rejects_changed_filter() {
        let cursor = Cursor::new(
            7,
            CursorDirection::Forward,
            false,
            "types=;session=;actor=;domain=",
            "seq asc",
        );
        assert!(cursor.validate_filter("types=;session=;actor=;domain=").is_ok());
        assert!(matches!(
            cursor.validate_filter("types=;session=;actor=;domain=chronicle"),
            Err(DomainError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_validate_rejects_changed_order() {
        let cursor = Cursor::new(7, CursorDirection::Backward, true, "f", "seq asc");
        assert!(cursor.validate_order("seq asc").is_ok());
        assert!(matches!(
            cursor.validate_order("seq desc"),
            Err(DomainError::InvalidArgument(_))
        ));
    }
}
