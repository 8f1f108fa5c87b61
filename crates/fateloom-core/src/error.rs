//! Domain error types.

use std::fmt::Display;

use thiserror::Error;
use uuid::Uuid;

use crate::campaign::{CampaignOperation, CampaignStatus};

/// Top-level domain error type.
///
/// Validation and precondition failures are local and never reach storage;
/// storage failures are wrapped with operation context and surfaced as
/// opaque infrastructure errors.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed or missing input; rejected before any storage access.
    #[error("validation error: {0}")]
    Validation(String),

    /// A caller-supplied argument (cursor token, page size) is unusable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity that was looked up.
        entity: &'static str,
        /// The identifier that failed to resolve.
        id: String,
    },

    /// The request was well formed but the current state forbids it.
    #[error("precondition failed: {0}")]
    FailedPrecondition(String),

    /// A campaign-shape mutation was attempted while a session is running.
    #[error("campaign has an active session: {session_id}")]
    SessionActive {
        /// The session that is still running.
        session_id: Uuid,
    },

    /// A campaign status transition outside the allowed state machine.
    #[error("campaign status {from} disallows transition to {to}")]
    InvalidStatusTransition {
        /// The campaign's current status.
        from: CampaignStatus,
        /// The attempted target status.
        to: CampaignStatus,
    },

    /// An operation the campaign's current status does not permit.
    #[error("campaign status {status} disallows {operation}")]
    OperationDisallowed {
        /// The attempted operation.
        operation: CampaignOperation,
        /// The campaign's current status.
        status: CampaignStatus,
    },

    /// An exposed operation that has no implementation yet.
    #[error("not implemented: {0}")]
    Unimplemented(&'static str),

    /// An infrastructure/persistence error, wrapped with operation context.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Stable machine-readable code for the boundary layer.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::NotFound { .. } => "not_found",
            Self::FailedPrecondition(_) => "failed_precondition",
            Self::SessionActive { .. } => "session_active",
            Self::InvalidStatusTransition { .. } => "invalid_status_transition",
            Self::OperationDisallowed { .. } => "operation_disallowed",
            Self::Unimplemented(_) => "unimplemented",
            Self::Infrastructure(_) => "infrastructure_error",
        }
    }

    /// Wraps a storage-layer failure with the name of the failing operation.
    pub fn storage(operation: &str, source: impl Display) -> Self {
        Self::Infrastructure(format!("{operation}: {source}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(DomainError::Validation("x".into()).code(), "validation_error");
        assert_eq!(
            DomainError::InvalidStatusTransition {
                from: CampaignStatus::Archived,
                to: CampaignStatus::Active,
            }
            .code(),
            "invalid_status_transition"
        );
        assert_eq!(
            DomainError::SessionActive {
                session_id: Uuid::nil()
            }
            .code(),
            "session_active"
        );
    }

    #[test]
    fn test_transition_error_names_both_statuses() {
        let message = DomainError::InvalidStatusTransition {
            from: CampaignStatus::Archived,
            to: CampaignStatus::Active,
        }
        .to_string();
        assert!(message.contains("archived"));
        assert!(message.contains("active"));
    }

    #[test]
    fn test_storage_wraps_operation_context() {
        let err = DomainError::storage("append event", "connection refused");
        assert_eq!(
            err.to_string(),
            "infrastructure error: append event: connection refused"
        );
    }
}
