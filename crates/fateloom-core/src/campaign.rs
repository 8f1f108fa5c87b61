//! Campaign read model and its status state machine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Lifecycle status of a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    /// Being set up; not yet played.
    Draft,
    /// Open for sessions and gameplay.
    Active,
    /// Finished; history retained.
    Completed,
    /// Shelved; restorable back to draft.
    Archived,
}

impl CampaignStatus {
    /// Returns the lowercase wire name of this status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }

    /// Whether the state machine permits moving from `self` to `to`.
    #[must_use]
    pub fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Draft, Self::Active)
                | (Self::Active, Self::Completed | Self::Archived)
                | (Self::Completed, Self::Archived)
                | (Self::Archived, Self::Draft)
        )
    }

    /// The explicit allow-matrix for campaign operations.
    #[must_use]
    pub fn allows(self, operation: CampaignOperation) -> bool {
        match operation {
            CampaignOperation::Read => true,
            CampaignOperation::SessionStart
            | CampaignOperation::SessionAction
            | CampaignOperation::End => self == Self::Active,
            CampaignOperation::CampaignMutate => matches!(self, Self::Draft | Self::Active),
            CampaignOperation::Archive => matches!(self, Self::Active | Self::Completed),
            CampaignOperation::Restore => self == Self::Archived,
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operations checked against the status allow-matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignOperation {
    /// Any read; always allowed.
    Read,
    /// Starting a new session.
    SessionStart,
    /// In-session gameplay actions.
    SessionAction,
    /// Campaign-shape mutations (participants, characters, metadata).
    CampaignMutate,
    /// Completing the campaign.
    End,
    /// Archiving the campaign.
    Archive,
    /// Restoring an archived campaign to draft.
    Restore,
}

impl CampaignOperation {
    /// Returns the lowercase wire name of this operation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::SessionStart => "session_start",
            Self::SessionAction => "session_action",
            Self::CampaignMutate => "campaign_mutate",
            Self::End => "end",
            Self::Archive => "archive",
            Self::Restore => "restore",
        }
    }
}

impl fmt::Display for CampaignOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the campaign's game master is run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GmMode {
    /// A human game master.
    Human,
    /// An automated game master.
    Automated,
}

/// Campaign read model. Mutated only by the projection applier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    /// Campaign identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// The game system this campaign is played under.
    pub game_system: String,
    /// Lifecycle status.
    pub status: CampaignStatus,
    /// How the game master is run.
    pub gm_mode: GmMode,
    /// Number of joined participants.
    pub participant_count: i64,
    /// Number of created characters.
    pub character_count: i64,
    /// Free-form theme text.
    pub theme: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last record mutation timestamp.
    pub updated_at: DateTime<Utc>,
    /// Timestamp of the latest journal activity.
    pub last_activity_at: DateTime<Utc>,
    /// Set when the campaign completes; cleared on restore.
    pub completed_at: Option<DateTime<Utc>>,
    /// Set when the campaign is archived; cleared on restore.
    pub archived_at: Option<DateTime<Utc>>,
}

impl Campaign {
    /// Checks the allow-matrix for `operation` against the current status.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::OperationDisallowed` when the current status
    /// does not permit the operation.
    pub fn ensure_allows(&self, operation: CampaignOperation) -> Result<(), DomainError> {
        if self.status.allows(operation) {
            return Ok(());
        }
        Err(DomainError::OperationDisallowed {
            operation,
            status: self.status,
        })
    }

    /// Applies a status change without consulting the state machine.
    ///
    /// The projection applier replays already-validated facts, so it must
    /// never re-reject them.
    pub fn apply_status(&mut self, to: CampaignStatus, now: DateTime<Utc>) {
        match to {
            CampaignStatus::Completed => self.completed_at = Some(now),
            CampaignStatus::Archived => self.archived_at = Some(now),
            CampaignStatus::Draft => {
                self.completed_at = None;
                self.archived_at = None;
            }
            CampaignStatus::Active => {}
        }
        self.status = to;
        self.updated_at = now;
    }

    /// Applies a status transition, updating completion/archival timestamps.
    ///
    /// Restoring an archived campaign clears both timestamps.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStatusTransition` when the state machine
    /// forbids the move.
    pub fn transition(&mut self, to: CampaignStatus, now: DateTime<Utc>) -> Result<(), DomainError> {
        if !self.status.can_transition_to(to) {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status,
                to,
            });
        }
        self.apply_status(to, now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn campaign(status: CampaignStatus) -> Campaign {
        let t = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        Campaign {
            id: Uuid::nil(),
            name: "The Sunken Vale".to_owned(),
            game_system: "daggerheart".to_owned(),
            status,
            gm_mode: GmMode::Human,
            participant_count: 0,
            character_count: 0,
            theme: None,
            created_at: t,
            updated_at: t,
            last_activity_at: t,
            completed_at: None,
            archived_at: None,
        }
    }

    #[test]
    fn test_status_machine_allows_documented_transitions() {
        assert!(CampaignStatus::Draft.can_transition_to(CampaignStatus::Active));
        assert!(CampaignStatus::Active.can_transition_to(CampaignStatus::Completed));
        assert!(CampaignStatus::Active.can_transition_to(CampaignStatus::Archived));
        assert!(CampaignStatus::Completed.can_transition_to(CampaignStatus::Archived));
        assert!(CampaignStatus::Archived.can_transition_to(CampaignStatus::Draft));
    }

    #[test]
    fn test_status_machine_rejects_everything_else() {
        assert!(!CampaignStatus::Archived.can_transition_to(CampaignStatus::Active));
        assert!(!CampaignStatus::Completed.can_transition_to(CampaignStatus::Active));
        assert!(!CampaignStatus::Draft.can_transition_to(CampaignStatus::Completed));
        assert!(!CampaignStatus::Draft.can_transition_to(CampaignStatus::Archived));
        assert!(!CampaignStatus::Active.can_transition_to(CampaignStatus::Draft));
    }

    #[test]
    fn test_read_is_always_allowed() {
        for status in [
            CampaignStatus::Draft,
            CampaignStatus::Active,
            CampaignStatus::Completed,
            CampaignStatus::Archived,
        ] {
            assert!(status.allows(CampaignOperation::Read));
        }
    }

    #[test]
    fn test_archived_allows_only_read_and_restore() {
        let status = CampaignStatus::Archived;
        assert!(status.allows(CampaignOperation::Restore));
        assert!(!status.allows(CampaignOperation::SessionStart));
        assert!(!status.allows(CampaignOperation::SessionAction));
        assert!(!status.allows(CampaignOperation::CampaignMutate));
        assert!(!status.allows(CampaignOperation::End));
        assert!(!status.allows(CampaignOperation::Archive));
    }

    #[test]
    fn test_archived_to_active_fails_with_structured_error() {
        // Arrange
        let mut c = campaign(CampaignStatus::Archived);
        let now = Utc.with_ymd_and_hms(2026, 1, 16, 9, 0, 0).unwrap();

        // Act
        let result = c.transition(CampaignStatus::Active, now);

        // Assert
        match result.unwrap_err() {
            DomainError::InvalidStatusTransition { from, to } => {
                assert_eq!(from, CampaignStatus::Archived);
                assert_eq!(to, CampaignStatus::Active);
            }
            other => panic!("expected InvalidStatusTransition, got {other:?}"),
        }
        assert_eq!(c.status, CampaignStatus::Archived);
    }

    #[test]
    fn test_restore_clears_completion_and_archival_timestamps() {
        // Arrange
        let mut c = campaign(CampaignStatus::Active);
        let t1 = Utc.with_ymd_and_hms(2026, 1, 16, 9, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2026, 1, 17, 9, 0, 0).unwrap();
        let t3 = Utc.with_ymd_and_hms(2026, 1, 18, 9, 0, 0).unwrap();

        // Act
        c.transition(CampaignStatus::Completed, t1).unwrap();
        c.transition(CampaignStatus::Archived, t2).unwrap();
        c.transition(CampaignStatus::Draft, t3).unwrap();

        // Assert
        assert_eq!(c.status, CampaignStatus::Draft);
        assert!(c.completed_at.is_none());
        assert!(c.archived_at.is_none());
        assert_eq!(c.updated_at, t3);
    }
}
