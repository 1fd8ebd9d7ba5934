//! Accreditation lifecycle state machine.
//!
//! DRAFT → PENDING → {APPROVED, REJECTED}; an APPROVED record may be
//! revoked, which is terminal. Transitions are one-directional and
//! nothing returns a record to DRAFT. The functions here are pure: they
//! decide legality, the caller persists the outcome.

use thiserror::Error;

use crate::models::accreditation::AccreditationStatus;

/// Rejection of an illegal lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot {action} a record in {current} status")]
    InvalidState {
        action: &'static str,
        current: AccreditationStatus,
    },
    #[error("record is already revoked")]
    AlreadyRevoked,
    #[error("a revocation reason is required")]
    MissingReason,
}

/// Submit a DRAFT record for approval.
///
/// Re-submitting a record that already left DRAFT is rejected, never
/// double-transitioned.
pub fn submit(current: AccreditationStatus) -> Result<AccreditationStatus, TransitionError> {
    match current {
        AccreditationStatus::Draft => Ok(AccreditationStatus::Pending),
        _ => Err(TransitionError::InvalidState {
            action: "submit",
            current,
        }),
    }
}

/// Approve a PENDING record.
pub fn approve(current: AccreditationStatus) -> Result<AccreditationStatus, TransitionError> {
    match current {
        AccreditationStatus::Pending => Ok(AccreditationStatus::Approved),
        _ => Err(TransitionError::InvalidState {
            action: "approve",
            current,
        }),
    }
}

/// Reject a PENDING record. Terminal.
pub fn reject(current: AccreditationStatus) -> Result<AccreditationStatus, TransitionError> {
    match current {
        AccreditationStatus::Pending => Ok(AccreditationStatus::Rejected),
        _ => Err(TransitionError::InvalidState {
            action: "reject",
            current,
        }),
    }
}

/// Check that an APPROVED record may be revoked with the given reason.
///
/// Revocation does not change the status column; the caller stamps the
/// revocation metadata. The QR token is kept but the record must scan
/// as invalid from this point on.
pub fn revoke(
    current: AccreditationStatus,
    already_revoked: bool,
    reason: &str,
) -> Result<(), TransitionError> {
    if current != AccreditationStatus::Approved {
        return Err(TransitionError::InvalidState {
            action: "revoke",
            current,
        });
    }
    if already_revoked {
        return Err(TransitionError::AlreadyRevoked);
    }
    if reason.trim().is_empty() {
        return Err(TransitionError::MissingReason);
    }
    Ok(())
}

/// Whether a record in the given status may still be edited.
///
/// Decided records keep their audit trail intact; corrections go
/// through revoke and re-issue.
pub fn is_editable(current: AccreditationStatus) -> bool {
    matches!(
        current,
        AccreditationStatus::Draft | AccreditationStatus::Pending
    )
}
