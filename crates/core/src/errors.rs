use thiserror::Error;

use crate::domain::approval::{ApprovalId, ApprovalStatus, StepId, StepStatus};

/// State machine precondition violations raised by the Approval aggregate.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("Approval must be in DRAFT status to start")]
    ApprovalNotDraft { status: ApprovalStatus },
    #[error("Cannot start approval without steps")]
    NoSteps,
    #[error("Only PENDING step can be activated")]
    StepNotPending { step_id: StepId, status: StepStatus },
    #[error("Only ACTIVE step can be approved")]
    StepNotActive { step_id: StepId, status: StepStatus },
    #[error("Step not found: {step_id}")]
    StepNotFound { step_id: StepId },
    #[error("step orders must be a dense sequence from 0, got {step_order} for step {step_id}")]
    InvalidStepOrder { step_id: StepId, step_order: u32 },
}

/// Error taxonomy the coordinator exposes to boundary layers.
///
/// `NotFound` and `InvalidState` reflect real workflow state and are not
/// retriable as-is; `Conflict` (a lost optimistic-lock race) is retriable with
/// the same idempotency key. Duplicate-action signals never surface here: the
/// coordinator resolves them into a successful read-only snapshot.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApproveError {
    #[error("Approval not found: {0}")]
    ApprovalNotFound(ApprovalId),
    #[error("Step not found: {0}")]
    StepNotFound(StepId),
    #[error("{0}")]
    InvalidArgument(String),
    #[error(transparent)]
    InvalidState(DomainError),
    #[error("stale version {expected} for approval {approval_id}; reload and retry")]
    Conflict { approval_id: ApprovalId, expected: i64 },
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for ApproveError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::StepNotFound { step_id } => Self::StepNotFound(step_id),
            other => Self::InvalidState(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{ApproveError, DomainError};
    use crate::domain::approval::{StepId, StepStatus};

    #[test]
    fn step_not_found_maps_to_its_own_kind() {
        let step_id = StepId(Uuid::new_v4());
        let mapped = ApproveError::from(DomainError::StepNotFound { step_id });

        assert_eq!(mapped, ApproveError::StepNotFound(step_id));
    }

    #[test]
    fn precondition_violations_map_to_invalid_state() {
        let step_id = StepId(Uuid::new_v4());
        let error = DomainError::StepNotActive { step_id, status: StepStatus::Pending };

        let mapped = ApproveError::from(error);
        assert_eq!(mapped, ApproveError::InvalidState(error));
        assert_eq!(mapped.to_string(), "Only ACTIVE step can be approved");
    }
}
