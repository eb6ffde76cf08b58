//! Inbound command and outbound snapshot for the approve use case.

use serde::{Deserialize, Serialize};

use crate::domain::action_log::ActionKey;
use crate::domain::approval::{Approval, ApprovalId, ApprovalStatus, PrincipalId, StepId, StepStatus};
use crate::errors::ApproveError;

/// One approval action as submitted by a caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApproveCommand {
    pub approval_id: ApprovalId,
    pub step_id: StepId,
    pub approver_id: PrincipalId,
    pub idempotency_key: String,
}

impl ApproveCommand {
    /// The boundary layer checks field presence; the blank idempotency key is
    /// additionally rejected here so no caller can bypass it.
    pub fn new(
        approval_id: ApprovalId,
        step_id: StepId,
        approver_id: PrincipalId,
        idempotency_key: impl Into<String>,
    ) -> Result<Self, ApproveError> {
        let idempotency_key = idempotency_key.into();
        if idempotency_key.trim().is_empty() {
            return Err(ApproveError::InvalidArgument("idempotencyKey is required".to_string()));
        }

        Ok(Self { approval_id, step_id, approver_id, idempotency_key })
    }

    pub fn action_key(&self) -> ActionKey {
        ActionKey {
            approval_id: self.approval_id,
            step_id: self.step_id,
            approver_id: self.approver_id,
            idempotency_key: self.idempotency_key.clone(),
        }
    }
}

/// Read-only view of the aggregate returned to callers.
///
/// The three `active_step_*` fields are present together while a step is
/// ACTIVE and absent together once the approval is terminal (or not started).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalSnapshot {
    pub approval_id: ApprovalId,
    pub approval_status: ApprovalStatus,
    pub version: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_step_id: Option<StepId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_step_status: Option<StepStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_step_order: Option<u32>,
}

impl ApprovalSnapshot {
    pub fn of(approval: &Approval) -> Self {
        let active = approval.active_step();
        Self {
            approval_id: approval.id,
            approval_status: approval.status,
            version: approval.version,
            active_step_id: active.map(|step| step.id),
            active_step_status: active.map(|step| step.status),
            active_step_order: active.map(|step| step.step_order),
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{ApprovalSnapshot, ApproveCommand};
    use crate::domain::approval::{
        Approval, ApprovalId, ApprovalStatus, PrincipalId, Step, StepId, StepStatus,
    };
    use crate::errors::ApproveError;

    fn ids() -> (ApprovalId, StepId, PrincipalId) {
        (ApprovalId(Uuid::new_v4()), StepId(Uuid::new_v4()), PrincipalId(Uuid::new_v4()))
    }

    #[test]
    fn command_rejects_blank_idempotency_key() {
        let (approval_id, step_id, approver_id) = ids();

        for blank in ["", "   ", "\t"] {
            let error = ApproveCommand::new(approval_id, step_id, approver_id, blank)
                .expect_err("blank key must be rejected");
            assert_eq!(
                error,
                ApproveError::InvalidArgument("idempotencyKey is required".to_string())
            );
        }
    }

    #[test]
    fn command_action_key_matches_its_fields() {
        let (approval_id, step_id, approver_id) = ids();
        let command = ApproveCommand::new(approval_id, step_id, approver_id, "req-1")
            .expect("valid command");

        let key = command.action_key();
        assert_eq!(key.approval_id, approval_id);
        assert_eq!(key.step_id, step_id);
        assert_eq!(key.approver_id, approver_id);
        assert_eq!(key.idempotency_key, "req-1");
    }

    #[test]
    fn snapshot_of_in_progress_approval_reports_the_active_step() {
        let mut approval = Approval::new(
            ApprovalId(Uuid::new_v4()),
            vec![
                Step::new(StepId(Uuid::new_v4()), 0, PrincipalId(Uuid::new_v4())),
                Step::new(StepId(Uuid::new_v4()), 1, PrincipalId(Uuid::new_v4())),
            ],
        )
        .expect("valid approval");
        approval.start().expect("start");

        let snapshot = ApprovalSnapshot::of(&approval);

        assert_eq!(snapshot.approval_status, ApprovalStatus::InProgress);
        assert_eq!(snapshot.active_step_id, Some(approval.steps[0].id));
        assert_eq!(snapshot.active_step_status, Some(StepStatus::Active));
        assert_eq!(snapshot.active_step_order, Some(0));
    }

    #[test]
    fn snapshot_of_completed_approval_omits_active_step_fields() {
        let mut approval = Approval::new(
            ApprovalId(Uuid::new_v4()),
            vec![Step::new(StepId(Uuid::new_v4()), 0, PrincipalId(Uuid::new_v4()))],
        )
        .expect("valid approval");
        approval.start().expect("start");
        let step_id = approval.steps[0].id;
        approval.approve_step(step_id, PrincipalId(Uuid::new_v4())).expect("approve");

        let snapshot = ApprovalSnapshot::of(&approval);
        assert_eq!(snapshot.approval_status, ApprovalStatus::Approved);
        assert_eq!(snapshot.active_step_id, None);
        assert_eq!(snapshot.active_step_status, None);
        assert_eq!(snapshot.active_step_order, None);

        let rendered = serde_json::to_value(&snapshot).expect("serialize");
        assert!(rendered.get("activeStepId").is_none());
        assert!(rendered.get("activeStepStatus").is_none());
        assert!(rendered.get("activeStepOrder").is_none());
    }
}
