//! Transactional outbox event for completed approval steps.
//!
//! Events are durably recorded in the same transaction as the mutation they
//! describe and stay PENDING; relaying them to a message bus is a separate
//! concern outside this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::approval::{Approval, ApprovalStatus, StepApproved};

pub const AGGREGATE_TYPE_APPROVAL: &str = "Approval";
pub const EVENT_TYPE_STEP_APPROVED: &str = "ApprovalStepApproved";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutboxEventId(pub Uuid);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboxEventStatus {
    // Relay is out of scope, so no transition away from PENDING exists yet.
    Pending,
}

impl OutboxEventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "PENDING" => Some(Self::Pending),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxEvent {
    pub id: OutboxEventId,
    pub aggregate_type: String,
    pub aggregate_id: Uuid,
    pub event_type: String,
    pub payload: String,
    pub status: OutboxEventStatus,
    pub created_at: DateTime<Utc>,
}

/// Snapshot of the fact published for each approved step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepApprovedPayload {
    pub approval_id: Uuid,
    pub step_id: Uuid,
    pub step_order: u32,
    pub approver_id: Uuid,
    pub approved_at: DateTime<Utc>,
    pub approval_status: ApprovalStatus,
}

impl OutboxEvent {
    /// Build the event describing `approved` against the post-transition
    /// aggregate state.
    pub fn step_approved(
        approval: &Approval,
        approved: &StepApproved,
    ) -> Result<Self, serde_json::Error> {
        let payload = StepApprovedPayload {
            approval_id: approval.id.0,
            step_id: approved.step_id.0,
            step_order: approved.step_order,
            approver_id: approved.approver_id.0,
            approved_at: approved.approved_at,
            approval_status: approval.status,
        };

        Ok(Self {
            id: OutboxEventId(Uuid::new_v4()),
            aggregate_type: AGGREGATE_TYPE_APPROVAL.to_string(),
            aggregate_id: approval.id.0,
            event_type: EVENT_TYPE_STEP_APPROVED.to_string(),
            payload: serde_json::to_string(&payload)?,
            status: OutboxEventStatus::Pending,
            created_at: Utc::now(),
        })
    }
}
