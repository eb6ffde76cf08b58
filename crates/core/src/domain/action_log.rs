//! Append-only ledger of applied approval actions.
//!
//! The composite key is the dedup mechanism for retried requests: the storage
//! layer enforces its uniqueness, which closes the race window between two
//! concurrent identical submissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::approval::{ApprovalId, PrincipalId, StepId};

pub const ACTION_APPROVE: &str = "APPROVE";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionLogEntryId(pub Uuid);

/// Natural key of one logical approval action attempt.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionKey {
    pub approval_id: ApprovalId,
    pub step_id: StepId,
    pub approver_id: PrincipalId,
    pub idempotency_key: String,
}

/// Immutable audit record; never updated or deleted once written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub id: ActionLogEntryId,
    pub key: ActionKey,
    pub action_type: String,
    pub created_at: DateTime<Utc>,
}

impl ActionLogEntry {
    pub fn approve(key: ActionKey) -> Self {
        Self {
            id: ActionLogEntryId(Uuid::new_v4()),
            key,
            action_type: ACTION_APPROVE.to_string(),
            created_at: Utc::now(),
        }
    }
}
