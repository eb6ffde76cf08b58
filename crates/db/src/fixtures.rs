//! Seed helpers for tests and local demo data.

use thiserror::Error;
use uuid::Uuid;

use signoff_core::domain::approval::{Approval, ApprovalId, PrincipalId, Step, StepId};
use signoff_core::errors::DomainError;

use crate::connection::DbPool;
use crate::repositories::{ApprovalStore, SqlApprovalStore, StoreError};

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Handles to a freshly seeded approval, in step order.
#[derive(Clone, Debug)]
pub struct SeededApproval {
    pub approval_id: ApprovalId,
    pub step_ids: Vec<StepId>,
    pub assignee_ids: Vec<PrincipalId>,
}

/// Create and persist an IN_PROGRESS approval with `step_count` steps, the
/// first one already ACTIVE.
pub async fn seed_started_approval(
    pool: &DbPool,
    step_count: u32,
) -> Result<SeededApproval, FixtureError> {
    let steps: Vec<Step> = (0..step_count)
        .map(|order| Step::new(StepId(Uuid::new_v4()), order, PrincipalId(Uuid::new_v4())))
        .collect();

    let mut approval = Approval::new(ApprovalId(Uuid::new_v4()), steps)?;
    approval.start()?;

    let mut conn = pool.acquire().await?;
    SqlApprovalStore.save(&mut conn, &mut approval).await?;

    Ok(SeededApproval {
        approval_id: approval.id,
        step_ids: approval.steps.iter().map(|step| step.id).collect(),
        assignee_ids: approval.steps.iter().map(|step| step.assignee_id).collect(),
    })
}
