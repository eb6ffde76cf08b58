//! Applies one approval action exactly once inside one transaction.
//!
//! The sequence per command: probe the action log for a replay, load and
//! mutate the aggregate, save it with an optimistic-lock write, append the
//! action log entry, record the outbox event, commit. A unique-key collision
//! on the log append means a concurrent identical request won the race; that
//! transaction is rolled back and the committed state is returned instead.

use tracing::{info, warn};

use signoff_core::commands::{ApprovalSnapshot, ApproveCommand};
use signoff_core::domain::action_log::ActionLogEntry;
use signoff_core::domain::approval::Approval;
use signoff_core::domain::outbox::OutboxEvent;
use signoff_core::errors::ApproveError;

use crate::connection::DbPool;
use crate::repositories::{
    ActionLogStore, ApprovalStore, OutboxStore, SqlActionLogStore, SqlApprovalStore,
    SqlOutboxStore, StoreError,
};

pub struct ApprovalCoordinator<
    A = SqlApprovalStore,
    L = SqlActionLogStore,
    O = SqlOutboxStore,
> {
    pool: DbPool,
    approvals: A,
    action_log: L,
    outbox: O,
}

impl ApprovalCoordinator {
    pub fn new(pool: DbPool) -> Self {
        Self::with_stores(pool, SqlApprovalStore, SqlActionLogStore, SqlOutboxStore)
    }
}

impl<A, L, O> ApprovalCoordinator<A, L, O>
where
    A: ApprovalStore,
    L: ActionLogStore,
    O: OutboxStore,
{
    pub fn with_stores(pool: DbPool, approvals: A, action_log: L, outbox: O) -> Self {
        Self { pool, approvals, action_log, outbox }
    }

    /// Apply `command` and return the resulting aggregate snapshot.
    ///
    /// A replayed command (same approval, step, approver and idempotency key
    /// as an already-applied action) succeeds without mutating anything and
    /// returns the current state.
    pub async fn approve(&self, command: &ApproveCommand) -> Result<ApprovalSnapshot, ApproveError> {
        let key = command.action_key();
        let mut tx = self.pool.begin().await.map_err(internal)?;

        if let Some(entry) = self
            .action_log
            .find_by_key(&mut *tx, &key)
            .await
            .map_err(map_store_error)?
        {
            drop(tx);
            info!(
                event_name = "approval.action_replayed",
                approval_id = %command.approval_id,
                step_id = %command.step_id,
                action_log_id = %entry.id.0,
                "idempotent replay, returning current state"
            );
            return self.current_snapshot(command).await;
        }

        let Some(mut approval) = self
            .approvals
            .find_by_id(&mut *tx, &command.approval_id)
            .await
            .map_err(map_store_error)?
        else {
            return Err(ApproveError::ApprovalNotFound(command.approval_id));
        };

        let approved = approval.approve_step(command.step_id, command.approver_id)?;

        // The log append must precede the aggregate save: a concurrent
        // identical request that already committed holds both the log row and
        // the advanced version, and the unique-key collision is the signal
        // that resolves into a successful reload rather than a Conflict.
        match self.action_log.insert(&mut *tx, &ActionLogEntry::approve(key)).await {
            Ok(()) => {}
            Err(StoreError::DuplicateAction { approval_id, .. }) => {
                // A concurrent identical request committed first; discard this
                // transaction and read back what it produced.
                tx.rollback().await.map_err(internal)?;
                warn!(
                    event_name = "approval.action_raced",
                    approval_id = %approval_id,
                    step_id = %command.step_id,
                    "lost duplicate-action race, returning committed state"
                );
                return self.current_snapshot(command).await;
            }
            Err(error) => return Err(map_store_error(error)),
        }

        self.approvals.save(&mut *tx, &mut approval).await.map_err(map_store_error)?;

        let event = OutboxEvent::step_approved(&approval, &approved).map_err(internal)?;
        self.outbox.insert(&mut *tx, &event).await.map_err(map_store_error)?;

        tx.commit().await.map_err(internal)?;

        info!(
            event_name = "approval.step_approved",
            approval_id = %approval.id,
            step_id = %approved.step_id,
            step_order = approved.step_order,
            approval_status = approval.status.as_str(),
            "approved step"
        );

        Ok(ApprovalSnapshot::of(&approval))
    }

    async fn current_snapshot(
        &self,
        command: &ApproveCommand,
    ) -> Result<ApprovalSnapshot, ApproveError> {
        let mut conn = self.pool.acquire().await.map_err(internal)?;
        let approval = self
            .approvals
            .find_by_id(&mut conn, &command.approval_id)
            .await
            .map_err(map_store_error)?
            .ok_or(ApproveError::ApprovalNotFound(command.approval_id))?;

        Ok(ApprovalSnapshot::of(&approval))
    }
}

fn map_store_error(error: StoreError) -> ApproveError {
    match error {
        StoreError::VersionConflict { approval_id, expected } => {
            ApproveError::Conflict { approval_id, expected }
        }
        StoreError::DuplicateAction { approval_id, idempotency_key } => ApproveError::Internal(
            format!("unhandled duplicate action for approval {approval_id} (key {idempotency_key})"),
        ),
        other => ApproveError::Internal(other.to_string()),
    }
}

fn internal(error: impl std::fmt::Display) -> ApproveError {
    ApproveError::Internal(error.to_string())
}
