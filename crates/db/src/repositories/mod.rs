//! Persistence collaborators for the approval workflow.
//!
//! Every method takes a `&mut SqliteConnection` so the coordinator can run
//! the full probe/mutate/log/publish sequence on one transaction handle; the
//! stores themselves never begin or commit anything.

use async_trait::async_trait;
use sqlx::SqliteConnection;
use thiserror::Error;

use signoff_core::domain::action_log::{ActionKey, ActionLogEntry};
use signoff_core::domain::approval::{Approval, ApprovalId};
use signoff_core::domain::outbox::OutboxEvent;

pub mod action_log;
pub mod approval;
pub mod outbox;

pub use action_log::SqlActionLogStore;
pub use approval::SqlApprovalStore;
pub use outbox::SqlOutboxStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    /// The composite action-key uniqueness constraint rejected an insert: a
    /// concurrent identical request already recorded this action.
    #[error("duplicate action for idempotency key `{idempotency_key}` on approval {approval_id}")]
    DuplicateAction { approval_id: ApprovalId, idempotency_key: String },
    /// The optimistic-concurrency write observed a stale aggregate version.
    #[error("version conflict for approval {approval_id}: expected {expected}")]
    VersionConflict { approval_id: ApprovalId, expected: i64 },
}

#[async_trait]
pub trait ApprovalStore: Send + Sync {
    async fn find_by_id(
        &self,
        conn: &mut SqliteConnection,
        id: &ApprovalId,
    ) -> Result<Option<Approval>, StoreError>;

    /// Persist the aggregate and its steps, bumping `approval.version`.
    ///
    /// A `None` version inserts fresh rows; a `Some` version is a
    /// compare-and-swap and fails with [`StoreError::VersionConflict`] when a
    /// concurrent writer advanced the row.
    async fn save(
        &self,
        conn: &mut SqliteConnection,
        approval: &mut Approval,
    ) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ActionLogStore: Send + Sync {
    async fn find_by_key(
        &self,
        conn: &mut SqliteConnection,
        key: &ActionKey,
    ) -> Result<Option<ActionLogEntry>, StoreError>;

    /// Append one entry; a collision on the composite key surfaces as
    /// [`StoreError::DuplicateAction`].
    async fn insert(
        &self,
        conn: &mut SqliteConnection,
        entry: &ActionLogEntry,
    ) -> Result<(), StoreError>;
}

#[async_trait]
pub trait OutboxStore: Send + Sync {
    async fn insert(
        &self,
        conn: &mut SqliteConnection,
        event: &OutboxEvent,
    ) -> Result<(), StoreError>;
}
