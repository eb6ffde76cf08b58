use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use signoff_core::domain::action_log::{ActionKey, ActionLogEntry, ActionLogEntryId};
use signoff_core::domain::approval::{ApprovalId, PrincipalId, StepId};

use super::approval::{parse_timestamp, parse_uuid};
use super::{ActionLogStore, StoreError};

#[derive(Clone, Copy, Debug, Default)]
pub struct SqlActionLogStore;

#[async_trait::async_trait]
impl ActionLogStore for SqlActionLogStore {
    async fn find_by_key(
        &self,
        conn: &mut SqliteConnection,
        key: &ActionKey,
    ) -> Result<Option<ActionLogEntry>, StoreError> {
        sqlx::query(
            "SELECT id, approval_id, step_id, approver_id, idempotency_key, action_type,
                    created_at
             FROM approval_action_logs
             WHERE approval_id = ?
               AND step_id = ?
               AND approver_id = ?
               AND idempotency_key = ?",
        )
        .bind(key.approval_id.0.to_string())
        .bind(key.step_id.0.to_string())
        .bind(key.approver_id.0.to_string())
        .bind(&key.idempotency_key)
        .fetch_optional(&mut *conn)
        .await?
        .map(entry_from_row)
        .transpose()
    }

    async fn insert(
        &self,
        conn: &mut SqliteConnection,
        entry: &ActionLogEntry,
    ) -> Result<(), StoreError> {
        let outcome = sqlx::query(
            "INSERT INTO approval_action_logs (
                id, approval_id, step_id, approver_id, idempotency_key, action_type, created_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(entry.id.0.to_string())
        .bind(entry.key.approval_id.0.to_string())
        .bind(entry.key.step_id.0.to_string())
        .bind(entry.key.approver_id.0.to_string())
        .bind(&entry.key.idempotency_key)
        .bind(&entry.action_type)
        .bind(entry.created_at.to_rfc3339())
        .execute(&mut *conn)
        .await;

        match outcome {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_error)) if db_error.is_unique_violation() => {
                Err(StoreError::DuplicateAction {
                    approval_id: entry.key.approval_id,
                    idempotency_key: entry.key.idempotency_key.clone(),
                })
            }
            Err(error) => Err(error.into()),
        }
    }
}

fn entry_from_row(row: SqliteRow) -> Result<ActionLogEntry, StoreError> {
    Ok(ActionLogEntry {
        id: ActionLogEntryId(parse_uuid("id", &row.try_get::<String, _>("id")?)?),
        key: ActionKey {
            approval_id: ApprovalId(parse_uuid(
                "approval_id",
                &row.try_get::<String, _>("approval_id")?,
            )?),
            step_id: StepId(parse_uuid("step_id", &row.try_get::<String, _>("step_id")?)?),
            approver_id: PrincipalId(parse_uuid(
                "approver_id",
                &row.try_get::<String, _>("approver_id")?,
            )?),
            idempotency_key: row.try_get("idempotency_key")?,
        },
        action_type: row.try_get("action_type")?,
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
    })
}
