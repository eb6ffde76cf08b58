use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

use signoff_core::domain::approval::{
    Approval, ApprovalId, ApprovalStatus, PrincipalId, Step, StepId, StepStatus,
};

use super::{ApprovalStore, StoreError};

/// sqlx-backed aggregate store; one `approvals` row plus its ordered
/// `approval_steps` rows per aggregate.
#[derive(Clone, Copy, Debug, Default)]
pub struct SqlApprovalStore;

#[async_trait::async_trait]
impl ApprovalStore for SqlApprovalStore {
    async fn find_by_id(
        &self,
        conn: &mut SqliteConnection,
        id: &ApprovalId,
    ) -> Result<Option<Approval>, StoreError> {
        let row = sqlx::query(
            "SELECT id, status, version, created_at, updated_at
             FROM approvals
             WHERE id = ?",
        )
        .bind(id.0.to_string())
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let steps = sqlx::query(
            "SELECT id, step_order, assignee_id, status, approver_id, approved_at,
                    created_at, updated_at
             FROM approval_steps
             WHERE approval_id = ?
             ORDER BY step_order ASC",
        )
        .bind(id.0.to_string())
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(step_from_row)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(approval_from_row(row, steps)?))
    }

    async fn save(
        &self,
        conn: &mut SqliteConnection,
        approval: &mut Approval,
    ) -> Result<(), StoreError> {
        let next_version = match approval.version {
            None => {
                sqlx::query(
                    "INSERT INTO approvals (id, status, version, created_at, updated_at)
                     VALUES (?, ?, 1, ?, ?)",
                )
                .bind(approval.id.0.to_string())
                .bind(approval.status.as_str())
                .bind(approval.created_at.to_rfc3339())
                .bind(approval.updated_at.to_rfc3339())
                .execute(&mut *conn)
                .await?;
                1
            }
            Some(expected) => {
                let next = expected + 1;
                let outcome = sqlx::query(
                    "UPDATE approvals
                     SET status = ?, version = ?, updated_at = ?
                     WHERE id = ? AND version = ?",
                )
                .bind(approval.status.as_str())
                .bind(next)
                .bind(approval.updated_at.to_rfc3339())
                .bind(approval.id.0.to_string())
                .bind(expected)
                .execute(&mut *conn)
                .await?;

                if outcome.rows_affected() == 0 {
                    return Err(StoreError::VersionConflict {
                        approval_id: approval.id,
                        expected,
                    });
                }
                next
            }
        };

        // Step membership is immutable, so the order and assignee columns only
        // matter on first insert; later saves just refresh transition state.
        for step in &approval.steps {
            sqlx::query(
                "INSERT INTO approval_steps (
                    id, approval_id, step_order, assignee_id, status,
                    approver_id, approved_at, created_at, updated_at
                 ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                    status = excluded.status,
                    approver_id = excluded.approver_id,
                    approved_at = excluded.approved_at,
                    updated_at = excluded.updated_at",
            )
            .bind(step.id.0.to_string())
            .bind(approval.id.0.to_string())
            .bind(i64::from(step.step_order))
            .bind(step.assignee_id.0.to_string())
            .bind(step.status.as_str())
            .bind(step.approver_id.map(|approver| approver.0.to_string()))
            .bind(step.approved_at.map(|at| at.to_rfc3339()))
            .bind(step.created_at.to_rfc3339())
            .bind(step.updated_at.to_rfc3339())
            .execute(&mut *conn)
            .await?;
        }

        approval.version = Some(next_version);
        Ok(())
    }
}

fn approval_from_row(row: SqliteRow, steps: Vec<Step>) -> Result<Approval, StoreError> {
    let status_raw = row.try_get::<String, _>("status")?;
    let status = ApprovalStatus::parse(&status_raw)
        .ok_or_else(|| StoreError::Decode(format!("unknown approval status `{status_raw}`")))?;

    Ok(Approval {
        id: ApprovalId(parse_uuid("id", &row.try_get::<String, _>("id")?)?),
        status,
        version: Some(row.try_get::<i64, _>("version")?),
        steps,
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
        updated_at: parse_timestamp("updated_at", row.try_get("updated_at")?)?,
    })
}

fn step_from_row(row: SqliteRow) -> Result<Step, StoreError> {
    let status_raw = row.try_get::<String, _>("status")?;
    let status = StepStatus::parse(&status_raw)
        .ok_or_else(|| StoreError::Decode(format!("unknown step status `{status_raw}`")))?;

    let approver_id = row
        .try_get::<Option<String>, _>("approver_id")?
        .map(|value| parse_uuid("approver_id", &value).map(PrincipalId))
        .transpose()?;

    Ok(Step {
        id: StepId(parse_uuid("id", &row.try_get::<String, _>("id")?)?),
        step_order: parse_u32("step_order", row.try_get("step_order")?)?,
        assignee_id: PrincipalId(parse_uuid(
            "assignee_id",
            &row.try_get::<String, _>("assignee_id")?,
        )?),
        status,
        approver_id,
        approved_at: parse_optional_timestamp("approved_at", row.try_get("approved_at")?)?,
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
        updated_at: parse_timestamp("updated_at", row.try_get("updated_at")?)?,
    })
}

pub(crate) fn parse_uuid(column: &str, value: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(value)
        .map_err(|error| StoreError::Decode(format!("invalid uuid in `{column}`: {error}")))
}

pub(crate) fn parse_u32(column: &str, value: i64) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| {
        StoreError::Decode(format!(
            "invalid value for `{column}` (expected non-negative u32): {value}"
        ))
    })
}

pub(crate) fn parse_timestamp(column: &str, value: String) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| StoreError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})")),
    )
}

pub(crate) fn parse_optional_timestamp(
    column: &str,
    value: Option<String>,
) -> Result<Option<DateTime<Utc>>, StoreError> {
    value.map(|timestamp| parse_timestamp(column, timestamp)).transpose()
}
