use sqlx::SqliteConnection;

use signoff_core::domain::outbox::OutboxEvent;

use super::{OutboxStore, StoreError};

#[derive(Clone, Copy, Debug, Default)]
pub struct SqlOutboxStore;

#[async_trait::async_trait]
impl OutboxStore for SqlOutboxStore {
    async fn insert(
        &self,
        conn: &mut SqliteConnection,
        event: &OutboxEvent,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO outbox_events (
                id, aggregate_type, aggregate_id, event_type, payload, status, created_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(event.id.0.to_string())
        .bind(&event.aggregate_type)
        .bind(event.aggregate_id.to_string())
        .bind(&event.event_type)
        .bind(&event.payload)
        .bind(event.status.as_str())
        .bind(event.created_at.to_rfc3339())
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
