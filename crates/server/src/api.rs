//! JSON API for submitting approval actions.
//!
//! Endpoints:
//! - `POST /api/approvals/{approval_id}/steps/{step_id}/approve` — apply one
//!   approval action; idempotent under the caller-supplied `idempotencyKey`.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use signoff_core::commands::ApproveCommand;
use signoff_core::domain::approval::{ApprovalId, PrincipalId, StepId};
use signoff_core::errors::ApproveError;
use signoff_db::ApprovalCoordinator;

#[derive(Clone)]
pub struct ApiState {
    coordinator: Arc<ApprovalCoordinator>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequest {
    pub approver_id: Option<Uuid>,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

pub fn router(coordinator: Arc<ApprovalCoordinator>) -> Router {
    Router::new()
        .route("/api/approvals/{approval_id}/steps/{step_id}/approve", post(approve_step))
        .with_state(ApiState { coordinator })
}

pub async fn approve_step(
    State(state): State<ApiState>,
    Path((approval_id, step_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<ApproveRequest>,
) -> Response {
    let command = match build_command(approval_id, step_id, request) {
        Ok(command) => command,
        Err(error) => return error_response(error),
    };

    match state.coordinator.approve(&command).await {
        Ok(snapshot) => {
            info!(
                event_name = "api.approve.accepted",
                approval_id = %command.approval_id,
                step_id = %command.step_id,
                approval_status = snapshot.approval_status.as_str(),
                "approval action accepted"
            );
            (StatusCode::OK, Json(snapshot)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn build_command(
    approval_id: Uuid,
    step_id: Uuid,
    request: ApproveRequest,
) -> Result<ApproveCommand, ApproveError> {
    let approver_id = request
        .approver_id
        .ok_or_else(|| ApproveError::InvalidArgument("approverId is required".to_string()))?;
    let idempotency_key = request
        .idempotency_key
        .ok_or_else(|| ApproveError::InvalidArgument("idempotencyKey is required".to_string()))?;

    ApproveCommand::new(
        ApprovalId(approval_id),
        StepId(step_id),
        PrincipalId(approver_id),
        idempotency_key,
    )
}

fn error_response(error: ApproveError) -> Response {
    let status = match &error {
        ApproveError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        ApproveError::ApprovalNotFound(_) | ApproveError::StepNotFound(_) => StatusCode::NOT_FOUND,
        ApproveError::InvalidState(_) | ApproveError::Conflict { .. } => StatusCode::CONFLICT,
        ApproveError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        warn!(event_name = "api.approve.failed", error = %error, "approval action failed");
    }

    (status, Json(ApiError { error: error.to_string() })).into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use signoff_db::{
        connect_with_settings, migrations, seed_started_approval, ApprovalCoordinator, DbPool,
        SeededApproval,
    };

    use super::router;

    async fn setup() -> (axum::Router, DbPool, SeededApproval) {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        let seeded = seed_started_approval(&pool, 2).await.expect("seed");
        let app = router(Arc::new(ApprovalCoordinator::new(pool.clone())));
        (app, pool, seeded)
    }

    fn approve_request(approval_id: &str, step_id: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/api/approvals/{approval_id}/steps/{step_id}/approve"))
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes =
            axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("read body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn approving_the_active_step_returns_the_advanced_snapshot() {
        let (app, _pool, seeded) = setup().await;

        let response = app
            .oneshot(approve_request(
                &seeded.approval_id.0.to_string(),
                &seeded.step_ids[0].0.to_string(),
                json!({ "approverId": Uuid::new_v4(), "idempotencyKey": "req-1" }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["approvalStatus"], "IN_PROGRESS");
        assert_eq!(body["activeStepId"], seeded.step_ids[1].0.to_string());
        assert_eq!(body["activeStepOrder"], 1);
    }

    #[tokio::test]
    async fn replayed_request_returns_ok_with_current_state() {
        let (app, pool, seeded) = setup().await;
        let approver = Uuid::new_v4();
        let body = json!({ "approverId": approver, "idempotencyKey": "req-1" });
        let approval = seeded.approval_id.0.to_string();
        let step = seeded.step_ids[0].0.to_string();

        let first = app
            .clone()
            .oneshot(approve_request(&approval, &step, body.clone()))
            .await
            .expect("first response");
        assert_eq!(first.status(), StatusCode::OK);

        let replay =
            app.oneshot(approve_request(&approval, &step, body)).await.expect("replay response");
        assert_eq!(replay.status(), StatusCode::OK);
        let replay_body = json_body(replay).await;
        assert_eq!(replay_body["approvalStatus"], "IN_PROGRESS");

        let (log_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM approval_action_logs")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(log_count, 1);
    }

    #[tokio::test]
    async fn missing_request_fields_are_bad_requests() {
        let (app, _pool, seeded) = setup().await;
        let approval = seeded.approval_id.0.to_string();
        let step = seeded.step_ids[0].0.to_string();

        let missing_approver = app
            .clone()
            .oneshot(approve_request(&approval, &step, json!({ "idempotencyKey": "req-1" })))
            .await
            .expect("response");
        assert_eq!(missing_approver.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(missing_approver).await["error"], "approverId is required");

        let missing_key = app
            .clone()
            .oneshot(approve_request(&approval, &step, json!({ "approverId": Uuid::new_v4() })))
            .await
            .expect("response");
        assert_eq!(missing_key.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(missing_key).await["error"], "idempotencyKey is required");

        let blank_key = app
            .oneshot(approve_request(
                &approval,
                &step,
                json!({ "approverId": Uuid::new_v4(), "idempotencyKey": "   " }),
            ))
            .await
            .expect("response");
        assert_eq!(blank_key.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(blank_key).await["error"], "idempotencyKey is required");
    }

    #[tokio::test]
    async fn unknown_ids_map_to_not_found() {
        let (app, _pool, seeded) = setup().await;
        let body = json!({ "approverId": Uuid::new_v4(), "idempotencyKey": "req-1" });

        let unknown_approval = app
            .clone()
            .oneshot(approve_request(
                &Uuid::new_v4().to_string(),
                &seeded.step_ids[0].0.to_string(),
                body.clone(),
            ))
            .await
            .expect("response");
        assert_eq!(unknown_approval.status(), StatusCode::NOT_FOUND);

        let unknown_step = app
            .oneshot(approve_request(
                &seeded.approval_id.0.to_string(),
                &Uuid::new_v4().to_string(),
                body,
            ))
            .await
            .expect("response");
        assert_eq!(unknown_step.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn approving_a_pending_step_is_a_conflict() {
        let (app, _pool, seeded) = setup().await;

        let response = app
            .oneshot(approve_request(
                &seeded.approval_id.0.to_string(),
                &seeded.step_ids[1].0.to_string(),
                json!({ "approverId": Uuid::new_v4(), "idempotencyKey": "req-1" }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(json_body(response).await["error"], "Only ACTIVE step can be approved");
    }

    #[tokio::test]
    async fn malformed_path_ids_are_rejected_before_the_handler() {
        let (app, _pool, seeded) = setup().await;

        let response = app
            .oneshot(approve_request(
                "not-a-uuid",
                &seeded.step_ids[0].0.to_string(),
                json!({ "approverId": Uuid::new_v4(), "idempotencyKey": "req-1" }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
