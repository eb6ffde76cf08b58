use serde_json::json;
use uuid::Uuid;

use crate::commands::CommandResult;
use signoff_core::commands::ApprovalSnapshot;
use signoff_core::config::{AppConfig, LoadOptions};
use signoff_core::domain::approval::ApprovalId;
use signoff_db::{connect_with_settings, ApprovalStore, SqlApprovalStore};

pub fn run(options: LoadOptions, approval_id: Uuid) -> CommandResult {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "show",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "show",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        let outcome = async {
            let mut conn = pool
                .acquire()
                .await
                .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
            SqlApprovalStore
                .find_by_id(&mut conn, &ApprovalId(approval_id))
                .await
                .map_err(|error| ("store", error.to_string(), 5u8))?
                .ok_or_else(|| ("not_found", format!("Approval not found: {approval_id}"), 5u8))
        }
        .await;

        pool.close().await;
        outcome
    });

    match result {
        Ok(approval) => {
            let steps: Vec<_> = approval
                .steps
                .iter()
                .map(|step| {
                    json!({
                        "stepId": step.id.0,
                        "stepOrder": step.step_order,
                        "assigneeId": step.assignee_id.0,
                        "status": step.status.as_str(),
                        "approverId": step.approver_id.map(|who| who.0),
                        "approvedAt": step.approved_at,
                    })
                })
                .collect();

            CommandResult::success_with_data(
                "show",
                format!("approval is {}", approval.status.as_str()),
                json!({
                    "snapshot": ApprovalSnapshot::of(&approval),
                    "steps": steps,
                }),
            )
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("show", error_class, message, exit_code)
        }
    }
}
