use serde_json::json;
use uuid::Uuid;

use crate::commands::CommandResult;
use signoff_core::commands::ApproveCommand;
use signoff_core::config::{AppConfig, LoadOptions};
use signoff_core::domain::approval::{ApprovalId, PrincipalId, StepId};
use signoff_core::errors::ApproveError;
use signoff_db::{connect_with_settings, ApprovalCoordinator};

pub fn run(
    options: LoadOptions,
    approval_id: Uuid,
    step_id: Uuid,
    approver_id: Uuid,
    idempotency_key: String,
) -> CommandResult {
    let command = match ApproveCommand::new(
        ApprovalId(approval_id),
        StepId(step_id),
        PrincipalId(approver_id),
        idempotency_key,
    ) {
        Ok(command) => command,
        Err(error) => {
            return CommandResult::failure("approve", "invalid_argument", error.to_string(), 2);
        }
    };

    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "approve",
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
                "approve",
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

        let outcome = ApprovalCoordinator::new(pool.clone()).approve(&command).await;
        pool.close().await;
        outcome.map_err(|error| (error_class(&error), error.to_string(), 5u8))
    });

    match result {
        Ok(snapshot) => CommandResult::success_with_data(
            "approve",
            format!("approval is now {}", snapshot.approval_status.as_str()),
            json!(snapshot),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("approve", error_class, message, exit_code)
        }
    }
}

fn error_class(error: &ApproveError) -> &'static str {
    match error {
        ApproveError::InvalidArgument(_) => "invalid_argument",
        ApproveError::ApprovalNotFound(_) | ApproveError::StepNotFound(_) => "not_found",
        ApproveError::InvalidState(_) => "invalid_state",
        ApproveError::Conflict { .. } => "conflict",
        ApproveError::Internal(_) => "internal",
    }
}
