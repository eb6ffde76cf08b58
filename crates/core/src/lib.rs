pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;

pub use commands::{ApprovalSnapshot, ApproveCommand};
pub use domain::action_log::{ActionKey, ActionLogEntry, ActionLogEntryId, ACTION_APPROVE};
pub use domain::approval::{
    Approval, ApprovalId, ApprovalStatus, PrincipalId, Step, StepApproved, StepId, StepStatus,
};
pub use domain::outbox::{
    OutboxEvent, OutboxEventId, OutboxEventStatus, StepApprovedPayload, AGGREGATE_TYPE_APPROVAL,
    EVENT_TYPE_STEP_APPROVED,
};
pub use errors::{ApproveError, DomainError};
