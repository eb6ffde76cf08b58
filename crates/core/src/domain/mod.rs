pub mod action_log;
pub mod approval;
pub mod outbox;
