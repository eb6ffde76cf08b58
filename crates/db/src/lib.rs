pub mod connection;
pub mod coordinator;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_with_settings, DbPool};
pub use coordinator::ApprovalCoordinator;
pub use fixtures::{seed_started_approval, SeededApproval};
pub use repositories::{
    ActionLogStore, ApprovalStore, OutboxStore, SqlActionLogStore, SqlApprovalStore,
    SqlOutboxStore, StoreError,
};
