//! Approval aggregate and its step state machine.
//!
//! An approval owns an ordered sequence of steps and advances them strictly
//! forward: at most one step is ACTIVE while the approval is IN_PROGRESS, and
//! approving the last step completes the aggregate.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApprovalId(pub Uuid);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepId(pub Uuid);

/// A user acting in the workflow, as step assignee or as approver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrincipalId(pub Uuid);

impl fmt::Display for ApprovalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Draft,
    InProgress,
    Approved,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::InProgress => "IN_PROGRESS",
            Self::Approved => "APPROVED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "DRAFT" => Some(Self::Draft),
            "IN_PROGRESS" => Some(Self::InProgress),
            "APPROVED" => Some(Self::Approved),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    Pending,
    Active,
    Approved,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Active => "ACTIVE",
            Self::Approved => "APPROVED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "PENDING" => Some(Self::Pending),
            "ACTIVE" => Some(Self::Active),
            "APPROVED" => Some(Self::Approved),
            _ => None,
        }
    }
}

/// One unit of approval work, owned exclusively by its aggregate.
///
/// Transitions are strictly PENDING -> ACTIVE -> APPROVED; there is no
/// rejection or reactivation in this workflow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: StepId,
    pub step_order: u32,
    pub assignee_id: PrincipalId,
    pub status: StepStatus,
    pub approver_id: Option<PrincipalId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Step {
    pub fn new(id: StepId, step_order: u32, assignee_id: PrincipalId) -> Self {
        let now = Utc::now();
        Self {
            id,
            step_order,
            assignee_id,
            status: StepStatus::Pending,
            approver_id: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn activate(&mut self) -> Result<(), DomainError> {
        if self.status != StepStatus::Pending {
            return Err(DomainError::StepNotPending { step_id: self.id, status: self.status });
        }
        self.status = StepStatus::Active;
        self.updated_at = Utc::now();
        Ok(())
    }

    fn approve(&mut self, approver_id: PrincipalId) -> Result<StepApproved, DomainError> {
        if self.status != StepStatus::Active {
            return Err(DomainError::StepNotActive { step_id: self.id, status: self.status });
        }
        let approved_at = Utc::now();
        self.status = StepStatus::Approved;
        self.approver_id = Some(approver_id);
        self.approved_at = Some(approved_at);
        self.updated_at = approved_at;

        Ok(StepApproved { step_id: self.id, step_order: self.step_order, approver_id, approved_at })
    }
}

/// The fact produced by a successful step approval.
///
/// Unlike a `Step` reference this carries the approver metadata as plain
/// fields, so downstream event construction does not deal in options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepApproved {
    pub step_id: StepId,
    pub step_order: u32,
    pub approver_id: PrincipalId,
    pub approved_at: DateTime<Utc>,
}

/// Aggregate root for one sequential approval process.
///
/// `version` is the optimistic concurrency token: `None` until first
/// persisted, then incremented by the storage layer on every saved mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub id: ApprovalId,
    pub status: ApprovalStatus,
    pub version: Option<i64>,
    pub steps: Vec<Step>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Approval {
    /// Create a DRAFT approval from its full step list.
    ///
    /// Steps are reordered by `step_order`, which must be exactly `0..n` with
    /// no gaps or duplicates. Membership is immutable afterwards.
    pub fn new(id: ApprovalId, mut steps: Vec<Step>) -> Result<Self, DomainError> {
        steps.sort_by_key(|step| step.step_order);
        for (position, step) in steps.iter().enumerate() {
            if step.step_order as usize != position {
                return Err(DomainError::InvalidStepOrder {
                    step_id: step.id,
                    step_order: step.step_order,
                });
            }
        }

        let now = Utc::now();
        Ok(Self {
            id,
            status: ApprovalStatus::Draft,
            version: None,
            steps,
            created_at: now,
            updated_at: now,
        })
    }

    /// Move from DRAFT to IN_PROGRESS and activate the first step.
    pub fn start(&mut self) -> Result<(), DomainError> {
        if self.status != ApprovalStatus::Draft {
            return Err(DomainError::ApprovalNotDraft { status: self.status });
        }
        let Some(first) = self.steps.first_mut() else {
            return Err(DomainError::NoSteps);
        };

        first.activate()?;
        self.status = ApprovalStatus::InProgress;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Approve the identified step and advance the aggregate.
    ///
    /// The last step completes the approval; any earlier step activates its
    /// successor. Progression never revisits a step.
    pub fn approve_step(
        &mut self,
        step_id: StepId,
        approver_id: PrincipalId,
    ) -> Result<StepApproved, DomainError> {
        let position = self
            .steps
            .iter()
            .position(|step| step.id == step_id)
            .ok_or(DomainError::StepNotFound { step_id })?;

        let approved = self.steps[position].approve(approver_id)?;

        if position + 1 == self.steps.len() {
            self.status = ApprovalStatus::Approved;
        } else {
            self.steps[position + 1].activate()?;
            self.status = ApprovalStatus::InProgress;
        }
        self.updated_at = Utc::now();

        Ok(approved)
    }

    /// The single ACTIVE step, or `None` before start and after completion.
    pub fn active_step(&self) -> Option<&Step> {
        self.steps.iter().find(|step| step.status == StepStatus::Active)
    }
}
