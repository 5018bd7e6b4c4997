//! Domain types for the external workflow backend
//!
//! The backend owns all workflow state; these types only mirror what the
//! worker observes (processes, tasks, element values) and what it sends back
//! (task creation requests). Wire format is camelCase JSON.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Process lifecycle state, owned by the backend and observed here
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessState {
    Created,
    Running,
    Completed,
}

/// Task lifecycle state, owned by the backend and observed here
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Created,
    Completed,
}

/// The closed set of task kinds in the loan approval workflow.
///
/// Used both to recognize which completed task triggered a transition and to
/// tag newly created tasks. Task codes arriving on the wire that are not in
/// this set deliberately fail `parse` so the dispatcher can no-op on them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskDefinitionCode {
    LoanApplication,
    ApproveLoan,
    NotificationRejection,
    NotificationGranted,
}

impl TaskDefinitionCode {
    /// Wire representation of this task code
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskDefinitionCode::LoanApplication => "LOAN_APPLICATION",
            TaskDefinitionCode::ApproveLoan => "APPROVE_LOAN",
            TaskDefinitionCode::NotificationRejection => "NOTIFICATION_REJECTION",
            TaskDefinitionCode::NotificationGranted => "NOTIFICATION_GRANTED",
        }
    }

    /// Parse a wire task code; `None` for codes outside the workflow
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "LOAN_APPLICATION" => Some(TaskDefinitionCode::LoanApplication),
            "APPROVE_LOAN" => Some(TaskDefinitionCode::ApproveLoan),
            "NOTIFICATION_REJECTION" => Some(TaskDefinitionCode::NotificationRejection),
            "NOTIFICATION_GRANTED" => Some(TaskDefinitionCode::NotificationGranted),
            _ => None,
        }
    }
}

/// A named field or decision value attached to a task
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ElementValue {
    /// A decision with a discrete code (e.g. "OK")
    Decision { code: String },
    /// A plain scalar value
    Scalar { value: String },
}

impl ElementValue {
    pub fn scalar<S: Into<String>>(value: S) -> Self {
        Self::Scalar {
            value: value.into(),
        }
    }

    pub fn decision<S: Into<String>>(code: S) -> Self {
        Self::Decision { code: code.into() }
    }
}

/// Task definition summary as carried on task resources
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskDefinition {
    pub code: String,
}

/// A task retrieved from the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub process_id: Uuid,
    pub task_definition: TaskDefinition,
    #[serde(default)]
    pub element_values: HashMap<String, ElementValue>,
}

/// A task creation request. Built fresh for each command, never mutated
/// after being sent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub process_id: Uuid,
    pub task_definition: TaskDefinition,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub element_values: HashMap<String, ElementValue>,
}

impl NewTask {
    pub fn new(process_id: Uuid, code: TaskDefinitionCode) -> Self {
        Self {
            process_id,
            task_definition: TaskDefinition {
                code: code.as_str().to_string(),
            },
            element_values: HashMap::new(),
        }
    }

    pub fn with_value<S: Into<String>>(mut self, code: S, value: ElementValue) -> Self {
        self.element_values.insert(code.into(), value);
        self
    }

    pub fn code(&self) -> &str {
        &self.task_definition.code
    }
}

/// The principal that started a process
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Principal {
    pub id: Uuid,
}

/// A process retrieved from the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    pub id: Uuid,
    pub state: ProcessState,
    pub initiator: Principal,
}
