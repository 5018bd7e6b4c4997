//! External workflow backend: domain types and REST client

pub mod client;
pub mod types;

pub use client::{RestWorkflowClient, RestWorkflowClientConfig, WorkflowBackend};
pub use types::{
    ElementValue, NewTask, Principal, Process, ProcessState, Task, TaskDefinition,
    TaskDefinitionCode, TaskState,
};
