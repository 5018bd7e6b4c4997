//! Mock implementations for testing
//!
//! Provides a recording `WorkflowBackend` and a fixed `RateSource` so engine
//! and dispatcher behavior can be asserted without external dependencies.

use crate::currency::RateSource;
use crate::error::{WorkerError, WorkerResult};
use crate::workflow::types::{
    ElementValue, NewTask, Principal, Process, ProcessState, Task, TaskDefinition,
    TaskDefinitionCode,
};
use crate::workflow::WorkflowBackend;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// One recorded command or query issued against the mock backend
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    RetrieveTask(Uuid),
    RetrieveProcess(Uuid),
    CreateTask(NewTask),
    AssignTask { task_id: Uuid, principal_id: Uuid },
    StartProcess(Uuid),
    CompleteProcess(Uuid),
}

/// Mock workflow backend that records every call and serves seeded fixtures
#[derive(Debug, Default)]
pub struct MockBackend {
    tasks: Arc<Mutex<HashMap<Uuid, Task>>>,
    processes: Arc<Mutex<HashMap<Uuid, Process>>>,
    calls: Arc<Mutex<Vec<BackendCall>>>,
    fail_complete_process: AtomicBool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a retrievable task with the given definition code and values
    pub async fn seed_task(
        &self,
        code: TaskDefinitionCode,
        values: Vec<(&str, ElementValue)>,
    ) -> Task {
        let task = Task {
            id: Uuid::new_v4(),
            process_id: Uuid::new_v4(),
            task_definition: TaskDefinition {
                code: code.as_str().to_string(),
            },
            element_values: values
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        };

        self.tasks.lock().await.insert(task.id, task.clone());
        task
    }

    /// Seed a running process with a fresh initiator
    pub async fn seed_process_for(&self, process_id: Uuid) -> Process {
        let process = Process {
            id: process_id,
            state: ProcessState::Running,
            initiator: Principal { id: Uuid::new_v4() },
        };

        self.processes.lock().await.insert(process_id, process.clone());
        process
    }

    /// Initiator of a seeded process
    pub async fn process_initiator(&self, process_id: Uuid) -> Uuid {
        self.processes.lock().await[&process_id].initiator.id
    }

    /// Make `complete_process` fail from now on
    pub fn fail_on_complete_process(&self) {
        self.fail_complete_process.store(true, Ordering::SeqCst);
    }

    /// Every call issued so far, in order
    pub async fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().await.clone()
    }

    /// The task creation requests issued so far, in order
    pub async fn created_tasks(&self) -> Vec<NewTask> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|call| match call {
                BackendCall::CreateTask(task) => Some(task.clone()),
                _ => None,
            })
            .collect()
    }

    /// Process ids completed so far, in order
    pub async fn completed_processes(&self) -> Vec<Uuid> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|call| match call {
                BackendCall::CompleteProcess(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    async fn record(&self, call: BackendCall) {
        self.calls.lock().await.push(call);
    }
}

#[async_trait]
impl WorkflowBackend for MockBackend {
    async fn retrieve_task(&self, task_id: Uuid) -> WorkerResult<Task> {
        self.record(BackendCall::RetrieveTask(task_id)).await;

        self.tasks
            .lock()
            .await
            .get(&task_id)
            .cloned()
            .ok_or_else(|| WorkerError::backend_call_failed(format!("task {task_id} not found")))
    }

    async fn retrieve_process(&self, process_id: Uuid) -> WorkerResult<Process> {
        self.record(BackendCall::RetrieveProcess(process_id)).await;

        self.processes
            .lock()
            .await
            .get(&process_id)
            .cloned()
            .ok_or_else(|| {
                WorkerError::backend_call_failed(format!("process {process_id} not found"))
            })
    }

    async fn create_task(&self, task: NewTask) -> WorkerResult<Task> {
        self.record(BackendCall::CreateTask(task.clone())).await;

        let created = Task {
            id: Uuid::new_v4(),
            process_id: task.process_id,
            task_definition: task.task_definition,
            element_values: task.element_values,
        };

        self.tasks.lock().await.insert(created.id, created.clone());
        Ok(created)
    }

    async fn assign_task(&self, task_id: Uuid, principal_id: Uuid) -> WorkerResult<()> {
        self.record(BackendCall::AssignTask {
            task_id,
            principal_id,
        })
        .await;
        Ok(())
    }

    async fn start_process(&self, process_id: Uuid) -> WorkerResult<()> {
        self.record(BackendCall::StartProcess(process_id)).await;
        Ok(())
    }

    async fn complete_process(&self, process_id: Uuid) -> WorkerResult<()> {
        self.record(BackendCall::CompleteProcess(process_id)).await;

        if self.fail_complete_process.load(Ordering::SeqCst) {
            return Err(WorkerError::backend_call_failed(
                "mock complete process failure",
            ));
        }
        Ok(())
    }
}

/// Rate source returning a fixed rate while counting lookups
#[derive(Debug)]
pub struct FixedRateSource {
    rate: f64,
    calls: AtomicUsize,
}

impl FixedRateSource {
    pub fn new(rate: f64) -> Self {
        Self {
            rate,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateSource for FixedRateSource {
    async fn fetch_rate(&self, _from: &str, _to: &str) -> WorkerResult<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rate)
    }
}
