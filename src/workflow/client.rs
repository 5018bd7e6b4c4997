//! Workflow backend client
//!
//! `WorkflowBackend` is the seam between the decision logic and the external
//! process engine. `RestWorkflowClient` is the production implementation:
//! one pooled reqwest client, bearer token plus application id on every call,
//! bounded timeout, no retries. Any transport or non-2xx failure surfaces as
//! `BackendCallFailed` and aborts the handling pass.

use crate::error::{WorkerError, WorkerResult};
use crate::workflow::types::{NewTask, Process, Task};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Commands and queries the external workflow backend accepts
#[async_trait]
pub trait WorkflowBackend: Send + Sync {
    async fn retrieve_task(&self, task_id: Uuid) -> WorkerResult<Task>;

    async fn retrieve_process(&self, process_id: Uuid) -> WorkerResult<Process>;

    async fn create_task(&self, task: NewTask) -> WorkerResult<Task>;

    async fn assign_task(&self, task_id: Uuid, principal_id: Uuid) -> WorkerResult<()>;

    async fn start_process(&self, process_id: Uuid) -> WorkerResult<()>;

    async fn complete_process(&self, process_id: Uuid) -> WorkerResult<()>;
}

/// REST workflow client configuration
#[derive(Debug, Clone)]
pub struct RestWorkflowClientConfig {
    pub endpoint: String,
    pub application_id: String,
    pub token: String,
    pub timeout: Duration,
}

/// REST implementation of the workflow backend contract
pub struct RestWorkflowClient {
    config: RestWorkflowClientConfig,
    client: Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AssignTaskCommand {
    principal_id: Uuid,
}

impl RestWorkflowClient {
    /// Create a new client with a bounded-timeout connection pool
    pub fn new(config: RestWorkflowClientConfig) -> WorkerResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| WorkerError::backend_call_failed(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> WorkerResult<T> {
        let url = self.url(path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.token)
            .header("X-Application-Id", &self.config.application_id)
            .send()
            .await
            .map_err(|e| WorkerError::backend_call_failed(e.to_string()))?;

        Self::check_status(path, &response)?;

        response
            .json()
            .await
            .map_err(|e| WorkerError::backend_call_failed(format!("invalid response body: {e}")))
    }

    async fn post_json<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> WorkerResult<T> {
        let url = self.url(path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.token)
            .header("X-Application-Id", &self.config.application_id)
            .json(body)
            .send()
            .await
            .map_err(|e| WorkerError::backend_call_failed(e.to_string()))?;

        Self::check_status(path, &response)?;

        response
            .json()
            .await
            .map_err(|e| WorkerError::backend_call_failed(format!("invalid response body: {e}")))
    }

    async fn post_action(&self, path: &str) -> WorkerResult<()> {
        let url = self.url(path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.token)
            .header("X-Application-Id", &self.config.application_id)
            .send()
            .await
            .map_err(|e| WorkerError::backend_call_failed(e.to_string()))?;

        Self::check_status(path, &response)
    }

    fn check_status(path: &str, response: &reqwest::Response) -> WorkerResult<()> {
        let status = response.status();
        if !status.is_success() {
            return Err(WorkerError::backend_call_failed(format!(
                "{path} returned {status}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl WorkflowBackend for RestWorkflowClient {
    async fn retrieve_task(&self, task_id: Uuid) -> WorkerResult<Task> {
        self.get_json(&format!("/tasks/{task_id}")).await
    }

    async fn retrieve_process(&self, process_id: Uuid) -> WorkerResult<Process> {
        self.get_json(&format!("/processes/{process_id}")).await
    }

    async fn create_task(&self, task: NewTask) -> WorkerResult<Task> {
        self.post_json("/tasks", &task).await
    }

    async fn assign_task(&self, task_id: Uuid, principal_id: Uuid) -> WorkerResult<()> {
        let url = self.url(&format!("/tasks/{task_id}/actions/assign"));
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.token)
            .header("X-Application-Id", &self.config.application_id)
            .json(&AssignTaskCommand { principal_id })
            .send()
            .await
            .map_err(|e| WorkerError::backend_call_failed(e.to_string()))?;

        Self::check_status("assign task", &response)
    }

    async fn start_process(&self, process_id: Uuid) -> WorkerResult<()> {
        self.post_action(&format!("/processes/{process_id}/actions/start"))
            .await
    }

    async fn complete_process(&self, process_id: Uuid) -> WorkerResult<()> {
        self.post_action(&format!("/processes/{process_id}/actions/complete"))
            .await
    }
}
