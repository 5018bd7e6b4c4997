//! Webhook event parsing and dispatch
//!
//! One inbound delivery is one self contained handling pass: log the raw
//! payload, turn it into a typed event, hand it to the engine. Event types
//! this worker does not know about are acknowledged and dropped; only an
//! unparseable body is an error.

use crate::currency::RateSource;
use crate::engine::LoanWorkflowEngine;
use crate::error::{WorkerError, WorkerResult};
use crate::workflow::types::{ProcessState, TaskState};
use crate::workflow::WorkflowBackend;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

const EVENT_PROCESS_STATE_CHANGED: &str = "PROCESS.STATE_CHANGED";
const EVENT_TASK_STATE_CHANGED: &str = "TASK.STATE_CHANGED";

/// A typed webhook event, constructed once per inbound payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum WebhookEvent {
    #[serde(rename = "PROCESS.STATE_CHANGED")]
    ProcessStateChanged { data: ProcessStateChangedData },
    #[serde(rename = "TASK.STATE_CHANGED")]
    TaskStateChanged { data: TaskStateChangedData },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessStateChangedData {
    pub process_id: Uuid,
    pub process_state: ProcessState,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskStateChangedData {
    pub task_id: Uuid,
    pub process_id: Uuid,
    pub task_code: String,
    pub task_state: TaskState,
}

/// Parse a raw payload into a typed event.
///
/// `Ok(None)` means the payload was well formed but of an event type this
/// worker does not handle. Keeping that fallback explicit here is what stops
/// newly introduced event kinds from being dropped unnoticed.
pub fn parse_event(payload: &str) -> WorkerResult<Option<WebhookEvent>> {
    let value: serde_json::Value = serde_json::from_str(payload)
        .map_err(|e| WorkerError::malformed_payload(e.to_string()))?;

    let kind = value
        .get("type")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| WorkerError::malformed_payload("event type missing"))?;

    match kind {
        EVENT_PROCESS_STATE_CHANGED | EVENT_TASK_STATE_CHANGED => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| WorkerError::malformed_payload(e.to_string())),
        other => {
            debug!(event_type = %other, "Ignoring unhandled webhook event type");
            Ok(None)
        }
    }
}

/// Entry point for inbound deliveries; stateless and safe to share across
/// concurrent requests
pub struct WebhookDispatcher<B, R> {
    engine: LoanWorkflowEngine<B, R>,
}

impl<B: WorkflowBackend, R: RateSource> WebhookDispatcher<B, R> {
    pub fn new(engine: LoanWorkflowEngine<B, R>) -> Self {
        Self { engine }
    }

    /// Handle one raw webhook delivery end to end
    pub async fn handle(&self, payload: &str) -> WorkerResult<()> {
        info!("Event {}", payload);

        match parse_event(payload)? {
            Some(event) => self.engine.handle_event(event).await,
            None => Ok(()),
        }
    }
}
