//! Loan approval decision logic
//!
//! The engine is a deterministic function from (webhook event, externally
//! fetched task data) to a sequence of backend commands. It keeps no state of
//! its own; every handling pass is self contained.
//!
//! Task sequence driven here:
//!
//! ```text
//! LOAN_APPLICATION -> { APPROVE_LOAN (amount over threshold) }
//!                  -> { NOTIFICATION_GRANTED | NOTIFICATION_REJECTION }
//!                  -> process completes
//! ```
//!
//! Commands within one pass are awaited in order (create, then assign, then
//! complete). There is no compensation: a failure mid-pass leaves earlier
//! commands standing, and re-delivery of the event is the upstream platform's
//! concern.

pub mod fields;

use crate::currency::{CurrencyConverter, RateSource};
use crate::error::WorkerResult;
use crate::webhook::{ProcessStateChangedData, TaskStateChangedData, WebhookEvent};
use crate::workflow::types::{
    ElementValue, NewTask, ProcessState, Task, TaskDefinitionCode, TaskState,
};
use crate::workflow::WorkflowBackend;
use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

const FIELD_CURRENCY: &str = "currency";
const FIELD_AMOUNT: &str = "amount";
const FIELD_FIRST_NAME: &str = "firstName";
const FIELD_LAST_NAME: &str = "lastName";
const FIELD_AUTHORIZED: &str = "authorized";
const FIELD_NAME: &str = "name";
const FIELD_AMOUNT_REQUESTED: &str = "amountRequested";

const DECISION_AUTHORIZED_OK: &str = "OK";

const TARGET_CURRENCY: &str = "EUR";

/// Loans above this EUR amount need manual approval. Strictly greater than:
/// exactly 5000 EUR is auto-granted.
fn approval_threshold() -> Decimal {
    Decimal::from(5000)
}

/// The loan approval state machine, generic over the backend and rate seams
pub struct LoanWorkflowEngine<B, R> {
    backend: B,
    converter: CurrencyConverter<R>,
}

impl<B: WorkflowBackend, R: RateSource> LoanWorkflowEngine<B, R> {
    pub fn new(backend: B, converter: CurrencyConverter<R>) -> Self {
        Self { backend, converter }
    }

    /// Handle one typed webhook event
    pub async fn handle_event(&self, event: WebhookEvent) -> WorkerResult<()> {
        match event {
            WebhookEvent::ProcessStateChanged { data } => {
                self.handle_process_state_changed(data).await
            }
            WebhookEvent::TaskStateChanged { data } => self.handle_task_state_changed(data).await,
        }
    }

    async fn handle_process_state_changed(
        &self,
        data: ProcessStateChangedData,
    ) -> WorkerResult<()> {
        if data.process_state != ProcessState::Running {
            debug!(
                process_id = %data.process_id,
                state = ?data.process_state,
                "Ignoring process state change"
            );
            return Ok(());
        }

        info!(process_id = %data.process_id, "Process running, creating loan application task");

        // No initial fields: the initiator fills them in through the UI.
        self.backend
            .create_task(NewTask::new(
                data.process_id,
                TaskDefinitionCode::LoanApplication,
            ))
            .await?;

        Ok(())
    }

    async fn handle_task_state_changed(&self, data: TaskStateChangedData) -> WorkerResult<()> {
        if data.task_state != TaskState::Completed {
            debug!(task_id = %data.task_id, state = ?data.task_state, "Ignoring task state change");
            return Ok(());
        }

        // Codes outside the workflow's closed set are an explicit no-op, so a
        // newly introduced task kind never trips the engine.
        match TaskDefinitionCode::parse(&data.task_code) {
            Some(TaskDefinitionCode::LoanApplication) => {
                self.handle_loan_application_completed(&data).await
            }
            Some(TaskDefinitionCode::ApproveLoan) => self.handle_approve_loan_completed(&data).await,
            Some(_) | None => {
                debug!(task_code = %data.task_code, "No transition for completed task");
                Ok(())
            }
        }
    }

    /// Applicant submitted the loan application: normalize the amount to EUR
    /// and either escalate for approval or grant immediately.
    async fn handle_loan_application_completed(
        &self,
        data: &TaskStateChangedData,
    ) -> WorkerResult<()> {
        let task = self.backend.retrieve_task(data.task_id).await?;

        let currency = fields::get_field(&task, FIELD_CURRENCY)?;
        let amount = fields::get_amount(&task, FIELD_AMOUNT)?;

        let amount_eur = self
            .converter
            .convert(amount, currency, TARGET_CURRENCY)
            .await?;

        info!(
            process_id = %data.process_id,
            %amount_eur,
            "Loan application completed"
        );

        if amount_eur > approval_threshold() {
            self.create_approve_loan_task(&task, amount_eur).await?;
        } else {
            self.notify_and_complete(data.process_id, TaskDefinitionCode::NotificationGranted)
                .await?;
        }

        Ok(())
    }

    /// Approver decided: notify the initiator accordingly and complete.
    async fn handle_approve_loan_completed(&self, data: &TaskStateChangedData) -> WorkerResult<()> {
        let task = self.backend.retrieve_task(data.task_id).await?;

        let authorized = fields::get_decision(&task, FIELD_AUTHORIZED)?;

        let notification = if authorized == DECISION_AUTHORIZED_OK {
            TaskDefinitionCode::NotificationGranted
        } else {
            TaskDefinitionCode::NotificationRejection
        };

        info!(
            process_id = %data.process_id,
            decision = %authorized,
            "Approval task completed"
        );

        self.notify_and_complete(data.process_id, notification).await
    }

    async fn create_approve_loan_task(&self, application: &Task, amount_eur: Decimal) -> WorkerResult<()> {
        let first_name = fields::get_field(application, FIELD_FIRST_NAME)?;
        let last_name = fields::get_field(application, FIELD_LAST_NAME)?;

        let task = NewTask::new(application.process_id, TaskDefinitionCode::ApproveLoan)
            .with_value(
                FIELD_NAME,
                ElementValue::scalar(format!("{first_name} {last_name}")),
            )
            .with_value(
                FIELD_AMOUNT_REQUESTED,
                ElementValue::scalar(amount_eur.to_string()),
            );

        self.backend.create_task(task).await?;

        Ok(())
    }

    /// Create the notification task, hand it to the process initiator, then
    /// complete the process. Strictly in that order.
    async fn notify_and_complete(
        &self,
        process_id: Uuid,
        code: TaskDefinitionCode,
    ) -> WorkerResult<()> {
        let notification = self
            .backend
            .create_task(NewTask::new(process_id, code))
            .await?;

        let process = self.backend.retrieve_process(process_id).await?;

        self.backend
            .assign_task(notification.id, process.initiator.id)
            .await?;

        self.backend.complete_process(process_id).await?;

        Ok(())
    }
}
