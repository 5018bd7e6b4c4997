//! Loan worker - webhook-driven loan approval automation
//!
//! A worker that reacts to state-change webhooks from an external workflow
//! backend and drives a loan approval process on it:
//! - Typed webhook event parsing and routing
//! - The loan approval decision engine (threshold, currency normalization,
//!   authorization decision)
//! - REST client for the workflow backend's task/process commands
//! - Currency conversion against an external rate service
//!
//! # Quick Start
//!
//! ```rust
//! use loan_worker::webhook::parse_event;
//!
//! let payload = r#"{
//!     "type": "PROCESS.STATE_CHANGED",
//!     "data": {
//!         "processId": "1fa8075e-e1b2-4bdb-a1ae-bb22cba26d27",
//!         "processState": "RUNNING"
//!     }
//! }"#;
//!
//! let event = parse_event(payload).unwrap();
//! assert!(event.is_some());
//! ```

pub mod config;
pub mod currency;
pub mod engine;
pub mod error;
pub mod observability;
pub mod server;
pub mod testing;
pub mod webhook;
pub mod workflow;

pub use config::WorkerConfig;
pub use currency::{CurrencyConverter, HttpRateSource, RateSource};
pub use engine::LoanWorkflowEngine;
pub use error::{WorkerError, WorkerResult};
pub use webhook::{parse_event, WebhookDispatcher, WebhookEvent};
pub use workflow::{RestWorkflowClient, RestWorkflowClientConfig, WorkflowBackend};
