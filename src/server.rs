//! Webhook HTTP server
//!
//! Exposes the inbound surface: `POST /webhooks` for deliveries from the
//! workflow platform, plus liveness endpoints for container orchestration.
//! The dispatcher is shared behind an `Arc`; it holds no mutable state, so
//! concurrent deliveries need no coordination here.

use crate::currency::RateSource;
use crate::error::WorkerError;
use crate::webhook::WebhookDispatcher;
use crate::workflow::WorkflowBackend;
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info};
use warp::http::StatusCode;
use warp::Filter;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: u64,
}

#[derive(Debug, Serialize)]
struct LivenessResponse {
    alive: bool,
    timestamp: u64,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    timestamp: u64,
}

/// Build the warp route tree around a shared dispatcher
pub fn routes<B, R>(
    dispatcher: Arc<WebhookDispatcher<B, R>>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone
where
    B: WorkflowBackend + Send + Sync + 'static,
    R: RateSource + Send + Sync + 'static,
{
    // POST /webhooks - one delivery, one handling pass
    let webhooks_route = warp::path("webhooks")
        .and(warp::post())
        .and(warp::body::bytes())
        .and_then(move |body: bytes::Bytes| {
            let dispatcher = dispatcher.clone();
            async move {
                let payload = match std::str::from_utf8(&body) {
                    Ok(payload) => payload,
                    Err(e) => {
                        let error = WorkerError::malformed_payload(format!("not utf-8: {e}"));
                        return Ok::<_, Infallible>(error_reply(&error));
                    }
                };

                match dispatcher.handle(payload).await {
                    Ok(()) => Ok::<_, Infallible>(warp::reply::with_status(
                        warp::reply::json(&serde_json::json!({})),
                        StatusCode::OK,
                    )),
                    Err(e) => {
                        error!("Webhook handling failed: {}", e);
                        Ok::<_, Infallible>(error_reply(&e))
                    }
                }
            }
        });

    // GET /health - overall status
    let health_route = warp::path("health").and(warp::get()).map(|| {
        warp::reply::json(&HealthResponse {
            status: "healthy",
            timestamp: current_timestamp(),
        })
    });

    // GET /live - liveness probe
    let live_route = warp::path("live").and(warp::get()).map(|| {
        warp::reply::json(&LivenessResponse {
            alive: true,
            timestamp: current_timestamp(),
        })
    });

    webhooks_route.or(health_route).or(live_route)
}

fn error_reply(error: &WorkerError) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(
        warp::reply::json(&ErrorResponse {
            error: error.to_string(),
            timestamp: current_timestamp(),
        }),
        error.status_code(),
    )
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Serve the webhook endpoint until the shutdown future resolves
pub async fn serve<B, R, F>(dispatcher: Arc<WebhookDispatcher<B, R>>, port: u16, shutdown: F)
where
    B: WorkflowBackend + Send + Sync + 'static,
    R: RateSource + Send + Sync + 'static,
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let (addr, server) =
        warp::serve(routes(dispatcher)).bind_with_graceful_shutdown(([0, 0, 0, 0], port), shutdown);

    info!("Webhook server listening on {}", addr);

    server.await;
}
