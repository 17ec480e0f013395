//! Router, handlers and the TCP server loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use super::types::*;
use crate::error::SummarizeError;
use crate::model::SummaryResult;
use crate::repo_id::RepoId;
use crate::summarizer::Summarizer;

/// Response header carrying the handling time in seconds.
pub const PROCESS_TIME_HEADER: &str = "x-process-time";

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Shared state accessible to all route handlers.
pub struct AppState {
    pub summarizer: Summarizer,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(summarizer: Summarizer) -> Self {
        Self {
            summarizer,
            started_at: Instant::now(),
        }
    }
}

/// Build the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> axum::Router {
    axum::Router::new()
        .route("/health", get(handle_health))
        .route("/summarize", post(handle_summarize))
        .layer(middleware::from_fn(record_timing))
        .with_state(state)
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve(
    addr: &str,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    serve_on(listener, state, shutdown).await
}

/// Serve on an already-bound listener until `shutdown` resolves.
pub async fn serve_on(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    info!(addr = %listener.local_addr()?, "API server listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("API server shutting down");
        })
        .await
}

fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

impl From<SummarizeError> for ApiError {
    fn from(err: SummarizeError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        error_response(status, err.public_message())
    }
}

// ── Middleware ──────────────────────────────────────────────────────────

async fn record_timing(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let mut resp = next.run(req).await;

    let elapsed = start.elapsed();
    if let Ok(value) = HeaderValue::from_str(&format!("{:.3}", elapsed.as_secs_f64())) {
        resp.headers_mut().insert(PROCESS_TIME_HEADER, value);
    }
    info!(
        %method,
        %path,
        status = resp.status().as_u16(),
        elapsed_ms = elapsed.as_millis() as u64,
        "Request handled"
    );
    resp
}

// ── Route handlers ──────────────────────────────────────────────────────

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::build_info::VERSION.to_string(),
        git_hash: crate::build_info::GIT_HASH.to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        cached: state.summarizer.cache().len(),
    })
}

async fn handle_summarize(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SummarizeRequest>, JsonRejection>,
) -> Result<Json<SummaryResult>, ApiError> {
    let Json(req) =
        payload.map_err(|e| error_response(StatusCode::UNPROCESSABLE_ENTITY, e.body_text()))?;
    let repo = RepoId::parse(&req.github_url).map_err(|e| {
        warn!(input = %req.github_url, "Rejected repository identifier");
        error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
    })?;

    // A separate task keeps a panic inside the pipeline from tearing down the connection.
    let summarizer = state.summarizer.clone();
    let task_repo = repo.clone();
    let result = tokio::spawn(async move { summarizer.summarize(&task_repo).await })
        .await
        .unwrap_or_else(|e| {
            error!(%repo, error = %e, "Summarize task failed");
            Err(SummarizeError::Internal(format!("summarize task failed: {e}")))
        });

    Ok(Json(result?))
}
