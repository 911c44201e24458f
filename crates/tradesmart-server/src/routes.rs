//! HTTP API: webhook ingress and inspection endpoints.
//!
//! The webhook handler converts analysis errors to status codes at the
//! boundary: malformed input is 400, upstream failures are 500, and a
//! shared-secret mismatch is 401. Admission outcomes are asynchronous
//! and never change the response.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use tradesmart_core::{Alert, CloseReason, ClosedPosition, Position, Price, Wallet};
use tradesmart_engine::{PaperEngine, TradeError};
use tradesmart_notify::Notifier;

use crate::error::AnalysisError;
use crate::orchestrator::AnalysisOrchestrator;

/// Shared application state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<AnalysisOrchestrator>,
    pub engine: Arc<PaperEngine>,
    pub notifier: Arc<Notifier>,
    /// Shared secret for the webhook; `None` leaves it unauthenticated.
    pub webhook_secret: Option<String>,
}

/// Build the API router with CORS middleware and shared state.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/webhook", post(webhook))
        .route("/state", get(engine_state))
        .route("/history", get(history))
        .route("/health", get(health))
        .route("/positions/{id}/close", post(close_position))
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Webhook ingress
// ============================================================================

/// Raw webhook body; validated by hand so failures become a 400 with an
/// error list instead of an extractor rejection.
#[derive(Debug, Deserialize)]
struct WebhookRequest {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    exchange: Option<String>,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    price: Option<Price>,
    #[serde(default)]
    interval: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    secret: Option<String>,
}

#[derive(Debug, Serialize)]
struct ValidationErrors {
    errors: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: error.into(),
        }),
    )
        .into_response()
}

async fn webhook(State(state): State<AppState>, Json(body): Json<WebhookRequest>) -> Response {
    if let Some(expected) = state.webhook_secret.as_deref() {
        if body.secret.as_deref() != Some(expected) {
            warn!("Webhook rejected: shared secret mismatch");
            return error_response(StatusCode::UNAUTHORIZED, "invalid webhook secret");
        }
    }

    let mut errors = Vec::new();
    let symbol = body.symbol.unwrap_or_default();
    if symbol.trim().is_empty() {
        errors.push("symbol is required and must be non-empty".to_string());
    }
    if !errors.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(ValidationErrors { errors })).into_response();
    }

    let alert = Alert {
        symbol,
        exchange: body.exchange.unwrap_or_default(),
        action: body.action.unwrap_or_default(),
        price: body.price,
        interval: body.interval.unwrap_or_default(),
        message: body.message.unwrap_or_default(),
        secret: None,
        received_at: Utc::now(),
    };

    match state.orchestrator.analyze(alert).await {
        Ok(verdict) => (StatusCode::OK, Json(verdict)).into_response(),
        Err(AnalysisError::InvalidInput(reason)) => {
            (
                StatusCode::BAD_REQUEST,
                Json(ValidationErrors {
                    errors: vec![reason],
                }),
            )
                .into_response()
        }
        Err(e) => {
            warn!(%e, "Alert analysis failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

// ============================================================================
// Inspection endpoints
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StateResponse {
    wallet: Wallet,
    open_positions: Vec<Position>,
    last_updated_at: DateTime<Utc>,
}

async fn engine_state(State(state): State<AppState>) -> Json<StateResponse> {
    let snapshot = state.engine.state_snapshot();
    Json(StateResponse {
        wallet: snapshot.wallet,
        open_positions: snapshot.open_positions,
        last_updated_at: snapshot.last_updated_at,
    })
}

async fn history(State(state): State<AppState>) -> Json<Vec<ClosedPosition>> {
    Json(state.engine.closed_positions())
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    timestamp: DateTime<Utc>,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "tradesmart",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
    })
}

// ============================================================================
// Manual close
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CloseRequest {
    exit_price: Price,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CloseResponse {
    closed: ClosedPosition,
    wallet: Wallet,
}

async fn close_position(
    State(state): State<AppState>,
    Path(position_id): Path<String>,
    Json(body): Json<CloseRequest>,
) -> Response {
    match state
        .engine
        .close(&position_id, body.exit_price, CloseReason::Manual)
    {
        Ok(result) => {
            let send = state
                .notifier
                .on_position_closed(&result.closed, &result.wallet);
            tokio::spawn(send.dispatch());
            (
                StatusCode::OK,
                Json(CloseResponse {
                    closed: result.closed,
                    wallet: result.wallet,
                }),
            )
                .into_response()
        }
        Err(e @ TradeError::PositionNotFound(_)) => {
            error_response(StatusCode::NOT_FOUND, e.to_string())
        }
        Err(e) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
    }
}
