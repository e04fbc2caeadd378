//! JSON API consumed by the dashboard

use crate::aggregator::ThreatAggregator;
use crate::config::AppConfig;
use crate::types::{AggregatorError, DashboardData, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<ThreatAggregator>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/scan", post(scan))
        .route("/api/data", get(data))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: &AppConfig, aggregator: Arc<ThreatAggregator>) -> Result<()> {
    let app = create_router(AppState { aggregator });

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub status: &'static str,
    pub count: usize,
}

async fn scan(State(state): State<AppState>) -> std::result::Result<Json<ScanResponse>, ApiError> {
    let report = state.aggregator.scan().await?;
    Ok(Json(ScanResponse {
        status: "success",
        count: report.new_records,
    }))
}

async fn data(State(state): State<AppState>) -> std::result::Result<Json<DashboardData>, ApiError> {
    Ok(Json(state.aggregator.dashboard().await?))
}

/// Any failure behind the API surfaces as a 500 with a JSON body.
#[derive(Debug)]
pub struct ApiError(AggregatorError);

impl From<AggregatorError> for ApiError {
    fn from(err: AggregatorError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("Request failed: {}", self.0);

        let status = StatusCode::INTERNAL_SERVER_ERROR;
        let body = Json(json!({
            "error": self.0.to_string(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}
