// 🌐 HTTP API - axum router over the insights service
// Store work is blocking, so every handler hops onto the blocking pool.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info_span, warn, Span};
use uuid::Uuid;

use crate::error::{InsightsError, InsightsResult};
use crate::fetch::SqliteStore;
use crate::service::InsightsService;
use crate::shape::ErrorResponse;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    service: Arc<InsightsService<SqliteStore>>,
}

impl AppState {
    pub fn new(service: InsightsService<SqliteStore>) -> Self {
        AppState {
            service: Arc::new(service),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MaterialDataParams {
    pub material_ids: Option<String>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

fn request_span(route: &'static str) -> Span {
    info_span!("request", request_id = %Uuid::new_v4(), route)
}

fn error_response(err: &InsightsError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if status.is_server_error() {
        error!(code = err.code(), "{}", err);
    } else {
        warn!(code = err.code(), "{}", err);
    }

    (status, Json(ErrorResponse::from(err))).into_response()
}

/// Run one service call on the blocking pool inside the request span
async fn run_blocking<T, F>(state: AppState, span: Span, call: F) -> Response
where
    T: Serialize + Send + 'static,
    F: FnOnce(&InsightsService<SqliteStore>) -> InsightsResult<T> + Send + 'static,
{
    let worker_span = span.clone();
    let joined = tokio::task::spawn_blocking(move || {
        let _guard = worker_span.enter();
        call(&state.service)
    })
    .await;

    let _guard = span.enter();
    match joined {
        Ok(Ok(body)) => (StatusCode::OK, Json(body)).into_response(),
        Ok(Err(err)) => error_response(&err),
        Err(join_err) => {
            error!(error = %join_err, "request worker failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "An error occurred while processing the request".to_string(),
                    code: "INTERNAL_ERROR".to_string(),
                }),
            )
                .into_response()
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: crate::VERSION,
    })
}

/// GET /materials
async fn list_materials(State(state): State<AppState>) -> Response {
    run_blocking(state, request_span("materials"), |service| service.materials()).await
}

/// GET /materials/data?material_ids=M1,M2
async fn material_data(
    State(state): State<AppState>,
    Query(params): Query<MaterialDataParams>,
) -> Response {
    run_blocking(state, request_span("material_data"), move |service| {
        service.material_data(params.material_ids.as_deref())
    })
    .await
}

/// GET /materials/:material_id/monthly-consumption
async fn monthly_consumption(
    State(state): State<AppState>,
    Path(material_id): Path<String>,
) -> Response {
    run_blocking(state, request_span("monthly_consumption"), move |service| {
        service.monthly_consumption(&material_id)
    })
    .await
}

/// GET /equipment/:equipment/monthly-breakdowns
async fn monthly_breakdowns(
    State(state): State<AppState>,
    Path(equipment): Path<String>,
) -> Response {
    run_blocking(state, request_span("monthly_breakdowns"), move |service| {
        service.monthly_breakdowns(&equipment)
    })
    .await
}

/// GET /inventory/status
async fn inventory_status(State(state): State<AppState>) -> Response {
    run_blocking(state, request_span("inventory_status"), |service| {
        service.inventory_status()
    })
    .await
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/materials", get(list_materials))
        .route("/materials/data", get(material_data))
        .route(
            "/materials/:material_id/monthly-consumption",
            get(monthly_consumption),
        )
        .route(
            "/equipment/:equipment/monthly-breakdowns",
            get(monthly_breakdowns),
        )
        .route("/inventory/status", get(inventory_status))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
