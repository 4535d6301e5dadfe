//! HTTP server exposing the task REST API.
//!
//! This module provides the axum router, its handlers, and the serve loop.

use axum::{
    Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Json},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::repository::{PAGE_SIZE, TaskListQuery, TaskRepository};
use crate::resources::{TaskCollection, TaskResource};
use crate::validation::{TaskPayload, ValidationErrors, validate_create, validate_update};

/// Collection path for task routes.
pub const TASKS_PATH: &str = "/api/tasks";

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    repo: Arc<dyn TaskRepository>,
}

impl AppState {
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &dyn TaskRepository {
        self.repo.as_ref()
    }
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Query parameters for the task list.
#[derive(Debug, Deserialize)]
struct ListParams {
    status: Option<String>,
    page: Option<String>,
}

/// Missing, non-numeric and non-positive page values mean page 1.
fn parse_page(raw: Option<&str>) -> i64 {
    raw.and_then(|p| p.trim().parse::<i64>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1)
}

/// Ids that are not integers cannot exist.
fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.parse().map_err(|_| {
        warn!(task_id = %raw, "Task id is not an integer");
        ApiError::task_not_found(raw)
    })
}

fn rejected(errors: ValidationErrors) -> ApiError {
    warn!(fields = ?errors.fields().collect::<Vec<_>>(), "Rejected task payload");
    ApiError::validation(errors)
}

/// GET /api/tasks
async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<TaskCollection>> {
    let query = TaskListQuery {
        status: params.status.clone(),
        page: parse_page(params.page.as_deref()),
        per_page: PAGE_SIZE,
    };

    let page = state.repo().list(&query)?;

    Ok(Json(TaskCollection::from_page(
        &page,
        TASKS_PATH,
        params.status.as_deref(),
    )))
}

/// POST /api/tasks
async fn create_task(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<TaskResource>)> {
    let payload = TaskPayload::from_slice(&body).map_err(rejected)?;
    let new_task = validate_create(&payload).map_err(rejected)?;

    let task = state.repo().create(&new_task)?;

    Ok((StatusCode::CREATED, Json(TaskResource::from(task))))
}

/// GET /api/tasks/{id}
async fn show_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TaskResource>> {
    let id = parse_id(&id)?;
    let task = state.repo().get(id)?;
    Ok(Json(TaskResource::from(task)))
}

/// PUT/PATCH /api/tasks/{id}
///
/// The task is looked up before the body is validated, so a missing id is a
/// 404 even when the payload is also invalid.
async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<TaskResource>> {
    let id = parse_id(&id)?;
    state.repo().get(id)?;

    let payload = TaskPayload::from_slice(&body).map_err(rejected)?;
    let changes = validate_update(&payload).map_err(rejected)?;

    let task = state.repo().update(id, &changes)?;
    Ok(Json(TaskResource::from(task)))
}

/// DELETE /api/tasks/{id}
async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    state.repo().delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Health check endpoint.
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn fallback(uri: Uri) -> ApiError {
    ApiError::route_not_found(uri.path())
}

/// Build the router with all routes.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route(TASKS_PATH, get(list_tasks).post(create_task))
        .route(
            "/api/tasks/{id}",
            get(show_task)
                .put(update_task)
                .patch(update_task)
                .delete(delete_task),
        )
        .fallback(fallback)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API on `addr` until `shutdown` resolves.
pub async fn serve<F>(
    repo: Arc<dyn TaskRepository>,
    addr: SocketAddr,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(AppState::new(repo));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("Task API listening on http://{}", bound_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Task API stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "healthy",
            version: "0.1.0",
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("0.1.0"));
    }

    #[test]
    fn page_parameter_defaults_to_first_page() {
        assert_eq!(parse_page(None), 1);
        assert_eq!(parse_page(Some("")), 1);
        assert_eq!(parse_page(Some("abc")), 1);
        assert_eq!(parse_page(Some("0")), 1);
        assert_eq!(parse_page(Some("-4")), 1);
        assert_eq!(parse_page(Some("3")), 3);
    }

    #[test]
    fn non_integer_id_is_not_found() {
        let err = parse_id("abc").unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(parse_id("12").unwrap(), 12);
    }
}
