//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::Config;
use crate::enrichment::{Enricher, GeminiClient};
use crate::events::{DisabledEventPublisher, EventPublisher, HttpEventPublisher};
use crate::orchestrator::TaskOrchestrator;
use crate::store::{StoreError, Subtask, Task, TaskStore};

use super::types::*;

/// Shared application state.
///
/// Owns the store and both collaborators; handlers reach them through this
/// state rather than through any process-wide global.
pub struct AppState {
    pub config: Config,
    pub store: TaskStore,
    pub orchestrator: TaskOrchestrator,
    pub events: Arc<dyn EventPublisher>,
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let store = TaskStore::new();

    let enricher: Option<Arc<dyn Enricher>> = match &config.enrichment.api_key {
        Some(api_key) => {
            tracing::info!("Enrichment enabled (model {})", config.enrichment.model);
            Some(Arc::new(GeminiClient::new(
                api_key.clone(),
                config.enrichment.model.clone(),
                config.enrichment.timeout,
            )))
        }
        None => {
            tracing::info!("Enrichment disabled (GEMINI_API_KEY not set)");
            None
        }
    };

    let events: Arc<dyn EventPublisher> = match &config.events.proxy_url {
        Some(proxy_url) => {
            tracing::info!(
                "Event bus enabled ({} topic {})",
                proxy_url,
                config.events.topic
            );
            Arc::new(HttpEventPublisher::new(
                proxy_url.clone(),
                config.events.topic.clone(),
            ))
        }
        None => {
            tracing::info!("Event bus disabled (EVENT_PROXY_URL not set); events will be dropped");
            Arc::new(DisabledEventPublisher)
        }
    };

    let orchestrator = TaskOrchestrator::new(store.clone(), enricher, Arc::clone(&events));

    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        orchestrator,
        events,
    });

    let app = router(Arc::clone(&state));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    // Setup graceful shutdown on SIGTERM/SIGINT
    let shutdown_state = Arc::clone(&state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal(shutdown_state).await;
        })
        .await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/:id",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/tasks/:id/subtasks", get(list_subtasks))
        .route(
            "/tasks/:id/subtasks/:subtask_id",
            get(get_subtask).put(update_subtask),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Wait for shutdown signal, then drain pending events.
async fn shutdown_signal(state: Arc<AppState>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, flushing pending events...");
    if let Err(e) = state.events.flush(state.config.events.flush_timeout).await {
        tracing::warn!("Event flush on shutdown incomplete: {}", e);
    }

    tracing::info!("Graceful shutdown complete");
}

/// Map a store error onto an HTTP status and detail string.
fn store_error(err: StoreError) -> (StatusCode, String) {
    if err.is_not_found() {
        (StatusCode::NOT_FOUND, err.to_string())
    } else if matches!(err, StoreError::InvalidArgument(_)) {
        (StatusCode::BAD_REQUEST, err.to_string())
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

/// Health check endpoint.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let events_ok = state.events.is_enabled();
    let enrichment_ok = state.config.enrichment.is_enabled();

    Json(HealthResponse {
        status: if events_ok { "healthy" } else { "degraded" }.to_string(),
        service: "task-manager-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            api: "ok".to_string(),
            events: if events_ok { "ok" } else { "disabled" }.to_string(),
            enrichment: if enrichment_ok { "ok" } else { "not_configured" }.to_string(),
        },
    })
}

/// Create a new task.
async fn create_task(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), (StatusCode, String)> {
    req.validate().map_err(|e| (StatusCode::BAD_REQUEST, e))?;

    let task = state
        .orchestrator
        .create_task(&req.title, &req.description, req.priority)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Internal server error: {}", e),
            )
        })?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// List all tasks with optional filtering by priority and status.
async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListTasksQuery>,
) -> Json<Vec<Task>> {
    Json(state.store.list_tasks(query.priority, query.status).await)
}

/// Get a specific task by ID.
async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>, (StatusCode, String)> {
    state
        .store
        .get_task(id)
        .await
        .map(Json)
        .ok_or_else(|| store_error(StoreError::TaskNotFound(id)))
}

/// Update task status.
async fn update_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Task>, (StatusCode, String)> {
    state
        .store
        .update_task_status(id, req.status)
        .await
        .map(Json)
        .map_err(store_error)
}

/// Delete a task and its subtasks.
async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.store.delete_task(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(store_error(StoreError::TaskNotFound(id)))
    }
}

/// List a task's subtasks.
async fn list_subtasks(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Subtask>>, (StatusCode, String)> {
    if state.store.get_task(id).await.is_none() {
        return Err(store_error(StoreError::TaskNotFound(id)));
    }
    Ok(Json(state.store.list_subtasks(id).await))
}

/// Get a specific subtask.
async fn get_subtask(
    State(state): State<Arc<AppState>>,
    Path((id, subtask_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Subtask>, (StatusCode, String)> {
    if state.store.get_task(id).await.is_none() {
        return Err(store_error(StoreError::TaskNotFound(id)));
    }
    state
        .store
        .get_subtask(id, subtask_id)
        .await
        .map(Json)
        .ok_or_else(|| store_error(StoreError::SubtaskNotFound(subtask_id)))
}

/// Update subtask status.
async fn update_subtask(
    State(state): State<Arc<AppState>>,
    Path((id, subtask_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Subtask>, (StatusCode, String)> {
    state
        .store
        .update_subtask_status(id, subtask_id, req.status)
        .await
        .map(Json)
        .map_err(store_error)
}
