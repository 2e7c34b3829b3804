//! Worker API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::{JsonBody, MessageResponse};
use crate::{
    error::AppResult,
    models::worker::{Worker, WorkerData},
};

/// List workers
#[utoipa::path(
    get,
    path = "/workers",
    tag = "workers",
    responses(
        (status = 200, description = "Workers sorted by name", body = Vec<Worker>)
    )
)]
pub async fn list_workers(State(state): State<crate::AppState>) -> AppResult<Json<Vec<Worker>>> {
    let workers = state.services.workers.list().await?;
    Ok(Json(workers))
}

/// Get worker by ID
#[utoipa::path(
    get,
    path = "/workers/{id}",
    tag = "workers",
    params(("id" = i64, Path, description = "Worker ID")),
    responses(
        (status = 200, description = "Worker details", body = Worker),
        (status = 404, description = "Worker not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_worker(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Worker>> {
    let worker = state.services.workers.get(id).await?;
    Ok(Json(worker))
}

/// Create a worker
#[utoipa::path(
    post,
    path = "/workers",
    tag = "workers",
    request_body = WorkerData,
    responses(
        (status = 201, description = "Worker created", body = Worker),
        (status = 400, description = "Missing fields or duplicate employee ID", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_worker(
    State(state): State<crate::AppState>,
    JsonBody(data): JsonBody<WorkerData>,
) -> AppResult<(StatusCode, Json<Worker>)> {
    let worker = state.services.workers.create(data).await?;
    Ok((StatusCode::CREATED, Json(worker)))
}

/// Update a worker
#[utoipa::path(
    put,
    path = "/workers/{id}",
    tag = "workers",
    params(("id" = i64, Path, description = "Worker ID")),
    request_body = WorkerData,
    responses(
        (status = 200, description = "Worker updated", body = Worker),
        (status = 400, description = "Missing fields or duplicate employee ID", body = crate::error::ErrorResponse),
        (status = 404, description = "Worker not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_worker(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
    JsonBody(data): JsonBody<WorkerData>,
) -> AppResult<Json<Worker>> {
    let worker = state.services.workers.update(id, data).await?;
    Ok(Json(worker))
}

/// Delete a worker
#[utoipa::path(
    delete,
    path = "/workers/{id}",
    tag = "workers",
    params(("id" = i64, Path, description = "Worker ID")),
    responses(
        (status = 200, description = "Worker deleted", body = MessageResponse),
        (status = 400, description = "Worker has active assignments", body = crate::error::ErrorResponse),
        (status = 404, description = "Worker not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_worker(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    state.services.workers.delete(id).await?;
    Ok(MessageResponse::new("Worker deleted successfully"))
}
