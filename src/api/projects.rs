//! Project API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::{JsonBody, MessageResponse};
use crate::{
    error::AppResult,
    models::project::{Project, ProjectData},
};

/// List projects
#[utoipa::path(
    get,
    path = "/projects",
    tag = "projects",
    responses(
        (status = 200, description = "Projects sorted by name", body = Vec<Project>)
    )
)]
pub async fn list_projects(State(state): State<crate::AppState>) -> AppResult<Json<Vec<Project>>> {
    let projects = state.services.projects.list().await?;
    Ok(Json(projects))
}

/// Get project by ID
#[utoipa::path(
    get,
    path = "/projects/{id}",
    tag = "projects",
    params(("id" = i64, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project details", body = Project),
        (status = 404, description = "Project not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_project(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Project>> {
    let project = state.services.projects.get(id).await?;
    Ok(Json(project))
}

/// Create a project
#[utoipa::path(
    post,
    path = "/projects",
    tag = "projects",
    request_body = ProjectData,
    responses(
        (status = 201, description = "Project created", body = Project),
        (status = 400, description = "Missing name", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_project(
    State(state): State<crate::AppState>,
    JsonBody(data): JsonBody<ProjectData>,
) -> AppResult<(StatusCode, Json<Project>)> {
    let project = state.services.projects.create(data).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// Rename a project
#[utoipa::path(
    put,
    path = "/projects/{id}",
    tag = "projects",
    params(("id" = i64, Path, description = "Project ID")),
    request_body = ProjectData,
    responses(
        (status = 200, description = "Project updated", body = Project),
        (status = 404, description = "Project not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_project(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
    JsonBody(data): JsonBody<ProjectData>,
) -> AppResult<Json<Project>> {
    let project = state.services.projects.update(id, data).await?;
    Ok(Json(project))
}

/// Delete a project
#[utoipa::path(
    delete,
    path = "/projects/{id}",
    tag = "projects",
    params(("id" = i64, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project deleted", body = MessageResponse),
        (status = 400, description = "Project has active assignments", body = crate::error::ErrorResponse),
        (status = 404, description = "Project not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_project(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    state.services.projects.delete(id).await?;
    Ok(MessageResponse::new("Project deleted successfully"))
}
