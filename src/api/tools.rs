//! Tool API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::{JsonBody, MessageResponse, QueryParams};
use crate::{
    error::AppResult,
    models::tool::{CreateTool, Tool, ToolQuery, UpdateTool},
};

/// List tools
#[utoipa::path(
    get,
    path = "/tools",
    tag = "tools",
    params(ToolQuery),
    responses(
        (status = 200, description = "Tools sorted by name", body = Vec<Tool>)
    )
)]
pub async fn list_tools(
    State(state): State<crate::AppState>,
    QueryParams(query): QueryParams<ToolQuery>,
) -> AppResult<Json<Vec<Tool>>> {
    let tools = state.services.tools.list(&query).await?;
    Ok(Json(tools))
}

/// Get tool by ID
#[utoipa::path(
    get,
    path = "/tools/{id}",
    tag = "tools",
    params(("id" = i64, Path, description = "Tool ID")),
    responses(
        (status = 200, description = "Tool details", body = Tool),
        (status = 404, description = "Tool not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_tool(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Tool>> {
    let tool = state.services.tools.get(id).await?;
    Ok(Json(tool))
}

/// Register a tool
#[utoipa::path(
    post,
    path = "/tools",
    tag = "tools",
    request_body = CreateTool,
    responses(
        (status = 201, description = "Tool created", body = Tool),
        (status = 400, description = "Invalid payload", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_tool(
    State(state): State<crate::AppState>,
    JsonBody(data): JsonBody<CreateTool>,
) -> AppResult<(StatusCode, Json<Tool>)> {
    let tool = state.services.tools.create(data).await?;
    Ok((StatusCode::CREATED, Json(tool)))
}

/// Update a tool; only the provided fields change
#[utoipa::path(
    put,
    path = "/tools/{id}",
    tag = "tools",
    params(("id" = i64, Path, description = "Tool ID")),
    request_body = UpdateTool,
    responses(
        (status = 200, description = "Tool updated", body = Tool),
        (status = 404, description = "Tool not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_tool(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
    JsonBody(data): JsonBody<UpdateTool>,
) -> AppResult<Json<Tool>> {
    let tool = state.services.tools.update(id, data).await?;
    Ok(Json(tool))
}

/// Delete a tool
#[utoipa::path(
    delete,
    path = "/tools/{id}",
    tag = "tools",
    params(("id" = i64, Path, description = "Tool ID")),
    responses(
        (status = 200, description = "Tool deleted", body = MessageResponse),
        (status = 400, description = "Tool is checked out", body = crate::error::ErrorResponse),
        (status = 404, description = "Tool not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_tool(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    state.services.tools.delete(id).await?;
    Ok(MessageResponse::new("Tool deleted successfully"))
}
