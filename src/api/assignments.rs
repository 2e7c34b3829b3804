//! Assignment (checkout / check-in) API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::{JsonBody, OptionalJsonBody, QueryParams};
use crate::{
    error::AppResult,
    models::assignment::{AssignmentDetails, AssignmentQuery, CheckinRequest, CheckoutRequest},
};

/// List assignments with their worker, project and tools
#[utoipa::path(
    get,
    path = "/assignments",
    tag = "assignments",
    params(AssignmentQuery),
    responses(
        (status = 200, description = "Assignments, most recent checkout first", body = Vec<AssignmentDetails>)
    )
)]
pub async fn list_assignments(
    State(state): State<crate::AppState>,
    QueryParams(query): QueryParams<AssignmentQuery>,
) -> AppResult<Json<Vec<AssignmentDetails>>> {
    let assignments = state.services.assignments.list(&query).await?;
    Ok(Json(assignments))
}

/// Get assignment by ID
#[utoipa::path(
    get,
    path = "/assignments/{id}",
    tag = "assignments",
    params(("id" = i64, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Assignment details", body = AssignmentDetails),
        (status = 404, description = "Assignment not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_assignment(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AssignmentDetails>> {
    let assignment = state.services.assignments.get(id).await?;
    Ok(Json(assignment))
}

/// Check tools out to a worker for a project
#[utoipa::path(
    post,
    path = "/assignments",
    tag = "assignments",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Assignment opened", body = AssignmentDetails),
        (status = 400, description = "Invalid payload or not enough quantity", body = crate::error::ErrorResponse),
        (status = 404, description = "Worker, project or tool not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn checkout(
    State(state): State<crate::AppState>,
    JsonBody(request): JsonBody<CheckoutRequest>,
) -> AppResult<(StatusCode, Json<AssignmentDetails>)> {
    let assignment = state.services.assignments.checkout(request).await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

/// Check an assignment's tools back in
#[utoipa::path(
    put,
    path = "/assignments/{id}/checkin",
    tag = "assignments",
    params(("id" = i64, Path, description = "Assignment ID")),
    request_body = CheckinRequest,
    responses(
        (status = 200, description = "Assignment completed", body = AssignmentDetails),
        (status = 400, description = "Assignment already checked in", body = crate::error::ErrorResponse),
        (status = 404, description = "Assignment not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn checkin(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
    OptionalJsonBody(request): OptionalJsonBody<CheckinRequest>,
) -> AppResult<Json<AssignmentDetails>> {
    let assignment = state.services.assignments.checkin(id, request).await?;
    Ok(Json(assignment))
}
