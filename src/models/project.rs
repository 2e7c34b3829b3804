//! Project model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Job that tools are checked out for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Project {
    pub id: i64,
    pub name: String,
}

/// Create / update project request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ProjectData {
    #[validate(length(min = 1, message = "Project name is required"))]
    pub name: String,
}
