//! Assignment (tool loan) model and related types

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::project::Project;
use super::tool::{CustomAttributes, Tool, ToolStatus};
use super::worker::Worker;
use crate::error::AppError;

/// Assignment lifecycle state. The only transition is `Active -> Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Active,
    Completed,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Active => "active",
            AssignmentStatus::Completed => "completed",
        }
    }
}

impl FromStr for AssignmentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AssignmentStatus::Active),
            "completed" => Ok(AssignmentStatus::Completed),
            other => Err(AppError::Validation(format!("Unknown assignment status '{}'", other))),
        }
    }
}

/// Condition a tool is reported in at check-in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ToolCondition {
    #[default]
    Good,
    Damaged,
    Lost,
}

/// Reported condition per tool id, keys kept exactly as submitted
pub type ToolConditions = IndexMap<String, ToolCondition>;

/// Assignment record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: i64,
    pub checkout_date: DateTime<Utc>,
    pub checkin_date: Option<DateTime<Utc>>,
    pub worker_id: i64,
    pub project_id: i64,
    pub status: AssignmentStatus,
    pub checkin_notes: Option<String>,
    pub tool_conditions: ToolConditions,
}

impl Assignment {
    pub fn is_active(&self) -> bool {
        self.status == AssignmentStatus::Active
    }

    /// Reported condition of a tool, `Good` when nothing was reported
    pub fn condition_of(&self, tool_id: i64) -> ToolCondition {
        self.tool_conditions
            .iter()
            .find(|(key, _)| key.trim().parse::<i64>().ok() == Some(tool_id))
            .map(|(_, condition)| *condition)
            .unwrap_or_default()
    }
}

/// Raw `assignments` row as stored in SQLite
#[derive(Debug, FromRow)]
pub struct AssignmentRow {
    pub id: i64,
    pub checkout_date: DateTime<Utc>,
    pub checkin_date: Option<DateTime<Utc>>,
    pub worker_id: i64,
    pub project_id: i64,
    pub status: Option<String>,
    pub checkin_notes: Option<String>,
    pub tool_conditions: Option<Json<ToolConditions>>,
}

impl TryFrom<AssignmentRow> for Assignment {
    type Error = AppError;

    fn try_from(row: AssignmentRow) -> Result<Self, Self::Error> {
        let status = match row.status.as_deref() {
            None => AssignmentStatus::Active,
            Some(s) => s.parse().map_err(|_| {
                AppError::Internal(format!("Assignment {} has unknown status '{}'", row.id, s))
            })?,
        };

        Ok(Assignment {
            id: row.id,
            checkout_date: row.checkout_date,
            checkin_date: row.checkin_date,
            worker_id: row.worker_id,
            project_id: row.project_id,
            status,
            checkin_notes: row.checkin_notes,
            tool_conditions: row.tool_conditions.map(|Json(c)| c).unwrap_or_default(),
        })
    }
}

/// Assignment to be opened by a checkout
#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub checkout_date: DateTime<Utc>,
    pub worker_id: i64,
    pub project_id: i64,
}

/// Units of one tool reserved by one assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentTool {
    pub assignment_id: i64,
    pub tool_id: i64,
    pub quantity: i64,
}

/// Raw `assignment_tools` row
#[derive(Debug, FromRow)]
pub struct AssignmentToolRow {
    pub assignment_id: i64,
    pub tool_id: i64,
    pub quantity: Option<i64>,
}

impl From<AssignmentToolRow> for AssignmentTool {
    fn from(row: AssignmentToolRow) -> Self {
        Self {
            assignment_id: row.assignment_id,
            tool_id: row.tool_id,
            quantity: row.quantity.unwrap_or(1),
        }
    }
}

/// One line of a checkout request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolRequest {
    pub tool_id: i64,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i64,
}

/// Checkout request as received. Fields are optional so that missing ones
/// are reported as validation errors rather than decode failures.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub checkout_date: Option<DateTime<Utc>>,
    pub worker_id: Option<i64>,
    pub project_id: Option<i64>,
    pub tools: Option<Vec<ToolRequest>>,
}

/// Checkout request that passed validation
#[derive(Debug, Clone)]
pub struct CheckoutOrder {
    pub checkout_date: DateTime<Utc>,
    pub worker_id: i64,
    pub project_id: i64,
    pub tools: Vec<ToolRequest>,
}

impl TryFrom<CheckoutRequest> for CheckoutOrder {
    type Error = AppError;

    fn try_from(request: CheckoutRequest) -> Result<Self, Self::Error> {
        let missing = || AppError::Validation("Missing required fields".to_string());

        let checkout_date = request.checkout_date.ok_or_else(missing)?;
        let worker_id = request.worker_id.ok_or_else(missing)?;
        let project_id = request.project_id.ok_or_else(missing)?;
        let tools = request.tools.ok_or_else(missing)?;

        if tools.is_empty() {
            return Err(AppError::Validation("At least one tool is required".to_string()));
        }
        for line in &tools {
            line.validate()
                .map_err(|e| AppError::Validation(format!("Invalid tools payload: {}", e)))?;
        }

        Ok(CheckoutOrder {
            checkout_date,
            worker_id,
            project_id,
            tools,
        })
    }
}

/// Check-in request
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckinRequest {
    pub checkin_notes: Option<String>,
    /// Condition per tool id; tools not listed are returned in good condition
    #[schema(value_type = Option<Object>)]
    pub tool_conditions: Option<ToolConditions>,
}

/// Assignment list filters
#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AssignmentQuery {
    pub status: Option<AssignmentStatus>,
    pub worker_id: Option<i64>,
    pub project_id: Option<i64>,
}

impl AssignmentQuery {
    pub fn matches(&self, assignment: &Assignment) -> bool {
        self.status.map_or(true, |s| assignment.status == s)
            && self.worker_id.map_or(true, |id| assignment.worker_id == id)
            && self.project_id.map_or(true, |id| assignment.project_id == id)
    }
}

/// Tool as seen from an assignment: shelf stock next to the units this
/// assignment holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignedTool {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub status: ToolStatus,
    pub is_calibrable: bool,
    pub calibration_due: Option<NaiveDate>,
    pub certificate_number: Option<String>,
    pub image: Option<String>,
    #[schema(value_type = Object)]
    pub custom_attributes: CustomAttributes,
    /// Units of the tool currently on the shelf
    pub available_quantity: i64,
    /// Units reserved by this assignment
    pub assigned_quantity: i64,
}

impl AssignedTool {
    pub fn new(tool: Tool, assigned_quantity: i64) -> Self {
        Self {
            id: tool.id,
            name: tool.name,
            category: tool.category,
            status: tool.status,
            is_calibrable: tool.is_calibrable,
            calibration_due: tool.calibration_due,
            certificate_number: tool.certificate_number,
            image: tool.image,
            custom_attributes: tool.custom_attributes,
            available_quantity: tool.quantity,
            assigned_quantity,
        }
    }
}

/// Assignment with its worker, project and tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDetails {
    pub id: i64,
    pub checkout_date: DateTime<Utc>,
    pub checkin_date: Option<DateTime<Utc>>,
    pub status: AssignmentStatus,
    pub checkin_notes: Option<String>,
    #[schema(value_type = Object)]
    pub tool_conditions: ToolConditions,
    pub worker: Worker,
    pub project: Project,
    pub tools: Vec<AssignedTool>,
}
