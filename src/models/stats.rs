//! Dashboard statistics

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Calibrable tool due (or overdue) for calibration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationAlert {
    pub tool_id: i64,
    pub name: String,
    pub calibration_due: NaiveDate,
    /// Negative when the due date has passed
    pub days_remaining: i64,
}

/// Tool counts per display status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub available: i64,
    pub in_use: i64,
    pub damaged: i64,
    pub lost: i64,
    pub calibration_due: i64,
}

/// Tool room overview
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_tools: i64,
    pub tools_by_status: StatusCounts,
    /// Units on the shelf across all tools
    pub available_units: i64,
    /// Units held by active assignments across all tools
    pub reserved_units: i64,
    pub active_assignments: i64,
    pub completed_assignments: i64,
    pub calibration_alerts: Vec<CalibrationAlert>,
}
