//! Tool model and related types

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::AppError;

/// Free-form tool attributes (brand, model, range...), in insertion order
pub type CustomAttributes = IndexMap<String, String>;

/// Display status of a tool.
///
/// `Damaged` and `Lost` are sticky: they survive checkouts and returns until
/// someone edits the tool by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ToolStatus {
    Available,
    #[serde(rename = "In Use")]
    InUse,
    Damaged,
    Lost,
    #[serde(rename = "Cal. Due")]
    CalibrationDue,
}

impl ToolStatus {
    pub const ALL: [ToolStatus; 5] = [
        ToolStatus::Available,
        ToolStatus::InUse,
        ToolStatus::Damaged,
        ToolStatus::Lost,
        ToolStatus::CalibrationDue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolStatus::Available => "Available",
            ToolStatus::InUse => "In Use",
            ToolStatus::Damaged => "Damaged",
            ToolStatus::Lost => "Lost",
            ToolStatus::CalibrationDue => "Cal. Due",
        }
    }

    /// Whether this status overrides quantity-derived status
    pub fn is_sticky(&self) -> bool {
        matches!(self, ToolStatus::Damaged | ToolStatus::Lost)
    }
}

impl FromStr for ToolStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AppError::Validation(format!("Unknown tool status '{}'", s)))
    }
}

impl std::fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tool record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub id: i64,
    pub name: String,
    /// Free-text classification (Electrical, Mechanical, Safety...)
    pub category: String,
    pub status: ToolStatus,
    pub is_calibrable: bool,
    pub calibration_due: Option<NaiveDate>,
    pub certificate_number: Option<String>,
    /// Units currently on the shelf, i.e. not reserved by an active assignment
    pub quantity: i64,
    /// Image reference (URL or upload path)
    pub image: Option<String>,
    #[schema(value_type = Object)]
    pub custom_attributes: CustomAttributes,
}

/// Raw `tools` row as stored in SQLite
#[derive(Debug, FromRow)]
pub struct ToolRow {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub status: String,
    pub is_calibrable: Option<bool>,
    pub calibration_due: Option<NaiveDate>,
    pub certificate_number: Option<String>,
    /// NULL on rows created before quantities were tracked
    pub quantity: Option<i64>,
    pub image: Option<String>,
    pub custom_attributes: Option<Json<CustomAttributes>>,
}

impl TryFrom<ToolRow> for Tool {
    type Error = AppError;

    fn try_from(row: ToolRow) -> Result<Self, Self::Error> {
        let status = row.status.parse().map_err(|_| {
            AppError::Internal(format!("Tool {} has unknown status '{}'", row.id, row.status))
        })?;

        Ok(Tool {
            id: row.id,
            name: row.name,
            category: row.category,
            status,
            is_calibrable: row.is_calibrable.unwrap_or(false),
            calibration_due: row.calibration_due,
            certificate_number: row.certificate_number.filter(|c| !c.is_empty()),
            quantity: row.quantity.unwrap_or(1),
            image: row.image,
            custom_attributes: row.custom_attributes.map(|Json(attrs)| attrs).unwrap_or_default(),
        })
    }
}

/// Tool ready to be inserted; everything but the id is resolved
#[derive(Debug, Clone)]
pub struct NewTool {
    pub name: String,
    pub category: String,
    pub status: ToolStatus,
    pub is_calibrable: bool,
    pub calibration_due: Option<NaiveDate>,
    pub certificate_number: Option<String>,
    pub quantity: i64,
    pub image: Option<String>,
    pub custom_attributes: CustomAttributes,
}

impl NewTool {
    pub fn with_id(self, id: i64) -> Tool {
        Tool {
            id,
            name: self.name,
            category: self.category,
            status: self.status,
            is_calibrable: self.is_calibrable,
            calibration_due: self.calibration_due,
            certificate_number: self.certificate_number,
            quantity: self.quantity,
            image: self.image,
            custom_attributes: self.custom_attributes,
        }
    }
}

/// Create tool request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTool {
    #[validate(length(min = 1, message = "Tool name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Tool category is required"))]
    pub category: String,
    /// Defaults to Available
    pub status: Option<ToolStatus>,
    #[serde(default)]
    pub is_calibrable: bool,
    pub calibration_due: Option<NaiveDate>,
    pub certificate_number: Option<String>,
    /// Defaults to 1
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: Option<i64>,
    pub image: Option<String>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub custom_attributes: CustomAttributes,
}

/// Update tool request; only provided fields are changed.
///
/// Nullable fields distinguish "absent" (keep) from `null` (clear).
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTool {
    #[validate(length(min = 1, message = "Tool name cannot be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "Tool category cannot be empty"))]
    pub category: Option<String>,
    pub status: Option<ToolStatus>,
    pub is_calibrable: Option<bool>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub calibration_due: Option<Option<NaiveDate>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub certificate_number: Option<Option<String>>,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: Option<i64>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub image: Option<Option<String>>,
    #[schema(value_type = Option<Object>)]
    pub custom_attributes: Option<CustomAttributes>,
}

/// Tool list filters
#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ToolQuery {
    pub category: Option<String>,
    pub status: Option<ToolStatus>,
}

impl ToolQuery {
    pub fn matches(&self, tool: &Tool) -> bool {
        self.category.as_ref().map_or(true, |c| &tool.category == c)
            && self.status.map_or(true, |s| tool.status == s)
    }
}
