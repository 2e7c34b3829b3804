//! Quantity ledger
//!
//! Every change to a tool's shelf quantity or display status goes through
//! this module, so that the units on the shelf plus the units held by active
//! assignments always add up to the stock the tool started with.

use crate::{
    error::{AppError, AppResult},
    models::{
        assignment::ToolCondition,
        tool::{CreateTool, Tool, ToolStatus},
    },
    repository::InventoryTx,
};

/// Status of a tool once some of its units have been checked out
pub fn status_after_reserve(current: ToolStatus) -> ToolStatus {
    if current.is_sticky() {
        current
    } else {
        ToolStatus::InUse
    }
}

/// Status of a tool once units come back in `condition`.
///
/// A damaged or lost report wins over everything else. A good return
/// leaves a sticky status alone, and otherwise frees the tool only when no
/// other active assignment still holds units of it.
pub fn status_after_release(
    current: ToolStatus,
    condition: ToolCondition,
    other_holds: bool,
) -> ToolStatus {
    match condition {
        ToolCondition::Damaged => ToolStatus::Damaged,
        ToolCondition::Lost => ToolStatus::Lost,
        ToolCondition::Good if current.is_sticky() => current,
        ToolCondition::Good if other_holds => ToolStatus::InUse,
        ToolCondition::Good => ToolStatus::Available,
    }
}

/// Quantity and status a newly registered tool starts with
pub fn opening_balance(data: &CreateTool) -> (i64, ToolStatus) {
    (
        data.quantity.unwrap_or(1),
        data.status.unwrap_or(ToolStatus::Available),
    )
}

/// Manual stock correction. This is the only way to clear a Damaged or
/// Lost status.
pub fn apply_manual_edit(
    tool: &mut Tool,
    status: Option<ToolStatus>,
    quantity: Option<i64>,
) -> AppResult<()> {
    if let Some(quantity) = quantity {
        if quantity < 0 {
            return Err(AppError::Validation("Quantity cannot be negative".to_string()));
        }
        tool.quantity = quantity;
    }
    if let Some(status) = status {
        tool.status = status;
    }
    Ok(())
}

/// Take `amount` units of a tool off the shelf
pub async fn reserve<T>(tx: &mut T, tool_id: i64, amount: i64) -> AppResult<Tool>
where
    T: InventoryTx + ?Sized,
{
    if amount < 1 {
        return Err(AppError::Validation("Quantity must be at least 1".to_string()));
    }

    let mut tool = tx
        .tool(tool_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tool {} not found", tool_id)))?;

    if tool.quantity < amount {
        tracing::warn!(
            tool_id,
            requested = amount,
            available = tool.quantity,
            "Checkout refused: not enough quantity"
        );
        return Err(AppError::InsufficientQuantity {
            tool_id,
            requested: amount,
            available: tool.quantity,
        });
    }

    tool.quantity -= amount;
    tool.status = status_after_reserve(tool.status);
    tx.update_tool(&tool).await?;
    Ok(tool)
}

/// Whether an active assignment other than `excluding` holds units of the tool
pub async fn has_other_active_holds<T>(tx: &mut T, tool_id: i64, excluding: i64) -> AppResult<bool>
where
    T: InventoryTx + ?Sized,
{
    Ok(tx.reserved_units(tool_id, Some(excluding)).await? > 0)
}

/// Put `amount` units held by `assignment_id` back on the shelf.
///
/// Quantity is restored whatever the condition; the condition only decides
/// the resulting status.
pub async fn release<T>(
    tx: &mut T,
    assignment_id: i64,
    tool_id: i64,
    amount: i64,
    condition: ToolCondition,
) -> AppResult<Tool>
where
    T: InventoryTx + ?Sized,
{
    if amount < 1 {
        return Err(AppError::Internal(format!(
            "Assignment {} holds a non-positive quantity of tool {}",
            assignment_id, tool_id
        )));
    }

    let mut tool = tx
        .tool(tool_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tool {} not found", tool_id)))?;

    let other_holds = has_other_active_holds(&mut *tx, tool_id, assignment_id).await?;

    tool.quantity += amount;
    tool.status = status_after_release(tool.status, condition, other_holds);
    tx.update_tool(&tool).await?;
    Ok(tool)
}
