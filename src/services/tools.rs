//! Tool catalog service

use validator::Validate;

use super::ledger;
use crate::{
    error::{AppError, AppResult},
    models::tool::{CreateTool, NewTool, Tool, ToolQuery, UpdateTool},
    repository::{finish, InventoryTx, Repository},
};

#[derive(Clone)]
pub struct ToolsService {
    repository: Repository,
}

impl ToolsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List tools sorted by name
    pub async fn list(&self, query: &ToolQuery) -> AppResult<Vec<Tool>> {
        self.repository.reader().await?.tools(query).await
    }

    /// Get a tool by ID
    pub async fn get(&self, id: i64) -> AppResult<Tool> {
        self.repository
            .reader()
            .await?
            .tool(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tool {} not found", id)))
    }

    /// Register a new tool
    pub async fn create(&self, data: CreateTool) -> AppResult<Tool> {
        data.validate()?;
        let (quantity, status) = ledger::opening_balance(&data);
        let new_tool = NewTool {
            name: data.name,
            category: data.category,
            status,
            is_calibrable: data.is_calibrable,
            calibration_due: data.calibration_due,
            certificate_number: data.certificate_number.filter(|c| !c.is_empty()),
            quantity,
            image: data.image,
            custom_attributes: data.custom_attributes,
        };

        let mut tx = self.repository.begin().await?;
        let result = tx.insert_tool(&new_tool).await;
        let tool = finish(tx, result).await?;

        tracing::info!(tool_id = tool.id, quantity = tool.quantity, "Tool created");
        Ok(tool)
    }

    /// Update the fields present in `data`
    pub async fn update(&self, id: i64, data: UpdateTool) -> AppResult<Tool> {
        data.validate()?;
        let mut tx = self.repository.begin().await?;
        let result = apply_update(tx.as_mut(), id, data).await;
        finish(tx, result).await
    }

    /// Delete a tool that no active assignment holds
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let mut tx = self.repository.begin().await?;
        let result = remove(tx.as_mut(), id).await;
        finish(tx, result).await?;

        tracing::info!(tool_id = id, "Tool deleted");
        Ok(())
    }
}

async fn apply_update(tx: &mut dyn InventoryTx, id: i64, data: UpdateTool) -> AppResult<Tool> {
    let mut tool = tx
        .tool(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tool {} not found", id)))?;

    if let Some(name) = data.name {
        tool.name = name;
    }
    if let Some(category) = data.category {
        tool.category = category;
    }
    if let Some(is_calibrable) = data.is_calibrable {
        tool.is_calibrable = is_calibrable;
    }
    if let Some(calibration_due) = data.calibration_due {
        tool.calibration_due = calibration_due;
    }
    if let Some(certificate_number) = data.certificate_number {
        tool.certificate_number = certificate_number.filter(|c| !c.is_empty());
    }
    if let Some(image) = data.image {
        tool.image = image;
    }
    if let Some(custom_attributes) = data.custom_attributes {
        tool.custom_attributes = custom_attributes;
    }
    ledger::apply_manual_edit(&mut tool, data.status, data.quantity)?;

    tx.update_tool(&tool).await?;
    Ok(tool)
}

async fn remove(tx: &mut dyn InventoryTx, id: i64) -> AppResult<()> {
    if tx.tool(id).await?.is_none() {
        return Err(AppError::NotFound(format!("Tool {} not found", id)));
    }
    if tx.reserved_units(id, None).await? > 0 {
        return Err(AppError::HasActiveAssignments(
            "Cannot delete tool with active assignments".to_string(),
        ));
    }
    tx.delete_tool(id).await?;
    Ok(())
}
