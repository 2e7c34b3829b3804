//! Project management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::project::{Project, ProjectData},
    repository::{finish, InventoryTx, Repository},
};

#[derive(Clone)]
pub struct ProjectsService {
    repository: Repository,
}

impl ProjectsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<Project>> {
        self.repository.reader().await?.projects().await
    }

    pub async fn get(&self, id: i64) -> AppResult<Project> {
        self.repository
            .reader()
            .await?
            .project(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Project {} not found", id)))
    }

    pub async fn create(&self, data: ProjectData) -> AppResult<Project> {
        data.validate()?;
        let mut tx = self.repository.begin().await?;
        let result = tx.insert_project(&data).await;
        let project = finish(tx, result).await?;

        tracing::info!(project_id = project.id, "Project created");
        Ok(project)
    }

    pub async fn update(&self, id: i64, data: ProjectData) -> AppResult<Project> {
        data.validate()?;
        let mut tx = self.repository.begin().await?;
        let result = rename(tx.as_mut(), id, data).await;
        finish(tx, result).await
    }

    /// Delete a project with no tools checked out against it
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let mut tx = self.repository.begin().await?;
        let result = remove(tx.as_mut(), id).await;
        finish(tx, result).await?;

        tracing::info!(project_id = id, "Project deleted");
        Ok(())
    }
}

async fn rename(tx: &mut dyn InventoryTx, id: i64, data: ProjectData) -> AppResult<Project> {
    let mut project = tx
        .project(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {} not found", id)))?;
    project.name = data.name;
    tx.update_project(&project).await?;
    Ok(project)
}

async fn remove(tx: &mut dyn InventoryTx, id: i64) -> AppResult<()> {
    if tx.project(id).await?.is_none() {
        return Err(AppError::NotFound(format!("Project {} not found", id)));
    }
    if tx.active_assignments_for_project(id).await? > 0 {
        tracing::warn!(project_id = id, "Delete refused: project has active assignments");
        return Err(AppError::HasActiveAssignments(
            "Cannot delete project with active assignments".to_string(),
        ));
    }
    tx.delete_project(id).await?;
    Ok(())
}
