//! In-process inventory store
//!
//! Readers share an immutable snapshot. The single writer works on a private
//! copy of the state which replaces the published snapshot on commit, so a
//! half-applied transaction is never visible.

use async_trait::async_trait;
use std::{collections::BTreeMap, sync::Arc};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use super::{InventoryReader, InventoryStore, InventoryTx};
use crate::{
    error::{AppError, AppResult},
    models::{
        assignment::{Assignment, AssignmentQuery, AssignmentStatus, AssignmentTool, NewAssignment},
        project::{Project, ProjectData},
        tool::{NewTool, Tool, ToolQuery},
        worker::{Worker, WorkerData},
    },
};

/// Complete inventory contents
#[derive(Debug, Clone, Default)]
pub struct InventoryState {
    tools: BTreeMap<i64, Tool>,
    workers: BTreeMap<i64, Worker>,
    projects: BTreeMap<i64, Project>,
    assignments: BTreeMap<i64, Assignment>,
    assignment_tools: Vec<AssignmentTool>,
    last_tool_id: i64,
    last_worker_id: i64,
    last_project_id: i64,
    last_assignment_id: i64,
}

fn next_id(last: &mut i64) -> i64 {
    *last += 1;
    *last
}

fn foreign_key_failure(what: &str, id: i64) -> AppError {
    AppError::Internal(format!("FOREIGN KEY constraint failed: {} {}", what, id))
}

impl InventoryState {
    fn tool(&self, id: i64) -> Option<Tool> {
        self.tools.get(&id).cloned()
    }

    fn tools(&self, query: &ToolQuery) -> Vec<Tool> {
        let mut tools: Vec<Tool> = self.tools.values().filter(|t| query.matches(t)).cloned().collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        tools
    }

    fn worker(&self, id: i64) -> Option<Worker> {
        self.workers.get(&id).cloned()
    }

    fn worker_by_employee_id(&self, employee_id: &str) -> Option<Worker> {
        self.workers.values().find(|w| w.employee_id == employee_id).cloned()
    }

    fn workers(&self) -> Vec<Worker> {
        let mut workers: Vec<Worker> = self.workers.values().cloned().collect();
        workers.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        workers
    }

    fn project(&self, id: i64) -> Option<Project> {
        self.projects.get(&id).cloned()
    }

    fn projects(&self) -> Vec<Project> {
        let mut projects: Vec<Project> = self.projects.values().cloned().collect();
        projects.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        projects
    }

    fn assignment(&self, id: i64) -> Option<Assignment> {
        self.assignments.get(&id).cloned()
    }

    fn assignments(&self, query: &AssignmentQuery) -> Vec<Assignment> {
        let mut assignments: Vec<Assignment> = self
            .assignments
            .values()
            .filter(|a| query.matches(a))
            .cloned()
            .collect();
        assignments.sort_by(|a, b| {
            b.checkout_date
                .cmp(&a.checkout_date)
                .then(b.id.cmp(&a.id))
        });
        assignments
    }

    fn assignment_tools(&self, assignment_id: i64) -> Vec<AssignmentTool> {
        self.assignment_tools
            .iter()
            .filter(|line| line.assignment_id == assignment_id)
            .cloned()
            .collect()
    }

    fn reserved_units(&self, tool_id: i64, excluding: Option<i64>) -> i64 {
        self.assignment_tools
            .iter()
            .filter(|line| line.tool_id == tool_id && Some(line.assignment_id) != excluding)
            .filter(|line| {
                self.assignments
                    .get(&line.assignment_id)
                    .map_or(false, Assignment::is_active)
            })
            .map(|line| line.quantity)
            .sum()
    }

    fn active_assignments_for_worker(&self, worker_id: i64) -> i64 {
        self.assignments
            .values()
            .filter(|a| a.worker_id == worker_id && a.is_active())
            .count() as i64
    }

    fn active_assignments_for_project(&self, project_id: i64) -> i64 {
        self.assignments
            .values()
            .filter(|a| a.project_id == project_id && a.is_active())
            .count() as i64
    }

    fn insert_tool(&mut self, tool: &NewTool) -> Tool {
        let tool = tool.clone().with_id(next_id(&mut self.last_tool_id));
        self.tools.insert(tool.id, tool.clone());
        tool
    }

    fn update_tool(&mut self, tool: &Tool) -> AppResult<()> {
        let slot = self
            .tools
            .get_mut(&tool.id)
            .ok_or_else(|| AppError::NotFound(format!("Tool {} not found", tool.id)))?;
        *slot = tool.clone();
        Ok(())
    }

    fn delete_tool(&mut self, id: i64) -> bool {
        let existed = self.tools.remove(&id).is_some();
        if existed {
            self.assignment_tools.retain(|line| line.tool_id != id);
        }
        existed
    }

    fn check_employee_id(&self, employee_id: &str, except: Option<i64>) -> AppResult<()> {
        let taken = self
            .workers
            .values()
            .any(|w| w.employee_id == employee_id && Some(w.id) != except);
        if taken {
            return Err(AppError::Conflict("Employee ID already exists".to_string()));
        }
        Ok(())
    }

    fn insert_worker(&mut self, data: &WorkerData) -> AppResult<Worker> {
        self.check_employee_id(&data.employee_id, None)?;
        let worker = Worker {
            id: next_id(&mut self.last_worker_id),
            name: data.name.clone(),
            employee_id: data.employee_id.clone(),
        };
        self.workers.insert(worker.id, worker.clone());
        Ok(worker)
    }

    fn update_worker(&mut self, worker: &Worker) -> AppResult<()> {
        if !self.workers.contains_key(&worker.id) {
            return Err(AppError::NotFound(format!("Worker {} not found", worker.id)));
        }
        self.check_employee_id(&worker.employee_id, Some(worker.id))?;
        self.workers.insert(worker.id, worker.clone());
        Ok(())
    }

    /// Remove assignments matching `doomed` together with their lines
    fn cascade_assignments(&mut self, doomed: impl Fn(&Assignment) -> bool) {
        let ids: Vec<i64> = self
            .assignments
            .values()
            .filter(|a| doomed(a))
            .map(|a| a.id)
            .collect();
        for id in &ids {
            self.assignments.remove(id);
        }
        self.assignment_tools.retain(|line| !ids.contains(&line.assignment_id));
    }

    fn delete_worker(&mut self, id: i64) -> bool {
        let existed = self.workers.remove(&id).is_some();
        if existed {
            self.cascade_assignments(|a| a.worker_id == id);
        }
        existed
    }

    fn insert_project(&mut self, data: &ProjectData) -> Project {
        let project = Project {
            id: next_id(&mut self.last_project_id),
            name: data.name.clone(),
        };
        self.projects.insert(project.id, project.clone());
        project
    }

    fn update_project(&mut self, project: &Project) -> AppResult<()> {
        let slot = self
            .projects
            .get_mut(&project.id)
            .ok_or_else(|| AppError::NotFound(format!("Project {} not found", project.id)))?;
        *slot = project.clone();
        Ok(())
    }

    fn delete_project(&mut self, id: i64) -> bool {
        let existed = self.projects.remove(&id).is_some();
        if existed {
            self.cascade_assignments(|a| a.project_id == id);
        }
        existed
    }

    fn insert_assignment(&mut self, data: &NewAssignment) -> AppResult<Assignment> {
        if !self.workers.contains_key(&data.worker_id) {
            return Err(foreign_key_failure("worker", data.worker_id));
        }
        if !self.projects.contains_key(&data.project_id) {
            return Err(foreign_key_failure("project", data.project_id));
        }
        let assignment = Assignment {
            id: next_id(&mut self.last_assignment_id),
            checkout_date: data.checkout_date,
            checkin_date: None,
            worker_id: data.worker_id,
            project_id: data.project_id,
            status: AssignmentStatus::Active,
            checkin_notes: None,
            tool_conditions: Default::default(),
        };
        self.assignments.insert(assignment.id, assignment.clone());
        Ok(assignment)
    }

    fn update_assignment(&mut self, assignment: &Assignment) -> AppResult<()> {
        let slot = self
            .assignments
            .get_mut(&assignment.id)
            .ok_or_else(|| AppError::NotFound(format!("Assignment {} not found", assignment.id)))?;
        *slot = assignment.clone();
        Ok(())
    }

    fn insert_assignment_tool(&mut self, line: &AssignmentTool) -> AppResult<()> {
        if !self.assignments.contains_key(&line.assignment_id) {
            return Err(foreign_key_failure("assignment", line.assignment_id));
        }
        if !self.tools.contains_key(&line.tool_id) {
            return Err(foreign_key_failure("tool", line.tool_id));
        }
        if line.quantity < 1 {
            return Err(AppError::Internal("CHECK constraint failed: quantity".to_string()));
        }
        self.assignment_tools.push(line.clone());
        Ok(())
    }
}

/// Inventory store living in process memory
#[derive(Clone, Default)]
pub struct MemoryStore {
    published: Arc<RwLock<Arc<InventoryState>>>,
    writer: Arc<Mutex<()>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn reader(&self) -> AppResult<Box<dyn InventoryReader>> {
        let state = self.published.read().await.clone();
        Ok(Box::new(MemoryReader { state }))
    }

    async fn begin(&self) -> AppResult<Box<dyn InventoryTx>> {
        let writer = self.writer.clone().lock_owned().await;
        let state = InventoryState::clone(&**self.published.read().await);
        Ok(Box::new(MemoryTx {
            state,
            published: self.published.clone(),
            _writer: writer,
        }))
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

pub struct MemoryReader {
    state: Arc<InventoryState>,
}

pub struct MemoryTx {
    state: InventoryState,
    published: Arc<RwLock<Arc<InventoryState>>>,
    _writer: OwnedMutexGuard<()>,
}

macro_rules! impl_reader {
    ($ty:ty) => {
        #[async_trait]
        impl InventoryReader for $ty {
            async fn tool(&mut self, id: i64) -> AppResult<Option<Tool>> {
                Ok(self.state.tool(id))
            }

            async fn tools(&mut self, query: &ToolQuery) -> AppResult<Vec<Tool>> {
                Ok(self.state.tools(query))
            }

            async fn worker(&mut self, id: i64) -> AppResult<Option<Worker>> {
                Ok(self.state.worker(id))
            }

            async fn worker_by_employee_id(&mut self, employee_id: &str) -> AppResult<Option<Worker>> {
                Ok(self.state.worker_by_employee_id(employee_id))
            }

            async fn workers(&mut self) -> AppResult<Vec<Worker>> {
                Ok(self.state.workers())
            }

            async fn project(&mut self, id: i64) -> AppResult<Option<Project>> {
                Ok(self.state.project(id))
            }

            async fn projects(&mut self) -> AppResult<Vec<Project>> {
                Ok(self.state.projects())
            }

            async fn assignment(&mut self, id: i64) -> AppResult<Option<Assignment>> {
                Ok(self.state.assignment(id))
            }

            async fn assignments(&mut self, query: &AssignmentQuery) -> AppResult<Vec<Assignment>> {
                Ok(self.state.assignments(query))
            }

            async fn assignment_tools(&mut self, assignment_id: i64) -> AppResult<Vec<AssignmentTool>> {
                Ok(self.state.assignment_tools(assignment_id))
            }

            async fn reserved_units(&mut self, tool_id: i64, excluding: Option<i64>) -> AppResult<i64> {
                Ok(self.state.reserved_units(tool_id, excluding))
            }

            async fn active_assignments_for_worker(&mut self, worker_id: i64) -> AppResult<i64> {
                Ok(self.state.active_assignments_for_worker(worker_id))
            }

            async fn active_assignments_for_project(&mut self, project_id: i64) -> AppResult<i64> {
                Ok(self.state.active_assignments_for_project(project_id))
            }
        }
    };
}

impl_reader!(MemoryReader);
impl_reader!(MemoryTx);

#[async_trait]
impl InventoryTx for MemoryTx {
    async fn insert_tool(&mut self, tool: &NewTool) -> AppResult<Tool> {
        Ok(self.state.insert_tool(tool))
    }

    async fn update_tool(&mut self, tool: &Tool) -> AppResult<()> {
        self.state.update_tool(tool)
    }

    async fn delete_tool(&mut self, id: i64) -> AppResult<bool> {
        Ok(self.state.delete_tool(id))
    }

    async fn insert_worker(&mut self, data: &WorkerData) -> AppResult<Worker> {
        self.state.insert_worker(data)
    }

    async fn update_worker(&mut self, worker: &Worker) -> AppResult<()> {
        self.state.update_worker(worker)
    }

    async fn delete_worker(&mut self, id: i64) -> AppResult<bool> {
        Ok(self.state.delete_worker(id))
    }

    async fn insert_project(&mut self, data: &ProjectData) -> AppResult<Project> {
        Ok(self.state.insert_project(data))
    }

    async fn update_project(&mut self, project: &Project) -> AppResult<()> {
        self.state.update_project(project)
    }

    async fn delete_project(&mut self, id: i64) -> AppResult<bool> {
        Ok(self.state.delete_project(id))
    }

    async fn insert_assignment(&mut self, data: &NewAssignment) -> AppResult<Assignment> {
        self.state.insert_assignment(data)
    }

    async fn update_assignment(&mut self, assignment: &Assignment) -> AppResult<()> {
        self.state.update_assignment(assignment)
    }

    async fn insert_assignment_tool(&mut self, line: &AssignmentTool) -> AppResult<()> {
        self.state.insert_assignment_tool(line)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryTx { state, published, _writer } = *self;
        *published.write().await = Arc::new(state);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}
