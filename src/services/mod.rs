//! Business logic services

pub mod assignments;
pub mod ledger;
pub mod projection;
pub mod projects;
pub mod stats;
pub mod tools;
pub mod workers;

use crate::repository::Repository;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub tools: tools::ToolsService,
    pub workers: workers::WorkersService,
    pub projects: projects::ProjectsService,
    pub assignments: assignments::AssignmentsService,
    pub stats: stats::StatsService,
    pub repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository) -> Self {
        Self {
            tools: tools::ToolsService::new(repository.clone()),
            workers: workers::WorkersService::new(repository.clone()),
            projects: projects::ProjectsService::new(repository.clone()),
            assignments: assignments::AssignmentsService::new(repository.clone()),
            stats: stats::StatsService::new(repository.clone()),
            repository,
        }
    }
}
