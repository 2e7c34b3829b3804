//! Shared fixtures for the integration tests

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use toolroom_server::{
    config::DatabaseConfig,
    models::{
        assignment::{CheckinRequest, CheckoutRequest, ToolCondition, ToolConditions, ToolRequest},
        project::ProjectData,
        tool::{CreateTool, Tool},
        worker::WorkerData,
    },
    repository::{sqlite::SqliteStore, Repository},
    services::Services,
};

/// Services plus whatever must outlive them (the temporary database directory)
pub struct Harness {
    pub services: Services,
    _dir: Option<TempDir>,
}

impl std::ops::Deref for Harness {
    type Target = Services;

    fn deref(&self) -> &Services {
        &self.services
    }
}

pub fn memory() -> Harness {
    Harness {
        services: Services::new(Repository::in_memory()),
        _dir: None,
    }
}

pub async fn sqlite() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig {
        url: format!("sqlite://{}", dir.path().join("toolroom.db").display()),
        ..DatabaseConfig::default()
    };
    let store = SqliteStore::connect(&config).await.unwrap();
    Harness {
        services: Services::new(Repository::new(store)),
        _dir: Some(dir),
    }
}

/// Run an async scenario against both stores
macro_rules! on_both_stores {
    ($($name:ident),* $(,)?) => {
        mod memory_store {
            $(
                #[tokio::test]
                async fn $name() {
                    super::$name(crate::common::memory()).await;
                }
            )*
        }

        mod sqlite_store {
            $(
                #[tokio::test]
                async fn $name() {
                    super::$name(crate::common::sqlite().await).await;
                }
            )*
        }
    };
}

/// Worker, project and one tool of the given stock
pub struct Fixture {
    pub worker_id: i64,
    pub project_id: i64,
    pub tool_id: i64,
}

pub async fn fixture(services: &Services, stock: i64) -> Fixture {
    let worker = services
        .workers
        .create(WorkerData {
            name: "John Smith".into(),
            employee_id: "EMP001".into(),
        })
        .await
        .unwrap();
    let project = services
        .projects
        .create(ProjectData { name: "Building A Renovation".into() })
        .await
        .unwrap();
    let tool = add_tool(services, "Torque Wrench", stock).await;

    Fixture {
        worker_id: worker.id,
        project_id: project.id,
        tool_id: tool.id,
    }
}

pub async fn add_tool(services: &Services, name: &str, stock: i64) -> Tool {
    services
        .tools
        .create(CreateTool {
            name: name.into(),
            category: "Mechanical".into(),
            status: None,
            is_calibrable: false,
            calibration_due: None,
            certificate_number: None,
            quantity: Some(stock),
            image: None,
            custom_attributes: Default::default(),
        })
        .await
        .unwrap()
}

pub fn checkout(worker_id: i64, project_id: i64, tools: &[(i64, i64)]) -> CheckoutRequest {
    checkout_at(worker_id, project_id, 1, tools)
}

/// Checkout dated `day` days into March 2025
pub fn checkout_at(worker_id: i64, project_id: i64, day: u32, tools: &[(i64, i64)]) -> CheckoutRequest {
    CheckoutRequest {
        checkout_date: Some(Utc.with_ymd_and_hms(2025, 3, day, 8, 0, 0).unwrap()),
        worker_id: Some(worker_id),
        project_id: Some(project_id),
        tools: Some(
            tools
                .iter()
                .map(|&(tool_id, quantity)| ToolRequest { tool_id, quantity })
                .collect(),
        ),
    }
}

pub fn checkin(conditions: &[(i64, ToolCondition)]) -> CheckinRequest {
    CheckinRequest {
        checkin_notes: Some("Returned to crib".into()),
        tool_conditions: Some(
            conditions
                .iter()
                .map(|&(id, condition)| (id.to_string(), condition))
                .collect::<ToolConditions>(),
        ),
    }
}

pub async fn tool(services: &Services, id: i64) -> Tool {
    services.tools.get(id).await.unwrap()
}
