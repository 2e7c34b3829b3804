//! Sample inventory for a fresh installation

use chrono::NaiveDate;

use super::{InventoryTx, Repository};
use crate::{
    error::AppResult,
    models::{
        project::ProjectData,
        tool::{CustomAttributes, NewTool, ToolQuery, ToolStatus},
        worker::WorkerData,
    },
};

fn attributes(pairs: &[(&str, &str)]) -> CustomAttributes {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn sample_tools() -> Vec<NewTool> {
    let tool = |name: &str,
                category: &str,
                status: ToolStatus,
                due: Option<NaiveDate>,
                attrs: CustomAttributes| NewTool {
        name: name.to_string(),
        category: category.to_string(),
        status,
        is_calibrable: due.is_some(),
        calibration_due: due,
        certificate_number: None,
        quantity: 1,
        image: None,
        custom_attributes: attrs,
    };

    vec![
        tool(
            "Digital Multimeter",
            "Electrical",
            ToolStatus::Available,
            NaiveDate::from_ymd_opt(2025, 12, 31),
            attributes(&[("brand", "Fluke"), ("model", "87V")]),
        ),
        tool(
            "Torque Wrench",
            "Mechanical",
            ToolStatus::Available,
            NaiveDate::from_ymd_opt(2025, 11, 15),
            attributes(&[("range", "10-150 Nm")]),
        ),
        tool(
            "Safety Harness",
            "Safety",
            ToolStatus::Available,
            None,
            attributes(&[("size", "Large"), ("certified", "Yes")]),
        ),
        tool(
            "Oscilloscope",
            "Electrical",
            ToolStatus::Available,
            NaiveDate::from_ymd_opt(2025, 10, 20),
            attributes(&[("bandwidth", "100MHz")]),
        ),
        tool(
            "Impact Driver",
            "Mechanical",
            ToolStatus::Damaged,
            None,
            attributes(&[("voltage", "18V")]),
        ),
    ]
}

const SAMPLE_WORKERS: [(&str, &str); 4] = [
    ("John Smith", "EMP001"),
    ("Sarah Johnson", "EMP002"),
    ("Michael Brown", "EMP003"),
    ("Emily Davis", "EMP004"),
];

const SAMPLE_PROJECTS: [&str; 4] = [
    "Building A Renovation",
    "Lab Equipment Installation",
    "Power Grid Maintenance",
    "Safety Audit 2025",
];

async fn insert_samples(tx: &mut dyn InventoryTx) -> AppResult<()> {
    for tool in sample_tools() {
        tx.insert_tool(&tool).await?;
    }
    for (name, employee_id) in SAMPLE_WORKERS {
        if tx.worker_by_employee_id(employee_id).await?.is_none() {
            tx.insert_worker(&WorkerData {
                name: name.to_string(),
                employee_id: employee_id.to_string(),
            })
            .await?;
        }
    }
    for name in SAMPLE_PROJECTS {
        tx.insert_project(&ProjectData { name: name.to_string() }).await?;
    }
    Ok(())
}

/// Insert the sample tools, workers and projects when the inventory has no
/// tools yet. Returns whether anything was inserted.
pub async fn seed_sample_data(repository: &Repository) -> AppResult<bool> {
    let mut tx = repository.begin().await?;

    if !tx.tools(&ToolQuery::default()).await?.is_empty() {
        tx.rollback().await?;
        return Ok(false);
    }

    let result = insert_samples(tx.as_mut()).await;
    super::finish(tx, result).await?;
    tracing::info!("Sample inventory inserted");
    Ok(true)
}
