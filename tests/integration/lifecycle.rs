//! Checkout / check-in scenarios, run against the in-memory and SQLite stores

use toolroom_server::{
    error::AppError,
    models::{
        assignment::{AssignmentQuery, AssignmentStatus, CheckinRequest, ToolCondition},
        project::ProjectData,
        tool::{ToolQuery, ToolStatus, UpdateTool},
        worker::WorkerData,
    },
};

use crate::common::{add_tool, checkin, checkout, checkout_at, fixture, tool, Harness};

on_both_stores!(
    reserve_then_return_restores_stock,
    oversubscribed_checkout_changes_nothing,
    second_checkin_is_rejected,
    good_return_waits_for_other_holders,
    damage_report_sticks_until_manual_edit,
    last_unit_out_marks_tool_in_use,
    project_delete_blocked_by_active_assignment,
    worker_delete_blocked_by_active_assignment,
    checkout_validates_references,
    unknown_condition_keys_are_kept,
    listing_orders_and_filters,
    duplicate_employee_id_conflicts,
    tool_delete_blocked_while_checked_out,
    tool_update_is_partial,
);

async fn reserve_then_return_restores_stock(h: Harness) {
    let f = fixture(&h, 5).await;

    let opened = h
        .assignments
        .checkout(checkout(f.worker_id, f.project_id, &[(f.tool_id, 3)]))
        .await
        .unwrap();
    assert_eq!(opened.status, AssignmentStatus::Active);
    assert_eq!(opened.worker.employee_id, "EMP001");
    assert_eq!(opened.tools.len(), 1);
    assert_eq!(opened.tools[0].assigned_quantity, 3);
    assert_eq!(opened.tools[0].available_quantity, 2);

    let t = tool(&h, f.tool_id).await;
    assert_eq!(t.quantity, 2);
    assert_eq!(t.status, ToolStatus::InUse);

    let err = h
        .assignments
        .checkout(checkout(f.worker_id, f.project_id, &[(f.tool_id, 3)]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::InsufficientQuantity { tool_id, requested: 3, available: 2 } if tool_id == f.tool_id
    ));
    let all = h.assignments.list(&AssignmentQuery::default()).await.unwrap();
    assert_eq!(all.len(), 1);

    let closed = h
        .assignments
        .checkin(opened.id, checkin(&[(f.tool_id, ToolCondition::Good)]))
        .await
        .unwrap();
    assert_eq!(closed.status, AssignmentStatus::Completed);
    assert!(closed.checkin_date.is_some());
    assert_eq!(closed.checkin_notes.as_deref(), Some("Returned to crib"));

    let t = tool(&h, f.tool_id).await;
    assert_eq!(t.quantity, 5);
    assert_eq!(t.status, ToolStatus::Available);
}

async fn oversubscribed_checkout_changes_nothing(h: Harness) {
    let f = fixture(&h, 2).await;
    let harness = add_tool(&h, "Safety Harness", 1).await;

    let err = h
        .assignments
        .checkout(checkout(
            f.worker_id,
            f.project_id,
            &[(f.tool_id, 2), (harness.id, 2)],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientQuantity { tool_id, .. } if tool_id == harness.id));

    let wrench = tool(&h, f.tool_id).await;
    assert_eq!(wrench.quantity, 2);
    assert_eq!(wrench.status, ToolStatus::Available);
    assert_eq!(tool(&h, harness.id).await.quantity, 1);
    assert!(h.assignments.list(&AssignmentQuery::default()).await.unwrap().is_empty());
}

async fn second_checkin_is_rejected(h: Harness) {
    let f = fixture(&h, 4).await;
    let opened = h
        .assignments
        .checkout(checkout(f.worker_id, f.project_id, &[(f.tool_id, 2)]))
        .await
        .unwrap();

    h.assignments.checkin(opened.id, CheckinRequest::default()).await.unwrap();
    let err = h
        .assignments
        .checkin(opened.id, CheckinRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AlreadyCheckedIn(id) if id == opened.id));
    assert_eq!(tool(&h, f.tool_id).await.quantity, 4);

    let err = h.assignments.checkin(9999, CheckinRequest::default()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

async fn good_return_waits_for_other_holders(h: Harness) {
    let f = fixture(&h, 3).await;
    let first = h
        .assignments
        .checkout(checkout(f.worker_id, f.project_id, &[(f.tool_id, 1)]))
        .await
        .unwrap();
    let second = h
        .assignments
        .checkout(checkout(f.worker_id, f.project_id, &[(f.tool_id, 1)]))
        .await
        .unwrap();

    h.assignments.checkin(first.id, CheckinRequest::default()).await.unwrap();
    let t = tool(&h, f.tool_id).await;
    assert_eq!(t.quantity, 2);
    assert_eq!(t.status, ToolStatus::InUse);

    h.assignments.checkin(second.id, CheckinRequest::default()).await.unwrap();
    let t = tool(&h, f.tool_id).await;
    assert_eq!(t.quantity, 3);
    assert_eq!(t.status, ToolStatus::Available);
}

async fn damage_report_sticks_until_manual_edit(h: Harness) {
    let f = fixture(&h, 3).await;
    let first = h
        .assignments
        .checkout(checkout(f.worker_id, f.project_id, &[(f.tool_id, 1)]))
        .await
        .unwrap();
    let second = h
        .assignments
        .checkout(checkout(f.worker_id, f.project_id, &[(f.tool_id, 2)]))
        .await
        .unwrap();

    let closed = h
        .assignments
        .checkin(first.id, checkin(&[(f.tool_id, ToolCondition::Damaged)]))
        .await
        .unwrap();
    assert_eq!(closed.tools[0].status, ToolStatus::Damaged);
    let t = tool(&h, f.tool_id).await;
    assert_eq!(t.status, ToolStatus::Damaged);
    assert_eq!(t.quantity, 1);

    h.assignments.checkin(second.id, CheckinRequest::default()).await.unwrap();
    let t = tool(&h, f.tool_id).await;
    assert_eq!(t.status, ToolStatus::Damaged);
    assert_eq!(t.quantity, 3);

    let repaired = h
        .tools
        .update(
            f.tool_id,
            UpdateTool {
                status: Some(ToolStatus::Available),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(repaired.status, ToolStatus::Available);
    assert_eq!(repaired.quantity, 3);
}

async fn last_unit_out_marks_tool_in_use(h: Harness) {
    let f = fixture(&h, 1).await;
    h.assignments
        .checkout(checkout(f.worker_id, f.project_id, &[(f.tool_id, 1)]))
        .await
        .unwrap();

    let t = tool(&h, f.tool_id).await;
    assert_eq!(t.quantity, 0);
    assert_eq!(t.status, ToolStatus::InUse);

    let in_use = h
        .tools
        .list(&ToolQuery {
            status: Some(ToolStatus::InUse),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(in_use.len(), 1);
}

async fn project_delete_blocked_by_active_assignment(h: Harness) {
    let f = fixture(&h, 2).await;
    let opened = h
        .assignments
        .checkout(checkout(f.worker_id, f.project_id, &[(f.tool_id, 1)]))
        .await
        .unwrap();

    let err = h.projects.delete(f.project_id).await.unwrap_err();
    assert!(matches!(err, AppError::HasActiveAssignments(_)));
    assert!(h.projects.get(f.project_id).await.is_ok());

    h.assignments.checkin(opened.id, CheckinRequest::default()).await.unwrap();
    h.projects.delete(f.project_id).await.unwrap();
    assert!(matches!(h.projects.get(f.project_id).await, Err(AppError::NotFound(_))));
    assert!(matches!(h.assignments.get(opened.id).await, Err(AppError::NotFound(_))));
    assert_eq!(tool(&h, f.tool_id).await.quantity, 2);

    assert!(matches!(h.projects.delete(f.project_id).await, Err(AppError::NotFound(_))));
}

async fn worker_delete_blocked_by_active_assignment(h: Harness) {
    let f = fixture(&h, 2).await;
    let opened = h
        .assignments
        .checkout(checkout(f.worker_id, f.project_id, &[(f.tool_id, 2)]))
        .await
        .unwrap();

    let err = h.workers.delete(f.worker_id).await.unwrap_err();
    assert!(matches!(err, AppError::HasActiveAssignments(_)));

    h.assignments.checkin(opened.id, CheckinRequest::default()).await.unwrap();
    h.workers.delete(f.worker_id).await.unwrap();
    assert!(h.workers.list().await.unwrap().is_empty());
}

async fn checkout_validates_references(h: Harness) {
    let f = fixture(&h, 2).await;

    let err = h
        .assignments
        .checkout(checkout(404, f.project_id, &[(f.tool_id, 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = h
        .assignments
        .checkout(checkout(f.worker_id, f.project_id, &[(f.tool_id, 1), (404, 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(tool(&h, f.tool_id).await.quantity, 2);

    let mut missing_date = checkout(f.worker_id, f.project_id, &[(f.tool_id, 1)]);
    missing_date.checkout_date = None;
    let err = h.assignments.checkout(missing_date).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = h
        .assignments
        .checkout(checkout(f.worker_id, f.project_id, &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    assert!(h.assignments.list(&AssignmentQuery::default()).await.unwrap().is_empty());
}

async fn unknown_condition_keys_are_kept(h: Harness) {
    let f = fixture(&h, 1).await;
    let opened = h
        .assignments
        .checkout(checkout(f.worker_id, f.project_id, &[(f.tool_id, 1)]))
        .await
        .unwrap();

    let closed = h
        .assignments
        .checkin(
            opened.id,
            checkin(&[(777, ToolCondition::Lost), (f.tool_id, ToolCondition::Good)]),
        )
        .await
        .unwrap();
    let keys: Vec<&str> = closed.tool_conditions.keys().map(String::as_str).collect();
    assert_eq!(keys, ["777".to_string(), f.tool_id.to_string()]);

    let stored = h.assignments.get(opened.id).await.unwrap();
    assert_eq!(stored.tool_conditions.get("777"), Some(&ToolCondition::Lost));
    assert_eq!(tool(&h, f.tool_id).await.status, ToolStatus::Available);
}

async fn listing_orders_and_filters(h: Harness) {
    let f = fixture(&h, 5).await;
    let other = h
        .projects
        .create(ProjectData { name: "Lab Equipment Installation".into() })
        .await
        .unwrap();

    let early = h
        .assignments
        .checkout(checkout_at(f.worker_id, f.project_id, 1, &[(f.tool_id, 1)]))
        .await
        .unwrap();
    let late = h
        .assignments
        .checkout(checkout_at(f.worker_id, other.id, 9, &[(f.tool_id, 1)]))
        .await
        .unwrap();
    h.assignments.checkin(early.id, CheckinRequest::default()).await.unwrap();

    let all = h.assignments.list(&AssignmentQuery::default()).await.unwrap();
    let ids: Vec<i64> = all.iter().map(|a| a.id).collect();
    assert_eq!(ids, [late.id, early.id]);

    let active = h
        .assignments
        .list(&AssignmentQuery {
            status: Some(AssignmentStatus::Active),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].project.name, "Lab Equipment Installation");
    assert_eq!(active[0].tools[0].available_quantity, 4);
    assert_eq!(active[0].tools[0].assigned_quantity, 1);

    let for_project = h
        .assignments
        .list(&AssignmentQuery {
            project_id: Some(f.project_id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(for_project.len(), 1);
    assert_eq!(for_project[0].id, early.id);

    add_tool(&h, "Digital Multimeter", 1).await;
    add_tool(&h, "Oscilloscope", 1).await;
    let names: Vec<String> = h
        .tools
        .list(&ToolQuery::default())
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names, ["Digital Multimeter", "Oscilloscope", "Torque Wrench"]);
}

async fn duplicate_employee_id_conflicts(h: Harness) {
    fixture(&h, 1).await;
    let err = h
        .workers
        .create(WorkerData {
            name: "Someone Else".into(),
            employee_id: "EMP001".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let second = h
        .workers
        .create(WorkerData {
            name: "Emily Davis".into(),
            employee_id: "EMP004".into(),
        })
        .await
        .unwrap();
    let err = h
        .workers
        .update(
            second.id,
            WorkerData {
                name: "Emily Davis".into(),
                employee_id: "EMP001".into(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = h
        .workers
        .create(WorkerData {
            name: String::new(),
            employee_id: "EMP009".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

async fn tool_delete_blocked_while_checked_out(h: Harness) {
    let f = fixture(&h, 2).await;
    let opened = h
        .assignments
        .checkout(checkout(f.worker_id, f.project_id, &[(f.tool_id, 1)]))
        .await
        .unwrap();

    let err = h.tools.delete(f.tool_id).await.unwrap_err();
    assert!(matches!(err, AppError::HasActiveAssignments(_)));

    h.assignments.checkin(opened.id, CheckinRequest::default()).await.unwrap();
    h.tools.delete(f.tool_id).await.unwrap();
    assert!(matches!(h.tools.get(f.tool_id).await, Err(AppError::NotFound(_))));
    assert!(h.assignments.get(opened.id).await.unwrap().tools.is_empty());
}

async fn tool_update_is_partial(h: Harness) {
    let f = fixture(&h, 2).await;

    let update: UpdateTool = serde_json::from_str(
        r#"{"category":"Torque","customAttributes":{"range":"10-150 Nm","drive":"1/2 inch"}}"#,
    )
    .unwrap();
    let updated = h.tools.update(f.tool_id, update).await.unwrap();
    assert_eq!(updated.name, "Torque Wrench");
    assert_eq!(updated.category, "Torque");
    assert_eq!(updated.quantity, 2);
    let keys: Vec<&str> = updated.custom_attributes.keys().map(String::as_str).collect();
    assert_eq!(keys, ["range", "drive"]);

    let stored = tool(&h, f.tool_id).await;
    assert_eq!(stored, updated);

    let err = h
        .tools
        .update(
            f.tool_id,
            UpdateTool {
                quantity: Some(-1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = h.tools.update(404, UpdateTool::default()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
