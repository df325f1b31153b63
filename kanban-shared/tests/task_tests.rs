/// Integration tests for TaskModel and SubtaskModel
///
/// Run with: cargo test --test task_tests

mod common;

use common::{MISSING_ID, NEVER_CREATED_ID};
use kanban_shared::error::Error;
use kanban_shared::models::subtask::CreateSubtask;
use kanban_shared::models::task::CreateTask;
use serial_test::serial;
use tokio_util::sync::CancellationToken;

#[tokio::test]
#[serial]
async fn test_create_and_get_round_trip() {
    let Some(db) = common::setup().await else { return };
    let ctx = CancellationToken::new();
    let seeded = common::seed(&db, &ctx).await;

    let created = &seeded.tasks[0];
    assert_eq!(created.name, "Add pagination");
    assert_eq!(
        created.description.as_deref(),
        Some("Board listing returns everything at once")
    );
    assert_eq!(created.board_id, seeded.boards[0].id);
    assert_eq!(created.author, seeded.persons[0].summary());

    let fetched = db.task.get_by_id(&ctx, created.id).await.unwrap();
    assert_eq!(&fetched, created);

    let without_description = db.task.get_by_id(&ctx, seeded.tasks[1].id).await.unwrap();
    assert!(without_description.description.is_none());
}

#[tokio::test]
#[serial]
async fn test_task_names_are_not_unique() {
    let Some(db) = common::setup().await else { return };
    let ctx = CancellationToken::new();
    let seeded = common::seed(&db, &ctx).await;

    let data = CreateTask {
        name: seeded.tasks[0].name.clone(),
        description: None,
        board_id: seeded.boards[0].id,
        author_id: seeded.persons[0].id,
    };
    let duplicate = db.task.create(&ctx, data).await.unwrap();
    assert_ne!(duplicate.id, seeded.tasks[0].id);
}

#[tokio::test]
#[serial]
async fn test_create_with_missing_board_fails() {
    let Some(db) = common::setup().await else { return };
    let ctx = CancellationToken::new();
    let persons = common::create_mocked_persons(&db, &ctx).await;

    let err = db
        .task
        .create(
            &ctx,
            CreateTask {
                name: "Nowhere".to_string(),
                description: None,
                board_id: MISSING_ID,
                author_id: persons[0].id,
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_foreign_key_violation(), "unexpected error: {}", err);
}

#[tokio::test]
#[serial]
async fn test_missing_task_is_not_found() {
    let Some(db) = common::setup().await else { return };
    let ctx = CancellationToken::new();
    common::seed(&db, &ctx).await;

    let err = db.task.get_by_id(&ctx, MISSING_ID).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
#[serial]
async fn test_assignees() {
    let Some(db) = common::setup().await else { return };
    let ctx = CancellationToken::new();
    let seeded = common::seed(&db, &ctx).await;

    let task = db.task.get_by_id(&ctx, seeded.tasks[0].id).await.unwrap();
    let task = db
        .task
        .add_assignee_to_task(&ctx, seeded.persons[1].summary(), task)
        .await
        .unwrap();
    let task = db
        .task
        .add_assignee_to_task(&ctx, seeded.persons[2].summary(), task)
        .await
        .unwrap();
    assert_eq!(
        task.assignees,
        vec![seeded.persons[1].summary(), seeded.persons[2].summary()]
    );

    let err = db
        .task
        .add_assignee_to_task(&ctx, seeded.persons[1].summary(), task.clone())
        .await
        .unwrap_err();
    assert!(err.is_unique_violation());

    let task = db
        .task
        .remove_assignee_from_task(&ctx, seeded.persons[1].summary(), task)
        .await
        .unwrap();
    assert_eq!(task.assignees, vec![seeded.persons[2].summary()]);
}

#[tokio::test]
#[serial]
async fn test_tags() {
    let Some(db) = common::setup().await else { return };
    let ctx = CancellationToken::new();
    let seeded = common::seed(&db, &ctx).await;

    let task = db.task.get_by_id(&ctx, seeded.tasks[1].id).await.unwrap();
    let task = db.task.add_tag_to_task(&ctx, &seeded.tags[1], task).await.unwrap();
    let task = db.task.add_tag_to_task(&ctx, &seeded.tags[0], task).await.unwrap();
    assert_eq!(task.tags, vec![seeded.tags[0].clone(), seeded.tags[1].clone()]);

    let task = db
        .task
        .remove_tag_from_task(&ctx, &seeded.tags[0], task)
        .await
        .unwrap();
    assert_eq!(task.tags, vec![seeded.tags[1].clone()]);

    // deleting the tag drops the link
    db.tag.delete_by_id(&ctx, seeded.tags[1].id).await.unwrap();
    let task = db.task.get_by_id(&ctx, task.id).await.unwrap();
    assert!(task.tags.is_empty());
}

#[tokio::test]
#[serial]
async fn test_subtasks() {
    let Some(db) = common::setup().await else { return };
    let ctx = CancellationToken::new();
    let seeded = common::seed(&db, &ctx).await;

    let task = db.task.get_by_id(&ctx, seeded.tasks[0].id).await.unwrap();
    let task = db
        .task
        .add_subtask_to_task(&ctx, CreateSubtask { name: "Cursor encoding".to_string() }, task)
        .await
        .unwrap();
    let task = db
        .task
        .add_subtask_to_task(&ctx, CreateSubtask { name: "Page size limit".to_string() }, task)
        .await
        .unwrap();

    let names: Vec<&str> = task.subtasks.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Cursor encoding", "Page size limit"]);
    assert!(task.subtasks.iter().all(|s| s.parent_task_id == task.id));

    let first = task.subtasks[0].clone();
    let task = db
        .task
        .remove_subtask_from_task(&ctx, &first, task)
        .await
        .unwrap();
    assert_eq!(task.subtasks.len(), 1);
    assert_eq!(task.subtasks[0].name, "Page size limit");
}

#[tokio::test]
#[serial]
async fn test_add_reloads_only_touched_collection() {
    let Some(db) = common::setup().await else { return };
    let ctx = CancellationToken::new();
    let seeded = common::seed(&db, &ctx).await;

    let stale = seeded.tasks[0].clone();
    let fresh = db.task.get_by_id(&ctx, stale.id).await.unwrap();
    db.task
        .add_tag_to_task(&ctx, &seeded.tags[0], fresh)
        .await
        .unwrap();

    let task = db
        .task
        .add_assignee_to_task(&ctx, seeded.persons[2].summary(), stale)
        .await
        .unwrap();
    assert_eq!(task.assignees.len(), 1);
    assert!(task.tags.is_empty());

    let task = db
        .task
        .remove_assignee_from_task(&ctx, seeded.persons[2].summary(), task)
        .await
        .unwrap();
    assert!(task.assignees.is_empty());
    assert_eq!(task.tags, vec![seeded.tags[0].clone()]);
}

#[tokio::test]
#[serial]
async fn test_delete_cascades_to_subtasks_and_links() {
    let Some(db) = common::setup().await else { return };
    let ctx = CancellationToken::new();
    let seeded = common::seed(&db, &ctx).await;

    let task = db.task.get_by_id(&ctx, seeded.tasks[0].id).await.unwrap();
    let task = db
        .task
        .add_subtask_to_task(&ctx, CreateSubtask { name: "Cleanup".to_string() }, task)
        .await
        .unwrap();
    let task = db
        .task
        .add_assignee_to_task(&ctx, seeded.persons[2].summary(), task)
        .await
        .unwrap();
    let subtask_id = task.subtasks[0].id;

    assert!(db.task.delete_by_id(&ctx, task.id).await.unwrap());

    assert!(db.subtask.get_by_id(&ctx, subtask_id).await.unwrap_err().is_not_found());
    assert!(db.subtask.list_for_task(&ctx, task.id).await.unwrap().is_empty());

    let assignee = db.person.get_by_id(&ctx, seeded.persons[2].id).await.unwrap();
    assert!(assignee.assigned_tasks.is_empty());
}

#[tokio::test]
#[serial]
async fn test_delete_missing_task_is_not_an_error() {
    let Some(db) = common::setup().await else { return };
    let ctx = CancellationToken::new();

    assert!(!db.task.delete_by_id(&ctx, NEVER_CREATED_ID).await.unwrap());
}

#[tokio::test]
#[serial]
async fn test_out_of_range_id_is_rejected_before_querying() {
    let Some(db) = common::setup().await else { return };
    let ctx = CancellationToken::new();

    let err = db.task.get_by_id(&ctx, u32::MAX).await.unwrap_err();
    assert!(matches!(err.root(), Error::IdOutOfRange(u32::MAX)));
}

#[tokio::test]
#[serial]
async fn test_cancelled_load_returns_error_only() {
    let Some(db) = common::setup().await else { return };
    let ctx = CancellationToken::new();
    let seeded = common::seed(&db, &ctx).await;

    let cancelled = CancellationToken::new();
    cancelled.cancel();

    let err = db.task.get_by_id(&cancelled, seeded.tasks[0].id).await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(!err.is_not_found());
}
