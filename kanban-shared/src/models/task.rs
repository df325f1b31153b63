/// Task model and database operations
///
/// A task lives on one board, has an author, and carries three collections:
/// tags (through `task_tag`), subtasks and assignees (through `assignee`).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE task (
///     task_id serial PRIMARY KEY,
///     task_name VARCHAR NOT NULL,
///     task_description VARCHAR,
///     board_id INTEGER NOT NULL REFERENCES board (board_id) ON DELETE CASCADE,
///     author_id INTEGER NOT NULL DEFAULT 0 REFERENCES person (person_id) ON DELETE SET DEFAULT
/// );
///
/// CREATE TABLE assignee (
///     ref_task_id INTEGER NOT NULL REFERENCES task (task_id) ON DELETE CASCADE,
///     assignee_id INTEGER NOT NULL REFERENCES person (person_id) ON DELETE CASCADE,
///     PRIMARY KEY (ref_task_id, assignee_id)
/// );
///
/// CREATE TABLE task_tag (
///     ref_task_id INTEGER REFERENCES task (task_id) ON DELETE CASCADE,
///     ref_tag_id INTEGER REFERENCES tag (tag_id) ON DELETE CASCADE,
///     PRIMARY KEY (ref_task_id, ref_tag_id)
/// );
/// ```
///
/// # Reloads
///
/// `add_*` operations refresh only the collection they touched and return
/// the rest of the task as passed in. `remove_*` operations re-fetch the
/// whole task.
///
/// # Example
///
/// ```no_run
/// use kanban_shared::database::Database;
/// use kanban_shared::models::subtask::CreateSubtask;
/// use sqlx::PgPool;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example(pool: PgPool) -> kanban_shared::error::Result<()> {
/// let db = Database::from_pool(pool);
/// let ctx = CancellationToken::new();
///
/// let task = db.task.get_by_id(&ctx, 1).await?;
/// let task = db
///     .task
///     .add_subtask_to_task(&ctx, CreateSubtask { name: "write tests".to_string() }, task)
///     .await?;
/// println!("{} has {} subtasks", task.name, task.subtasks.len());
/// # Ok(())
/// # }
/// ```

use crate::{
    db::conn::{db_id, DbConn},
    error::{Result, ResultExt},
    models::{
        decode_rows,
        person::NULL_PERSON_ID,
        subtask::{CreateSubtask, Subtask, SubtaskModel},
        summary::{TaskAssignee, TaskAuthor},
        tag::Tag,
    },
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Task aggregate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Task {
    #[sqlx(rename = "task_id", try_from = "i32")]
    pub id: u32,

    #[sqlx(rename = "task_name")]
    pub name: String,

    #[sqlx(rename = "task_description")]
    pub description: Option<String>,

    /// Board the task belongs to
    #[sqlx(try_from = "i32")]
    pub board_id: u32,

    /// Creator; the sentinel person once the real author is deleted
    #[sqlx(flatten)]
    pub author: TaskAuthor,

    #[sqlx(skip)]
    #[serde(default)]
    pub assignees: Vec<TaskAssignee>,

    #[sqlx(skip)]
    #[serde(default)]
    pub subtasks: Vec<Subtask>,

    #[sqlx(skip)]
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// Input for creating a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Overwritten by `add_task_to_board`
    #[serde(default)]
    pub board_id: u32,

    /// Defaults to the sentinel person
    #[serde(default = "default_author_id")]
    pub author_id: u32,
}

fn default_author_id() -> u32 {
    NULL_PERSON_ID
}

const SELECT_TASK_SQL: &str = r#"
    SELECT task.task_id, task.task_name, task.task_description, task.board_id,
           person.person_id, person.username, person.first_name,
           person.last_name, person.email
    FROM task
    JOIN person ON person.person_id = task.author_id
    WHERE task.task_id = $1
"#;

/// Operations on `task` and its junction tables
#[derive(Clone)]
pub struct TaskModel {
    db: Arc<dyn DbConn>,
}

impl TaskModel {
    pub fn new(db: Arc<dyn DbConn>) -> Self {
        Self { db }
    }

    /// Inserts a task and returns it with its author
    ///
    /// The returned task has empty collections.
    ///
    /// # Errors
    ///
    /// Foreign key violation when the board or author does not exist.
    pub async fn create(&self, ctx: &CancellationToken, data: CreateTask) -> Result<Task> {
        const OP: &str = "TaskModel.create";

        let board_id = db_id(data.board_id).context(OP)?;
        let author_id = db_id(data.author_id).context(OP)?;
        let row = self
            .db
            .query_row(
                ctx,
                sqlx::query(
                    r#"
                    WITH inserted_task AS (
                        INSERT INTO task (task_name, task_description, board_id, author_id)
                        VALUES ($1, $2, $3, $4)
                        RETURNING task_id, task_name, task_description, board_id, author_id
                    )
                    SELECT inserted_task.task_id, inserted_task.task_name,
                           inserted_task.task_description, inserted_task.board_id,
                           person.person_id, person.username, person.first_name,
                           person.last_name, person.email
                    FROM inserted_task
                    JOIN person ON person.person_id = inserted_task.author_id
                    "#,
                )
                .bind(data.name)
                .bind(data.description)
                .bind(board_id)
                .bind(author_id),
            )
            .await
            .context(OP)?;

        let task = Task::from_row(&row).context(OP)?;
        debug!(task_id = task.id, board_id = task.board_id, "Created task");
        Ok(task)
    }

    /// Loads a task with tags, subtasks and assignees
    pub async fn get_by_id(&self, ctx: &CancellationToken, id: u32) -> Result<Task> {
        const OP: &str = "TaskModel.get_by_id";

        let id = db_id(id).context(OP)?;
        let row = self
            .db
            .query_row(ctx, sqlx::query(SELECT_TASK_SQL).bind(id))
            .await
            .context(OP)?;

        let task = Task::from_row(&row).context(OP)?;
        self.load_everything(ctx, task).await.context(OP)
    }

    /// Deletes a task with its subtasks and junction rows
    ///
    /// Returns `false` when the task did not exist.
    pub async fn delete_by_id(&self, ctx: &CancellationToken, id: u32) -> Result<bool> {
        const OP: &str = "TaskModel.delete_by_id";

        let id = db_id(id).context(OP)?;
        let result = self
            .db
            .exec(ctx, sqlx::query("DELETE FROM task WHERE task_id = $1").bind(id))
            .await
            .context(OP)?;

        Ok(result.rows_affected() > 0)
    }

    /// Assigns `assignee` to `task`; refreshes assignees only
    pub async fn add_assignee_to_task(
        &self,
        ctx: &CancellationToken,
        assignee: TaskAssignee,
        task: Task,
    ) -> Result<Task> {
        const OP: &str = "TaskModel.add_assignee_to_task";

        self.db
            .exec(
                ctx,
                sqlx::query("INSERT INTO assignee (ref_task_id, assignee_id) VALUES ($1, $2)")
                    .bind(db_id(task.id).context(OP)?)
                    .bind(db_id(assignee.id).context(OP)?),
            )
            .await
            .context(OP)?;

        self.load_assignees(ctx, task).await.context(OP)
    }

    /// Unassigns `assignee`; returns the re-fetched task
    pub async fn remove_assignee_from_task(
        &self,
        ctx: &CancellationToken,
        assignee: TaskAssignee,
        task: Task,
    ) -> Result<Task> {
        const OP: &str = "TaskModel.remove_assignee_from_task";

        self.db
            .exec(
                ctx,
                sqlx::query("DELETE FROM assignee WHERE ref_task_id = $1 AND assignee_id = $2")
                    .bind(db_id(task.id).context(OP)?)
                    .bind(db_id(assignee.id).context(OP)?),
            )
            .await
            .context(OP)?;

        self.get_by_id(ctx, task.id).await.context(OP)
    }

    /// Links `tag` to `task`; refreshes tags only
    pub async fn add_tag_to_task(&self, ctx: &CancellationToken, tag: &Tag, task: Task) -> Result<Task> {
        const OP: &str = "TaskModel.add_tag_to_task";

        self.db
            .exec(
                ctx,
                sqlx::query("INSERT INTO task_tag (ref_task_id, ref_tag_id) VALUES ($1, $2)")
                    .bind(db_id(task.id).context(OP)?)
                    .bind(db_id(tag.id).context(OP)?),
            )
            .await
            .context(OP)?;

        self.load_tags(ctx, task).await.context(OP)
    }

    /// Unlinks `tag` from `task`; returns the re-fetched task
    pub async fn remove_tag_from_task(
        &self,
        ctx: &CancellationToken,
        tag: &Tag,
        task: Task,
    ) -> Result<Task> {
        const OP: &str = "TaskModel.remove_tag_from_task";

        self.db
            .exec(
                ctx,
                sqlx::query("DELETE FROM task_tag WHERE ref_task_id = $1 AND ref_tag_id = $2")
                    .bind(db_id(task.id).context(OP)?)
                    .bind(db_id(tag.id).context(OP)?),
            )
            .await
            .context(OP)?;

        self.get_by_id(ctx, task.id).await.context(OP)
    }

    /// Adds a subtask under `task`; refreshes subtasks only
    pub async fn add_subtask_to_task(
        &self,
        ctx: &CancellationToken,
        subtask: CreateSubtask,
        task: Task,
    ) -> Result<Task> {
        const OP: &str = "TaskModel.add_subtask_to_task";

        SubtaskModel::new(self.db.clone())
            .create(ctx, task.id, subtask)
            .await
            .context(OP)?;

        self.load_subtasks(ctx, task).await.context(OP)
    }

    /// Deletes `subtask`; returns the re-fetched task
    pub async fn remove_subtask_from_task(
        &self,
        ctx: &CancellationToken,
        subtask: &Subtask,
        task: Task,
    ) -> Result<Task> {
        const OP: &str = "TaskModel.remove_subtask_from_task";

        SubtaskModel::new(self.db.clone())
            .delete_by_id(ctx, subtask.id)
            .await
            .context(OP)?;

        self.get_by_id(ctx, task.id).await.context(OP)
    }

    /// Fills tags, then subtasks, then assignees
    pub async fn load_everything(&self, ctx: &CancellationToken, task: Task) -> Result<Task> {
        const OP: &str = "TaskModel.load_everything";

        let task = self.load_tags(ctx, task).await.context(OP)?;
        let task = self.load_subtasks(ctx, task).await.context(OP)?;
        self.load_assignees(ctx, task).await.context(OP)
    }

    /// Replaces `tags` with the tags attached through `task_tag`
    pub async fn load_tags(&self, ctx: &CancellationToken, mut task: Task) -> Result<Task> {
        const OP: &str = "TaskModel.load_tags";

        let rows = self
            .db
            .query(
                ctx,
                sqlx::query(
                    r#"
                    SELECT tag.tag_id, tag.tag_name, tag.tag_description, tag.board_id
                    FROM task_tag
                    JOIN tag ON tag.tag_id = task_tag.ref_tag_id
                    WHERE task_tag.ref_task_id = $1
                    ORDER BY tag.tag_id
                    "#,
                )
                .bind(db_id(task.id).context(OP)?),
            )
            .await
            .context(OP)?;

        task.tags = decode_rows(&rows).context(OP)?;
        Ok(task)
    }

    /// Replaces `subtasks` with the task's checklist items
    pub async fn load_subtasks(&self, ctx: &CancellationToken, mut task: Task) -> Result<Task> {
        task.subtasks = SubtaskModel::new(self.db.clone())
            .list_for_task(ctx, task.id)
            .await
            .context("TaskModel.load_subtasks")?;
        Ok(task)
    }

    /// Replaces `assignees` with the people assigned to the task
    pub async fn load_assignees(&self, ctx: &CancellationToken, mut task: Task) -> Result<Task> {
        const OP: &str = "TaskModel.load_assignees";

        let rows = self
            .db
            .query(
                ctx,
                sqlx::query(
                    r#"
                    SELECT person.person_id, person.username, person.first_name,
                           person.last_name, person.email
                    FROM assignee
                    JOIN person ON person.person_id = assignee.assignee_id
                    WHERE assignee.ref_task_id = $1
                    ORDER BY person.person_id
                    "#,
                )
                .bind(db_id(task.id).context(OP)?),
            )
            .await
            .context(OP)?;

        task.assignees = decode_rows(&rows).context(OP)?;
        Ok(task)
    }
}
