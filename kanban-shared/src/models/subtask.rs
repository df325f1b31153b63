/// Subtask model
///
/// Subtasks are checklist items of a single task and are deleted with it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE subtask (
///     subtask_id serial PRIMARY KEY,
///     subtask_name VARCHAR NOT NULL,
///     parent_task_id INTEGER NOT NULL REFERENCES task (task_id) ON DELETE CASCADE
/// );
/// ```

use crate::{
    db::conn::{db_id, DbConn},
    error::{Result, ResultExt},
    models::decode_rows,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Subtask {
    #[sqlx(rename = "subtask_id", try_from = "i32")]
    pub id: u32,

    #[sqlx(rename = "subtask_name")]
    pub name: String,

    #[sqlx(try_from = "i32")]
    pub parent_task_id: u32,
}

/// Input for adding a subtask; the parent comes from the task it is added to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubtask {
    pub name: String,
}

/// Operations on the `subtask` table
#[derive(Clone)]
pub struct SubtaskModel {
    db: Arc<dyn DbConn>,
}

impl SubtaskModel {
    pub fn new(db: Arc<dyn DbConn>) -> Self {
        Self { db }
    }

    /// Inserts a subtask under `parent_task_id`
    pub async fn create(
        &self,
        ctx: &CancellationToken,
        parent_task_id: u32,
        data: CreateSubtask,
    ) -> Result<Subtask> {
        const OP: &str = "SubtaskModel.create";

        let parent = db_id(parent_task_id).context(OP)?;
        let row = self
            .db
            .query_row(
                ctx,
                sqlx::query(
                    r#"
                    INSERT INTO subtask (subtask_name, parent_task_id)
                    VALUES ($1, $2)
                    RETURNING subtask_id, subtask_name, parent_task_id
                    "#,
                )
                .bind(data.name)
                .bind(parent),
            )
            .await
            .context(OP)?;

        Subtask::from_row(&row).context(OP)
    }

    pub async fn get_by_id(&self, ctx: &CancellationToken, id: u32) -> Result<Subtask> {
        const OP: &str = "SubtaskModel.get_by_id";

        let id = db_id(id).context(OP)?;
        let row = self
            .db
            .query_row(
                ctx,
                sqlx::query(
                    r#"
                    SELECT subtask_id, subtask_name, parent_task_id
                    FROM subtask
                    WHERE subtask_id = $1
                    "#,
                )
                .bind(id),
            )
            .await
            .context(OP)?;

        Subtask::from_row(&row).context(OP)
    }

    /// Every subtask of `task_id`, oldest first
    pub async fn list_for_task(&self, ctx: &CancellationToken, task_id: u32) -> Result<Vec<Subtask>> {
        const OP: &str = "SubtaskModel.list_for_task";

        let task_id = db_id(task_id).context(OP)?;
        let rows = self
            .db
            .query(
                ctx,
                sqlx::query(
                    r#"
                    SELECT subtask_id, subtask_name, parent_task_id
                    FROM subtask
                    WHERE parent_task_id = $1
                    ORDER BY subtask_id
                    "#,
                )
                .bind(task_id),
            )
            .await
            .context(OP)?;

        decode_rows(&rows).context(OP)
    }

    /// `false` when the subtask did not exist
    pub async fn delete_by_id(&self, ctx: &CancellationToken, id: u32) -> Result<bool> {
        const OP: &str = "SubtaskModel.delete_by_id";

        let id = db_id(id).context(OP)?;
        let result = self
            .db
            .exec(ctx, sqlx::query("DELETE FROM subtask WHERE subtask_id = $1").bind(id))
            .await
            .context(OP)?;

        Ok(result.rows_affected() > 0)
    }
}
