/// Tag model and database operations
///
/// Tags are labels scoped to a board. Tasks on the same board reference them
/// through the `task_tag` junction table.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tag (
///     tag_id serial PRIMARY KEY,
///     tag_name VARCHAR NOT NULL,
///     tag_description VARCHAR NOT NULL,
///     board_id INTEGER NOT NULL REFERENCES board (board_id) ON DELETE CASCADE
/// );
/// ```
///
/// Tags are normally created through
/// [`BoardModel::add_tag_to_board`](crate::models::board::BoardModel::add_tag_to_board),
/// which pins `board_id` to the board passed in.

use crate::{
    db::conn::{db_id, DbConn},
    error::{Result, ResultExt},
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Board-scoped label
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Tag {
    #[sqlx(rename = "tag_id", try_from = "i32")]
    pub id: u32,

    #[sqlx(rename = "tag_name")]
    pub name: String,

    #[sqlx(rename = "tag_description")]
    pub description: String,

    /// Board the tag belongs to
    #[sqlx(try_from = "i32")]
    pub board_id: u32,
}

/// Input for creating a tag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTag {
    pub name: String,
    pub description: String,
    /// Overwritten by `add_tag_to_board`
    #[serde(default)]
    pub board_id: u32,
}

/// Operations on the `tag` table
#[derive(Clone)]
pub struct TagModel {
    db: Arc<dyn DbConn>,
}

impl TagModel {
    pub fn new(db: Arc<dyn DbConn>) -> Self {
        Self { db }
    }

    /// Inserts a tag
    ///
    /// Prefer `BoardModel::add_tag_to_board`, which also refreshes the
    /// board's tag list.
    pub async fn create(&self, ctx: &CancellationToken, data: CreateTag) -> Result<Tag> {
        const OP: &str = "TagModel.create";

        let board_id = db_id(data.board_id).context(OP)?;
        let row = self
            .db
            .query_row(
                ctx,
                sqlx::query(
                    r#"
                    INSERT INTO tag (tag_name, tag_description, board_id)
                    VALUES ($1, $2, $3)
                    RETURNING tag_id, tag_name, tag_description, board_id
                    "#,
                )
                .bind(data.name)
                .bind(data.description)
                .bind(board_id),
            )
            .await
            .context(OP)?;

        let tag = Tag::from_row(&row).context(OP)?;
        debug!(tag_id = tag.id, board_id = tag.board_id, "Created tag");
        Ok(tag)
    }

    pub async fn get_by_id(&self, ctx: &CancellationToken, id: u32) -> Result<Tag> {
        const OP: &str = "TagModel.get_by_id";

        let id = db_id(id).context(OP)?;
        let row = self
            .db
            .query_row(
                ctx,
                sqlx::query(
                    r#"
                    SELECT tag_id, tag_name, tag_description, board_id
                    FROM tag
                    WHERE tag_id = $1
                    "#,
                )
                .bind(id),
            )
            .await
            .context(OP)?;

        Tag::from_row(&row).context(OP)
    }

    /// Deletes a tag and its task links; `false` when it did not exist
    pub async fn delete_by_id(&self, ctx: &CancellationToken, id: u32) -> Result<bool> {
        const OP: &str = "TagModel.delete_by_id";

        let id = db_id(id).context(OP)?;
        let result = self
            .db
            .exec(ctx, sqlx::query("DELETE FROM tag WHERE tag_id = $1").bind(id))
            .await
            .context(OP)?;

        Ok(result.rows_affected() > 0)
    }
}
