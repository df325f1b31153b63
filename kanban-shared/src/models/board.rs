/// Board model and database operations
///
/// A board has one owner and any number of contributors, tasks and tags.
/// Deleting a board removes its tasks (with their subtasks and links), its
/// tags and its contributor rows.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE board (
///     board_id serial PRIMARY KEY,
///     board_name VARCHAR NOT NULL,
///     owner_id INTEGER NOT NULL REFERENCES person (person_id) ON DELETE CASCADE
/// );
///
/// CREATE TABLE contributor (
///     person_id INTEGER REFERENCES person (person_id) ON DELETE CASCADE,
///     board_id INTEGER REFERENCES board (board_id) ON DELETE CASCADE,
///     PRIMARY KEY (person_id, board_id)
/// );
/// ```
///
/// # Reloads
///
/// `add_*` operations refresh only the collection they touched. The other
/// collections are returned as they were passed in and may be stale.
/// `remove_*` operations re-fetch the whole board.
///
/// # Example
///
/// ```no_run
/// use kanban_shared::database::Database;
/// use kanban_shared::models::board::CreateBoard;
/// use sqlx::PgPool;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example(pool: PgPool) -> kanban_shared::error::Result<()> {
/// let db = Database::from_pool(pool);
/// let ctx = CancellationToken::new();
///
/// let owner = db.person.get_by_username(&ctx, "jdoe").await?;
/// let helper = db.person.get_by_username(&ctx, "asmith").await?;
///
/// let board = db.board.create(&ctx, CreateBoard {
///     name: "Roadmap".to_string(),
///     owner_id: owner.id,
/// }).await?;
///
/// let board = db.board.add_contributor_to_board(&ctx, helper.summary(), board).await?;
/// assert_eq!(board.contributors.len(), 1);
/// # Ok(())
/// # }
/// ```

use crate::{
    db::conn::{db_id, DbConn},
    error::{Error, Result, ResultExt},
    models::{
        decode_rows, id_column,
        summary::{BoardOwner, BoardSummary, Contributor},
        tag::{CreateTag, Tag, TagModel},
        task::{CreateTask, Task, TaskModel},
    },
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Board aggregate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Board {
    #[sqlx(rename = "board_id", try_from = "i32")]
    pub id: u32,

    #[sqlx(rename = "board_name")]
    pub name: String,

    #[sqlx(flatten)]
    pub owner: BoardOwner,

    /// People other than the owner with access to the board
    #[sqlx(skip)]
    #[serde(default)]
    pub contributors: Vec<Contributor>,

    /// Fully loaded tasks
    #[sqlx(skip)]
    #[serde(default)]
    pub tasks: Vec<Task>,

    #[sqlx(skip)]
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Board {
    /// Id, name and owner only
    pub fn summary(&self) -> BoardSummary {
        BoardSummary {
            id: self.id,
            name: self.name.clone(),
            owner: self.owner.clone(),
        }
    }
}

/// Input for creating a board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBoard {
    pub name: String,
    pub owner_id: u32,
}

const SELECT_BOARD_SQL: &str = r#"
    SELECT board.board_id, board.board_name,
           person.person_id, person.username, person.first_name,
           person.last_name, person.email
    FROM board
    JOIN person ON person.person_id = board.owner_id
    WHERE board.board_id = $1
"#;

/// Operations on `board` and `contributor`
#[derive(Clone)]
pub struct BoardModel {
    db: Arc<dyn DbConn>,
}

impl BoardModel {
    pub fn new(db: Arc<dyn DbConn>) -> Self {
        Self { db }
    }

    /// Inserts a board and returns it with its owner
    ///
    /// # Errors
    ///
    /// Foreign key violation when the owner does not exist.
    pub async fn create(&self, ctx: &CancellationToken, data: CreateBoard) -> Result<Board> {
        const OP: &str = "BoardModel.create";

        let owner_id = db_id(data.owner_id).context(OP)?;
        let row = self
            .db
            .query_row(
                ctx,
                sqlx::query(
                    r#"
                    WITH inserted_board AS (
                        INSERT INTO board (board_name, owner_id)
                        VALUES ($1, $2)
                        RETURNING board_id, board_name, owner_id
                    )
                    SELECT inserted_board.board_id, inserted_board.board_name,
                           person.person_id, person.username, person.first_name,
                           person.last_name, person.email
                    FROM inserted_board
                    JOIN person ON person.person_id = inserted_board.owner_id
                    "#,
                )
                .bind(data.name)
                .bind(owner_id),
            )
            .await
            .context(OP)?;

        let board = Board::from_row(&row).context(OP)?;
        debug!(board_id = board.id, owner_id = board.owner.id, "Created board");
        Ok(board)
    }

    /// Loads a board with tags, tasks and contributors
    pub async fn get_by_id(&self, ctx: &CancellationToken, id: u32) -> Result<Board> {
        const OP: &str = "BoardModel.get_by_id";

        let id = db_id(id).context(OP)?;
        let row = self
            .db
            .query_row(ctx, sqlx::query(SELECT_BOARD_SQL).bind(id))
            .await
            .context(OP)?;

        let board = Board::from_row(&row).context(OP)?;
        self.load_everything(ctx, board).await.context(OP)
    }

    /// Deletes a board and everything on it
    ///
    /// Returns `false` when the board did not exist.
    pub async fn delete_by_id(&self, ctx: &CancellationToken, id: u32) -> Result<bool> {
        const OP: &str = "BoardModel.delete_by_id";

        let id = db_id(id).context(OP)?;
        let result = self
            .db
            .exec(ctx, sqlx::query("DELETE FROM board WHERE board_id = $1").bind(id))
            .await
            .context(OP)?;

        Ok(result.rows_affected() > 0)
    }

    /// Adds `contrib` as a contributor; refreshes contributors only
    ///
    /// # Errors
    ///
    /// [`Error::OwnerAsContributor`] when `contrib` is the board owner. Nothing
    /// is written in that case.
    pub async fn add_contributor_to_board(
        &self,
        ctx: &CancellationToken,
        contrib: Contributor,
        board: Board,
    ) -> Result<Board> {
        const OP: &str = "BoardModel.add_contributor_to_board";

        if contrib.id == board.owner.id {
            return Err(Error::OwnerAsContributor {
                board_id: board.id,
                person_id: contrib.id,
            }
            .context(OP));
        }

        self.db
            .exec(
                ctx,
                sqlx::query("INSERT INTO contributor (person_id, board_id) VALUES ($1, $2)")
                    .bind(db_id(contrib.id).context(OP)?)
                    .bind(db_id(board.id).context(OP)?),
            )
            .await
            .context(OP)?;

        self.load_contributors(ctx, board).await.context(OP)
    }

    /// Removes `contrib` from the contributors; returns the re-fetched board
    pub async fn remove_contributor_from_board(
        &self,
        ctx: &CancellationToken,
        contrib: Contributor,
        board: Board,
    ) -> Result<Board> {
        const OP: &str = "BoardModel.remove_contributor_from_board";

        self.db
            .exec(
                ctx,
                sqlx::query("DELETE FROM contributor WHERE person_id = $1 AND board_id = $2")
                    .bind(db_id(contrib.id).context(OP)?)
                    .bind(db_id(board.id).context(OP)?),
            )
            .await
            .context(OP)?;

        self.get_by_id(ctx, board.id).await.context(OP)
    }

    /// Creates a task on `board`; refreshes tasks only
    ///
    /// `task.board_id` is replaced with `board.id`.
    pub async fn add_task_to_board(
        &self,
        ctx: &CancellationToken,
        mut task: CreateTask,
        board: Board,
    ) -> Result<Board> {
        const OP: &str = "BoardModel.add_task_to_board";

        task.board_id = board.id;
        TaskModel::new(self.db.clone())
            .create(ctx, task)
            .await
            .context(OP)?;

        self.load_tasks(ctx, board).await.context(OP)
    }

    /// Deletes `task` from `board`; returns the re-fetched board
    ///
    /// # Errors
    ///
    /// [`Error::ParentMismatch`] when the task is on another board. Nothing is
    /// deleted in that case.
    pub async fn remove_task_from_board(
        &self,
        ctx: &CancellationToken,
        task: &Task,
        board: Board,
    ) -> Result<Board> {
        const OP: &str = "BoardModel.remove_task_from_board";

        if task.board_id != board.id {
            return Err(Error::ParentMismatch {
                child: "task",
                child_board_id: task.board_id,
                board_id: board.id,
            }
            .context(OP));
        }

        TaskModel::new(self.db.clone())
            .delete_by_id(ctx, task.id)
            .await
            .context(OP)?;

        self.get_by_id(ctx, board.id).await.context(OP)
    }

    /// Creates a tag on `board`; refreshes tags only
    ///
    /// `tag.board_id` is replaced with `board.id`.
    pub async fn add_tag_to_board(
        &self,
        ctx: &CancellationToken,
        mut tag: CreateTag,
        board: Board,
    ) -> Result<Board> {
        const OP: &str = "BoardModel.add_tag_to_board";

        tag.board_id = board.id;
        TagModel::new(self.db.clone())
            .create(ctx, tag)
            .await
            .context(OP)?;

        self.load_tags(ctx, board).await.context(OP)
    }

    /// Deletes `tag` from `board`; returns the re-fetched board
    ///
    /// # Errors
    ///
    /// [`Error::ParentMismatch`] when the tag is on another board.
    pub async fn remove_tag_from_board(
        &self,
        ctx: &CancellationToken,
        tag: &Tag,
        board: Board,
    ) -> Result<Board> {
        const OP: &str = "BoardModel.remove_tag_from_board";

        if tag.board_id != board.id {
            return Err(Error::ParentMismatch {
                child: "tag",
                child_board_id: tag.board_id,
                board_id: board.id,
            }
            .context(OP));
        }

        TagModel::new(self.db.clone())
            .delete_by_id(ctx, tag.id)
            .await
            .context(OP)?;

        self.get_by_id(ctx, board.id).await.context(OP)
    }

    /// Fills tags, then tasks, then contributors
    pub async fn load_everything(&self, ctx: &CancellationToken, board: Board) -> Result<Board> {
        const OP: &str = "BoardModel.load_everything";

        let board = self.load_tags(ctx, board).await.context(OP)?;
        let board = self.load_tasks(ctx, board).await.context(OP)?;
        self.load_contributors(ctx, board).await.context(OP)
    }

    /// Replaces `tags` with the board's tags, ordered by id
    pub async fn load_tags(&self, ctx: &CancellationToken, mut board: Board) -> Result<Board> {
        const OP: &str = "BoardModel.load_tags";

        let rows = self
            .db
            .query(
                ctx,
                sqlx::query(
                    r#"
                    SELECT tag_id, tag_name, tag_description, board_id
                    FROM tag
                    WHERE board_id = $1
                    ORDER BY tag_id
                    "#,
                )
                .bind(db_id(board.id).context(OP)?),
            )
            .await
            .context(OP)?;

        board.tags = decode_rows(&rows).context(OP)?;
        Ok(board)
    }

    /// Replaces `tasks` with every task on the board, each fully loaded
    pub async fn load_tasks(&self, ctx: &CancellationToken, mut board: Board) -> Result<Board> {
        const OP: &str = "BoardModel.load_tasks";

        let rows = self
            .db
            .query(
                ctx,
                sqlx::query("SELECT task_id FROM task WHERE board_id = $1 ORDER BY task_id")
                    .bind(db_id(board.id).context(OP)?),
            )
            .await
            .context(OP)?;

        let task_ids = rows
            .iter()
            .map(|row| id_column(row, "task_id"))
            .collect::<Result<Vec<_>>>()
            .context(OP)?;

        let tasks = TaskModel::new(self.db.clone());
        let mut loaded = Vec::with_capacity(task_ids.len());
        for task_id in task_ids {
            loaded.push(tasks.get_by_id(ctx, task_id).await.context(OP)?);
        }

        board.tasks = loaded;
        Ok(board)
    }

    /// Replaces `contributors` with everyone given access besides the owner
    pub async fn load_contributors(&self, ctx: &CancellationToken, mut board: Board) -> Result<Board> {
        const OP: &str = "BoardModel.load_contributors";

        let rows = self
            .db
            .query(
                ctx,
                sqlx::query(
                    r#"
                    SELECT person.person_id, person.username, person.first_name,
                           person.last_name, person.email
                    FROM contributor
                    JOIN person ON person.person_id = contributor.person_id
                    WHERE contributor.board_id = $1
                    ORDER BY person.person_id
                    "#,
                )
                .bind(db_id(board.id).context(OP)?),
            )
            .await
            .context(OP)?;

        board.contributors = decode_rows(&rows).context(OP)?;
        Ok(board)
    }
}
