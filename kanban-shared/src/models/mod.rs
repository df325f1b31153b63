/// Entity models and their graph loading
///
/// Each model owns one table. `get_by_*` calls return a fully hydrated
/// aggregate: the base row plus one query per related collection, run in a
/// fixed order. A failure at any stage returns the error and nothing else.
///
/// # Models
///
/// - `person`: accounts, with owned/contributed boards and assigned tasks
/// - `board`: boards, with tags, tasks and contributors
/// - `task`: tasks, with tags, subtasks and assignees
/// - `subtask`: task checklist items
/// - `tag`: board-scoped labels
/// - `summary`: reduced projections embedded in other aggregates
///
/// # Example
///
/// ```no_run
/// use kanban_shared::database::Database;
/// use kanban_shared::models::board::CreateBoard;
/// use kanban_shared::models::person::CreatePerson;
/// use sqlx::PgPool;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example(pool: PgPool) -> kanban_shared::error::Result<()> {
/// let db = Database::from_pool(pool);
/// let ctx = CancellationToken::new();
///
/// let owner = db.person.create(&ctx, CreatePerson {
///     username: "jdoe".to_string(),
///     first_name: "John".to_string(),
///     last_name: "Doe".to_string(),
///     email: "jdoe@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
///
/// let board = db.board.create(&ctx, CreateBoard {
///     name: "Roadmap".to_string(),
///     owner_id: owner.id,
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod board;
pub mod person;
pub mod subtask;
pub mod summary;
pub mod tag;
pub mod task;

use crate::error::Result;
use sqlx::{postgres::PgRow, FromRow, Row};

/// Decodes every row into `T`
pub(crate) fn decode_rows<T>(rows: &[PgRow]) -> Result<Vec<T>>
where
    T: for<'r> FromRow<'r, PgRow>,
{
    rows.iter()
        .map(|row| T::from_row(row).map_err(Into::into))
        .collect()
}

/// Reads an INTEGER id column as `u32`
pub(crate) fn id_column(row: &PgRow, column: &str) -> Result<u32> {
    let raw: i32 = row.try_get(column)?;
    u32::try_from(raw).map_err(|e| {
        sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(e),
        }
        .into()
    })
}
