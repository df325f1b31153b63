/// Person model and database operations
///
/// A person is an account that can own boards, contribute to other people's
/// boards, author tasks and be assigned to tasks. Username and email are
/// unique; a duplicate insert fails with a unique violation.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE person (
///     person_id serial PRIMARY KEY,
///     username VARCHAR UNIQUE NOT NULL,
///     first_name VARCHAR NOT NULL,
///     last_name VARCHAR NOT NULL,
///     email VARCHAR UNIQUE NOT NULL,
///     password_hash VARCHAR NOT NULL
/// );
/// ```
///
/// Row `person_id = 0` is the sentinel person ([`NULL_PERSON_ID`]). It is
/// inserted when the schema is provisioned and stands in as the author of
/// tasks whose author was deleted.
///
/// # Example
///
/// ```no_run
/// use kanban_shared::database::Database;
/// use kanban_shared::models::person::CreatePerson;
/// use sqlx::PgPool;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example(pool: PgPool) -> kanban_shared::error::Result<()> {
/// let db = Database::from_pool(pool);
/// let ctx = CancellationToken::new();
///
/// let person = db.person.create(&ctx, CreatePerson {
///     username: "jdoe".to_string(),
///     first_name: "John".to_string(),
///     last_name: "Doe".to_string(),
///     email: "jdoe@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
///
/// let found = db.person.get_by_email(&ctx, "jdoe@example.com").await?;
/// assert_eq!(found.id, person.id);
/// println!("{} owns or contributes to {} boards", found.username, found.boards.len());
/// # Ok(())
/// # }
/// ```

use crate::{
    db::conn::{db_id, DbConn, PgQuery},
    error::{Error, Result, ResultExt},
    models::{
        decode_rows, id_column,
        summary::{BoardSummary, Contributor, PersonSummary},
        task::{Task, TaskModel},
    },
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Id of the sentinel person created with the schema
pub const NULL_PERSON_ID: u32 = 0;

/// Person aggregate
///
/// `boards` and `assigned_tasks` are filled by every `get_by_*` call. A
/// freshly created person has both empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Person {
    #[sqlx(rename = "person_id", try_from = "i32")]
    pub id: u32,

    pub username: String,

    pub first_name: String,

    pub last_name: String,

    pub email: String,

    /// Argon2id hash; never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Boards this person owns or contributes to
    #[sqlx(skip)]
    #[serde(default)]
    pub boards: Vec<BoardSummary>,

    /// Tasks this person is assigned to, fully loaded
    #[sqlx(skip)]
    #[serde(default)]
    pub assigned_tasks: Vec<Task>,
}

impl Person {
    /// Reduced projection used inside boards and tasks
    pub fn summary(&self) -> PersonSummary {
        PersonSummary::from(self)
    }

    /// True when `contrib` describes this same person
    ///
    /// Compares id, username, first name, last name and email.
    pub fn is_contributor(&self, contrib: &Contributor) -> bool {
        contrib.id == self.id
            && contrib.username == self.username
            && contrib.first_name == self.first_name
            && contrib.last_name == self.last_name
            && contrib.email == self.email
    }
}

impl From<&Person> for PersonSummary {
    fn from(person: &Person) -> Self {
        PersonSummary {
            id: person.id,
            username: person.username.clone(),
            first_name: person.first_name.clone(),
            last_name: person.last_name.clone(),
            email: person.email.clone(),
        }
    }
}

/// Input for creating a person
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePerson {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Already hashed; see [`crate::password::hash_password`]
    pub password_hash: String,
}

const SELECT_PERSON_BY_ID_SQL: &str = r#"
    SELECT person_id, username, first_name, last_name, email, password_hash
    FROM person
    WHERE person_id = $1
"#;

const SELECT_PERSON_BY_EMAIL_SQL: &str = r#"
    SELECT person_id, username, first_name, last_name, email, password_hash
    FROM person
    WHERE email = $1
"#;

const SELECT_PERSON_BY_USERNAME_SQL: &str = r#"
    SELECT person_id, username, first_name, last_name, email, password_hash
    FROM person
    WHERE username = $1
"#;

/// Operations on the `person` table
#[derive(Clone)]
pub struct PersonModel {
    db: Arc<dyn DbConn>,
}

impl PersonModel {
    pub fn new(db: Arc<dyn DbConn>) -> Self {
        Self { db }
    }

    /// Inserts a person and returns it with its generated id
    ///
    /// # Errors
    ///
    /// Unique violation when the username or email is taken.
    pub async fn create(&self, ctx: &CancellationToken, data: CreatePerson) -> Result<Person> {
        const OP: &str = "PersonModel.create";

        let row = self
            .db
            .query_row(
                ctx,
                sqlx::query(
                    r#"
                    INSERT INTO person (username, first_name, last_name, email, password_hash)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING person_id, username, first_name, last_name, email, password_hash
                    "#,
                )
                .bind(data.username)
                .bind(data.first_name)
                .bind(data.last_name)
                .bind(data.email)
                .bind(data.password_hash),
            )
            .await
            .context(OP)?;

        let person = Person::from_row(&row).context(OP)?;
        debug!(person_id = person.id, "Created person");
        Ok(person)
    }

    /// Loads a person with boards and assigned tasks
    pub async fn get_by_id(&self, ctx: &CancellationToken, id: u32) -> Result<Person> {
        const OP: &str = "PersonModel.get_by_id";

        let id = db_id(id).context(OP)?;
        let query = sqlx::query(SELECT_PERSON_BY_ID_SQL).bind(id);
        self.fetch_and_load(ctx, query).await.context(OP)
    }

    /// Loads a person by email with boards and assigned tasks
    pub async fn get_by_email(&self, ctx: &CancellationToken, email: &str) -> Result<Person> {
        let query = sqlx::query(SELECT_PERSON_BY_EMAIL_SQL).bind(email.to_owned());
        self.fetch_and_load(ctx, query)
            .await
            .context("PersonModel.get_by_email")
    }

    /// Loads a person by username with boards and assigned tasks
    pub async fn get_by_username(&self, ctx: &CancellationToken, username: &str) -> Result<Person> {
        let query = sqlx::query(SELECT_PERSON_BY_USERNAME_SQL).bind(username.to_owned());
        self.fetch_and_load(ctx, query)
            .await
            .context("PersonModel.get_by_username")
    }

    /// Deletes a person
    ///
    /// Owned boards and every junction row referencing the person go with
    /// it; authored tasks on other boards fall back to the sentinel author.
    /// Returns `false` when no such person existed. The sentinel person is
    /// rejected with [`Error::SentinelProtected`] before any statement.
    pub async fn delete_by_id(&self, ctx: &CancellationToken, id: u32) -> Result<bool> {
        const OP: &str = "PersonModel.delete_by_id";

        if id == NULL_PERSON_ID {
            return Err(Error::SentinelProtected(id).context(OP));
        }

        let id = db_id(id).context(OP)?;
        let result = self
            .db
            .exec(ctx, sqlx::query("DELETE FROM person WHERE person_id = $1").bind(id))
            .await
            .context(OP)?;

        Ok(result.rows_affected() > 0)
    }

    /// Fills `assigned_tasks` then `boards`
    pub async fn load_everything(&self, ctx: &CancellationToken, person: Person) -> Result<Person> {
        const OP: &str = "PersonModel.load_everything";

        let person = self.load_assigned_tasks(ctx, person).await.context(OP)?;
        self.load_boards(ctx, person).await.context(OP)
    }

    /// Replaces `assigned_tasks` with every task the person is assigned to
    pub async fn load_assigned_tasks(
        &self,
        ctx: &CancellationToken,
        mut person: Person,
    ) -> Result<Person> {
        const OP: &str = "PersonModel.load_assigned_tasks";

        let rows = self
            .db
            .query(
                ctx,
                sqlx::query(
                    "SELECT ref_task_id FROM assignee WHERE assignee_id = $1 ORDER BY ref_task_id",
                )
                .bind(db_id(person.id).context(OP)?),
            )
            .await
            .context(OP)?;

        let task_ids = rows
            .iter()
            .map(|row| id_column(row, "ref_task_id"))
            .collect::<Result<Vec<_>>>()
            .context(OP)?;

        let tasks = TaskModel::new(self.db.clone());
        let mut assigned = Vec::with_capacity(task_ids.len());
        for task_id in task_ids {
            assigned.push(tasks.get_by_id(ctx, task_id).await.context(OP)?);
        }

        person.assigned_tasks = assigned;
        Ok(person)
    }

    /// Replaces `boards` with owned boards plus boards the person contributes to
    pub async fn load_boards(&self, ctx: &CancellationToken, mut person: Person) -> Result<Person> {
        const OP: &str = "PersonModel.load_boards";

        let rows = self
            .db
            .query(
                ctx,
                sqlx::query(
                    r#"
                    SELECT board.board_id, board.board_name,
                           person.person_id, person.username, person.first_name,
                           person.last_name, person.email
                    FROM board
                    JOIN person ON person.person_id = board.owner_id
                    WHERE board.owner_id = $1
                    UNION
                    SELECT board.board_id, board.board_name,
                           person.person_id, person.username, person.first_name,
                           person.last_name, person.email
                    FROM contributor
                    JOIN board ON board.board_id = contributor.board_id
                    JOIN person ON person.person_id = board.owner_id
                    WHERE contributor.person_id = $1
                    ORDER BY board_id
                    "#,
                )
                .bind(db_id(person.id).context(OP)?),
            )
            .await
            .context(OP)?;

        person.boards = decode_rows(&rows).context(OP)?;
        Ok(person)
    }

    async fn fetch_and_load(&self, ctx: &CancellationToken, query: PgQuery<'_>) -> Result<Person> {
        let row = self.db.query_row(ctx, query).await?;
        let person = Person::from_row(&row)?;
        self.load_everything(ctx, person).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jdoe() -> Person {
        Person {
            id: 7,
            username: "jdoe".to_string(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            email: "jdoe@example.com".to_string(),
            password_hash: "$argon2id$hash".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_summary_drops_password_and_collections() {
        let summary = jdoe().summary();
        assert_eq!(summary.id, 7);
        assert_eq!(summary.username, "jdoe");
        assert_eq!(summary.email, "jdoe@example.com");
    }

    #[test]
    fn test_is_contributor_compares_every_field() {
        let person = jdoe();
        let mut contrib = person.summary();
        assert!(person.is_contributor(&contrib));

        contrib.last_name = "Roe".to_string();
        assert!(!person.is_contributor(&contrib));

        let mut contrib = person.summary();
        contrib.id = 8;
        assert!(!person.is_contributor(&contrib));
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_value(jdoe()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "jdoe");
        assert!(json["boards"].as_array().unwrap().is_empty());
    }
}
