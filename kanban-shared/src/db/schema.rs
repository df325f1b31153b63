/// Schema provisioning
///
/// [`SystemModel`] owns the DDL for the whole board schema. Recreating is
/// destructive: the `public` schema is dropped with everything in it and the
/// tables are created again, parents before children.
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
///
/// CREATE TABLE board (
///     board_id serial PRIMARY KEY,
///     board_name VARCHAR NOT NULL,
///     owner_id INTEGER NOT NULL REFERENCES person (person_id) ON DELETE CASCADE
/// );
///
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
/// CREATE TABLE subtask (
///     subtask_id serial PRIMARY KEY,
///     subtask_name VARCHAR NOT NULL,
///     parent_task_id INTEGER NOT NULL REFERENCES task (task_id) ON DELETE CASCADE
/// );
///
/// CREATE TABLE tag (
///     tag_id serial PRIMARY KEY,
///     tag_name VARCHAR NOT NULL,
///     tag_description VARCHAR NOT NULL,
///     board_id INTEGER NOT NULL REFERENCES board (board_id) ON DELETE CASCADE
/// );
///
/// CREATE TABLE task_tag (
///     ref_task_id INTEGER REFERENCES task (task_id) ON DELETE CASCADE,
///     ref_tag_id INTEGER REFERENCES tag (tag_id) ON DELETE CASCADE,
///     PRIMARY KEY (ref_task_id, ref_tag_id)
/// );
///
/// CREATE TABLE contributor (
///     person_id INTEGER REFERENCES person (person_id) ON DELETE CASCADE,
///     board_id INTEGER REFERENCES board (board_id) ON DELETE CASCADE,
///     PRIMARY KEY (person_id, board_id)
/// );
/// ```
///
/// A task whose author is deleted falls back to the sentinel person
/// ([`NULL_PERSON_ID`]) through `ON DELETE SET DEFAULT`.

use crate::{
    db::conn::{db_id, DbConn},
    error::{Error, Result, ResultExt},
    models::person::NULL_PERSON_ID,
};
use sqlx::{migrate::MigrateDatabase, Postgres, Row};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Table names in creation order
pub const TABLES: [&str; 8] = [
    "person",
    "board",
    "task",
    "assignee",
    "subtask",
    "tag",
    "task_tag",
    "contributor",
];

const DROP_SCHEMA_SQL: &str = "DROP SCHEMA IF EXISTS public CASCADE";
const CREATE_SCHEMA_SQL: &str = "CREATE SCHEMA public";

const CREATE_PERSON_TABLE_SQL: &str = r#"
    CREATE TABLE person (
        person_id serial PRIMARY KEY,
        username VARCHAR UNIQUE NOT NULL,
        first_name VARCHAR NOT NULL,
        last_name VARCHAR NOT NULL,
        email VARCHAR UNIQUE NOT NULL,
        password_hash VARCHAR NOT NULL
    )
"#;

const CREATE_BOARD_TABLE_SQL: &str = r#"
    CREATE TABLE board (
        board_id serial PRIMARY KEY,
        board_name VARCHAR NOT NULL,
        owner_id INTEGER NOT NULL REFERENCES person (person_id) ON DELETE CASCADE
    )
"#;

const CREATE_TASK_TABLE_SQL: &str = r#"
    CREATE TABLE task (
        task_id serial PRIMARY KEY,
        task_name VARCHAR NOT NULL,
        task_description VARCHAR,
        board_id INTEGER NOT NULL REFERENCES board (board_id) ON DELETE CASCADE,
        author_id INTEGER NOT NULL DEFAULT 0 REFERENCES person (person_id) ON DELETE SET DEFAULT
    )
"#;

const CREATE_ASSIGNEE_TABLE_SQL: &str = r#"
    CREATE TABLE assignee (
        ref_task_id INTEGER NOT NULL REFERENCES task (task_id) ON DELETE CASCADE,
        assignee_id INTEGER NOT NULL REFERENCES person (person_id) ON DELETE CASCADE,
        CONSTRAINT assignee_pkey PRIMARY KEY (ref_task_id, assignee_id)
    )
"#;

const CREATE_SUBTASK_TABLE_SQL: &str = r#"
    CREATE TABLE subtask (
        subtask_id serial PRIMARY KEY,
        subtask_name VARCHAR NOT NULL,
        parent_task_id INTEGER NOT NULL REFERENCES task (task_id) ON DELETE CASCADE
    )
"#;

const CREATE_TAG_TABLE_SQL: &str = r#"
    CREATE TABLE tag (
        tag_id serial PRIMARY KEY,
        tag_name VARCHAR NOT NULL,
        tag_description VARCHAR NOT NULL,
        board_id INTEGER NOT NULL REFERENCES board (board_id) ON DELETE CASCADE
    )
"#;

const CREATE_TASK_TAG_TABLE_SQL: &str = r#"
    CREATE TABLE task_tag (
        ref_task_id INTEGER REFERENCES task (task_id) ON DELETE CASCADE,
        ref_tag_id INTEGER REFERENCES tag (tag_id) ON DELETE CASCADE,
        CONSTRAINT task_tag_pkey PRIMARY KEY (ref_task_id, ref_tag_id)
    )
"#;

const CREATE_CONTRIBUTOR_TABLE_SQL: &str = r#"
    CREATE TABLE contributor (
        person_id INTEGER REFERENCES person (person_id) ON DELETE CASCADE,
        board_id INTEGER REFERENCES board (board_id) ON DELETE CASCADE,
        CONSTRAINT contributor_pkey PRIMARY KEY (person_id, board_id)
    )
"#;

const INSERT_NULL_PERSON_SQL: &str = r#"
    INSERT INTO person (person_id, username, first_name, last_name, email, password_hash)
    VALUES ($1, 'null', 'null', 'null', 'null', 'null')
"#;

/// DDL statements in dependency order, parallel to [`TABLES`]
const CREATE_TABLES_SQL: [&str; 8] = [
    CREATE_PERSON_TABLE_SQL,
    CREATE_BOARD_TABLE_SQL,
    CREATE_TASK_TABLE_SQL,
    CREATE_ASSIGNEE_TABLE_SQL,
    CREATE_SUBTASK_TABLE_SQL,
    CREATE_TAG_TABLE_SQL,
    CREATE_TASK_TAG_TABLE_SQL,
    CREATE_CONTRIBUTOR_TABLE_SQL,
];

/// Owns the schema: drop/recreate and existence checks
#[derive(Clone)]
pub struct SystemModel {
    db: Arc<dyn DbConn>,
}

impl SystemModel {
    pub fn new(db: Arc<dyn DbConn>) -> Self {
        Self { db }
    }

    /// Drops the `public` schema and creates every table again
    ///
    /// Finishes by inserting the sentinel person and reading it back.
    /// Intended for test setup and first-time provisioning only.
    pub async fn recreate_all_tables(&self, ctx: &CancellationToken) -> Result<()> {
        const OP: &str = "SystemModel.recreate_all_tables";
        warn!("Recreating all tables, existing data will be lost");

        self.drop_all_tables(ctx).await.context(OP)?;

        for (table, sql) in TABLES.iter().zip(CREATE_TABLES_SQL) {
            self.db.exec(ctx, sqlx::query(sql)).await.context(OP)?;
            debug!(table, "Created table");
        }

        let null_id = db_id(NULL_PERSON_ID).context(OP)?;
        self.db
            .exec(ctx, sqlx::query(INSERT_NULL_PERSON_SQL).bind(null_id))
            .await
            .context(OP)?;
        self.verify_null_person(ctx).await.context(OP)?;

        info!(tables = TABLES.len(), "Schema recreated");
        Ok(())
    }

    /// True when `table_name` exists in the `public` schema
    pub async fn is_table_exist(&self, ctx: &CancellationToken, table_name: &str) -> Result<bool> {
        let row = self
            .db
            .query_row(
                ctx,
                sqlx::query(
                    "SELECT EXISTS (
                        SELECT FROM pg_tables
                        WHERE schemaname = 'public' AND tablename = $1
                    )",
                )
                .bind(table_name),
            )
            .await
            .context("SystemModel.is_table_exist")?;

        row.try_get::<bool, _>(0)
            .context("SystemModel.is_table_exist")
    }

    /// Confirms the sentinel person row is present
    pub async fn verify_null_person(&self, ctx: &CancellationToken) -> Result<()> {
        const OP: &str = "SystemModel.verify_null_person";

        let null_id = db_id(NULL_PERSON_ID).context(OP)?;
        let row = self
            .db
            .query_row(
                ctx,
                sqlx::query("SELECT EXISTS (SELECT 1 FROM person WHERE person_id = $1)")
                    .bind(null_id),
            )
            .await
            .context(OP)?;

        if row.try_get::<bool, _>(0).context(OP)? {
            Ok(())
        } else {
            Err(Error::SentinelMissing.context(OP))
        }
    }

    async fn drop_all_tables(&self, ctx: &CancellationToken) -> Result<()> {
        const OP: &str = "SystemModel.drop_all_tables";

        self.db.exec(ctx, sqlx::query(DROP_SCHEMA_SQL)).await.context(OP)?;
        self.db.exec(ctx, sqlx::query(CREATE_SCHEMA_SQL)).await.context(OP)?;
        Ok(())
    }
}

/// Creates the database named in `database_url` when it does not exist yet
///
/// Used at startup before the pool is opened; the server needs permission
/// to create databases.
pub async fn ensure_database_exists(database_url: &str) -> std::result::Result<(), sqlx::Error> {
    if Postgres::database_exists(database_url).await? {
        debug!("Database already exists");
        return Ok(());
    }

    info!("Database does not exist, creating it");
    Postgres::create_database(database_url).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_are_created_parents_first() {
        for (table, sql) in TABLES.iter().zip(CREATE_TABLES_SQL) {
            let header = format!("CREATE TABLE {} (", table);
            assert!(sql.contains(&header), "DDL for {} is out of order", table);
        }
    }

    #[test]
    fn test_every_reference_points_to_an_earlier_table() {
        for (index, sql) in CREATE_TABLES_SQL.iter().enumerate() {
            for referenced in TABLES {
                if sql.contains(&format!("REFERENCES {} (", referenced)) {
                    let position = TABLES.iter().position(|t| *t == referenced).unwrap();
                    assert!(position < index, "{} referenced before creation", referenced);
                }
            }
        }
    }

    #[test]
    fn test_author_falls_back_to_sentinel() {
        assert!(CREATE_TASK_TABLE_SQL.contains("DEFAULT 0"));
        assert!(CREATE_TASK_TABLE_SQL.contains("ON DELETE SET DEFAULT"));
        assert_eq!(NULL_PERSON_ID, 0);
    }
}
