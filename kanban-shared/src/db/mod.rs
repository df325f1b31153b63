/// Database layer
///
/// # Modules
///
/// - `conn`: the [`conn::DbConn`] trait every model runs its SQL through
/// - `pool`: PostgreSQL connection pool management with health checks
/// - `schema`: table definitions, recreation and the sentinel person
///
/// # Example
///
/// ```no_run
/// use kanban_shared::database::Database;
/// use kanban_shared::db::pool::{create_pool, DatabaseConfig};
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = create_pool(DatabaseConfig::from_url(std::env::var("DATABASE_URL")?)).await?;
///     let db = Database::from_pool(pool);
///
///     db.system.recreate_all_tables(&CancellationToken::new()).await?;
///     Ok(())
/// }
/// ```

pub mod conn;
pub mod pool;
pub mod schema;
