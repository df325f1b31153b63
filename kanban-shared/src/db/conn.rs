/// Connection abstraction used by every model
///
/// Models never talk to a pool directly. They build a query with its
/// positional parameters (`$1, $2, ...`) already bound and hand it to a
/// [`DbConn`], which knows how to run it and how to give up when the caller's
/// [`CancellationToken`] fires.
///
/// `PgPool` implements the trait, so the usual wiring is:
///
/// ```no_run
/// use kanban_shared::db::conn::DbConn;
/// use sqlx::PgPool;
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example(pool: PgPool) -> kanban_shared::error::Result<()> {
/// let conn: Arc<dyn DbConn> = Arc::new(pool);
/// let ctx = CancellationToken::new();
///
/// let rows = conn
///     .query(&ctx, sqlx::query("SELECT tag_id FROM tag WHERE board_id = $1").bind(1i32))
///     .await?;
/// println!("{} tags", rows.len());
/// # Ok(())
/// # }
/// ```

use crate::error::{Error, Result};
use async_trait::async_trait;
use sqlx::{
    postgres::{PgArguments, PgPool, PgQueryResult, PgRow},
    query::Query,
    Execute, Postgres,
};
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// A Postgres query with its arguments bound
pub type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// Minimal capability set the models need from a SQL backend
#[async_trait]
pub trait DbConn: Send + Sync {
    /// Runs a query and returns every row
    async fn query<'q>(&self, ctx: &CancellationToken, query: PgQuery<'q>) -> Result<Vec<PgRow>>;

    /// Runs a query that must yield a row
    ///
    /// Yields `sqlx::Error::RowNotFound` when the result set is empty.
    async fn query_row<'q>(&self, ctx: &CancellationToken, query: PgQuery<'q>) -> Result<PgRow>;

    /// Executes a statement that returns no rows
    async fn exec<'q>(&self, ctx: &CancellationToken, query: PgQuery<'q>) -> Result<PgQueryResult>;
}

#[async_trait]
impl DbConn for PgPool {
    async fn query<'q>(&self, ctx: &CancellationToken, query: PgQuery<'q>) -> Result<Vec<PgRow>> {
        trace!(sql = query.sql(), "query");
        cancellable(ctx, query.fetch_all(self)).await
    }

    async fn query_row<'q>(&self, ctx: &CancellationToken, query: PgQuery<'q>) -> Result<PgRow> {
        trace!(sql = query.sql(), "query_row");
        cancellable(ctx, query.fetch_one(self)).await
    }

    async fn exec<'q>(&self, ctx: &CancellationToken, query: PgQuery<'q>) -> Result<PgQueryResult> {
        trace!(sql = query.sql(), "exec");
        cancellable(ctx, query.execute(self)).await
    }
}

/// Races `fut` against the cancellation token
///
/// A token that is already cancelled wins even if the statement could have
/// completed immediately.
async fn cancellable<T, F>(ctx: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, sqlx::Error>>,
{
    tokio::select! {
        biased;
        _ = ctx.cancelled() => Err(Error::Cancelled),
        res = fut => res.map_err(Error::from),
    }
}

/// Converts an entity id into the INTEGER value stored in Postgres
pub fn db_id(id: u32) -> Result<i32> {
    i32::try_from(id).map_err(|_| Error::IdOutOfRange(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_id_in_range() {
        assert_eq!(db_id(0).unwrap(), 0);
        assert_eq!(db_id(1337).unwrap(), 1337);
        assert_eq!(db_id(i32::MAX as u32).unwrap(), i32::MAX);
    }

    #[test]
    fn test_db_id_out_of_range() {
        let err = db_id(u32::MAX).unwrap_err();
        assert!(matches!(err, Error::IdOutOfRange(u32::MAX)));
    }

    #[tokio::test]
    async fn test_cancelled_token_wins() {
        let ctx = CancellationToken::new();
        ctx.cancel();

        let result = cancellable(&ctx, async { Ok::<_, sqlx::Error>(42) }).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn test_live_token_passes_result_through() {
        let ctx = CancellationToken::new();

        let value = cancellable(&ctx, async { Ok::<_, sqlx::Error>(42) }).await.unwrap();
        assert_eq!(value, 42);

        let err = cancellable(&ctx, async { Err::<i32, _>(sqlx::Error::RowNotFound) })
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
