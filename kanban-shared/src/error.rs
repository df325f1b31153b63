/// Error type for the data-access layer
///
/// Every model operation wraps the error it receives with its own name before
/// handing it back, so a failure deep inside a graph load reads like a call
/// trail:
///
/// ```text
/// BoardModel.get_by_id() -> BoardModel.load_tasks() -> TaskModel.get_by_id() -> database error: ...
/// ```
///
/// The leaf of that chain is one of the non-`Context` variants and can be
/// reached with [`Error::root`]. Callers usually only need the predicates
/// ([`Error::is_not_found`], [`Error::is_unique_violation`], ...).
///
/// # Example
///
/// ```no_run
/// use kanban_shared::database::Database;
/// use sqlx::PgPool;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example(pool: PgPool) {
/// let db = Database::from_pool(pool);
/// let ctx = CancellationToken::new();
///
/// match db.board.get_by_id(&ctx, 1337).await {
///     Ok(board) => println!("found {}", board.name),
///     Err(e) if e.is_not_found() => println!("no such board"),
///     Err(e) => eprintln!("{}", e),
/// }
/// # }
/// ```

use crate::models::person::NULL_PERSON_ID;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Data-access error
#[derive(Debug, Error)]
pub enum Error {
    /// Error reported by the store or the driver
    ///
    /// Missing rows (`sqlx::Error::RowNotFound`) and constraint violations
    /// arrive here untouched.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The caller's cancellation token fired before the statement finished
    #[error("operation cancelled")]
    Cancelled,

    /// Identifier can't be represented by an INTEGER column
    #[error("id {0} is out of range for an INTEGER column")]
    IdOutOfRange(u32),

    /// The sentinel person row was not found after provisioning
    #[error("sentinel person with id {} is missing", NULL_PERSON_ID)]
    SentinelMissing,

    /// The placeholder person backs `ON DELETE SET DEFAULT` and cannot be deleted
    #[error("person {0} is the placeholder author and cannot be deleted")]
    SentinelProtected(u32),

    /// Attempt to add the board owner as one of its contributors
    #[error("person {person_id} owns board {board_id} and cannot be added as a contributor")]
    OwnerAsContributor { board_id: u32, person_id: u32 },

    /// A task or tag was passed together with a board it does not belong to
    #[error("{child}.board_id({child_board_id}) != board.id({board_id})")]
    ParentMismatch {
        child: &'static str,
        child_board_id: u32,
        board_id: u32,
    },

    /// Wraps an error with the name of the operation it passed through
    #[error("{op}() -> {source}")]
    Context {
        op: &'static str,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wraps `self` with the operation name `op`
    pub fn context(self, op: &'static str) -> Self {
        Error::Context {
            op,
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, skipping every `Context` layer
    pub fn root(&self) -> &Error {
        match self {
            Error::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// Operation names this error passed through, outermost first
    pub fn trail(&self) -> Vec<&'static str> {
        let mut ops = Vec::new();
        let mut current = self;
        while let Error::Context { op, source } = current {
            ops.push(*op);
            current = source;
        }
        ops
    }

    /// True when a lookup found no row
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Error::Database(sqlx::Error::RowNotFound))
    }

    /// True for duplicate username/email and other UNIQUE violations
    pub fn is_unique_violation(&self) -> bool {
        self.database_error()
            .map_or(false, |db_err| db_err.is_unique_violation())
    }

    /// True when a referenced person/board/task/tag does not exist
    pub fn is_foreign_key_violation(&self) -> bool {
        self.database_error()
            .map_or(false, |db_err| db_err.is_foreign_key_violation())
    }

    /// True for application-level invariant violations (no write happened)
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self.root(),
            Error::OwnerAsContributor { .. }
                | Error::ParentMismatch { .. }
                | Error::SentinelProtected(_)
        )
    }

    /// True when the operation was aborted through its cancellation token
    pub fn is_cancelled(&self) -> bool {
        matches!(self.root(), Error::Cancelled)
    }

    fn database_error(&self) -> Option<&(dyn sqlx::error::DatabaseError + 'static)> {
        match self.root() {
            Error::Database(sqlx::Error::Database(db_err)) => Some(db_err.as_ref()),
            _ => None,
        }
    }
}

/// Adds `.context("Model.op")` to any result whose error converts into [`Error`]
pub trait ResultExt<T> {
    fn context(self, op: &'static str) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn context(self, op: &'static str) -> Result<T> {
        self.map_err(|e| e.into().context(op))
    }
}
