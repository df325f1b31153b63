/// Single handle over every model
///
/// The HTTP layer and tests depend on [`Database`] only. Every manager shares
/// the same [`DbConn`], so cloning the handle is cheap.

use crate::{
    db::{conn::DbConn, schema::SystemModel},
    models::{
        board::BoardModel, person::PersonModel, subtask::SubtaskModel, tag::TagModel,
        task::TaskModel,
    },
};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct Database {
    pub system: SystemModel,
    pub person: PersonModel,
    pub board: BoardModel,
    pub task: TaskModel,
    pub tag: TagModel,
    pub subtask: SubtaskModel,
}

impl Database {
    pub fn new(conn: Arc<dyn DbConn>) -> Self {
        Self {
            system: SystemModel::new(conn.clone()),
            person: PersonModel::new(conn.clone()),
            board: BoardModel::new(conn.clone()),
            task: TaskModel::new(conn.clone()),
            tag: TagModel::new(conn.clone()),
            subtask: SubtaskModel::new(conn),
        }
    }

    /// Wraps a pool as the shared connection
    pub fn from_pool(pool: PgPool) -> Self {
        Self::new(Arc::new(pool))
    }
}
