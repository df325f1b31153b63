//! # Kanban Shared Library
//!
//! Data layer of the kanban backend: a PostgreSQL schema for people, boards,
//! tasks, subtasks and tags, plus models that load each entity together with
//! the records related to it.
//!
//! ## Module Organization
//!
//! - `db`: connection abstraction, pool and schema provisioning
//! - `models`: entity types and their queries
//! - `database`: the [`database::Database`] handle grouping every model
//! - `password`: Argon2id hashing for person accounts
//! - `error`: error type shared by every operation

pub mod database;
pub mod db;
pub mod error;
pub mod models;
pub mod password;

/// Current version of the kanban shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
