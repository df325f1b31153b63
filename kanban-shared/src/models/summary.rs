/// Reduced projections embedded in other aggregates
///
/// A person shows up inside boards and tasks in several roles (owner,
/// contributor, author, assignee). All of them carry the same five columns,
/// so there is one [`PersonSummary`] type and the roles are aliases of it.
/// [`BoardSummary`] plays the same part for boards listed on a person.

use serde::{Deserialize, Serialize};

/// Public fields of a person, without password hash or collections
///
/// Decodes from `person_id, username, first_name, last_name, email`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PersonSummary {
    #[sqlx(rename = "person_id", try_from = "i32")]
    pub id: u32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Owner of a board
pub type BoardOwner = PersonSummary;

/// Person contributing to a board they do not own
pub type Contributor = PersonSummary;

/// Person who created a task
pub type TaskAuthor = PersonSummary;

/// Person a task is assigned to
pub type TaskAssignee = PersonSummary;

/// Board id, name and owner, without tasks/tags/contributors
///
/// Decodes from `board_id, board_name` plus the owner's summary columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BoardSummary {
    #[sqlx(rename = "board_id", try_from = "i32")]
    pub id: u32,
    #[sqlx(rename = "board_name")]
    pub name: String,
    #[sqlx(flatten)]
    pub owner: BoardOwner,
}
