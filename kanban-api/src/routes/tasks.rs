/// Task endpoints
///
/// ```text
/// GET /v1/tasks/:id
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    Json,
};
use kanban_shared::models::task::Task;

/// Get a task with its tags, subtasks and assignees
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> ApiResult<Json<Task>> {
    let task = state.db.task.get_by_id(&state.request_token(), id).await?;
    Ok(Json(task))
}
