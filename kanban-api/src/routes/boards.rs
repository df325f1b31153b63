/// Board endpoints
///
/// - `POST /v1/boards` - Create a board
/// - `GET /v1/boards/:id` - Board with contributors, tasks and tags
/// - `DELETE /v1/boards/:id` - Delete a board and everything on it

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use kanban_shared::models::board::{Board, CreateBoard};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBoardRequest {
    #[validate(length(min = 1, max = 255, message = "Board name must be 1-255 characters"))]
    pub name: String,

    pub owner_id: u32,
}

/// Create a board
///
/// # Errors
///
/// - `409 Conflict`: Owner does not exist
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_board(
    State(state): State<AppState>,
    Json(req): Json<CreateBoardRequest>,
) -> ApiResult<(StatusCode, Json<Board>)> {
    req.validate()?;

    let board = state
        .db
        .board
        .create(
            &state.request_token(),
            CreateBoard {
                name: req.name,
                owner_id: req.owner_id,
            },
        )
        .await?;

    tracing::info!(board_id = board.id, owner_id = board.owner.id, "Board created");

    Ok((StatusCode::CREATED, Json(board)))
}

pub async fn get_board(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> ApiResult<Json<Board>> {
    let board = state.db.board.get_by_id(&state.request_token(), id).await?;
    Ok(Json(board))
}

pub async fn delete_board(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> ApiResult<StatusCode> {
    let deleted = state.db.board.delete_by_id(&state.request_token(), id).await?;
    Ok(if deleted {
        tracing::info!(board_id = id, "Board deleted");
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    })
}
