/// Tag endpoints

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    Json,
};
use kanban_shared::models::tag::Tag;

pub async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> ApiResult<Json<Tag>> {
    let tag = state.db.tag.get_by_id(&state.request_token(), id).await?;
    Ok(Json(tag))
}
