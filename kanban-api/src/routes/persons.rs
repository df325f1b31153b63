/// Person endpoints
///
/// # Endpoints
///
/// - `POST /v1/persons` - Create a person
/// - `GET /v1/persons/:id` - Person with boards and assigned tasks
/// - `DELETE /v1/persons/:id` - Delete a person

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use kanban_shared::{
    models::person::{CreatePerson, Person},
    password,
};
use serde::Deserialize;
use validator::Validate;

/// Create person request
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePersonRequest {
    #[validate(length(min = 1, max = 64, message = "Username must be 1-64 characters"))]
    pub username: String,

    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Plain text; only the argon2 hash is stored
    pub password: String,
}

/// Create a person
///
/// # Request
///
/// ```json
/// {
///   "username": "jdoe",
///   "first_name": "John",
///   "last_name": "Doe",
///   "email": "jdoe@example.com",
///   "password": "correct horse"
/// }
/// ```
///
/// # Errors
///
/// - `409 Conflict`: Username or email already taken
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_person(
    State(state): State<AppState>,
    Json(req): Json<CreatePersonRequest>,
) -> ApiResult<(StatusCode, Json<Person>)> {
    req.validate()?;
    password::validate_password(&req.password)?;

    let password_hash = password::hash_password(&req.password)?;

    let person = state
        .db
        .person
        .create(
            &state.request_token(),
            CreatePerson {
                username: req.username,
                first_name: req.first_name,
                last_name: req.last_name,
                email: req.email,
                password_hash,
            },
        )
        .await?;

    tracing::info!(person_id = person.id, username = %person.username, "Person created");

    Ok((StatusCode::CREATED, Json(person)))
}

/// Get a person with owned/contributed boards and assigned tasks
pub async fn get_person(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> ApiResult<Json<Person>> {
    let person = state.db.person.get_by_id(&state.request_token(), id).await?;
    Ok(Json(person))
}

/// Delete a person
///
/// Tasks they authored stay, attributed to the placeholder person.
pub async fn delete_person(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> ApiResult<StatusCode> {
    let deleted = state.db.person.delete_by_id(&state.request_token(), id).await?;
    Ok(if deleted {
        tracing::info!(person_id = id, "Person deleted");
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    })
}
