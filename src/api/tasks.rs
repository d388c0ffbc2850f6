//! `/api/tasks` handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;

use super::error::{ApiError, JsonBody, parse_id};
use super::{AppState, merged_body};
use crate::model::{RecordId, Task};
use crate::validation::{strip_id, validate_task};

/// `GET /api/tasks`
pub(super) async fn list(State(state): State<AppState>) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(state.store.list::<Task>()?))
}

/// `GET /api/tasks/{id}`
pub(super) async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let id = parse_id(&id)?;
    state.store.get::<Task>(&id)?.map(Json).ok_or(ApiError::NotFound)
}

/// `POST /api/tasks`
pub(super) async fn create(
    State(state): State<AppState>,
    JsonBody(mut body): JsonBody,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    strip_id(&mut body);
    let task = validate_task(RecordId::generate(), &body)?;
    state.store.insert(&task)?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// `PUT|PATCH /api/tasks/{id}`
pub(super) async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(mut body): JsonBody,
) -> Result<Json<Task>, ApiError> {
    let id = parse_id(&id)?;
    let existing = state.store.get::<Task>(&id)?.ok_or(ApiError::NotFound)?;
    strip_id(&mut body);
    let task = validate_task(id, &merged_body(&existing, body)?)?;
    state.store.replace(&task)?;
    Ok(Json(task))
}

/// `DELETE /api/tasks/{id}`
///
/// Buttons and done events pointing at the task are left alone.
pub(super) async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    match state.store.remove::<Task>(&id)? {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(ApiError::NotFound),
    }
}
