//! `/api/users` handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;

use super::AppState;
use super::error::{ApiError, JsonBody, parse_id};
use crate::model::{RecordId, User};
use crate::validation::{strip_id, validate_user};

pub(super) async fn list(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.store.list::<User>()?))
}

pub(super) async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let id = parse_id(&id)?;
    state.store.get::<User>(&id)?.map(Json).ok_or(ApiError::NotFound)
}

pub(super) async fn create(
    State(state): State<AppState>,
    JsonBody(mut body): JsonBody,
) -> Result<(StatusCode, Json<User>), ApiError> {
    strip_id(&mut body);
    let user = validate_user(RecordId::generate(), &body)?;
    state.store.insert(&user)?;
    Ok((StatusCode::CREATED, Json(user)))
}
