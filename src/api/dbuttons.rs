//! `/api/dbuttons` handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;

use super::error::{ApiError, JsonBody, parse_id};
use super::{AppState, merged_body};
use crate::model::{DButton, RecordId};
use crate::validation::{strip_id, validate_dbutton};

pub(super) async fn list(State(state): State<AppState>) -> Result<Json<Vec<DButton>>, ApiError> {
    Ok(Json(state.store.list::<DButton>()?))
}

pub(super) async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DButton>, ApiError> {
    let id = parse_id(&id)?;
    state
        .store
        .get::<DButton>(&id)?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

pub(super) async fn create(
    State(state): State<AppState>,
    JsonBody(mut body): JsonBody,
) -> Result<(StatusCode, Json<DButton>), ApiError> {
    strip_id(&mut body);
    let button = validate_dbutton(RecordId::generate(), &body, state.lookup()).await?;
    state.store.insert(&button)?;
    Ok((StatusCode::CREATED, Json(button)))
}

/// References are re-checked against the merged document.
pub(super) async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(mut body): JsonBody,
) -> Result<Json<DButton>, ApiError> {
    let id = parse_id(&id)?;
    let existing = state
        .store
        .get::<DButton>(&id)?
        .ok_or(ApiError::NotFound)?;
    strip_id(&mut body);
    let merged = merged_body(&existing, body)?;
    let button = validate_dbutton(id, &merged, state.lookup()).await?;
    state.store.replace(&button)?;
    Ok(Json(button))
}
