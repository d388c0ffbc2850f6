//! `/api/doneevents` handlers.
//!
//! Every successful save or delete is published on the change notifier.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;

use super::AppState;
use super::error::{ApiError, JsonBody, parse_id};
use crate::model::{DoneEvent, RecordId};
use crate::notifier::ChangeKind;
use crate::validation::{resolve_done_event, strip_id, validate_done_event};

pub(super) async fn list(
    State(state): State<AppState>,
) -> Result<Json<Vec<DoneEvent>>, ApiError> {
    Ok(Json(state.store.list::<DoneEvent>()?))
}

pub(super) async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DoneEvent>, ApiError> {
    let id = parse_id(&id)?;
    state
        .store
        .get::<DoneEvent>(&id)?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// Client `taskName` and `time` are overwritten: the name is copied from the
/// task as it is now and the time is the server clock.
pub(super) async fn create(
    State(state): State<AppState>,
    JsonBody(mut body): JsonBody,
) -> Result<(StatusCode, Json<DoneEvent>), ApiError> {
    strip_id(&mut body);
    let pending = validate_done_event(RecordId::generate(), &body, state.lookup()).await?;
    let event = resolve_done_event(pending, state.lookup()).await?;
    state.store.insert(&event)?;
    state.notifier.publish(ChangeKind::Save, event.clone());
    Ok((StatusCode::CREATED, Json(event)))
}

pub(super) async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    let event = state
        .store
        .remove::<DoneEvent>(&id)?
        .ok_or(ApiError::NotFound)?;
    state.notifier.publish(ChangeKind::Remove, event);
    Ok(StatusCode::NO_CONTENT)
}
