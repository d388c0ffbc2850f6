//! Handler-boundary errors and request body extraction.

use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use bytes::Bytes;
use serde_json::{Map, Value, json};
use tracing::error;

use crate::model::{InvalidRecordId, RecordId};
use crate::store::StoreError;
use crate::validation::{ValidationError, WriteError};

/// Everything a handler can fail with, mapped onto a status code.
///
/// Client mistakes are 400, a missing record is 404 with an empty body, and
/// only storage faults become 500.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Cast(#[from] InvalidRecordId),

    #[error("{0}")]
    Syntax(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => Self::NotFound,
            other => Self::Store(other),
        }
    }
}

impl From<WriteError> for ApiError {
    fn from(e: WriteError) -> Self {
        match e {
            WriteError::Invalid(v) => Self::Validation(v),
            WriteError::Store(s) => s.into(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::Store(StoreError::Serde(e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND.into_response(),
            Self::Cast(e) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "name": "CastError",
                    "message": format!("{e} at path \"_id\""),
                    "path": "_id",
                    "value": e.0,
                })),
            )
                .into_response(),
            Self::Syntax(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "name": "SyntaxError", "message": message })),
            )
                .into_response(),
            Self::Validation(e) => (StatusCode::BAD_REQUEST, Json(e.to_json())).into_response(),
            Self::Store(e) => {
                error!(error = %e, "storage fault while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "name": "StoreError", "message": e.to_string() })),
                )
                    .into_response()
            }
        }
    }
}

/// Parse a record id taken from the request path.
pub(crate) fn parse_id(raw: &str) -> Result<RecordId, ApiError> {
    Ok(RecordId::parse(raw)?)
}

/// A JSON object request body.
///
/// An empty body reads as `{}`. Content type is not checked. Anything that
/// is not a JSON object is rejected as a `SyntaxError`.
#[derive(Debug, Clone, Default)]
pub struct JsonBody(pub Map<String, Value>);

impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::Syntax(e.body_text()))?;
        parse_body(&bytes).map(Self)
    }
}

fn parse_body(bytes: &[u8]) -> Result<Map<String, Value>, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ApiError::Syntax(
            "request body must be a JSON object".to_owned(),
        )),
        Err(e) => Err(ApiError::Syntax(format!("invalid JSON body: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn empty_body_is_empty_object() {
        assert!(parse_body(b"").unwrap().is_empty());
        assert!(parse_body(b"  \n").unwrap().is_empty());
    }

    #[test]
    fn non_object_body_is_rejected() {
        assert!(matches!(parse_body(b"[1,2]"), Err(ApiError::Syntax(_))));
        assert!(matches!(parse_body(b"{oops"), Err(ApiError::Syntax(_))));
    }

    #[test]
    fn status_codes_follow_error_policy() {
        assert_eq!(
            ApiError::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            parse_id("nope").unwrap_err().into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(StoreError::Lock("x".into()))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn store_not_found_maps_to_not_found() {
        assert!(matches!(
            ApiError::from(StoreError::NotFound("abc".into())),
            ApiError::NotFound
        ));
    }
}
