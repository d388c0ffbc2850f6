//! Typed HTTP client for the tracker API.

pub mod sse;

use std::pin::Pin;

use futures_util::stream::{Stream, StreamExt};
use reqwest::{Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::model::{
    DButton, DoneEvent, NewDButton, NewDoneEvent, NewTask, NewUser, RecordId, Task, User,
};
use crate::notifier::{ChangeKind, DoneEventChange};
use sse::{SseDecoder, SseFrame};

/// Errors from [`TrackerClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("invalid response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Parsed JSON error body for a non-success status, if it had one.
    pub fn body_json(&self) -> Option<Value> {
        match self {
            Self::Status { body, .. } => serde_json::from_str(body).ok(),
            _ => None,
        }
    }
}

/// Stream of done event changes from `GET /api/events`.
pub type ChangeStream = Pin<Box<dyn Stream<Item = Result<DoneEventChange, ClientError>> + Send>>;

/// Client for one tracker server.
#[derive(Debug, Clone)]
pub struct TrackerClient {
    base_url: String,
    client: reqwest::Client,
}

impl TrackerClient {
    /// Client for the server at `base_url` (e.g. `http://127.0.0.1:9000`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { base_url, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn list_tasks(&self) -> Result<Vec<Task>, ClientError> {
        self.get_json("/api/tasks").await
    }

    /// `None` when the server has no such task.
    pub async fn get_task(&self, id: &RecordId) -> Result<Option<Task>, ClientError> {
        self.get_optional(&format!("/api/tasks/{id}")).await
    }

    pub async fn create_task(&self, task: &NewTask) -> Result<Task, ClientError> {
        self.post_json("/api/tasks", task).await
    }

    /// Deep-merge `patch` into a stored task.
    pub async fn update_task(&self, id: &RecordId, patch: &Value) -> Result<Task, ClientError> {
        self.put_json(&format!("/api/tasks/{id}"), patch).await
    }

    /// Returns `false` when the task was already gone.
    pub async fn delete_task(&self, id: &RecordId) -> Result<bool, ClientError> {
        self.delete(&format!("/api/tasks/{id}")).await
    }

    pub async fn list_dbuttons(&self) -> Result<Vec<DButton>, ClientError> {
        self.get_json("/api/dbuttons").await
    }

    pub async fn get_dbutton(&self, id: &RecordId) -> Result<Option<DButton>, ClientError> {
        self.get_optional(&format!("/api/dbuttons/{id}")).await
    }

    pub async fn create_dbutton(&self, button: &NewDButton) -> Result<DButton, ClientError> {
        self.post_json("/api/dbuttons", button).await
    }

    pub async fn update_dbutton(
        &self,
        id: &RecordId,
        patch: &Value,
    ) -> Result<DButton, ClientError> {
        self.put_json(&format!("/api/dbuttons/{id}"), patch).await
    }

    pub async fn list_done_events(&self) -> Result<Vec<DoneEvent>, ClientError> {
        self.get_json("/api/doneevents").await
    }

    pub async fn get_done_event(&self, id: &RecordId) -> Result<Option<DoneEvent>, ClientError> {
        self.get_optional(&format!("/api/doneevents/{id}")).await
    }

    pub async fn create_done_event(&self, event: &NewDoneEvent) -> Result<DoneEvent, ClientError> {
        self.post_json("/api/doneevents", event).await
    }

    pub async fn delete_done_event(&self, id: &RecordId) -> Result<bool, ClientError> {
        self.delete(&format!("/api/doneevents/{id}")).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ClientError> {
        self.get_json("/api/users").await
    }

    pub async fn get_user(&self, id: &RecordId) -> Result<Option<User>, ClientError> {
        self.get_optional(&format!("/api/users/{id}")).await
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<User, ClientError> {
        self.post_json("/api/users", user).await
    }

    /// Subscribe to done event changes.
    ///
    /// Frames with an unknown event name are skipped. The stream ends when
    /// the server closes the connection.
    pub async fn done_event_changes(&self) -> Result<ChangeStream, ClientError> {
        let response = self
            .client
            .get(self.url("/api/events"))
            .header("accept", "text/event-stream")
            .send()
            .await?;
        let response = check(response).await?;
        debug!(url = %self.url("/api/events"), "event stream connected");

        let bytes = response.bytes_stream();
        let stream = futures_util::stream::unfold(
            (bytes, SseDecoder::new(), Vec::<SseFrame>::new()),
            |(mut bytes, mut decoder, mut buffered)| async move {
                loop {
                    if let Some(frame) = buffered.pop() {
                        match decode_change(&frame) {
                            Some(item) => return Some((item, (bytes, decoder, buffered))),
                            None => continue,
                        }
                    }
                    match bytes.next().await {
                        Some(Ok(chunk)) => {
                            let mut frames = decoder.push(&chunk);
                            frames.reverse();
                            buffered = frames;
                        }
                        Some(Err(e)) => {
                            return Some((Err(ClientError::Http(e)), (bytes, decoder, buffered)));
                        }
                        None => return None,
                    }
                }
            },
        );
        Ok(Box::pin(stream))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.client.get(self.url(path)).send().await?;
        Ok(check(response).await?.json().await?)
    }

    async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<T>, ClientError> {
        let response = self.client.get(self.url(path)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(check(response).await?.json().await?))
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        Ok(check(response).await?.json().await?)
    }

    async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self.client.put(self.url(path)).json(body).send().await?;
        Ok(check(response).await?.json().await?)
    }

    async fn delete(&self, path: &str) -> Result<bool, ClientError> {
        let response = self.client.delete(self.url(path)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check(response).await?;
        Ok(true)
    }
}

async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "failed to read body".into());
    Err(ClientError::Status { status, body })
}

fn decode_change(frame: &SseFrame) -> Option<Result<DoneEventChange, ClientError>> {
    let name = frame.event.as_deref().unwrap_or("");
    let Some(kind) = ChangeKind::from_event_name(name) else {
        warn!(event = name, "ignoring unknown event frame");
        return None;
    };
    Some(
        serde_json::from_str::<DoneEvent>(&frame.data)
            .map(|doc| DoneEventChange { kind, doc })
            .map_err(|e| ClientError::Decode(format!("{name} payload: {e}"))),
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = TrackerClient::new("http://localhost:9000/");
        assert_eq!(client.base_url(), "http://localhost:9000");
        assert_eq!(client.url("/api/tasks"), "http://localhost:9000/api/tasks");
    }

    #[test]
    fn decode_change_skips_unknown_events() {
        let frame = SseFrame {
            event: Some("task:save".into()),
            data: "{}".into(),
        };
        assert!(decode_change(&frame).is_none());
    }

    #[test]
    fn decode_change_reports_bad_payload() {
        let frame = SseFrame {
            event: Some("doneevent:save".into()),
            data: "{}".into(),
        };
        assert!(matches!(
            decode_change(&frame),
            Some(Err(ClientError::Decode(_)))
        ));
    }

    #[test]
    fn status_error_exposes_json_body() {
        let err = ClientError::Status {
            status: StatusCode::BAD_REQUEST,
            body: r#"{"name":"ValidationError"}"#.into(),
        };
        assert_eq!(err.body_json().unwrap()["name"], "ValidationError");
        assert!(err.to_string().starts_with("server returned 400"));
    }
}
