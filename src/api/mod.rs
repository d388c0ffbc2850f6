//! REST API over the document store.
//!
//! ## Endpoints
//!
//! - `GET|POST /api/tasks`, `GET|PUT|PATCH|DELETE /api/tasks/{id}`
//! - `GET|POST /api/dbuttons`, `GET|PUT|PATCH /api/dbuttons/{id}`
//! - `GET|POST /api/doneevents`, `GET|DELETE /api/doneevents/{id}`
//! - `GET|POST /api/users`, `GET /api/users/{id}`
//! - `GET /api/events` (SSE stream of done event changes)
//! - `GET /health`

mod dbuttons;
mod done_events;
pub mod error;
mod events;
mod tasks;
mod users;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::response::Json;
use axum::routing::get;
use serde::Serialize;
use serde_json::{Map, Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::DoomieError;
use crate::notifier::ChangeNotifier;
use crate::store::{RecordLookup, SqliteStore};
use crate::validation::merge;

pub use error::{ApiError, JsonBody};

const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(15);

/// Shared state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    store: Arc<SqliteStore>,
    notifier: ChangeNotifier,
    keep_alive: Duration,
}

impl AppState {
    pub fn new(store: Arc<SqliteStore>, notifier: ChangeNotifier) -> Self {
        Self {
            store,
            notifier,
            keep_alive: DEFAULT_KEEP_ALIVE,
        }
    }

    /// Interval between SSE keep-alive comments.
    #[must_use]
    pub fn with_keep_alive(mut self, interval: Duration) -> Self {
        self.keep_alive = interval;
        self
    }

    pub fn store(&self) -> &Arc<SqliteStore> {
        &self.store
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    fn lookup(&self) -> &dyn RecordLookup {
        self.store.as_ref()
    }
}

/// Build the router with every route mounted.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/tasks", get(tasks::list).post(tasks::create))
        .route(
            "/api/tasks/{id}",
            get(tasks::show)
                .put(tasks::update)
                .patch(tasks::update)
                .delete(tasks::destroy),
        )
        .route("/api/dbuttons", get(dbuttons::list).post(dbuttons::create))
        .route(
            "/api/dbuttons/{id}",
            get(dbuttons::show)
                .put(dbuttons::update)
                .patch(dbuttons::update),
        )
        .route(
            "/api/doneevents",
            get(done_events::list).post(done_events::create),
        )
        .route(
            "/api/doneevents/{id}",
            get(done_events::show).delete(done_events::destroy),
        )
        .route("/api/users", get(users::list).post(users::create))
        .route("/api/users/{id}", get(users::show))
        .route("/api/events", get(events::stream))
        .with_state(state)
}

/// `GET /health`
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Deep-merge a client patch over a stored document, yielding the object to
/// re-validate.
fn merged_body<T: Serialize>(
    existing: &T,
    patch: Map<String, Value>,
) -> Result<Map<String, Value>, ApiError> {
    let mut doc = serde_json::to_value(existing)?;
    merge(&mut doc, &Value::Object(patch));
    match doc {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::Syntax("stored document is not an object".to_owned())),
    }
}

/// The tracker's HTTP server running in a background task.
pub struct ApiServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ApiServer {
    /// Bind to `{config.host}:{config.port}` (port `0` auto-assigns) and
    /// begin serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP listener cannot bind.
    pub async fn start(state: AppState, config: &ServerConfig) -> crate::error::Result<Self> {
        let app = router(state);

        let bind_addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| DoomieError::Server(format!("bind {bind_addr} failed: {e}")))?;
        let addr = listener
            .local_addr()
            .map_err(|e| DoomieError::Server(format!("failed to get local addr: {e}")))?;

        info!("tracker API listening on http://{addr}/api");

        let shutdown = CancellationToken::new();
        let signal = shutdown.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(signal.cancelled_owned())
                .await
            {
                tracing::error!("tracker API server error: {e}");
            }
        });

        Ok(Self {
            addr,
            shutdown,
            handle: Some(handle),
        })
    }

    /// Returns the address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Base URL, e.g. `http://127.0.0.1:9000`.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop accepting connections and wait for in-flight requests.
    ///
    /// Open event streams keep the server alive; drop it to force them closed.
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        info!("tracker API stopped");
    }
}

impl Drop for ApiServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}
