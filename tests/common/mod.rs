//! Shared harness: a real server on an ephemeral port over a scratch database.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use doomie::config::ServerConfig;
use doomie::{ApiServer, AppState, ChangeNotifier, SqliteStore, TrackerClient};
use serde_json::{Value, json};
use std::sync::Arc;

pub struct TestServer {
    pub server: ApiServer,
    pub store: Arc<SqliteStore>,
    pub http: reqwest::Client,
    _dir: tempfile::TempDir,
}

impl TestServer {
    pub async fn start() -> Self {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let store = Arc::new(SqliteStore::open(&dir.path().join("doomie.db")).expect("open store"));
        let state = AppState::new(Arc::clone(&store), ChangeNotifier::new(16));
        let config = ServerConfig {
            host: "127.0.0.1".to_owned(),
            port: 0,
        };
        let server = ApiServer::start(state, &config).await.expect("start server");
        Self {
            server,
            store,
            http: reqwest::Client::new(),
            _dir: dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.server.base_url())
    }

    pub fn client(&self) -> TrackerClient {
        TrackerClient::new(self.server.base_url())
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.http.get(self.url(path)).send().await.expect("GET")
    }

    pub async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("POST")
    }

    pub async fn put(&self, path: &str, body: &Value) -> reqwest::Response {
        self.http
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("PUT")
    }

    pub async fn patch(&self, path: &str, body: &Value) -> reqwest::Response {
        self.http
            .patch(self.url(path))
            .json(body)
            .send()
            .await
            .expect("PATCH")
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.http.delete(self.url(path)).send().await.expect("DELETE")
    }

    /// Create a task with one frequency and return its JSON.
    pub async fn create_task(&self, name: &str, period: f64) -> Value {
        let resp = self
            .post(
                "/api/tasks",
                &json!({ "name": name, "frequencies": [{ "period": period }] }),
            )
            .await;
        assert_eq!(resp.status(), 201);
        resp.json().await.expect("task json")
    }

    pub async fn create_user(&self, email: &str) -> Value {
        let resp = self.post("/api/users", &json!({ "email": email })).await;
        assert_eq!(resp.status(), 201);
        resp.json().await.expect("user json")
    }

    pub async fn create_button(&self, body: &Value) -> Value {
        let resp = self.post("/api/dbuttons", body).await;
        assert_eq!(resp.status(), 201);
        resp.json().await.expect("button json")
    }
}

/// The `_id` of a JSON document.
pub fn id_of(doc: &Value) -> String {
    doc["_id"].as_str().expect("_id").to_owned()
}

/// An id that is well-formed but never issued.
pub const UNKNOWN_ID: &str = "4edd40c86762e0fb12000003";
